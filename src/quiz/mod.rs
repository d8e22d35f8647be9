pub mod generator;
pub mod options;
pub mod random;
pub mod results;
pub mod session;

use std::fmt;

use rand::Rng;

use crate::error::ConfigError;

/// Every quiz has exactly this many questions, whatever the difficulty.
pub const QUIZ_LENGTH: usize = 8;

pub const MIN_FACTOR: u32 = 2;
pub const MAX_FACTOR: u32 = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Difficulty {
    /// One table, the chosen number is always the first factor.
    Novice,
    /// One table, the chosen number lands on either side.
    Smarty,
    /// Every table at once.
    Expert,
}

impl Difficulty {
    pub fn needs_table(&self) -> bool {
        !matches!(self, Difficulty::Expert)
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Difficulty::Novice => "NOVICE",
            Difficulty::Smarty => "SMARTY",
            Difficulty::Expert => "EXPERT",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct QuizConfig {
    pub difficulty: Difficulty,
    pub table_number: Option<u32>,
}

impl QuizConfig {
    pub fn new(difficulty: Difficulty, table_number: Option<u32>) -> Self {
        Self {
            difficulty,
            table_number,
        }
    }

    pub fn expert() -> Self {
        Self::new(Difficulty::Expert, None)
    }

    /// Checks that a table is set (and in range) for the modes that need one.
    /// Expert ignores the table number entirely.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.difficulty.needs_table() {
            return Ok(());
        }
        match self.table_number {
            None => Err(ConfigError::MissingTable(self.difficulty)),
            Some(table) if !(MIN_FACTOR..=MAX_FACTOR).contains(&table) => {
                Err(ConfigError::TableOutOfRange(table))
            }
            Some(_) => Ok(()),
        }
    }
}

/// One quiz item. Factors and options are fixed at creation, the answer is
/// written once afterwards through [`Question::submit`].
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Question {
    id: usize,
    factor_a: u32,
    factor_b: u32,
    correct_answer: u32,
    options: Vec<u32>,
    user_answer: Option<u32>,
    is_correct: Option<bool>,
}

impl Question {
    /// `options` must hold [`options::OPTION_COUNT`] distinct values, one of
    /// them the product. Only the generator builds questions.
    pub(crate) fn new(id: usize, factor_a: u32, factor_b: u32, options: Vec<u32>) -> Self {
        let correct_answer = factor_a * factor_b;
        debug_assert_eq!(options.len(), self::options::OPTION_COUNT, "options {:?}", options);
        debug_assert!(
            options.contains(&correct_answer),
            "options {:?} miss {}",
            options,
            correct_answer
        );
        debug_assert!(
            options
                .iter()
                .enumerate()
                .all(|(i, o)| !options[i + 1..].contains(o)),
            "repeated option in {:?}",
            options
        );

        Self {
            id,
            factor_a,
            factor_b,
            correct_answer,
            options,
            user_answer: None,
            is_correct: None,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn factor_a(&self) -> u32 {
        self.factor_a
    }

    pub fn factor_b(&self) -> u32 {
        self.factor_b
    }

    pub fn correct_answer(&self) -> u32 {
        self.correct_answer
    }

    pub fn options(&self) -> &[u32] {
        &self.options
    }

    pub fn user_answer(&self) -> Option<u32> {
        self.user_answer
    }

    pub fn is_correct(&self) -> Option<bool> {
        self.is_correct
    }

    pub fn is_answered(&self) -> bool {
        self.user_answer.is_some()
    }

    /// True when the question multiplies `table` by `multiplier`, in either order.
    pub fn involves(&self, table: u32, multiplier: u32) -> bool {
        (self.factor_a == table && self.factor_b == multiplier)
            || (self.factor_b == table && self.factor_a == multiplier)
    }

    /// Records the user's answer. Returns whether it was correct, or `None`
    /// if the question had already been answered (the first answer stays).
    pub fn submit(&mut self, answer: u32) -> Option<bool> {
        if self.user_answer.is_some() {
            return None;
        }
        let correct = answer == self.correct_answer;
        self.user_answer = Some(answer);
        self.is_correct = Some(correct);
        Some(correct)
    }
}

/// A single run through the questions of one configuration.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Quiz {
    pub id: u64,
    pub questions: Vec<Question>,
    pub current: usize,
}

impl Quiz {
    pub fn new<R: Rng + ?Sized>(rng: &mut R, config: &QuizConfig) -> Self {
        Self {
            id: rng.gen(),
            questions: generator::generate_quiz(rng, config),
            current: 0,
        }
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current)
    }

    pub fn is_last(&self) -> bool {
        self.current + 1 >= self.questions.len()
    }
}

/// Identifies the delayed step scheduled after an answer, so it can only
/// move forward the quiz (and question) it was scheduled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ContinuationToken {
    pub quiz_id: u64,
    pub question_index: usize,
}
