//! Chat session state machine.
//!
//! The whole conversation with one user is a single [`State`] value. Every
//! user action (and the delayed step after an answer) is an [`Event`], and
//! [`State::apply`] turns the pair into the next state plus an [`Outcome`]
//! telling the bot what to show. Nothing here talks to Telegram.

use rand::Rng;

use crate::error::ConfigError;
use crate::quiz::results::{classify_results, QuizSummary};
use crate::quiz::{ContinuationToken, Difficulty, Question, Quiz, QuizConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Welcome,
    TableSelect,
    Quiz,
    Results,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum State {
    #[default]
    Start,
    ReceiveName,
    ReceiveDifficulty {
        name: String,
    },
    ReceiveTable {
        name: String,
        difficulty: Difficulty,
    },
    Quiz {
        name: String,
        config: QuizConfig,
        quiz: Quiz,
    },
    Results {
        name: String,
        config: QuizConfig,
        questions: Vec<Question>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Opened,
    NameEntered(String),
    ChangeName,
    DifficultyChosen(Difficulty),
    TableChosen(u32),
    Back,
    AnswerSubmitted { question_index: usize, answer: u32 },
    Advance(ContinuationToken),
    Retry,
    Home,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    AskName,
    NameRequired,
    ChooseDifficulty,
    ChooseTable,
    InvalidTable(ConfigError),
    ShowQuestion,
    NotAnOption,
    /// The answer was recorded; `token` has to be fed back as
    /// [`Event::Advance`] once the feedback has been on screen long enough.
    Answered {
        correct: bool,
        correct_answer: u32,
        token: ContinuationToken,
    },
    Completed(QuizSummary),
    Ignored,
}

impl State {
    pub fn screen(&self) -> Screen {
        match self {
            State::Start | State::ReceiveName | State::ReceiveDifficulty { .. } => Screen::Welcome,
            State::ReceiveTable { .. } => Screen::TableSelect,
            State::Quiz { .. } => Screen::Quiz,
            State::Results { .. } => Screen::Results,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            State::Start | State::ReceiveName => None,
            State::ReceiveDifficulty { name }
            | State::ReceiveTable { name, .. }
            | State::Quiz { name, .. }
            | State::Results { name, .. } => Some(name),
        }
    }

    pub fn apply<R: Rng + ?Sized>(self, event: Event, rng: &mut R) -> (State, Outcome) {
        match (self, event) {
            (state, Event::Advance(token)) if !matches!(state, State::Quiz { .. }) => {
                log::debug!("Dropping continuation {:?} outside of a quiz", token);
                (state, Outcome::Ignored)
            }

            (State::Start, _) => (State::ReceiveName, Outcome::AskName),

            (State::ReceiveName, Event::NameEntered(name)) => {
                let name = name.trim();
                if name.is_empty() {
                    (State::ReceiveName, Outcome::NameRequired)
                } else {
                    (
                        State::ReceiveDifficulty {
                            name: name.to_string(),
                        },
                        Outcome::ChooseDifficulty,
                    )
                }
            }

            (State::ReceiveDifficulty { name }, Event::DifficultyChosen(difficulty)) => {
                if difficulty.needs_table() {
                    (
                        State::ReceiveTable { name, difficulty },
                        Outcome::ChooseTable,
                    )
                } else {
                    start_quiz(rng, name, QuizConfig::expert())
                }
            }
            (State::ReceiveDifficulty { .. }, Event::ChangeName) => {
                (State::ReceiveName, Outcome::AskName)
            }

            (State::ReceiveTable { name, difficulty }, Event::TableChosen(table)) => {
                let config = QuizConfig::new(difficulty, Some(table));
                match config.validate() {
                    Ok(()) => start_quiz(rng, name, config),
                    Err(err) => (
                        State::ReceiveTable { name, difficulty },
                        Outcome::InvalidTable(err),
                    ),
                }
            }
            (State::ReceiveTable { name, .. }, Event::Back) => {
                (State::ReceiveDifficulty { name }, Outcome::ChooseDifficulty)
            }

            (
                State::Quiz {
                    name,
                    config,
                    mut quiz,
                },
                Event::AnswerSubmitted {
                    question_index,
                    answer,
                },
            ) => {
                let outcome = submit_answer(&mut quiz, question_index, answer);
                (State::Quiz { name, config, quiz }, outcome)
            }
            (State::Quiz { name, config, quiz }, Event::Advance(token)) => {
                advance(name, config, quiz, token)
            }

            (State::Results { name, config, .. }, Event::Retry) => start_quiz(rng, name, config),

            (state, Event::Home) => match state.name().map(str::to_owned) {
                Some(name) => (State::ReceiveDifficulty { name }, Outcome::ChooseDifficulty),
                None => (state, Outcome::Ignored),
            },

            (state, event) => {
                log::debug!("Ignoring {:?} on {:?} screen", event, state.screen());
                (state, Outcome::Ignored)
            }
        }
    }
}

fn start_quiz<R: Rng + ?Sized>(rng: &mut R, name: String, config: QuizConfig) -> (State, Outcome) {
    let quiz = Quiz::new(rng, &config);
    log::debug!("Starting quiz {} for {:?}", quiz.id, config);
    (State::Quiz { name, config, quiz }, Outcome::ShowQuestion)
}

fn submit_answer(quiz: &mut Quiz, question_index: usize, answer: u32) -> Outcome {
    if question_index != quiz.current {
        return Outcome::Ignored;
    }
    let quiz_id = quiz.id;
    let Some(question) = quiz.questions.get_mut(question_index) else {
        return Outcome::Ignored;
    };
    // Already answered and waiting for the feedback delay to run out
    if question.is_answered() {
        return Outcome::Ignored;
    }
    if !question.options().contains(&answer) {
        return Outcome::NotAnOption;
    }

    match question.submit(answer) {
        Some(correct) => Outcome::Answered {
            correct,
            correct_answer: question.correct_answer(),
            token: ContinuationToken {
                quiz_id,
                question_index,
            },
        },
        None => Outcome::Ignored,
    }
}

fn advance(name: String, config: QuizConfig, mut quiz: Quiz, token: ContinuationToken) -> (State, Outcome) {
    let answered = quiz.current_question().map_or(false, Question::is_answered);
    if token.quiz_id != quiz.id || token.question_index != quiz.current || !answered {
        log::debug!("Dropping stale continuation {:?}", token);
        return (State::Quiz { name, config, quiz }, Outcome::Ignored);
    }

    if quiz.is_last() {
        let summary = classify_results(&quiz.questions, &config);
        log::debug!(
            "Quiz {} finished with {}/{}, mistakes in tables {:?}",
            quiz.id,
            summary.score,
            summary.total,
            summary.mistake_tables
        );
        return (
            State::Results {
                name,
                config,
                questions: quiz.questions,
            },
            Outcome::Completed(summary),
        );
    }

    quiz.current += 1;
    (State::Quiz { name, config, quiz }, Outcome::ShowQuestion)
}
