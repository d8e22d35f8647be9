use std::collections::BTreeSet;

use crate::quiz::{Question, QuizConfig, MIN_FACTOR};

/// At most this many tables are suggested for review after a quiz.
pub const MAX_REVIEW_TABLES: usize = 2;

/// Last multiplier shown in a review table.
const REVIEW_MAX_MULTIPLIER: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizSummary {
    pub score: usize,
    pub total: usize,
    pub is_perfect: bool,
    /// Every factor that appeared in a wrongly answered question, ascending.
    pub mistake_tables: BTreeSet<u32>,
    pub review_tables: Vec<ReviewTable>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewTable {
    pub table: u32,
    pub rows: Vec<ReviewRow>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewRow {
    pub multiplier: u32,
    pub product: u32,
    pub needs_attention: bool,
}

impl QuizSummary {
    /// The questions that were not answered correctly, in quiz order.
    pub fn mistakes(questions: &[Question]) -> impl Iterator<Item = &Question> {
        questions.iter().filter(|q| q.is_correct() != Some(true))
    }
}

/// Scores an answered quiz and picks the tables worth reviewing.
///
/// Single-table modes review the chosen table. Otherwise the tables touched
/// by mistakes are reviewed, lowest first. Either way no more than
/// [`MAX_REVIEW_TABLES`] are returned.
pub fn classify_results(questions: &[Question], config: &QuizConfig) -> QuizSummary {
    let total = questions.len();
    let score = questions
        .iter()
        .filter(|q| q.is_correct() == Some(true))
        .count();

    let mistakes = QuizSummary::mistakes(questions).collect::<Vec<_>>();
    let mistake_tables = mistakes
        .iter()
        .flat_map(|q| [q.factor_a(), q.factor_b()])
        .collect::<BTreeSet<_>>();

    let targets: Vec<u32> = match config.table_number {
        Some(table) if config.difficulty.needs_table() => vec![table],
        _ => mistake_tables.iter().copied().collect(),
    };

    let review_tables = targets
        .into_iter()
        .take(MAX_REVIEW_TABLES)
        .map(|table| review_table(table, &mistakes))
        .collect();

    QuizSummary {
        score,
        total,
        is_perfect: score == total,
        mistake_tables,
        review_tables,
    }
}

fn review_table(table: u32, mistakes: &[&Question]) -> ReviewTable {
    let rows = (MIN_FACTOR..=REVIEW_MAX_MULTIPLIER)
        .map(|multiplier| ReviewRow {
            multiplier,
            product: table * multiplier,
            needs_attention: mistakes.iter().any(|q| q.involves(table, multiplier)),
        })
        .collect();
    ReviewTable { table, rows }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::Difficulty;

    fn answered(id: usize, a: u32, b: u32, correct: bool) -> Question {
        let product = a * b;
        let mut question = Question::new(id, a, b, vec![product, product + 1, product + 2]);
        question.submit(if correct { product } else { product + 1 });
        question
    }

    fn quiz_with_mistakes(mistakes: &[(u32, u32)]) -> Vec<Question> {
        let mut questions = mistakes
            .iter()
            .enumerate()
            .map(|(id, &(a, b))| answered(id, a, b, false))
            .collect::<Vec<_>>();
        while questions.len() < 8 {
            questions.push(answered(questions.len(), 2, 3, true));
        }
        questions
    }

    #[test]
    fn three_mistakes_on_four_and_seven() {
        let questions = quiz_with_mistakes(&[(4, 7), (7, 4), (4, 4)]);

        let summary = classify_results(&questions, &QuizConfig::expert());

        assert_eq!(summary.score, 5);
        assert_eq!(summary.total, 8);
        assert!(!summary.is_perfect);
        assert_eq!(summary.mistake_tables, [4, 7].into_iter().collect());
        let tables = summary
            .review_tables
            .iter()
            .map(|t| t.table)
            .collect::<Vec<_>>();
        assert_eq!(tables, vec![4, 7]);
    }

    #[test]
    fn expert_review_keeps_two_lowest_tables() {
        let questions = quiz_with_mistakes(&[(9, 9), (5, 6), (2, 3)]);

        let summary = classify_results(&questions, &QuizConfig::expert());

        assert_eq!(summary.mistake_tables.len(), 5);
        let tables = summary
            .review_tables
            .iter()
            .map(|t| t.table)
            .collect::<Vec<_>>();
        assert_eq!(tables, vec![2, 3]);
    }

    #[test]
    fn single_table_mode_reviews_chosen_table() {
        let questions = quiz_with_mistakes(&[(3, 6)]);
        let config = QuizConfig::new(Difficulty::Smarty, Some(6));

        let summary = classify_results(&questions, &config);

        assert_eq!(summary.review_tables.len(), 1);
        let table = &summary.review_tables[0];
        assert_eq!(table.table, 6);
        assert_eq!(table.rows.len(), 9);
        assert_eq!(table.rows.first().map(|r| r.multiplier), Some(2));
        assert_eq!(table.rows.last().map(|r| r.product), Some(60));
        let flagged = table
            .rows
            .iter()
            .filter(|r| r.needs_attention)
            .map(|r| r.multiplier)
            .collect::<Vec<_>>();
        assert_eq!(flagged, vec![3]);
    }

    #[test]
    fn perfect_quiz() {
        let questions = quiz_with_mistakes(&[]);

        let summary = classify_results(&questions, &QuizConfig::expert());

        assert_eq!(summary.score, 8);
        assert!(summary.is_perfect);
        assert!(summary.mistake_tables.is_empty());
        assert!(summary.review_tables.is_empty());
    }

    #[test]
    fn unanswered_question_counts_as_mistake() {
        let mut questions = quiz_with_mistakes(&[]);
        questions[7] = Question::new(7, 8, 9, vec![72, 70, 81]);

        let summary = classify_results(&questions, &QuizConfig::expert());

        assert_eq!(summary.score, 7);
        assert_eq!(summary.mistake_tables, [8, 9].into_iter().collect());
    }

    #[test]
    fn classification_is_repeatable() {
        let questions = quiz_with_mistakes(&[(4, 7), (8, 2)]);
        let config = QuizConfig::new(Difficulty::Novice, Some(4));

        assert_eq!(
            classify_results(&questions, &config),
            classify_results(&questions, &config)
        );
    }
}
