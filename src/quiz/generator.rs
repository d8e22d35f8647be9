use rand::Rng;

use crate::quiz::options::generate_options;
use crate::quiz::random::random_int;
use crate::quiz::{Difficulty, Question, QuizConfig, MAX_FACTOR, MIN_FACTOR, QUIZ_LENGTH};

/// Factor pair used when a single-table mode comes without a table.
const FALLBACK_FACTORS: (u32, u32) = (2, 2);

/// Generates the [`QUIZ_LENGTH`] questions of a quiz, in order.
///
/// Questions are independent of each other, so the same pair may show up
/// more than once.
pub fn generate_quiz<R: Rng + ?Sized>(rng: &mut R, config: &QuizConfig) -> Vec<Question> {
    if config.difficulty.needs_table() && config.table_number.is_none() {
        log::warn!(
            "{} quiz requested without a table, every question falls back to {}x{}",
            config.difficulty,
            FALLBACK_FACTORS.0,
            FALLBACK_FACTORS.1
        );
    }

    let questions = (0..QUIZ_LENGTH)
        .map(|id| {
            let (a, b) = pick_factors(rng, config);
            Question::new(id, a, b, generate_options(rng, a * b))
        })
        .collect::<Vec<_>>();

    log::debug!(
        "Generated {} quiz: {:?}",
        config.difficulty,
        questions
            .iter()
            .map(|q| (q.factor_a(), q.factor_b()))
            .collect::<Vec<_>>()
    );
    questions
}

fn pick_factors<R: Rng + ?Sized>(rng: &mut R, config: &QuizConfig) -> (u32, u32) {
    match (config.difficulty, config.table_number) {
        (Difficulty::Expert, _) => (
            random_int(rng, MIN_FACTOR, MAX_FACTOR),
            random_int(rng, MIN_FACTOR, MAX_FACTOR),
        ),
        // The chosen table always comes first, e.g. 2x3, 2x7, 2x4
        (Difficulty::Novice, Some(table)) => (table, random_int(rng, MIN_FACTOR, MAX_FACTOR)),
        (Difficulty::Smarty, Some(table)) => {
            let other = random_int(rng, MIN_FACTOR, MAX_FACTOR);
            if rng.gen_bool(0.5) {
                (other, table)
            } else {
                (table, other)
            }
        }
        (_, None) => FALLBACK_FACTORS,
    }
}
