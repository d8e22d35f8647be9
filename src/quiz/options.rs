use once_cell::sync::Lazy;
use rand::Rng;

use crate::quiz::random::{random_int, shuffle};
use crate::quiz::{MAX_FACTOR, MIN_FACTOR};

/// How many options a question offers, the correct one included.
pub const OPTION_COUNT: usize = 3;

/// Upper bound on random draws before the remaining distractors are filled in
/// order. The product set has 36 values so the bound is never hit in practice.
const MAX_DRAWS: usize = 1000;

/// Every product of two factors in [2, 9], deduplicated and ascending.
pub static VALID_PRODUCTS: Lazy<Vec<u32>> = Lazy::new(|| {
    let mut products = (MIN_FACTOR..=MAX_FACTOR)
        .flat_map(|a| (MIN_FACTOR..=MAX_FACTOR).map(move |b| a * b))
        .collect::<Vec<_>>();
    products.sort_unstable();
    products.dedup();
    products
});

/// Builds the answer set for a question: the correct product plus two
/// distinct wrong products from [`VALID_PRODUCTS`], in random order.
///
/// Assumes the product set holds at least two values other than
/// `correct_answer`.
pub fn generate_options<R: Rng + ?Sized>(rng: &mut R, correct_answer: u32) -> Vec<u32> {
    let mut options = Vec::with_capacity(OPTION_COUNT);
    options.push(correct_answer);

    let last = VALID_PRODUCTS.len() as u32 - 1;
    let mut draws = 0;
    while options.len() < OPTION_COUNT && draws < MAX_DRAWS {
        draws += 1;
        let candidate = VALID_PRODUCTS[random_int(rng, 0, last) as usize];
        if !options.contains(&candidate) {
            options.push(candidate);
        }
    }

    if options.len() < OPTION_COUNT {
        log::warn!(
            "Gave up sampling distractors for {} after {} draws, filling in order",
            correct_answer,
            MAX_DRAWS
        );
        for &product in VALID_PRODUCTS.iter() {
            if options.len() == OPTION_COUNT {
                break;
            }
            if !options.contains(&product) {
                options.push(product);
            }
        }
    }

    shuffle(rng, &options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn assert_valid(options: &[u32], correct_answer: u32) {
        assert_eq!(options.len(), OPTION_COUNT);
        assert!(options.contains(&correct_answer));
        let mut unique = options.to_vec();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), OPTION_COUNT, "repeated option in {:?}", options);
    }

    #[test]
    fn product_set_is_sorted_and_unique() {
        assert_eq!(VALID_PRODUCTS.len(), 36);
        assert_eq!(VALID_PRODUCTS.first(), Some(&4));
        assert_eq!(VALID_PRODUCTS.last(), Some(&81));
        assert!(VALID_PRODUCTS.windows(2).all(|w| w[0] < w[1]));
        assert!(!VALID_PRODUCTS.contains(&11));
    }

    #[test]
    fn forty_two_always_present_and_unique() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..1000 {
            let options = generate_options(&mut rng, 42);
            assert_valid(&options, 42);
            assert!(options
                .iter()
                .filter(|&&o| o != 42)
                .all(|o| VALID_PRODUCTS.contains(o)));
        }
    }

    #[test]
    fn answer_outside_product_set_still_gets_options() {
        let mut rng = StdRng::seed_from_u64(7);
        let options = generate_options(&mut rng, 100);

        assert_valid(&options, 100);
    }

    #[test]
    fn correct_answer_moves_around() {
        let mut rng = StdRng::seed_from_u64(9);
        let positions: std::collections::HashSet<usize> = (0..300)
            .map(|_| {
                generate_options(&mut rng, 12)
                    .iter()
                    .position(|&o| o == 12)
                    .unwrap()
            })
            .collect();

        assert_eq!(positions.len(), OPTION_COUNT);
    }

    #[test]
    fn stuck_sampler_fills_from_smallest_products() {
        // Every draw lands on the first product, which is the answer itself
        let mut rng = StepRng::new(0, 0);

        let mut options = generate_options(&mut rng, 4);

        assert_valid(&options, 4);
        options.sort_unstable();
        assert_eq!(options, vec![4, 6, 8]);
    }
}
