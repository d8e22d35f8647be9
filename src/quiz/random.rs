use rand::seq::SliceRandom;
use rand::Rng;

/// Uniform integer in the closed range `[min, max]`.
///
/// # Panics
///
/// Panics if `min > max`.
pub fn random_int<R: Rng + ?Sized>(rng: &mut R, min: u32, max: u32) -> u32 {
    rng.gen_range(min..=max)
}

/// Returns a shuffled copy of `items`, the input stays as it was.
pub fn shuffle<T: Clone, R: Rng + ?Sized>(rng: &mut R, items: &[T]) -> Vec<T> {
    let mut shuffled = items.to_vec();
    shuffled.shuffle(rng);
    shuffled
}
