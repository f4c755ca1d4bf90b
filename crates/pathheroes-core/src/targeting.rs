//! Target selection over an opposing roster's alive mask.
//!
//! All functions take the mask fresh for every strike. No target index is
//! cached between strikes, so a slot that died since the last strike can
//! never be chosen.

use rand::seq::SliceRandom;
use rand::Rng;

/// Returns the living slot closest to `from` by index distance.
///
/// On equal distance the lower index wins.
///
/// # Example
///
/// ```
/// use pathheroes_core::targeting::nearest_living;
///
/// let alive = [true, false, false, true, false];
/// assert_eq!(nearest_living(&alive, 2), Some(0));
/// assert_eq!(nearest_living(&alive, 4), Some(3));
/// assert_eq!(nearest_living(&[false; 5], 2), None);
/// ```
#[must_use]
pub fn nearest_living(alive: &[bool], from: usize) -> Option<usize> {
    let is_alive = |index: usize| alive.get(index).copied().unwrap_or(false);
    (0..alive.len().max(from + 1)).find_map(|distance| {
        if let Some(lower) = from.checked_sub(distance) {
            if is_alive(lower) {
                return Some(lower);
            }
        }
        let upper = from + distance;
        is_alive(upper).then_some(upper)
    })
}

/// Picks a uniformly random living slot.
pub fn random_living<R: Rng + ?Sized>(alive: &[bool], rng: &mut R) -> Option<usize> {
    living(alive).choose(rng).copied()
}

/// Picks up to `count` distinct living slots uniformly at random.
///
/// The result is sorted ascending so strikes apply in scan order.
pub fn random_distinct_living<R: Rng + ?Sized>(
    alive: &[bool],
    count: usize,
    rng: &mut R,
) -> Vec<usize> {
    let mut picked: Vec<usize> = living(alive).choose_multiple(rng, count).copied().collect();
    picked.sort_unstable();
    picked
}

fn living(alive: &[bool]) -> Vec<usize> {
    alive
        .iter()
        .enumerate()
        .filter_map(|(index, &is_alive)| is_alive.then_some(index))
        .collect()
}
