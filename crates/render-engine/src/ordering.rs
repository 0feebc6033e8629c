//! Source ordering: shuffle, truncate, duplicate.

use rand::seq::SliceRandom;
use rand::Rng;

/// Ordering applied to the resolved source list.
///
/// Operations always run in the same order: shuffle, then front-truncate to
/// `clip_count`, then duplicate each entry in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderingPolicy {
    pub scramble: bool,
    pub clip_count: usize,
    pub stutter: bool,
}

impl OrderingPolicy {
    pub fn apply<T: Clone, R: Rng + ?Sized>(&self, mut items: Vec<T>, rng: &mut R) -> Vec<T> {
        if self.scramble {
            items.shuffle(rng);
        }
        items.truncate(self.clip_count);
        if self.stutter {
            items = items
                .into_iter()
                .flat_map(|item| [item.clone(), item])
                .collect();
        }
        items
    }
}
