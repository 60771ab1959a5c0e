use rand::Rng;
use rand::seq::{SliceRandom, index};

/// Short inputs yield every item.
pub fn sample<T, R: Rng + ?Sized>(items: Vec<T>, amount: usize, rng: &mut R) -> Vec<T> {
    let amount = amount.min(items.len());
    let mut slots: Vec<Option<T>> = items.into_iter().map(Some).collect();
    index::sample(rng, slots.len(), amount)
        .into_iter()
        .filter_map(|i| slots[i].take())
        .collect()
}

pub fn shuffle<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    items.shuffle(rng);
}
