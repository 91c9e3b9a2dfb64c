//! Cyclic transition store.
use super::{Transition, TransitionBatch, TransitionStoreConfig};
use crate::{
    error::CartpixError,
    ExperienceBufferBase, ReplayBufferBase,
};
use anyhow::Result;
use rand::{rngs::StdRng, seq::index, Rng, SeedableRng};

/// Draws `size` distinct indices out of `0..len` uniformly at random.
fn sample_ixs<R: Rng + ?Sized>(
    len: usize,
    size: usize,
    rng: &mut R,
) -> Result<Vec<usize>, CartpixError> {
    if len < size {
        return Err(CartpixError::InsufficientData {
            requested: size,
            available: len,
        });
    }
    Ok(index::sample(rng, len, size).into_vec())
}

/// A fixed-capacity replay memory.
///
/// The store grows until it reaches its capacity. After that, each push
/// overwrites the oldest item, so the store always holds the most recent
/// `capacity` items. Batches are sampled uniformly without replacement.
pub struct TransitionStore<T> {
    capacity: usize,

    /// Position of the next write.
    i: usize,

    data: Vec<T>,
    rng: StdRng,
}

impl<T> TransitionStore<T> {
    /// Creates an empty store.
    pub fn new(config: &TransitionStoreConfig) -> Result<Self, CartpixError> {
        config.validate()?;
        Ok(Self {
            capacity: config.capacity,
            i: 0,
            data: Vec::with_capacity(config.capacity),
            rng: StdRng::seed_from_u64(config.seed),
        })
    }

    /// Inserts an item, overwriting the oldest one if the store is full.
    pub fn push(&mut self, tr: T) {
        if self.data.len() < self.capacity {
            self.data.push(tr);
        } else {
            self.data[self.i] = tr;
        }
        self.i = (self.i + 1) % self.capacity;
    }

    /// Returns the number of stored items.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if no item has been pushed.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the maximum number of items.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterates over the stored items from the oldest to the newest.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        // Before the store is full `i == len`, so the first part is empty.
        let (newer, older) = self.data.split_at(self.i.min(self.data.len()));
        older.iter().chain(newer.iter())
    }

    /// Samples `size` distinct items uniformly at random.
    ///
    /// The store is left untouched; randomness comes from `rng` only.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        size: usize,
        rng: &mut R,
    ) -> Result<Vec<&T>, CartpixError> {
        let ixs = sample_ixs(self.data.len(), size, rng)?;
        Ok(ixs.into_iter().map(|ix| &self.data[ix]).collect())
    }
}

impl<T> ExperienceBufferBase for TransitionStore<T> {
    type Item = T;

    fn push(&mut self, tr: Self::Item) -> Result<()> {
        TransitionStore::push(self, tr);
        Ok(())
    }
}

impl<O, A> ReplayBufferBase for TransitionStore<Transition<O, A>>
where
    O: Clone,
    A: Clone,
{
    type Config = TransitionStoreConfig;
    type Batch = TransitionBatch<O, A>;

    fn build(config: &Self::Config) -> Result<Self> {
        Ok(Self::new(config)?)
    }

    fn batch(&mut self, size: usize) -> Result<Self::Batch> {
        let ixs = sample_ixs(self.data.len(), size, &mut self.rng)?;
        Ok(ixs.into_iter().map(|ix| &self.data[ix]).collect())
    }

    fn len(&self) -> usize {
        self.data.len()
    }
}
