//! Replay buffer interface for reinforcement learning.
//!
//! Replay buffers store transitions collected from environments and
//! produce batches for training agents.
use anyhow::Result;

/// Interface for buffers that store experiences from environments.
///
/// # Examples
///
/// ```ignore
/// struct SimpleBuffer<T> {
///     items: Vec<T>,
/// }
///
/// impl<T> ExperienceBufferBase for SimpleBuffer<T> {
///     type Item = T;
///
///     fn push(&mut self, tr: T) -> Result<()> {
///         self.items.push(tr);
///         Ok(())
///     }
/// }
/// ```
pub trait ExperienceBufferBase {
    /// The type of items stored in the buffer.
    type Item;

    /// Pushes a new experience into the buffer.
    fn push(&mut self, tr: Self::Item) -> Result<()>;
}

/// Interface for replay buffers that generate batches for training.
///
/// This trait is independent of [`ExperienceBufferBase`] and focuses
/// on the batch generation process.
pub trait ReplayBufferBase {
    /// Configuration parameters for the replay buffer.
    type Config: Clone;

    /// The type of batch generated for training.
    type Batch;

    /// Builds a new replay buffer from the given configuration.
    fn build(config: &Self::Config) -> Result<Self>
    where
        Self: Sized;

    /// Constructs a batch of `size` experiences for training.
    ///
    /// Fails with [`CartpixError::InsufficientData`] when the buffer holds
    /// fewer than `size` experiences.
    ///
    /// [`CartpixError::InsufficientData`]: crate::error::CartpixError::InsufficientData
    fn batch(&mut self, size: usize) -> Result<Self::Batch>;

    /// Returns the current number of experiences in the buffer.
    fn len(&self) -> usize;
}
