//! Types and traits for recording training metrics.
//!
//! * [`Record`] - A container of key-value pairs of various data types
//! * [`RecordValue`] - Values that can be stored in a [`Record`]
//! * [`Recorder`] and [`AggregateRecorder`] - Destinations of records
//! * [`RecordStorage`] - Aggregates stored records into a single one
//! * [`LogRecorder`] - Writes aggregated records to the log
//! * [`BufferedRecorder`] - Keeps records in memory
//! * [`NullRecorder`] - Discards all records
//!
//! # Basic Usage
//!
//! ```rust
//! use cartpix_core::record::{Record, RecordValue};
//!
//! let episode = 3;
//! let duration = 27;
//!
//! let mut record = Record::empty();
//! record.insert("episode", RecordValue::Scalar(episode as f32));
//! record.insert("duration", RecordValue::Scalar(duration as f32));
//! assert_eq!(record.get_scalar("duration").unwrap(), 27.0);
//! ```
mod base;
mod buffered_recorder;
mod log_recorder;
mod null_recorder;
mod recorder;
mod storage;

pub use base::{Record, RecordValue};
pub use buffered_recorder::BufferedRecorder;
pub use log_recorder::LogRecorder;
pub use null_recorder::NullRecorder;
pub use recorder::{AggregateRecorder, Recorder};
pub use storage::RecordStorage;
