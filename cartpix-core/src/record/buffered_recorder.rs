use super::{AggregateRecorder, Record, Recorder};

/// Buffered recorder.
///
/// Keeps every record in memory, in the order they were given.
#[derive(Default)]
pub struct BufferedRecorder {
    buf: Vec<Record>,
}

impl BufferedRecorder {
    /// Construct the recorder.
    pub fn new() -> Self {
        Self { buf: Vec::default() }
    }

    /// Returns an iterator over the records.
    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.buf.iter()
    }

    /// Returns the number of records.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns `true` if no record has been given.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Collects the scalar values of `key` over the records having it.
    pub fn scalars(&self, key: &str) -> Vec<f32> {
        self.buf
            .iter()
            .filter_map(|record| record.get_scalar(key).ok())
            .collect()
    }
}

impl Recorder for BufferedRecorder {
    /// Write a [`Record`] to the buffer.
    fn write(&mut self, record: Record) {
        self.buf.push(record);
    }
}

impl AggregateRecorder for BufferedRecorder {
    fn store(&mut self, record: Record) {
        self.buf.push(record);
    }

    /// Records are kept as they are, nothing to flush.
    fn flush(&mut self, _step: i64) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_records_in_order() {
        let mut recorder = BufferedRecorder::new();
        for d in [3.0, 7.0, 5.0].iter() {
            recorder.store(Record::from_scalar("duration", *d));
        }
        recorder.flush(3);

        assert_eq!(recorder.len(), 3);
        let durations = recorder
            .iter()
            .map(|r| r.get_scalar("duration"))
            .collect::<Result<Vec<_>, _>>();
        assert_eq!(durations, Ok(vec![3.0, 7.0, 5.0]));
        assert_eq!(recorder.scalars("duration"), vec![3.0, 7.0, 5.0]);
    }
}
