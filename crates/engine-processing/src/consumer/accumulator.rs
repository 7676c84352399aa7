use model::records::{batch::SealedBatch, operation::WriteOperation};
use tracing::debug;

/// Groups write operations into bounded batches.
///
/// A batch never holds more than `max_operations` operations, and never more
/// than `max_bytes` unless it is a single operation that is oversized on its
/// own. The accumulator is owned by a single worker.
#[derive(Debug)]
pub struct BatchAccumulator {
    max_operations: usize,
    max_bytes: usize,
    current: Vec<WriteOperation>,
    current_bytes: usize,
    next_sequence: u64,
}

impl BatchAccumulator {
    pub fn new(max_operations: usize, max_bytes: usize) -> Self {
        Self {
            max_operations: max_operations.max(1),
            max_bytes: max_bytes.max(1),
            current: Vec::new(),
            current_bytes: 0,
            next_sequence: 0,
        }
    }

    /// Appends `op`, returning the sealed batch if a bound was reached.
    ///
    /// When `op` would push the open batch past `max_bytes`, the open batch is
    /// sealed first and `op` starts the next one.
    pub fn add(&mut self, op: WriteOperation) -> Option<SealedBatch> {
        let op_bytes = op.size_bytes();
        let overflow = !self.current.is_empty()
            && self.current_bytes.saturating_add(op_bytes) > self.max_bytes;
        let sealed = overflow.then(|| self.seal());

        self.current_bytes += op_bytes;
        self.current.push(op);

        // After an overflow seal the lone open operation may already fill a
        // bound; it is sealed by the next add or by flush.
        match sealed {
            Some(batch) => Some(batch),
            None if self.is_full() => Some(self.seal()),
            None => None,
        }
    }

    /// Seals whatever is open, if anything. Used at end-of-stream.
    pub fn flush(&mut self) -> Option<SealedBatch> {
        if self.current.is_empty() {
            None
        } else {
            Some(self.seal())
        }
    }

    /// Drops the open batch without sealing it, returning how many operations were lost.
    pub fn discard(&mut self) -> usize {
        let dropped = self.current.len();
        self.current.clear();
        self.current_bytes = 0;
        dropped
    }

    pub fn pending_operations(&self) -> usize {
        self.current.len()
    }

    pub fn pending_bytes(&self) -> usize {
        self.current_bytes
    }

    fn is_full(&self) -> bool {
        self.current.len() >= self.max_operations || self.current_bytes >= self.max_bytes
    }

    fn seal(&mut self) -> SealedBatch {
        let operations = std::mem::take(&mut self.current);
        let size_bytes = std::mem::replace(&mut self.current_bytes, 0);
        let sequence = self.next_sequence;
        self.next_sequence += 1;

        let batch = SealedBatch::seal(sequence, operations, size_bytes);
        debug!(
            batch_id = %batch.id(),
            sequence,
            operations = batch.len(),
            bytes = size_bytes,
            "Sealed batch"
        );
        batch
    }
}
