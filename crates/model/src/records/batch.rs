use crate::records::operation::WriteOperation;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A bounded group of write operations submitted as one atomic unit.
///
/// Once sealed a batch is read-only; the only way to get the operations
/// back out is to consume it.
#[derive(Debug, Clone)]
pub struct SealedBatch {
    id: String,
    sequence: u64,
    operations: Vec<WriteOperation>,
    size_bytes: usize,
    sealed_at: DateTime<Utc>,
}

impl SealedBatch {
    pub fn seal(sequence: u64, operations: Vec<WriteOperation>, size_bytes: usize) -> Self {
        SealedBatch {
            id: Uuid::new_v4().to_string(),
            sequence,
            operations,
            size_bytes,
            sealed_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn operations(&self) -> &[WriteOperation] {
        &self.operations
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn size_bytes(&self) -> usize {
        self.size_bytes
    }

    pub fn sealed_at(&self) -> DateTime<Utc> {
        self.sealed_at
    }

    pub fn into_operations(self) -> Vec<WriteOperation> {
        self.operations
    }
}
