use crate::error::StoreError;
use async_trait::async_trait;
use model::records::operation::WriteOperation;

/// A store that applies a list of write operations as one transaction.
///
/// Implementations must apply either every operation or none of them, in
/// submission order.
#[async_trait]
pub trait TransactionalStore: Send + Sync {
    async fn submit(&self, operations: &[WriteOperation]) -> Result<(), StoreError>;
}
