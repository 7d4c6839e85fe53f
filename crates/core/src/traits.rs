use crate::order::Order;
use crate::snapshot::TickSnapshot;
use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait SnapshotProvider: Send + Sync {
    async fn snapshot(&self) -> Result<TickSnapshot>;
}

#[async_trait]
pub trait OrderRouter: Send + Sync {
    async fn submit(&self, order: &Order) -> Result<()>;
}
