//! Per-instance identity for connections.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Identity of one connection instance.
///
/// Clones share identity; two independently created generations never compare
/// equal even for the same server name. The embedded cancellation token stops
/// the instance's tasks when it is torn down.
#[derive(Clone, Debug, Default)]
pub struct Generation(Arc<CancellationToken>);

impl Generation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop the instance this generation belongs to.
    pub fn cancel(&self) {
        self.0.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.is_cancelled()
    }

    /// Resolves once [`Generation::cancel`] has been called.
    pub async fn cancelled(&self) {
        self.0.cancelled().await
    }

    /// True if both handles refer to the same connection instance.
    pub fn same_instance(&self, other: &Generation) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Generation {
    fn eq(&self, other: &Self) -> bool {
        self.same_instance(other)
    }
}

impl Eq for Generation {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_not_value() {
        let a = Generation::new();
        let b = Generation::new();
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn test_cancel_is_shared_between_clones() {
        let a = Generation::new();
        let b = a.clone();
        a.cancel();
        assert!(b.is_cancelled());
    }

    #[tokio::test]
    async fn test_cancelled_resolves() {
        let generation = Generation::new();
        let waiter = generation.clone();
        let task = tokio::spawn(async move { waiter.cancelled().await });
        generation.cancel();
        task.await.unwrap();
    }
}
