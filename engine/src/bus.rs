//! Shared RF transport bus.
//!
//! The lifecycle task and the interrupt dispatcher both issue transactions
//! against the same front-end transport. The bus serializes them; the lock
//! is scoped to a single transaction so neither path can starve the other
//! across a full discovery or probe cycle.

use std::sync::Arc;

use tokio::sync::Mutex;

pub struct RfBus<T> {
    inner: Arc<Mutex<T>>,
}

impl<T> Clone for RfBus<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> RfBus<T> {
    pub fn new(transport: T) -> Self {
        Self {
            inner: Arc::new(Mutex::new(transport)),
        }
    }

    /// Runs one transport exchange under the bus lock.
    pub async fn transaction<R>(&self, op: impl FnOnce(&mut T) -> R) -> R {
        let mut transport = self.inner.lock().await;
        op(&mut transport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn transactions_serialize_on_one_transport() {
        let bus = RfBus::new(0u32);
        let mut handles = Vec::new();
        for _ in 0..8 {
            let bus = bus.clone();
            handles.push(tokio::spawn(async move {
                bus.transaction(|count| *count += 1).await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(bus.transaction(|count| *count).await, 8);
    }
}
