//! Interrupt-to-worker handoff.
//!
//! The hardware IRQ line does no protocol work. The ISR-side path pushes an
//! opaque token into a non-blocking queue and returns; a dispatcher task
//! consumes tokens and services them through a bus transaction. ISR latency
//! therefore never depends on protocol processing latency.

use tokio::sync::mpsc;
use tracing::trace;

use crate::bus::RfBus;

/// Raw interrupt status snapshot, opaque to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IrqToken(u32);

impl IrqToken {
    pub fn new(bits: u32) -> Self {
        Self(bits)
    }

    pub fn bits(self) -> u32 {
        self.0
    }
}

/// Services front-end interrupts. Runs under the bus lock; must not block.
pub trait IrqHandler: Send {
    fn service_irq(&mut self, irq: IrqToken);
}

/// ISR-side sender. `raise` never blocks.
#[derive(Clone)]
pub struct IrqNotifier {
    tx: mpsc::Sender<IrqToken>,
}

impl IrqNotifier {
    /// Queues an interrupt for the dispatcher. Returns false when the queue
    /// is full and the wakeup was dropped.
    pub fn raise(&self, irq: IrqToken) -> bool {
        self.tx.try_send(irq).is_ok()
    }
}

/// Dispatcher-side receiver, consumed by [`run_irq_dispatcher`].
pub struct IrqReceiver {
    rx: mpsc::Receiver<IrqToken>,
}

pub fn irq_channel(depth: usize) -> (IrqNotifier, IrqReceiver) {
    let (tx, rx) = mpsc::channel(depth.max(1));
    (IrqNotifier { tx }, IrqReceiver { rx })
}

/// Consumes interrupt tokens and services each one in its own bus
/// transaction. Returns once every notifier has been dropped.
pub async fn run_irq_dispatcher<T: IrqHandler>(mut irqs: IrqReceiver, bus: RfBus<T>) {
    while let Some(irq) = irqs.rx.recv().await {
        trace!(bits = irq.bits(), "servicing irq");
        bus.transaction(|frontend| frontend.service_irq(irq)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct IrqLog {
        serviced: Vec<u32>,
    }

    impl IrqHandler for IrqLog {
        fn service_irq(&mut self, irq: IrqToken) {
            self.serviced.push(irq.bits());
        }
    }

    #[tokio::test]
    async fn dispatcher_services_tokens_in_order() {
        let bus = RfBus::new(IrqLog::default());
        let (notifier, receiver) = irq_channel(8);

        let dispatcher = tokio::spawn(run_irq_dispatcher(receiver, bus.clone()));

        assert!(notifier.raise(IrqToken::new(1)));
        assert!(notifier.raise(IrqToken::new(2)));
        assert!(notifier.raise(IrqToken::new(3)));
        drop(notifier);
        dispatcher.await.unwrap();

        let serviced = bus.transaction(|log| log.serviced.clone()).await;
        assert_eq!(serviced, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn raise_reports_dropped_wakeup_when_full() {
        let (notifier, _receiver) = irq_channel(1);
        assert!(notifier.raise(IrqToken::new(1)));
        assert!(!notifier.raise(IrqToken::new(2)));
    }
}
