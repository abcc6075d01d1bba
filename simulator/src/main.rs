//! TagStation desktop simulator.
//!
//! Runs the lifecycle engine against a simulated RF field so the placement
//! and removal flow can be exercised without reader hardware.
//!
//! # Usage
//! ```bash
//! RUST_LOG=debug cargo run -p tagstation-simulator
//! ```
//!
//! The scripted field places a valid tag, lets it dwell, removes it, then
//! offers a tag without the content marker. Lifecycle events print as JSON
//! lines.

use std::convert::Infallible;
use std::time::Duration;

use anyhow::Result;
use tagstation_engine::{
    irq_channel, run_irq_dispatcher, ActiveDevice, DecodedMessage, Engine, EngineConfig,
    IrqHandler, IrqNotifier, IrqToken, NdefError, NdefReader, NdefRecord, RfBus, RfPoller,
    TagType, Tnf,
};
use tokio::time;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// A tag sitting on the simulated reader.
#[derive(Clone)]
struct SimTag {
    uid: Vec<u8>,
    payload: Vec<u8>,
}

/// The simulated RF field: at most one tag, reached over the shared bus.
#[derive(Default)]
struct SimField {
    tag: Option<SimTag>,
    halted: bool,
    irqs_serviced: u32,
}

impl SimField {
    fn place(&mut self, tag: SimTag) {
        self.tag = Some(tag);
        self.halted = false;
    }

    fn remove(&mut self) {
        self.tag = None;
        self.halted = false;
    }
}

impl IrqHandler for SimField {
    fn service_irq(&mut self, _irq: IrqToken) {
        self.irqs_serviced += 1;
    }
}

/// RF poller backed by the simulated field.
struct SimRf {
    bus: RfBus<SimField>,
}

impl RfPoller for SimRf {
    type Error = Infallible;

    async fn discover(&mut self) -> Option<ActiveDevice> {
        // One discovery cycle takes its full duration budget, like the real
        // front-end; this also paces re-activation of a rejected tag.
        time::sleep(Duration::from_millis(100)).await;
        self.bus
            .transaction(|field| {
                // A halted tag ignores full discovery; only the wake-up
                // probe sees it again.
                match &field.tag {
                    Some(tag) if !field.halted => {
                        Some(ActiveDevice::new(&tag.uid, TagType::Ntag))
                    }
                    _ => None,
                }
            })
            .await
    }

    async fn deactivate(&mut self, _active: bool) {
        self.bus.transaction(|field| field.halted = false).await;
    }

    async fn probe_presence(&mut self) -> bool {
        // The wake-up frame takes a halted tag back to the ready state.
        self.bus
            .transaction(|field| {
                if field.tag.is_some() {
                    field.halted = false;
                    true
                } else {
                    false
                }
            })
            .await
    }

    async fn sleep(&mut self) {
        self.bus.transaction(|field| field.halted = true).await;
    }

    async fn reinitialize(&mut self) -> Result<(), Infallible> {
        Ok(())
    }
}

/// NDEF reader backed by the simulated field.
struct SimNdef {
    bus: RfBus<SimField>,
}

impl NdefReader for SimNdef {
    async fn read<'buf>(
        &mut self,
        _device: &ActiveDevice,
        buf: &'buf mut [u8],
    ) -> Result<DecodedMessage<'buf>, NdefError> {
        let payload = self
            .bus
            .transaction(|field| field.tag.as_ref().map(|tag| tag.payload.clone()))
            .await;
        let Some(payload) = payload else {
            return Err(NdefError::DetectFailed);
        };
        if payload.len() > buf.len() {
            return Err(NdefError::MessageTooLarge(payload.len()));
        }
        buf[..payload.len()].copy_from_slice(&payload);
        let filled: &'buf [u8] = &buf[..payload.len()];
        Ok(DecodedMessage::new(vec![NdefRecord {
            tnf: Tnf::WellKnown,
            record_type: b"T",
            payload: filled,
        }]))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tagstation_simulator=debug,tagstation_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let bus = RfBus::new(SimField::default());
    let (irq_notifier, irq_receiver) = irq_channel(8);
    tokio::spawn(run_irq_dispatcher(irq_receiver, bus.clone()));

    let rf = SimRf { bus: bus.clone() };
    let ndef = SimNdef { bus: bus.clone() };
    let (engine, mut handle) = Engine::new(rf, ndef, EngineConfig::default());
    tokio::spawn(engine.run());

    let mut present = handle.present_watch();
    tokio::spawn(async move {
        while present.changed().await.is_ok() {
            info!(present = *present.borrow(), "tag-present flag changed");
        }
    });

    let _printer = tokio::spawn(async move {
        while let Some(event) = handle.next_event().await {
            match serde_json::to_string(&event) {
                Ok(json) => info!("event: {json}"),
                Err(err) => debug!("unprintable event: {err}"),
            }
        }
    });

    run_script(&bus, &irq_notifier).await;

    let serviced = bus.transaction(|field| field.irqs_serviced).await;
    info!(serviced, "scenario complete");
    Ok(())
}

async fn run_script(bus: &RfBus<SimField>, irq: &IrqNotifier) {
    time::sleep(Duration::from_secs(1)).await;
    info!("placing valid tag");
    bus.transaction(|field| {
        field.place(SimTag {
            uid: vec![0x04, 0xA1, 0xB2, 0xC3],
            payload: b"hello scp:42 world".to_vec(),
        })
    })
    .await;
    let _ = irq.raise(IrqToken::new(0x01));

    time::sleep(Duration::from_secs(3)).await;
    info!("removing tag");
    bus.transaction(|field| field.remove()).await;
    let _ = irq.raise(IrqToken::new(0x02));

    // Give the presence loop time to run out its miss tolerance.
    time::sleep(Duration::from_secs(2)).await;
    info!("placing tag without content marker");
    bus.transaction(|field| {
        field.place(SimTag {
            uid: vec![0xDE, 0xAD, 0xBE, 0xEF],
            payload: b"no marker here".to_vec(),
        })
    })
    .await;
    let _ = irq.raise(IrqToken::new(0x01));

    time::sleep(Duration::from_secs(2)).await;
    bus.transaction(|field| field.remove()).await;
    let _ = irq.raise(IrqToken::new(0x02));

    time::sleep(Duration::from_secs(1)).await;
}
