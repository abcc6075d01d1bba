//! Tag lifecycle state machine.
//!
//! One dedicated task owns the whole tag lifecycle: drive discovery, read
//! and validate the candidate, watch its presence, report removal, start
//! over. Every state yields to the scheduler at a bounded interval; nothing
//! here blocks indefinitely.

use tokio::sync::{mpsc, watch};
use tokio::time;
use tracing::{debug, error, info};

use crate::config::EngineConfig;
use crate::events::{EventSink, TagEvent};
use crate::hexfmt::HexPool;
use crate::ndef::NdefReader;
use crate::presence::{Presence, PresenceMonitor};
use crate::rf::{ActiveDevice, RfPoller, TagUid};
use crate::validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// No tag in the field; discovery cycles run until one activates.
    Idle,
    /// A device activated; its NDEF content is being read and checked.
    Validating,
    /// A validated tag is in the field; presence probes pace the loop.
    Present,
    /// The tag left; removal is being reported and the RF device released.
    Deactivating,
}

/// The lifecycle engine. Single instance per front-end, owned by the task
/// that runs it; all mutable state lives in here.
pub struct Engine<R, N> {
    rf: R,
    ndef: N,
    config: EngineConfig,
    state: EngineState,
    pending: Option<ActiveDevice>,
    identity: TagUid,
    ndef_buf: Vec<u8>,
    monitor: PresenceMonitor,
    sink: EventSink,
    reinit: mpsc::Receiver<()>,
    hex: HexPool,
}

/// Consumer-side handle: the event channel, the present flag, and the
/// reinitialize trigger.
pub struct EngineHandle {
    events: mpsc::Receiver<TagEvent>,
    present: watch::Receiver<bool>,
    reinit: mpsc::Sender<()>,
}

impl EngineHandle {
    /// Next lifecycle event; `None` once the engine task is gone.
    pub async fn next_event(&mut self) -> Option<TagEvent> {
        self.events.recv().await
    }

    /// Non-blocking poll of the event channel.
    pub fn try_next_event(&mut self) -> Option<TagEvent> {
        self.events.try_recv().ok()
    }

    /// Level-triggered: is a validated tag currently in the field? Stays
    /// correct even when a queue-full drop loses an event.
    pub fn tag_present(&self) -> bool {
        *self.present.borrow()
    }

    /// A watch on the present flag for other tasks; any number of clones
    /// may observe it.
    pub fn present_watch(&self) -> watch::Receiver<bool> {
        self.present.clone()
    }

    /// Waits until the present flag reads `present`. Returns false if the
    /// engine went away first.
    pub async fn wait_present(&mut self, present: bool) -> bool {
        self.present.wait_for(|&flag| flag == present).await.is_ok()
    }

    /// Asks the engine to tear down and rebuild the RF front-end. Honored at
    /// the next `Idle` boundary. Returns false when a request is already
    /// pending.
    pub fn request_reinitialize(&self) -> bool {
        self.reinit.try_send(()).is_ok()
    }
}

impl<R: RfPoller, N: NdefReader> Engine<R, N> {
    pub fn new(rf: R, ndef: N, config: EngineConfig) -> (Self, EngineHandle) {
        let (event_tx, event_rx) = mpsc::channel(config.event_queue_depth.max(1));
        let (present_tx, present_rx) = watch::channel(false);
        let (reinit_tx, reinit_rx) = mpsc::channel(1);

        let sink = EventSink::new(event_tx, present_tx, config.event_timeout());
        let monitor = PresenceMonitor::new(config.presence_period(), config.presence_threshold());
        let ndef_buf = vec![0; config.ndef_buf_size];

        let engine = Engine {
            rf,
            ndef,
            state: EngineState::Idle,
            pending: None,
            identity: TagUid::default(),
            ndef_buf,
            monitor,
            sink,
            reinit: reinit_rx,
            hex: HexPool::new(),
            config,
        };
        let handle = EngineHandle {
            events: event_rx,
            present: present_rx,
            reinit: reinit_tx,
        };
        (engine, handle)
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Brings up the front-end, then runs the lifecycle loop for the life of
    /// the process.
    pub async fn run(mut self) {
        self.bring_up().await;
        loop {
            self.step().await;
        }
    }

    /// Retries front-end bring-up until it succeeds. No tag operation can
    /// make progress without a working front-end, so failures hold the
    /// engine in a diagnostic retry loop instead of continuing.
    pub async fn bring_up(&mut self) {
        loop {
            match self.rf.reinitialize().await {
                Ok(()) => break,
                Err(err) => {
                    error!("rf front-end init failed: {err:?}");
                    time::sleep(self.config.init_retry_delay()).await;
                }
            }
        }
        self.rf.deactivate(false).await;
        info!("rf front-end ready");
    }

    /// Advances the machine by one transition. [`Engine::run`] calls this in
    /// a loop; tests drive it directly.
    pub async fn step(&mut self) {
        match self.state {
            EngineState::Idle => self.discover().await,
            EngineState::Validating => self.validate_candidate().await,
            EngineState::Present => self.confirm_presence().await,
            EngineState::Deactivating => self.release().await,
        }
    }

    async fn discover(&mut self) {
        if self.reinit.try_recv().is_ok() {
            info!("reinitialize requested");
            self.bring_up().await;
        }
        match self.rf.discover().await {
            Some(device) => {
                debug!(tag_type = ?device.tag_type(), "device activated");
                self.pending = Some(device);
                self.state = EngineState::Validating;
            }
            None => time::sleep(self.config.idle_poll_delay()).await,
        }
    }

    async fn validate_candidate(&mut self) {
        let Some(device) = self.pending.take() else {
            self.state = EngineState::Idle;
            return;
        };
        match self.read_candidate(&device).await {
            Some(payload) => {
                self.identity = device.uid().clone();
                info!("tag placed, uid {}", self.hex.format(self.identity.as_bytes()));
                self.sink.tag_placed(self.identity.clone(), payload).await;
                // Halt the tag so the next full discovery pass does not
                // re-activate it; from here on only wake-up probes see it.
                self.rf.sleep().await;
                self.monitor.reset();
                self.state = EngineState::Present;
            }
            None => {
                self.rf.deactivate(false).await;
                self.state = EngineState::Idle;
            }
        }
    }

    /// One-shot read + validate of an activated device. Returns the owned
    /// payload copy on acceptance, `None` on any reject; rejects emit no
    /// event.
    async fn read_candidate(&mut self, device: &ActiveDevice) -> Option<Vec<u8>> {
        let message = match self.ndef.read(device, &mut self.ndef_buf).await {
            Ok(message) => message,
            Err(err) => {
                debug!("ndef read rejected: {err}");
                return None;
            }
        };
        let Some(payload) = message.first_payload() else {
            debug!("ndef message has no records");
            return None;
        };
        if !validate::contains_marker(payload, self.config.marker.as_bytes()) {
            debug!("payload has no content marker");
            return None;
        }
        debug!(
            len = payload.len(),
            "ndef msg: {}",
            String::from_utf8_lossy(payload)
        );
        Some(payload.to_vec())
    }

    async fn confirm_presence(&mut self) {
        if self.monitor.check(&mut self.rf).await == Presence::Removed {
            self.state = EngineState::Deactivating;
        }
    }

    async fn release(&mut self) {
        info!("tag removed, uid {}", self.hex.format(self.identity.as_bytes()));
        self.sink.tag_removed().await;
        self.identity = TagUid::default();
        self.rf.deactivate(false).await;
        self.state = EngineState::Idle;
    }
}
