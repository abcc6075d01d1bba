//! NFC tag lifecycle engine for the TagStation reader appliance.
//!
//! The engine drives an external RF front-end through one discovery cycle at
//! a time, performs a one-shot NDEF read and content check on each activated
//! tag, then drops into a low-power presence loop until the tag leaves the
//! field. Each physical tag dwell produces exactly one [`TagEvent::Placed`]
//! and one [`TagEvent::Removed`] on a bounded event channel, with a
//! level-triggered tag-present flag updated alongside.
//!
//! RF protocol framing and NDEF decoding are not implemented here; they live
//! behind the [`RfPoller`] and [`NdefReader`] traits, so anything satisfying
//! those contracts (a real front-end driver, a desktop simulation) can drive
//! the engine.

pub mod bus;
pub mod config;
pub mod events;
pub mod hexfmt;
pub mod irq;
pub mod lifecycle;
pub mod ndef;
pub mod presence;
pub mod rf;
pub mod validate;

pub use bus::RfBus;
pub use config::EngineConfig;
pub use events::TagEvent;
pub use irq::{irq_channel, run_irq_dispatcher, IrqHandler, IrqNotifier, IrqToken};
pub use lifecycle::{Engine, EngineHandle, EngineState};
pub use ndef::{DecodedMessage, NdefError, NdefReader, NdefRecord, Tnf};
pub use presence::{Presence, PresenceMonitor};
pub use rf::{ActiveDevice, RfPoller, TagType, TagUid, MAX_UID_LEN};
