//! RF front-end boundary.
//!
//! The engine never talks ISO14443 itself; everything protocol-level is
//! behind [`RfPoller`]. A front-end driver implements one discovery cycle,
//! deactivation, the short-frame wake-up presence probe and the halt
//! directive, and the engine sequences them.

use std::fmt;
use std::future::Future;

use serde::{Serialize, Serializer};

use crate::hexfmt;

/// Longest UID the RF layer can report (double-size ISO14443A).
pub const MAX_UID_LEN: usize = 10;

/// Tag identity captured from the RF layer at activation.
///
/// Owned, fixed-capacity copy; the poller's own UID memory is reused on the
/// next discovery cycle and must not be referenced past it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagUid(heapless::Vec<u8, MAX_UID_LEN>);

impl TagUid {
    /// Copies up to [`MAX_UID_LEN`] bytes out of the poller's buffer.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let take = bytes.len().min(MAX_UID_LEN);
        let mut uid = heapless::Vec::new();
        let _ = uid.extend_from_slice(&bytes[..take]);
        Self(uid)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for TagUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0.iter() {
            write!(f, "{byte:02X}")?;
        }
        Ok(())
    }
}

impl Serialize for TagUid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hexfmt::hex(self.as_bytes()))
    }
}

/// Tag technology as classified from the activation response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagType {
    MifareClassic1k,
    MifareClassic4k,
    Ntag,
    Unknown,
}

impl TagType {
    /// Classifies a tag from its SENS_RES and SAK bytes.
    pub fn from_sens_res(sens_res: u8, sak: u8) -> Self {
        match (sens_res, sak) {
            (0x44, 0x00) => TagType::Ntag,
            (0x04, 0x08) | (0x44, 0x08) => TagType::MifareClassic1k,
            (0x04, 0x18) | (0x02, 0x18) => TagType::MifareClassic4k,
            _ => TagType::Unknown,
        }
    }
}

/// Handle to a device the RF layer has activated.
///
/// Valid until the engine deactivates it or starts the next discovery cycle.
#[derive(Debug, Clone)]
pub struct ActiveDevice {
    uid: TagUid,
    tag_type: TagType,
}

impl ActiveDevice {
    pub fn new(uid: &[u8], tag_type: TagType) -> Self {
        Self {
            uid: TagUid::from_bytes(uid),
            tag_type,
        }
    }

    pub fn uid(&self) -> &TagUid {
        &self.uid
    }

    pub fn tag_type(&self) -> TagType {
        self.tag_type
    }
}

/// One RF front-end, owned by the lifecycle task.
///
/// All calls are transport transactions under the hood; implementations
/// sharing a bus with the interrupt path take the bus lock per transaction,
/// never across a full cycle.
pub trait RfPoller: Send {
    /// Front-end error reported by bring-up.
    type Error: fmt::Debug + Send;

    /// Runs one non-blocking discovery attempt. Returns the activated device
    /// once RF activation completes. A later call begins a fresh cycle.
    fn discover(&mut self) -> impl Future<Output = Option<ActiveDevice>> + Send;

    /// Ends the current activation. `active = false` drops the RF field
    /// entirely instead of keeping it up for an immediate re-discovery.
    fn deactivate(&mut self, active: bool) -> impl Future<Output = ()> + Send;

    /// Short-frame wake-up probe: is the last activated tag still in range?
    fn probe_presence(&mut self) -> impl Future<Output = bool> + Send;

    /// Puts the probed tag back into the halt state so the next full
    /// discovery pass does not re-activate it.
    fn sleep(&mut self) -> impl Future<Output = ()> + Send;

    /// Tears down and rebuilds front-end state. Used at bring-up and by the
    /// external watchdog reinitialize path.
    fn reinitialize(&mut self) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uid_copies_and_truncates() {
        let uid = TagUid::from_bytes(&[0x04, 0xA1, 0xB2, 0xC3]);
        assert_eq!(uid.as_bytes(), &[0x04, 0xA1, 0xB2, 0xC3]);

        let long = [0xAAu8; 16];
        assert_eq!(TagUid::from_bytes(&long).len(), MAX_UID_LEN);
    }

    #[test]
    fn uid_displays_as_hex() {
        let uid = TagUid::from_bytes(&[0x04, 0x0F, 0xB2]);
        assert_eq!(uid.to_string(), "040FB2");
        assert_eq!(TagUid::default().to_string(), "");
    }

    #[test]
    fn tag_type_classification() {
        assert_eq!(TagType::from_sens_res(0x44, 0x00), TagType::Ntag);
        assert_eq!(TagType::from_sens_res(0x04, 0x08), TagType::MifareClassic1k);
        assert_eq!(TagType::from_sens_res(0x02, 0x18), TagType::MifareClassic4k);
        assert_eq!(TagType::from_sens_res(0x00, 0x00), TagType::Unknown);
    }
}
