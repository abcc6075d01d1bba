//! NDEF reader boundary.
//!
//! NDEF detection and decoding are the codec library's job; the engine only
//! needs the decoded view of one message per activation. [`DecodedMessage`]
//! borrows the caller's buffer, so nothing read here can outlive the next
//! read cycle.

use std::future::Future;

use thiserror::Error;

use crate::rf::ActiveDevice;

/// Type Name Format of an NDEF record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tnf {
    Empty,
    WellKnown,
    Mime,
    AbsoluteUri,
    External,
    Unknown,
    Unchanged,
}

/// One decoded record, viewing the decode buffer.
#[derive(Debug, Clone, Copy)]
pub struct NdefRecord<'buf> {
    pub tnf: Tnf,
    pub record_type: &'buf [u8],
    pub payload: &'buf [u8],
}

/// A decoded NDEF message. Lives only as long as the buffer the reader
/// decoded into.
#[derive(Debug)]
pub struct DecodedMessage<'buf> {
    records: Vec<NdefRecord<'buf>>,
}

impl<'buf> DecodedMessage<'buf> {
    pub fn new(records: Vec<NdefRecord<'buf>>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[NdefRecord<'buf>] {
        &self.records
    }

    /// Payload bytes of the first record, where the appliance keeps its
    /// application data.
    pub fn first_payload(&self) -> Option<&'buf [u8]> {
        self.records.first().map(|record| record.payload)
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum NdefError {
    #[error("tag is not ndef formatted")]
    NotNdefFormatted,
    #[error("ndef detect failed")]
    DetectFailed,
    #[error("ndef read failed")]
    ReadFailed,
    #[error("ndef message too large ({0} bytes)")]
    MessageTooLarge(usize),
}

/// One-shot NDEF read + decode against an activated device.
pub trait NdefReader: Send {
    /// Reads the raw message into `buf` and decodes it. Fails with
    /// [`NdefError::MessageTooLarge`] when the raw message exceeds the
    /// buffer; no truncated message is ever returned.
    fn read<'buf>(
        &mut self,
        device: &ActiveDevice,
        buf: &'buf mut [u8],
    ) -> impl Future<Output = Result<DecodedMessage<'buf>, NdefError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_payload_of_empty_message_is_none() {
        let message = DecodedMessage::new(Vec::new());
        assert!(message.first_payload().is_none());
    }

    #[test]
    fn first_payload_picks_first_record() {
        let buf = *b"abcdef";
        let records = vec![
            NdefRecord {
                tnf: Tnf::WellKnown,
                record_type: b"T",
                payload: &buf[..3],
            },
            NdefRecord {
                tnf: Tnf::Mime,
                record_type: b"x/y",
                payload: &buf[3..],
            },
        ];
        let message = DecodedMessage::new(records);
        assert_eq!(message.first_payload(), Some(&b"abc"[..]));
    }
}
