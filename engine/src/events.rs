//! Lifecycle event emission.
//!
//! The engine is the single producer; consumers get owned copies through a
//! bounded channel and can fall back on the level-triggered present flag
//! when a dropped event would leave them behind.

use std::time::Duration;

use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tracing::debug;

use crate::rf::TagUid;

/// One lifecycle event per tag dwell edge. `Placed` always precedes the
/// matching `Removed`; the sequence never repeats an edge.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TagEvent {
    /// A validated tag entered the field. Identity and payload are owned
    /// copies, never views into reader memory.
    Placed { uid: TagUid, payload: Vec<u8> },
    /// The tag left the field.
    Removed,
}

/// Producer side of the event channel and present flag.
pub(crate) struct EventSink {
    events: mpsc::Sender<TagEvent>,
    present: watch::Sender<bool>,
    timeout: Duration,
}

impl EventSink {
    pub(crate) fn new(
        events: mpsc::Sender<TagEvent>,
        present: watch::Sender<bool>,
        timeout: Duration,
    ) -> Self {
        Self {
            events,
            present,
            timeout,
        }
    }

    pub(crate) async fn tag_placed(&self, uid: TagUid, payload: Vec<u8>) {
        self.emit(TagEvent::Placed { uid, payload }).await;
        self.present.send_replace(true);
    }

    pub(crate) async fn tag_removed(&self) {
        self.emit(TagEvent::Removed).await;
        self.present.send_replace(false);
    }

    /// Best-effort delivery: a full queue stalls the lifecycle loop for at
    /// most `timeout`, then the event is dropped. The present flag stays
    /// authoritative either way.
    async fn emit(&self, event: TagEvent) {
        if let Err(err) = self.events.send_timeout(event, self.timeout).await {
            debug!("lifecycle event dropped: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placed_serializes_with_hex_uid() {
        let event = TagEvent::Placed {
            uid: TagUid::from_bytes(&[0x04, 0xA1]),
            payload: b"scp:42".to_vec(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "placed");
        assert_eq!(json["uid"], "04A1");
    }

    #[test]
    fn removed_serializes_as_bare_tag() {
        let json = serde_json::to_value(TagEvent::Removed).unwrap();
        assert_eq!(json["type"], "removed");
    }

    #[tokio::test(start_paused = true)]
    async fn emit_drops_event_when_queue_stays_full() {
        let (event_tx, mut event_rx) = mpsc::channel(1);
        let (present_tx, present_rx) = watch::channel(false);
        let sink = EventSink::new(event_tx, present_tx, Duration::from_millis(100));

        sink.tag_placed(TagUid::from_bytes(&[1]), b"scp:a".to_vec())
            .await;
        // Queue is now full and nobody drains it; the removal gets dropped
        // but the flag still flips.
        sink.tag_removed().await;
        assert!(!*present_rx.borrow());

        let first = event_rx.try_recv().unwrap();
        assert!(matches!(first, TagEvent::Placed { .. }));
        assert!(event_rx.try_recv().is_err());
    }
}
