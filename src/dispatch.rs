//! Region-event resolution into notification payloads.
//!
//! The platform pushes enter/exit callbacks keyed by region identifier, at
//! arbitrary times: while the host is foregrounded, backgrounded, or even
//! freshly relaunched just to deliver the event. Resolution therefore comes
//! in two shapes: against a live [`RecordStore`], and as a cold entry point
//! that rebuilds the store from the persistence bridge alone.
//!
//! Dispatch is best-effort by design: an event whose identifier no longer
//! matches a stored record is logged and discarded, never fatal (unlike a
//! dropped storage record, a dropped notification is acceptable).

use serde::{Deserialize, Serialize};

use crate::monitor::{RegionEvent, RegionEventKind};
use crate::persistence::PersistenceBridge;
use crate::store::RecordStore;

/// What the host's presentation layer should show for a region event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub title: Option<String>,
    pub body: String,
}

/// How the host should deliver a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presentation {
    /// Show an in-app alert (host is foregrounded).
    ForegroundAlert,
    /// Post a system notification (host is backgrounded or not running).
    SystemNotification,
}

/// Map the host-supplied foreground signal to a delivery mode.
///
/// Whether the process is foregrounded is decided by the caller, never by
/// this core.
pub fn presentation_for(foregrounded: bool) -> Presentation {
    if foregrounded {
        Presentation::ForegroundAlert
    } else {
        Presentation::SystemNotification
    }
}

/// Resolve a region event against the store.
///
/// Returns `None` when no record matches the identifier. A hit produces the
/// record's display label as the body regardless of the event kind: the
/// monitor's notify flags are set mutually exclusively at registration time,
/// so a "wrong-kind" event should never arrive, but if one does the fence's
/// note is still the right thing to surface.
pub fn resolve_event(store: &RecordStore, event: &RegionEvent) -> Option<NotificationPayload> {
    match store.find(&event.identifier) {
        Some(record) => {
            log::info!(
                "[Dispatcher] {} event for region '{}'",
                kind_label(event.kind),
                event.identifier
            );
            Some(NotificationPayload {
                title: None,
                body: record.display_label().to_string(),
            })
        }
        None => {
            log::debug!(
                "[Dispatcher] Discarding {} event for unknown region '{}'",
                kind_label(event.kind),
                event.identifier
            );
            None
        }
    }
}

/// Cold entry point: rebuild the store from durable state and resolve.
///
/// The platform may relaunch the host process solely to deliver a region
/// event; in that path nothing but the persistence bridge is initialized. A
/// bridge load failure is treated like a lookup miss (logged, event dropped).
pub fn resolve_event_cold<B: PersistenceBridge>(
    bridge: &B,
    event: &RegionEvent,
) -> Option<NotificationPayload> {
    let records = match bridge.load_all() {
        Ok(records) => records,
        Err(e) => {
            log::error!("[Dispatcher] Cold load failed, dropping event: {}", e);
            return None;
        }
    };
    let store = RecordStore::from_records(records);
    resolve_event(&store, event)
}

fn kind_label(kind: RegionEventKind) -> &'static str {
    match kind {
        RegionEventKind::Enter => "enter",
        RegionEventKind::Exit => "exit",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::RegionEvent;
    use crate::persistence::{BlobBridge, InMemoryBlobStore};
    use crate::{GeoPoint, GeofenceRecord, TriggerType};

    fn store_with(records: Vec<GeofenceRecord>) -> RecordStore {
        RecordStore::from_records(records)
    }

    #[test]
    fn test_enter_event_yields_note_body() {
        let record = GeofenceRecord::new(
            GeoPoint::new(51.5074, -0.1278),
            150.0,
            "Pick up kids",
            TriggerType::OnEntry,
        );
        let id = record.identifier.clone();
        let store = store_with(vec![record]);

        let payload = resolve_event(&store, &RegionEvent::new(id, RegionEventKind::Enter)).unwrap();
        assert_eq!(payload.title, None);
        assert_eq!(payload.body, "Pick up kids");
    }

    #[test]
    fn test_exit_event_with_empty_note_yields_no_note() {
        let record =
            GeofenceRecord::new(GeoPoint::new(51.5074, -0.1278), 150.0, "", TriggerType::OnExit);
        let id = record.identifier.clone();
        let store = store_with(vec![record]);

        let payload = resolve_event(&store, &RegionEvent::new(id, RegionEventKind::Exit)).unwrap();
        assert_eq!(payload.body, "No Note");
    }

    #[test]
    fn test_unknown_identifier_is_discarded() {
        let store = store_with(vec![]);
        let payload = resolve_event(&store, &RegionEvent::new("ghost", RegionEventKind::Enter));
        assert!(payload.is_none());
    }

    #[test]
    fn test_wrong_kind_event_still_surfaces_note() {
        // Entry-only fence receiving an exit event: surfaced, not dropped
        let record = GeofenceRecord::new(
            GeoPoint::new(51.5074, -0.1278),
            150.0,
            "Gym",
            TriggerType::OnEntry,
        );
        let id = record.identifier.clone();
        let store = store_with(vec![record]);

        let payload = resolve_event(&store, &RegionEvent::new(id, RegionEventKind::Exit)).unwrap();
        assert_eq!(payload.body, "Gym");
    }

    #[test]
    fn test_presentation_follows_foreground_signal() {
        assert_eq!(presentation_for(true), Presentation::ForegroundAlert);
        assert_eq!(presentation_for(false), Presentation::SystemNotification);
    }

    #[test]
    fn test_cold_resolution_from_bridge_alone() {
        let record = GeofenceRecord::new(
            GeoPoint::new(51.5074, -0.1278),
            150.0,
            "Dentist",
            TriggerType::OnEntry,
        );
        let id = record.identifier.clone();

        let mut bridge = BlobBridge::new(InMemoryBlobStore::new(), "saved_items");
        bridge.save_all(&[record]).unwrap();

        // No registry, no monitor: only durable state exists
        let payload =
            resolve_event_cold(&bridge, &RegionEvent::new(id, RegionEventKind::Enter)).unwrap();
        assert_eq!(payload.body, "Dentist");
    }

    #[test]
    fn test_cold_resolution_with_empty_bridge() {
        let bridge = BlobBridge::new(InMemoryBlobStore::new(), "saved_items");
        let payload = resolve_event_cold(&bridge, &RegionEvent::new("x", RegionEventKind::Exit));
        assert!(payload.is_none());
    }
}
