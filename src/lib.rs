//! # Fence Registry
//!
//! Platform-independent geofence registry and region-event dispatch core.
//!
//! This library provides:
//! - A bounded record store for circular geofence definitions (max 20,
//!   matching the simultaneous-region ceiling of mobile platforms)
//! - A boundary trait to the host OS geofencing capability
//! - Event dispatch that resolves enter/exit callbacks into notification
//!   payloads for the host's presentation layer
//! - A persistence bridge that serializes the store to a key-value blob store
//!
//! The host UI layer (map rendering, editing, alert presentation) is an
//! external collaborator: it calls into this core and receives payloads back.
//!
//! ## Features
//!
//! - **`persistence`** - SQLite-backed blob storage for the persistence bridge
//!
//! ## Quick Start
//!
//! ```rust
//! use fence_registry::{
//!     GeofenceRegistry, GeoPoint, TriggerType,
//!     monitor::SimulatedMonitor,
//!     persistence::{BlobBridge, InMemoryBlobStore},
//! };
//!
//! let monitor = SimulatedMonitor::new();
//! let bridge = BlobBridge::new(InMemoryBlobStore::new(), "saved_items");
//! let mut registry = GeofenceRegistry::load(monitor, bridge).unwrap();
//!
//! let added = registry
//!     .add_fence(GeoPoint::new(51.5074, -0.1278), 300.0, "Pick up kids", TriggerType::OnEntry)
//!     .unwrap();
//! assert_eq!(registry.count(), 1);
//! assert!(registry.find(&added.record.identifier).is_some());
//! ```

use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{FenceError, Result};

// Geographic utilities (haversine distance, circle containment)
pub mod geo;

// Bounded geofence record store
pub mod store;
pub use store::{RecordStore, MAX_MONITORED_REGIONS};

// Boundary trait to the platform geofencing capability
pub mod monitor;
pub use monitor::{FenceMonitor, MonitorCallback, RegionEvent, RegionEventKind, RegionSpec};

// Region-event resolution into notification payloads
pub mod dispatch;
pub use dispatch::{
    presentation_for, resolve_event, resolve_event_cold, NotificationPayload, Presentation,
};

// Key-value blob persistence for the record store
pub mod persistence;
pub use persistence::{BlobBridge, BlobStore, InMemoryBlobStore, PersistenceBridge};

// Registry context tying store, monitor and persistence together
pub mod registry;
pub use registry::{GeofenceRegistry, Registration, RegistrationOutcome, RegistryStats};

// ============================================================================
// Core Types
// ============================================================================

/// A GPS coordinate with latitude and longitude.
///
/// # Example
/// ```
/// use fence_registry::GeoPoint;
/// let point = GeoPoint::new(51.5074, -0.1278); // London
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Create a new GPS point.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }
}

/// When a geofence raises its notification: crossing in, or crossing out.
///
/// Exactly one applies per fence; "both" is deliberately not representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerType {
    OnEntry,
    OnExit,
}

impl TriggerType {
    /// Human-readable label, as shown in the host UI's fence summary.
    pub fn label(&self) -> &'static str {
        match self {
            TriggerType::OnEntry => "On Entry",
            TriggerType::OnExit => "On Exit",
        }
    }
}

/// A stored geofence definition.
///
/// The `identifier` is the join key between the record store, the platform
/// monitoring capability, and event dispatch. `radius` holds the radius the
/// user requested; the value actually registered with the platform may have
/// been clamped to the capability's maximum (see [`GeofenceRegistry`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeofenceRecord {
    /// Unique identifier, generated at creation time, immutable.
    pub identifier: String,
    /// Fence center, immutable after creation.
    pub center: GeoPoint,
    /// Requested radius in meters (positive).
    pub radius: f64,
    /// Free-form user note; may be empty.
    pub note: String,
    /// Whether this fence notifies on entry or on exit.
    pub trigger: TriggerType,
}

impl GeofenceRecord {
    /// Create a record with a freshly generated UUID identifier.
    pub fn new(
        center: GeoPoint,
        radius: f64,
        note: impl Into<String>,
        trigger: TriggerType,
    ) -> Self {
        Self {
            identifier: uuid::Uuid::new_v4().to_string(),
            center,
            radius,
            note: note.into(),
            trigger,
        }
    }

    /// Display label for this fence: the note, or `"No Note"` when empty.
    pub fn display_label(&self) -> &str {
        if self.note.is_empty() {
            "No Note"
        } else {
            &self.note
        }
    }

    /// One-line summary for list/callout display.
    pub fn summary(&self) -> String {
        format!("Radius: {}m - {}", self.radius, self.trigger.label())
    }

    /// Check whether a position lies inside this fence's stored radius.
    pub fn contains(&self, point: &GeoPoint) -> bool {
        geo::haversine_distance(&self.center, point) <= self.radius
    }
}

// ============================================================================
// Tests
// ============================================================================
