//! Boundary interface to the platform geofencing capability.
//!
//! The core never talks to an OS location service directly; it goes through
//! the [`FenceMonitor`] trait. Hosts implement the trait over their platform
//! API (Core Location, Google Play Services, ...). [`SimulatedMonitor`] is an
//! in-memory implementation that tracks a device position and synthesizes
//! boundary-crossing events; tests and desktop demos use it.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{FenceError, Result};
use crate::{geo, GeoPoint, GeofenceRecord, TriggerType};

// ============================================================================
// Types
// ============================================================================

/// A circular region as handed to the platform for monitoring.
///
/// `radius` here is the *effective* (possibly clamped) radius, which may be
/// smaller than the radius stored on the originating record. The two notify
/// flags are set mutually exclusively from the record's trigger type, so the
/// platform only ever raises the event kind the fence cares about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionSpec {
    pub identifier: String,
    pub center: GeoPoint,
    pub radius: f64,
    pub notify_on_entry: bool,
    pub notify_on_exit: bool,
}

impl RegionSpec {
    /// Build the region to register for a record, with the radius already
    /// clamped to the capability's maximum.
    pub fn for_record(record: &GeofenceRecord, clamped_radius: f64) -> Self {
        let notify_on_entry = record.trigger == TriggerType::OnEntry;
        Self {
            identifier: record.identifier.clone(),
            center: record.center,
            radius: clamped_radius,
            notify_on_entry,
            notify_on_exit: !notify_on_entry,
        }
    }
}

/// Kind of boundary crossing the platform observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegionEventKind {
    Enter,
    Exit,
}

/// An inbound region event pushed by the platform, keyed by identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionEvent {
    pub identifier: String,
    pub kind: RegionEventKind,
}

impl RegionEvent {
    pub fn new(identifier: impl Into<String>, kind: RegionEventKind) -> Self {
        Self {
            identifier: identifier.into(),
            kind,
        }
    }
}

/// The full inbound callback surface pushed by the platform.
///
/// Hosts translate their platform's delegate callbacks into these tagged
/// variants; the core never inspects platform object types at runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum MonitorCallback {
    /// A boundary crossing for a monitored region.
    Region(RegionEvent),
    /// Monitoring failed for one region.
    MonitoringFailed {
        identifier: String,
        reason: String,
    },
    /// A failure not tied to any region.
    Failure { reason: String },
}

// ============================================================================
// Monitor Trait
// ============================================================================

/// The platform geofence monitoring capability, as consumed by the core.
pub trait FenceMonitor {
    /// Capability probe: does the device support region monitoring at all?
    fn is_supported(&self) -> bool;

    /// Whether the environment currently permits background monitoring.
    ///
    /// Registration proceeds even when this is false: the platform accepts
    /// regions while unauthorized and activates them once authorization is
    /// granted, so "can I store this fence" is decoupled from "can the
    /// platform currently notify me about it".
    fn authorization_granted(&self) -> bool;

    /// Largest radius in meters the platform will monitor.
    fn maximum_monitoring_distance(&self) -> f64;

    /// Register a region for monitoring.
    ///
    /// Idempotent per identifier: re-registering replaces the prior
    /// registration.
    fn start_monitoring(&mut self, region: &RegionSpec) -> Result<()>;

    /// Deregister a region. `NotFound` if the identifier is not registered.
    fn stop_monitoring(&mut self, identifier: &str) -> Result<()>;

    /// Identifiers of all currently registered regions.
    fn active_regions(&self) -> HashSet<String>;
}

// ============================================================================
// Simulated Monitor
// ============================================================================

/// In-memory monitoring capability with a simulated device position.
///
/// Crossing detection mirrors the platform contract: an event is raised only
/// on a boundary *crossing*, so a region the device is already inside at
/// registration time raises nothing until the device leaves it.
#[derive(Debug, Clone)]
pub struct SimulatedMonitor {
    supported: bool,
    authorized: bool,
    max_distance: f64,
    regions: HashMap<String, RegionSpec>,
    /// Identifiers whose region currently contains the device.
    inside: HashSet<String>,
    position: Option<GeoPoint>,
}

impl SimulatedMonitor {
    /// Create a supported, authorized monitor with a typical platform
    /// maximum radius.
    pub fn new() -> Self {
        Self {
            supported: true,
            authorized: true,
            // Core Location reports ~400km on current hardware
            max_distance: 400_000.0,
            regions: HashMap::new(),
            inside: HashSet::new(),
            position: None,
        }
    }

    /// Override the capability probe (for unsupported-device scenarios).
    pub fn set_supported(&mut self, supported: bool) {
        self.supported = supported;
    }

    /// Override the authorization signal.
    pub fn set_authorization(&mut self, granted: bool) {
        self.authorized = granted;
    }

    /// Override the maximum monitorable radius.
    pub fn set_maximum_monitoring_distance(&mut self, meters: f64) {
        self.max_distance = meters;
    }

    /// The registered spec for an identifier, if any.
    pub fn region(&self, identifier: &str) -> Option<&RegionSpec> {
        self.regions.get(identifier)
    }

    /// Move the simulated device and collect the boundary-crossing events the
    /// registered regions' notify flags allow.
    ///
    /// The first position fix establishes inside/outside state without
    /// raising events, matching platforms that only report crossings.
    pub fn move_to(&mut self, position: GeoPoint) -> Vec<RegionEvent> {
        let had_fix = self.position.is_some();
        self.position = Some(position);

        let mut events = Vec::new();
        for (identifier, region) in &self.regions {
            let now_inside = geo::within_radius(&region.center, &position, region.radius);
            let was_inside = self.inside.contains(identifier);

            if now_inside == was_inside {
                continue;
            }
            if had_fix {
                if now_inside && region.notify_on_entry {
                    events.push(RegionEvent::new(identifier.clone(), RegionEventKind::Enter));
                } else if !now_inside && region.notify_on_exit {
                    events.push(RegionEvent::new(identifier.clone(), RegionEventKind::Exit));
                }
            }
        }

        // Recompute membership after the borrow of regions ends
        self.inside = self
            .regions
            .iter()
            .filter(|(_, r)| geo::within_radius(&r.center, &position, r.radius))
            .map(|(id, _)| id.clone())
            .collect();

        events
    }
}

impl Default for SimulatedMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl FenceMonitor for SimulatedMonitor {
    fn is_supported(&self) -> bool {
        self.supported
    }

    fn authorization_granted(&self) -> bool {
        self.authorized
    }

    fn maximum_monitoring_distance(&self) -> f64 {
        self.max_distance
    }

    fn start_monitoring(&mut self, region: &RegionSpec) -> Result<()> {
        if !self.supported {
            return Err(FenceError::MonitoringUnsupported);
        }
        // A region registered while the device is already inside must not
        // raise an entry event; seed membership from the current fix.
        if let Some(position) = self.position {
            if geo::within_radius(&region.center, &position, region.radius) {
                self.inside.insert(region.identifier.clone());
            } else {
                self.inside.remove(&region.identifier);
            }
        }
        self.regions.insert(region.identifier.clone(), region.clone());
        Ok(())
    }

    fn stop_monitoring(&mut self, identifier: &str) -> Result<()> {
        if self.regions.remove(identifier).is_none() {
            return Err(FenceError::not_found(identifier));
        }
        self.inside.remove(identifier);
        Ok(())
    }

    fn active_regions(&self) -> HashSet<String> {
        self.regions.keys().cloned().collect()
    }
}
