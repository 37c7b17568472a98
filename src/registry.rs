//! # Geofence Registry
//!
//! The context object tying record store, platform monitor and persistence
//! together. Hosts construct one registry per entry point — the interactive
//! UI flow and the cold background-relaunch flow each build their own over
//! the same durable store — so there is no ambient global state to reach for.
//!
//! ## Flows
//!
//! - **Add**: validate capacity, generate an identifier, clamp the radius to
//!   the platform maximum for registration (the record keeps the requested
//!   value), register with the monitor, persist the whole store.
//! - **Remove**: deregister monitoring and drop the record as one logical
//!   operation, then persist. No registration ever outlives its record.
//! - **Event**: delegate to the dispatcher against the live store.

use crate::dispatch::{self, NotificationPayload};
use crate::error::{FenceError, Result};
use crate::monitor::{FenceMonitor, MonitorCallback, RegionEvent, RegionSpec};
use crate::persistence::PersistenceBridge;
use crate::store::{RecordStore, MAX_MONITORED_REGIONS};
use crate::{GeoPoint, GeofenceRecord, TriggerType};

// ============================================================================
// Types
// ============================================================================

/// Whether a newly registered fence is being watched right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationOutcome {
    /// The platform is actively monitoring the region.
    Monitored,
    /// Saved and registered, but the platform will only start watching once
    /// the user grants location authorization.
    AwaitingAuthorization,
}

/// Result of a successful `add_fence`.
#[derive(Debug, Clone)]
pub struct Registration {
    /// The stored record, with its generated identifier and the radius as
    /// requested (not as clamped for the platform).
    pub record: GeofenceRecord,
    pub outcome: RegistrationOutcome,
}

/// Registry counters for the host UI (fence counter, add-button gating).
#[derive(Debug, Clone, PartialEq)]
pub struct RegistryStats {
    pub record_count: u32,
    pub capacity: u32,
    pub monitored_count: u32,
    pub monitoring_supported: bool,
    pub authorization_granted: bool,
}

// ============================================================================
// Registry
// ============================================================================

/// Geofence registry context: owns the record store and coordinates the
/// platform monitor and the persistence bridge.
pub struct GeofenceRegistry<M: FenceMonitor, B: PersistenceBridge> {
    store: RecordStore,
    monitor: M,
    bridge: B,
}

impl<M: FenceMonitor, B: PersistenceBridge> GeofenceRegistry<M, B> {
    /// Construct a registry by loading the durable store.
    ///
    /// Safe as a cold entry point: only the bridge needs to hold state.
    /// Monitoring registrations are platform-durable and are not re-issued
    /// here.
    pub fn load(monitor: M, bridge: B) -> Result<Self> {
        let records = bridge.load_all()?;
        let store = RecordStore::from_records(records);
        log::info!("[Registry] Loaded {} fences", store.count());
        Ok(Self {
            store,
            monitor,
            bridge,
        })
    }

    /// Create, register and persist a new fence.
    ///
    /// The radius handed to the platform is clamped to
    /// `maximum_monitoring_distance()`; the stored record keeps the
    /// requested value. Refused outright when the device has no monitoring
    /// capability. Missing authorization is not a refusal: the fence is
    /// saved and registered, and the outcome reports that monitoring starts
    /// once authorization is granted.
    pub fn add_fence(
        &mut self,
        center: GeoPoint,
        radius: f64,
        note: impl Into<String>,
        trigger: TriggerType,
    ) -> Result<Registration> {
        if !self.monitor.is_supported() {
            return Err(FenceError::MonitoringUnsupported);
        }

        let record = GeofenceRecord::new(center, radius, note, trigger);
        self.store.add(record.clone())?;

        let max = self.monitor.maximum_monitoring_distance();
        let clamped = if radius > max { max } else { radius };
        let region = RegionSpec::for_record(&record, clamped);

        if let Err(e) = self.monitor.start_monitoring(&region) {
            // Keep the no-dangling invariant bidirectionally honest: a fence
            // the platform refused synchronously is not kept around.
            let _ = self.store.remove(&record.identifier);
            return Err(e);
        }

        self.bridge.save_all(&self.store.all())?;

        let outcome = if self.monitor.authorization_granted() {
            log::info!("[Registry] Added fence '{}' ({})", record.identifier, record.summary());
            RegistrationOutcome::Monitored
        } else {
            log::warn!(
                "[Registry] Fence '{}' saved; monitoring activates once location access is granted",
                record.identifier
            );
            RegistrationOutcome::AwaitingAuthorization
        };

        Ok(Registration { record, outcome })
    }

    /// Deregister and remove a fence, then persist.
    ///
    /// `NotFound` when no record matches. An adapter-side miss during
    /// deregistration is tolerated with a warning; the record is removed
    /// regardless, so no registration can outlive its record.
    pub fn remove_fence(&mut self, identifier: &str) -> Result<GeofenceRecord> {
        if self.store.find(identifier).is_none() {
            return Err(FenceError::not_found(identifier));
        }

        if let Err(e) = self.monitor.stop_monitoring(identifier) {
            log::warn!("[Registry] Deregistration of '{}' reported: {}", identifier, e);
        }
        let record = self.store.remove(identifier)?;
        self.bridge.save_all(&self.store.all())?;

        log::info!("[Registry] Removed fence '{}'", identifier);
        Ok(record)
    }

    /// Resolve an inbound region event against the live store.
    pub fn handle_event(&self, event: &RegionEvent) -> Option<NotificationPayload> {
        dispatch::resolve_event(&self.store, event)
    }

    /// Handle any inbound platform callback.
    ///
    /// Region events resolve to a payload for the presentation layer;
    /// failure callbacks are logged and produce none.
    pub fn handle_callback(&self, callback: &MonitorCallback) -> Option<NotificationPayload> {
        match callback {
            MonitorCallback::Region(event) => self.handle_event(event),
            MonitorCallback::MonitoringFailed { identifier, reason } => {
                self.note_monitoring_failure(identifier, reason);
                None
            }
            MonitorCallback::Failure { reason } => {
                self.note_failure(reason);
                None
            }
        }
    }

    /// Platform reported a monitoring failure for one region.
    ///
    /// Log-worthy, non-fatal; the record store is untouched.
    pub fn note_monitoring_failure(&self, identifier: &str, reason: &str) {
        log::error!(
            "[Registry] Monitoring failed for region '{}': {}",
            identifier,
            reason
        );
    }

    /// Platform reported a failure not tied to any region.
    pub fn note_failure(&self, reason: &str) {
        log::error!("[Registry] Location capability failure: {}", reason);
    }

    /// Stop monitoring any active region that no longer has a record.
    ///
    /// Returns the number of registrations swept.
    pub fn sweep_dangling(&mut self) -> usize {
        let dangling: Vec<String> = self
            .monitor
            .active_regions()
            .into_iter()
            .filter(|id| self.store.find(id).is_none())
            .collect();

        for identifier in &dangling {
            if let Err(e) = self.monitor.stop_monitoring(identifier) {
                log::warn!("[Registry] Sweep of '{}' reported: {}", identifier, e);
            } else {
                log::info!("[Registry] Swept dangling registration '{}'", identifier);
            }
        }
        dangling.len()
    }

    /// Look up a stored fence.
    pub fn find(&self, identifier: &str) -> Option<&GeofenceRecord> {
        self.store.find(identifier)
    }

    /// Snapshot of all fences in insertion order.
    pub fn records(&self) -> Vec<GeofenceRecord> {
        self.store.all()
    }

    /// Number of stored fences.
    pub fn count(&self) -> usize {
        self.store.count()
    }

    /// Whether another fence can be added (drives the host's add button).
    pub fn can_add(&self) -> bool {
        !self.store.is_full()
    }

    /// Registry statistics for the host UI.
    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            record_count: self.store.count() as u32,
            capacity: MAX_MONITORED_REGIONS as u32,
            monitored_count: self.monitor.active_regions().len() as u32,
            monitoring_supported: self.monitor.is_supported(),
            authorization_granted: self.monitor.authorization_granted(),
        }
    }

    /// Borrow the underlying monitor (host adapters, tests).
    pub fn monitor(&self) -> &M {
        &self.monitor
    }

    /// Mutably borrow the underlying monitor.
    pub fn monitor_mut(&mut self) -> &mut M {
        &mut self.monitor
    }
}
