//! Performance profiles and the apply-profile use case.

use crate::catalog;
use crate::device::MouseDevice;
use crate::error::{Error, Result, TransportError};
use crate::safety;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

/// A user-requested configuration, independent of transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceProfile {
    pub dpi: u32,
    pub polling_rate_hz: u32,
    pub lift_off_distance: u32,
}

impl PerformanceProfile {
    pub fn new(dpi: u32, polling_rate_hz: u32, lift_off_distance: u32) -> Self {
        Self {
            dpi,
            polling_rate_hz,
            lift_off_distance,
        }
    }
}

impl Default for PerformanceProfile {
    fn default() -> Self {
        Self {
            dpi: 800,
            polling_rate_hz: 1000,
            lift_off_distance: 2,
        }
    }
}

/// Parse a profile from JSON.
pub fn parse_profile(json: &str) -> Result<PerformanceProfile> {
    serde_json::from_str(json).map_err(|e| Error::Profile(e.to_string()))
}

/// Load a profile from a JSON file.
pub fn load_profile(path: &Path) -> Result<PerformanceProfile> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| Error::Profile(format!("{}: {e}", path.display())))?;
    let profile = parse_profile(&text)?;
    debug!(path = %path.display(), ?profile, "Loaded profile");
    Ok(profile)
}

/// Receiver of validated performance profiles.
pub trait ProfileSink {
    fn apply_performance_profile(
        &self,
        device: &MouseDevice,
        profile: &PerformanceProfile,
    ) -> std::result::Result<(), TransportError>;
}

/// Validate a profile and hand it to `sink` for a supported device.
pub fn apply_performance_profile(
    sink: &dyn ProfileSink,
    device: &MouseDevice,
    profile: &PerformanceProfile,
) -> Result<()> {
    safety::validate_profile(profile)?;
    catalog::require_supported(device)?;
    sink.apply_performance_profile(device, profile)
        .map_err(|source| Error::TransportReadFailed { opcode: 0, source })?;
    info!(
        device = %device,
        dpi = profile.dpi,
        polling_rate_hz = profile.polling_rate_hz,
        lift_off_distance = profile.lift_off_distance,
        "Applied performance profile"
    );
    Ok(())
}

/// Sink that records what it was given. Used for dry runs and tests.
#[derive(Debug, Default)]
pub struct InMemoryProfileSink {
    failure: Option<String>,
    last: Mutex<Option<(MouseDevice, PerformanceProfile)>>,
}

impl InMemoryProfileSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink that rejects every profile with `reason`.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            failure: Some(reason.into()),
            last: Mutex::new(None),
        }
    }

    /// Last accepted device and profile.
    pub fn last_applied(&self) -> Option<(MouseDevice, PerformanceProfile)> {
        self.last
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl ProfileSink for InMemoryProfileSink {
    fn apply_performance_profile(
        &self,
        device: &MouseDevice,
        profile: &PerformanceProfile,
    ) -> std::result::Result<(), TransportError> {
        if let Some(reason) = &self.failure {
            return Err(TransportError::Hid(reason.clone()));
        }
        *self
            .last
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some((device.clone(), *profile));
        Ok(())
    }
}
