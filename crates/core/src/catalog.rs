//! Supported device catalog and protocol routing.
//!
//! The supported device set is closed: routing is a static match on
//! vendor/product IDs rather than a runtime capability probe.

use crate::device::MouseDevice;
use crate::error::{Error, Result};
use crate::{pids, A4TECH_VID};

/// Vendor IDs accepted by this tool.
pub const SUPPORTED_VENDOR_IDS: &[u16] = &[A4TECH_VID];

/// Protocol family a supported device is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceFamily {
    /// Bloody T50: speaks the T50 vendor packet protocol.
    T50,
    /// Any other Bloody-vendor device: recognized but no vendor protocol.
    BloodyGeneric,
}

impl DeviceFamily {
    pub fn name(&self) -> &'static str {
        match self {
            Self::T50 => "T50",
            Self::BloodyGeneric => "Bloody (generic)",
        }
    }
}

/// Whether the device's vendor ID is in the supported set.
pub fn is_supported_device(device: &MouseDevice) -> bool {
    SUPPORTED_VENDOR_IDS.contains(&device.vendor_id)
}

/// Vendor-only check used before product-level dispatch.
pub fn is_bloody_vendor_device(device: &MouseDevice) -> bool {
    device.vendor_id == A4TECH_VID
}

/// Whether the device matches the T50 product signature.
pub fn is_t50_device(device: &MouseDevice) -> bool {
    is_bloody_vendor_device(device) && pids::T50_FAMILY.contains(&device.product_id)
}

/// Resolve the protocol family, or `None` for unsupported devices.
pub fn family(device: &MouseDevice) -> Option<DeviceFamily> {
    if !is_supported_device(device) {
        None
    } else if is_t50_device(device) {
        Some(DeviceFamily::T50)
    } else {
        Some(DeviceFamily::BloodyGeneric)
    }
}

/// Gate for T50 vendor exchanges.
pub fn require_t50(device: &MouseDevice) -> Result<()> {
    if is_t50_device(device) {
        Ok(())
    } else {
        Err(Error::UnsupportedDevice {
            vid: device.vendor_id,
            pid: device.product_id,
        })
    }
}

/// Gate for any supported device.
pub fn require_supported(device: &MouseDevice) -> Result<()> {
    if is_supported_device(device) {
        Ok(())
    } else {
        Err(Error::UnsupportedDevice {
            vid: device.vendor_id,
            pid: device.product_id,
        })
    }
}

/// Catalog model name for a VID/PID pair.
pub fn model_name(vid: u16, pid: u16) -> &'static str {
    match (vid, pid) {
        (A4TECH_VID, pids::T50) => "Bloody T50",
        (A4TECH_VID, pids::T50_RGB) => "Bloody T50 RGB",
        (A4TECH_VID, _) => "Bloody mouse",
        _ => "Unknown device",
    }
}
