//! Device model and discovery.

use crate::catalog;
use crate::error::TransportError;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// A physical mouse as reported by discovery.
///
/// Protocol identity is `(vendor_id, product_id)`; `serial_number`
/// disambiguates several connected units of the same model.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MouseDevice {
    pub vendor_id: u16,
    pub product_id: u16,
    pub model_name: String,
    pub serial_number: String,
}

impl MouseDevice {
    pub fn new(
        vendor_id: u16,
        product_id: u16,
        model_name: impl Into<String>,
        serial_number: impl Into<String>,
    ) -> Self {
        Self {
            vendor_id,
            product_id,
            model_name: model_name.into(),
            serial_number: serial_number.into(),
        }
    }

    /// Whether this is the same physical unit as `other`.
    pub fn is_same_unit(&self, other: &MouseDevice) -> bool {
        self.vendor_id == other.vendor_id
            && self.product_id == other.product_id
            && self.serial_number == other.serial_number
    }
}

impl std::fmt::Display for MouseDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (VID: 0x{:04X}, PID: 0x{:04X}",
            self.model_name, self.vendor_id, self.product_id
        )?;
        if !self.serial_number.is_empty() {
            write!(f, ", serial: {}", self.serial_number)?;
        }
        write!(f, ")")
    }
}

/// Source of connected devices.
pub trait DeviceDiscovery {
    fn discover_connected_devices(&self) -> Result<Vec<MouseDevice>, TransportError>;
}

/// Discovery backed by hidapi enumeration.
///
/// Each physical mouse exposes several HID interfaces; they are collapsed
/// into one `MouseDevice` per (VID, PID, serial).
#[derive(Debug, Default)]
pub struct HidApiDiscovery;

impl DeviceDiscovery for HidApiDiscovery {
    fn discover_connected_devices(&self) -> Result<Vec<MouseDevice>, TransportError> {
        debug!("Starting HID device enumeration");
        let api = hidapi::HidApi::new()?;

        let mut devices: Vec<MouseDevice> = Vec::new();
        for info in api.device_list() {
            let model_name = info
                .product_string()
                .map(str::to_string)
                .unwrap_or_else(|| {
                    catalog::model_name(info.vendor_id(), info.product_id()).to_string()
                });
            let device = MouseDevice::new(
                info.vendor_id(),
                info.product_id(),
                model_name,
                info.serial_number().unwrap_or_default(),
            );
            if !devices.iter().any(|d| d.is_same_unit(&device)) {
                devices.push(device);
            }
        }

        debug!(count = devices.len(), "Device enumeration complete");
        Ok(devices)
    }
}

/// Discover connected devices and keep only those the catalog supports.
pub fn discover_supported_devices(
    discovery: &dyn DeviceDiscovery,
) -> Result<Vec<MouseDevice>, TransportError> {
    let supported: Vec<MouseDevice> = discovery
        .discover_connected_devices()?
        .into_iter()
        .filter(catalog::is_supported_device)
        .collect();

    for device in &supported {
        info!(
            model = %device.model_name,
            vid = format_args!("0x{:04X}", device.vendor_id),
            pid = format_args!("0x{:04X}", device.product_id),
            t50 = catalog::is_t50_device(device),
            "Found supported device"
        );
    }
    Ok(supported)
}

/// In-memory discovery returning a fixed device list.
#[derive(Debug, Default, Clone)]
pub struct StaticDiscovery {
    devices: Vec<MouseDevice>,
}

impl StaticDiscovery {
    pub fn new(devices: Vec<MouseDevice>) -> Self {
        Self { devices }
    }
}

impl DeviceDiscovery for StaticDiscovery {
    fn discover_connected_devices(&self) -> Result<Vec<MouseDevice>, TransportError> {
        Ok(self.devices.clone())
    }
}
