//! t50ctl-core: T50 vendor protocol, device catalog, and profile policy.
//!
//! This crate provides the cross-platform core logic for configuring Bloody
//! T50 mice through fixed-size vendor packets carried in HID feature reports.
//! Transport and discovery are traits; the CLI supplies the hidapi-backed
//! implementations.

pub mod catalog;
pub mod core_slot;
pub mod device;
pub mod dpi;
pub mod error;
pub mod flash;
#[cfg(test)]
mod integration_tests;
pub mod lighting;
pub mod packet;
pub mod profile;
pub mod safety;
pub mod save;
pub mod transport;

/// A4Tech (Bloody) USB Vendor ID.
pub const A4TECH_VID: u16 = 0x09DA;

/// Known Bloody product IDs.
pub mod pids {
    /// Bloody T50.
    pub const T50: u16 = 0x7F1B;
    /// Bloody T50 RGB revision.
    pub const T50_RGB: u16 = 0x7F1C;

    /// Product IDs speaking the T50 vendor protocol.
    pub const T50_FAMILY: &[u16] = &[T50, T50_RGB];
}

/// Vendor packet length in bytes, report ID included.
pub fn packet_length() -> usize {
    packet::PACKET_LEN
}

/// Feature report ID used for vendor packets.
pub fn report_id() -> u8 {
    packet::REPORT_ID
}
