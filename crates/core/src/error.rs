//! Error types for t50ctl-core.

use thiserror::Error;

/// Failure reported by the feature-report transport boundary.
#[derive(Debug, Error)]
pub enum TransportError {
    /// HID device communication failure.
    #[error("HID error: {0}")]
    Hid(String),

    /// Device not found or no longer connected.
    #[error("device not found: {0}")]
    DeviceNotFound(String),

    /// Permission denied (udev rule missing, or exclusive access on Windows).
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Operation timed out.
    #[error("timeout: {0}")]
    Timeout(String),
}

impl From<hidapi::HidError> for TransportError {
    fn from(e: hidapi::HidError) -> Self {
        let msg = e.to_string();
        let lower = msg.to_lowercase();
        if lower.contains("permission denied") || lower.contains("access is denied") {
            TransportError::PermissionDenied(msg)
        } else {
            TransportError::Hid(msg)
        }
    }
}

/// Core library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Payload offset points past the packet's payload region.
    #[error("invalid payload offset {offset} (payload region is {max} bytes)")]
    InvalidPayloadOffset { offset: usize, max: usize },

    /// Payload does not fit in the payload region once the offset is applied.
    #[error("payload too large: {len} bytes at offset {offset} (payload region is {max} bytes)")]
    PayloadTooLarge { offset: usize, len: usize, max: usize },

    /// Response shorter than a full vendor packet.
    #[error("response too short: {len} bytes (minimum {min})")]
    ResponseTooShort { len: usize, min: usize },

    /// Response does not carry the vendor report ID.
    #[error("unexpected report ID in response: 0x{actual:02X} (expected 0x{expected:02X})")]
    UnexpectedReportId { expected: u8, actual: u8 },

    /// The transport failed while exchanging a packet.
    #[error("transport failed during opcode 0x{opcode:02X} exchange")]
    TransportReadFailed {
        opcode: u8,
        #[source]
        source: TransportError,
    },

    #[error("invalid backlight level {level} (allowed 0..={max})")]
    InvalidBacklightLevel { level: u8, max: u8 },

    #[error("invalid core slot {slot} (allowed 0..={max})")]
    InvalidCoreSlot { slot: u8, max: u8 },

    #[error("invalid DPI step action code {code}")]
    InvalidDpiStepAction { code: u8 },

    #[error("invalid flash dword count {count} (allowed 1..={max})")]
    InvalidFlashCount { count: u8, max: u8 },

    /// Flash data length is not a whole number of words/dwords.
    #[error("invalid flash payload length {len} (must be a non-zero multiple of {unit})")]
    InvalidFlashPayloadLength { len: usize, unit: usize },

    #[error("invalid adjust-gun table length {len} bytes (expected {expected})")]
    InvalidAdjustGunTableLength { len: usize, expected: usize },

    /// Flash read-back differs from what was written.
    #[error("flash verify mismatch at word 0x{address:04X}: wrote 0x{expected:04X}, read 0x{actual:04X}")]
    FlashVerifyMismatch {
        address: u16,
        expected: u16,
        actual: u16,
    },

    /// A multi-step persist sequence stopped partway. No rollback is attempted.
    #[error("{operation} failed at step {step} of {total}")]
    SaveSequenceFailed {
        operation: &'static str,
        step: usize,
        total: usize,
        #[source]
        source: Option<Box<Error>>,
    },

    #[error("unsupported save strategy code {code}")]
    UnsupportedSaveStrategy { code: u8 },

    /// Device is not routed to the requested protocol.
    #[error("unsupported device VID=0x{vid:04X} PID=0x{pid:04X}")]
    UnsupportedDevice { vid: u16, pid: u16 },

    #[error("invalid DPI {dpi} (allowed {min}..={max})")]
    InvalidDpi { dpi: u32, min: u32, max: u32 },

    #[error("invalid polling rate {hz} Hz (allowed {allowed:?})")]
    InvalidPollingRate { hz: u32, allowed: &'static [u32] },

    #[error("invalid lift-off distance {distance} (allowed {min}..={max})")]
    InvalidLiftOffDistance { distance: u32, min: u32, max: u32 },

    /// Profile serialization/deserialization error.
    #[error("profile error: {0}")]
    Profile(String),
}

impl Error {
    /// Whether this error belongs to the save/verify failure class.
    pub fn is_save_failure(&self) -> bool {
        matches!(self, Self::SaveSequenceFailed { .. })
    }

    /// Whether the error was raised before any transport interaction.
    pub fn is_request_rejection(&self) -> bool {
        matches!(
            self,
            Self::InvalidPayloadOffset { .. }
                | Self::PayloadTooLarge { .. }
                | Self::InvalidBacklightLevel { .. }
                | Self::InvalidCoreSlot { .. }
                | Self::InvalidDpiStepAction { .. }
                | Self::InvalidFlashCount { .. }
                | Self::InvalidFlashPayloadLength { .. }
                | Self::InvalidAdjustGunTableLength { .. }
                | Self::UnsupportedSaveStrategy { .. }
                | Self::UnsupportedDevice { .. }
                | Self::InvalidDpi { .. }
                | Self::InvalidPollingRate { .. }
                | Self::InvalidLiftOffDistance { .. }
        )
    }
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, Error>;
