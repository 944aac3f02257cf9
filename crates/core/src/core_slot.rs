//! Core slot selection and core state readout.
//!
//! T50 firmware carries up to four "cores" (onboard behaviour presets).
//!   - CORE_SLOT (0x1F): payload[0] = active slot, 0..=3
//!   - CORE_STATE (0x1E), read only:
//!       payload[0]    active slot
//!       payload[1]    unlocked slot bitmask
//!       payload[2]    core mode
//!       payload[4..6] firmware revision (little-endian)

use crate::device::MouseDevice;
use crate::error::Result;
use crate::packet::{opcodes, READ, WRITE};
use crate::safety;
use crate::transport::{execute, FeatureTransport};
use std::collections::BTreeMap;
use tracing::debug;

/// Decoded CORE_STATE block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoreState {
    pub active_slot: u8,
    pub unlocked_mask: u8,
    pub core_mode: u8,
    pub firmware_revision: u16,
}

impl CoreState {
    /// Decode from a response payload region.
    pub fn from_payload(payload: &[u8]) -> Self {
        Self {
            active_slot: payload[0],
            unlocked_mask: payload[1],
            core_mode: payload[2],
            firmware_revision: u16::from_le_bytes([payload[4], payload[5]]),
        }
    }

    pub fn is_slot_unlocked(&self, slot: u8) -> bool {
        slot < 8 && self.unlocked_mask & (1 << slot) != 0
    }

    /// Field name → value view.
    pub fn fields(&self) -> BTreeMap<&'static str, u32> {
        BTreeMap::from([
            ("active_slot", self.active_slot as u32),
            ("unlocked_mask", self.unlocked_mask as u32),
            ("core_mode", self.core_mode as u32),
            ("firmware_revision", self.firmware_revision as u32),
        ])
    }
}

pub fn set_core_slot(
    transport: &dyn FeatureTransport,
    device: &MouseDevice,
    slot: u8,
) -> Result<()> {
    let slot = safety::validate_core_slot(slot)?;
    execute(transport, device, opcodes::CORE_SLOT, WRITE, 0, &[slot])?;
    debug!(slot, "Core slot written");
    Ok(())
}

pub fn read_core_slot(transport: &dyn FeatureTransport, device: &MouseDevice) -> Result<u8> {
    let payload = execute(transport, device, opcodes::CORE_SLOT, READ, 0, &[])?;
    Ok(payload[0])
}

pub fn read_core_state(
    transport: &dyn FeatureTransport,
    device: &MouseDevice,
) -> Result<CoreState> {
    let payload = execute(transport, device, opcodes::CORE_STATE, READ, 0, &[])?;
    let state = CoreState::from_payload(&payload);
    debug!(?state, "Core state read");
    Ok(state)
}
