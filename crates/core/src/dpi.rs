//! DPI stepping on the T50.
//!
//! The device moves through its onboard DPI table one step at a time.
//! The step opcode is reported by the device (firmware generations differ),
//! so callers pass it in; [`DPI_STEP`](crate::packet::opcodes::DPI_STEP) is the common default.
//!
//! Request payload: `[action, commit]`
//!   - action: 0 = down, 1 = up, 2 = cycle
//!   - commit: 1 = write the new step back immediately, 0 = hold until save

use crate::device::MouseDevice;
use crate::error::{Error, Result};
use crate::packet::WRITE;
use crate::transport::{execute, FeatureTransport};
use tracing::debug;

/// Direction of a DPI step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DpiStepAction {
    Down = 0,
    Up = 1,
    Cycle = 2,
}

impl DpiStepAction {
    pub const ALL: &'static [DpiStepAction] = &[Self::Down, Self::Up, Self::Cycle];

    /// Map a raw action code.
    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            0 => Ok(Self::Down),
            1 => Ok(Self::Up),
            2 => Ok(Self::Cycle),
            _ => Err(Error::InvalidDpiStepAction { code }),
        }
    }

    pub fn code(&self) -> u8 {
        *self as u8
    }

    /// Parse a CLI-friendly name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "down" | "-" | "prev" => Some(Self::Down),
            "up" | "+" | "next" => Some(Self::Up),
            "cycle" => Some(Self::Cycle),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Down => "down",
            Self::Up => "up",
            Self::Cycle => "cycle",
        }
    }
}

impl std::fmt::Display for DpiStepAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Step the DPI once in the given direction.
pub fn step_dpi(
    transport: &dyn FeatureTransport,
    device: &MouseDevice,
    action: DpiStepAction,
    opcode: u8,
    commit: bool,
) -> Result<()> {
    execute(
        transport,
        device,
        opcode,
        WRITE,
        0,
        &[action.code(), u8::from(commit)],
    )?;
    debug!(
        action = action.label(),
        opcode = format_args!("0x{:02X}", opcode),
        commit,
        "DPI step sent"
    );
    Ok(())
}

/// Step the DPI using a raw action code; unknown codes never reach the device.
pub fn step_dpi_by_code(
    transport: &dyn FeatureTransport,
    device: &MouseDevice,
    action_code: u8,
    opcode: u8,
    commit: bool,
) -> Result<()> {
    let action = DpiStepAction::from_code(action_code)?;
    step_dpi(transport, device, action, opcode, commit)
}
