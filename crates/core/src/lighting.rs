//! Backlight and SLED lighting commands.
//!
//! All three settings are single-byte registers at payload[0]:
//!   - BACKLIGHT (0x11): brightness level 0..=10
//!   - SLED_PROFILE (0x2C): lighting profile index
//!   - SLED_ENABLE (0x2D): 0 = off, non-zero = on

use crate::device::MouseDevice;
use crate::error::Result;
use crate::packet::{opcodes, READ, WRITE};
use crate::safety;
use crate::transport::{execute, FeatureTransport};
use tracing::debug;

/// Set the backlight brightness level.
pub fn set_backlight_level(
    transport: &dyn FeatureTransport,
    device: &MouseDevice,
    level: u8,
) -> Result<()> {
    let level = safety::validate_backlight_level(level)?;
    execute(transport, device, opcodes::BACKLIGHT, WRITE, 0, &[level])?;
    debug!(level, "Backlight level written");
    Ok(())
}

/// Read the current backlight brightness level.
pub fn read_backlight_level(transport: &dyn FeatureTransport, device: &MouseDevice) -> Result<u8> {
    let payload = execute(transport, device, opcodes::BACKLIGHT, READ, 0, &[])?;
    Ok(payload[0])
}

pub fn set_sled_profile_index(
    transport: &dyn FeatureTransport,
    device: &MouseDevice,
    index: u8,
) -> Result<()> {
    execute(transport, device, opcodes::SLED_PROFILE, WRITE, 0, &[index])?;
    Ok(())
}

pub fn read_sled_profile_index(
    transport: &dyn FeatureTransport,
    device: &MouseDevice,
) -> Result<u8> {
    let payload = execute(transport, device, opcodes::SLED_PROFILE, READ, 0, &[])?;
    Ok(payload[0])
}

pub fn set_sled_enabled(
    transport: &dyn FeatureTransport,
    device: &MouseDevice,
    enabled: bool,
) -> Result<()> {
    execute(
        transport,
        device,
        opcodes::SLED_ENABLE,
        WRITE,
        0,
        &[u8::from(enabled)],
    )?;
    Ok(())
}

pub fn read_sled_enabled(transport: &dyn FeatureTransport, device: &MouseDevice) -> Result<bool> {
    let payload = execute(transport, device, opcodes::SLED_ENABLE, READ, 0, &[])?;
    Ok(payload[0] != 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::packet::HEADER_LEN;
    use crate::transport::mock::MockTransport;
    use crate::{pids, A4TECH_VID};

    fn t50() -> MouseDevice {
        MouseDevice::new(A4TECH_VID, pids::T50, "Bloody T50", "SN1")
    }

    #[test]
    fn set_backlight_writes_level_byte() {
        let mock = MockTransport::new();
        set_backlight_level(&mock, &t50(), 2).unwrap();
        let writes = mock.writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0][1], opcodes::BACKLIGHT);
        assert_eq!(writes[0][4], WRITE);
        assert_eq!(writes[0][HEADER_LEN], 2);
    }

    #[test]
    fn set_backlight_rejects_out_of_range_without_io() {
        let mock = MockTransport::new();
        let err = set_backlight_level(&mock, &t50(), 11).unwrap_err();
        assert!(matches!(err, Error::InvalidBacklightLevel { level: 11, .. }));
        assert_eq!(mock.write_count(), 0);
    }

    #[test]
    fn backlight_set_then_read() {
        let mock = MockTransport::new();
        set_backlight_level(&mock, &t50(), 3).unwrap();
        assert_eq!(read_backlight_level(&mock, &t50()).unwrap(), 3);
    }

    #[test]
    fn read_backlight_uses_read_flag() {
        let mock = MockTransport::new();
        mock.set_register(opcodes::BACKLIGHT, &[1]);
        assert_eq!(read_backlight_level(&mock, &t50()).unwrap(), 1);
        assert_eq!(mock.writes()[0][4], READ);
    }

    #[test]
    fn sled_profile_round_trip() {
        let mock = MockTransport::new();
        set_sled_profile_index(&mock, &t50(), 7).unwrap();
        assert_eq!(read_sled_profile_index(&mock, &t50()).unwrap(), 7);
    }

    #[test]
    fn sled_enabled_encodes_bool_as_byte() {
        let mock = MockTransport::new();
        set_sled_enabled(&mock, &t50(), true).unwrap();
        assert_eq!(mock.writes()[0][HEADER_LEN], 1);
        assert!(read_sled_enabled(&mock, &t50()).unwrap());

        set_sled_enabled(&mock, &t50(), false).unwrap();
        assert!(!read_sled_enabled(&mock, &t50()).unwrap());
    }

    #[test]
    fn sled_enabled_treats_any_nonzero_as_on() {
        let mock = MockTransport::new();
        mock.set_register(opcodes::SLED_ENABLE, &[0x80]);
        assert!(read_sled_enabled(&mock, &t50()).unwrap());
    }
}
