//! Safety layer: validates all request parameters against known-safe ranges
//! before anything is sent to the device.
//!
//! Every check here runs before the first transport call of an operation,
//! so a malformed request never produces a partial write.
//!
//! ## T50 request bounds
//! - Backlight level: 0 (off) to 10 (brightest)
//! - Core slot: 0–3 (Core 1 to Core 4)
//! - Flash dword reads: 1–14 dwords per exchange (56 data bytes)
//! - Flash writes: whole words (2 bytes) or dwords (4 bytes), non-empty
//! - Adjust-gun table: exactly 64 words
//!
//! ## Generic profile bounds
//! - DPI: 100–25,600
//! - Polling rate: 125, 250, 500 or 1000 Hz
//! - Lift-off distance: 1–5 (sensor units, roughly millimetres)

use crate::error::{Error, Result};
use crate::profile::PerformanceProfile;

/// Bricking risk disclaimer, shown before flash writes.
pub const FLASH_DISCLAIMER: &str = "\
WARNING: This command writes directly to the mouse's flash memory. \
Requests are bounds-checked, but writing wrong data to the wrong address \
can leave the device unusable until it is re-flashed with vendor tools. \
Use at your own risk.";

pub const BACKLIGHT_MAX: u8 = 10;
pub const CORE_SLOT_MAX: u8 = 3;
pub const FLASH_DWORD_COUNT_MAX: u8 = 14;

/// Word size for 16-bit flash writes.
pub const WORD_LEN: usize = 2;
/// Dword size for 32-bit flash writes.
pub const DWORD_LEN: usize = 4;

/// Number of words in an adjust-gun calibration table.
pub const ADJUST_GUN_TABLE_WORDS: usize = 64;
pub const ADJUST_GUN_TABLE_LEN: usize = ADJUST_GUN_TABLE_WORDS * WORD_LEN;

pub const DPI_MIN: u32 = 100;
pub const DPI_MAX: u32 = 25600;
pub const POLLING_RATES_HZ: &[u32] = &[125, 250, 500, 1000];
pub const LIFT_OFF_MIN: u32 = 1;
pub const LIFT_OFF_MAX: u32 = 5;

pub fn validate_backlight_level(level: u8) -> Result<u8> {
    if level > BACKLIGHT_MAX {
        return Err(Error::InvalidBacklightLevel {
            level,
            max: BACKLIGHT_MAX,
        });
    }
    Ok(level)
}

pub fn validate_core_slot(slot: u8) -> Result<u8> {
    if slot > CORE_SLOT_MAX {
        return Err(Error::InvalidCoreSlot {
            slot,
            max: CORE_SLOT_MAX,
        });
    }
    Ok(slot)
}

pub fn validate_flash_dword_count(count: u8) -> Result<u8> {
    if count == 0 || count > FLASH_DWORD_COUNT_MAX {
        return Err(Error::InvalidFlashCount {
            count,
            max: FLASH_DWORD_COUNT_MAX,
        });
    }
    Ok(count)
}

/// Check that flash data is a non-empty whole number of `unit`-byte cells.
pub fn validate_flash_payload_len(len: usize, unit: usize) -> Result<usize> {
    if len == 0 || len % unit != 0 {
        return Err(Error::InvalidFlashPayloadLength { len, unit });
    }
    Ok(len / unit)
}

pub fn validate_adjust_gun_table_len(len: usize) -> Result<()> {
    if len != ADJUST_GUN_TABLE_LEN {
        return Err(Error::InvalidAdjustGunTableLength {
            len,
            expected: ADJUST_GUN_TABLE_LEN,
        });
    }
    Ok(())
}

pub fn validate_dpi(dpi: u32) -> Result<u32> {
    if !(DPI_MIN..=DPI_MAX).contains(&dpi) {
        return Err(Error::InvalidDpi {
            dpi,
            min: DPI_MIN,
            max: DPI_MAX,
        });
    }
    Ok(dpi)
}

pub fn validate_polling_rate(hz: u32) -> Result<u32> {
    if !POLLING_RATES_HZ.contains(&hz) {
        return Err(Error::InvalidPollingRate {
            hz,
            allowed: POLLING_RATES_HZ,
        });
    }
    Ok(hz)
}

pub fn validate_lift_off_distance(distance: u32) -> Result<u32> {
    if !(LIFT_OFF_MIN..=LIFT_OFF_MAX).contains(&distance) {
        return Err(Error::InvalidLiftOffDistance {
            distance,
            min: LIFT_OFF_MIN,
            max: LIFT_OFF_MAX,
        });
    }
    Ok(distance)
}

/// Validate every field of a profile, reporting the first failure.
///
/// Pure range checks, no device interaction.
pub fn validate_profile(profile: &PerformanceProfile) -> Result<()> {
    validate_dpi(profile.dpi)?;
    validate_polling_rate(profile.polling_rate_hz)?;
    validate_lift_off_distance(profile.lift_off_distance)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backlight_bounds() {
        for level in 0..=BACKLIGHT_MAX {
            assert_eq!(validate_backlight_level(level).unwrap(), level);
        }
        assert!(matches!(
            validate_backlight_level(11),
            Err(Error::InvalidBacklightLevel { level: 11, max: 10 })
        ));
    }

    #[test]
    fn core_slot_bounds() {
        assert!(validate_core_slot(0).is_ok());
        assert!(validate_core_slot(3).is_ok());
        assert!(matches!(
            validate_core_slot(4),
            Err(Error::InvalidCoreSlot { slot: 4, .. })
        ));
    }

    #[test]
    fn flash_dword_count_bounds() {
        assert!(validate_flash_dword_count(0).is_err());
        assert!(validate_flash_dword_count(1).is_ok());
        assert!(validate_flash_dword_count(14).is_ok());
        assert!(matches!(
            validate_flash_dword_count(15),
            Err(Error::InvalidFlashCount { count: 15, max: 14 })
        ));
    }

    #[test]
    fn flash_payload_len_must_be_whole_cells() {
        assert_eq!(validate_flash_payload_len(6, WORD_LEN).unwrap(), 3);
        assert_eq!(validate_flash_payload_len(8, DWORD_LEN).unwrap(), 2);
        assert!(validate_flash_payload_len(0, WORD_LEN).is_err());
        assert!(validate_flash_payload_len(5, WORD_LEN).is_err());
        assert!(matches!(
            validate_flash_payload_len(6, DWORD_LEN),
            Err(Error::InvalidFlashPayloadLength { len: 6, unit: 4 })
        ));
    }

    #[test]
    fn adjust_gun_table_len() {
        assert!(validate_adjust_gun_table_len(128).is_ok());
        assert!(validate_adjust_gun_table_len(126).is_err());
        assert!(validate_adjust_gun_table_len(130).is_err());
    }

    #[test]
    fn profile_accepts_valid() {
        let profile = PerformanceProfile::new(1600, 1000, 2);
        assert!(validate_profile(&profile).is_ok());
    }

    #[test]
    fn profile_rejects_each_field() {
        assert!(matches!(
            validate_profile(&PerformanceProfile::new(50, 1000, 2)),
            Err(Error::InvalidDpi { dpi: 50, .. })
        ));
        assert!(matches!(
            validate_profile(&PerformanceProfile::new(30000, 1000, 2)),
            Err(Error::InvalidDpi { .. })
        ));
        assert!(matches!(
            validate_profile(&PerformanceProfile::new(800, 200, 2)),
            Err(Error::InvalidPollingRate { hz: 200, .. })
        ));
        assert!(matches!(
            validate_profile(&PerformanceProfile::new(800, 500, 0)),
            Err(Error::InvalidLiftOffDistance { distance: 0, .. })
        ));
        assert!(matches!(
            validate_profile(&PerformanceProfile::new(800, 500, 6)),
            Err(Error::InvalidLiftOffDistance { .. })
        ));
    }

    #[test]
    fn profile_reports_dpi_first() {
        let err = validate_profile(&PerformanceProfile::new(0, 0, 0)).unwrap_err();
        assert!(matches!(err, Error::InvalidDpi { .. }));
    }

    #[test]
    fn flash_disclaimer_not_empty() {
        assert!(FLASH_DISCLAIMER.contains("WARNING"));
    }
}
