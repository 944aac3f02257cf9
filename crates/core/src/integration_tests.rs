//! Integration tests: exercise full flows against a simulated T50.
//!
//! These tests go through discovery, catalog routing, the sub-command
//! library and the save sequence together, the way the CLI drives them.

#[cfg(test)]
mod tests {
    use crate::catalog::{self, DeviceFamily};
    use crate::core_slot;
    use crate::device::{discover_supported_devices, MouseDevice, StaticDiscovery};
    use crate::dpi::{self, DpiStepAction};
    use crate::error::Error;
    use crate::flash;
    use crate::lighting;
    use crate::packet::{self, opcodes, HEADER_LEN, PACKET_LEN, REPORT_ID};
    use crate::save::{self, SaveStrategy};
    use crate::transport::mock::MockTransport;
    use crate::{pids, A4TECH_VID};

    fn t50() -> MouseDevice {
        MouseDevice::new(A4TECH_VID, pids::T50, "Bloody T50", "T50-0001")
    }

    fn success_response(opcode: u8, first_byte: u8) -> Vec<u8> {
        let mut raw = vec![0u8; PACKET_LEN];
        raw[0] = REPORT_ID;
        raw[1] = opcode;
        raw[HEADER_LEN] = first_byte;
        raw
    }

    #[test]
    fn introspection_constants() {
        assert_eq!(crate::packet_length(), 72);
        assert_eq!(crate::report_id(), 0x07);
    }

    /// Backlight set then read against scripted device responses.
    #[test]
    fn backlight_end_to_end_with_scripted_responses() {
        let device = t50();
        assert!(catalog::is_t50_device(&device));

        let mock = MockTransport::new();
        mock.queue_response(success_response(opcodes::BACKLIGHT, 0x00));
        lighting::set_backlight_level(&mock, &device, 5).unwrap();

        mock.queue_response(success_response(opcodes::BACKLIGHT, 5));
        assert_eq!(lighting::read_backlight_level(&mock, &device).unwrap(), 5);
    }

    #[test]
    fn backlight_out_of_range_never_reaches_device() {
        let mock = MockTransport::new();
        let err = lighting::set_backlight_level(&mock, &t50(), 200).unwrap_err();
        assert!(matches!(err, Error::InvalidBacklightLevel { level: 200, .. }));
        assert_eq!(mock.write_count(), 0);
    }

    /// Discover, route, configure, then persist.
    #[test]
    fn configure_and_save_session() {
        let discovery = StaticDiscovery::new(vec![
            MouseDevice::new(0x046D, 0xC08B, "G502 HERO", "L1"),
            MouseDevice::new(A4TECH_VID, 0x0001, "Bloody keyboard", "K1"),
            t50(),
        ]);
        let devices = discover_supported_devices(&discovery).unwrap();
        let device = devices
            .iter()
            .find(|d| catalog::family(d) == Some(DeviceFamily::T50))
            .cloned()
            .unwrap();
        catalog::require_t50(&device).unwrap();

        let mock = MockTransport::new();
        mock.set_register(opcodes::CORE_STATE, &[0, 0x0F, 1, 0, 0x05, 0x01]);

        let state = core_slot::read_core_state(&mock, &device).unwrap();
        assert!(state.is_slot_unlocked(2));
        core_slot::set_core_slot(&mock, &device, 2).unwrap();
        lighting::set_backlight_level(&mock, &device, 1).unwrap();
        lighting::set_sled_profile_index(&mock, &device, 4).unwrap();
        lighting::set_sled_enabled(&mock, &device, true).unwrap();
        dpi::step_dpi(&mock, &device, DpiStepAction::Up, opcodes::DPI_STEP, false).unwrap();
        save::save_settings(&mock, &device, SaveStrategy::CaptureV2).unwrap();

        let ops: Vec<u8> = mock.writes().iter().map(|w| w[1]).collect();
        assert_eq!(
            ops,
            vec![
                opcodes::CORE_STATE,
                opcodes::CORE_SLOT,
                opcodes::BACKLIGHT,
                opcodes::SLED_PROFILE,
                opcodes::SLED_ENABLE,
                opcodes::DPI_STEP,
                opcodes::SAVE,
                opcodes::SAVE,
                opcodes::SAVE,
            ]
        );
        assert_eq!(core_slot::read_core_slot(&mock, &device).unwrap(), 2);
        assert_eq!(lighting::read_sled_profile_index(&mock, &device).unwrap(), 4);
    }

    /// Calibration table write, read back through the dword path.
    #[test]
    fn adjust_gun_then_dword_readback() {
        let mock = MockTransport::new();
        let device = t50();
        let table: Vec<u8> = (0..crate::safety::ADJUST_GUN_TABLE_LEN)
            .map(|i| (i * 3) as u8)
            .collect();
        flash::write_adjust_gun_table(&mock, &device, 0x0400, &table).unwrap();

        // Word 0x0400 is the low half of dword 0x0200.
        let dwords = flash::read_flash_dwords(&mock, &device, 0x0200, 2).unwrap();
        assert_eq!(&dwords[..], &table[..8]);
        save::save_settings(&mock, &device, SaveStrategy::Quick).unwrap();
    }

    #[test]
    fn truncated_response_surfaces_through_sub_commands() {
        let mock = MockTransport::new();
        mock.queue_response(vec![REPORT_ID, opcodes::SLED_ENABLE]);
        let err = lighting::read_sled_enabled(&mock, &t50()).unwrap_err();
        assert!(matches!(err, Error::ResponseTooShort { len: 2, .. }));
    }

    #[test]
    fn encode_decode_recovers_payload_for_every_fit() {
        let payload: Vec<u8> = (1..=16).collect();
        for offset in 0..=packet::PAYLOAD_REGION_LEN - payload.len() {
            let encoded = packet::encode(0x55, packet::WRITE, offset, &payload).unwrap();
            let region = packet::decode(&encoded).unwrap();
            assert_eq!(&region[offset..offset + payload.len()], &payload[..]);
        }
    }
}
