//! Feature-report transport boundary and the vendor exchange primitive.
//!
//! Provides a trait-based transport layer so that real HID devices and
//! mock devices share the same interface. Every T50 sub-command funnels
//! through [`execute`].

use crate::catalog;
use crate::device::MouseDevice;
use crate::error::{Error, Result, TransportError};
use crate::packet::{self, opcodes, VendorPacket, PACKET_LEN, REPORT_ID};
use tracing::trace;

/// Abstraction over HID feature-report I/O.
///
/// Implementations know nothing about packet semantics. Calls block until
/// the device answers or the implementation's own timeout fires.
pub trait FeatureTransport: Send {
    /// Send a feature report. `data[0]` is the report ID.
    fn write_feature_report(
        &self,
        device: &MouseDevice,
        report_id: u8,
        data: &[u8],
    ) -> std::result::Result<(), TransportError>;

    /// Read a feature report of up to `length` bytes, report ID included.
    fn read_feature_report(
        &self,
        device: &MouseDevice,
        report_id: u8,
        length: usize,
    ) -> std::result::Result<Vec<u8>, TransportError>;
}

/// Perform one vendor request/response round trip.
///
/// Returns the response's payload region; interpreting it is up to the caller.
pub fn execute(
    transport: &dyn FeatureTransport,
    device: &MouseDevice,
    opcode: u8,
    write_flag: u8,
    payload_offset: usize,
    payload: &[u8],
) -> Result<Vec<u8>> {
    let request = VendorPacket::new(opcode, write_flag, payload_offset, payload.to_vec());
    let encoded = request.encode()?;
    trace!(
        opcode = format_args!("0x{:02X}", opcode),
        name = opcodes::name(opcode),
        write = request.is_write(),
        report_hex = format_args!("{:02X?}", &encoded[..packet::HEADER_LEN + 16]),
        "T50 TX"
    );

    transport
        .write_feature_report(device, REPORT_ID, &encoded)
        .map_err(|source| Error::TransportReadFailed { opcode, source })?;
    let raw = transport
        .read_feature_report(device, REPORT_ID, PACKET_LEN)
        .map_err(|source| Error::TransportReadFailed { opcode, source })?;

    let payload = packet::decode(&raw)?;
    trace!(
        opcode = format_args!("0x{:02X}", opcode),
        echoed = packet::response_opcode(&raw).map(|op| op == opcode),
        payload_hex = format_args!("{:02X?}", &payload[..16]),
        "T50 RX"
    );
    Ok(payload)
}

/// Send a raw feature report to a supported device.
pub fn write_feature_report(
    transport: &dyn FeatureTransport,
    device: &MouseDevice,
    report_id: u8,
    payload: &[u8],
) -> Result<()> {
    catalog::require_supported(device)?;
    transport
        .write_feature_report(device, report_id, payload)
        .map_err(|source| Error::TransportReadFailed {
            opcode: payload.get(1).copied().unwrap_or(0),
            source,
        })
}

/// Read a raw feature report from a supported device.
pub fn read_feature_report(
    transport: &dyn FeatureTransport,
    device: &MouseDevice,
    report_id: u8,
    length: usize,
) -> Result<Vec<u8>> {
    catalog::require_supported(device)?;
    transport
        .read_feature_report(device, report_id, length)
        .map_err(|source| Error::TransportReadFailed { opcode: 0, source })
}


#[cfg(test)]
mod tests {
    use super::mock::MockTransport;
    use super::*;
    use crate::packet::{HEADER_LEN, PAYLOAD_REGION_LEN, WRITE};
    use crate::{pids, A4TECH_VID};

    fn t50() -> MouseDevice {
        MouseDevice::new(A4TECH_VID, pids::T50, "Bloody T50", "SN1")
    }

    #[test]
    fn execute_returns_payload_region() {
        let mock = MockTransport::new();
        mock.set_register(opcodes::CORE_SLOT, &[0x02, 0x07]);
        let payload = execute(&mock, &t50(), opcodes::CORE_SLOT, 0, 0, &[]).unwrap();
        assert_eq!(payload.len(), PAYLOAD_REGION_LEN);
        assert_eq!(&payload[..2], &[0x02, 0x07]);
    }

    #[test]
    fn execute_sends_one_encoded_packet() {
        let mock = MockTransport::new();
        execute(&mock, &t50(), 0x20, WRITE, 2, &[0xAB]).unwrap();
        let writes = mock.writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0], packet::encode(0x20, WRITE, 2, &[0xAB]).unwrap());
    }

    #[test]
    fn execute_rejects_bad_request_without_transport_call() {
        let mock = MockTransport::new();
        let err = execute(&mock, &t50(), 0x20, WRITE, 0, &[0u8; 65]).unwrap_err();
        assert!(matches!(err, Error::PayloadTooLarge { .. }));
        let err = execute(&mock, &t50(), 0x20, WRITE, 99, &[]).unwrap_err();
        assert!(matches!(err, Error::InvalidPayloadOffset { .. }));
        assert_eq!(mock.write_count(), 0);
    }

    #[test]
    fn execute_wraps_transport_failure() {
        let mock = MockTransport::new();
        mock.fail_write_at(0);
        let err = execute(&mock, &t50(), opcodes::BACKLIGHT, 0, 0, &[]).unwrap_err();
        match err {
            Error::TransportReadFailed { opcode, source } => {
                assert_eq!(opcode, opcodes::BACKLIGHT);
                assert!(matches!(source, TransportError::Hid(_)));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn execute_propagates_short_response() {
        let mock = MockTransport::new();
        mock.queue_response(vec![REPORT_ID, opcodes::BACKLIGHT, 0x00]);
        let err = execute(&mock, &t50(), opcodes::BACKLIGHT, 0, 0, &[]).unwrap_err();
        assert!(matches!(err, Error::ResponseTooShort { len: 3, .. }));
    }

    #[test]
    fn execute_does_not_require_opcode_echo() {
        let mock = MockTransport::new();
        let mut raw = vec![0u8; PACKET_LEN];
        raw[0] = REPORT_ID;
        raw[1] = 0x99;
        raw[HEADER_LEN] = 0x42;
        mock.queue_response(raw);
        let payload = execute(&mock, &t50(), opcodes::BACKLIGHT, 0, 0, &[]).unwrap();
        assert_eq!(payload[0], 0x42);
    }

    #[test]
    fn raw_report_use_cases_gate_on_catalog() {
        let mock = MockTransport::new();
        let foreign = MouseDevice::new(0x046D, 0xC08B, "G502", "");
        assert!(matches!(
            write_feature_report(&mock, &foreign, REPORT_ID, &[REPORT_ID]).unwrap_err(),
            Error::UnsupportedDevice { .. }
        ));
        assert!(read_feature_report(&mock, &foreign, REPORT_ID, 8).is_err());
        assert_eq!(mock.write_count(), 0);
    }

    #[test]
    fn raw_report_round_trip_through_mock() {
        let mock = MockTransport::new();
        let pkt = packet::encode(opcodes::SLED_ENABLE, WRITE, 0, &[1]).unwrap();
        write_feature_report(&mock, &t50(), REPORT_ID, &pkt).unwrap();
        let raw = read_feature_report(&mock, &t50(), REPORT_ID, PACKET_LEN).unwrap();
        assert_eq!(raw.len(), PACKET_LEN);
        assert_eq!(raw[HEADER_LEN], 1);
    }

    #[test]
    fn raw_read_maps_timeout() {
        let mock = MockTransport::new();
        let err = read_feature_report(&mock, &t50(), REPORT_ID, 8).unwrap_err();
        assert!(matches!(
            err,
            Error::TransportReadFailed {
                source: TransportError::Timeout(_),
                ..
            }
        ));
    }
}
