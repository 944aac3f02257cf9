//! T50 vendor packet encoding and decoding.
//!
//! Every vendor exchange uses a single fixed-length feature report:
//!
//! ```text
//! byte 0      report ID (0x07)
//! byte 1      opcode
//! byte 2..4   reserved (zero)
//! byte 4      write flag (0x00 = read, non-zero = write)
//! byte 5..8   reserved (zero)
//! byte 8..72  payload region (64 bytes)
//! ```
//!
//! A payload is placed at `payload_offset` inside the payload region and the
//! rest of the region is zero padded. The firmware does not checksum the
//! packet; responses are verified by length and report ID.

use crate::error::{Error, Result};

/// Feature report ID carrying vendor packets.
pub const REPORT_ID: u8 = 0x07;

/// Total packet length including the report ID.
pub const PACKET_LEN: usize = 72;

/// Length of the header preceding the payload region.
pub const HEADER_LEN: usize = 8;

/// Size of the payload region.
pub const PAYLOAD_REGION_LEN: usize = PACKET_LEN - HEADER_LEN;

const OPCODE_POS: usize = 1;
const WRITE_FLAG_POS: usize = 4;

/// Write flag value used by the sub-command library.
pub const WRITE: u8 = 0x80;
/// Read flag value.
pub const READ: u8 = 0x00;

/// Known T50 opcodes.
pub mod opcodes {
    /// Save pending state to flash (one exchange per save phase).
    pub const SAVE: u8 = 0x0A;
    /// Default DPI step opcode, used when the device does not report one.
    pub const DPI_STEP: u8 = 0x0F;
    /// Backlight brightness level.
    pub const BACKLIGHT: u8 = 0x11;
    /// Core state block (active slot, unlocked slots, mode, firmware revision).
    pub const CORE_STATE: u8 = 0x1E;
    /// Active core slot.
    pub const CORE_SLOT: u8 = 0x1F;
    /// SLED lighting profile index.
    pub const SLED_PROFILE: u8 = 0x2C;
    /// SLED lighting on/off.
    pub const SLED_ENABLE: u8 = 0x2D;
    /// Read 8 bytes of flash at a 16-bit word address.
    pub const FLASH_READ8: u8 = 0x38;
    /// Read dwords at a 32-bit dword address.
    pub const FLASH_READ_DWORDS: u8 = 0x39;
    /// Write words at a 16-bit word address.
    pub const FLASH_WRITE_WORDS: u8 = 0x3A;
    /// Write dwords at a 32-bit dword address.
    pub const FLASH_WRITE_DWORDS: u8 = 0x3B;

    /// Human-readable name for an opcode.
    pub fn name(opcode: u8) -> &'static str {
        match opcode {
            SAVE => "SAVE",
            DPI_STEP => "DPI_STEP",
            BACKLIGHT => "BACKLIGHT",
            CORE_STATE => "CORE_STATE",
            CORE_SLOT => "CORE_SLOT",
            SLED_PROFILE => "SLED_PROFILE",
            SLED_ENABLE => "SLED_ENABLE",
            FLASH_READ8 => "FLASH_READ8",
            FLASH_READ_DWORDS => "FLASH_READ_DWORDS",
            FLASH_WRITE_WORDS => "FLASH_WRITE_WORDS",
            FLASH_WRITE_DWORDS => "FLASH_WRITE_DWORDS",
            _ => "UNKNOWN",
        }
    }
}

/// A logical T50 request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorPacket {
    pub opcode: u8,
    /// 0 = read, non-zero = write.
    pub write_flag: u8,
    /// Index into the payload region where `payload` starts.
    pub payload_offset: usize,
    pub payload: Vec<u8>,
}

impl VendorPacket {
    pub fn new(opcode: u8, write_flag: u8, payload_offset: usize, payload: Vec<u8>) -> Self {
        Self {
            opcode,
            write_flag,
            payload_offset,
            payload,
        }
    }

    /// Read request with an empty payload.
    pub fn read(opcode: u8) -> Self {
        Self::new(opcode, READ, 0, Vec::new())
    }

    /// Write request with the payload at the start of the region.
    pub fn write(opcode: u8, payload: Vec<u8>) -> Self {
        Self::new(opcode, WRITE, 0, payload)
    }

    pub fn is_write(&self) -> bool {
        self.write_flag != 0
    }

    /// Encode into a full feature report.
    pub fn encode(&self) -> Result<Vec<u8>> {
        encode(
            self.opcode,
            self.write_flag,
            self.payload_offset,
            &self.payload,
        )
    }
}

/// Encode a request into a `PACKET_LEN` byte feature report.
///
/// Fails before producing any bytes if the payload would not fit.
pub fn encode(
    opcode: u8,
    write_flag: u8,
    payload_offset: usize,
    payload: &[u8],
) -> Result<Vec<u8>> {
    if payload_offset > PAYLOAD_REGION_LEN {
        return Err(Error::InvalidPayloadOffset {
            offset: payload_offset,
            max: PAYLOAD_REGION_LEN,
        });
    }
    if payload.len() > PAYLOAD_REGION_LEN - payload_offset {
        return Err(Error::PayloadTooLarge {
            offset: payload_offset,
            len: payload.len(),
            max: PAYLOAD_REGION_LEN,
        });
    }

    let mut buf = vec![0u8; PACKET_LEN];
    buf[0] = REPORT_ID;
    buf[OPCODE_POS] = opcode;
    buf[WRITE_FLAG_POS] = write_flag;
    let start = HEADER_LEN + payload_offset;
    buf[start..start + payload.len()].copy_from_slice(payload);
    Ok(buf)
}

/// Decode a response report into its payload region.
///
/// The opcode is not checked against the request; callers that care about
/// echo validation use [`response_opcode`].
pub fn decode(data: &[u8]) -> Result<Vec<u8>> {
    if data.len() < PACKET_LEN {
        return Err(Error::ResponseTooShort {
            len: data.len(),
            min: PACKET_LEN,
        });
    }
    if data[0] != REPORT_ID {
        return Err(Error::UnexpectedReportId {
            expected: REPORT_ID,
            actual: data[0],
        });
    }
    Ok(data[HEADER_LEN..PACKET_LEN].to_vec())
}

/// Opcode echoed in a raw response, if the response is long enough to carry one.
pub fn response_opcode(data: &[u8]) -> Option<u8> {
    data.get(OPCODE_POS).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_places_header_and_payload() {
        let encoded = encode(opcodes::BACKLIGHT, WRITE, 0, &[0x03]).unwrap();
        assert_eq!(encoded.len(), PACKET_LEN);
        assert_eq!(encoded[0], REPORT_ID);
        assert_eq!(encoded[1], 0x11);
        assert_eq!(encoded[2], 0x00);
        assert_eq!(encoded[3], 0x00);
        assert_eq!(encoded[4], 0x80);
        assert_eq!(encoded[8], 0x03);
        assert!(encoded[9..].iter().all(|&b| b == 0)); // padding
    }

    #[test]
    fn encode_applies_payload_offset() {
        let encoded = encode(0x20, WRITE, 6, &[0xAA, 0xBB]).unwrap();
        assert_eq!(&encoded[HEADER_LEN..HEADER_LEN + 6], &[0; 6]);
        assert_eq!(encoded[HEADER_LEN + 6], 0xAA);
        assert_eq!(encoded[HEADER_LEN + 7], 0xBB);
    }

    #[test]
    fn encode_accepts_payload_filling_region() {
        let payload = vec![0x5A; PAYLOAD_REGION_LEN - 4];
        let encoded = encode(0x20, WRITE, 4, &payload).unwrap();
        assert_eq!(encoded[PACKET_LEN - 1], 0x5A);
    }

    #[test]
    fn encode_rejects_offset_past_region() {
        let err = encode(0x20, READ, PAYLOAD_REGION_LEN + 1, &[]).unwrap_err();
        assert!(matches!(err, Error::InvalidPayloadOffset { offset: 65, max: 64 }));
    }

    #[test]
    fn encode_rejects_oversized_payload() {
        let err = encode(0x20, WRITE, 0, &[0u8; PAYLOAD_REGION_LEN + 1]).unwrap_err();
        assert!(matches!(err, Error::PayloadTooLarge { .. }));

        let err = encode(0x20, WRITE, 60, &[0u8; 5]).unwrap_err();
        assert!(matches!(err, Error::PayloadTooLarge { offset: 60, len: 5, .. }));
    }

    #[test]
    fn decode_recovers_payload_at_offset() {
        for offset in [0usize, 1, 8, 31, 60] {
            let payload = [0xDE, 0xAD, 0xBE, 0xEF];
            let encoded = encode(0x38, READ, offset, &payload).unwrap();
            let region = decode(&encoded).unwrap();
            assert_eq!(region.len(), PAYLOAD_REGION_LEN);
            assert_eq!(&region[offset..offset + payload.len()], &payload);
        }
    }

    #[test]
    fn decode_rejects_short_data() {
        let err = decode(&[REPORT_ID, 0x11, 0x00]).unwrap_err();
        assert!(matches!(err, Error::ResponseTooShort { len: 3, min: 72 }));
        assert!(decode(&[]).is_err());
    }

    #[test]
    fn decode_rejects_wrong_report_id() {
        let mut data = vec![0u8; PACKET_LEN];
        data[0] = 0x04;
        assert!(matches!(
            decode(&data).unwrap_err(),
            Error::UnexpectedReportId { actual: 0x04, .. }
        ));
    }

    #[test]
    fn decode_ignores_trailing_bytes() {
        let mut data = encode(0x11, READ, 0, &[0x02]).unwrap();
        data.extend_from_slice(&[0xFF; 8]);
        assert_eq!(decode(&data).unwrap()[0], 0x02);
    }

    #[test]
    fn vendor_packet_helpers() {
        let pkt = VendorPacket::write(opcodes::SLED_ENABLE, vec![1]);
        assert!(pkt.is_write());
        assert!(!VendorPacket::read(opcodes::SLED_ENABLE).is_write());
        assert_eq!(response_opcode(&pkt.encode().unwrap()), Some(0x2D));
        assert_eq!(opcodes::name(0x2D), "SLED_ENABLE");
        assert_eq!(opcodes::name(0xEE), "UNKNOWN");
    }
}
