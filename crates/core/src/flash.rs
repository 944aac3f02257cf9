//! Flash memory access on the T50.
//!
//! Two address spaces are exposed by the firmware:
//!   - word space: 16-bit addresses, one address per 2-byte word
//!   - dword space: 32-bit addresses, one address per 4-byte dword
//!
//! Request layout (payload region):
//!   - FLASH_READ8 (0x38):        [addr lo, addr hi]
//!   - FLASH_READ_DWORDS (0x39):  [addr u32 LE, count]
//!   - FLASH_WRITE_WORDS (0x3A):  [addr lo, addr hi, count], data at [8..]
//!   - FLASH_WRITE_DWORDS (0x3B): [addr u32 LE, count], data at [8..]
//!
//! Responses carry their data at payload[8..]. Multi-packet writes are issued
//! strictly in address order and stop at the first failing packet.

use crate::device::MouseDevice;
use crate::error::{Error, Result};
use crate::packet::{opcodes, PAYLOAD_REGION_LEN, READ, WRITE};
use crate::safety::{self, DWORD_LEN, WORD_LEN};
use crate::transport::{execute, FeatureTransport};
use tracing::{debug, info, warn};

/// Offset of data bytes inside the payload region.
pub const FLASH_DATA_OFFSET: usize = 8;

/// Words carried by one FLASH_WRITE_WORDS packet.
pub const WORDS_PER_PACKET: usize = (PAYLOAD_REGION_LEN - FLASH_DATA_OFFSET) / WORD_LEN;

/// Dwords carried by one FLASH_WRITE_DWORDS packet.
pub const DWORDS_PER_PACKET: usize = (PAYLOAD_REGION_LEN - FLASH_DATA_OFFSET) / DWORD_LEN;

/// Words returned by one FLASH_READ8 exchange.
const WORDS_PER_READ8: usize = 4;

/// Signature word written after an adjust-gun table to mark it complete.
pub const ADJUST_GUN_SIGNATURE: u16 = 0xA4A4;

const WORD_SPACE_END: u32 = 0x1_0000;

/// Read 8 bytes starting at a word address.
pub fn read_flash_bytes8(
    transport: &dyn FeatureTransport,
    device: &MouseDevice,
    address: u16,
) -> Result<[u8; 8]> {
    let payload = execute(
        transport,
        device,
        opcodes::FLASH_READ8,
        READ,
        0,
        &address.to_le_bytes(),
    )?;
    let mut out = [0u8; 8];
    out.copy_from_slice(&payload[FLASH_DATA_OFFSET..FLASH_DATA_OFFSET + 8]);
    Ok(out)
}

/// Read `count` dwords starting at a dword address, as raw bytes.
pub fn read_flash_dwords(
    transport: &dyn FeatureTransport,
    device: &MouseDevice,
    address: u32,
    count: u8,
) -> Result<Vec<u8>> {
    let count = safety::validate_flash_dword_count(count)?;
    let mut request = address.to_le_bytes().to_vec();
    request.push(count);
    let payload = execute(
        transport,
        device,
        opcodes::FLASH_READ_DWORDS,
        READ,
        0,
        &request,
    )?;
    let len = count as usize * DWORD_LEN;
    Ok(payload[FLASH_DATA_OFFSET..FLASH_DATA_OFFSET + len].to_vec())
}

/// Write little-endian words starting at a word address.
///
/// With `verify`, the written range is read back and compared word by word;
/// any difference fails the whole operation as a save-class failure.
pub fn write_flash_words(
    transport: &dyn FeatureTransport,
    device: &MouseDevice,
    address: u16,
    word_data: &[u8],
    verify: bool,
) -> Result<()> {
    let word_count = safety::validate_flash_payload_len(word_data.len(), WORD_LEN)?;
    if address as u32 + word_count as u32 > WORD_SPACE_END {
        return Err(Error::InvalidFlashPayloadLength {
            len: word_data.len(),
            unit: WORD_LEN,
        });
    }

    let chunks = word_data.chunks(WORDS_PER_PACKET * WORD_LEN);
    let total = chunks.len();
    for (i, chunk) in chunks.enumerate() {
        let chunk_address = address + (i * WORDS_PER_PACKET) as u16;
        let mut request = vec![0u8; FLASH_DATA_OFFSET];
        request[..2].copy_from_slice(&chunk_address.to_le_bytes());
        request[2] = (chunk.len() / WORD_LEN) as u8;
        request.extend_from_slice(chunk);

        if let Err(e) = execute(
            transport,
            device,
            opcodes::FLASH_WRITE_WORDS,
            WRITE,
            0,
            &request,
        ) {
            warn!(
                address = format_args!("0x{:04X}", chunk_address),
                packet = i + 1,
                total,
                "Flash word write failed"
            );
            return Err(e);
        }
    }
    debug!(
        address = format_args!("0x{:04X}", address),
        words = word_count,
        packets = total,
        "Flash words written"
    );

    if verify {
        verify_flash_words(transport, device, address, word_data)?;
    }
    Ok(())
}

/// Re-read a word range and compare it with `expected`.
fn verify_flash_words(
    transport: &dyn FeatureTransport,
    device: &MouseDevice,
    address: u16,
    expected: &[u8],
) -> Result<()> {
    let blocks = expected.chunks(WORDS_PER_READ8 * WORD_LEN);
    let total = blocks.len();
    for (i, block) in blocks.enumerate() {
        let block_address = address + (i * WORDS_PER_READ8) as u16;
        let fail = |source: Error| Error::SaveSequenceFailed {
            operation: "flash verify",
            step: i + 1,
            total,
            source: Some(Box::new(source)),
        };

        let actual = read_flash_bytes8(transport, device, block_address).map_err(fail)?;
        for (w, want) in block.chunks(WORD_LEN).enumerate() {
            let expected_word = u16::from_le_bytes([want[0], want[1]]);
            let actual_word = u16::from_le_bytes([actual[2 * w], actual[2 * w + 1]]);
            if expected_word != actual_word {
                let word_address = block_address + w as u16;
                warn!(
                    address = format_args!("0x{:04X}", word_address),
                    expected = format_args!("0x{:04X}", expected_word),
                    actual = format_args!("0x{:04X}", actual_word),
                    "Flash verify mismatch"
                );
                return Err(fail(Error::FlashVerifyMismatch {
                    address: word_address,
                    expected: expected_word,
                    actual: actual_word,
                }));
            }
        }
    }
    debug!(
        address = format_args!("0x{:04X}", address),
        blocks = total,
        "Flash verify passed"
    );
    Ok(())
}

/// Write little-endian dwords starting at a dword address.
pub fn write_flash_dwords(
    transport: &dyn FeatureTransport,
    device: &MouseDevice,
    address: u32,
    dword_data: &[u8],
) -> Result<()> {
    let dword_count = safety::validate_flash_payload_len(dword_data.len(), DWORD_LEN)?;
    if u64::from(address) + dword_count as u64 > u64::from(u32::MAX) + 1 {
        return Err(Error::InvalidFlashPayloadLength {
            len: dword_data.len(),
            unit: DWORD_LEN,
        });
    }

    let chunks = dword_data.chunks(DWORDS_PER_PACKET * DWORD_LEN);
    let total = chunks.len();
    for (i, chunk) in chunks.enumerate() {
        let chunk_address = address + (i * DWORDS_PER_PACKET) as u32;
        let mut request = vec![0u8; FLASH_DATA_OFFSET];
        request[..4].copy_from_slice(&chunk_address.to_le_bytes());
        request[4] = (chunk.len() / DWORD_LEN) as u8;
        request.extend_from_slice(chunk);

        if let Err(e) = execute(
            transport,
            device,
            opcodes::FLASH_WRITE_DWORDS,
            WRITE,
            0,
            &request,
        ) {
            warn!(
                address = format_args!("0x{:08X}", chunk_address),
                packet = i + 1,
                total,
                "Flash dword write failed"
            );
            return Err(e);
        }
    }
    debug!(
        address = format_args!("0x{:08X}", address),
        dwords = dword_count,
        packets = total,
        "Flash dwords written"
    );
    Ok(())
}

/// Write an adjust-gun (sensor calibration) word table at `base_address`.
///
/// The table is written and verified first; the signature word directly
/// after it is written last, so an interrupted write leaves no valid table.
pub fn write_adjust_gun_table(
    transport: &dyn FeatureTransport,
    device: &MouseDevice,
    base_address: u16,
    table: &[u8],
) -> Result<()> {
    safety::validate_adjust_gun_table_len(table.len())?;
    let signature_address = base_address as u32 + safety::ADJUST_GUN_TABLE_WORDS as u32;
    if signature_address >= WORD_SPACE_END {
        return Err(Error::InvalidFlashPayloadLength {
            len: table.len() + WORD_LEN,
            unit: WORD_LEN,
        });
    }

    write_flash_words(transport, device, base_address, table, true)?;
    write_flash_words(
        transport,
        device,
        signature_address as u16,
        &ADJUST_GUN_SIGNATURE.to_le_bytes(),
        true,
    )?;
    info!(
        base = format_args!("0x{:04X}", base_address),
        words = safety::ADJUST_GUN_TABLE_WORDS,
        "Adjust-gun table written"
    );
    Ok(())
}
