// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Checksum algorithms for MCU serial frames, ported from the original
//! backend's `utils.protocol.checksum` module. Each function takes the
//! bytes the checksum is computed *over* (start byte through the end of the
//! data segment) and returns the trailer value, already sized to the wire
//! width the algorithm uses.

use crc::{Crc, CRC_16_IBM_3740, CRC_16_MODBUS, CRC_32_ISO_HDLC};

use crate::cfg::enums::ChecksumKind;

static CRC16_MODBUS: Crc<u16> = Crc::<u16>::new(&CRC_16_MODBUS);
/// CCITT-FALSE is the non-reflected CRC-16/IBM-3740 parameter set.
static CRC16_CCITT_FALSE: Crc<u16> = Crc::<u16>::new(&CRC_16_IBM_3740);
static CRC32_ISO_HDLC: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// Computes the trailer bytes (little-endian on the wire) for `data` using
/// `kind`.
pub fn compute(kind: ChecksumKind, data: &[u8]) -> Vec<u8> {
    match kind {
        ChecksumKind::Sum => vec![checksum_sum(data)],
        ChecksumKind::Lrc => vec![checksum_lrc(data)],
        ChecksumKind::Crc16Modbus => crc16_modbus(data).to_le_bytes().to_vec(),
        ChecksumKind::Crc16Ccitt => crc16_ccitt(data).to_be_bytes().to_vec(),
        ChecksumKind::Crc32 => crc32(data).to_le_bytes().to_vec(),
        ChecksumKind::Adler32 => adler32(data).to_le_bytes().to_vec(),
        ChecksumKind::Xor => vec![checksum_xor(data)],
    }
}

/// Number of trailer bytes `kind` appends to a frame.
pub fn trailer_len(kind: ChecksumKind) -> usize {
    match kind {
        ChecksumKind::Sum | ChecksumKind::Lrc | ChecksumKind::Xor => 1,
        ChecksumKind::Crc16Modbus | ChecksumKind::Crc16Ccitt => 2,
        ChecksumKind::Crc32 | ChecksumKind::Adler32 => 4,
    }
}

/// Verifies a frame's trailing checksum, returning the computed value so the
/// caller can report both expected and computed on mismatch.
pub fn verify(kind: ChecksumKind, frame_without_trailer: &[u8], trailer: &[u8]) -> bool {
    compute(kind, frame_without_trailer) == trailer
}

/// Sum of all bytes modulo 256.
pub fn checksum_sum(data: &[u8]) -> u8 {
    data.iter().fold(0u8, |acc, &b| acc.wrapping_add(b))
}

/// Two's-complement LRC: negated sum modulo 256.
pub fn checksum_lrc(data: &[u8]) -> u8 {
    checksum_sum(data).wrapping_neg()
}

/// Simple running XOR of every byte.
pub fn checksum_xor(data: &[u8]) -> u8 {
    data.iter().fold(0u8, |acc, &b| acc ^ b)
}

/// CRC-16/MODBUS: poly 0xA001 (reflected 0x8005), init 0xFFFF, LSB-first.
pub fn crc16_modbus(data: &[u8]) -> u16 {
    CRC16_MODBUS.checksum(data)
}

/// CRC-16/CCITT-FALSE: poly 0x1021, init 0xFFFF, MSB-first.
pub fn crc16_ccitt(data: &[u8]) -> u16 {
    CRC16_CCITT_FALSE.checksum(data)
}

/// CRC-32 (zlib/ISO-HDLC polynomial), reflected, init 0xFFFFFFFF, final XOR.
pub fn crc32(data: &[u8]) -> u32 {
    CRC32_ISO_HDLC.checksum(data)
}

/// Adler-32 checksum (modulus 65521).
pub fn adler32(data: &[u8]) -> u32 {
    const MOD_ADLER: u32 = 65521;
    let mut a: u32 = 1;
    let mut b: u32 = 0;
    for &byte in data {
        a = (a + byte as u32) % MOD_ADLER;
        b = (b + a) % MOD_ADLER;
    }
    (b << 16) | a
}
