//! CRC-8 used to protect every frame
//!
//! Polynomial x^8 + x^5 + x^4 + 1 (0x31), initial value 0xFF, MSB first,
//! no reflection and no final XOR (the "CRC-8/NRSC-5" parameter set).

/// Generator polynomial
pub const CRC_POLY: u8 = 0x31;

/// Initial register value
pub const CRC_INIT: u8 = 0xFF;

/// Compute the CRC-8 of `data`
pub fn crc8(data: &[u8]) -> u8 {
    let mut crc = CRC_INIT;
    for &byte in data {
        crc ^= byte;
        for _ in 0..8 {
            crc = if crc & 0x80 != 0 {
                (crc << 1) ^ CRC_POLY
            } else {
                crc << 1
            };
        }
    }
    crc
}
