// —————————————————————————————————————————————————————————————————————————————————————————————————
//                                       CRC-16 CCITT (Kermit)
// —————————————————————————————————————————————————————————————————————————————————————————————————

/// Table free nibble constant for the reflected CCITT polynomial.
pub const POLYNOM: u16 = 0x1081;

/// CRC-16/CCITT (Kermit), computed a nibble at a time.
///
/// The register starts at zero and is returned with its two bytes swapped. The swap is part of
/// the wire format: the frame carries the result big-endian, so the register's low byte goes
/// out first.
#[inline]
pub fn checksum(buf: &[u8]) -> u16 {
    let mut crc: u16 = 0;

    for &byte in buf {
        let q = (crc ^ u16::from(byte)) & 0x0F;
        crc = (crc >> 4) ^ (q * POLYNOM);
        let q = (crc ^ u16::from(byte >> 4)) & 0x0F;
        crc = (crc >> 4) ^ (q * POLYNOM);
    }

    crc.swap_bytes()
}

/// Receiver side check of a payload against the checksum carried by its frame.
#[inline]
pub fn verify(payload: &[u8], received: u16) -> bool {
    checksum(payload) == received
}
