//! A fixed, process-wide byte-frequency ranking table.
//!
//! The higher the value, the more common the byte is expected to be in
//! typical scanned input (text and source code); the lower, the rarer.
//! The rare-byte prefilter selects bytes with a low rank, since a byte that
//! rarely occurs makes a better anchor to scan for. This table is static
//! data generated once offline from an approximate model of English-text and
//! source-code byte frequency; it is not derived per scan (spec.md §4.2,
//! §9 "Module-level byte-frequency table").
#[rustfmt::skip]
pub const RANK: [u8; 256] = [
    4, 8, 8, 8, 8, 8, 8, 8, 8, 90, 210, 8, 8, 120, 8, 8,
    8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8,
    255, 90, 130, 70, 60, 70, 80, 120, 160, 160, 100, 100, 180, 170, 200, 130,
    130, 130, 130, 130, 130, 130, 130, 130, 130, 130, 150, 120, 100, 150, 100, 80,
    60, 190, 105, 145, 155, 200, 125, 120, 165, 180, 100, 100, 150, 135, 175, 185,
    110, 100, 160, 170, 195, 140, 100, 130, 100, 115, 100, 90, 60, 90, 50, 140,
    40, 238, 150, 184, 196, 250, 160, 154, 208, 226, 150, 150, 190, 172, 220, 232,
    150, 150, 202, 214, 244, 178, 150, 166, 150, 150, 150, 110, 60, 110, 40, 8,
    20, 20, 20, 20, 20, 20, 20, 20, 20, 20, 20, 20, 20, 20, 20, 20,
    20, 20, 20, 20, 20, 20, 20, 20, 20, 20, 20, 20, 20, 20, 20, 20,
    20, 20, 20, 20, 20, 20, 20, 20, 20, 20, 20, 20, 20, 20, 20, 20,
    20, 20, 20, 20, 20, 20, 20, 20, 20, 20, 20, 20, 20, 20, 20, 20,
    14, 14, 14, 14, 14, 14, 14, 14, 14, 14, 14, 14, 14, 14, 14, 14,
    14, 14, 14, 14, 14, 14, 14, 14, 14, 14, 14, 14, 14, 14, 14, 14,
    14, 14, 14, 14, 14, 14, 14, 14, 14, 14, 14, 14, 14, 14, 14, 14,
    14, 14, 14, 14, 14, 14, 14, 14, 14, 14, 14, 14, 14, 14, 14, 14,
];

/// The frequency rank of `b`. Higher means more common.
#[inline]
pub fn rank(b: u8) -> u16 {
    RANK[b as usize] as u16
}
