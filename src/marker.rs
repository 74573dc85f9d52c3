//! PackStream marker bytes.
//!
//! Every PackStream value starts with a single marker byte that carries the
//! value's kind and size class. Small strings, lists, maps and structures
//! fold their size into the marker's low nibble; everything else is followed
//! by an explicit big-endian size prefix.

/// Null marker
pub const NULL: u8 = 0xC0;

/// Boolean markers
pub const FALSE: u8 = 0xC2;
pub const TRUE: u8 = 0xC3;

/// Float marker (64-bit IEEE 754, big-endian payload)
pub const FLOAT_64: u8 = 0xC1;

/// Integer markers. Tiny integers (-16 to 127) are the marker byte itself,
/// interpreted as a signed 8-bit value.
pub const INT_8: u8 = 0xC8;
pub const INT_16: u8 = 0xC9;
pub const INT_32: u8 = 0xCA;
pub const INT_64: u8 = 0xCB;

/// Bytes markers. Byte arrays have no tiny form.
pub const BYTES_8: u8 = 0xCC;
pub const BYTES_16: u8 = 0xCD;
pub const BYTES_32: u8 = 0xCE;

/// String markers
/// Tiny strings (0-15 bytes) use 0x80-0x8F
pub const TINY_STRING_BASE: u8 = 0x80;
pub const STRING_8: u8 = 0xD0;
pub const STRING_16: u8 = 0xD1;
pub const STRING_32: u8 = 0xD2;

/// List markers
/// Tiny lists (0-15 elements) use 0x90-0x9F
pub const TINY_LIST_BASE: u8 = 0x90;
pub const LIST_8: u8 = 0xD4;
pub const LIST_16: u8 = 0xD5;
pub const LIST_32: u8 = 0xD6;
/// Streamed list: unsized, elements run until [`END_OF_STREAM`].
pub const LIST_STREAM: u8 = 0xD7;

/// Map markers
/// Tiny maps (0-15 entries) use 0xA0-0xAF
pub const TINY_MAP_BASE: u8 = 0xA0;
pub const MAP_8: u8 = 0xD8;
pub const MAP_16: u8 = 0xD9;
pub const MAP_32: u8 = 0xDA;
/// Streamed map: unsized, key/value pairs run until [`END_OF_STREAM`].
pub const MAP_STREAM: u8 = 0xDB;

/// Structure markers
/// Tiny structures (0-15 fields) use 0xB0-0xBF; there is no 32-bit form.
pub const TINY_STRUCT_BASE: u8 = 0xB0;
pub const STRUCT_8: u8 = 0xDC;
pub const STRUCT_16: u8 = 0xDD;

/// Terminates a streamed list or map. Not a value by itself.
pub const END_OF_STREAM: u8 = 0xDF;

/// Largest size a tiny-form marker can fold into its low nibble.
pub const TINY_MAX_LEN: usize = 15;

/// Check if a byte is a tiny integer marker (0x00-0x7F or 0xF0-0xFF).
#[inline]
pub fn is_tiny_int(marker: u8) -> bool {
    marker <= 0x7F || marker >= 0xF0
}

/// Check if an integer fits the tiny band (-16 to 127).
#[inline]
pub fn fits_tiny_int(value: i64) -> bool {
    (-16..=127).contains(&value)
}

/// Check if a byte falls in the reserved marker ranges.
///
/// Reserved markers are not assigned by the format and decode to an
/// `UnknownMarker` error.
#[inline]
pub fn is_reserved(marker: u8) -> bool {
    matches!(marker, 0xC4..=0xC7 | 0xCF | 0xD3 | 0xDE | 0xE0..=0xEF)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiny_int_detection() {
        assert!(is_tiny_int(0x00)); // 0
        assert!(is_tiny_int(0x7F)); // 127
        assert!(is_tiny_int(0xF0)); // -16
        assert!(is_tiny_int(0xFF)); // -1
        assert!(!is_tiny_int(0x80)); // tiny string
        assert!(!is_tiny_int(0xEF)); // reserved
    }

    #[test]
    fn tiny_int_range() {
        assert!(fits_tiny_int(0));
        assert!(fits_tiny_int(127));
        assert!(fits_tiny_int(-16));
        assert!(fits_tiny_int(-1));
        assert!(!fits_tiny_int(128));
        assert!(!fits_tiny_int(-17));
    }

    #[test]
    fn reserved_ranges() {
        for m in [0xC4, 0xC5, 0xC6, 0xC7, 0xCF, 0xD3, 0xDE, 0xE0, 0xE8, 0xEF] {
            assert!(is_reserved(m), "0x{:02X} should be reserved", m);
        }
        for m in [NULL, TRUE, FALSE, FLOAT_64, INT_8, BYTES_8, STRING_8, LIST_STREAM, MAP_STREAM, STRUCT_16, END_OF_STREAM] {
            assert!(!is_reserved(m), "0x{:02X} is assigned", m);
        }
        // Reserved bytes are not tiny ints either.
        for m in 0xE0..=0xEFu8 {
            assert!(!is_tiny_int(m));
        }
    }

    #[test]
    fn marker_layout() {
        // Tiny bases are 16 apart and ordered string < list < map < struct.
        assert_eq!(TINY_LIST_BASE - TINY_STRING_BASE, 0x10);
        assert_eq!(TINY_MAP_BASE - TINY_LIST_BASE, 0x10);
        assert_eq!(TINY_STRUCT_BASE - TINY_MAP_BASE, 0x10);
        // Streamed markers sit in the sized-marker block.
        assert_eq!(LIST_STREAM, LIST_32 + 1);
        assert_eq!(MAP_STREAM, MAP_32 + 1);
    }
}
