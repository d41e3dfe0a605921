//! Just enough TIFF walking to overwrite one IFD0 entry in place.
//!
//! Patching the existing block keeps every other tag byte-for-byte intact,
//! including maker notes and thumbnails that a re-serialization would drop.

/// TIFF field type code for SHORT.
const TYPE_SHORT: u16 = 3;
const ENTRY_LEN: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ByteOrder {
    Little,
    Big,
}

impl ByteOrder {
    fn detect(tiff: &[u8]) -> Option<Self> {
        match tiff.get(0..4)? {
            [b'I', b'I', 42, 0] => Some(ByteOrder::Little),
            [b'M', b'M', 0, 42] => Some(ByteOrder::Big),
            _ => None,
        }
    }

    fn u16_at(self, tiff: &[u8], offset: usize) -> Option<u16> {
        let bytes: [u8; 2] = tiff.get(offset..offset.checked_add(2)?)?.try_into().ok()?;
        Some(match self {
            ByteOrder::Little => u16::from_le_bytes(bytes),
            ByteOrder::Big => u16::from_be_bytes(bytes),
        })
    }

    fn u32_at(self, tiff: &[u8], offset: usize) -> Option<u32> {
        let bytes: [u8; 4] = tiff.get(offset..offset.checked_add(4)?)?.try_into().ok()?;
        Some(match self {
            ByteOrder::Little => u32::from_le_bytes(bytes),
            ByteOrder::Big => u32::from_be_bytes(bytes),
        })
    }

    fn encode_u16(self, value: u16) -> [u8; 2] {
        match self {
            ByteOrder::Little => value.to_le_bytes(),
            ByteOrder::Big => value.to_be_bytes(),
        }
    }
}

/// Overwrite `tag` in IFD0 with `value` if it is stored there as exactly one
/// SHORT. Returns `false`, leaving `tiff` untouched, for any other layout.
pub(crate) fn patch_ifd0_short(tiff: &mut [u8], tag: u16, value: u16) -> bool {
    let Some(value_offset) = find_single_short(tiff, tag) else {
        return false;
    };
    let Some(order) = ByteOrder::detect(tiff) else {
        return false;
    };
    // A single SHORT sits left-justified in the entry's 4-byte value field.
    tiff[value_offset..value_offset + 2].copy_from_slice(&order.encode_u16(value));
    true
}

fn find_single_short(tiff: &[u8], tag: u16) -> Option<usize> {
    let order = ByteOrder::detect(tiff)?;
    let ifd = order.u32_at(tiff, 4)? as usize;
    let count = order.u16_at(tiff, ifd)? as usize;

    (0..count)
        .map(|i| ifd + 2 + i * ENTRY_LEN)
        .find(|&entry| order.u16_at(tiff, entry) == Some(tag))
        .filter(|&entry| {
            order.u16_at(tiff, entry + 2) == Some(TYPE_SHORT)
                && order.u32_at(tiff, entry + 4) == Some(1)
                && tiff.len() >= entry + ENTRY_LEN
        })
        .map(|entry| entry + 8)
}
