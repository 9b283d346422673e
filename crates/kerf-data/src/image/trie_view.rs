//! Read view over the serialized code-point → category trie.
//!
//! Two-level layout, little-endian u16 values:
//! an 8-byte local header (`index_len: u32`, `data_len: u32`), then
//! `index_len` index entries, then `data_len` value entries. A code point
//! resolves as `data[index[cp >> 8] * 256 + (cp & 0xFF)]`.

use super::{read_u16_le, read_u32_le};

/// Code points per data block.
pub(crate) const BLOCK_SIZE: usize = 256;

/// Size of the trie's local header in bytes.
pub(crate) const TRIE_HEADER_SIZE: usize = 8;

/// Borrowed view over the trie section.
#[derive(Clone, Copy, Debug)]
pub struct TrieView<'a> {
    bytes: &'a [u8],
    index_len: u32,
}

impl<'a> TrieView<'a> {
    /// Wrap a trie section (true length, no padding).
    ///
    /// The caller (image validation) has already checked the declared
    /// lengths against the section size.
    pub fn new(bytes: &'a [u8]) -> Self {
        assert!(bytes.len() >= TRIE_HEADER_SIZE, "trie section too short");
        let index_len = read_u32_le(bytes, 0);
        Self { bytes, index_len }
    }

    /// Number of u16 index entries.
    pub fn index_len(&self) -> u32 {
        self.index_len
    }

    /// Number of u16 data entries.
    pub fn data_len(&self) -> u32 {
        read_u32_le(self.bytes, 4)
    }

    /// Character category for a code point.
    ///
    /// Code points past the index (or past U+10FFFF) map to category 0.
    pub fn category(&self, cp: u32) -> u16 {
        let high = (cp >> 8) as usize;
        if high >= self.index_len as usize {
            return 0;
        }
        let block = read_u16_le(self.bytes, TRIE_HEADER_SIZE + 2 * high) as usize;
        let data_start = TRIE_HEADER_SIZE + 2 * self.index_len as usize;
        let entry = block * BLOCK_SIZE + (cp as usize & 0xFF);
        read_u16_le(self.bytes, data_start + 2 * entry)
    }
}
