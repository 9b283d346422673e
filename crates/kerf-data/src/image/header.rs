//! Image file header (64 bytes).
//!
//! Section order: Header → ForwardTable → ReverseTable → Trie → StatusTable →
//! RuleSource. Each section records an offset relative to image start plus a
//! stored length. Table and status lengths are the padded sizes; trie and
//! rule-source lengths are the true unpadded sizes, mirroring how each owning
//! component reports itself.

use super::{FORMAT_VERSION, MAGIC, read_u16_le, read_u32_le};

/// Image header — first 64 bytes of a compiled image.
///
/// Encoded byte-wise, little-endian; the in-memory struct is never written
/// to the wire directly.
///
/// - 0-1: magic
/// - 2-5: format version (major.minor.milli.micro)
/// - 6-13: total length, category count
/// - 14-53: five (offset, length) section pairs
/// - 54-63: reserved, zero
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Header {
    /// Magic: 0xB1A0
    pub magic: u16,
    /// Format version (currently 1.0.0.0)
    pub format_version: [u8; 4],
    /// Total image size in bytes, header included
    pub length: u32,
    /// Number of character categories after minimization
    pub cat_count: u32,
    /// Forward table offset + padded length
    pub f_table: u32,
    pub f_table_len: u32,
    /// Safe reverse table offset + padded length
    pub r_table: u32,
    pub r_table_len: u32,
    /// Trie offset + true (unpadded) length
    pub trie: u32,
    pub trie_len: u32,
    /// Status table offset + padded length (array of i32)
    pub status_table: u32,
    pub status_table_len: u32,
    /// Rule text offset + true byte length (no padding, no terminator)
    pub rule_source: u32,
    pub rule_source_len: u32,
}

/// Encoded wire size. The struct fields sum to 54; the remainder is reserved.
pub(crate) const ENCODED_FIELDS: usize = 54;
const _: () = assert!(ENCODED_FIELDS < super::HEADER_SIZE);

impl Header {
    /// A header with the current magic and format version, all else zero.
    pub fn new() -> Self {
        Self {
            magic: MAGIC,
            format_version: FORMAT_VERSION,
            ..Default::default()
        }
    }

    /// Decode a header from the first 64 bytes of an image.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        assert!(bytes.len() >= super::HEADER_SIZE, "header too short");

        Self {
            magic: read_u16_le(bytes, 0),
            format_version: [bytes[2], bytes[3], bytes[4], bytes[5]],
            length: read_u32_le(bytes, 6),
            cat_count: read_u32_le(bytes, 10),
            f_table: read_u32_le(bytes, 14),
            f_table_len: read_u32_le(bytes, 18),
            r_table: read_u32_le(bytes, 22),
            r_table_len: read_u32_le(bytes, 26),
            trie: read_u32_le(bytes, 30),
            trie_len: read_u32_le(bytes, 34),
            status_table: read_u32_le(bytes, 38),
            status_table_len: read_u32_le(bytes, 42),
            rule_source: read_u32_le(bytes, 46),
            rule_source_len: read_u32_le(bytes, 50),
        }
    }

    /// Encode to the 64-byte wire form. Reserved bytes are zero.
    pub fn to_bytes(&self) -> [u8; super::HEADER_SIZE] {
        let mut bytes = [0u8; super::HEADER_SIZE];
        bytes[0..2].copy_from_slice(&self.magic.to_le_bytes());
        bytes[2..6].copy_from_slice(&self.format_version);
        bytes[6..10].copy_from_slice(&self.length.to_le_bytes());
        bytes[10..14].copy_from_slice(&self.cat_count.to_le_bytes());
        bytes[14..18].copy_from_slice(&self.f_table.to_le_bytes());
        bytes[18..22].copy_from_slice(&self.f_table_len.to_le_bytes());
        bytes[22..26].copy_from_slice(&self.r_table.to_le_bytes());
        bytes[26..30].copy_from_slice(&self.r_table_len.to_le_bytes());
        bytes[30..34].copy_from_slice(&self.trie.to_le_bytes());
        bytes[34..38].copy_from_slice(&self.trie_len.to_le_bytes());
        bytes[38..42].copy_from_slice(&self.status_table.to_le_bytes());
        bytes[42..46].copy_from_slice(&self.status_table_len.to_le_bytes());
        bytes[46..50].copy_from_slice(&self.rule_source.to_le_bytes());
        bytes[50..54].copy_from_slice(&self.rule_source_len.to_le_bytes());
        bytes
    }

    pub fn validate_magic(&self) -> bool {
        self.magic == MAGIC
    }

    /// Major version must match; lower components may differ.
    pub fn validate_version(&self) -> bool {
        self.format_version[0] == FORMAT_VERSION[0]
    }

    /// Section (offset, stored length) pairs in image order.
    pub fn sections(&self) -> [(&'static str, u32, u32); 5] {
        [
            ("forward table", self.f_table, self.f_table_len),
            ("reverse table", self.r_table, self.r_table_len),
            ("trie", self.trie, self.trie_len),
            ("status table", self.status_table, self.status_table_len),
            ("rule source", self.rule_source, self.rule_source_len),
        ]
    }
}
