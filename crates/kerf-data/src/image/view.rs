//! A validated compiled image and its section accessors.
//!
//! The image is self-describing: everything needed to locate a section is in
//! the 64-byte header. Validation happens once at construction; accessors
//! afterwards are cheap borrows into the buffer.

use super::state_table::TABLE_HEADER_SIZE;
use super::trie_view::TRIE_HEADER_SIZE;
use super::{
    AlignedVec, HEADER_SIZE, Header, SECTION_ALIGN, StateTable, TrieView, align8, read_u32_le,
};

/// Image validation error.
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("image too small: {0} bytes (minimum {HEADER_SIZE})")]
    TooSmall(usize),
    #[error("invalid magic: {0:#06x}")]
    InvalidMagic(u16),
    #[error("unsupported format version major: {0}")]
    UnsupportedVersion(u8),
    #[error("size mismatch: header says {header} bytes, got {actual}")]
    SizeMismatch { header: u32, actual: usize },
    #[error("{0} section out of bounds")]
    SectionBounds(&'static str),
    #[error("{0} section offset not 8-byte aligned")]
    SectionAlignment(&'static str),
    #[error("{0} section too small for its declared contents")]
    SectionTruncated(&'static str),
    #[error("{0} row length does not match the header category count")]
    CategoryMismatch(&'static str),
}

/// A compiled, validated break-rule image.
///
/// Owns its buffer; hand it to a runtime engine as a value. Storage is
/// 8-byte aligned so in-place u16/u32 reads of section contents line up.
#[derive(Clone, Debug)]
pub struct Image {
    storage: AlignedVec,
    header: Header,
}

impl Image {
    /// Validate and take ownership of image bytes.
    pub fn from_vec(bytes: Vec<u8>) -> Result<Self, ImageError> {
        Self::from_aligned(AlignedVec::copy_from_slice(&bytes))
    }

    /// Validate aligned image storage.
    pub fn from_aligned(storage: AlignedVec) -> Result<Self, ImageError> {
        if storage.len() < HEADER_SIZE {
            return Err(ImageError::TooSmall(storage.len()));
        }

        let header = Header::from_bytes(&storage);
        if !header.validate_magic() {
            return Err(ImageError::InvalidMagic(header.magic));
        }
        if !header.validate_version() {
            return Err(ImageError::UnsupportedVersion(header.format_version[0]));
        }
        if header.length as usize != storage.len() {
            return Err(ImageError::SizeMismatch {
                header: header.length,
                actual: storage.len(),
            });
        }

        for (name, offset, len) in header.sections() {
            let offset = offset as usize;
            if !offset.is_multiple_of(SECTION_ALIGN) {
                return Err(ImageError::SectionAlignment(name));
            }
            // True-length sections occupy align8(len) bytes of storage.
            if offset < HEADER_SIZE || offset + align8(len as usize) > storage.len() {
                return Err(ImageError::SectionBounds(name));
            }
        }

        let image = Self { storage, header };
        image.validate_tables()?;
        image.validate_trie()?;
        Ok(image)
    }

    /// Check that the declared row grids and trie arrays fit their sections.
    fn validate_tables(&self) -> Result<(), ImageError> {
        for (name, bytes) in [
            ("forward table", self.forward_table_bytes()),
            ("reverse table", self.safe_reverse_table_bytes()),
        ] {
            if bytes.len() < TABLE_HEADER_SIZE {
                return Err(ImageError::SectionTruncated(name));
            }
            let num_states = read_u32_le(bytes, 0) as usize;
            let row_len = read_u32_le(bytes, 4) as usize;
            if TABLE_HEADER_SIZE + num_states * row_len > bytes.len() {
                return Err(ImageError::SectionTruncated(name));
            }
            if row_len as u64 != 4 + 2 * self.header.cat_count as u64 {
                return Err(ImageError::CategoryMismatch(name));
            }
        }
        Ok(())
    }

    fn validate_trie(&self) -> Result<(), ImageError> {
        let bytes = self.trie_bytes();
        if bytes.len() < TRIE_HEADER_SIZE {
            return Err(ImageError::SectionTruncated("trie"));
        }
        let index_len = read_u32_le(bytes, 0) as usize;
        let data_len = read_u32_le(bytes, 4) as usize;
        if TRIE_HEADER_SIZE + 2 * (index_len + data_len) > bytes.len() {
            return Err(ImageError::SectionTruncated("trie"));
        }
        Ok(())
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    /// The whole image, header included.
    pub fn as_bytes(&self) -> &[u8] {
        &self.storage
    }

    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    fn section(&self, offset: u32, len: u32) -> &[u8] {
        &self.storage[offset as usize..offset as usize + len as usize]
    }

    fn forward_table_bytes(&self) -> &[u8] {
        self.section(self.header.f_table, self.header.f_table_len)
    }

    fn safe_reverse_table_bytes(&self) -> &[u8] {
        self.section(self.header.r_table, self.header.r_table_len)
    }

    fn trie_bytes(&self) -> &[u8] {
        self.section(self.header.trie, self.header.trie_len)
    }

    pub fn forward_table(&self) -> StateTable<'_> {
        StateTable::new(self.forward_table_bytes())
    }

    pub fn safe_reverse_table(&self) -> StateTable<'_> {
        StateTable::new(self.safe_reverse_table_bytes())
    }

    pub fn trie(&self) -> TrieView<'_> {
        TrieView::new(self.trie_bytes())
    }

    /// Number of i32 entries in the status table (padded length / 4).
    pub fn status_count(&self) -> usize {
        self.header.status_table_len as usize / 4
    }

    /// One entry of the status table.
    pub fn status_val(&self, idx: usize) -> i32 {
        let bytes = self.section(self.header.status_table, self.header.status_table_len);
        read_u32_le(bytes, idx * 4) as i32
    }

    /// The status group an accepting state's `tag_idx` points at:
    /// a count entry followed by that many status values.
    pub fn rule_statuses(&self, tag_idx: u16) -> impl Iterator<Item = i32> + '_ {
        let start = tag_idx as usize;
        let count = self.status_val(start) as usize;
        (start + 1..start + 1 + count).map(|i| self.status_val(i))
    }

    /// The stripped rule text, decoded from stored UTF-16.
    pub fn rule_source(&self) -> String {
        let offset = self.header.rule_source as usize;
        let len = self.header.rule_source_len as usize;
        let units: Vec<u16> = self.storage[offset..offset + len]
            .chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    }
}
