//! Binary image format for compiled break rules.
//!
//! This crate contains:
//! - Image format definitions (Header, section layout constants)
//! - Read-side views over a compiled image (StateTable, TrieView, status values)
//! - 8-byte aligned owned storage (AlignedVec)
//! - A human-readable image dump for diagnostics

pub mod image;

// Re-export commonly used items at crate root
pub use image::{
    AlignedVec, FORMAT_VERSION, HEADER_SIZE, Header, Image, ImageError, MAGIC, SECTION_ALIGN,
    StateRow, StateTable, TABLE_HEADER_SIZE, TrieView, align8, dump,
};
