//! Data flattener: packages the compiled artifacts into one binary image.
//!
//! Sections land in fixed order — forward table, safe reverse table, trie,
//! status table, rule text — each padded to 8 bytes. All offsets are
//! computed before any bytes move, the buffer is allocated once and
//! zero-filled (padding is deterministically zero), the header is written
//! first, then each section is copied into place.

use kerf_data::{HEADER_SIZE, Header, Image, align8};

use crate::Result;
use crate::sets::SetBuilder;
use crate::status::StatusList;
use crate::tables::TableBuilder;

pub(crate) fn flatten_data(
    stripped_rules: &str,
    sets: &SetBuilder,
    table: &TableBuilder,
    statuses: &StatusList,
) -> Result<Image> {
    let header_size = align8(HEADER_SIZE);
    let forward_size = align8(table.table_size());
    let reverse_size = align8(table.safe_table_size());
    let trie_true = sets.trie_size();
    let status_size = align8(statuses.len() * size_of::<i32>());
    let rule_units: Vec<u16> = stripped_rules.encode_utf16().collect();
    let rules_true = rule_units.len() * 2;
    // Stored as a null-terminated sequence of UTF-16 code units; the
    // recorded length excludes the terminator.
    let rules_size = align8(rules_true + 2);

    let total = header_size
        + forward_size
        + reverse_size
        + align8(trie_true)
        + status_size
        + rules_size;
    let mut buf = vec![0u8; total];

    let mut header = Header::new();
    header.length = total as u32;
    header.cat_count = sets.num_char_categories() as u32;
    header.f_table = header_size as u32;
    header.f_table_len = forward_size as u32;
    header.r_table = header.f_table + header.f_table_len;
    header.r_table_len = reverse_size as u32;
    header.trie = header.r_table + header.r_table_len;
    header.trie_len = trie_true as u32;
    header.status_table = header.trie + align8(trie_true) as u32;
    header.status_table_len = status_size as u32;
    header.rule_source = header.status_table + header.status_table_len;
    header.rule_source_len = rules_true as u32;
    buf[..HEADER_SIZE].copy_from_slice(&header.to_bytes());

    table.export_table(&mut buf[header.f_table as usize..][..table.table_size()]);
    table.export_safe_table(&mut buf[header.r_table as usize..][..table.safe_table_size()]);
    sets.serialize_trie(&mut buf[header.trie as usize..][..trie_true]);

    let status_offset = header.status_table as usize;
    for (i, &value) in statuses.vals().iter().enumerate() {
        buf[status_offset + 4 * i..status_offset + 4 * i + 4]
            .copy_from_slice(&value.to_le_bytes());
    }

    let rule_offset = header.rule_source as usize;
    for (i, unit) in rule_units.iter().enumerate() {
        buf[rule_offset + 2 * i..rule_offset + 2 * i + 2].copy_from_slice(&unit.to_le_bytes());
    }

    // Validation doubles as the internal-consistency check: a malformed
    // image here is a compiler defect, surfaced as Error::Image.
    Ok(Image::from_vec(buf)?)
}
