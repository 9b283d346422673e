use super::{HEADER_SIZE, Header, Image, ImageError, align8, dump};

/// Append a section, pad to 8 bytes, and return (offset, true_len, padded_len).
fn push_section(buf: &mut Vec<u8>, bytes: &[u8]) -> (u32, u32, u32) {
    let offset = buf.len() as u32;
    buf.extend_from_slice(bytes);
    buf.resize(align8(buf.len()), 0);
    (offset, bytes.len() as u32, align8(bytes.len()) as u32)
}

fn table_section(rows: &[(u16, u16, &[u16])], num_cats: u32) -> Vec<u8> {
    let row_len = 4 + 2 * num_cats;
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&(rows.len() as u32).to_le_bytes());
    bytes.extend_from_slice(&row_len.to_le_bytes());
    bytes.extend_from_slice(&[0u8; 8]);
    for &(accepting, tag_idx, transitions) in rows {
        bytes.extend_from_slice(&accepting.to_le_bytes());
        bytes.extend_from_slice(&tag_idx.to_le_bytes());
        for &next in transitions {
            bytes.extend_from_slice(&next.to_le_bytes());
        }
    }
    bytes
}

/// A small but fully valid image: 4 categories, two forward states, one
/// reverse state, a two-block trie mapping 'a' to category 3, a default
/// status group plus one tagged group, and rule text "ab;".
fn sample_image_bytes() -> Vec<u8> {
    let num_cats = 4u32;

    let ftab = table_section(
        &[(0, 0, &[0, 0, 0, 0]), (1, 0, &[0, 0, 0, 1])],
        num_cats,
    );
    let rtab = table_section(&[(0, 0, &[0, 0, 0, 0])], num_cats);

    let mut block0 = vec![0u16; 256];
    block0['a' as usize] = 3;
    let mut trie = Vec::new();
    trie.extend_from_slice(&2u32.to_le_bytes());
    trie.extend_from_slice(&512u32.to_le_bytes());
    trie.extend_from_slice(&0u16.to_le_bytes());
    trie.extend_from_slice(&1u16.to_le_bytes());
    for v in block0.iter().chain(vec![0u16; 256].iter()) {
        trie.extend_from_slice(&v.to_le_bytes());
    }

    let mut status = Vec::new();
    for v in [1i32, 0, 1, 100] {
        status.extend_from_slice(&v.to_le_bytes());
    }

    let mut rules = Vec::new();
    for unit in "ab;".encode_utf16() {
        rules.extend_from_slice(&unit.to_le_bytes());
    }
    let rules_true_len = rules.len() as u32;
    rules.extend_from_slice(&0u16.to_le_bytes()); // terminator

    let mut buf = vec![0u8; HEADER_SIZE];
    let (f_off, _, f_pad) = push_section(&mut buf, &ftab);
    let (r_off, _, r_pad) = push_section(&mut buf, &rtab);
    let (t_off, t_true, _) = push_section(&mut buf, &trie);
    let (s_off, _, s_pad) = push_section(&mut buf, &status);
    let (src_off, _, _) = push_section(&mut buf, &rules);

    let header = Header {
        length: buf.len() as u32,
        cat_count: num_cats,
        f_table: f_off,
        f_table_len: f_pad,
        r_table: r_off,
        r_table_len: r_pad,
        trie: t_off,
        trie_len: t_true,
        status_table: s_off,
        status_table_len: s_pad,
        rule_source: src_off,
        rule_source_len: rules_true_len,
        ..Header::new()
    };
    buf[..HEADER_SIZE].copy_from_slice(&header.to_bytes());
    buf
}

#[test]
fn valid_image_loads() {
    let image = Image::from_vec(sample_image_bytes()).unwrap();
    assert_eq!(image.header().cat_count, 4);
    assert_eq!(image.len(), image.header().length as usize);
}

#[test]
fn forward_table_view() {
    let image = Image::from_vec(sample_image_bytes()).unwrap();
    let table = image.forward_table();
    assert_eq!(table.num_states(), 2);
    assert_eq!(table.num_categories(), 4);
    assert_eq!(table.row(1).accepting(), 1);
    assert_eq!(table.row(1).next_state(3), 1);
}

#[test]
fn trie_view() {
    let image = Image::from_vec(sample_image_bytes()).unwrap();
    let trie = image.trie();
    assert_eq!(trie.category('a' as u32), 3);
    assert_eq!(trie.category('z' as u32), 0);
    assert_eq!(trie.category(0x10FFFF), 0);
}

#[test]
fn status_groups() {
    let image = Image::from_vec(sample_image_bytes()).unwrap();
    // offset 0: default group [1, 0]
    assert_eq!(image.rule_statuses(0).collect::<Vec<_>>(), vec![0]);
    // offset 2: tagged group [1, 100]
    assert_eq!(image.rule_statuses(2).collect::<Vec<_>>(), vec![100]);
    assert_eq!(image.status_val(1), 0);
}

#[test]
fn rule_source_roundtrip() {
    let image = Image::from_vec(sample_image_bytes()).unwrap();
    assert_eq!(image.rule_source(), "ab;");
}

#[test]
fn too_small() {
    let err = Image::from_vec(vec![0u8; 10]).unwrap_err();
    assert!(matches!(err, ImageError::TooSmall(10)));
}

#[test]
fn invalid_magic() {
    let mut bytes = sample_image_bytes();
    bytes[0] = 0x00;
    let err = Image::from_vec(bytes).unwrap_err();
    assert!(matches!(err, ImageError::InvalidMagic(_)));
}

#[test]
fn unsupported_version() {
    let mut bytes = sample_image_bytes();
    bytes[2] = 99; // version major
    let err = Image::from_vec(bytes).unwrap_err();
    assert!(matches!(err, ImageError::UnsupportedVersion(99)));
}

#[test]
fn length_mismatch() {
    let mut bytes = sample_image_bytes();
    bytes.push(0);
    let err = Image::from_vec(bytes).unwrap_err();
    assert!(matches!(err, ImageError::SizeMismatch { .. }));
}

#[test]
fn misaligned_section() {
    let mut bytes = sample_image_bytes();
    let mut header = Header::from_bytes(&bytes);
    header.f_table += 1;
    bytes[..HEADER_SIZE].copy_from_slice(&header.to_bytes());
    let err = Image::from_vec(bytes).unwrap_err();
    assert!(matches!(err, ImageError::SectionAlignment("forward table")));
}

#[test]
fn truncated_table_grid() {
    let mut bytes = sample_image_bytes();
    let mut header = Header::from_bytes(&bytes);
    // Not enough room for the declared 2-state row grid.
    header.f_table_len = 16;
    bytes[..HEADER_SIZE].copy_from_slice(&header.to_bytes());
    let err = Image::from_vec(bytes).unwrap_err();
    assert!(matches!(err, ImageError::SectionTruncated("forward table")));
}

#[test]
fn category_count_mismatch() {
    let mut bytes = sample_image_bytes();
    let mut header = Header::from_bytes(&bytes);
    header.cat_count = 9;
    bytes[..HEADER_SIZE].copy_from_slice(&header.to_bytes());
    let err = Image::from_vec(bytes).unwrap_err();
    assert!(matches!(err, ImageError::CategoryMismatch("forward table")));
}

#[test]
fn dump_mentions_sections() {
    let image = Image::from_vec(sample_image_bytes()).unwrap();
    let text = dump::dump(&image);
    assert!(text.contains("forward table"));
    assert!(text.contains("4 categories"));
    assert!(text.contains("\"ab;\""));
}
