use kerf_data::TrieView;

use crate::IndexPair;
use crate::sets::{
    RESERVED_CATEGORIES, SetBuilder, UNICODE_MAX, complement_ranges, normalize_ranges,
};

#[test]
fn normalize_sorts_and_merges() {
    assert_eq!(
        normalize_ranges(vec![(5, 7), (1, 3), (4, 4)]),
        vec![(1, 7)]
    );
    assert_eq!(
        normalize_ranges(vec![(10, 20), (15, 30), (40, 41)]),
        vec![(10, 30), (40, 41)]
    );
    assert_eq!(normalize_ranges(vec![]), vec![]);
}

#[test]
fn complement_inverts() {
    assert_eq!(complement_ranges(&[]), vec![(0, UNICODE_MAX)]);
    assert_eq!(complement_ranges(&[(0, UNICODE_MAX)]), vec![]);
    assert_eq!(
        complement_ranges(&[(97, 122)]),
        vec![(0, 96), (123, UNICODE_MAX)]
    );
}

#[test]
fn intern_deduplicates() {
    let mut sets = SetBuilder::new();
    let a = sets.intern(vec![(97, 99)]);
    let b = sets.intern(vec![(97, 99)]);
    assert_eq!(a, b);
    assert_eq!(sets.num_sets(), 1);
}

/// [a-z], [m-p], [0-9]: overlap splits [a-z] into two categories' worth of
/// signatures, digits get their own.
fn overlapping_sets() -> SetBuilder {
    let mut sets = SetBuilder::new();
    sets.intern(vec![(97, 122)]);
    sets.intern(vec![(109, 112)]);
    sets.intern(vec![(48, 57)]);
    sets.build_ranges().expect("few categories");
    sets
}

#[test]
fn ranges_partition_on_signatures() {
    let sets = overlapping_sets();
    // digits, [a-l]+[q-z], [m-p]
    assert_eq!(sets.num_char_categories(), RESERVED_CATEGORIES + 3);

    assert_eq!(sets.category_of('0' as u32), 3);
    assert_eq!(sets.category_of('a' as u32), 4);
    assert_eq!(sets.category_of('m' as u32), 5);
    assert_eq!(sets.category_of('p' as u32), 5);
    assert_eq!(sets.category_of('q' as u32), 4);
    assert_eq!(sets.category_of('z' as u32), 4);
    // not in any set
    assert_eq!(sets.category_of(' ' as u32), 0);
    assert_eq!(sets.category_of(UNICODE_MAX), 0);
}

#[test]
fn set_categories_cover_each_set() {
    let mut sets = overlapping_sets();
    // Interning an existing set hands back its id.
    let alpha = sets.intern(vec![(97, 122)]);
    let mid = sets.intern(vec![(109, 112)]);
    let digits = sets.intern(vec![(48, 57)]);
    assert_eq!(sets.set_categories(alpha), &[4, 5]);
    assert_eq!(sets.set_categories(mid), &[5]);
    assert_eq!(sets.set_categories(digits), &[3]);
}

#[test]
fn merge_reassigns_and_renumbers() {
    let mut sets = overlapping_sets();
    sets.merge_categories(IndexPair {
        first: 3,
        second: 4,
    });

    assert_eq!(sets.num_char_categories(), RESERVED_CATEGORIES + 2);
    // old category 4 joined 3; old 5 became 4
    assert_eq!(sets.category_of('a' as u32), 3);
    assert_eq!(sets.category_of('0' as u32), 3);
    assert_eq!(sets.category_of('m' as u32), 4);
    assert_eq!(sets.category_of(' ' as u32), 0);
}

#[test]
fn category_of_before_build_is_zero() {
    let sets = SetBuilder::new();
    assert_eq!(sets.category_of('a' as u32), 0);
}

#[test]
fn trie_matches_direct_lookup() {
    let mut sets = overlapping_sets();
    sets.build_trie();

    let mut buf = vec![0u8; sets.trie_size()];
    sets.serialize_trie(&mut buf);
    let view = TrieView::new(&buf);

    for cp in [
        '0' as u32,
        'a' as u32,
        'm' as u32,
        'z' as u32,
        ' ' as u32,
        0x4E00,
        UNICODE_MAX,
    ] {
        assert_eq!(view.category(cp), sets.category_of(cp), "cp {cp:#x}");
    }
}

#[test]
fn trie_after_merge_reflects_new_numbering() {
    let mut sets = overlapping_sets();
    sets.merge_categories(IndexPair {
        first: 3,
        second: 5,
    });
    sets.build_trie();

    let mut buf = vec![0u8; sets.trie_size()];
    sets.serialize_trie(&mut buf);
    let view = TrieView::new(&buf);

    assert_eq!(view.category('m' as u32), 3);
    assert_eq!(view.category('0' as u32), 3);
    assert_eq!(view.category('a' as u32), 4);
}
