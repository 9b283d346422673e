//! Character set and category builder.
//!
//! Collects every distinct set expression the rules reference, partitions
//! the code-point space into character categories (one per distinct set
//! membership signature), and builds the serializable code-point → category
//! trie.
//!
//! Categories 0, 1 and 2 are reserved: 0 holds code points mentioned by no
//! set, 1 and 2 are the begin-of-text / end-of-text sentinels the runtime
//! synthesizes at text edges. They own no merge-eligible columns and are
//! never merge candidates.

use std::collections::BTreeSet;

use indexmap::{IndexMap, IndexSet};

use crate::{Error, IndexPair, Result};

/// Largest Unicode code point.
pub const UNICODE_MAX: u32 = 0x10FFFF;

/// First category index that is ever assigned to code points (and the first
/// one minimization may merge).
pub const RESERVED_CATEGORIES: u16 = 3;

/// Code points per trie data block.
const TRIE_BLOCK: usize = 256;

/// Index of an interned set expression.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SetId(u32);

impl SetId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One maximal run of code points sharing a category.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CategoryRange {
    pub start: u32,
    pub end: u32,
    pub category: u16,
}

/// Owns the set expressions and the category partition derived from them.
#[derive(Debug, Default)]
pub struct SetBuilder {
    /// Interned sets, keyed by normalized inclusive range list.
    sets: IndexSet<Vec<(u32, u32)>>,
    /// Disjoint ranges tiling 0..=UNICODE_MAX, ascending. Filled by
    /// `build_ranges`, renumbered by `merge_categories`.
    ranges: Vec<CategoryRange>,
    /// Per set: sorted categories it covers. Valid until the first merge.
    set_cats: Vec<Vec<u16>>,
    num_categories: u16,
    trie_index: Vec<u16>,
    trie_data: Vec<u16>,
}

impl SetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a normalized range list, deduplicating across all trees.
    pub fn intern(&mut self, ranges: Vec<(u32, u32)>) -> SetId {
        debug_assert!(
            ranges.windows(2).all(|w| w[0].1 + 1 < w[1].0) || ranges.len() < 2,
            "set ranges must be normalized"
        );
        let (index, _) = self.sets.insert_full(ranges);
        SetId(index as u32)
    }

    pub fn num_sets(&self) -> usize {
        self.sets.len()
    }

    pub fn set_ranges(&self, id: SetId) -> &[(u32, u32)] {
        self.sets.get_index(id.index()).expect("valid set id")
    }

    /// Partition the code-point space and assign categories.
    ///
    /// Every boundary of every set splits the space; intervals with the same
    /// set-membership signature share a category, numbered from 3 upward in
    /// first-appearance order.
    pub fn build_ranges(&mut self) -> Result<()> {
        let mut bounds: BTreeSet<u32> = BTreeSet::new();
        bounds.insert(0);
        bounds.insert(UNICODE_MAX + 1);
        for ranges in &self.sets {
            for &(start, end) in ranges {
                bounds.insert(start);
                bounds.insert(end + 1);
            }
        }
        let bounds: Vec<u32> = bounds.into_iter().collect();

        let mut signatures: IndexMap<Vec<u32>, u16> = IndexMap::new();
        let mut out: Vec<CategoryRange> = Vec::new();

        for window in bounds.windows(2) {
            let (start, end) = (window[0], window[1] - 1);

            // Intervals never straddle a set boundary, so membership at
            // `start` holds for the whole interval.
            let sig: Vec<u32> = self
                .sets
                .iter()
                .enumerate()
                .filter(|(_, ranges)| contains(ranges, start))
                .map(|(i, _)| i as u32)
                .collect();

            let category = if sig.is_empty() {
                0
            } else if let Some(&cat) = signatures.get(&sig) {
                cat
            } else {
                let next = RESERVED_CATEGORIES as usize + signatures.len();
                if next >= u16::MAX as usize {
                    return Err(Error::TooManyCategories(next + 1));
                }
                let cat = next as u16;
                signatures.insert(sig, cat);
                cat
            };

            match out.last_mut() {
                Some(last) if last.category == category && last.end + 1 == start => {
                    last.end = end;
                }
                _ => out.push(CategoryRange {
                    start,
                    end,
                    category,
                }),
            }
        }

        let mut set_cats = vec![Vec::new(); self.sets.len()];
        for (sig, &cat) in &signatures {
            for &set in sig {
                set_cats[set as usize].push(cat);
            }
        }
        for cats in &mut set_cats {
            cats.sort_unstable();
        }

        self.num_categories = RESERVED_CATEGORIES + signatures.len() as u16;
        self.ranges = out;
        self.set_cats = set_cats;
        Ok(())
    }

    /// Category count, reserved categories included.
    pub fn num_char_categories(&self) -> u16 {
        self.num_categories
    }

    /// Sorted categories a set covers. Valid until the first merge.
    pub fn set_categories(&self, id: SetId) -> &[u16] {
        &self.set_cats[id.index()]
    }

    /// Category of a single code point.
    pub fn category_of(&self, cp: u32) -> u16 {
        let idx = self.ranges.partition_point(|r| r.end < cp);
        match self.ranges.get(idx) {
            Some(range) if range.start <= cp => range.category,
            _ => 0,
        }
    }

    pub fn ranges(&self) -> &[CategoryRange] {
        &self.ranges
    }

    /// Merge `pair.second` into `pair.first`: the second category's code
    /// points move to the first, and categories above the second shift down
    /// by one to keep the numbering dense.
    pub fn merge_categories(&mut self, pair: IndexPair) {
        debug_assert!(pair.first >= RESERVED_CATEGORIES);
        debug_assert!(pair.first < pair.second);

        for range in &mut self.ranges {
            if range.category == pair.second {
                range.category = pair.first;
            } else if range.category > pair.second {
                range.category -= 1;
            }
        }
        self.num_categories -= 1;

        // Neighbors may now share a category; restore maximal runs.
        let mut merged: Vec<CategoryRange> = Vec::with_capacity(self.ranges.len());
        for range in self.ranges.drain(..) {
            match merged.last_mut() {
                Some(last) if last.category == range.category && last.end + 1 == range.start => {
                    last.end = range.end;
                }
                _ => merged.push(range),
            }
        }
        self.ranges = merged;
    }

    /// Build the two-level trie from the (possibly merged) category ranges.
    pub fn build_trie(&mut self) {
        let index_len = (UNICODE_MAX as usize + 1) / TRIE_BLOCK;
        let mut blocks: IndexMap<Vec<u16>, u16> = IndexMap::new();
        let mut index = Vec::with_capacity(index_len);
        let mut cursor = 0usize;

        for high in 0..index_len {
            let mut block = vec![0u16; TRIE_BLOCK];
            for (low, slot) in block.iter_mut().enumerate() {
                let cp = (high * TRIE_BLOCK + low) as u32;
                while self.ranges[cursor].end < cp {
                    cursor += 1;
                }
                *slot = self.ranges[cursor].category;
            }
            let next = blocks.len() as u16;
            index.push(*blocks.entry(block).or_insert(next));
        }

        self.trie_index = index;
        self.trie_data = blocks.into_keys().flatten().collect();
    }

    /// True (unpadded) size of the serialized trie in bytes.
    pub fn trie_size(&self) -> usize {
        8 + 2 * (self.trie_index.len() + self.trie_data.len())
    }

    /// Serialize the trie into `buf` (little-endian).
    pub fn serialize_trie(&self, buf: &mut [u8]) {
        assert!(buf.len() >= self.trie_size(), "trie buffer too small");
        buf[0..4].copy_from_slice(&(self.trie_index.len() as u32).to_le_bytes());
        buf[4..8].copy_from_slice(&(self.trie_data.len() as u32).to_le_bytes());
        let mut offset = 8;
        for &value in self.trie_index.iter().chain(self.trie_data.iter()) {
            buf[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
            offset += 2;
        }
    }
}

fn contains(ranges: &[(u32, u32)], cp: u32) -> bool {
    ranges.iter().any(|&(start, end)| start <= cp && cp <= end)
}

/// Sort and merge overlapping or adjacent ranges.
pub fn normalize_ranges(mut ranges: Vec<(u32, u32)>) -> Vec<(u32, u32)> {
    ranges.sort_unstable();
    let mut out: Vec<(u32, u32)> = Vec::with_capacity(ranges.len());
    for (start, end) in ranges {
        match out.last_mut() {
            Some(last) if start <= last.1.saturating_add(1) => last.1 = last.1.max(end),
            _ => out.push((start, end)),
        }
    }
    out
}

/// Complement a normalized range list over the full code-point range.
pub fn complement_ranges(ranges: &[(u32, u32)]) -> Vec<(u32, u32)> {
    let mut out = Vec::new();
    let mut next = 0u32;
    for &(start, end) in ranges {
        if start > next {
            out.push((next, start - 1));
        }
        next = end + 1;
        if next > UNICODE_MAX {
            return out;
        }
    }
    out.push((next, UNICODE_MAX));
    out
}
