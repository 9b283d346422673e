//! Automaton table builder.
//!
//! Holds the forward transition table (rows = states, columns = character
//! categories) and, once derived, the safe reverse table. Exposes the
//! duplicate-detection and removal primitives the minimization loop drives,
//! plus serialization of both tables.
//!
//! The lower-indexed member of any duplicate pair survives, so identical
//! input always minimizes to identical output.

mod build;
mod safe;


use kerf_data::TABLE_HEADER_SIZE;

use crate::IndexPair;

/// One state of the forward table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct StateDescriptor {
    /// Nonzero when the state ends a rule; the lowest such rule number.
    pub accepting: u16,
    /// Offset of the state's status group in the status list.
    pub tag_idx: u16,
    /// Next state per character category.
    pub dtran: Vec<u16>,
}

/// The automaton under construction. Built by
/// [`TableBuilder::build_forward`], shrunk by the minimization loop, then
/// extended with the safe reverse table.
#[derive(Debug)]
pub struct TableBuilder {
    pub(crate) states: Vec<StateDescriptor>,
    pub(crate) num_categories: u16,
    /// Safe reverse rows; plain transition vectors, no metadata.
    pub(crate) safe_table: Vec<Vec<u16>>,
}

impl TableBuilder {
    pub fn num_states(&self) -> usize {
        self.states.len()
    }

    pub fn num_categories(&self) -> u16 {
        self.num_categories
    }

    pub fn num_safe_states(&self) -> usize {
        self.safe_table.len()
    }

    /// Find the next pair of categories whose columns are identical across
    /// every state, scanning upward from `pair.first`. Returns false when no
    /// such pair remains.
    pub fn find_duplicate_category_from(&self, pair: &mut IndexPair) -> bool {
        let num_cols = self.num_categories;
        while pair.first + 1 < num_cols {
            pair.second = pair.first + 1;
            while pair.second < num_cols {
                let (c1, c2) = (pair.first as usize, pair.second as usize);
                if self.states.iter().all(|s| s.dtran[c1] == s.dtran[c2]) {
                    return true;
                }
                pair.second += 1;
            }
            pair.first += 1;
        }
        false
    }

    /// Delete one category column from every state.
    pub fn remove_column(&mut self, column: u16) {
        for state in &mut self.states {
            state.dtran.remove(column as usize);
        }
        self.num_categories -= 1;
    }

    /// Remove duplicate states until none remain; returns how many were
    /// removed. Two states are duplicates when their metadata matches and
    /// their rows agree, counting a reference to either state of the pair
    /// as a reference to the merged state.
    pub fn remove_duplicate_states(&mut self) -> usize {
        let mut pair = IndexPair { first: 1, second: 0 };
        let mut removed = 0;
        while self.find_duplicate_state(&mut pair) {
            self.remove_state(pair);
            removed += 1;
        }
        removed
    }

    fn find_duplicate_state(&self, pair: &mut IndexPair) -> bool {
        let num_states = self.states.len() as u16;
        while pair.first + 1 < num_states {
            pair.second = pair.first + 1;
            while pair.second < num_states {
                if self.states_duplicate(pair.first, pair.second) {
                    return true;
                }
                pair.second += 1;
            }
            pair.first += 1;
        }
        false
    }

    fn states_duplicate(&self, first: u16, second: u16) -> bool {
        let a = &self.states[first as usize];
        let b = &self.states[second as usize];
        if a.accepting != b.accepting || a.tag_idx != b.tag_idx {
            return false;
        }
        (0..self.num_categories as usize).all(|col| {
            let av = a.dtran[col];
            let bv = b.dtran[col];
            av == bv
                || ((av == first || av == second) && (bv == first || bv == second))
        })
    }

    /// Remove `pair.second`, rewriting every reference to it onto
    /// `pair.first` and shifting higher state numbers down.
    fn remove_state(&mut self, pair: IndexPair) {
        let IndexPair { first: keep, second: dupl } = pair;
        self.states.remove(dupl as usize);
        for state in &mut self.states {
            for next in &mut state.dtran {
                if *next == dupl {
                    *next = keep;
                } else if *next > dupl {
                    *next -= 1;
                }
            }
        }
    }

    // ---- serialization ----

    /// Row length in bytes: accepting + tag_idx + one u16 per category.
    fn row_len(&self) -> usize {
        4 + 2 * self.num_categories as usize
    }

    /// True (unpadded) size of the serialized forward table.
    pub fn table_size(&self) -> usize {
        TABLE_HEADER_SIZE + self.states.len() * self.row_len()
    }

    /// True (unpadded) size of the serialized safe reverse table.
    pub fn safe_table_size(&self) -> usize {
        TABLE_HEADER_SIZE + self.safe_table.len() * self.row_len()
    }

    pub fn export_table(&self, buf: &mut [u8]) {
        let mut writer = RowWriter::new(buf, self.states.len(), self.row_len());
        for state in &self.states {
            writer.row(state.accepting, state.tag_idx, &state.dtran);
        }
    }

    pub fn export_safe_table(&self, buf: &mut [u8]) {
        let mut writer = RowWriter::new(buf, self.safe_table.len(), self.row_len());
        for row in &self.safe_table {
            writer.row(0, 0, row);
        }
    }
}

/// Serializer shared by both tables: 16-byte local header, then rows.
struct RowWriter<'a> {
    buf: &'a mut [u8],
    offset: usize,
}

impl<'a> RowWriter<'a> {
    fn new(buf: &'a mut [u8], num_states: usize, row_len: usize) -> Self {
        assert!(
            buf.len() >= TABLE_HEADER_SIZE + num_states * row_len,
            "table buffer too small"
        );
        buf[0..4].copy_from_slice(&(num_states as u32).to_le_bytes());
        buf[4..8].copy_from_slice(&(row_len as u32).to_le_bytes());
        // flags + reserved stay zero
        Self {
            buf,
            offset: TABLE_HEADER_SIZE,
        }
    }

    fn row(&mut self, accepting: u16, tag_idx: u16, transitions: &[u16]) {
        self.put(accepting);
        self.put(tag_idx);
        for &next in transitions {
            self.put(next);
        }
    }

    fn put(&mut self, value: u16) {
        self.buf[self.offset..self.offset + 2].copy_from_slice(&value.to_le_bytes());
        self.offset += 2;
    }
}
