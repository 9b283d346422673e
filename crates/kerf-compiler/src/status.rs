//! Rule-status value list.
//!
//! The flattened status table is one `i32` array holding groups of
//! `[count, value...]`. An accepting state's `tag_idx` is the offset of its
//! group's count entry. The list is append-only — offsets already handed
//! out stay valid for the whole compilation — and starts with the default
//! group `[1, 0]` at offset 0.

use indexmap::IndexMap;

use crate::{Error, Result};

#[derive(Debug)]
pub struct StatusList {
    vals: Vec<i32>,
    groups: IndexMap<Vec<i32>, u16>,
}

impl StatusList {
    pub fn new() -> Self {
        let mut groups = IndexMap::new();
        groups.insert(vec![0], 0u16);
        Self {
            vals: vec![1, 0],
            groups,
        }
    }

    /// Find or append the group for a sorted, deduplicated tag list and
    /// return its offset.
    pub fn intern(&mut self, tags: &[i32]) -> Result<u16> {
        if let Some(&offset) = self.groups.get(tags) {
            return Ok(offset);
        }

        let offset = self.vals.len();
        let offset = u16::try_from(offset).map_err(|_| Error::TooManyStatusValues(offset))?;
        self.vals.push(tags.len() as i32);
        self.vals.extend_from_slice(tags);
        self.groups.insert(tags.to_vec(), offset);
        Ok(offset)
    }

    /// The flat value list, in table order.
    pub fn vals(&self) -> &[i32] {
        &self.vals
    }

    pub fn len(&self) -> usize {
        self.vals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vals.is_empty()
    }
}

impl Default for StatusList {
    fn default() -> Self {
        Self::new()
    }
}
