//! Forward table construction.
//!
//! Classic followpos construction: compute nullable/firstpos/lastpos over
//! the augmented rule tree, derive followpos, then run subset construction
//! keyed on leaf-position sets. Position sets are ordered and the worklist
//! is FIFO, so identical input yields an identical state numbering.

use std::collections::BTreeSet;

use indexmap::IndexMap;

use crate::scanner::{NodeArena, NodeId, NodeKind};
use crate::sets::{SetBuilder, SetId};
use crate::status::StatusList;
use crate::{Error, Result};

use super::{StateDescriptor, TableBuilder};

/// Input symbol of a leaf position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PosSym {
    /// Consumes one code point from a set.
    Set(SetId),
    /// Marks the end of a rule; consumes nothing.
    End { rule: u16 },
}

/// Per-node and per-position facts for one tree.
struct TreeCalc<'a> {
    arena: &'a NodeArena,
    nullable: Vec<bool>,
    first: Vec<BTreeSet<u32>>,
    last: Vec<BTreeSet<u32>>,
    symbols: Vec<PosSym>,
    follow: Vec<BTreeSet<u32>>,
}

impl<'a> TreeCalc<'a> {
    fn new(arena: &'a NodeArena) -> Self {
        let n = arena.len();
        Self {
            arena,
            nullable: vec![false; n],
            first: vec![BTreeSet::new(); n],
            last: vec![BTreeSet::new(); n],
            symbols: Vec::new(),
            follow: Vec::new(),
        }
    }

    fn new_position(&mut self, sym: PosSym) -> u32 {
        let p = self.symbols.len() as u32;
        self.symbols.push(sym);
        self.follow.push(BTreeSet::new());
        p
    }

    /// Post-order walk assigning positions and filling nullable/first/last.
    fn calc(&mut self, id: NodeId) {
        let idx = id.index();
        match self.arena.kind(id) {
            NodeKind::Leaf { set } => {
                let p = self.new_position(PosSym::Set(set));
                self.first[idx].insert(p);
                self.last[idx].insert(p);
            }
            NodeKind::End { rule } => {
                let p = self.new_position(PosSym::End { rule });
                self.first[idx].insert(p);
                self.last[idx].insert(p);
            }
            NodeKind::Cat { left, right } => {
                self.calc(left);
                self.calc(right);
                self.nullable[idx] = self.nullable[left.index()] && self.nullable[right.index()];
                self.first[idx] = self.first[left.index()].clone();
                if self.nullable[left.index()] {
                    let right_first = self.first[right.index()].clone();
                    self.first[idx].extend(&right_first);
                }
                self.last[idx] = self.last[right.index()].clone();
                if self.nullable[right.index()] {
                    let left_last = self.last[left.index()].clone();
                    self.last[idx].extend(&left_last);
                }
            }
            NodeKind::Or { left, right } => {
                self.calc(left);
                self.calc(right);
                self.nullable[idx] = self.nullable[left.index()] || self.nullable[right.index()];
                self.first[idx] = &self.first[left.index()] | &self.first[right.index()];
                self.last[idx] = &self.last[left.index()] | &self.last[right.index()];
            }
            NodeKind::Star { child } | NodeKind::Quest { child } => {
                self.calc(child);
                self.nullable[idx] = true;
                self.first[idx] = self.first[child.index()].clone();
                self.last[idx] = self.last[child.index()].clone();
            }
            NodeKind::Plus { child } => {
                self.calc(child);
                self.nullable[idx] = self.nullable[child.index()];
                self.first[idx] = self.first[child.index()].clone();
                self.last[idx] = self.last[child.index()].clone();
            }
        }
    }

    /// Fill followpos from the filled first/last tables.
    fn compute_follow(&mut self, root: NodeId) {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let idx = id.index();
            match self.arena.kind(id) {
                NodeKind::Leaf { .. } | NodeKind::End { .. } => {}
                NodeKind::Cat { left, right } => {
                    self.link(left.index(), right.index());
                    stack.push(left);
                    stack.push(right);
                }
                NodeKind::Or { left, right } => {
                    stack.push(left);
                    stack.push(right);
                }
                NodeKind::Star { child } | NodeKind::Plus { child } => {
                    self.link(idx, idx);
                    stack.push(child);
                }
                NodeKind::Quest { child } => {
                    stack.push(child);
                }
            }
        }
    }

    /// For every position in `last[from]`, follow continues at `first[to]`.
    fn link(&mut self, from: usize, to: usize) {
        let last: Vec<u32> = self.last[from].iter().copied().collect();
        let first: Vec<u32> = self.first[to].iter().copied().collect();
        for &p in &last {
            self.follow[p as usize].extend(first.iter().copied());
        }
    }
}

impl TableBuilder {
    /// Build the raw forward table from the forward tree.
    ///
    /// `rule_statuses` maps rule number - 1 to the rule's status value;
    /// merged accepting states intern their combined status group into
    /// `statuses`.
    pub fn build_forward(
        arena: &NodeArena,
        root: NodeId,
        sets: &SetBuilder,
        rule_statuses: &[i32],
        statuses: &mut StatusList,
    ) -> Result<TableBuilder> {
        let mut calc = TreeCalc::new(arena);
        calc.calc(root);
        calc.compute_follow(root);

        let num_categories = sets.num_char_categories();

        // State registry: position set → state number, in discovery order.
        // State 0 is the reserved stop state (the empty set).
        let mut registry: IndexMap<Vec<u32>, u16> = IndexMap::new();
        registry.insert(Vec::new(), 0);
        let start: Vec<u32> = calc.first[root.index()].iter().copied().collect();
        registry.insert(start, 1);

        let mut states: Vec<StateDescriptor> = Vec::new();
        let mut current = 0usize;
        while current < registry.len() {
            let positions: Vec<u32> = registry
                .get_index(current)
                .expect("in-bounds registry index")
                .0
                .clone();

            let mut dtran = vec![0u16; num_categories as usize];
            for cat in 0..num_categories {
                let mut next: BTreeSet<u32> = BTreeSet::new();
                for &p in &positions {
                    if let PosSym::Set(set) = calc.symbols[p as usize] {
                        if sets.set_categories(set).binary_search(&cat).is_ok() {
                            next.extend(&calc.follow[p as usize]);
                        }
                    }
                }
                if next.is_empty() {
                    continue;
                }
                let key: Vec<u32> = next.into_iter().collect();
                let next_state = match registry.get(&key) {
                    Some(&idx) => idx,
                    None => {
                        let idx = registry.len();
                        let idx = u16::try_from(idx).map_err(|_| Error::TooManyStates(idx + 1))?;
                        registry.insert(key, idx);
                        idx
                    }
                };
                dtran[cat as usize] = next_state;
            }

            let mut rules: Vec<u16> = positions
                .iter()
                .filter_map(|&p| match calc.symbols[p as usize] {
                    PosSym::End { rule } => Some(rule),
                    PosSym::Set(_) => None,
                })
                .collect();
            rules.sort_unstable();
            rules.dedup();

            let (accepting, tag_idx) = if rules.is_empty() {
                (0, 0)
            } else {
                let mut tags: Vec<i32> = rules
                    .iter()
                    .map(|&r| rule_statuses[r as usize - 1])
                    .collect();
                tags.sort_unstable();
                tags.dedup();
                (rules[0], statuses.intern(&tags)?)
            };

            states.push(StateDescriptor {
                accepting,
                tag_idx,
                dtran,
            });
            current += 1;
        }

        Ok(TableBuilder {
            states,
            num_categories,
            safe_table: Vec::new(),
        })
    }
}
