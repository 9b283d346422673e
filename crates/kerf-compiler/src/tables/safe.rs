//! Safe reverse table construction.
//!
//! Derived from the minimized forward table. A pair of categories (c1, c2)
//! is safe when running any state through c1 then c2 lands in one single
//! state — the iterator can restart a backward scan at such a pair without
//! knowing where the previous forward pass was. The table itself is not
//! passed through the minimizer; only its own duplicate rows are removed.

use crate::IndexPair;

use super::TableBuilder;

impl TableBuilder {
    /// Build the safe reverse table from the forward table.
    ///
    /// Rows: 0 is the stop state, 1 the start state, and row c + 2 means
    /// "the last input had category c". The start row maps every category c
    /// to row c + 2; other rows start as copies of it, and each safe pair
    /// (c1, c2) sets row(c2)[c1] = 0 — reaching the stop state means a safe
    /// restart point was found.
    pub fn build_safe_reverse_table(&mut self) {
        let num_cats = self.num_categories as usize;
        let num_states = self.states.len();

        let mut safe_pairs: Vec<(u16, u16)> = Vec::new();
        for c1 in 0..num_cats {
            for c2 in 0..num_cats {
                let mut wanted: Option<u16> = None;
                let mut safe = true;
                for state in 1..num_states {
                    let mid = self.states[state].dtran[c1] as usize;
                    let end = self.states[mid].dtran[c2];
                    match wanted {
                        None => wanted = Some(end),
                        Some(w) if w != end => {
                            safe = false;
                            break;
                        }
                        Some(_) => {}
                    }
                }
                if safe {
                    safe_pairs.push((c1 as u16, c2 as u16));
                }
            }
        }

        let start_row: Vec<u16> = (0..num_cats).map(|c| c as u16 + 2).collect();
        let mut table: Vec<Vec<u16>> = Vec::with_capacity(num_cats + 2);
        table.push(vec![0; num_cats]);
        table.push(start_row.clone());
        for _ in 0..num_cats {
            table.push(start_row.clone());
        }
        for (c1, c2) in safe_pairs {
            table[c2 as usize + 2][c1 as usize] = 0;
        }
        self.safe_table = table;

        let mut pair = IndexPair { first: 1, second: 0 };
        while self.find_duplicate_safe_state(&mut pair) {
            self.remove_safe_state(pair);
        }
    }

    fn find_duplicate_safe_state(&self, pair: &mut IndexPair) -> bool {
        let num_rows = self.safe_table.len() as u16;
        while pair.first + 1 < num_rows {
            pair.second = pair.first + 1;
            while pair.second < num_rows {
                if self.safe_rows_duplicate(pair.first, pair.second) {
                    return true;
                }
                pair.second += 1;
            }
            pair.first += 1;
        }
        false
    }

    fn safe_rows_duplicate(&self, first: u16, second: u16) -> bool {
        let a = &self.safe_table[first as usize];
        let b = &self.safe_table[second as usize];
        (0..self.num_categories as usize).all(|col| {
            let av = a[col];
            let bv = b[col];
            av == bv
                || ((av == first || av == second) && (bv == first || bv == second))
        })
    }

    fn remove_safe_state(&mut self, pair: IndexPair) {
        let IndexPair { first: keep, second: dupl } = pair;
        self.safe_table.remove(dupl as usize);
        for row in &mut self.safe_table {
            for next in row.iter_mut() {
                if *next == dupl {
                    *next = keep;
                } else if *next > dupl {
                    *next -= 1;
                }
            }
        }
    }
}
