//! Compilation orchestrator.
//!
//! Sequences the pipeline: parse → categorize → build the forward table →
//! minimize → derive the safe reverse table → build the trie → flatten.
//! Every stage short-circuits on failure via `?`; a failed compilation
//! never yields an image. The builder owns every intermediate artifact —
//! parse trees, set list, status values — and drops them all when it goes
//! out of scope, success or failure.

use kerf_data::Image;

use crate::scanner::{self, ParsedRules};
use crate::sets::{RESERVED_CATEGORIES, SetBuilder};
use crate::status::StatusList;
use crate::tables::TableBuilder;
use crate::{IndexPair, Result, flatten};

pub struct RuleBuilder {
    pub(crate) stripped_rules: String,
    pub(crate) parsed: ParsedRules,
    pub(crate) sets: SetBuilder,
    pub(crate) statuses: StatusList,
}

impl RuleBuilder {
    /// Compile a rule set into a binary image.
    pub fn compile(rules: &str) -> Result<Image> {
        Self::parse(rules)?.build()
    }

    /// Parse rule text into the four trees, the set list, and the per-rule
    /// status values.
    pub(crate) fn parse(rules: &str) -> Result<Self> {
        let mut sets = SetBuilder::new();
        let parsed = scanner::parse(rules, &mut sets)?;
        Ok(Self {
            stripped_rules: scanner::strip_rules(rules),
            parsed,
            sets,
            statuses: StatusList::new(),
        })
    }

    /// Run the remaining pipeline stages and flatten the result.
    pub(crate) fn build(mut self) -> Result<Image> {
        self.sets.build_ranges()?;

        let mut table = TableBuilder::build_forward(
            &self.parsed.arena,
            self.parsed.forward,
            &self.sets,
            &self.parsed.rule_statuses,
            &mut self.statuses,
        )?;

        Self::optimize_tables(&mut self.sets, &mut table);
        table.build_safe_reverse_table();
        self.sets.build_trie();

        flatten::flatten_data(&self.stripped_rules, &self.sets, &table, &self.statuses)
    }

    /// Shrink the forward table to a fixed point.
    ///
    /// Column merging and state merging interact: removing a column can
    /// expose duplicate states and vice versa, so each phase runs to its own
    /// local fixed point, and the outer loop ends only when a full pass of
    /// both finds nothing. Terminates because every merge strictly lowers
    /// the category or state count.
    pub(crate) fn optimize_tables(sets: &mut SetBuilder, table: &mut TableBuilder) {
        loop {
            let mut did_something = false;

            // Begin looking for duplicates at category 3. Categories 0, 1
            // and 2 are reserved (unused, begin-of-text and end-of-text)
            // and never have others merged into them.
            let mut pair = IndexPair {
                first: RESERVED_CATEGORIES,
                second: 0,
            };
            while table.find_duplicate_category_from(&mut pair) {
                sets.merge_categories(pair);
                table.remove_column(pair.second);
                did_something = true;
            }

            while table.remove_duplicate_states() > 0 {
                did_something = true;
            }

            if !did_something {
                break;
            }
        }
    }
}
