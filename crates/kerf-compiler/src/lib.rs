//! Compiler for kerf break rules.
//!
//! Compiles a textual rule set describing text boundaries (grapheme, word,
//! sentence, line) into a single self-contained binary image — a minimized
//! DFA plus auxiliary tables — that a separate runtime engine walks over
//! input text to find boundaries.
//!
//! The pipeline: parse rule text into trees → partition code points into
//! character categories → build the raw forward transition table → minimize
//! (merge duplicate categories and states to a fixed point) → derive the
//! safe reverse table → serialize the category trie → flatten everything
//! into one [`kerf_data::Image`].
//!
//! ```
//! let image = kerf_compiler::compile("[a-z]+ {200};").unwrap();
//! assert!(image.header().cat_count >= 3);
//! ```

pub mod builder;
pub mod diagnostics;
pub mod flatten;
pub mod lexer;
pub mod scanner;
pub mod sets;
pub mod status;
pub mod tables;

#[cfg(test)]
mod builder_tests;
#[cfg(test)]
mod sets_tests;
#[cfg(test)]
mod status_tests;

pub use builder::RuleBuilder;
pub use diagnostics::{ParseError, ParseErrorKind, Span};

use kerf_data::Image;

/// Errors that can occur while compiling a rule set.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed rule syntax, with a source position.
    #[error("rule parsing failed: {0}")]
    Parse(#[from] ParseError),

    /// The rule set needs more character categories than the tables can hold.
    #[error("too many character categories: {0} (limit 65535)")]
    TooManyCategories(usize),

    /// Subset construction produced more states than the tables can hold.
    #[error("too many automaton states: {0} (limit 65535)")]
    TooManyStates(usize),

    /// The rule-status list grew past what a state's tag index can address.
    #[error("status table overflow: {0} values")]
    TooManyStatusValues(usize),

    /// The freshly flattened image failed its own validation. This signals a
    /// defect in the compiler, not in the rule input.
    #[error("flattened image failed validation: {0}")]
    Image(#[from] kerf_data::ImageError),
}

/// Result type for compilation.
pub type Result<T> = std::result::Result<T, Error>;

/// A pair of table indices. In merge operations `first` is the surviving
/// lower index and `second` is merged away.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IndexPair {
    pub first: u16,
    pub second: u16,
}

/// Compile a rule set into a binary image.
pub fn compile(rules: &str) -> Result<Image> {
    RuleBuilder::compile(rules)
}
