//! Parse-error reporting.
//!
//! Errors carry byte spans into the rule source. The raw offset stays
//! accessible for programmatic use; [`ParseError::render`] produces the
//! annotated human-readable form.

use annotate_snippets::{AnnotationKind, Group, Level, Renderer, Snippet};

/// A byte range into the rule source.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start: start as u32,
            end: end as u32,
        }
    }

    pub fn range(self) -> std::ops::Range<usize> {
        self.start as usize..self.end as usize
    }

    /// Byte offset where the problem starts.
    pub fn offset(self) -> usize {
        self.start as usize
    }
}

/// What went wrong while parsing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseErrorKind {
    #[error("unexpected character")]
    UnexpectedCharacter,
    #[error("unexpected token")]
    UnexpectedToken,
    #[error("expected ';' after rule")]
    ExpectedSemicolon,
    #[error("expected ')' to close group")]
    UnclosedGroup,
    #[error("unbalanced set brackets")]
    UnclosedSet,
    #[error("nested sets are not supported")]
    NestedSet,
    #[error("character set matches nothing")]
    EmptySet,
    #[error("invalid range in character set")]
    BadSetRange,
    #[error("invalid escape sequence")]
    BadEscape,
    #[error("empty quoted literal")]
    EmptyLiteral,
    #[error("variable used before definition")]
    UndefinedVariable,
    #[error("variable defined twice")]
    RedefinedVariable,
    #[error("status tag out of range")]
    TagOutOfRange,
    #[error("unknown !! directive")]
    UnknownDirective,
    #[error("rule set contains no forward rules")]
    EmptyRuleSet,
    #[error("too many rules")]
    TooManyRules,
}

/// A parse error: kind plus source span.
///
/// Fatal to the compilation that produced it, never to the process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at offset {}", .span.start)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Span,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Byte offset of the error in the rule source.
    pub fn offset(&self) -> usize {
        self.span.offset()
    }

    /// Render the error against its source with an annotated snippet.
    pub fn render(&self, source: &str) -> String {
        let renderer = Renderer::plain();
        let message = self.kind.to_string();

        let mut range = self.span.range();
        range.end = range.end.min(source.len());
        range.start = range.start.min(range.end);

        let snippet = Snippet::source(source)
            .line_start(1)
            .annotation(AnnotationKind::Primary.span(range).label(message.as_str()));
        let report: Vec<Group> =
            vec![Level::ERROR.primary_title(message.as_str()).element(snippet)];

        renderer.render(&report)
    }
}
