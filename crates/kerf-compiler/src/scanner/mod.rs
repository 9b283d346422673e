//! Rule scanner: parses rule source into parse trees.
//!
//! Produces up to four trees (forward, reverse, safe-forward, safe-reverse;
//! `!!` directives switch between them), the per-rule status values, and —
//! via [`strip_rules`] — the comment/whitespace-stripped rule text stored in
//! the compiled image for diagnostics.
//!
//! Grammar, loosest binding first: alternation `|`, concatenation by
//! juxtaposition, postfix `*` `+` `?`. Atoms are `[...]` sets, `'...'`
//! literals, bare characters, escapes, `.`, `$Name` references, and
//! parenthesized groups. Each rule `expr {tag}? ;` becomes
//! `Cat(expr, End)`; rules of one tree fold into an `Or` chain.

mod node;


pub use node::{Node, NodeArena, NodeId, NodeKind};

use indexmap::IndexMap;

use crate::diagnostics::{ParseError, ParseErrorKind, Span};
use crate::lexer::{Token, TokenKind, lex, token_text};
use crate::sets::{SetBuilder, UNICODE_MAX};

/// Which parse tree subsequent rules feed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TreeTarget {
    Forward,
    Reverse,
    SafeForward,
    SafeReverse,
}

impl TreeTarget {
    #[inline]
    fn index(self) -> usize {
        match self {
            TreeTarget::Forward => 0,
            TreeTarget::Reverse => 1,
            TreeTarget::SafeForward => 2,
            TreeTarget::SafeReverse => 3,
        }
    }
}

/// Everything the scanner hands to the rest of the pipeline.
///
/// The arena owns every node of every tree; all four roots index into it.
#[derive(Debug)]
pub struct ParsedRules {
    pub arena: NodeArena,
    /// Root of the forward tree. At least one forward rule is required.
    pub forward: NodeId,
    pub reverse: Option<NodeId>,
    pub safe_forward: Option<NodeId>,
    pub safe_reverse: Option<NodeId>,
    /// Status value of each forward rule, by rule number - 1.
    pub rule_statuses: Vec<i32>,
}

/// Parse rule source. Distinct set expressions are interned into `sets`.
pub fn parse(source: &str, sets: &mut SetBuilder) -> Result<ParsedRules, ParseError> {
    RuleScanner::new(source, sets).run()
}

/// Remove comments and whitespace from rule source.
///
/// Token-aware: text inside sets and quoted literals is preserved exactly.
/// The result is stored in the image for diagnostics, never reparsed.
pub fn strip_rules(source: &str) -> String {
    lex(source)
        .iter()
        .map(|t| token_text(source, t))
        .collect()
}

struct RuleScanner<'s, 'b> {
    source: &'s str,
    tokens: Vec<Token>,
    pos: usize,
    arena: NodeArena,
    sets: &'b mut SetBuilder,
    variables: IndexMap<String, NodeId>,
    target: TreeTarget,
    roots: [Option<NodeId>; 4],
    rule_counts: [u16; 4],
    rule_statuses: Vec<i32>,
}

impl<'s, 'b> RuleScanner<'s, 'b> {
    fn new(source: &'s str, sets: &'b mut SetBuilder) -> Self {
        Self {
            source,
            tokens: lex(source),
            pos: 0,
            arena: NodeArena::new(),
            sets,
            variables: IndexMap::new(),
            target: TreeTarget::Forward,
            roots: [None; 4],
            rule_counts: [0; 4],
            rule_statuses: Vec::new(),
        }
    }

    fn run(mut self) -> Result<ParsedRules, ParseError> {
        while !self.at_end() {
            self.statement()?;
        }

        let forward = self.roots[TreeTarget::Forward.index()]
            .ok_or_else(|| ParseError::new(ParseErrorKind::EmptyRuleSet, self.eof_span()))?;

        Ok(ParsedRules {
            arena: self.arena,
            forward,
            reverse: self.roots[TreeTarget::Reverse.index()],
            safe_forward: self.roots[TreeTarget::SafeForward.index()],
            safe_reverse: self.roots[TreeTarget::SafeReverse.index()],
            rule_statuses: self.rule_statuses,
        })
    }

    // ---- token cursor ----

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|t| t.kind)
    }

    fn nth_kind(&self, n: usize) -> Option<TokenKind> {
        self.tokens.get(self.pos + n).map(|t| t.kind)
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos];
        self.pos += 1;
        token
    }

    fn eof_span(&self) -> Span {
        Span::new(self.source.len(), self.source.len())
    }

    fn expect(&mut self, kind: TokenKind, err: ParseErrorKind) -> Result<Token, ParseError> {
        match self.peek() {
            Some(token) if token.kind == kind => Ok(self.advance()),
            Some(token) => Err(ParseError::new(err, token.span)),
            None => Err(ParseError::new(err, self.eof_span())),
        }
    }

    // ---- statements ----

    fn statement(&mut self) -> Result<(), ParseError> {
        match self.peek_kind() {
            Some(TokenKind::Directive) => self.directive(),
            Some(TokenKind::VarName) if self.nth_kind(1) == Some(TokenKind::Equals) => {
                self.variable_def()
            }
            _ => self.rule(),
        }
    }

    fn directive(&mut self) -> Result<(), ParseError> {
        let token = self.advance();
        self.target = match token_text(self.source, &token) {
            "!!forward" => TreeTarget::Forward,
            "!!reverse" => TreeTarget::Reverse,
            "!!safe_forward" => TreeTarget::SafeForward,
            "!!safe_reverse" => TreeTarget::SafeReverse,
            _ => return Err(ParseError::new(ParseErrorKind::UnknownDirective, token.span)),
        };
        self.expect(TokenKind::Semi, ParseErrorKind::ExpectedSemicolon)?;
        Ok(())
    }

    fn variable_def(&mut self) -> Result<(), ParseError> {
        let name_token = self.advance();
        let name = token_text(self.source, &name_token).to_string();
        self.advance(); // '='
        let body = self.expr()?;
        self.expect(TokenKind::Semi, ParseErrorKind::ExpectedSemicolon)?;

        if self.variables.contains_key(&name) {
            return Err(ParseError::new(
                ParseErrorKind::RedefinedVariable,
                name_token.span,
            ));
        }
        self.variables.insert(name, body);
        Ok(())
    }

    fn rule(&mut self) -> Result<(), ParseError> {
        let expr = self.expr()?;
        let expr_span = self.arena.node(expr).span;

        let tag = match self.peek() {
            Some(token) if token.kind == TokenKind::StatusTag => {
                self.advance();
                let text = token_text(self.source, &token);
                text[1..text.len() - 1]
                    .parse::<i32>()
                    .map_err(|_| ParseError::new(ParseErrorKind::TagOutOfRange, token.span))?
            }
            _ => 0,
        };
        let semi = self.expect(TokenKind::Semi, ParseErrorKind::ExpectedSemicolon)?;

        let idx = self.target.index();
        if self.rule_counts[idx] == u16::MAX {
            return Err(ParseError::new(ParseErrorKind::TooManyRules, semi.span));
        }
        self.rule_counts[idx] += 1;
        let rule = self.rule_counts[idx];
        if self.target == TreeTarget::Forward {
            self.rule_statuses.push(tag);
        }

        let end = self.arena.push(NodeKind::End { rule }, semi.span);
        let root = self.arena.push(
            NodeKind::Cat {
                left: expr,
                right: end,
            },
            expr_span,
        );
        self.roots[idx] = Some(match self.roots[idx] {
            None => root,
            Some(prev) => self.arena.push(
                NodeKind::Or {
                    left: prev,
                    right: root,
                },
                expr_span,
            ),
        });
        Ok(())
    }

    // ---- expressions ----

    fn expr(&mut self) -> Result<NodeId, ParseError> {
        let mut left = self.seq()?;
        while self.peek_kind() == Some(TokenKind::Pipe) {
            self.advance();
            let right = self.seq()?;
            let span = self.join(left, right);
            left = self.arena.push(NodeKind::Or { left, right }, span);
        }
        Ok(left)
    }

    fn seq(&mut self) -> Result<NodeId, ParseError> {
        let mut left = self.postfix()?;
        while self.starts_primary() {
            let right = self.postfix()?;
            let span = self.join(left, right);
            left = self.arena.push(NodeKind::Cat { left, right }, span);
        }
        Ok(left)
    }

    fn starts_primary(&self) -> bool {
        // Garbage is claimed here so a malformed atom mid-sequence reports
        // as itself, not as a missing semicolon.
        matches!(
            self.peek_kind(),
            Some(
                TokenKind::SetLiteral
                    | TokenKind::StringLiteral
                    | TokenKind::Literal
                    | TokenKind::Escape
                    | TokenKind::Dot
                    | TokenKind::VarName
                    | TokenKind::ParenOpen
                    | TokenKind::Garbage
            )
        )
    }

    fn postfix(&mut self) -> Result<NodeId, ParseError> {
        let mut node = self.primary()?;
        loop {
            let kind = match self.peek_kind() {
                Some(TokenKind::Star) => NodeKind::Star { child: node },
                Some(TokenKind::Plus) => NodeKind::Plus { child: node },
                Some(TokenKind::Question) => NodeKind::Quest { child: node },
                _ => break,
            };
            let token = self.advance();
            let span = Span::new(
                self.arena.node(node).span.start as usize,
                token.span.end as usize,
            );
            node = self.arena.push(kind, span);
        }
        Ok(node)
    }

    fn primary(&mut self) -> Result<NodeId, ParseError> {
        let Some(token) = self.peek() else {
            return Err(ParseError::new(
                ParseErrorKind::UnexpectedToken,
                self.eof_span(),
            ));
        };

        match token.kind {
            TokenKind::SetLiteral => {
                self.advance();
                self.set_literal(token)
            }
            TokenKind::StringLiteral => {
                self.advance();
                self.string_literal(token)
            }
            TokenKind::Literal => {
                self.advance();
                let ch = token_text(self.source, &token)
                    .chars()
                    .next()
                    .expect("literal token is one char");
                Ok(self.leaf_char(ch, token.span))
            }
            TokenKind::Escape => {
                self.advance();
                let body = &token_text(self.source, &token)[1..];
                let (ch, _) = parse_escape(body)
                    .ok_or(ParseError::new(ParseErrorKind::BadEscape, token.span))?;
                Ok(self.leaf_char(ch, token.span))
            }
            TokenKind::Dot => {
                self.advance();
                let set = self.sets.intern(vec![(0, UNICODE_MAX)]);
                Ok(self.arena.push(NodeKind::Leaf { set }, token.span))
            }
            TokenKind::VarName => {
                self.advance();
                let name = token_text(self.source, &token);
                let Some(&body) = self.variables.get(name) else {
                    return Err(ParseError::new(
                        ParseErrorKind::UndefinedVariable,
                        token.span,
                    ));
                };
                // Fresh copy per reference so leaf positions stay distinct.
                Ok(self.arena.clone_subtree(body))
            }
            TokenKind::ParenOpen => {
                self.advance();
                let inner = self.expr()?;
                self.expect(TokenKind::ParenClose, ParseErrorKind::UnclosedGroup)?;
                Ok(inner)
            }
            TokenKind::Garbage => {
                let kind = if token_text(self.source, &token).starts_with('[') {
                    ParseErrorKind::UnclosedSet
                } else {
                    ParseErrorKind::UnexpectedCharacter
                };
                Err(ParseError::new(kind, token.span))
            }
            _ => Err(ParseError::new(ParseErrorKind::UnexpectedToken, token.span)),
        }
    }

    // ---- atoms ----

    fn leaf_char(&mut self, ch: char, span: Span) -> NodeId {
        let set = self.sets.intern(vec![(ch as u32, ch as u32)]);
        self.arena.push(NodeKind::Leaf { set }, span)
    }

    fn string_literal(&mut self, token: Token) -> Result<NodeId, ParseError> {
        let text = token_text(self.source, &token);
        let inner = &text[1..text.len() - 1];
        if inner.is_empty() {
            return Err(ParseError::new(ParseErrorKind::EmptyLiteral, token.span));
        }

        let mut node: Option<NodeId> = None;
        let mut i = 0;
        while i < inner.len() {
            let rest = &inner[i..];
            let ch = rest.chars().next().expect("in-bounds index");
            let (decoded, consumed) = if ch == '\\' {
                let (c, n) = parse_escape(&rest[1..])
                    .ok_or(ParseError::new(ParseErrorKind::BadEscape, token.span))?;
                (c, n + 1)
            } else {
                (ch, ch.len_utf8())
            };

            let leaf = self.leaf_char(decoded, token.span);
            node = Some(match node {
                None => leaf,
                Some(left) => self.arena.push(
                    NodeKind::Cat { left, right: leaf },
                    token.span,
                ),
            });
            i += consumed;
        }
        Ok(node.expect("non-empty literal"))
    }

    fn set_literal(&mut self, token: Token) -> Result<NodeId, ParseError> {
        let text = token_text(self.source, &token);
        let inner = &text[1..text.len() - 1];
        let base = token.span.start as usize + 1;

        let mut ranges: Vec<(u32, u32)> = Vec::new();
        let mut prev: Option<char> = None;
        let mut dash = false;
        let mut i = 0;

        let negated = inner.starts_with('^');
        if negated {
            i += 1;
        }

        while i < inner.len() {
            let rest = &inner[i..];
            let ch = rest.chars().next().expect("in-bounds index");

            // Unescaped whitespace inside a set is insignificant.
            if ch.is_whitespace() {
                i += ch.len_utf8();
                continue;
            }
            if ch == '[' {
                return Err(ParseError::new(
                    ParseErrorKind::NestedSet,
                    Span::new(base + i, base + i + 1),
                ));
            }
            if ch == '-' && prev.is_some() && !dash {
                dash = true;
                i += 1;
                continue;
            }

            let (decoded, consumed) = if ch == '\\' {
                match parse_escape(&rest[1..]) {
                    Some((c, n)) => (c, n + 1),
                    None => {
                        return Err(ParseError::new(
                            ParseErrorKind::BadEscape,
                            Span::new(base + i, base + i + 2),
                        ));
                    }
                }
            } else {
                (ch, ch.len_utf8())
            };

            if dash {
                let start = prev.take().expect("range start pending");
                if start as u32 > decoded as u32 {
                    return Err(ParseError::new(
                        ParseErrorKind::BadSetRange,
                        Span::new(base + i, base + i + consumed),
                    ));
                }
                ranges.push((start as u32, decoded as u32));
                dash = false;
            } else {
                if let Some(p) = prev.take() {
                    ranges.push((p as u32, p as u32));
                }
                prev = Some(decoded);
            }
            i += consumed;
        }

        if let Some(p) = prev.take() {
            ranges.push((p as u32, p as u32));
        }
        if dash {
            // trailing '-' is a literal
            ranges.push(('-' as u32, '-' as u32));
        }

        let mut ranges = crate::sets::normalize_ranges(ranges);
        if negated {
            ranges = crate::sets::complement_ranges(&ranges);
        }
        if ranges.is_empty() {
            return Err(ParseError::new(ParseErrorKind::EmptySet, token.span));
        }

        let set = self.sets.intern(ranges);
        Ok(self.arena.push(NodeKind::Leaf { set }, token.span))
    }

    fn join(&self, left: NodeId, right: NodeId) -> Span {
        Span::new(
            self.arena.node(left).span.start as usize,
            self.arena.node(right).span.end as usize,
        )
    }
}

/// Decode the body of an escape (the text after the backslash).
///
/// Returns the character and the number of bytes consumed after the
/// backslash. `\uXXXX` and `\x{...}` name code points; `\n`, `\t`, `\r` are
/// the usual controls; anything else maps to itself.
pub(crate) fn parse_escape(body: &str) -> Option<(char, usize)> {
    let first = body.chars().next()?;
    match first {
        'u' => {
            let hex = body.get(1..5)?;
            if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
                return None;
            }
            let cp = u32::from_str_radix(hex, 16).ok()?;
            Some((char::from_u32(cp)?, 5))
        }
        'x' => {
            let inner = body.get(1..)?.strip_prefix('{')?;
            let close = inner.find('}')?;
            let hex = &inner[..close];
            if hex.is_empty() || hex.len() > 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
                return None;
            }
            let cp = u32::from_str_radix(hex, 16).ok()?;
            Some((char::from_u32(cp)?, close + 3))
        }
        'n' => Some(('\n', 1)),
        't' => Some(('\t', 1)),
        'r' => Some(('\r', 1)),
        c => Some((c, c.len_utf8())),
    }
}
