//! SGF grammar parser.
//!
//! ```text
//! GameTree   = "(" Sequence { GameTree } ")"
//! Sequence   = Node { Node }
//! Node       = ";" { Property }
//! Property   = Ident Value { Value }
//! Value      = "[" text "]"
//! ```
//!
//! Nesting is tracked with an explicit stack of attach points, so deeply
//! nested variations cannot exhaust the call stack. The first sub-tree after a
//! sequence continues its last node; later sub-trees become branches.
//!
//! Inside a value a backslash escapes the next character. A backslash before a
//! line break is a soft break and both characters are dropped; other line
//! breaks are kept.

use tracing::{debug, trace};

use crate::error::{GrammarFault, Result, SgfError};
use crate::game::Game;
use crate::node::NodeId;
use crate::properties::Properties;

/// Parse SGF text into a raw game tree.
///
/// The first game tree of the input is read; anything after it is ignored.
/// Root node properties become game-level properties unless the root is a
/// move. The returned game has not been post-processed.
pub fn parse(text: &str) -> Result<Game> {
    let mut parser = Parser::new(text);
    let game = parser.game_tree()?;
    debug!(nodes = game.arena_len(), bytes = parser.pos, "parsed game tree");
    if !parser.rest().trim().is_empty() {
        debug!(
            offset = parser.pos,
            "ignoring content after the first game tree"
        );
    }
    Ok(game)
}

/// Remove SGF escapes from a value's raw text.
pub fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    decode_value(text, &mut out, false);
    out
}

/// Escape a text value for output. Backslash, brackets and colon are escaped.
pub fn escape(text: &str) -> String {
    escape_with(text, true)
}

/// Escape a compose-type value, keeping its `:` separator intact.
pub fn escape_compose(text: &str) -> String {
    escape_with(text, false)
}

fn escape_with(text: &str, colon: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '[' | ']') || (colon && c == ':') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Decode escapes from `text` into `out`.
///
/// With `until_close` set, decoding stops at the first unescaped `]` and the
/// byte length consumed (including the bracket) is returned; `None` means the
/// text ended first.
fn decode_value(text: &str, out: &mut String, until_close: bool) -> Option<usize> {
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        match c {
            ']' if until_close => return Some(i + 1),
            '\\' => match chars.next() {
                Some((_, '\n')) => {
                    chars.next_if(|&(_, c)| c == '\r');
                }
                Some((_, '\r')) => {
                    chars.next_if(|&(_, c)| c == '\n');
                }
                Some((_, escaped)) => out.push(escaped),
                None => break,
            },
            _ => out.push(c),
        }
    }
    if until_close { None } else { Some(text.len()) }
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn fail<T>(&self, fault: GrammarFault) -> Result<T> {
        Err(SgfError::grammar(self.pos, fault))
    }

    fn game_tree(&mut self) -> Result<Game> {
        match self.rest().find('(') {
            Some(start) => self.pos += start,
            None => return self.fail(GrammarFault::MissingGameTree),
        }

        let mut game = Game::empty();
        let mut root: Option<NodeId> = None;
        // Attach point for each open tree; `None` for the outermost one.
        let mut open: Vec<Option<NodeId>> = Vec::new();
        let mut current: Option<NodeId> = None;
        let mut after_variation = false;

        loop {
            self.skip_whitespace();
            match self.peek() {
                None => return self.fail(GrammarFault::UnbalancedParentheses),
                Some('(') => {
                    self.bump();
                    open.push(current);
                    after_variation = false;
                    self.skip_whitespace();
                    match self.peek() {
                        Some(';') => {}
                        Some('(' | ')') => return self.fail(GrammarFault::EmptyGameTree),
                        Some(c) => return self.fail(GrammarFault::UnexpectedCharacter(c)),
                        None => return self.fail(GrammarFault::UnbalancedParentheses),
                    }
                }
                Some(')') => {
                    self.bump();
                    current = open.pop().flatten();
                    if open.is_empty() {
                        break;
                    }
                    after_variation = true;
                }
                Some(';') => {
                    if after_variation {
                        return self.fail(GrammarFault::NodeAfterVariation);
                    }
                    self.bump();
                    let properties = self.properties()?;
                    let id = game.alloc(current, properties);
                    match current {
                        Some(parent) => game.attach(parent, id),
                        None => root = Some(id),
                    }
                    current = Some(id);
                }
                Some(c) => return self.fail(GrammarFault::UnexpectedCharacter(c)),
            }
        }

        match root {
            Some(root) => {
                game.install_root(root);
                Ok(game)
            }
            None => self.fail(GrammarFault::EmptyGameTree),
        }
    }

    fn properties(&mut self) -> Result<Properties> {
        let mut properties = Properties::new();
        loop {
            self.skip_whitespace();
            let start = self.pos;
            let ident_len = self
                .rest()
                .find(|c: char| !c.is_ascii_alphabetic())
                .unwrap_or(self.rest().len());
            if ident_len == 0 {
                return Ok(properties);
            }
            let ident = &self.src[start..start + ident_len];
            self.pos += ident_len;

            self.skip_whitespace();
            if self.peek() != Some('[') {
                return self.fail(GrammarFault::MissingPropertyValue);
            }
            while self.peek() == Some('[') {
                let value = self.value()?;
                trace!(ident, value = %value, "property");
                properties.add_checked(ident, value)?;
                self.skip_whitespace();
            }
        }
    }

    fn value(&mut self) -> Result<String> {
        let open = self.pos;
        self.bump();
        let mut out = String::new();
        match decode_value(self.rest(), &mut out, true) {
            Some(consumed) => {
                self.pos += consumed;
                Ok(out)
            }
            None => Err(SgfError::grammar(open, GrammarFault::UnterminatedValue)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fault(text: &str) -> GrammarFault {
        match parse(text) {
            Err(SgfError::Grammar { fault, .. }) => fault,
            other => panic!("expected grammar error for {text:?}, got {other:?}"),
        }
    }

    #[test]
    fn test_minimal_document() {
        let game = parse("(;GM[1]FF[4];B[pd];W[dp])").unwrap();
        assert_eq!(game.property("GM").as_deref(), Some("1"));
        assert_eq!(game.property("FF").as_deref(), Some("4"));
        let first = game.root_node().next().unwrap();
        assert_eq!(game.node(first).move_string(), Some("pd"));
        let second = game.node(first).next().unwrap();
        assert_eq!(game.node(second).move_string(), Some("dp"));
        assert_eq!(game.node(second).next(), None);
    }

    #[test]
    fn test_branches_attach_to_last_node() {
        let game = parse("(;GM[1];B[aa](;W[bb];B[cc])(;W[dd]))").unwrap();
        let b = game.root_node().next().unwrap();
        let node = game.node(b);
        let cont = node.next().unwrap();
        assert_eq!(game.node(cont).move_string(), Some("bb"));
        assert_eq!(game.node(cont).prev(), Some(b));
        assert_eq!(node.branches().len(), 1);
        let branch = node.branches()[0];
        assert_eq!(game.node(branch).move_string(), Some("dd"));
        assert_eq!(game.node(branch).parent(), Some(b));
        assert_eq!(game.node(branch).prev(), None);
    }

    #[test]
    fn test_escapes_and_soft_breaks() {
        let game = parse("(;C[a\\]b\\\\c\\:d];C[one\\\ntwo\nthree])").unwrap();
        assert_eq!(game.property("C").as_deref(), Some("a]b\\c:d"));
        let node = game.root_node().next().unwrap();
        assert_eq!(game.node(node).comment(), "onetwo\nthree");
    }

    #[test]
    fn test_repeated_values_are_merged() {
        let game = parse("(;AW[aa][bb]AW[cc];B[dd])").unwrap();
        assert_eq!(game.property("AW").as_deref(), Some("aa,bb,cc"));
    }

    #[test]
    fn test_point_lists_and_ranges_expand() {
        let game = parse("(;AB[aa,bb]AW[cc:cd])").unwrap();
        assert_eq!(
            game.properties().values("AB").unwrap(),
            ["aa", "bb"]
        );
        assert_eq!(
            game.properties().values("AW").unwrap(),
            ["cc", "cd"]
        );
    }

    #[test]
    fn test_unknown_properties_are_kept() {
        let game = parse("(;XYZ[something];B[aa]FOO[bar])").unwrap();
        assert_eq!(game.property("XYZ").as_deref(), Some("something"));
        let node = game.root_node().next().unwrap();
        assert_eq!(game.node(node).property("FOO").as_deref(), Some("bar"));
    }

    #[test]
    fn test_move_root_keeps_properties_on_node() {
        let game = parse("(;B[pd];W[dp])").unwrap();
        assert!(game.properties().is_empty());
        assert!(game.root_node().is_move());
    }

    #[test]
    fn test_leading_and_trailing_text_ignored() {
        let game = parse("junk before\n(;GM[1];B[aa])\n(;GM[1])").unwrap();
        assert_eq!(game.arena_len(), 2);
    }

    #[test]
    fn test_whitespace_between_tokens() {
        let game = parse("( ;GM [1]\n ;B [aa] \n ( ;W[bb] ) ( ;W[cc] ) )").unwrap();
        let b = game.root_node().next().unwrap();
        assert_eq!(game.node(b).branches().len(), 1);
    }

    #[test]
    fn test_empty_node_allowed() {
        let game = parse("(;GM[1];;B[aa])").unwrap();
        let empty = game.root_node().next().unwrap();
        assert!(game.node(empty).properties().is_empty());
    }

    #[test]
    fn test_unbalanced_parentheses() {
        assert_eq!(fault("(;GM[1];B[aa]"), GrammarFault::UnbalancedParentheses);
        assert_eq!(fault("(;GM[1](;B[aa])"), GrammarFault::UnbalancedParentheses);
    }

    #[test]
    fn test_unterminated_value() {
        assert_eq!(fault("(;GM[1];C[never closed)"), GrammarFault::UnterminatedValue);
        assert_eq!(fault("(;C[trailing\\"), GrammarFault::UnterminatedValue);
    }

    #[test]
    fn test_other_grammar_faults() {
        assert_eq!(fault("no tree here"), GrammarFault::MissingGameTree);
        assert_eq!(fault("()"), GrammarFault::EmptyGameTree);
        assert_eq!(fault("(;GM)"), GrammarFault::MissingPropertyValue);
        assert_eq!(fault("(;GM[1]#)"), GrammarFault::UnexpectedCharacter('#'));
        assert_eq!(fault("(;B[aa](;W[bb]);B[cc])"), GrammarFault::NodeAfterVariation);
    }

    #[test]
    fn test_short_move_coordinate_fails() {
        let err = parse("(;GM[1];B[a])").unwrap_err();
        assert!(matches!(err, SgfError::Coordinate { .. }));
    }

    #[test]
    fn test_pass_values_accepted() {
        let game = parse("(;GM[1];B[];W[tt])").unwrap();
        let b = game.root_node().next().unwrap();
        assert!(game.node(b).is_pass());
        let w = game.node(b).next().unwrap();
        assert!(game.node(w).is_pass());
    }

    #[test]
    fn test_escape_unescape() {
        let raw = "a\\:b\\]c\\[d\\\\e";
        assert_eq!(unescape(raw), "a:b]c[d\\e");
        assert_eq!(escape(&unescape(raw)), raw);
        assert_eq!(escape_compose("aa:x]"), "aa:x\\]");
    }

    #[test]
    fn test_unicode_values() {
        let game = parse("(;PB[李昌镐]C[日本語\\]];B[aa])").unwrap();
        assert_eq!(game.property("PB").as_deref(), Some("李昌镐"));
        assert_eq!(game.property("C").as_deref(), Some("日本語]"));
    }

    #[test]
    fn test_deep_nesting_does_not_overflow() {
        let depth = 20_000;
        let mut text = String::from("(;GM[1]");
        for i in 0..depth {
            text.push_str(if i % 2 == 0 { "(;B[aa]" } else { "(;W[bb]" });
        }
        for _ in 0..=depth {
            text.push(')');
        }
        let game = parse(&text).unwrap();
        assert_eq!(game.arena_len(), depth + 1);
    }
}
