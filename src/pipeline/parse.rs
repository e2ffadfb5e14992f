//! Response parsing: pull the marker-delimited site blocks out of model text.
//!
//! The model is asked to frame each artefact between two identical marker
//! lines, e.g. `--css--`. A block is the text between the *first two*
//! occurrences of its marker, trimmed. Blocks may appear in any order.
//!
//! A missing block is an ordinary outcome, not an error: [`extract_block`]
//! returns [`Block::Absent`] and the orchestrator decides what to do.
//!
//! Known limitation: if a generated block itself contains its own marker
//! (say an HTML comment quoting `--html--`), everything after the second
//! occurrence is ignored and the block is cut short there.

use crate::output::SiteBundle;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Label of a marker-delimited block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockLabel {
    Html,
    Css,
    /// Script label used by the two-phase templates.
    Js,
    /// Script label used by the one-phase template.
    Javascript,
}

impl BlockLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockLabel::Html => "html",
            BlockLabel::Css => "css",
            BlockLabel::Js => "js",
            BlockLabel::Javascript => "javascript",
        }
    }

    /// The literal framing token, e.g. `--html--`.
    pub fn marker(&self) -> String {
        format!("--{}--", self.as_str())
    }
}

impl fmt::Display for BlockLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of looking for one block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Found(String),
    Absent,
}

impl Block {
    pub fn as_deref(&self) -> Option<&str> {
        match self {
            Block::Found(s) => Some(s),
            Block::Absent => None,
        }
    }

    /// Apply `f` to found content; a result that is empty becomes `Absent`.
    pub fn map_found(self, f: impl FnOnce(&str) -> String) -> Block {
        match self {
            Block::Found(s) => {
                let mapped = f(&s);
                if mapped.trim().is_empty() {
                    Block::Absent
                } else {
                    Block::Found(mapped)
                }
            }
            Block::Absent => Block::Absent,
        }
    }
}

/// Extract the block framed by `label`'s marker.
///
/// Splits on the exact marker; fewer than three segments means the marker
/// does not appear twice and the block is absent. Never panics on
/// malformed input.
pub fn extract_block(text: &str, label: BlockLabel) -> Block {
    let marker = label.marker();
    let mut segments = text.split(marker.as_str());
    let _preamble = segments.next();
    match (segments.next(), segments.next()) {
        (Some(inner), Some(_)) => Block::Found(inner.trim().to_string()),
        _ => Block::Absent,
    }
}

/// The three blocks of one site response, each possibly absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSite {
    pub html: Block,
    pub css: Block,
    pub script: Block,
    pub script_label: BlockLabel,
}

/// Look for all three site blocks, independently of each other.
pub fn parse_site(text: &str, script_label: BlockLabel) -> ParsedSite {
    ParsedSite {
        html: extract_block(text, BlockLabel::Html),
        css: extract_block(text, BlockLabel::Css),
        script: extract_block(text, script_label),
        script_label,
    }
}

impl ParsedSite {
    /// Labels whose block is absent or empty, in html/css/script order.
    pub fn missing(&self) -> Vec<BlockLabel> {
        let mut missing = Vec::new();
        for (label, block) in [
            (BlockLabel::Html, &self.html),
            (BlockLabel::Css, &self.css),
            (self.script_label, &self.script),
        ] {
            if block.as_deref().is_none_or(|s| s.is_empty()) {
                missing.push(label);
            }
        }
        missing
    }

    /// Apply a cleanup to every found block.
    pub fn map_found(self, f: impl Fn(&str) -> String) -> ParsedSite {
        ParsedSite {
            html: self.html.map_found(&f),
            css: self.css.map_found(&f),
            script: self.script.map_found(&f),
            script_label: self.script_label,
        }
    }

    /// Turn into a bundle only if all three blocks are present and non-empty.
    ///
    /// On failure returns the missing labels; nothing partial escapes.
    pub fn into_bundle(self) -> Result<SiteBundle, Vec<BlockLabel>> {
        let missing = self.missing();
        match (self.html, self.css, self.script) {
            (Block::Found(html), Block::Found(css), Block::Found(js)) if missing.is_empty() => {
                SiteBundle::new(html, css, js).ok_or(missing)
            }
            _ => Err(missing),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORDERED: &str = "--html--\nA\n--html--\n--css--\nB\n--css--\n--js--\nC\n--js--";

    #[test]
    fn extracts_between_first_two_markers() {
        assert_eq!(
            extract_block(ORDERED, BlockLabel::Html),
            Block::Found("A".into())
        );
        assert_eq!(
            extract_block(ORDERED, BlockLabel::Css),
            Block::Found("B".into())
        );
        assert_eq!(
            extract_block(ORDERED, BlockLabel::Js),
            Block::Found("C".into())
        );
    }

    #[test]
    fn block_order_does_not_matter() {
        let shuffled = "Here you go!\n--js--\nC\n--js--\n\n  --html--  A  --html--\n--css--\r\nB\r\n--css--\n";
        let bundle = parse_site(shuffled, BlockLabel::Js)
            .into_bundle()
            .expect("all blocks present");
        assert_eq!(bundle.html(), "A");
        assert_eq!(bundle.css(), "B");
        assert_eq!(bundle.js(), "C");
    }

    #[test]
    fn single_marker_is_absent() {
        assert_eq!(
            extract_block("--html--\n<p>unterminated", BlockLabel::Html),
            Block::Absent
        );
        assert_eq!(extract_block("", BlockLabel::Css), Block::Absent);
    }

    #[test]
    fn missing_css_blocks_the_bundle() {
        let text = "--html--\nA\n--html--\n--js--\nC\n--js--";
        let parsed = parse_site(text, BlockLabel::Js);
        assert_eq!(parsed.css, Block::Absent);
        assert_eq!(parsed.into_bundle().unwrap_err(), vec![BlockLabel::Css]);
    }

    #[test]
    fn script_label_must_match_exactly() {
        // `--js--` blocks are not found when the run expects `--javascript--`.
        let parsed = parse_site(ORDERED, BlockLabel::Javascript);
        assert_eq!(parsed.missing(), vec![BlockLabel::Javascript]);
    }

    #[test]
    fn empty_found_block_counts_as_missing() {
        let text = "--html--\nA\n--html--\n--css--\n   \n--css--\n--js--\nC\n--js--";
        let parsed = parse_site(text, BlockLabel::Js);
        assert_eq!(parsed.css, Block::Found(String::new()));
        assert_eq!(parsed.into_bundle().unwrap_err(), vec![BlockLabel::Css]);
    }

    #[test]
    fn marker_inside_block_cuts_at_second_occurrence() {
        let text = "--html--\n<!-- --html-- -->\n<p>x</p>\n--html--";
        assert_eq!(
            extract_block(text, BlockLabel::Html),
            Block::Found("<!--".into())
        );
    }

    #[test]
    fn map_found_turns_blank_into_absent() {
        let block = Block::Found("```\n```".into()).map_found(|_| "  ".into());
        assert_eq!(block, Block::Absent);
        assert_eq!(
            Block::Absent.map_found(|s| s.to_uppercase()),
            Block::Absent
        );
    }

    #[test]
    fn marker_spelling() {
        assert_eq!(BlockLabel::Javascript.marker(), "--javascript--");
        assert_eq!(BlockLabel::Js.to_string(), "js");
    }
}
