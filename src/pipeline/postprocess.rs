//! Post-processing: deterministic cleanup of extracted site blocks.
//!
//! Models asked for bare code between markers still sometimes wrap a block
//! in a Markdown fence, emit `\r\n` line endings, or leak a BOM or zero-width
//! spaces. These rules fix such quirks without touching the code itself.
//! Joiners, non-joiners and soft hyphens are content (emoji sequences,
//! Persian and Indic text) and pass through.
//!
//! ## Rule Order
//!
//! Line endings are normalised and stray BOM/zero-width spaces removed before the
//! fence pattern runs, so the pattern only sees `\n` and a leading BOM
//! cannot hide a fence.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all cleanup rules to one found block.
///
/// Rules (applied in order):
/// 1. Normalise line endings (CRLF / CR → LF)
/// 2. Strip a leading BOM and zero-width spaces (U+200B)
/// 3. Strip an outer Markdown fence, with or without a language tag
/// 4. Trim trailing whitespace per line
///
/// The result is trimmed; it may be empty, in which case the caller treats
/// the block as absent.
pub fn clean_block(input: &str) -> String {
    let s = normalise_line_endings(input);
    let s = strip_bom_and_zero_width_spaces(&s);
    let s = strip_code_fences(&s);
    let s = trim_trailing_whitespace(&s);
    s.trim().to_string()
}

// ── Rule 1: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 2: Remove a leading BOM and zero-width spaces ──────────────────────

fn strip_bom_and_zero_width_spaces(input: &str) -> String {
    let start = input.len() - input.trim_start().len();
    let (lead, rest) = input.split_at(start);
    let rest = rest.strip_prefix('\u{FEFF}').unwrap_or(rest);
    format!("{lead}{rest}").replace('\u{200B}', "")
}

// ── Rule 3: Strip outer code fences ──────────────────────────────────────────

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```[A-Za-z0-9_+-]*[ \t]*\n(.*?)\n?```\s*$").unwrap());

fn strip_code_fences(input: &str) -> String {
    if let Some(caps) = RE_OUTER_FENCES.captures(input.trim()) {
        caps[1].to_string()
    } else {
        input.to_string()
    }
}

// ── Rule 4: Trim trailing whitespace per line ────────────────────────────────

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_fence_with_language() {
        let input = "```html\n<!DOCTYPE html>\n<p>Hi</p>\n```";
        assert_eq!(clean_block(input), "<!DOCTYPE html>\n<p>Hi</p>");
    }

    #[test]
    fn strips_bare_fence() {
        assert_eq!(clean_block("```\nbody { margin: 0; }\n```\n"), "body { margin: 0; }");
    }

    #[test]
    fn leaves_inner_fences_alone() {
        let input = "const s = `template`;\nconsole.log(s);";
        assert_eq!(clean_block(input), input);
    }

    #[test]
    fn crlf_fence_is_still_recognised() {
        assert_eq!(clean_block("```css\r\na{}\r\n```"), "a{}");
    }

    #[test]
    fn trailing_whitespace_and_invisible_chars() {
        let input = "\u{FEFF}h1 {   \n  color: red;\u{200B}  \n}";
        assert_eq!(clean_block(input), "h1 {\n  color: red;\n}");
    }

    #[test]
    fn joiners_and_soft_hyphens_survive() {
        let html = "<span>\u{1F469}\u{200D}\u{1F4BB} Developer</span>";
        assert_eq!(clean_block(html), html);

        let persian = "<p>\u{0645}\u{06CC}\u{200C}\u{062E}\u{0648}\u{0627}\u{0647}\u{0645} co\u{00AD}operate</p>";
        assert_eq!(clean_block(persian), persian);
    }

    #[test]
    fn bom_after_leading_newline_is_removed() {
        assert_eq!(clean_block("\n\u{FEFF}```css\na{}\n```"), "a{}");
    }

    #[test]
    fn empty_fence_cleans_to_empty() {
        assert_eq!(clean_block("```js\n```"), "");
    }

    #[test]
    fn clean_is_idempotent() {
        let once = clean_block("```html\n<p>x</p>  \r\n```");
        assert_eq!(clean_block(&once), once);
    }
}
