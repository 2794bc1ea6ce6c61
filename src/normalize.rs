//! Blank-line normalization: make Yuque's export parseable by strict
//! Markdown grammars.
//!
//! ## Why is this necessary?
//!
//! Yuque's markdown export packs block constructs tightly: headings glued to
//! the preceding paragraph, code fences with no surrounding blanks, paragraph
//! lines run together. CommonMark-strict converters (pandoc first among them)
//! then merge adjacent blocks or mis-nest them. This pass inserts the blank
//! lines a strict grammar requires and collapses excessive blank runs.
//!
//! ## Construction is append-only
//!
//! The output sequence is built fresh, left to right; earlier decisions are
//! never revisited and no line is inserted into the middle of the result.
//! That sidesteps the index-drift bugs of mutate-in-place insertion entirely:
//! the classifier reads the *input* sequence, the normalizer writes the
//! *output* sequence, and the two never share indices.

use crate::classify::{Classifier, LineKind, Region};
use once_cell::sync::Lazy;
use regex::Regex;

/// Two or more consecutive blank lines in joined text.
static RE_BLANK_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

/// Result of a normalization pass.
#[derive(Debug)]
pub struct Normalized {
    /// The normalized line sequence (no trailing newline characters).
    pub lines: Vec<String>,
    /// `Some` if the document ended inside an unclosed fence or front-matter
    /// block. The remainder was passed through opaque, not corrected.
    pub unterminated: Option<Region>,
}

/// Normalize blank-line structure over a full document.
///
/// Rules of the pass:
/// * `Heading` and `Rule` lines get exactly one blank line before and after.
/// * An opening fence gets a blank before it; a closing fence (and a closing
///   front-matter delimiter) gets a blank after it. Fence interiors are
///   byte-for-byte preserved.
/// * Every `Paragraph` line gets a blank line before it, separating Yuque's
///   one-line-per-paragraph export into real paragraphs.
/// * `List`, `Quote`, `Blank` and `Opaque` lines pass through unchanged.
/// * Finally, any run of 2+ consecutive blank lines collapses to one.
pub fn normalize(lines: &[String]) -> Normalized {
    let mut classifier = Classifier::new();
    let mut out: Vec<String> = Vec::with_capacity(lines.len() + lines.len() / 4);
    // Set when the previous line must be followed by a blank.
    let mut want_blank_after = false;

    for line in lines {
        let kind = classifier.classify(line);
        let opening = matches!(kind, LineKind::Fence | LineKind::FrontMatter)
            && classifier.region() != Region::Normal;

        if want_blank_after && kind != LineKind::Blank {
            out.push(String::new());
        }
        want_blank_after = false;

        match kind {
            LineKind::Opaque | LineKind::Blank | LineKind::List | LineKind::Quote => {
                out.push(line.clone());
            }
            LineKind::Fence => {
                if opening {
                    push_blank_separated(&mut out, line);
                } else {
                    out.push(line.clone());
                    want_blank_after = true;
                }
            }
            LineKind::FrontMatter => {
                // Opening delimiter is line 0; nothing can precede it.
                out.push(line.clone());
                if !opening {
                    want_blank_after = true;
                }
            }
            LineKind::Heading | LineKind::Rule => {
                push_blank_separated(&mut out, line);
                want_blank_after = true;
            }
            LineKind::Paragraph => {
                push_blank_separated(&mut out, line);
            }
        }
    }

    Normalized {
        lines: collapse_blank_runs(&out),
        unterminated: classifier.finish(),
    }
}

/// Push `line`, preceded by a blank unless the output is empty or already
/// ends in one.
fn push_blank_separated(out: &mut Vec<String>, line: &str) {
    if let Some(last) = out.last() {
        if !last.trim().is_empty() {
            out.push(String::new());
        }
    }
    out.push(line.to_string());
}

/// Collapse every run of 2+ consecutive blank lines to a single blank line
/// and drop trailing blanks.
fn collapse_blank_runs(lines: &[String]) -> Vec<String> {
    let joined = lines.join("\n");
    let collapsed = RE_BLANK_RUN.replace_all(&joined, "\n\n");
    let trimmed = collapsed.trim_end_matches('\n');
    if trimmed.is_empty() {
        Vec::new()
    } else {
        trimmed.split('\n').map(String::from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(input: &[&str]) -> Vec<String> {
        let lines: Vec<String> = input.iter().map(|s| s.to_string()).collect();
        normalize(&lines).lines
    }

    fn max_blank_run(lines: &[String]) -> usize {
        let mut max = 0;
        let mut cur = 0;
        for l in lines {
            if l.trim().is_empty() {
                cur += 1;
                max = max.max(cur);
            } else {
                cur = 0;
            }
        }
        max
    }

    #[test]
    fn heading_gets_blanks_around() {
        let out = run(&["intro text", "# Title", "body"]);
        assert_eq!(out, vec!["intro text", "", "# Title", "", "body"]);
    }

    #[test]
    fn heading_at_document_start_needs_no_leading_blank() {
        let out = run(&["# Title", "body"]);
        assert_eq!(out[0], "# Title");
        assert_eq!(out[1], "");
    }

    #[test]
    fn fence_interior_preserved_byte_for_byte() {
        let out = run(&["text", "```", "  indented", "", "#not-a-heading", "```", "after"]);
        let open = out.iter().position(|l| l == "```").unwrap();
        assert_eq!(out[open + 1], "  indented");
        assert_eq!(out[open + 2], "");
        assert_eq!(out[open + 3], "#not-a-heading");
        // Blank before opening fence and after closing fence.
        assert_eq!(out[open - 1], "");
        let close = open + 4;
        assert_eq!(out[close], "```");
        assert_eq!(out[close + 1], "");
        assert_eq!(out[close + 2], "after");
    }

    #[test]
    fn paragraphs_get_separated() {
        let out = run(&["line one", "line two"]);
        assert_eq!(out, vec!["line one", "", "line two"]);
    }

    #[test]
    fn lists_and_quotes_pass_through() {
        let out = run(&["- a", "- b", "> q1", "> q2"]);
        assert_eq!(out, vec!["- a", "- b", "> q1", "> q2"]);
    }

    #[test]
    fn blank_runs_collapse_to_one() {
        let out = run(&["a", "", "", "", "", "b"]);
        assert_eq!(out, vec!["a", "", "b"]);
    }

    #[test]
    fn output_never_has_two_consecutive_blanks() {
        let out = run(&[
            "# H", "", "", "p1", "p2", "", "", "", "---", "", "```", "x", "```", "tail",
        ]);
        assert!(max_blank_run(&out) <= 1, "got {:?}", out);
    }

    #[test]
    fn front_matter_preserved_and_separated() {
        let out = run(&["---", "title: 测试", "---", "body"]);
        assert_eq!(out[0], "---");
        assert_eq!(out[1], "title: 测试");
        assert_eq!(out[2], "---");
        assert_eq!(out[3], "");
        assert_eq!(out[4], "body");
    }

    #[test]
    fn unterminated_fence_surfaces() {
        let lines: Vec<String> = ["```", "left open"].iter().map(|s| s.to_string()).collect();
        let n = normalize(&lines);
        assert_eq!(n.unterminated, Some(crate::classify::Region::Fenced));
    }

    #[test]
    fn empty_document_is_a_no_op() {
        assert!(run(&[]).is_empty());
    }

    #[test]
    fn normalization_is_idempotent() {
        let first = run(&["intro", "# Title", "a", "b", "", "", "- l1", "- l2"]);
        let second = normalize(&first).lines;
        assert_eq!(first, second);
    }
}
