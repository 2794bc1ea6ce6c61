//! Line classification: regex-driven structural tagging of markdown lines.
//!
//! ## Why a classifier instead of a parser?
//!
//! The normalizer only needs to know *which block construct* a line starts,
//! not the document's full block structure. A handful of anchored regexes is
//! enough for Yuque's export shape and keeps the whole pass O(lines). The
//! classifier is the single seam behind which a real block parser could later
//! sit: everything downstream consumes only [`LineKind`] tags.
//!
//! Classification is stateful. Code fences and YAML front matter suspend the
//! normal rules; inside either region every line is [`LineKind::Opaque`] and
//! passed through byte-for-byte. Delimiters are recognized without look-ahead,
//! so an unbalanced fence leaves the remainder of the document opaque. That
//! is surfaced via [`Classifier::finish`] rather than silently corrected.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;

/// Structural tag assigned to a single line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// A code-fence delimiter (opening or closing).
    Fence,
    /// A front-matter delimiter (opening or closing).
    FrontMatter,
    /// Any line inside a fence or front-matter region; passed through as-is.
    Opaque,
    /// A line that is empty or whitespace-only.
    Blank,
    /// An ATX heading (`# ...`) or a setext underline (`---` / `===`).
    Heading,
    /// A bullet or ordered list item.
    List,
    /// A horizontal rule with trailing content after the dashes.
    Rule,
    /// A blockquote line (`> ...`); never blank-line-normalized.
    Quote,
    /// Ordinary paragraph text.
    Paragraph,
}

/// The region the classifier is currently inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    Normal,
    Fenced,
    FrontMatter,
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Region::Normal => write!(f, "normal"),
            Region::Fenced => write!(f, "code fence"),
            Region::FrontMatter => write!(f, "front matter"),
        }
    }
}

// ── Line patterns ────────────────────────────────────────────────────────

/// Leading whitespace then three or more backticks.
static RE_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*`{3,}").unwrap());

/// Three or more hyphens at column 0 and nothing else: a front-matter
/// delimiter when positioned at the document boundary.
static RE_FRONT_MATTER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-{3,}\s*$").unwrap());

static RE_BLANK: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*$").unwrap());

/// ATX heading: 1–6 hashes followed by whitespace.
static RE_HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#{1,6}\s").unwrap());

/// Setext underline: a line consisting solely of dashes or equals signs.
static RE_UNDERLINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*[-=]+\s*$").unwrap());

/// Bullet (`-`/`*`) or ordered (`1.`) list item.
static RE_LIST: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(?:[-*]|\d+\.)\s").unwrap());

/// Three or more hyphens, possibly with trailing content.
static RE_RULE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*-{3,}").unwrap());

/// Stateful line classifier.
///
/// Feed lines in document order via [`classify`](Self::classify); call
/// [`finish`](Self::finish) at end-of-document to learn whether a fence or
/// front-matter region was left open.
#[derive(Debug)]
pub struct Classifier {
    region: Region,
    line_no: usize,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier {
    pub fn new() -> Self {
        Self {
            region: Region::Normal,
            line_no: 0,
        }
    }

    /// The region the *next* line will be classified in.
    pub fn region(&self) -> Region {
        self.region
    }

    /// Classify one line and advance the region automaton.
    pub fn classify(&mut self, line: &str) -> LineKind {
        let at_start = self.line_no == 0;
        self.line_no += 1;

        match self.region {
            Region::Fenced => {
                if RE_FENCE.is_match(line) {
                    self.region = Region::Normal;
                    LineKind::Fence
                } else {
                    LineKind::Opaque
                }
            }
            Region::FrontMatter => {
                if RE_FRONT_MATTER.is_match(line) {
                    self.region = Region::Normal;
                    LineKind::FrontMatter
                } else {
                    LineKind::Opaque
                }
            }
            Region::Normal => {
                if RE_FENCE.is_match(line) {
                    self.region = Region::Fenced;
                    return LineKind::Fence;
                }
                // Front matter only opens at the very top of the document;
                // a mid-document `---` is a setext underline or rule.
                if at_start && RE_FRONT_MATTER.is_match(line) {
                    self.region = Region::FrontMatter;
                    return LineKind::FrontMatter;
                }
                if RE_BLANK.is_match(line) {
                    LineKind::Blank
                } else if RE_HEADING.is_match(line) || RE_UNDERLINE.is_match(line) {
                    LineKind::Heading
                } else if RE_LIST.is_match(line) {
                    LineKind::List
                } else if RE_RULE.is_match(line) {
                    LineKind::Rule
                } else if line.starts_with('>') {
                    LineKind::Quote
                } else {
                    LineKind::Paragraph
                }
            }
        }
    }

    /// Consume the classifier; `Some(region)` if the document ended inside an
    /// unterminated fence or front-matter block.
    pub fn finish(self) -> Option<Region> {
        match self.region {
            Region::Normal => None,
            open => Some(open),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify_all(lines: &[&str]) -> (Vec<LineKind>, Option<Region>) {
        let mut c = Classifier::new();
        let kinds = lines.iter().map(|l| c.classify(l)).collect();
        (kinds, c.finish())
    }

    #[test]
    fn basic_kinds() {
        let (kinds, open) = classify_all(&[
            "# Title",
            "",
            "some text",
            "- item",
            "1. item",
            "> quoted",
            "--- trailing",
        ]);
        assert_eq!(
            kinds,
            vec![
                LineKind::Heading,
                LineKind::Blank,
                LineKind::Paragraph,
                LineKind::List,
                LineKind::List,
                LineKind::Quote,
                LineKind::Rule,
            ]
        );
        assert_eq!(open, None);
    }

    #[test]
    fn fence_suspends_classification() {
        let (kinds, open) = classify_all(&["```python", "# not a heading", "", "```"]);
        assert_eq!(
            kinds,
            vec![
                LineKind::Fence,
                LineKind::Opaque,
                LineKind::Opaque,
                LineKind::Fence,
            ]
        );
        assert_eq!(open, None);
    }

    #[test]
    fn front_matter_only_at_document_start() {
        let (kinds, _) = classify_all(&["---", "title: x", "---", "body", "---"]);
        assert_eq!(kinds[0], LineKind::FrontMatter);
        assert_eq!(kinds[1], LineKind::Opaque);
        assert_eq!(kinds[2], LineKind::FrontMatter);
        assert_eq!(kinds[3], LineKind::Paragraph);
        // A later bare `---` is a setext underline, not front matter.
        assert_eq!(kinds[4], LineKind::Heading);
    }

    #[test]
    fn unterminated_fence_reported() {
        let (kinds, open) = classify_all(&["```", "code", "# still opaque"]);
        assert_eq!(kinds[1], LineKind::Opaque);
        assert_eq!(kinds[2], LineKind::Opaque);
        assert_eq!(open, Some(Region::Fenced));
    }

    #[test]
    fn indented_fence_recognized() {
        let (kinds, _) = classify_all(&["  ````", "x", "  ````"]);
        assert_eq!(kinds[0], LineKind::Fence);
        assert_eq!(kinds[2], LineKind::Fence);
    }

    #[test]
    fn setext_underline_is_heading() {
        let (kinds, _) = classify_all(&["Title", "====="]);
        assert_eq!(kinds[1], LineKind::Heading);
    }

    #[test]
    fn dash_bullet_is_list_not_rule() {
        let (kinds, _) = classify_all(&["- item one"]);
        assert_eq!(kinds[0], LineKind::List);
    }
}
