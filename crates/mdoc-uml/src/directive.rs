//! `uml` directive parsing.
//!
//! Splits a reStructuredText-style source into pass-through text and
//! [`UmlNode`]s:
//!
//! ```text
//! .. uml::
//!    :alt: Alice and Bob
//!
//!    Alice -> Bob: Hello
//! ```
//!
//! The diagram body is carried verbatim (after dedenting); nothing here
//! understands UML. Tabs in a directive body expand to 8-column stops, as in
//! reStructuredText, before indentation is measured.

use std::sync::LazyLock;

use regex::Regex;

static DIRECTIVE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([ \t]*)\.\.[ \t]+uml::[ \t]*(.*)$").unwrap());

static OPTION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^:([A-Za-z][A-Za-z0-9_-]*):(?:[ \t]+(.*))?$").unwrap());

/// Tab stop width used when measuring indentation.
const TAB_WIDTH: usize = 8;

/// Options understood by the directive.
const KNOWN_OPTIONS: &[&str] = &["alt"];

/// A diagram extracted from a `uml` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UmlNode {
    /// Diagram source text, dedented, lines joined with `\n`.
    pub source: String,
    /// Value of the `:alt:` option.
    pub alt: Option<String>,
    /// 1-based line of the directive marker.
    pub line: usize,
}

impl UmlNode {
    /// Alt text for emitters; falls back to the diagram source.
    #[must_use]
    pub fn alt_text(&self) -> &str {
        self.alt.as_deref().unwrap_or(&self.source)
    }
}

/// Piece of a parsed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// Source text passed through unchanged (line endings included).
    Text(String),
    /// A `uml` directive.
    Uml(UmlNode),
}

/// Result of parsing a document.
#[derive(Debug, Default)]
pub struct ParsedDocument {
    /// Blocks in source order.
    pub blocks: Vec<Block>,
    /// Warnings about ignored directive options.
    pub warnings: Vec<String>,
}

impl ParsedDocument {
    /// Iterate over the diagrams in source order.
    pub fn nodes(&self) -> impl Iterator<Item = &UmlNode> {
        self.blocks.iter().filter_map(|block| match block {
            Block::Uml(node) => Some(node),
            Block::Text(_) => None,
        })
    }
}

/// Parse `source` into text blocks and `uml` nodes.
#[must_use]
pub fn parse_document(source: &str) -> ParsedDocument {
    let lines: Vec<&str> = source.split_inclusive('\n').collect();
    let mut doc = ParsedDocument::default();
    let mut text = String::new();
    let mut i = 0;

    while i < lines.len() {
        let Some(caps) = DIRECTIVE_PATTERN.captures(strip_eol(lines[i])) else {
            text.push_str(lines[i]);
            i += 1;
            continue;
        };

        let marker_indent = indent_of(&caps[1]);
        let inline = caps[2].trim().to_owned();
        let line_number = i + 1;

        // Body: blank lines or lines indented past the marker.
        let mut end = i + 1;
        let mut last_content = i;
        while end < lines.len() {
            let line = strip_eol(lines[end]);
            if line.trim().is_empty() {
                end += 1;
                continue;
            }
            if indent_of(line) <= marker_indent {
                break;
            }
            last_content = end;
            end += 1;
        }

        if !text.is_empty() {
            doc.blocks.push(Block::Text(std::mem::take(&mut text)));
        }

        let body: Vec<String> = lines[i + 1..=last_content]
            .iter()
            .map(|l| expand_tabs(strip_eol(l)))
            .collect();
        let node = build_node(&body, inline, line_number, &mut doc.warnings);
        doc.blocks.push(Block::Uml(node));

        // Trailing blank lines stay in the text stream.
        i = last_content + 1;
    }

    if !text.is_empty() {
        doc.blocks.push(Block::Text(text));
    }

    doc
}

/// Build a node from the directive body lines.
fn build_node(body: &[String], inline: String, line: usize, warnings: &mut Vec<String>) -> UmlNode {
    let mut alt = None;
    let mut rest = body;

    // Options form a run of `:name: value` lines directly under the marker.
    while let Some((first, tail)) = rest.split_first() {
        let Some(caps) = OPTION_PATTERN.captures(first.trim()) else {
            break;
        };
        let name = &caps[1];
        let value = caps.get(2).map_or("", |m| m.as_str().trim());
        if KNOWN_OPTIONS.contains(&name) {
            alt = Some(value.to_owned());
        } else {
            tracing::warn!(line, option = name, "Ignoring unknown uml option");
            warnings.push(format!(
                "line {line}: unknown uml option ':{name}:' ignored (valid: {})",
                KNOWN_OPTIONS.join(", ")
            ));
        }
        rest = tail;
    }

    let mut content = dedent(rest);
    if !inline.is_empty() {
        content.insert(0, inline);
    }

    UmlNode {
        source: trim_blank_lines(&content).join("\n"),
        alt,
        line,
    }
}

/// Remove the common leading indentation of non-blank lines.
///
/// Lines must already have their tabs expanded.
fn dedent(lines: &[String]) -> Vec<String> {
    let common = lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| indent_of(l))
        .min()
        .unwrap_or(0);

    lines
        .iter()
        .map(|l| {
            if l.trim().is_empty() {
                String::new()
            } else {
                l[common..].trim_end().to_owned()
            }
        })
        .collect()
}

/// Slice without leading and trailing blank lines.
fn trim_blank_lines(lines: &[String]) -> &[String] {
    let start = lines
        .iter()
        .position(|l| !l.is_empty())
        .unwrap_or(lines.len());
    let end = lines
        .iter()
        .rposition(|l| !l.is_empty())
        .map_or(start, |p| p + 1);
    &lines[start..end]
}

/// Column width of leading spaces and tabs (tab stops every 8 columns).
fn indent_of(line: &str) -> usize {
    let mut col = 0;
    for c in line.chars() {
        match c {
            ' ' => col += 1,
            '\t' => col = next_tab_stop(col),
            _ => break,
        }
    }
    col
}

/// Replace tabs with spaces up to the next 8-column stop.
fn expand_tabs(line: &str) -> String {
    if !line.contains('\t') {
        return line.to_owned();
    }
    let mut out = String::with_capacity(line.len() + 8);
    let mut col = 0;
    for c in line.chars() {
        if c == '\t' {
            let stop = next_tab_stop(col);
            out.extend(std::iter::repeat_n(' ', stop - col));
            col = stop;
        } else {
            out.push(c);
            col += 1;
        }
    }
    out
}

fn next_tab_stop(col: usize) -> usize {
    (col / TAB_WIDTH + 1) * TAB_WIDTH
}

fn strip_eol(line: &str) -> &str {
    line.trim_end_matches(['\n', '\r'])
}
