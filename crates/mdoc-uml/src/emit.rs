//! Output-format emitters.
//!
//! Each [`OutputFormat`] maps `(refname, alt)` to the markup that embeds a
//! rendered diagram. Emitters are pure; rendering happens upstream.

use crate::key::IMAGE_DIR;

/// Target document format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Html,
    Latex,
}

impl OutputFormat {
    /// Parse a builder name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "html" => Some(Self::Html),
            "latex" => Some(Self::Latex),
            _ => None,
        }
    }

    /// Builder name, also used as the output subdirectory.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Latex => "latex",
        }
    }

    /// File extension of emitted documents.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Latex => "tex",
        }
    }

    /// Image subdirectory for formats with relocatable image paths.
    ///
    /// LaTeX includes images relative to the `.tex` file, so they sit next to it.
    #[must_use]
    pub fn image_dir(self) -> Option<&'static str> {
        match self {
            Self::Html => Some(IMAGE_DIR),
            Self::Latex => None,
        }
    }

    /// Markup referencing the image at `refname`.
    #[must_use]
    pub fn emit(self, refname: &str, alt: &str) -> String {
        match self {
            Self::Html => emit_html(refname, alt),
            Self::Latex => emit_latex(refname),
        }
    }
}

fn emit_html(refname: &str, alt: &str) -> String {
    format!(
        "<p class=\"plantuml\">\n<img src=\"{}\" alt=\"{}\" />\n</p>\n",
        escape_html(refname),
        escape_html(alt)
    )
}

fn emit_latex(refname: &str) -> String {
    format!("\n\\includegraphics{{{refname}}}\n")
}

/// Escape text for an HTML attribute value.
fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_html_emitter() {
        let html = OutputFormat::Html.emit("_images/plantuml-abc.png", "Alice and Bob");
        assert_eq!(
            html,
            "<p class=\"plantuml\">\n<img src=\"_images/plantuml-abc.png\" alt=\"Alice and Bob\" />\n</p>\n"
        );
    }

    #[test]
    fn test_html_emitter_escapes_alt() {
        let html = OutputFormat::Html.emit("x.png", "A -> B: \"hi\" & <bye>");
        assert!(html.contains(r#"alt="A -&gt; B: &quot;hi&quot; &amp; &lt;bye&gt;""#));
    }

    #[test]
    fn test_latex_emitter() {
        let tex = OutputFormat::Latex.emit("plantuml-abc.png", "ignored");
        assert_eq!(tex, "\n\\includegraphics{plantuml-abc.png}\n");
    }

    #[test]
    fn test_parse_and_names() {
        assert_eq!(OutputFormat::parse("html"), Some(OutputFormat::Html));
        assert_eq!(OutputFormat::parse("latex"), Some(OutputFormat::Latex));
        assert_eq!(OutputFormat::parse("epub"), None);
        assert_eq!(OutputFormat::Latex.extension(), "tex");
        assert_eq!(OutputFormat::Html.image_dir(), Some("_images"));
        assert_eq!(OutputFormat::Latex.image_dir(), None);
    }
}
