//! Markdown-like AI text to HTML
//!
//! Handles the subset the models actually produce in plans: `#`-`###`
//! headings, `**bold**`, `*`/`-` bullets, `1.` numbered items and
//! paragraphs. Input is HTML-escaped first, so model output cannot inject
//! markup.

use once_cell::sync::Lazy;
use regex::Regex;

static BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.+?)\*\*").expect("static regex"));
static NUMBERED: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+[.)]\s+(.*)$").expect("static regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Block {
    None,
    Paragraph,
    Bullets,
    Numbered,
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn inline(text: &str) -> String {
    BOLD.replace_all(text, "<strong>$1</strong>").into_owned()
}

fn close(block: Block, out: &mut String) {
    match block {
        Block::Paragraph => out.push_str("</p>\n"),
        Block::Bullets => out.push_str("</ul>\n"),
        Block::Numbered => out.push_str("</ol>\n"),
        Block::None => {}
    }
}

pub fn to_html(markdown: &str) -> String {
    let escaped = escape_html(markdown);
    let mut out = String::new();
    let mut block = Block::None;

    for raw in escaped.lines() {
        let line = raw.trim();

        if line.is_empty() {
            close(block, &mut out);
            block = Block::None;
            continue;
        }

        let heading = [("### ", "h3"), ("## ", "h2"), ("# ", "h1")]
            .iter()
            .find(|(prefix, _)| line.starts_with(prefix));
        if let Some((prefix, tag)) = heading {
            close(block, &mut out);
            block = Block::None;
            out.push_str(&format!("<{tag}>{}</{tag}>\n", inline(line[prefix.len()..].trim())));
            continue;
        }

        if let Some(item) = line.strip_prefix("* ").or_else(|| line.strip_prefix("- ")) {
            if block != Block::Bullets {
                close(block, &mut out);
                out.push_str("<ul>\n");
                block = Block::Bullets;
            }
            out.push_str(&format!("<li>{}</li>\n", inline(item.trim())));
            continue;
        }

        if let Some(caps) = NUMBERED.captures(line) {
            if block != Block::Numbered {
                close(block, &mut out);
                out.push_str("<ol>\n");
                block = Block::Numbered;
            }
            out.push_str(&format!("<li>{}</li>\n", inline(caps[1].trim())));
            continue;
        }

        match block {
            Block::Paragraph => {
                out.push_str("<br>");
                out.push_str(&inline(line));
            }
            _ => {
                close(block, &mut out);
                out.push_str("<p>");
                out.push_str(&inline(line));
                block = Block::Paragraph;
            }
        }
    }

    close(block, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headings_and_lists() {
        let html = to_html("## Immediate Actions\n* Isolate cases\n* **Notify** IDSP\n\n1. Day one\n2. Day two");
        assert_eq!(
            html,
            "<h2>Immediate Actions</h2>\n<ul>\n<li>Isolate cases</li>\n<li><strong>Notify</strong> IDSP</li>\n</ul>\n<ol>\n<li>Day one</li>\n<li>Day two</li>\n</ol>\n"
        );
    }

    #[test]
    fn test_paragraph_lines_joined() {
        assert_eq!(to_html("First line\nsecond line"), "<p>First line<br>second line</p>\n");
    }

    #[test]
    fn test_escapes_markup() {
        let html = to_html("<script>alert('x')</script> & more");
        assert!(html.contains("&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt; &amp; more"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_list_then_paragraph() {
        let html = to_html("- one\nafter");
        assert_eq!(html, "<ul>\n<li>one</li>\n</ul>\n<p>after</p>\n");
    }
}
