//! Visible-text extraction shared by the extractor and the renderer.

use ego_tree::iter::Edge;
use scraper::node::Node;
use scraper::Html;

/// Tags whose content never contributes visible text.
const INVISIBLE_TAGS: &[&str] = &["script", "style", "noscript", "template", "iframe", "head"];

/// Tags that start and end on their own line.
const BLOCK_TAGS: &[&str] = &[
    "p", "div", "section", "article", "main", "header", "footer", "nav", "aside", "figure",
    "figcaption", "table", "tr", "td", "th", "blockquote", "address", "pre", "ul", "ol", "li",
    "dl", "dt", "dd", "h1", "h2", "h3", "h4", "h5", "h6", "hr",
];

/// Visible text of a parsed document or fragment. Block elements and `<br>`
/// break lines; text inside them is kept as-is, including source newlines.
///
/// The walk is iterative so arbitrarily deep nesting cannot exhaust the stack.
pub(crate) fn visible_text(html: &Html) -> String {
    let mut ctx = TextContext::default();
    // Depth inside invisible subtrees; nothing is emitted while positive.
    let mut hidden = 0usize;
    for edge in html.tree.root().traverse() {
        match edge {
            Edge::Open(node) => match node.value() {
                Node::Element(element) if INVISIBLE_TAGS.contains(&element.name()) => hidden += 1,
                _ if hidden > 0 => {}
                Node::Text(text) => ctx.append_text(text),
                Node::Element(element) if element.name() == "br" => ctx.ensure_newline(),
                Node::Element(element) if BLOCK_TAGS.contains(&element.name()) => ctx.ensure_newline(),
                _ => {}
            },
            Edge::Close(node) => match node.value() {
                Node::Element(element) if INVISIBLE_TAGS.contains(&element.name()) => {
                    hidden = hidden.saturating_sub(1)
                }
                _ if hidden > 0 => {}
                Node::Element(element) if BLOCK_TAGS.contains(&element.name()) => ctx.ensure_newline(),
                _ => {}
            },
        }
    }
    ctx.builder
}

#[derive(Default)]
struct TextContext {
    builder: String,
}

impl TextContext {
    fn append_text(&mut self, text: &str) {
        self.builder.push_str(text);
    }

    fn ensure_newline(&mut self) {
        if self.builder.is_empty() || self.builder.ends_with('\n') {
            return;
        }
        self.builder.push('\n');
    }
}

/// Trim every line, drop blank ones and rejoin with single newlines.
pub fn normalize_lines(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// True when `text` still contains something that looks like an HTML tag.
pub fn looks_like_markup(text: &str) -> bool {
    let Some(last_close) = text.rfind('>') else {
        return false;
    };
    text.as_bytes()[..last_close]
        .windows(2)
        .any(|pair| pair[0] == b'<' && (pair[1].is_ascii_alphabetic() || pair[1] == b'/' || pair[1] == b'!'))
}

/// Reduce an HTML fragment to plain text. Whitespace inside a line is
/// collapsed; line breaks are kept, with runs of blank lines folded into one.
pub fn markup_to_text(markup: &str) -> String {
    let fragment = Html::parse_fragment(markup);
    let mut lines: Vec<String> = Vec::new();
    for line in visible_text(&fragment).lines() {
        let collapsed = line.split_whitespace().collect::<Vec<_>>().join(" ");
        if collapsed.is_empty() && lines.last().map_or(true, |prev| prev.is_empty()) {
            continue;
        }
        lines.push(collapsed);
    }
    while lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }
    lines.join("\n")
}

/// Greedy word wrap at `width` characters. Existing line breaks are kept and
/// words longer than `width` are split.
pub fn reflow(text: &str, width: usize) -> String {
    let width = width.max(1);
    let mut out: Vec<String> = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            out.push(String::new());
            continue;
        }
        let mut current = String::new();
        let mut current_len = 0;
        for word in line.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            while word.len() > width {
                if current_len > 0 {
                    out.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                let rest = word.split_off(width);
                out.push(word.into_iter().collect());
                word = rest;
            }
            let needed = if current_len == 0 { word.len() } else { current_len + 1 + word.len() };
            if needed > width && current_len > 0 {
                out.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if current_len > 0 {
                current.push(' ');
                current_len += 1;
            }
            current.extend(word.iter());
            current_len += word.len();
        }
        if current_len > 0 {
            out.push(current);
        }
    }
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_break_lines_and_scripts_are_invisible() {
        let html = Html::parse_fragment(
            "<h2>Head</h2><p>one <b>bold</b></p><script>var x = 1;</script><p>two<br>three</p>",
        );
        let text = normalize_lines(&visible_text(&html));
        assert_eq!(text, "Head\none bold\ntwo\nthree");
    }

    #[test]
    fn markup_detection() {
        assert!(looks_like_markup("<p>hi</p>"));
        assert!(looks_like_markup("text </div> more"));
        assert!(!looks_like_markup("a < b and c > d"));
        assert!(!looks_like_markup("plain prose"));
        assert!(!looks_like_markup("<a<b<c"));
    }

    #[test]
    fn unclosed_tag_runs_are_not_markup() {
        let text = "<a".repeat(200_000);
        assert!(!looks_like_markup(&text));
        assert!(looks_like_markup(&format!("{text}>")));
    }

    #[test]
    fn deeply_nested_inline_elements_keep_their_text() {
        let depth = 20_000;
        let markup = format!("<p>{}deep{}</p>", "<span>".repeat(depth), "</span>".repeat(depth));
        let html = Html::parse_fragment(&markup);
        assert_eq!(normalize_lines(&visible_text(&html)), "deep");
    }

    #[test]
    fn markup_to_text_decodes_entities_and_keeps_breaks() {
        let text = markup_to_text("<p>Fish &amp; chips</p>\n<p>second   line</p>");
        assert_eq!(text, "Fish & chips\n\nsecond line");
    }

    #[test]
    fn reflow_wraps_words_and_preserves_breaks() {
        let text = "aaa bbb ccc\n\nddd";
        assert_eq!(reflow(text, 7), "aaa bbb\nccc\n\nddd");
    }

    #[test]
    fn reflow_splits_overlong_words() {
        assert_eq!(reflow("abcdefghij", 4), "abcd\nefgh\nij");
    }
}
