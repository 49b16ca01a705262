// src/utils/markdown.rs

//! HTML to normalized markdown conversion.
//!
//! Scripts, styles, asides, navigation, forms, and images are removed from
//! the DOM with scraper, then `html2text` renders what is left. Headings,
//! lists, and inline emphasis survive the rendering.

use scraper::{ElementRef, Html, Node, Selector};

/// Elements whose content never reaches the article body.
const STRIPPED_TAGS: &[&str] = &[
    "script", "style", "noscript", "aside", "nav", "form", "iframe", "svg", "template",
    "button", "select", "object", "img",
];

/// Line width handed to html2text; wide enough that paragraphs stay on one line.
const RENDER_WIDTH: usize = 10_000;

/// Convert an HTML fragment into markdown.
///
/// Returns `None` when html2text cannot render the fragment.
pub fn html_to_markdown(html: &str) -> Option<String> {
    let cleaned = strip_noise(html);
    match html2text::from_read(cleaned.as_bytes(), RENDER_WIDTH) {
        Ok(rendered) => Some(tidy(&rendered)),
        Err(e) => {
            log::warn!("Markdown rendering failed: {}", e);
            None
        }
    }
}

/// Remove every stripped element from an HTML fragment.
pub fn strip_noise(html: &str) -> String {
    let mut fragment = Html::parse_fragment(html);
    let Ok(selector) = Selector::parse(&STRIPPED_TAGS.join(", ")) else {
        return html.to_string();
    };

    let ids: Vec<_> = fragment.select(&selector).map(|el| el.id()).collect();
    for id in ids {
        if let Some(mut node) = fragment.tree.get_mut(id) {
            node.detach();
        }
    }
    fragment.root_element().inner_html()
}

/// Plain text of an element, skipping stripped elements.
pub fn element_text(element: ElementRef) -> String {
    let mut out = String::new();
    collect_text(element, &mut out);
    super::text::normalize_whitespace(&out)
}

/// Turn plain text into markdown paragraphs, one per non-empty line.
pub fn paragraphs_to_markdown(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn collect_text(element: ElementRef, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                out.push_str(text);
                out.push(' ');
            }
            Node::Element(_) => {
                if let Some(el) = ElementRef::wrap(child) {
                    if !STRIPPED_TAGS.contains(&el.value().name()) {
                        collect_text(el, out);
                    }
                }
            }
            _ => {}
        }
    }
}

/// Trim trailing spaces and collapse runs of blank lines.
fn tidy(raw: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    let mut blank = false;
    for line in raw.lines().map(str::trim_end) {
        if line.trim().is_empty() {
            if !blank && !lines.is_empty() {
                lines.push("");
            }
            blank = true;
        } else {
            lines.push(line);
            blank = false;
        }
    }
    while lines.last() == Some(&"") {
        lines.pop();
    }
    lines.join("\n")
}
