use scraper::{ElementRef, Selector};

// ── DOM utility helpers ──────────────────────────────────────────────────────

/// Recursively collect all text from an element and its descendants.
pub fn collect_text(el: ElementRef<'_>) -> String {
    use scraper::node::Node;
    let mut parts = Vec::new();
    for child in el.children() {
        match child.value() {
            Node::Text(text) => parts.push((&*text.text).to_string()),
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    parts.push(collect_text(child_el));
                }
            }
            _ => {}
        }
    }
    parts.join("")
}

/// Concatenated text of every descendant matching `selector`, trimmed.
pub fn select_text(el: ElementRef<'_>, selector: &Selector) -> String {
    el.select(selector)
        .map(collect_text)
        .collect::<String>()
        .trim()
        .to_string()
}

/// Attribute value of the first descendant matching `selector` that carries it.
pub fn select_attr<'a>(el: ElementRef<'a>, selector: &Selector, attr: &str) -> Option<&'a str> {
    el.select(selector).find_map(|found| found.value().attr(attr))
}
