use crate::dom::{DomNode, DomTree};
use scraper::{ElementRef, Html, Node};
use std::collections::HashMap;

/// Tags whose contents never render; kept as empty elements so the
/// extractor can still see and prune them.
const OPAQUE_TAGS: &[&str] = &["script", "style", "noscript", "template", "svg"];

/// Parse raw HTML into a DomTree ready for block layout.
pub fn parse_html(html: &str, url: &str) -> DomTree {
    let document = Html::parse_document(html);

    let title = scraper::Selector::parse("title")
        .ok()
        .and_then(|sel| document.select(&sel).next())
        .map(|el| el.text().collect::<String>())
        .unwrap_or_default();

    let root = convert_element(document.root_element());

    DomTree {
        root,
        url: url.to_string(),
        title: title.trim().to_string(),
    }
}

fn convert_element(el: ElementRef<'_>) -> DomNode {
    let tag = el.value().name.local.as_ref().to_ascii_lowercase();
    let attributes: HashMap<String, String> = el
        .value()
        .attrs()
        .map(|(k, v)| (k.to_ascii_lowercase(), v.to_string()))
        .collect();

    if OPAQUE_TAGS.contains(&tag.as_str()) {
        return DomNode::element(tag, attributes, Vec::new());
    }

    let mut children = Vec::new();

    for child_ref in el.children() {
        match child_ref.value() {
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child_ref) {
                    children.push(convert_element(child_el));
                }
            }
            Node::Text(t) => {
                let collapsed = t.text.split_whitespace().collect::<Vec<_>>().join(" ");
                if !collapsed.is_empty() {
                    children.push(DomNode::text(collapsed));
                }
            }
            _ => {}
        }
    }

    DomNode::element(tag, attributes, children)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::NodeType;

    fn text_of(node: &DomNode) -> String {
        let mut parts = Vec::new();
        if node.node_type == NodeType::Text {
            parts.push(node.text.clone());
        }
        parts.extend(node.children.iter().map(text_of).filter(|t| !t.is_empty()));
        parts.join(" ")
    }

    #[test]
    fn parse_simple_html() {
        let html = r#"
        <html>
            <head><title>Test Page</title></head>
            <body>
                <h1>Hello, ALICE</h1>
                <p>Content paragraph</p>
            </body>
        </html>
        "#;

        let tree = parse_html(html, "https://example.com");
        assert_eq!(tree.title, "Test Page");
        assert!(tree.body().is_some());
        assert_eq!(tree.root.tag, "html");
        assert_eq!(text_of(tree.body().unwrap()), "Hello, ALICE Content paragraph");
    }

    #[test]
    fn keeps_attributes_and_inline_style() {
        let html = r#"<html><body><nav id="top" class="site-nav" style="z-index: 2">Menu</nav></body></html>"#;
        let tree = parse_html(html, "https://example.com");
        let nav = tree.root.find_tag("nav").unwrap();
        assert_eq!(nav.attr("id"), Some("top"));
        assert_eq!(nav.attr("style"), Some("z-index: 2"));
        assert_eq!(text_of(nav), "Menu");
    }

    #[test]
    fn strips_script_children() {
        let html = r#"
        <html><body>
            <p>Visible</p>
            <script>alert("hidden");</script>
        </body></html>
        "#;

        let tree = parse_html(html, "https://example.com");
        let text = text_of(&tree.root);
        assert!(text.contains("Visible"));
        assert!(!text.contains("alert"));
        assert!(tree.root.find_tag("script").is_some());
    }
}
