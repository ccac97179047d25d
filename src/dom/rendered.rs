//! Rendered-tree access.
//!
//! The extractor reads the page through [`RenderedNode`], so a live host
//! DOM and the owned [`SnapshotNode`] share one traversal. Box and style
//! reads are fallible: detached nodes and hostile getters surface as
//! [`StyleReadError`] and are skipped by the caller.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dom::css::StyleProps;
use crate::dom::Bounds;

/// Failure reading a node's rendered box or computed style.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StyleReadError {
    #[error("node is detached from the document")]
    Detached,
    #[error("style getter failed: {0}")]
    Getter(String),
}

/// One element of a rendered page.
pub trait RenderedNode: Sized {
    /// Tag name; compared case-insensitively by callers.
    fn tag_name(&self) -> &str;

    fn attribute(&self, name: &str) -> Option<&str>;

    /// Text directly owned by this element (not its descendants).
    fn own_text(&self) -> &str;

    /// Element children in document order.
    fn children(&self) -> &[Self];

    /// Rendered box relative to the viewport (like `getBoundingClientRect`).
    fn bounding_box(&self) -> Result<Bounds, StyleReadError>;

    fn computed_style(&self) -> Result<StyleProps, StyleReadError>;

    fn has_click_handler(&self) -> bool {
        false
    }

    /// Own text plus every descendant's, space-joined.
    fn text_content(&self) -> String {
        let mut buf = String::new();
        collect_text(self, &mut buf);
        buf
    }
}

fn collect_text<N: RenderedNode>(node: &N, buf: &mut String) {
    let own = node.own_text().trim();
    if !own.is_empty() {
        if !buf.is_empty() {
            buf.push(' ');
        }
        buf.push_str(own);
    }
    for child in node.children() {
        collect_text(child, buf);
    }
}

/// Owned snapshot of a rendered element, as a host sends it over the wire.
///
/// `bounds` or `style` being `None` models a node whose reads fail.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SnapshotNode {
    pub tag: String,
    pub attributes: BTreeMap<String, String>,
    pub text: String,
    pub children: Vec<SnapshotNode>,
    pub bounds: Option<Bounds>,
    pub style: Option<StyleProps>,
    pub click_handler: bool,
}

impl SnapshotNode {
    pub fn element(tag: impl Into<String>, bounds: Bounds) -> Self {
        Self {
            tag: tag.into(),
            bounds: Some(bounds),
            style: Some(StyleProps::default()),
            ..Default::default()
        }
    }

    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn with_style(mut self, style: StyleProps) -> Self {
        self.style = Some(style);
        self
    }

    pub fn with_child(mut self, child: SnapshotNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = SnapshotNode>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn with_click_handler(mut self) -> Self {
        self.click_handler = true;
        self
    }

    /// Drop the style so every read fails, like a node removed mid-scan.
    pub fn detached(mut self) -> Self {
        self.style = None;
        self
    }
}

impl RenderedNode for SnapshotNode {
    fn tag_name(&self) -> &str {
        &self.tag
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(|s| s.as_str())
    }

    fn own_text(&self) -> &str {
        &self.text
    }

    fn children(&self) -> &[Self] {
        &self.children
    }

    fn bounding_box(&self) -> Result<Bounds, StyleReadError> {
        self.bounds.ok_or(StyleReadError::Detached)
    }

    fn computed_style(&self) -> Result<StyleProps, StyleReadError> {
        self.style.clone().ok_or(StyleReadError::Detached)
    }

    fn has_click_handler(&self) -> bool {
        self.click_handler
    }
}
