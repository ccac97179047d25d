//! Page model: parsed HTML, the rendered-tree abstraction, and the
//! normalized element records the compiler works on.

pub mod css;
pub mod parser;
pub mod record;
pub mod rendered;

pub use record::{ArticleDigest, ElementRecord, ImageRef, ImageSource, ImageStatus, RoleType, SectionHint};
pub use rendered::{RenderedNode, SnapshotNode, StyleReadError};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Axis-aligned box in page (CSS pixel) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Zero-area boxes never reach the record list.
    pub fn has_area(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    /// Strict 2D containment: `other` lies fully inside `self` (edges may touch).
    pub fn contains(&self, other: &Bounds) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    pub fn offset(&self, dx: f32, dy: f32) -> Bounds {
        Bounds::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Smallest box covering both.
    pub fn union(&self, other: &Bounds) -> Bounds {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Bounds::new(x, y, self.right().max(other.right()) - x, self.bottom().max(other.bottom()) - y)
    }
}

/// Aggregate page and viewport state at scan time.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PageMetrics {
    /// Full scrollable document size
    pub width: f32,
    pub height: f32,
    pub viewport_width: f32,
    pub viewport_height: f32,
    pub scroll_x: f32,
    pub scroll_y: f32,
    /// Page URL; used to resolve relative image URLs and detect cross-origin.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl PageMetrics {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            viewport_width: width,
            viewport_height: height,
            ..Default::default()
        }
    }

    pub fn with_url(mut self, url: &str) -> Self {
        self.url = Some(url.to_string());
        self
    }

    pub fn with_scroll(mut self, x: f32, y: f32) -> Self {
        self.scroll_x = x;
        self.scroll_y = y;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Element,
    Text,
}

/// Parsed HTML node, before layout.
#[derive(Debug, Clone)]
pub struct DomNode {
    pub tag: String,
    pub attributes: HashMap<String, String>,
    pub text: String,
    pub children: Vec<DomNode>,
    pub node_type: NodeType,
}

impl DomNode {
    pub fn element(
        tag: impl Into<String>,
        attrs: HashMap<String, String>,
        children: Vec<DomNode>,
    ) -> Self {
        Self {
            tag: tag.into(),
            attributes: attrs,
            text: String::new(),
            children,
            node_type: NodeType::Element,
        }
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self {
            tag: String::new(),
            attributes: HashMap::new(),
            text: content.into(),
            children: Vec::new(),
            node_type: NodeType::Text,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(|s| s.as_str())
    }

    /// Depth-first search for the first element with the given tag.
    pub fn find_tag(&self, tag: &str) -> Option<&DomNode> {
        if self.node_type == NodeType::Element && self.tag == tag {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find_tag(tag))
    }
}

/// Parsed DOM tree with metadata
#[derive(Debug, Clone)]
pub struct DomTree {
    pub root: DomNode,
    pub url: String,
    pub title: String,
}

impl DomTree {
    pub fn body(&self) -> Option<&DomNode> {
        self.root.find_tag("body")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn containment_is_edge_inclusive() {
        let outer = Bounds::new(0.0, 0.0, 100.0, 100.0);
        assert!(outer.contains(&Bounds::new(0.0, 0.0, 100.0, 100.0)));
        assert!(outer.contains(&Bounds::new(10.0, 10.0, 20.0, 20.0)));
        assert!(!outer.contains(&Bounds::new(90.0, 10.0, 20.0, 20.0)));
    }

    #[test]
    fn zero_area_box() {
        assert!(!Bounds::new(5.0, 5.0, 0.0, 10.0).has_area());
        assert!(Bounds::new(5.0, 5.0, 1.0, 1.0).has_area());
    }

    #[test]
    fn union_covers_both() {
        let u = Bounds::new(0.0, 0.0, 10.0, 10.0).union(&Bounds::new(20.0, 5.0, 5.0, 30.0));
        assert_eq!(u, Bounds::new(0.0, 0.0, 25.0, 35.0));
    }
}
