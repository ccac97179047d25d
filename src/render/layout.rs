use crate::dom::css::{parse_css_size, parse_inline_style, StyleProps};
use crate::dom::{Bounds, DomNode, NodeType, SnapshotNode};

/// Tags that never produce a box.
const NON_RENDERED_TAGS: &[&str] = &[
    "head", "title", "meta", "link", "script", "style", "noscript", "template", "base",
];

const BLOCK_TAGS: &[&str] = &[
    "html",
    "body",
    "div",
    "p",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "ul",
    "ol",
    "li",
    "table",
    "tr",
    "td",
    "th",
    "form",
    "section",
    "article",
    "aside",
    "main",
    "header",
    "footer",
    "nav",
    "blockquote",
    "pre",
    "figure",
    "figcaption",
    "details",
    "summary",
];

/// Intrinsic size of an `<img>` without width/height hints.
const DEFAULT_IMAGE_SIZE: (f32, f32) = (300.0, 150.0);

/// Per-tag vertical margins (top, bottom) in pixels.
fn tag_margins(tag: &str) -> (f32, f32) {
    match tag {
        "h1" => (24.0, 16.0),
        "h2" => (20.0, 12.0),
        "h3" | "h4" => (16.0, 10.0),
        "h5" | "h6" => (12.0, 8.0),
        "p" => (4.0, 10.0),
        "ul" | "ol" => (8.0, 8.0),
        "li" => (2.0, 2.0),
        "section" | "article" | "main" => (16.0, 16.0),
        "nav" | "header" | "footer" => (12.0, 12.0),
        "blockquote" => (12.0, 12.0),
        "pre" => (8.0, 8.0),
        "hr" => (8.0, 8.0),
        _ => (0.0, 0.0),
    }
}

/// Per-tag padding in pixels.
fn tag_padding(tag: &str, is_block: bool) -> f32 {
    match tag {
        "section" | "article" | "main" | "aside" => 16.0,
        "nav" | "header" | "footer" => 12.0,
        "blockquote" => 20.0,
        _ if is_block => 4.0,
        _ => 0.0,
    }
}

fn tag_font_size(tag: &str, parent: f32) -> f32 {
    match tag {
        "h1" => 32.0,
        "h2" => 24.0,
        "h3" => 20.0,
        "h4" => 18.0,
        "h5" | "h6" => 16.0,
        "small" => 12.0,
        _ => parent,
    }
}

/// Lay out a parsed element (simple top-to-bottom block model) and emit a
/// rendered snapshot the extractor can walk.
///
/// Text children fold into their parent's `text`; inline `style` carries
/// through as the computed style.
pub fn compute_layout(root: &DomNode, viewport_width: f32) -> SnapshotNode {
    let mut cursor_y = 0.0;
    layout_node(root, 0.0, &mut cursor_y, viewport_width, 16.0)
}

fn layout_node(
    node: &DomNode,
    x: f32,
    cursor_y: &mut f32,
    available_width: f32,
    parent_font_size: f32,
) -> SnapshotNode {
    let style = node.attr("style").map(parse_inline_style).unwrap_or_default();

    if NON_RENDERED_TAGS.contains(&node.tag.as_str()) || style.is_hidden() {
        return snapshot(node, Bounds::new(x, *cursor_y, 0.0, 0.0), style, String::new());
    }

    let is_block = node.node_type != NodeType::Text && BLOCK_TAGS.contains(&node.tag.as_str());
    let font_size = style.font_size.unwrap_or_else(|| tag_font_size(&node.tag, parent_font_size));

    let (margin_top, margin_bottom) = tag_margins(&node.tag);
    let padding = tag_padding(&node.tag, is_block);

    if is_block {
        *cursor_y += margin_top;
    }
    let start_y = *cursor_y;
    *cursor_y += padding;

    let child_x = x + padding;
    let width = style.width.unwrap_or(available_width).min(available_width.max(0.0));
    let child_width = (width - padding * 2.0).max(0.0);

    let mut children = Vec::new();
    let mut text = String::new();
    for child in &node.children {
        if child.node_type == NodeType::Text {
            let t = child.text.trim();
            if !t.is_empty() {
                if !text.is_empty() {
                    text.push(' ');
                }
                text.push_str(t);
            }
            continue;
        }
        children.push(layout_node(child, child_x, cursor_y, child_width, font_size));
    }

    // Own text contributes to height
    let mut text_width = 0.0_f32;
    if !text.is_empty() {
        let line_height = font_size * 1.4;
        let glyph = font_size * 0.6;
        let chars_per_line = (child_width / glyph).max(1.0) as usize;
        let chars = text.chars().count();
        let lines = (chars as f32 / chars_per_line as f32).ceil().max(1.0);
        *cursor_y += lines * line_height;
        text_width = (chars as f32 * glyph).min(child_width);
    }

    if node.tag == "img" {
        let (w, h) = image_size(node, &style, available_width);
        *cursor_y = start_y + h;
        let bounds = Bounds::new(x, start_y, w, h);
        return snapshot(node, bounds, style, text);
    }

    *cursor_y += padding;
    let height = style.height.unwrap_or(*cursor_y - start_y);
    *cursor_y = start_y + height;

    if is_block {
        *cursor_y += margin_bottom;
    }

    // Inline boxes shrink to their content
    let box_width = if is_block || style.width.is_some() {
        width
    } else {
        let widest_child = children
            .iter()
            .filter_map(|c| c.bounds)
            .map(|b| b.right() - child_x)
            .fold(0.0_f32, f32::max);
        (text_width.max(widest_child) + padding * 2.0).min(width)
    };

    let mut out = snapshot(node, Bounds::new(x, start_y, box_width, height), style, text);
    out.children = children;
    out
}

fn image_size(node: &DomNode, style: &StyleProps, available_width: f32) -> (f32, f32) {
    let attr = |name: &str| node.attr(name).and_then(parse_css_size);
    let w = style.width.or_else(|| attr("width"));
    let h = style.height.or_else(|| attr("height"));
    let (dw, dh) = DEFAULT_IMAGE_SIZE;
    let (w, h) = match (w, h) {
        (Some(w), Some(h)) => (w, h),
        (Some(w), None) => (w, w * dh / dw),
        (None, Some(h)) => (h * dw / dh, h),
        (None, None) => (dw, dh),
    };
    let w_clamped = w.min(available_width.max(0.0));
    let h_scaled = if w > 0.0 { h * w_clamped / w } else { h };
    (w_clamped, h_scaled)
}

fn snapshot(node: &DomNode, bounds: Bounds, style: StyleProps, text: String) -> SnapshotNode {
    let mut out = SnapshotNode::element(node.tag.clone(), bounds).with_style(style);
    out.attributes = node
        .attributes
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    out.text = text;
    if node.attributes.contains_key("onclick") {
        out = out.with_click_handler();
    }
    out
}
