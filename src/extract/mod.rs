//! Feature Extractor.
//!
//! Walks the rendered tree once, depth-first pre-order, and reduces every
//! visible element to an [`ElementRecord`]. Non-visual tags and hidden
//! nodes prune their whole subtree. A node whose box or style read fails
//! is skipped and traversal carries on into its children.

pub mod budget;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::classify::clean::{clean_text, filter_class_names, truncate_chars};
use crate::classify::{self, ClassifyInput, DivSectionRule, HintInput};
use crate::dom::{
    ArticleDigest, ElementRecord, ImageRef, ImageSource, ImageStatus, PageMetrics, RenderedNode,
};
use crate::engine::CompileError;
use budget::{BudgetConfig, BudgetReport};

/// Tags that never paint; pruned with their subtree.
const NON_VISUAL_TAGS: &[&str] = &[
    "script", "style", "meta", "link", "head", "title", "noscript", "template", "base",
];

/// Document roots: traversed, never recorded.
const ROOT_TAGS: &[&str] = &["html", "body"];

const INTERACTIVE_TAGS: &[&str] = &[
    "a", "button", "input", "select", "textarea", "summary", "label", "option", "details",
];

/// Tags whose whole descendant text is their text.
const TEXT_BEARING_TAGS: &[&str] = &[
    "h1", "h2", "h3", "h4", "h5", "h6", "p", "a", "button", "li", "label", "span", "figcaption",
    "blockquote", "td", "th", "dt", "dd", "summary", "caption", "strong", "em",
];

/// Tags that stand for the picture they wrap.
const IMAGE_WRAPPER_TAGS: &[&str] = &["a", "figure", "picture"];

const ARTICLE_KEYWORDS: &[&str] = &["article", "post", "story", "card", "entry", "teaser"];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    pub text_cap: usize,
    pub title_cap: usize,
    pub summary_cap: usize,
    pub body_cap: usize,
    pub div_section_min_width: f32,
    pub div_section_min_height: f32,
    pub div_section_min_children: usize,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            text_cap: 240,
            title_cap: 120,
            summary_cap: 240,
            body_cap: 600,
            div_section_min_width: 300.0,
            div_section_min_height: 150.0,
            div_section_min_children: 3,
        }
    }
}

/// Traversal counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractStats {
    pub visited: usize,
    /// Subtrees cut as non-visual or hidden
    pub pruned: usize,
    /// Nodes whose reads failed
    pub skipped: usize,
    pub records: usize,
}

/// Extractor output: records in document order, after budgeting.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub records: Vec<ElementRecord>,
    pub stats: ExtractStats,
    pub budget: BudgetReport,
}

pub struct FeatureExtractor {
    cfg: ExtractConfig,
    budget: BudgetConfig,
    page_url: Option<Url>,
    scroll: (f32, f32),
}

impl FeatureExtractor {
    pub fn new(cfg: ExtractConfig, budget: BudgetConfig, metrics: &PageMetrics) -> Self {
        let page_url = metrics.url.as_deref().and_then(|u| Url::parse(u).ok());
        Self {
            cfg,
            budget,
            page_url,
            scroll: (metrics.scroll_x, metrics.scroll_y),
        }
    }

    /// Extract records from `root`.
    ///
    /// Fails only when the root itself cannot be rendered.
    pub fn extract<N: RenderedNode>(&self, root: &N) -> Result<Extraction, CompileError> {
        let tag = root.tag_name().to_ascii_lowercase();
        if NON_VISUAL_TAGS.contains(&tag.as_str()) {
            return Err(CompileError::NothingToCompile(format!("<{tag}> is not a rendered root")));
        }
        let style = root
            .computed_style()
            .map_err(|e| CompileError::NothingToCompile(format!("root style unreadable: {e}")))?;
        let bounds = root
            .bounding_box()
            .map_err(|e| CompileError::NothingToCompile(format!("root box unreadable: {e}")))?;
        if !bounds.has_area() || style.is_hidden() {
            return Err(CompileError::NothingToCompile(format!("<{tag}> has no rendered box")));
        }

        let mut records = Vec::new();
        let mut stats = ExtractStats::default();
        self.visit(root, 0, None, &mut records, &mut stats);

        let budget = budget::enforce(&mut records, &self.budget);
        stats.records = records.len();
        log::debug!(
            "extracted {} records ({} visited, {} pruned, {} skipped)",
            stats.records,
            stats.visited,
            stats.pruned,
            stats.skipped
        );

        Ok(Extraction { records, stats, budget })
    }

    fn visit<N: RenderedNode>(
        &self,
        node: &N,
        depth: u32,
        parent_id: Option<&str>,
        out: &mut Vec<ElementRecord>,
        stats: &mut ExtractStats,
    ) {
        stats.visited += 1;
        let tag = node.tag_name().to_ascii_lowercase();
        if NON_VISUAL_TAGS.contains(&tag.as_str()) {
            stats.pruned += 1;
            return;
        }

        let read = node
            .computed_style()
            .and_then(|style| node.bounding_box().map(|bounds| (style, bounds)));
        let (style, bounds) = match read {
            Ok(read) => read,
            Err(e) => {
                log::debug!("skipping <{}> at depth {}: {}", tag, depth, e);
                stats.skipped += 1;
                for child in node.children() {
                    self.visit(child, depth + 1, parent_id, out, stats);
                }
                return;
            }
        };

        if !bounds.has_area() || style.is_hidden() {
            stats.pruned += 1;
            return;
        }

        if ROOT_TAGS.contains(&tag.as_str()) {
            for child in node.children() {
                self.visit(child, depth + 1, parent_id, out, stats);
            }
            return;
        }

        let bounds = bounds.offset(self.scroll.0, self.scroll.1);
        let id = node.attribute("id").map(str::trim).filter(|s| !s.is_empty()).map(str::to_string);
        let class_attr = node.attribute("class");
        let role = node.attribute("role").map(|r| r.trim().to_ascii_lowercase());
        let background_url = style.background_url();

        let semantic_type = classify::classify(&ClassifyInput {
            tag: &tag,
            id: id.as_deref(),
            class_attr,
            role: role.as_deref(),
            has_background_image: background_url.is_some(),
        });

        let is_interactive = INTERACTIVE_TAGS.contains(&tag.as_str())
            || role.as_deref() == Some("button")
            || style.has_pointer_cursor()
            || node.has_click_handler()
            || node.attribute("onclick").is_some();

        let article_like = self.is_article_like(&tag, class_attr, role.as_deref());
        let article = if article_like {
            self.article_digest(node)
        } else {
            None
        };

        let image = self.own_image(node, &tag).or_else(|| {
            background_url.map(|src| self.image_ref(&src, ImageSource::Background))
        });
        let image = match image {
            Some(image) => Some(image),
            // wrappers, cards and clickable tiles borrow the first picture inside
            None if article_like || is_interactive || IMAGE_WRAPPER_TAGS.contains(&tag.as_str()) => {
                first_descendant_image(node).map(|src| self.image_ref(&src, ImageSource::Descendant))
            }
            None => None,
        };

        let raw_text = if TEXT_BEARING_TAGS.contains(&tag.as_str()) {
            node.text_content()
        } else {
            node.own_text().to_string()
        };
        let text = Some(clean_text(&raw_text))
            .filter(|t| !t.is_empty())
            .map(|t| truncate_chars(&t, self.cfg.text_cap));

        let leading_heading = node
            .children()
            .first()
            .filter(|c| classify::is_heading_tag(&c.tag_name().to_ascii_lowercase()))
            .map(|c| c.text_content());
        let section_hint = classify::section_hint(
            &HintInput {
                tag: &tag,
                id: id.as_deref(),
                class_attr,
                role: role.as_deref(),
                aria_label: node.attribute("aria-label"),
                leading_heading: leading_heading.as_deref(),
                width: bounds.width,
                height: bounds.height,
                element_children: node.children().len(),
            },
            &DivSectionRule {
                min_width: self.cfg.div_section_min_width,
                min_height: self.cfg.div_section_min_height,
                min_children: self.cfg.div_section_min_children,
            },
        );

        let record = ElementRecord {
            order: out.len(),
            id,
            tag_name: tag,
            semantic_type,
            class_names: class_attr.map(filter_class_names).unwrap_or_default(),
            parent_id: parent_id.map(str::to_string),
            bounds,
            depth,
            stack_order: style.stack_order(),
            is_interactive,
            text,
            image,
            article,
            section_hint,
            background: style.painted_background(),
        };

        let child_parent = record.id.clone().or_else(|| parent_id.map(str::to_string));
        out.push(record);

        for child in node.children() {
            self.visit(child, depth + 1, child_parent.as_deref(), out, stats);
        }
    }

    fn is_article_like(&self, tag: &str, class_attr: Option<&str>, role: Option<&str>) -> bool {
        tag == "article"
            || role == Some("article")
            || class_attr.map_or(false, |classes| {
                filter_class_names(classes).iter().any(|c| {
                    let lower = c.to_ascii_lowercase();
                    ARTICLE_KEYWORDS.iter().any(|kw| lower.contains(kw))
                })
            })
    }

    /// Title from the first heading, summary from the first paragraph,
    /// body from every paragraph.
    fn article_digest<N: RenderedNode>(&self, node: &N) -> Option<ArticleDigest> {
        let mut headings = Vec::new();
        let mut paragraphs = Vec::new();
        collect_article_parts(node, &mut headings, &mut paragraphs);

        let pick = |raw: Option<&String>, cap: usize| {
            raw.map(|s| clean_text(s))
                .filter(|s| !s.is_empty())
                .map(|s| truncate_chars(&s, cap))
        };
        let body_raw = (paragraphs.len() > 1).then(|| paragraphs.join(" "));

        let digest = ArticleDigest {
            title: pick(headings.first(), self.cfg.title_cap),
            summary: pick(paragraphs.first(), self.cfg.summary_cap),
            body: pick(body_raw.as_ref(), self.cfg.body_cap),
        };
        (!digest.is_empty()).then_some(digest)
    }

    fn own_image<N: RenderedNode>(&self, node: &N, tag: &str) -> Option<ImageRef> {
        if tag != "img" {
            return None;
        }
        node.attribute("src")
            .or_else(|| node.attribute("data-src"))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|src| self.image_ref(src, ImageSource::Own))
    }

    fn image_ref(&self, raw: &str, source: ImageSource) -> ImageRef {
        let resolved = self.page_url.as_ref().and_then(|base| base.join(raw).ok());
        let needs_proxy = match (&resolved, &self.page_url) {
            (Some(img), Some(page)) => img.scheme() != "data" && img.origin() != page.origin(),
            _ => false,
        };
        ImageRef {
            src: resolved.map_or_else(|| raw.to_string(), |u| u.to_string()),
            source,
            needs_proxy,
            status: ImageStatus::Pending,
        }
    }
}

fn collect_article_parts<N: RenderedNode>(node: &N, headings: &mut Vec<String>, paragraphs: &mut Vec<String>) {
    for child in node.children() {
        let tag = child.tag_name().to_ascii_lowercase();
        if classify::is_heading_tag(&tag) {
            headings.push(child.text_content());
        } else if tag == "p" {
            paragraphs.push(child.text_content());
        } else {
            collect_article_parts(child, headings, paragraphs);
        }
    }
}

fn first_descendant_image<N: RenderedNode>(node: &N) -> Option<String> {
    node.children().iter().find_map(|child| {
        if child.tag_name().eq_ignore_ascii_case("img") {
            if let Some(src) = child.attribute("src").map(str::trim).filter(|s| !s.is_empty()) {
                return Some(src.to_string());
            }
        }
        first_descendant_image(child)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::SemanticType;
    use crate::dom::css::parse_inline_style;
    use crate::dom::{Bounds, SnapshotNode};

    fn b(x: f32, y: f32, w: f32, h: f32) -> Bounds {
        Bounds::new(x, y, w, h)
    }

    fn extractor() -> FeatureExtractor {
        FeatureExtractor::new(
            ExtractConfig::default(),
            BudgetConfig::default(),
            &PageMetrics::new(1000.0, 2000.0).with_url("https://news.example.com/today"),
        )
    }

    fn page(children: Vec<SnapshotNode>) -> SnapshotNode {
        SnapshotNode::element("body", b(0.0, 0.0, 1000.0, 2000.0)).with_children(children)
    }

    #[test]
    fn document_preorder_and_depth() {
        let root = page(vec![
            SnapshotNode::element("header", b(0.0, 0.0, 1000.0, 100.0))
                .with_child(SnapshotNode::element("h1", b(10.0, 10.0, 300.0, 40.0)).with_text("Daily News")),
            SnapshotNode::element("p", b(0.0, 120.0, 1000.0, 40.0)).with_text("Morning edition"),
        ]);
        let out = extractor().extract(&root).unwrap();
        let tags: Vec<&str> = out.records.iter().map(|r| r.tag_name.as_str()).collect();
        assert_eq!(tags, vec!["header", "h1", "p"]);
        assert_eq!(out.records[1].depth, 2);
        assert!(out.records.iter().enumerate().all(|(i, r)| r.order == i));
    }

    #[test]
    fn hidden_subtrees_are_pruned() {
        let root = page(vec![
            SnapshotNode::element("div", b(0.0, 0.0, 100.0, 100.0))
                .with_style(parse_inline_style("display: none"))
                .with_child(SnapshotNode::element("p", b(0.0, 0.0, 100.0, 20.0)).with_text("Secret text")),
            SnapshotNode::element("div", b(0.0, 0.0, 0.0, 100.0))
                .with_child(SnapshotNode::element("p", b(0.0, 0.0, 100.0, 20.0)).with_text("Zero width parent")),
            SnapshotNode::element("script", b(0.0, 0.0, 10.0, 10.0)).with_text("track()"),
            SnapshotNode::element("p", b(0.0, 200.0, 100.0, 20.0)).with_text("Visible text"),
        ]);
        let out = extractor().extract(&root).unwrap();
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].text.as_deref(), Some("Visible text"));
        assert_eq!(out.stats.pruned, 3);
    }

    #[test]
    fn failing_node_is_skipped_not_fatal() {
        let root = page(vec![
            SnapshotNode::element("div", b(0.0, 0.0, 500.0, 500.0))
                .detached()
                .with_child(SnapshotNode::element("p", b(0.0, 0.0, 100.0, 20.0)).with_text("Still here")),
            SnapshotNode::element("p", b(0.0, 600.0, 100.0, 20.0)).with_text("After the failure"),
        ]);
        let out = extractor().extract(&root).unwrap();
        assert_eq!(out.stats.skipped, 1);
        assert_eq!(out.records.len(), 2);
        assert!(out.records.iter().all(|r| r.tag_name == "p"));
    }

    #[test]
    fn unrenderable_root_is_nothing_to_compile() {
        let empty = SnapshotNode::element("body", b(0.0, 0.0, 1000.0, 0.0));
        assert!(matches!(extractor().extract(&empty), Err(CompileError::NothingToCompile(_))));

        let detached = SnapshotNode::element("body", b(0.0, 0.0, 10.0, 10.0)).detached();
        assert!(matches!(extractor().extract(&detached), Err(CompileError::NothingToCompile(_))));
    }

    #[test]
    fn body_without_elements_is_empty_but_valid() {
        let out = extractor().extract(&page(vec![])).unwrap();
        assert!(out.records.is_empty());
    }

    #[test]
    fn interactivity_sources() {
        let root = page(vec![
            SnapshotNode::element("a", b(0.0, 0.0, 100.0, 20.0)).with_text("Home"),
            SnapshotNode::element("div", b(0.0, 30.0, 100.0, 20.0))
                .with_style(parse_inline_style("cursor: pointer")),
            SnapshotNode::element("div", b(0.0, 60.0, 100.0, 20.0)).with_click_handler(),
            SnapshotNode::element("div", b(0.0, 90.0, 100.0, 20.0)),
        ]);
        let out = extractor().extract(&root).unwrap();
        let flags: Vec<bool> = out.records.iter().map(|r| r.is_interactive).collect();
        assert_eq!(flags, vec![true, true, true, false]);
    }

    #[test]
    fn image_sources_and_proxy_flag() {
        let root = page(vec![
            SnapshotNode::element("img", b(0.0, 0.0, 200.0, 100.0)).with_attr("src", "/img/a.png"),
            SnapshotNode::element("div", b(0.0, 100.0, 200.0, 100.0))
                .with_style(parse_inline_style("background-image: url(https://cdn.other.net/bg.jpg)")),
            SnapshotNode::element("a", b(0.0, 200.0, 200.0, 100.0))
                .with_child(SnapshotNode::element("img", b(0.0, 200.0, 50.0, 50.0)).with_attr("src", "thumb.jpg")),
        ]);
        let out = extractor().extract(&root).unwrap();

        let own = out.records[0].image.as_ref().unwrap();
        assert_eq!(own.src, "https://news.example.com/img/a.png");
        assert_eq!(own.source, ImageSource::Own);
        assert!(!own.needs_proxy);

        let bg = out.records[1].image.as_ref().unwrap();
        assert_eq!(bg.source, ImageSource::Background);
        assert!(bg.needs_proxy);
        assert_eq!(out.records[1].semantic_type, SemanticType::Image);

        let link = out.records[2].image.as_ref().unwrap();
        assert_eq!(link.source, ImageSource::Descendant);
        assert_eq!(link.src, "https://news.example.com/thumb.jpg");
    }

    #[test]
    fn wrappers_and_tiles_borrow_descendant_image() {
        let thumb = |src: &str| SnapshotNode::element("img", b(0.0, 0.0, 80.0, 80.0)).with_attr("src", src);
        let root = page(vec![
            SnapshotNode::element("figure", b(0.0, 0.0, 300.0, 200.0)).with_child(thumb("fig.jpg")),
            SnapshotNode::element("div", b(0.0, 200.0, 300.0, 200.0))
                .with_attr("class", "product-card")
                .with_child(thumb("card.jpg")),
            SnapshotNode::element("div", b(0.0, 400.0, 300.0, 200.0))
                .with_click_handler()
                .with_child(thumb("tile.jpg")),
            SnapshotNode::element("div", b(0.0, 600.0, 300.0, 200.0)).with_child(thumb("plain.jpg")),
        ]);
        let out = extractor().extract(&root).unwrap();
        let borrowed = |tag_index: usize| {
            out.records
                .iter()
                .filter(|r| r.tag_name != "img")
                .nth(tag_index)
                .and_then(|r| r.image.as_ref())
                .map(|img| img.src.rsplit('/').next().unwrap_or_default().to_string())
        };
        assert_eq!(borrowed(0).as_deref(), Some("fig.jpg"));
        assert_eq!(borrowed(1).as_deref(), Some("card.jpg"));
        assert_eq!(borrowed(2).as_deref(), Some("tile.jpg"));
        // a plain wrapper div keeps no image of its own
        assert_eq!(borrowed(3), None);
    }

    #[test]
    fn article_digest_from_descendants() {
        let root = page(vec![SnapshotNode::element("article", b(0.0, 0.0, 600.0, 400.0)).with_children(vec![
            SnapshotNode::element("h2", b(0.0, 0.0, 600.0, 40.0)).with_text("Rates hold steady"),
            SnapshotNode::element("div", b(0.0, 40.0, 600.0, 300.0)).with_children(vec![
                SnapshotNode::element("p", b(0.0, 40.0, 600.0, 40.0)).with_text("The bank left rates unchanged."),
                SnapshotNode::element("p", b(0.0, 80.0, 600.0, 40.0)).with_text("Markets barely moved."),
            ]),
        ])]);
        let out = extractor().extract(&root).unwrap();
        let digest = out.records[0].article.as_ref().unwrap();
        assert_eq!(digest.title.as_deref(), Some("Rates hold steady"));
        assert_eq!(digest.summary.as_deref(), Some("The bank left rates unchanged."));
        assert_eq!(
            digest.body.as_deref(),
            Some("The bank left rates unchanged. Markets barely moved.")
        );
        let hint = out.records[0].section_hint.as_ref().unwrap();
        assert_eq!(hint.suggested_name.as_deref(), Some("Rates hold steady"));
    }

    #[test]
    fn classes_are_filtered_and_text_cleaned() {
        let root = page(vec![SnapshotNode::element("span", b(0.0, 0.0, 100.0, 20.0))
            .with_attr("class", "badge px-2 text-sm")
            .with_text("d-flex js-abc123")]);
        let out = extractor().extract(&root).unwrap();
        let r = &out.records[0];
        assert_eq!(r.class_names.iter().collect::<Vec<_>>(), vec!["badge"]);
        assert!(r.text.is_none());
    }

    #[test]
    fn parent_id_is_nearest_identified_ancestor() {
        let root = page(vec![SnapshotNode::element("section", b(0.0, 0.0, 500.0, 500.0))
            .with_attr("id", "news")
            .with_child(
                SnapshotNode::element("div", b(0.0, 0.0, 500.0, 200.0))
                    .with_child(SnapshotNode::element("p", b(0.0, 0.0, 500.0, 20.0)).with_text("Deep paragraph")),
            )]);
        let out = extractor().extract(&root).unwrap();
        assert_eq!(out.records[0].parent_id, None);
        assert_eq!(out.records[1].parent_id.as_deref(), Some("news"));
        assert_eq!(out.records[2].parent_id.as_deref(), Some("news"));
    }

    #[test]
    fn scroll_offsets_page_coordinates() {
        let ex = FeatureExtractor::new(
            ExtractConfig::default(),
            BudgetConfig::default(),
            &PageMetrics::new(1000.0, 3000.0).with_scroll(0.0, 500.0),
        );
        let root = page(vec![SnapshotNode::element("p", b(10.0, 20.0, 100.0, 20.0)).with_text("Scrolled text")]);
        let out = ex.extract(&root).unwrap();
        assert_eq!(out.records[0].bounds, b(10.0, 520.0, 100.0, 20.0));
    }
}
