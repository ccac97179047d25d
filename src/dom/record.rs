use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::classify::SemanticType;
use crate::dom::Bounds;

/// Page-region role of a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleType {
    Header,
    Nav,
    Article,
    Aside,
    Footer,
    #[default]
    Generic,
}

impl RoleType {
    pub fn label(self) -> &'static str {
        match self {
            RoleType::Header => "Header",
            RoleType::Nav => "Navigation",
            RoleType::Article => "Article",
            RoleType::Aside => "Sidebar",
            RoleType::Footer => "Footer",
            RoleType::Generic => "Section",
        }
    }
}

/// Classifier signal telling the grouper this element may define a section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionHint {
    pub is_candidate: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_type: Option<RoleType>,
}

/// Where an element's image came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageSource {
    /// `<img src>` on the element itself
    Own,
    /// CSS `background-image: url(...)`
    Background,
    /// First `<img>` found among descendants
    Descendant,
}

/// Resolution state of an image reference.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum ImageStatus {
    /// Not yet handed to a resolver
    #[default]
    Pending,
    /// Resolver produced an embeddable copy
    #[serde(rename_all = "camelCase")]
    Embedded { data_uri: String, width: u32, height: u32 },
    /// Resolver failed; `src` is kept for retry/display
    NeedsFallback,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRef {
    /// Absolute URL when the page URL is known, raw attribute value otherwise.
    pub src: String,
    pub source: ImageSource,
    /// Cross-origin: the renderer must fetch it through a proxy.
    pub needs_proxy: bool,
    #[serde(default)]
    pub status: ImageStatus,
}

/// Title/summary/body pulled from an article-like element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleDigest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl ArticleDigest {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.summary.is_none() && self.body.is_none()
    }
}

/// One qualifying rendered element, normalized.
///
/// Created once per scan; immutable once classified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementRecord {
    /// Position in document pre-order; tie-break only.
    pub order: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub tag_name: String,
    pub semantic_type: SemanticType,
    #[serde(default)]
    pub class_names: BTreeSet<String>,
    /// Nearest ancestor carrying an id. A hint, not ownership.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    pub bounds: Bounds,
    pub depth: u32,
    pub stack_order: u32,
    pub is_interactive: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub article: Option<ArticleDigest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_hint: Option<SectionHint>,
    /// Painted background colour, used for flat-layout districts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<[f32; 4]>,
}

impl ElementRecord {
    pub fn area(&self) -> f32 {
        self.bounds.area()
    }

    pub fn has_meaningful_text(&self) -> bool {
        self.text.as_deref().map_or(false, |t| !t.is_empty())
    }

    /// Carries something a viewer would look at.
    pub fn has_content(&self) -> bool {
        self.image.is_some() || self.article.is_some() || self.has_meaningful_text()
    }

    pub fn is_section_candidate(&self) -> bool {
        self.section_hint.as_ref().map_or(false, |h| h.is_candidate)
    }

    /// Shapes the page even without content of its own.
    pub fn is_structural(&self) -> bool {
        self.is_section_candidate()
            || matches!(
                self.semantic_type,
                SemanticType::Navigation
                    | SemanticType::Header
                    | SemanticType::Container
                    | SemanticType::List
            )
    }

    /// Short human label: article title, then text.
    pub fn label(&self) -> Option<&str> {
        self.article
            .as_ref()
            .and_then(|a| a.title.as_deref())
            .or(self.text.as_deref())
    }
}
