//! Element classification.
//!
//! `semantic_type` is resolved from an ordered rule table: the first rule
//! whose predicate matches wins, so precedence is data and can be tested
//! apart from traversal. Section hints are resolved separately; every
//! signal is reported and the grouper decides what to do with them.

pub mod clean;

use serde::{Deserialize, Serialize};

use crate::dom::{RoleType, SectionHint};
use clean::{clean_text, is_utility_class};

/// Closed set of element roles used by layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SemanticType {
    Navigation,
    Header,
    List,
    Image,
    Interactive,
    Form,
    Media,
    Container,
    Text,
    Other,
}

/// Raw per-element facts the classifier looks at.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassifyInput<'a> {
    /// Lowercase tag name
    pub tag: &'a str,
    pub id: Option<&'a str>,
    /// Raw `class` attribute (utility classes included)
    pub class_attr: Option<&'a str>,
    pub role: Option<&'a str>,
    pub has_background_image: bool,
}

impl ClassifyInput<'_> {
    fn id_or_class_contains(&self, needle: &str) -> bool {
        let hit = |s: Option<&str>| s.map_or(false, |v| v.to_ascii_lowercase().contains(needle));
        hit(self.id) || hit(self.class_attr)
    }
}

/// One row of the precedence table.
pub struct Rule {
    pub name: &'static str,
    pub matches: fn(&ClassifyInput<'_>) -> bool,
    pub semantic: SemanticType,
}

const HEADING_TAGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6", "hgroup"];
const LIST_TAGS: &[&str] = &["ul", "ol", "dl", "li", "dt", "dd", "menu"];
const IMAGE_TAGS: &[&str] = &["img", "picture", "svg"];
const FORM_TAGS: &[&str] = &["form", "input", "select", "textarea", "label", "fieldset", "option", "legend"];
const MEDIA_TAGS: &[&str] = &["video", "audio", "iframe", "canvas", "embed", "object"];
const CONTAINER_TAGS: &[&str] = &[
    "div", "section", "article", "main", "aside", "header", "footer", "figure", "table",
    "thead", "tbody", "tr", "td", "th", "blockquote", "details", "address",
];
const TEXT_TAGS: &[&str] = &[
    "p", "span", "strong", "em", "b", "i", "u", "small", "code", "pre", "mark", "cite", "q",
    "abbr", "time", "figcaption", "summary", "sup", "sub",
];

/// Precedence, first match wins.
pub const RULES: &[Rule] = &[
    Rule {
        name: "navigation",
        matches: |i| {
            i.tag == "nav"
                || i.role == Some("navigation")
                || i.id_or_class_contains("nav")
                || i.id_or_class_contains("menu")
        },
        semantic: SemanticType::Navigation,
    },
    Rule { name: "heading", matches: |i| HEADING_TAGS.contains(&i.tag), semantic: SemanticType::Header },
    Rule { name: "list", matches: |i| LIST_TAGS.contains(&i.tag), semantic: SemanticType::List },
    Rule {
        name: "image",
        matches: |i| IMAGE_TAGS.contains(&i.tag) || i.has_background_image,
        semantic: SemanticType::Image,
    },
    Rule {
        name: "interactive",
        matches: |i| i.tag == "button" || i.tag == "a",
        semantic: SemanticType::Interactive,
    },
    Rule { name: "form", matches: |i| FORM_TAGS.contains(&i.tag), semantic: SemanticType::Form },
    Rule { name: "media", matches: |i| MEDIA_TAGS.contains(&i.tag), semantic: SemanticType::Media },
    Rule { name: "container", matches: |i| CONTAINER_TAGS.contains(&i.tag), semantic: SemanticType::Container },
    Rule { name: "text", matches: |i| TEXT_TAGS.contains(&i.tag), semantic: SemanticType::Text },
];

/// Resolve an element's semantic type.
pub fn classify(input: &ClassifyInput<'_>) -> SemanticType {
    RULES
        .iter()
        .find(|rule| (rule.matches)(input))
        .map_or(SemanticType::Other, |rule| rule.semantic)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Section hints
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

const LANDMARK_TAGS: &[&str] = &["section", "article", "main", "aside", "nav", "header", "footer"];
const SECTION_ROLES: &[&str] = &["region", "article", "main"];

/// Class keywords that mark a region, with the role they imply.
const SECTION_KEYWORDS: &[(&str, RoleType)] = &[
    ("navbar", RoleType::Nav),
    ("nav", RoleType::Nav),
    ("menu", RoleType::Nav),
    ("header", RoleType::Header),
    ("hero", RoleType::Header),
    ("banner", RoleType::Header),
    ("footer", RoleType::Footer),
    ("sidebar", RoleType::Aside),
    ("article", RoleType::Article),
    ("post", RoleType::Article),
    ("content", RoleType::Article),
    ("section", RoleType::Generic),
    ("feature", RoleType::Generic),
];

/// Thresholds for the "big identified div" signal.
#[derive(Debug, Clone, Copy)]
pub struct DivSectionRule {
    pub min_width: f32,
    pub min_height: f32,
    /// Strictly more element children than this.
    pub min_children: usize,
}

impl Default for DivSectionRule {
    fn default() -> Self {
        Self {
            min_width: 300.0,
            min_height: 150.0,
            min_children: 3,
        }
    }
}

/// Facts needed to decide whether an element opens a section.
#[derive(Debug, Clone, Copy, Default)]
pub struct HintInput<'a> {
    pub tag: &'a str,
    pub id: Option<&'a str>,
    pub class_attr: Option<&'a str>,
    pub role: Option<&'a str>,
    pub aria_label: Option<&'a str>,
    /// Text of the first element child, when that child is a heading.
    pub leading_heading: Option<&'a str>,
    pub width: f32,
    pub height: f32,
    pub element_children: usize,
}

/// Resolve section candidacy. `None` when no signal fires.
///
/// Suggested name: `aria-label`, then leading heading text. Id and class
/// fallbacks are applied by the grouper.
pub fn section_hint(input: &HintInput<'_>, rule: &DivSectionRule) -> Option<SectionHint> {
    let keyword_role = input.class_attr.and_then(|classes| {
        classes
            .split_whitespace()
            .filter(|c| !is_utility_class(c))
            .find_map(|c| {
                let lower = c.to_ascii_lowercase();
                SECTION_KEYWORDS
                    .iter()
                    .find(|(kw, _)| lower.contains(kw))
                    .map(|(_, role)| *role)
            })
    });

    let by_tag = LANDMARK_TAGS.contains(&input.tag);
    let by_role = input.role.map_or(false, |r| SECTION_ROLES.contains(&r));
    let by_heading = input.leading_heading.is_some();
    let by_size = input.tag == "div"
        && input.id.map_or(false, |id| !id.trim().is_empty())
        && input.width >= rule.min_width
        && input.height >= rule.min_height
        && input.element_children > rule.min_children;

    if !(by_tag || keyword_role.is_some() || by_role || by_heading || by_size) {
        return None;
    }

    let role_type = role_from_tag(input.tag)
        .or_else(|| input.role.and_then(role_from_aria))
        .or(keyword_role)
        .unwrap_or(RoleType::Generic);

    let suggested_name = input
        .aria_label
        .map(clean_text)
        .filter(|s| !s.is_empty())
        .or_else(|| input.leading_heading.map(clean_text).filter(|s| !s.is_empty()));

    Some(SectionHint {
        is_candidate: true,
        suggested_name,
        role_type: Some(role_type),
    })
}

fn role_from_tag(tag: &str) -> Option<RoleType> {
    match tag {
        "nav" => Some(RoleType::Nav),
        "header" => Some(RoleType::Header),
        "footer" => Some(RoleType::Footer),
        "aside" => Some(RoleType::Aside),
        "article" | "main" => Some(RoleType::Article),
        "section" => Some(RoleType::Generic),
        _ => None,
    }
}

fn role_from_aria(role: &str) -> Option<RoleType> {
    match role {
        "navigation" => Some(RoleType::Nav),
        "banner" => Some(RoleType::Header),
        "contentinfo" => Some(RoleType::Footer),
        "complementary" => Some(RoleType::Aside),
        "article" | "main" => Some(RoleType::Article),
        "region" => Some(RoleType::Generic),
        _ => None,
    }
}

pub fn is_heading_tag(tag: &str) -> bool {
    HEADING_TAGS[..6].contains(&tag)
}
