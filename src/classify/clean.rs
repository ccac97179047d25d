//! Content cleaning.
//!
//! Rendered text on framework-heavy pages leaks class names and generated
//! ids. These helpers strip that noise from text, class lists and section
//! names before anything reaches a viewer.

use std::collections::BTreeSet;

/// Utility-class conventions (layout, spacing, sizing, colour, state hooks).
const UTILITY_PREFIXES: &[&str] = &[
    "d-", "p-", "px-", "py-", "pt-", "pb-", "pl-", "pr-", "m-", "mx-", "my-", "mt-", "mb-",
    "ml-", "mr-", "w-", "h-", "min-w-", "min-h-", "max-w-", "max-h-", "text-", "bg-",
    "border", "rounded", "flex", "grid", "col-", "row-", "gap-", "space-", "justify-",
    "items-", "align-", "self-", "font-", "leading-", "tracking-", "shadow", "opacity-",
    "z-", "top-", "left-", "right-", "bottom-", "inset-", "overflow-", "js-", "is-", "has-",
    "u-", "sm:", "md:", "lg:", "xl:", "hover:", "focus:", "css-", "sc-",
];

/// Prefixes that also start ordinary hyphenated words (`top-rated`,
/// `self-driving`). In text they only count with a utility-looking value.
const AMBIGUOUS_PREFIXES: &[&str] = &[
    "top-", "left-", "right-", "bottom-", "self-", "space-", "text-", "w-", "h-", "inset-",
];

/// Values that mark an ambiguous prefix as a utility class.
const UTILITY_VALUES: &[&str] = &[
    "auto", "full", "screen", "fit", "min", "max", "px", "start", "end", "center", "stretch",
    "baseline", "left", "right", "justify", "xs", "sm", "md", "lg", "xl", "white", "black",
    "transparent", "hidden",
];

/// Generated SVG filter primitive names that show up as stray text.
const SVG_FILTER_PRIMITIVES: &[&str] = &[
    "feblend", "fecolormatrix", "fecomponenttransfer", "fecomposite", "feconvolvematrix",
    "fediffuselighting", "fedisplacementmap", "fedropshadow", "feflood", "fegaussianblur",
    "feimage", "femerge", "femergenode", "femorphology", "feoffset", "fespecularlighting",
    "fetile", "feturbulence",
];

/// Prefix tokens stripped from ids/classes before they become section names.
const NAME_PREFIXES: &[&str] = &["section-", "wp-block-", "site-", "page-", "js-", "c-", "l-", "o-"];

/// Shortest cleaned text worth keeping.
const MIN_TEXT_CHARS: usize = 3;

pub fn is_utility_class(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    UTILITY_PREFIXES.iter().any(|p| lower.starts_with(p))
}

/// Lowercase ASCII with class punctuation only; prose words fail this.
fn is_class_shaped(token: &str) -> bool {
    !token.is_empty()
        && token
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || "-_:/.[]#".contains(c))
}

/// A token inside text that is a leaked class name: `px-4`, `text-gray-500`,
/// `md:grid`, `js-abc123`. Bare words like `flex` do not count here.
fn is_leaked_class(token: &str) -> bool {
    if !is_class_shaped(token) {
        return false;
    }
    UTILITY_PREFIXES.iter().any(|p| {
        let prefix = if p.ends_with('-') || p.ends_with(':') {
            p.to_string()
        } else {
            format!("{p}-")
        };
        let Some(value) = token.strip_prefix(prefix.as_str()) else {
            return false;
        };
        if value.is_empty() {
            return false;
        }
        if AMBIGUOUS_PREFIXES.contains(&prefix.as_str()) {
            value.chars().any(|c| c.is_ascii_digit()) || UTILITY_VALUES.contains(&value)
        } else {
            true
        }
    })
}

/// A bare hyphenless utility (`flex`, `grid`), exact and lowercase.
fn is_bare_utility(token: &str) -> bool {
    is_class_shaped(token) && UTILITY_PREFIXES.iter().any(|p| !p.ends_with('-') && !p.ends_with(':') && token == *p)
}

/// Split a `class` attribute, keeping only meaningful names.
pub fn filter_class_names(class_attr: &str) -> BTreeSet<String> {
    class_attr
        .split_whitespace()
        .filter(|c| !is_utility_class(c))
        .map(|c| c.to_string())
        .collect()
}

/// A whole string that reads like machine output rather than prose.
pub fn is_technical_token(s: &str) -> bool {
    if s.is_empty() || s.chars().any(char::is_whitespace) {
        return false;
    }
    let lower = s.to_ascii_lowercase();
    if SVG_FILTER_PRIMITIVES.contains(&lower.as_str()) {
        return true;
    }

    let has_digit = s.chars().any(|c| c.is_ascii_digit());
    let has_alpha = s.chars().any(|c| c.is_ascii_alphabetic());

    // id-like run: a1b2c3, css-1x9k2z, __next_4f2a
    let id_like = s.chars().count() >= 5
        && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        && has_digit
        && has_alpha;

    // short alpha + digits: sc12, x9, jsx42
    let alpha_len = s.chars().take_while(|c| c.is_ascii_alphabetic()).count();
    let short_alpha_digits = (1..=4).contains(&alpha_len)
        && s.len() > alpha_len
        && s[alpha_len..].chars().all(|c| c.is_ascii_digit());

    id_like || short_alpha_digits
}

/// Strip leaked class names and technical tokens; collapse whitespace.
///
/// Bare utilities such as `flex` are dropped only when the whole text is a
/// class list, so prose like "the power grid" survives. Returns an empty
/// string when nothing readable is left.
pub fn clean_text(raw: &str) -> String {
    let tokens: Vec<&str> = raw.split_whitespace().collect();
    if tokens.iter().all(|t| is_leaked_class(t) || is_bare_utility(t)) {
        return String::new();
    }
    let collapsed = tokens
        .into_iter()
        .filter(|t| !is_leaked_class(t))
        .collect::<Vec<_>>()
        .join(" ");

    if is_technical_token(&collapsed) || collapsed.chars().count() < MIN_TEXT_CHARS {
        return String::new();
    }
    collapsed
}

/// Cut to at most `cap` chars on a char boundary, marking the cut with `…`.
pub fn truncate_chars(s: &str, cap: usize) -> String {
    if s.chars().count() <= cap {
        return s.to_string();
    }
    if cap == 0 {
        return String::new();
    }
    let mut out: String = s.chars().take(cap - 1).collect();
    out = out.trim_end().to_string();
    out.push('…');
    out
}

/// Turn an id/class/label into a display name: `site-main_news` → `Main News`.
pub fn prettify_name(raw: &str) -> String {
    let mut name = raw.trim().to_string();
    let lower = name.to_ascii_lowercase();
    if let Some(prefix) = NAME_PREFIXES.iter().find(|p| lower.starts_with(*p) && lower.len() > p.len()) {
        name = name[prefix.len()..].to_string();
    }

    name.split(|c: char| c == '-' || c == '_' || c == '.' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .map(title_case)
        .collect::<Vec<_>>()
        .join(" ")
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaked_classes_clean_to_empty() {
        assert_eq!(clean_text("d-flex js-abc123"), "");
    }

    #[test]
    fn prose_passes_through() {
        assert_eq!(clean_text("Contact Us"), "Contact Us");
        assert_eq!(clean_text("  Read   the\n full story "), "Read the full story");
    }

    #[test]
    fn hyphenated_and_prefixed_prose_survives() {
        for prose in [
            "Flexible working hours",
            "Top-rated self-driving cars",
            "Grid outage hits city",
            "Left-handed scissors",
            "the power grid failed",
            "a text-based adventure",
            "top-rated and left-handed",
        ] {
            assert_eq!(clean_text(prose), prose);
        }
    }

    #[test]
    fn class_lists_in_text_are_stripped() {
        assert_eq!(clean_text("flex items-center"), "");
        assert_eq!(clean_text("Sale text-red-500 today"), "Sale today");
        assert_eq!(clean_text("Menu md:hidden w-full"), "Menu");
        assert_eq!(clean_text("Open top-0 left-1/2 drawer"), "Open drawer");
    }

    #[test]
    fn technical_tokens() {
        assert!(is_technical_token("a1b2c3"));
        assert!(is_technical_token("sc12"));
        assert!(is_technical_token("feGaussianBlur"));
        assert!(!is_technical_token("Welcome"));
        assert!(!is_technical_token("2024"));
        assert!(!is_technical_token("Contact Us"));
        assert_eq!(clean_text("css-1x9k2z"), "");
    }

    #[test]
    fn short_results_are_dropped() {
        assert_eq!(clean_text("OK"), "");
        assert_eq!(clean_text("mt-4 Go"), "");
    }

    #[test]
    fn class_filter_keeps_semantic_names() {
        let kept = filter_class_names("card px-4 bg-white news-item flex md:grid");
        let names: Vec<&str> = kept.iter().map(|s| s.as_str()).collect();
        assert_eq!(names, vec!["card", "news-item"]);
    }

    #[test]
    fn truncation_respects_cap() {
        let t = truncate_chars("abcdefghij", 5);
        assert_eq!(t.chars().count(), 5);
        assert!(t.ends_with('…'));
        assert_eq!(truncate_chars("short", 10), "short");
    }

    #[test]
    fn names_are_prettified() {
        assert_eq!(prettify_name("section-latest_news"), "Latest News");
        assert_eq!(prettify_name("mainContent"), "Maincontent");
        assert_eq!(prettify_name("site-footer"), "Footer");
    }
}
