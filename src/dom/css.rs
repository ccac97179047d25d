//! Lightweight CSS property extraction.
//!
//! Parses inline `style=""` attributes into the small set of resolved
//! properties the feature extractor reads: visibility, stacking, cursor,
//! background and explicit sizing.

use serde::{Deserialize, Serialize};

/// Resolved visual properties of one rendered element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StyleProps {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub z_index: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<[f32; 4]>,
    /// Raw `background-image` value, e.g. `url("hero.jpg")`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f32>,
}

impl StyleProps {
    /// `display:none`, `visibility:hidden|collapse`, or fully transparent.
    pub fn is_hidden(&self) -> bool {
        let display_none = self.display.as_deref() == Some("none");
        let invisible = matches!(self.visibility.as_deref(), Some("hidden") | Some("collapse"));
        let transparent = self.opacity.map_or(false, |o| o <= 0.0);
        display_none || invisible || transparent
    }

    /// Resolved stacking order; `auto` and negative values collapse to 0.
    pub fn stack_order(&self) -> u32 {
        self.z_index.map_or(0, |z| z.max(0) as u32)
    }

    pub fn has_pointer_cursor(&self) -> bool {
        self.cursor.as_deref() == Some("pointer")
    }

    /// URL inside `background-image: url(...)`, if any.
    pub fn background_url(&self) -> Option<String> {
        self.background_image.as_deref().and_then(parse_css_url)
    }

    /// A background colour that actually paints something.
    pub fn painted_background(&self) -> Option<[f32; 4]> {
        self.background_color.filter(|c| c[3] > 0.0)
    }
}

/// Parse an inline `style="..."` attribute value.
pub fn parse_inline_style(style: &str) -> StyleProps {
    let mut props = StyleProps::default();
    for decl in style.split(';') {
        let parts: Vec<&str> = decl.splitn(2, ':').collect();
        if parts.len() != 2 {
            continue;
        }
        let prop = parts[0].trim().to_lowercase();
        let val = parts[1].trim().trim_end_matches("!important").trim();
        match prop.as_str() {
            "display" => props.display = Some(val.to_lowercase()),
            "visibility" => props.visibility = Some(val.to_lowercase()),
            "opacity" => props.opacity = val.parse::<f32>().ok().map(|o| o.clamp(0.0, 1.0)),
            "z-index" => props.z_index = val.parse::<i32>().ok(),
            "cursor" => props.cursor = Some(val.to_lowercase()),
            "background-color" => props.background_color = parse_css_color(val),
            "background" => {
                if val.contains("url(") {
                    props.background_image = Some(val.to_string());
                }
                let first = val.split_whitespace().next().unwrap_or("");
                props.background_color = parse_css_color(val).or_else(|| parse_css_color(first));
            }
            "background-image" => {
                if val != "none" {
                    props.background_image = Some(val.to_string());
                }
            }
            "font-size" => props.font_size = parse_css_size(val),
            "width" => props.width = parse_css_size(val),
            "height" => props.height = parse_css_size(val),
            _ => {}
        }
    }
    props
}

/// Pull the target out of `url(...)`, stripping optional quotes.
pub fn parse_css_url(val: &str) -> Option<String> {
    let start = val.find("url(")? + 4;
    let rest = &val[start..];
    let end = rest.find(')')?;
    let inner = rest[..end].trim().trim_matches(|c| c == '"' || c == '\'').trim();
    if inner.is_empty() {
        None
    } else {
        Some(inner.to_string())
    }
}

/// Parse a CSS color value into [r, g, b, a] (0.0–1.0).
pub fn parse_css_color(val: &str) -> Option<[f32; 4]> {
    let v = val.trim().to_lowercase();

    // Named colours (common subset)
    let named = match v.as_str() {
        "black" => Some([0.0, 0.0, 0.0, 1.0]),
        "white" => Some([1.0, 1.0, 1.0, 1.0]),
        "red" => Some([1.0, 0.0, 0.0, 1.0]),
        "green" => Some([0.0, 0.5, 0.0, 1.0]),
        "blue" => Some([0.0, 0.0, 1.0, 1.0]),
        "yellow" => Some([1.0, 1.0, 0.0, 1.0]),
        "orange" => Some([1.0, 0.647, 0.0, 1.0]),
        "purple" => Some([0.5, 0.0, 0.5, 1.0]),
        "gray" | "grey" => Some([0.5, 0.5, 0.5, 1.0]),
        "transparent" => Some([0.0, 0.0, 0.0, 0.0]),
        _ => None,
    };
    if named.is_some() {
        return named;
    }

    // Hex: #rgb, #rrggbb, #rrggbbaa
    if let Some(hex) = v.strip_prefix('#') {
        if !hex.is_ascii() {
            return None;
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).ok().map(|c| c as f32 / 255.0);
        return match hex.len() {
            3 => {
                let r = u8::from_str_radix(&hex[0..1], 16).ok()? * 17;
                let g = u8::from_str_radix(&hex[1..2], 16).ok()? * 17;
                let b = u8::from_str_radix(&hex[2..3], 16).ok()? * 17;
                Some([r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, 1.0])
            }
            6 => Some([channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?, 1.0]),
            8 => Some([
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
                channel(&hex[6..8])?,
            ]),
            _ => None,
        };
    }

    // rgb(r, g, b) / rgba(r, g, b, a)
    if v.starts_with("rgb") {
        let inner = v
            .trim_start_matches("rgba(")
            .trim_start_matches("rgb(")
            .trim_end_matches(')');
        let nums: Vec<f32> = inner
            .split(',')
            .filter_map(|s| s.trim().parse::<f32>().ok())
            .collect();
        if nums.len() >= 3 {
            let r = nums[0] / 255.0;
            let g = nums[1] / 255.0;
            let b = nums[2] / 255.0;
            let a = if nums.len() >= 4 { nums[3] } else { 1.0 };
            return Some([r.clamp(0.0, 1.0), g.clamp(0.0, 1.0), b.clamp(0.0, 1.0), a.clamp(0.0, 1.0)]);
        }
    }

    None
}

/// Parse a CSS size value (px or plain number).
pub fn parse_css_size(val: &str) -> Option<f32> {
    let v = val.trim().to_lowercase();
    let num_str = v.trim_end_matches("px");
    num_str.parse::<f32>().ok()
}
