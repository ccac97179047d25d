//! Scene graph and the Layout Engine.
//!
//! Turns grouped sections into positioned placements using one of two
//! interchangeable strategies:
//!   - `room` — each section is a walled cell (ring or grid) with exhibits
//!     hung round-robin on its walls
//!   - `flat` — the page is laid on the ground plane, elements lifted by
//!     their stack order, coloured containers emitted as districts
//!
//! Coordinates: meters, Y up. Page +X maps to scene +X, page +Y (down the
//! page) maps to scene +Z.

pub mod flat;
pub mod lod;
pub mod room;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::dom::{ElementRecord, PageMetrics};
use crate::section::Section;

pub use flat::FlatConfig;
pub use lod::{CameraPose, LodConfig, LodManager, LodStats, Material};
pub use room::RoomConfig;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Geometry
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 0.0 };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Squared distance; compare against squared thresholds to skip the sqrt.
    pub fn distance_squared(&self, other: &Vec3) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx * dx + dy * dy + dz * dz
    }

    pub fn distance(&self, other: &Vec3) -> f32 {
        self.distance_squared(other).sqrt()
    }
}

/// Visibility/fidelity level of a placement. Owned by the LOD manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[default]
    Full,
    Reduced,
    Hidden,
}

/// One wall of a room cell. North faces -Z.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Wall {
    North,
    East,
    South,
    West,
}

impl Wall {
    /// Round-robin order used when hanging exhibits.
    pub const CYCLE: [Wall; 4] = [Wall::North, Wall::East, Wall::South, Wall::West];

    /// Yaw of an exhibit hung on this wall, facing into the room.
    pub fn facing(self) -> f32 {
        match self {
            Wall::North => 0.0,
            Wall::South => std::f32::consts::PI,
            Wall::East => -std::f32::consts::FRAC_PI_2,
            Wall::West => std::f32::consts::FRAC_PI_2,
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  SceneGraph
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A positioned instance of a record. Everything except `tier` is fixed
/// once laid out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    /// Stable key for LOD side tables (index into `SceneGraph::placements`).
    pub id: usize,
    pub record: ElementRecord,
    pub position: Vec3,
    /// Yaw in radians
    pub rotation: f32,
    /// Width and height of the exhibit face in meters
    pub size: [f32; 2],
    /// Owning section; `null` for flat placements outside every section
    #[serde(default)]
    pub section_index: Option<usize>,
    #[serde(default)]
    pub tier: Tier,
}

/// Space allocated to one section, even when it holds no placements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionRegion {
    pub index: usize,
    pub center: Vec3,
    /// X and Z extent in meters
    pub extent: [f32; 2],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub door: Option<Wall>,
}

/// Ground-level coloured plane under a container with a painted background.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct District {
    #[serde(default)]
    pub section_index: Option<usize>,
    pub center: Vec3,
    pub size: [f32; 2],
    pub color: [f32; 4],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    #[default]
    Room,
    Flat,
}

impl FromStr for LayoutMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "room" | "rooms" => Ok(LayoutMode::Room),
            "flat" => Ok(LayoutMode::Flat),
            other => Err(format!("unknown layout strategy '{other}' (expected room or flat)")),
        }
    }
}

impl fmt::Display for LayoutMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LayoutMode::Room => "room",
            LayoutMode::Flat => "flat",
        })
    }
}

/// Compiler output. Read-only for renderers; only `Placement::tier` changes
/// after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneGraph {
    pub strategy: LayoutMode,
    pub sections: Vec<Section>,
    pub placements: Vec<Placement>,
    pub regions: Vec<SectionRegion>,
    #[serde(default)]
    pub districts: Vec<District>,
    pub origin: Vec3,
    /// Meters per CSS pixel
    pub scale: f32,
}

impl SceneGraph {
    pub fn placements_in(&self, section_index: usize) -> impl Iterator<Item = &Placement> {
        self.placements
            .iter()
            .filter(move |p| p.section_index == Some(section_index))
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  LayoutEngine
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub mode: LayoutMode,
    pub room: RoomConfig,
    pub flat: FlatConfig,
}

pub struct LayoutEngine {
    cfg: LayoutConfig,
}

impl LayoutEngine {
    pub fn new(cfg: LayoutConfig) -> Self {
        Self { cfg }
    }

    /// Lay out grouped sections. `records` is the full extraction; the flat
    /// strategy places every exhibit in it, grouped or not.
    pub fn layout(&self, sections: Vec<Section>, records: &[ElementRecord], metrics: &PageMetrics) -> SceneGraph {
        let scene = match self.cfg.mode {
            LayoutMode::Room => room::layout(sections, &self.cfg.room),
            LayoutMode::Flat => flat::layout(sections, records, metrics, &self.cfg.flat),
        };
        log::debug!(
            "{} layout: {} sections, {} placements, {} districts",
            scene.strategy,
            scene.sections.len(),
            scene.placements.len(),
            scene.districts.len()
        );
        scene
    }
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new(LayoutConfig::default())
    }
}

/// Records worth a placement: something to show or something to click.
pub(crate) fn is_exhibit(record: &ElementRecord) -> bool {
    record.has_content() || record.is_interactive
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_parses_case_insensitively() {
        assert_eq!("Flat".parse::<LayoutMode>(), Ok(LayoutMode::Flat));
        assert_eq!("room".parse::<LayoutMode>(), Ok(LayoutMode::Room));
        assert!("maze".parse::<LayoutMode>().is_err());
    }

    #[test]
    fn wall_facings_are_distinct() {
        let mut yaws: Vec<f32> = Wall::CYCLE.iter().map(|w| w.facing()).collect();
        yaws.sort_by(f32::total_cmp);
        yaws.dedup();
        assert_eq!(yaws.len(), 4);
    }

    #[test]
    fn distance() {
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(3.0, 4.0, 0.0);
        assert_eq!(a.distance_squared(&b), 25.0);
        assert_eq!(a.distance(&b), 5.0);
    }
}
