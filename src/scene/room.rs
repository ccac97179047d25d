//! Room strategy: one walled cell per section around a shared entrance.
//!
//! Up to `ring_max` sections sit on a ring around the entrance; more fall
//! back to a grid in front of it. Each cell opens a door on the wall that
//! faces the entrance and hangs its exhibits round-robin on its walls.

use serde::{Deserialize, Serialize};

use super::{is_exhibit, LayoutMode, Placement, SceneGraph, SectionRegion, Tier, Vec3, Wall};
use crate::section::Section;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomConfig {
    /// Side length of a square room (meters)
    pub room_size: f32,
    pub wall_height: f32,
    pub ring_radius: f32,
    /// Largest section count still laid out on a ring
    pub ring_max: usize,
    /// Gap between neighbouring grid cells (meters)
    pub grid_gap: f32,
    /// Exhibits per room
    pub max_members: usize,
    /// Unusable wall length at each corner (meters)
    pub wall_margin: f32,
    /// Exhibits float this far off the wall
    pub wall_inset: f32,
    /// Eye-level height of an exhibit with stack order 0
    pub exhibit_height: f32,
    pub stack_step: f32,
    pub max_stack_steps: u32,
    /// Scale factor: pixels → meters
    pub pixel_to_meter: f32,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            room_size: 12.0,
            wall_height: 4.0,
            ring_radius: 24.0,
            ring_max: 6,
            grid_gap: 4.0,
            max_members: 20,
            wall_margin: 1.0,
            wall_inset: 0.1,
            exhibit_height: 1.6,
            stack_step: 0.25,
            max_stack_steps: 8,
            pixel_to_meter: 0.005,
        }
    }
}

impl RoomConfig {
    /// Exhibit height; a pure function of stack order.
    pub fn exhibit_y(&self, stack_order: u32) -> f32 {
        self.exhibit_height + self.stack_step * stack_order.min(self.max_stack_steps) as f32
    }
}

pub fn layout(sections: Vec<Section>, cfg: &RoomConfig) -> SceneGraph {
    let entrance = Vec3::ZERO;
    let centers = room_centers(sections.len(), cfg);

    let mut regions = Vec::with_capacity(sections.len());
    let mut placements = Vec::new();

    for (index, (section, center)) in sections.iter().zip(&centers).enumerate() {
        regions.push(SectionRegion {
            index,
            center: *center,
            extent: [cfg.room_size, cfg.room_size],
            door: Some(door_wall(center, &entrance)),
        });
        hang_exhibits(section, index, center, cfg, &mut placements);
    }

    SceneGraph {
        strategy: LayoutMode::Room,
        sections,
        placements,
        regions,
        districts: Vec::new(),
        origin: entrance,
        scale: cfg.pixel_to_meter,
    }
}

/// Room centers, ring for few sections, grid otherwise.
fn room_centers(n: usize, cfg: &RoomConfig) -> Vec<Vec3> {
    if n <= cfg.ring_max {
        return (0..n)
            .map(|i| {
                let angle = std::f32::consts::TAU * i as f32 / n as f32;
                Vec3::new(cfg.ring_radius * angle.sin(), 0.0, cfg.ring_radius * angle.cos())
            })
            .collect();
    }

    let cols = (n as f32).sqrt().ceil() as usize;
    let spacing = cfg.room_size + cfg.grid_gap;
    let half_row = (cols - 1) as f32 * 0.5;
    (0..n)
        .map(|i| {
            let (row, col) = (i / cols, i % cols);
            Vec3::new((col as f32 - half_row) * spacing, 0.0, row as f32 * spacing + spacing)
        })
        .collect()
}

/// The wall facing the entrance: dominant axis first, then sign.
pub fn door_wall(center: &Vec3, entrance: &Vec3) -> Wall {
    let dx = entrance.x - center.x;
    let dz = entrance.z - center.z;
    if dx.abs() > dz.abs() {
        if dx > 0.0 {
            Wall::East
        } else {
            Wall::West
        }
    } else if dz > 0.0 {
        Wall::South
    } else {
        Wall::North
    }
}

fn hang_exhibits(
    section: &Section,
    section_index: usize,
    center: &Vec3,
    cfg: &RoomConfig,
    out: &mut Vec<Placement>,
) {
    let exhibits: Vec<_> = section
        .members
        .iter()
        .filter(|m| is_exhibit(m))
        .take(cfg.max_members)
        .collect();
    if exhibits.is_empty() {
        return;
    }

    let n = exhibits.len();
    let per_wall = |w: usize| (n + 3 - w) / 4;
    let half = cfg.room_size * 0.5;
    let usable = (cfg.room_size - 2.0 * cfg.wall_margin).max(0.0);

    for (j, record) in exhibits.into_iter().enumerate() {
        let w = j % 4;
        let wall = Wall::CYCLE[w];
        let count = per_wall(w);
        let slot = j / 4;
        // count+1 divisions keep the end slots off the corners
        let t = -usable * 0.5 + usable * (slot + 1) as f32 / (count + 1) as f32;
        let off = half - cfg.wall_inset;

        let (dx, dz) = match wall {
            Wall::North => (t, -off),
            Wall::South => (-t, off),
            Wall::East => (off, t),
            Wall::West => (-off, -t),
        };

        out.push(Placement {
            id: out.len(),
            record: record.clone(),
            position: Vec3::new(center.x + dx, cfg.exhibit_y(record.stack_order), center.z + dz),
            rotation: wall.facing(),
            size: [
                record.bounds.width * cfg.pixel_to_meter,
                record.bounds.height * cfg.pixel_to_meter,
            ],
            section_index: Some(section_index),
            tier: Tier::Full,
        });
    }
}
