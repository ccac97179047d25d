//! LOD Manager.
//!
//! Assigns a fidelity tier to every placement from camera distance. It
//! owns a side table of materials keyed by placement id so the scene graph
//! stays free of renderer bookkeeping:
//!   - `active` — the material currently shown for a placement
//!   - `stash`  — the full material parked while a reduced one is shown
//!
//! Driven every render tick; evaluation self-throttles to `cadence`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{LayoutMode, Placement, SceneGraph, Tier, Vec3};
use crate::classify::clean::truncate_chars;
use crate::dom::ImageStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LodConfig {
    /// Within this distance placements are full fidelity (meters)
    pub full_distance: f32,
    /// Within this distance placements are reduced; beyond, hidden
    pub reduced_distance: f32,
    /// Rooms whose center is farther than this are culled whole
    pub section_cull_distance: f32,
    /// Evaluate once per this many ticks
    pub cadence: u64,
    pub reduced_label_chars: usize,
}

impl Default for LodConfig {
    fn default() -> Self {
        Self {
            full_distance: 20.0,
            reduced_distance: 45.0,
            section_cull_distance: 70.0,
            cadence: 6,
            reduced_label_chars: 24,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CameraPose {
    pub position: Vec3,
    #[serde(default)]
    pub yaw: f32,
    #[serde(default)]
    pub pitch: f32,
}

impl CameraPose {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }
}

/// What the renderer draws for one placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Image URL or embedded data URI
    pub texture: Option<String>,
    pub label: Option<String>,
    pub opacity: f32,
}

impl Material {
    pub fn full(placement: &Placement) -> Self {
        let record = &placement.record;
        let texture = record.image.as_ref().map(|img| match &img.status {
            ImageStatus::Embedded { data_uri, .. } => data_uri.clone(),
            _ => img.src.clone(),
        });
        Self {
            texture,
            label: record.label().map(str::to_string),
            opacity: 1.0,
        }
    }

    /// Low-fidelity substitute: no texture, short label, dimmed.
    pub fn reduced(&self, label_chars: usize) -> Self {
        Self {
            texture: None,
            label: self.label.as_deref().map(|l| truncate_chars(l, label_chars)),
            opacity: 0.6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LodStats {
    pub full: usize,
    pub reduced: usize,
    pub hidden: usize,
    pub culled_sections: usize,
    /// Side-table writes made by this evaluation
    pub writes: u64,
}

pub struct LodManager {
    cfg: LodConfig,
    ticks: u64,
    active: BTreeMap<usize, Material>,
    stash: BTreeMap<usize, Material>,
    writes: u64,
}

impl LodManager {
    pub fn new(cfg: LodConfig) -> Self {
        Self {
            cfg,
            ticks: 0,
            active: BTreeMap::new(),
            stash: BTreeMap::new(),
            writes: 0,
        }
    }

    /// Call every render tick. Evaluates on the first tick and then once
    /// per `cadence`; returns stats only when it evaluated.
    pub fn tick(&mut self, scene: &mut SceneGraph, camera: &CameraPose) -> Option<LodStats> {
        let due = self.ticks % self.cfg.cadence.max(1) == 0;
        self.ticks += 1;
        due.then(|| self.update(scene, camera))
    }

    /// Re-tier every placement for this camera pose. Idempotent for an
    /// unchanged pose.
    pub fn update(&mut self, scene: &mut SceneGraph, camera: &CameraPose) -> LodStats {
        let eye = camera.position;
        let culled: Vec<bool> = match scene.strategy {
            LayoutMode::Room => {
                let limit = self.cfg.section_cull_distance * self.cfg.section_cull_distance;
                scene
                    .regions
                    .iter()
                    .map(|r| r.center.distance_squared(&eye) > limit)
                    .collect()
            }
            LayoutMode::Flat => vec![false; scene.regions.len()],
        };

        let writes_before = self.writes;
        let mut stats = LodStats {
            culled_sections: culled.iter().filter(|&&c| c).count(),
            ..Default::default()
        };

        for placement in scene.placements.iter_mut() {
            let in_culled_room = placement
                .section_index
                .and_then(|i| culled.get(i).copied())
                .unwrap_or(false);
            let tier = if in_culled_room {
                Tier::Hidden
            } else {
                self.tier_for(placement.position.distance_squared(&eye))
            };
            self.apply(placement, tier);
            match tier {
                Tier::Full => stats.full += 1,
                Tier::Reduced => stats.reduced += 1,
                Tier::Hidden => stats.hidden += 1,
            }
        }

        stats.writes = self.writes - writes_before;
        if stats.writes > 0 {
            log::debug!(
                "lod: {} full, {} reduced, {} hidden, {} rooms culled",
                stats.full,
                stats.reduced,
                stats.hidden,
                stats.culled_sections
            );
        }
        stats
    }

    fn tier_for(&self, dist_sq: f32) -> Tier {
        let full = self.cfg.full_distance * self.cfg.full_distance;
        let reduced = self.cfg.reduced_distance * self.cfg.reduced_distance;
        if dist_sq <= full {
            Tier::Full
        } else if dist_sq <= reduced {
            Tier::Reduced
        } else {
            Tier::Hidden
        }
    }

    fn apply(&mut self, placement: &mut Placement, tier: Tier) {
        let id = placement.id;
        match tier {
            Tier::Full => {
                if let Some(original) = self.stash.remove(&id) {
                    self.active.insert(id, original);
                    self.writes += 1;
                } else if !self.active.contains_key(&id) {
                    self.active.insert(id, Material::full(placement));
                    self.writes += 1;
                }
            }
            Tier::Reduced => {
                if !self.stash.contains_key(&id) {
                    let original = self
                        .active
                        .remove(&id)
                        .unwrap_or_else(|| Material::full(placement));
                    self.active
                        .insert(id, original.reduced(self.cfg.reduced_label_chars));
                    self.stash.insert(id, original);
                    self.writes += 1;
                }
            }
            // materials stay as they were
            Tier::Hidden => {}
        }
        placement.tier = tier;
    }

    /// Forget every material and restart the tick cadence. Call before
    /// driving a different scene with the same manager; placement ids are
    /// only unique within one scene.
    pub fn reset(&mut self) {
        self.active.clear();
        self.stash.clear();
        self.ticks = 0;
    }

    pub fn material(&self, id: usize) -> Option<&Material> {
        self.active.get(&id)
    }

    pub fn stashed(&self, id: usize) -> Option<&Material> {
        self.stash.get(&id)
    }

    /// Total side-table writes since construction.
    pub fn writes(&self) -> u64 {
        self.writes
    }
}

impl Default for LodManager {
    fn default() -> Self {
        Self::new(LodConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::record::fixtures::record;
    use crate::dom::{Bounds, ImageRef, ImageSource, RoleType};
    use crate::scene::SectionRegion;
    use crate::section::Section;

    fn placement(id: usize, section_index: usize, position: Vec3) -> Placement {
        let mut r = record(id, "figure", Bounds::new(0.0, 0.0, 100.0, 100.0));
        r.text = Some("A rather long caption for the picture on the wall".into());
        r.image = Some(ImageRef {
            src: format!("https://example.com/{id}.jpg"),
            source: ImageSource::Descendant,
            needs_proxy: false,
            status: ImageStatus::Pending,
        });
        Placement {
            id,
            record: r,
            position,
            rotation: 0.0,
            size: [1.0, 1.0],
            section_index: Some(section_index),
            tier: Tier::Full,
        }
    }

    fn scene(strategy: LayoutMode) -> SceneGraph {
        let section = Section {
            name: "Hall".into(),
            role_type: RoleType::Generic,
            members: Vec::new(),
            bounding_container: None,
        };
        SceneGraph {
            strategy,
            sections: vec![section.clone(), section],
            placements: vec![
                placement(0, 0, Vec3::new(0.0, 1.6, 5.0)),
                placement(1, 0, Vec3::new(0.0, 1.6, 30.0)),
                placement(2, 1, Vec3::new(0.0, 1.6, 90.0)),
                placement(3, 1, Vec3::new(0.0, 1.6, 110.0)),
            ],
            regions: vec![
                SectionRegion { index: 0, center: Vec3::new(0.0, 0.0, 10.0), extent: [12.0, 12.0], door: None },
                SectionRegion { index: 1, center: Vec3::new(0.0, 0.0, 100.0), extent: [12.0, 12.0], door: None },
            ],
            districts: Vec::new(),
            origin: Vec3::ZERO,
            scale: 0.005,
        }
    }

    fn tiers(scene: &SceneGraph) -> Vec<Tier> {
        scene.placements.iter().map(|p| p.tier).collect()
    }

    #[test]
    fn distance_bands() {
        let mut s = scene(LayoutMode::Flat);
        let mut lod = LodManager::default();
        let stats = lod.update(&mut s, &CameraPose::at(Vec3::new(0.0, 1.6, 0.0)));
        assert_eq!(tiers(&s), vec![Tier::Full, Tier::Reduced, Tier::Hidden, Tier::Hidden]);
        assert_eq!(stats.culled_sections, 0);
    }

    #[test]
    fn section_cull_overrides_member_distance() {
        let mut s = scene(LayoutMode::Room);
        let mut lod = LodManager::default();
        // standing right next to placement 2, but its room center is 100m out
        s.regions[0].center = Vec3::new(0.0, 0.0, 60.0);
        s.regions[1].center = Vec3::new(0.0, 0.0, 200.0);
        let stats = lod.update(&mut s, &CameraPose::at(Vec3::new(0.0, 1.6, 90.0)));
        assert_eq!(stats.culled_sections, 1);
        assert_eq!(s.placements[2].tier, Tier::Hidden);
    }

    #[test]
    fn update_is_idempotent() {
        let mut s = scene(LayoutMode::Room);
        let mut lod = LodManager::default();
        let cam = CameraPose::at(Vec3::new(0.0, 1.6, 0.0));
        lod.update(&mut s, &cam);
        let first = tiers(&s);
        let writes = lod.writes();
        let active: Vec<_> = (0..4).map(|i| lod.material(i).cloned()).collect();
        let stash: Vec<_> = (0..4).map(|i| lod.stashed(i).cloned()).collect();

        let stats = lod.update(&mut s, &cam);
        assert_eq!(tiers(&s), first);
        assert_eq!(stats.writes, 0);
        assert_eq!(lod.writes(), writes);
        assert_eq!((0..4).map(|i| lod.material(i).cloned()).collect::<Vec<_>>(), active);
        assert_eq!((0..4).map(|i| lod.stashed(i).cloned()).collect::<Vec<_>>(), stash);
    }

    #[test]
    fn down_then_up_restores_exactly() {
        let mut s = scene(LayoutMode::Flat);
        let mut lod = LodManager::default();
        let near = CameraPose::at(Vec3::new(0.0, 1.6, 5.0));
        let mid = CameraPose::at(Vec3::new(0.0, 1.6, -25.0));

        lod.update(&mut s, &near);
        let original = lod.material(0).cloned().unwrap();
        assert_eq!(original, Material::full(&s.placements[0]));

        lod.update(&mut s, &mid);
        assert_eq!(s.placements[0].tier, Tier::Reduced);
        let reduced = lod.material(0).unwrap();
        assert!(reduced.texture.is_none());
        assert!(reduced.label.as_ref().unwrap().chars().count() <= 24);
        assert_eq!(lod.stashed(0), Some(&original));

        lod.update(&mut s, &near);
        assert_eq!(s.placements[0].tier, Tier::Full);
        assert_eq!(lod.material(0), Some(&original));
        assert!(lod.stashed(0).is_none());
    }

    #[test]
    fn tick_throttles_to_cadence() {
        let mut s = scene(LayoutMode::Flat);
        let mut lod = LodManager::default();
        let cam = CameraPose::default();
        let evaluated = (0..13).filter(|_| lod.tick(&mut s, &cam).is_some()).count();
        // ticks 0, 6 and 12
        assert_eq!(evaluated, 3);
    }

    #[test]
    fn reset_drops_previous_scene_materials() {
        let mut lod = LodManager::default();
        let cam = CameraPose::at(Vec3::new(0.0, 1.6, -25.0));
        let mut first = scene(LayoutMode::Flat);
        lod.update(&mut first, &cam);
        assert!(lod.stashed(0).is_some());

        let mut next = scene(LayoutMode::Flat);
        next.placements[0].record.text = Some("Another page entirely".into());
        lod.reset();
        assert!(lod.material(0).is_none() && lod.stashed(0).is_none());

        lod.update(&mut next, &CameraPose::at(Vec3::new(0.0, 1.6, 5.0)));
        assert_eq!(lod.material(0), Some(&Material::full(&next.placements[0])));
        // cadence restarts: the next tick evaluates immediately
        assert!(lod.tick(&mut next, &cam).is_some());
    }

    #[test]
    fn embedded_image_feeds_texture() {
        let mut p = placement(7, 0, Vec3::ZERO);
        p.record.image.as_mut().unwrap().status = ImageStatus::Embedded {
            data_uri: "data:image/png;base64,AAAA".into(),
            width: 4,
            height: 4,
        };
        assert_eq!(Material::full(&p).texture.as_deref(), Some("data:image/png;base64,AAAA"));
    }
}
