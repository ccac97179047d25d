//! Flat strategy: the page laid out on the ground plane.
//!
//! Page coordinates go through one uniform scale so the longer page side
//! spans `target_span` meters, centered on the origin. Height carries the
//! stack order. Containers with a painted background become districts.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{is_exhibit, District, LayoutMode, Placement, SceneGraph, SectionRegion, Tier, Vec3};
use crate::classify::SemanticType;
use crate::dom::{Bounds, ElementRecord, PageMetrics};
use crate::section::Section;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FlatConfig {
    /// Scene length of the longer page side (meters)
    pub target_span: f32,
    /// Height gained per stack level (meters)
    pub unit_height: f32,
}

impl Default for FlatConfig {
    fn default() -> Self {
        Self {
            target_span: 60.0,
            unit_height: 0.5,
        }
    }
}

/// Affine page → scene mapping.
#[derive(Debug, Clone, Copy)]
struct PageTransform {
    scale: f32,
    half_w: f32,
    half_h: f32,
}

impl PageTransform {
    fn new(page: Bounds, cfg: &FlatConfig) -> Self {
        let longer = page.width.max(page.height);
        let scale = if longer > 0.0 { cfg.target_span / longer } else { 1.0 };
        Self {
            scale,
            half_w: page.x + page.width * 0.5,
            half_h: page.y + page.height * 0.5,
        }
    }

    fn ground(&self, bounds: &Bounds, y: f32) -> Vec3 {
        let (cx, cy) = bounds.center();
        Vec3::new((cx - self.half_w) * self.scale, y, (cy - self.half_h) * self.scale)
    }

    fn size(&self, bounds: &Bounds) -> [f32; 2] {
        [bounds.width * self.scale, bounds.height * self.scale]
    }
}

/// Page extent: reported document size, else the union of every record.
fn page_extent(records: &[ElementRecord], metrics: &PageMetrics) -> Bounds {
    if metrics.width > 0.0 && metrics.height > 0.0 {
        return Bounds::new(0.0, 0.0, metrics.width, metrics.height);
    }
    records
        .iter()
        .map(|r| r.bounds)
        .reduce(|acc, b| acc.union(&b))
        .unwrap_or_default()
}

/// Document order → index of the section holding that record, either as a
/// member or as its bounding container.
fn owners(sections: &[Section]) -> BTreeMap<usize, usize> {
    let mut owner = BTreeMap::new();
    for (index, section) in sections.iter().enumerate() {
        for record in section.bounding_container.iter().chain(&section.members) {
            owner.insert(record.order, index);
        }
    }
    owner
}

/// Every exhibit in `records` is placed, whether or not a section claimed
/// it. Painted containers anywhere on the page become districts.
pub fn layout(
    sections: Vec<Section>,
    records: &[ElementRecord],
    metrics: &PageMetrics,
    cfg: &FlatConfig,
) -> SceneGraph {
    let tf = PageTransform::new(page_extent(records, metrics), cfg);
    let owner = owners(&sections);

    let regions = sections
        .iter()
        .enumerate()
        .map(|(index, section)| {
            let footprint = section.footprint().unwrap_or_default();
            SectionRegion {
                index,
                center: tf.ground(&footprint, 0.0),
                extent: tf.size(&footprint),
                door: None,
            }
        })
        .collect();

    let mut placements = Vec::new();
    let mut districts = Vec::new();
    for record in records {
        let section_index = owner.get(&record.order).copied();
        if let Some(district) = district_for(record, section_index, &tf) {
            districts.push(district);
        }
        if is_exhibit(record) {
            placements.push(Placement {
                id: placements.len(),
                record: record.clone(),
                position: tf.ground(&record.bounds, height(record.stack_order, cfg)),
                rotation: 0.0,
                size: tf.size(&record.bounds),
                section_index,
                tier: Tier::Full,
            });
        }
    }

    SceneGraph {
        strategy: LayoutMode::Flat,
        sections,
        placements,
        regions,
        districts,
        origin: Vec3::new(-tf.half_w * tf.scale, 0.0, -tf.half_h * tf.scale),
        scale: tf.scale,
    }
}

/// `(stackOrder + 1) × unitHeight`
pub fn height(stack_order: u32, cfg: &FlatConfig) -> f32 {
    (stack_order as f32 + 1.0) * cfg.unit_height
}

fn district_for(record: &ElementRecord, section_index: Option<usize>, tf: &PageTransform) -> Option<District> {
    if record.semantic_type != SemanticType::Container {
        return None;
    }
    let color = record.background?;
    Some(District {
        section_index,
        center: tf.ground(&record.bounds, 0.0),
        size: tf.size(&record.bounds),
        color,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::record::fixtures::record;
    use crate::dom::RoleType;

    fn page() -> PageMetrics {
        PageMetrics::new(1200.0, 3000.0)
    }

    fn text_at(order: usize, bounds: Bounds, stack: u32) -> ElementRecord {
        let mut r = record(order, "p", bounds);
        r.text = Some("Some words".into());
        r.stack_order = stack;
        r
    }

    fn catch_all(members: Vec<ElementRecord>) -> Section {
        Section {
            name: "Page".into(),
            role_type: RoleType::Generic,
            members,
            bounding_container: None,
        }
    }

    /// Everything grouped into one catch-all section.
    fn lay_out(records: Vec<ElementRecord>, metrics: &PageMetrics) -> SceneGraph {
        layout(vec![catch_all(records.clone())], &records, metrics, &FlatConfig::default())
    }

    #[test]
    fn height_from_stack_order() {
        let scene = lay_out(
            vec![
                text_at(0, Bounds::new(0.0, 0.0, 100.0, 20.0), 3),
                text_at(1, Bounds::new(0.0, 40.0, 100.0, 20.0), 0),
            ],
            &page(),
        );
        assert_eq!(scene.placements[0].position.y, 2.0);
        assert_eq!(scene.placements[1].position.y, 0.5);
    }

    #[test]
    fn longer_side_maps_to_target_span() {
        let cfg = FlatConfig::default();
        let scene = layout(vec![catch_all(Vec::new())], &[], &page(), &cfg);
        assert!((scene.scale * 3000.0 - cfg.target_span).abs() < 1e-3);
    }

    #[test]
    fn page_center_maps_to_origin() {
        let scene = lay_out(vec![text_at(0, Bounds::new(500.0, 1400.0, 200.0, 200.0), 0)], &page());
        let p = scene.placements[0].position;
        assert!(p.x.abs() < 1e-4 && p.z.abs() < 1e-4);
        // page top-left sits at the reported origin
        assert!((scene.origin.x + 600.0 * scene.scale).abs() < 1e-4);
    }

    #[test]
    fn painted_containers_become_districts() {
        let mut painted = record(0, "div", Bounds::new(0.0, 0.0, 600.0, 400.0));
        painted.semantic_type = SemanticType::Container;
        painted.background = Some([0.9, 0.2, 0.2, 1.0]);
        let mut bare = record(1, "div", Bounds::new(0.0, 500.0, 600.0, 400.0));
        bare.semantic_type = SemanticType::Container;

        let scene = lay_out(vec![painted, bare], &page());
        assert_eq!(scene.districts.len(), 1);
        assert_eq!(scene.districts[0].color, [0.9, 0.2, 0.2, 1.0]);
        assert_eq!(scene.districts[0].center.y, 0.0);
        // neither container has content, so no placements
        assert!(scene.placements.is_empty());
    }

    #[test]
    fn falls_back_to_content_extent() {
        let scene = lay_out(vec![text_at(0, Bounds::new(0.0, 0.0, 600.0, 300.0), 0)], &PageMetrics::default());
        assert!((scene.scale - 0.1).abs() < 1e-6);
    }

    #[test]
    fn ungrouped_records_and_containers_are_placed() {
        let mut article = record(0, "article", Bounds::new(0.0, 0.0, 800.0, 600.0));
        article.semantic_type = SemanticType::Container;
        article.text = Some("Headline".into());
        article.background = Some([0.1, 0.1, 0.1, 1.0]);
        let inside = text_at(1, Bounds::new(20.0, 20.0, 300.0, 40.0), 0);
        let mut loose = text_at(2, Bounds::new(0.0, 900.0, 300.0, 60.0), 1);
        loose.semantic_type = SemanticType::Container;
        loose.background = Some([0.0, 0.5, 0.0, 1.0]);

        let section = Section {
            name: "Headline".into(),
            role_type: RoleType::Article,
            members: vec![inside.clone()],
            bounding_container: Some(article.clone()),
        };
        let records = vec![article, inside, loose];
        let scene = layout(vec![section], &records, &page(), &FlatConfig::default());

        assert_eq!(scene.placements.len(), records.iter().filter(|r| is_exhibit(r)).count());
        let owners: Vec<Option<usize>> = scene.placements.iter().map(|p| p.section_index).collect();
        assert_eq!(owners, vec![Some(0), Some(0), None]);
        assert_eq!(scene.districts.len(), 2);
        assert_eq!(scene.districts[1].section_index, None);
    }
}
