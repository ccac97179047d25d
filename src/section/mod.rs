//! Section Grouper.
//!
//! Partitions the record list into named page regions. Containers come
//! from classifier hints when at least two exist, otherwise from a size
//! heuristic. Membership is pure geometry over the extracted boxes: a
//! record joins the smallest surviving container whose box holds it.

use serde::{Deserialize, Serialize};

use crate::classify::clean::prettify_name;
use crate::classify::SemanticType;
use crate::dom::{ElementRecord, RoleType};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupConfig {
    /// Upper bound on containers handed to layout.
    pub max_sections: usize,
    /// Containers holding fewer members are false positives.
    pub min_members: usize,
    /// Heuristic fallback: identified container at least this large (px²).
    pub fallback_min_area: f32,
    /// Heuristic fallback: any container this large (px²).
    pub fallback_large_area: f32,
}

impl Default for GroupConfig {
    fn default() -> Self {
        Self {
            max_sections: 10,
            min_members: 4,
            fallback_min_area: 40_000.0,
            fallback_large_area: 250_000.0,
        }
    }
}

/// A named cluster of records forming one page region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub name: String,
    pub role_type: RoleType,
    pub members: Vec<ElementRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounding_container: Option<ElementRecord>,
}

impl Section {
    /// Region covered on the page: the container box, else the members' union.
    pub fn footprint(&self) -> Option<crate::dom::Bounds> {
        self.bounding_container.as_ref().map(|c| c.bounds).or_else(|| {
            self.members
                .iter()
                .map(|m| m.bounds)
                .reduce(|acc, b| acc.union(&b))
        })
    }
}

pub struct SectionGrouper {
    cfg: GroupConfig,
}

impl SectionGrouper {
    pub fn new(cfg: GroupConfig) -> Self {
        Self { cfg }
    }

    /// Group records into sections. Never returns an empty list.
    pub fn group(&self, records: &[ElementRecord]) -> Vec<Section> {
        let mut containers = self.candidate_containers(records);

        if containers.len() > self.cfg.max_sections {
            containers.sort_by(|&a, &b| {
                records[b]
                    .area()
                    .total_cmp(&records[a].area())
                    .then_with(|| a.cmp(&b))
            });
            containers.truncate(self.cfg.max_sections);
            containers.sort_unstable();
        }

        // Discarding a container can hand its records to an outer one,
        // so repeat until every survivor is large enough.
        let mut assignment = assign_members(records, &containers);
        loop {
            let before = containers.len();
            let mut kept = Vec::with_capacity(before);
            for (slot, &container) in containers.iter().enumerate() {
                if assignment[slot].len() >= self.cfg.min_members {
                    kept.push(container);
                } else {
                    log::debug!(
                        "discarding section candidate <{}> #{} ({} members)",
                        records[container].tag_name,
                        container,
                        assignment[slot].len()
                    );
                }
            }
            containers = kept;
            if containers.len() == before {
                break;
            }
            assignment = assign_members(records, &containers);
        }

        if containers.len() < 2 {
            return vec![catch_all(records)];
        }

        containers
            .iter()
            .zip(assignment)
            .enumerate()
            .map(|(i, (&container, members))| {
                let record = &records[container];
                Section {
                    name: section_name(record, i),
                    role_type: section_role(record),
                    members: members.into_iter().map(|m| records[m].clone()).collect(),
                    bounding_container: Some(record.clone()),
                }
            })
            .collect()
    }

    /// Indices of container records, in document order.
    fn candidate_containers(&self, records: &[ElementRecord]) -> Vec<usize> {
        let hinted: Vec<usize> = records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.is_section_candidate())
            .map(|(i, _)| i)
            .collect();
        if hinted.len() >= 2 {
            return hinted;
        }

        records
            .iter()
            .enumerate()
            .filter(|(_, r)| {
                let area = r.area();
                let blockish = matches!(r.semantic_type, SemanticType::Container | SemanticType::Navigation);
                let identified = r.id.is_some() || !r.class_names.is_empty();
                blockish && ((identified && area >= self.cfg.fallback_min_area) || area >= self.cfg.fallback_large_area)
            })
            .map(|(i, _)| i)
            .collect()
    }
}

impl Default for SectionGrouper {
    fn default() -> Self {
        Self::new(GroupConfig::default())
    }
}

/// For each container slot, the records it owns (document order).
fn assign_members(records: &[ElementRecord], containers: &[usize]) -> Vec<Vec<usize>> {
    let mut slots = vec![Vec::new(); containers.len()];
    for (i, record) in records.iter().enumerate() {
        if containers.contains(&i) {
            continue;
        }
        let owner = containers
            .iter()
            .enumerate()
            .filter(|&(_, &c)| records[c].bounds.contains(&record.bounds))
            .min_by(|&(_, &a), &(_, &b)| records[a].area().total_cmp(&records[b].area()).then_with(|| a.cmp(&b)))
            .map(|(slot, _)| slot);
        if let Some(slot) = owner {
            slots[slot].push(i);
        }
    }
    slots
}

fn catch_all(records: &[ElementRecord]) -> Section {
    Section {
        name: "Page".to_string(),
        role_type: RoleType::Generic,
        members: records.to_vec(),
        bounding_container: None,
    }
}

/// Hint name, then id, then first meaningful class, then the role label.
fn section_name(record: &ElementRecord, index: usize) -> String {
    let hinted = record
        .section_hint
        .as_ref()
        .and_then(|h| h.suggested_name.as_deref());
    let raw = hinted
        .or(record.id.as_deref())
        .or(record.class_names.iter().next().map(|c| c.as_str()));

    match raw.map(prettify_name).filter(|n| !n.is_empty()) {
        Some(name) => name,
        None => match section_role(record) {
            RoleType::Generic => format!("Section {}", index + 1),
            role => role.label().to_string(),
        },
    }
}

fn section_role(record: &ElementRecord) -> RoleType {
    if let Some(role) = record.section_hint.as_ref().and_then(|h| h.role_type) {
        return role;
    }
    match record.semantic_type {
        SemanticType::Navigation => RoleType::Nav,
        SemanticType::Header => RoleType::Header,
        _ => RoleType::Generic,
    }
}
