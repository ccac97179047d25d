//! Size Budgeter.
//!
//! Keeps the serialized record list under a payload ceiling with a fixed
//! truncation ladder:
//!
//!   1. rank by importance, keep the top N
//!   2. cap long text fields
//!   3. drop content-free, non-structural records
//!   4. drop lowest-ranked records one by one (last resort)
//!
//! Ranking is image > article > meaningful text > on-screen area, so
//! content-bearing and larger records always outlive decorative ones.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::classify::clean::truncate_chars;
use crate::dom::ElementRecord;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetConfig {
    /// Ceiling on the JSON encoding of the record list, in bytes.
    pub ceiling_bytes: usize,
    /// Records kept by the importance cut.
    pub top_n: usize,
    pub text_cap: usize,
    pub title_cap: usize,
    pub summary_cap: usize,
    pub body_cap: usize,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            ceiling_bytes: 1 << 20,
            top_n: 300,
            text_cap: 120,
            title_cap: 80,
            summary_cap: 160,
            body_cap: 320,
        }
    }
}

/// A rung of the truncation ladder that was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BudgetStep {
    RankTruncate,
    TextTruncate,
    DropDecorative,
    DropLowestRanked,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetReport {
    pub initial_bytes: usize,
    pub final_bytes: usize,
    pub dropped: usize,
    pub steps: Vec<BudgetStep>,
}

impl BudgetReport {
    pub fn overflowed(&self) -> bool {
        !self.steps.is_empty()
    }
}

/// Exact length of `serde_json::to_vec(records)`.
pub fn payload_size(records: &[ElementRecord]) -> usize {
    let items: usize = records.iter().map(record_size).sum();
    2 + items + records.len().saturating_sub(1)
}

fn record_size(record: &ElementRecord) -> usize {
    serde_json::to_vec(record).map_or(0, |v| v.len())
}

/// Higher ranks first; equal ranks fall back to document order.
pub fn compare_importance(a: &ElementRecord, b: &ElementRecord) -> Ordering {
    let key = |r: &ElementRecord| (r.image.is_some(), r.article.is_some(), r.has_meaningful_text());
    key(b)
        .cmp(&key(a))
        .then_with(|| b.area().total_cmp(&a.area()))
        .then_with(|| a.order.cmp(&b.order))
}

/// Enforce the ceiling in place. Survivors stay in document order.
pub fn enforce(records: &mut Vec<ElementRecord>, cfg: &BudgetConfig) -> BudgetReport {
    let initial = payload_size(records);
    let before = records.len();
    let mut report = BudgetReport {
        initial_bytes: initial,
        final_bytes: initial,
        ..Default::default()
    };
    if initial <= cfg.ceiling_bytes {
        return report;
    }

    log::warn!(
        "payload {} bytes over ceiling {} ({} records), truncating",
        initial,
        cfg.ceiling_bytes,
        before
    );

    if records.len() > cfg.top_n {
        records.sort_by(compare_importance);
        records.truncate(cfg.top_n);
        records.sort_by_key(|r| r.order);
        report.steps.push(BudgetStep::RankTruncate);
    }

    if payload_size(records) > cfg.ceiling_bytes {
        for record in records.iter_mut() {
            truncate_text_fields(record, cfg);
        }
        report.steps.push(BudgetStep::TextTruncate);
    }

    if payload_size(records) > cfg.ceiling_bytes {
        records.retain(|r| r.has_content() || r.is_structural());
        report.steps.push(BudgetStep::DropDecorative);
    }

    let mut size = payload_size(records);
    if size > cfg.ceiling_bytes {
        report.steps.push(BudgetStep::DropLowestRanked);
        let mut ranked: Vec<(usize, usize)> = {
            let mut by_rank: Vec<&ElementRecord> = records.iter().collect();
            by_rank.sort_by(|a, b| compare_importance(a, b));
            by_rank.iter().map(|r| (r.order, record_size(r))).collect()
        };
        let mut doomed = Vec::new();
        while size > cfg.ceiling_bytes {
            let Some((order, bytes)) = ranked.pop() else { break };
            doomed.push(order);
            // removing one item also removes its separating comma
            size -= bytes + usize::from(!ranked.is_empty());
        }
        records.retain(|r| !doomed.contains(&r.order));
    }

    report.final_bytes = payload_size(records);
    report.dropped = before - records.len();
    report
}

fn truncate_text_fields(record: &mut ElementRecord, cfg: &BudgetConfig) {
    let cap = |field: &mut Option<String>, n: usize| {
        if let Some(s) = field.as_mut() {
            if s.chars().count() > n {
                *s = truncate_chars(s, n);
            }
        }
    };
    cap(&mut record.text, cfg.text_cap);
    if let Some(article) = record.article.as_mut() {
        cap(&mut article.title, cfg.title_cap);
        cap(&mut article.summary, cfg.summary_cap);
        cap(&mut article.body, cfg.body_cap);
    }
}
