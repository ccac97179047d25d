use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dom::parser::parse_html;
use crate::dom::{ElementRecord, PageMetrics, RenderedNode, SnapshotNode};
use crate::extract::budget::{self, BudgetConfig, BudgetReport};
use crate::extract::{ExtractConfig, ExtractStats, FeatureExtractor};
use crate::net::fetch::{fetch_url, FetchError};
use crate::net::image::{resolve_images, ImageResolver};
use crate::render::layout::compute_layout;
use crate::scene::{LayoutConfig, LayoutEngine, LayoutMode, LodConfig, LodManager, SceneGraph};
use crate::section::{GroupConfig, SectionGrouper};

#[derive(Debug, Error)]
pub enum CompileError {
    /// No extractable root: the one failure a caller sees from `compile`.
    #[error("nothing to compile: {0}")]
    NothingToCompile(String),
    #[error("invalid page snapshot: {0}")]
    Parse(serde_json::Error),
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("invalid config: {0}")]
    Config(serde_json::Error),
    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Every tunable of the compiler. Partial JSON overrides only the fields
/// it names.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    pub extract: ExtractConfig,
    pub budget: BudgetConfig,
    pub group: GroupConfig,
    pub layout: LayoutConfig,
    pub lod: LodConfig,
}

impl CompilerConfig {
    pub fn from_json_str(json: &str) -> Result<Self, CompileError> {
        serde_json::from_str(json).map_err(CompileError::Config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CompileError> {
        Self::from_json_str(&std::fs::read_to_string(path)?)
    }
}

/// Everything one compile produced, for callers that want more than the scene.
#[derive(Debug, Clone)]
pub struct Compilation {
    /// Flat record list in document order, including records no section owns
    pub records: Vec<ElementRecord>,
    pub scene: SceneGraph,
    pub stats: ExtractStats,
    pub budget: BudgetReport,
}

/// The compiler pipeline: Extract → Classify → Group → Layout.
///
/// Holds no per-page state; one instance can compile any number of pages.
pub struct SceneCompiler {
    cfg: CompilerConfig,
    resolver: Option<Arc<dyn ImageResolver + Send + Sync>>,
}

impl SceneCompiler {
    pub fn new(cfg: CompilerConfig) -> Self {
        Self { cfg, resolver: None }
    }

    /// Set the image resolver (shared reference). Without one, image
    /// references stay `Pending` with their original URLs.
    pub fn with_image_resolver(mut self, resolver: Arc<dyn ImageResolver + Send + Sync>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn with_layout_mode(mut self, mode: LayoutMode) -> Self {
        self.cfg.layout.mode = mode;
        self
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.cfg
    }

    /// LOD manager configured for scenes from this compiler.
    pub fn lod_manager(&self) -> LodManager {
        LodManager::new(self.cfg.lod.clone())
    }

    pub fn compile<N: RenderedNode>(&self, root: &N, metrics: &PageMetrics) -> Result<SceneGraph, CompileError> {
        self.compile_detailed(root, metrics).map(|c| c.scene)
    }

    pub fn compile_detailed<N: RenderedNode>(
        &self,
        root: &N,
        metrics: &PageMetrics,
    ) -> Result<Compilation, CompileError> {
        // Phase 1: Extract (classification runs inline)
        let extractor = FeatureExtractor::new(self.cfg.extract.clone(), self.cfg.budget.clone(), metrics);
        let mut extraction = extractor.extract(root)?;

        // Phase 2: Images. Embedded copies grow the payload, so re-budget.
        if let Some(ref resolver) = self.resolver {
            let resolved = resolve_images(&mut extraction.records, resolver.as_ref());
            log::debug!(
                "images: {} requested, {} embedded, {} fallback",
                resolved.requested,
                resolved.embedded,
                resolved.fallback
            );
            let report = budget::enforce(&mut extraction.records, &self.cfg.budget);
            if report.overflowed() {
                extraction.budget = report;
            }
            extraction.stats.records = extraction.records.len();
        }

        // Phase 3: Group
        let sections = SectionGrouper::new(self.cfg.group.clone()).group(&extraction.records);

        // Phase 4: Layout
        let scene = LayoutEngine::new(self.cfg.layout.clone()).layout(sections, &extraction.records, metrics);

        log::info!(
            "compiled {} records into {} sections, {} placements ({} layout)",
            extraction.records.len(),
            scene.sections.len(),
            scene.placements.len(),
            scene.strategy
        );

        Ok(Compilation {
            records: extraction.records,
            scene,
            stats: extraction.stats,
            budget: extraction.budget,
        })
    }

    /// Parse and lay out raw HTML, then compile it.
    pub fn process_html(
        &self,
        html: &str,
        url: &str,
        viewport_width: f32,
        viewport_height: f32,
    ) -> Result<Compilation, CompileError> {
        let dom = parse_html(html, url);
        if dom.body().is_none() {
            return Err(CompileError::NothingToCompile("document has no body".into()));
        }

        if !dom.title.is_empty() {
            log::info!("compiling \"{}\"", dom.title);
        }
        let root = compute_layout(&dom.root, viewport_width);
        let page_height = root.bounds.map_or(0.0, |b| b.height).max(viewport_height);
        let mut metrics = PageMetrics::new(viewport_width, page_height);
        metrics.viewport_height = viewport_height;
        if !url.is_empty() {
            metrics = metrics.with_url(url);
        }

        self.compile_detailed(&root, &metrics)
    }

    /// Compile a host-delivered JSON snapshot. The document size in
    /// `metrics` grows to cover the root's box when the snapshot is taller
    /// or wider than the viewport it was given.
    pub fn process_snapshot(&self, json: &str, metrics: &PageMetrics) -> Result<Compilation, CompileError> {
        let root: SnapshotNode = serde_json::from_str(json).map_err(CompileError::Parse)?;
        let mut metrics = metrics.clone();
        if let Some(b) = root.bounds {
            metrics.width = metrics.width.max(b.right());
            metrics.height = metrics.height.max(b.bottom());
        }
        self.compile_detailed(&root, &metrics)
    }

    /// Fetch a URL and run it through the full pipeline.
    pub fn load_page(&self, url: &str, viewport_width: f32, viewport_height: f32) -> Result<Compilation, CompileError> {
        let fetched = fetch_url(url)?;
        self.process_html(&fetched.html, &fetched.url, viewport_width, viewport_height)
    }
}

impl Default for SceneCompiler {
    fn default() -> Self {
        Self::new(CompilerConfig::default())
    }
}
