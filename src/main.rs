use std::path::PathBuf;
use std::sync::Arc;

use clap::{ArgGroup, Parser};

use alice_spatial::dom::PageMetrics;
use alice_spatial::net::image::HttpImageResolver;
use alice_spatial::{CompileError, CompilerConfig, LayoutMode, SceneCompiler};

/// Compile a web page into a 3D scene graph (JSON).
#[derive(Parser, Debug)]
#[command(name = "alice-spatial", version, about)]
#[command(group(ArgGroup::new("input").required(true).args(["url", "html", "snapshot"])))]
struct Args {
    /// Fetch and compile a live page
    #[arg(long)]
    url: Option<String>,

    /// Compile a local HTML file
    #[arg(long)]
    html: Option<PathBuf>,

    /// Compile a host-rendered JSON snapshot
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// JSON config file; missing fields keep their defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Layout strategy: room or flat
    #[arg(long)]
    strategy: Option<LayoutMode>,

    /// Viewport width in CSS pixels
    #[arg(long, default_value_t = 1280.0)]
    width: f32,

    /// Viewport height in CSS pixels
    #[arg(long, default_value_t = 800.0)]
    height: f32,

    /// Embed images as data URIs (fetches every image)
    #[arg(long)]
    embed_images: bool,

    /// Widest embedded image in pixels; wider images are downsampled
    #[arg(long, default_value_t = 512)]
    image_width: u32,

    /// Write the scene here instead of stdout
    #[arg(short, long)]
    out: Option<PathBuf>,
}

fn main() {
    env_logger::init();

    let args = Args::parse();
    if let Err(e) = run(args) {
        eprintln!("alice-spatial: {e}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), CompileError> {
    let cfg = match &args.config {
        Some(path) => CompilerConfig::from_file(path)?,
        None => CompilerConfig::default(),
    };

    let mut compiler = SceneCompiler::new(cfg);
    if let Some(mode) = args.strategy {
        compiler = compiler.with_layout_mode(mode);
    }
    if args.embed_images {
        match HttpImageResolver::new() {
            Ok(resolver) => {
                compiler = compiler.with_image_resolver(Arc::new(resolver.with_max_width(args.image_width)))
            }
            Err(e) => log::warn!("image embedding disabled: {e}"),
        }
    }

    let compilation = if let Some(url) = &args.url {
        compiler.load_page(url, args.width, args.height)?
    } else if let Some(path) = &args.html {
        let html = std::fs::read_to_string(path)?;
        compiler.process_html(&html, "", args.width, args.height)?
    } else if let Some(path) = &args.snapshot {
        let json = std::fs::read_to_string(path)?;
        let metrics = PageMetrics::new(args.width, args.height);
        compiler.process_snapshot(&json, &metrics)?
    } else {
        unreachable!("clap enforces one input");
    };

    if compilation.budget.overflowed() {
        log::warn!(
            "payload trimmed from {} to {} bytes ({} records dropped)",
            compilation.budget.initial_bytes,
            compilation.budget.final_bytes,
            compilation.budget.dropped
        );
    }

    let json = serde_json::to_string_pretty(&compilation.scene)?;
    match &args.out {
        Some(path) => {
            std::fs::write(path, json)?;
            log::info!("wrote {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}
