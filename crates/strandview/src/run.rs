use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use gallery::{default_registry, GalleryConfig, ShaderRegistry};
use renderer::{Renderer, RendererConfig};
use tracing_subscriber::EnvFilter;

use crate::cli::RunArgs;

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Registry and gallery-level tick interval resolved from the CLI.
struct Gallery {
    registry: ShaderRegistry,
    tick_interval: Option<Duration>,
}

fn load_gallery(args: &RunArgs) -> Result<Gallery> {
    let mut gallery = match &args.gallery {
        Some(path) => {
            let config = GalleryConfig::load(path)
                .with_context(|| format!("failed to load gallery {}", path.display()))?;
            let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
            let registry = config
                .into_registry(base_dir)
                .with_context(|| format!("failed to resolve gallery {}", path.display()))?;
            Gallery {
                registry,
                tick_interval: config.tick_interval,
            }
        }
        None => Gallery {
            registry: default_registry(),
            tick_interval: None,
        },
    };

    if let Some(name) = &args.shader {
        let index = gallery
            .registry
            .position(name)
            .ok_or_else(|| anyhow!("gallery has no shader named '{name}'"))?;
        gallery.registry.set_active(index)?;
    }

    Ok(gallery)
}

fn renderer_config(args: &RunArgs, gallery_interval: Option<Duration>) -> RendererConfig {
    let mut config = RendererConfig::default();
    if let Some(size) = args.size {
        config.window_size = size;
    }
    if let Some(interval) = args.tick_ms.or(gallery_interval) {
        config.tick_interval = interval;
    }
    config.still_time_ms = args.still_time;
    config
}

pub fn run(args: RunArgs) -> Result<()> {
    let gallery = load_gallery(&args)?;
    let config = renderer_config(&args, gallery.tick_interval);
    tracing::info!(
        shader = gallery.registry.current().name(),
        shaders = gallery.registry.len(),
        tick_ms = config.tick_interval.as_secs_f64() * 1000.0,
        "launching viewer"
    );
    Renderer::new(config, gallery.registry).run()
}

pub fn list(args: &RunArgs) -> Result<()> {
    let gallery = load_gallery(args)?;
    let active = gallery.registry.active_index();
    for (index, variant) in gallery.registry.iter().enumerate() {
        let marker = if index == active { '*' } else { ' ' };
        println!("{marker} {}. {}", index + 1, variant.name());
    }
    Ok(())
}
