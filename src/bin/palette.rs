use anyhow::Context;
use anyhow::Result;
use clap::{Parser, ValueEnum};
use dominant_palette_wasm::{
    InsufficientPolicy, PaletteConfig, PaletteOrder, extract_palette_with, format_rgb,
};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Print the dominant colors of one or more images.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// One or more input image paths
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Number of colors to extract
    #[arg(short = 'k', long)]
    num_colors: Option<usize>,

    /// Base seed for k-means initialization
    #[arg(long)]
    seed: Option<u64>,

    /// Number of k-means restarts
    #[arg(long)]
    restarts: Option<usize>,

    /// Swatch order
    #[arg(long, value_enum)]
    order: Option<OrderArg>,

    /// Shrink the palette instead of failing on images with too few colors
    #[arg(long)]
    clamp: bool,

    /// JSON config file; command-line flags override it
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Emit JSON instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OrderArg {
    Clustering,
    Population,
}

#[derive(Serialize)]
struct SwatchOut {
    hex: String,
    rgb: [u8; 3],
    population: usize,
    percentage: f32,
    light_text: bool,
}

#[derive(Serialize)]
struct ImageOut {
    path: PathBuf,
    swatches: Vec<SwatchOut>,
}

fn build_config(args: &Args) -> Result<PaletteConfig> {
    let mut config = match &args.config {
        Some(path) => PaletteConfig::from_json_file(path)?,
        None => PaletteConfig::default(),
    };
    if let Some(k) = args.num_colors {
        config = config.num_colors(k);
    }
    if let Some(seed) = args.seed {
        config = config.seed(seed);
    }
    if let Some(restarts) = args.restarts {
        config = config.restarts(restarts);
    }
    if let Some(order) = args.order {
        config = config.order(match order {
            OrderArg::Clustering => PaletteOrder::Clustering,
            OrderArg::Population => PaletteOrder::Population,
        });
    }
    if args.clamp {
        config = config.on_insufficient(InsufficientPolicy::Clamp);
    }
    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = build_config(&args)?;

    let mut results = Vec::with_capacity(args.inputs.len());
    for input in &args.inputs {
        let bytes = fs::read(input).with_context(|| format!("reading {}", input.display()))?;
        let palette = extract_palette_with(&bytes, &config)
            .with_context(|| format!("palette extraction failed for {}", input.display()))?;

        let swatches = palette
            .iter()
            .map(|s| SwatchOut {
                hex: s.color.to_hex(),
                rgb: s.color.channels(),
                population: s.population,
                percentage: s.percentage,
                light_text: config.contrast.use_light_text(s.color),
            })
            .collect();

        if args.json {
            results.push(ImageOut {
                path: input.clone(),
                swatches,
            });
        } else {
            println!("{}", input.display());
            for s in &swatches {
                let [r, g, b] = s.rgb;
                println!(
                    "  {}  {:<20} {} text",
                    s.hex,
                    format_rgb([r, g, b].into()),
                    if s.light_text { "light" } else { "dark" }
                );
            }
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    }

    Ok(())
}
