use std::fs;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{anyhow, Context};
use clap::{Parser, ValueEnum};
use sketchmatch::{MatchConfig, MatchSession, Path, ReferenceSet, Sketch, Strategy};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum StrategyArg {
    Composite,
    Dtw,
    Spectral,
    GradientAnn,
}

#[derive(Parser)]
#[command(name = "sketchmatch", about = "Find reference curve windows shaped like a drawn sketch")]
struct Cli {
    /// Saved drawing (layer array or canvas document) holding the stroke
    #[arg(short, long)]
    sketch: PathBuf,

    /// Reference curves (named-curve array or hcn/time matrix)
    #[arg(short, long)]
    references: PathBuf,

    /// Full query configuration as JSON; flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Scoring strategy
    #[arg(long, value_enum)]
    strategy: Option<StrategyArg>,

    /// Maximum number of matches
    #[arg(short = 'n', long)]
    max_results: Option<usize>,

    /// Similarity threshold (composite) or maximum distance (others)
    #[arg(short, long)]
    threshold: Option<f64>,

    /// Samples per quadratic segment (0 = end points only)
    #[arg(long)]
    tessellation: Option<usize>,

    /// Write results here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Do not print progress to stderr
    #[arg(short, long)]
    quiet: bool,
}

fn load_config(cli: &Cli) -> anyhow::Result<MatchConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?
        }
        None => MatchConfig::default(),
    };

    if let Some(strategy) = cli.strategy {
        config.strategy = match strategy {
            StrategyArg::Composite => Strategy::composite(),
            StrategyArg::Dtw => Strategy::dtw(),
            StrategyArg::Spectral => Strategy::spectral(),
            StrategyArg::GradientAnn => Strategy::gradient_ann(),
        };
    }
    if let Some(n) = cli.max_results {
        config.max_results = n;
    }
    if cli.threshold.is_some() {
        config = config.with_threshold(cli.threshold);
    }
    if let Some(t) = cli.tessellation {
        config.preprocess.tessellation = t;
    }
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let sketch_json = fs::read_to_string(&cli.sketch)
        .with_context(|| format!("reading sketch {}", cli.sketch.display()))?;
    let path = Path::from_sketch_json(&sketch_json).context("decoding sketch")?;

    let reference_json = fs::read_to_string(&cli.references)
        .with_context(|| format!("reading references {}", cli.references.display()))?;
    let references = ReferenceSet::from_json(&reference_json).context("decoding references")?;
    tracing::info!(curves = references.len(), commands = path.len(), "inputs loaded");

    let session = MatchSession::new(references, config)?;
    let (progress, handle) = session.spawn(Sketch::Path(path));
    for percent in progress {
        if !cli.quiet {
            eprint!("\rscoring {percent:>3}%");
        }
    }
    if !cli.quiet {
        eprintln!();
    }
    let results = handle
        .join()
        .map_err(|_| anyhow!("query worker panicked"))?
        .context("running query")?;
    tracing::info!(matches = results.len(), "query finished");

    let json = serde_json::to_string_pretty(&results)?;
    match &cli.output {
        Some(out) => fs::write(out, json).with_context(|| format!("writing {}", out.display()))?,
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(json.as_bytes())?;
            stdout.write_all(b"\n")?;
        }
    }
    Ok(())
}
