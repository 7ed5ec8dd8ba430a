use clap::Parser;
use patchmatch::io::{load_gray_image, load_mask, load_rgb_image};
use patchmatch::neighbors::{AllNeighbors, AllowedPropagationNeighbors};
use patchmatch::{
    BoundaryInitializer, CompositeTest, HistogramTest, MaskedSsd, NeighborHistogramTest,
    NnField, PatchDistance, PatchMatch, PatchMatchConfig, PatchMatchStats, RandomHistogramInitializer,
    RandomInitializer, RandomNeighborHistogramInitializer, SolverState, SourceRegionTest, Ssd,
    SsdTest,
};
use patchmatch::{Image, Mask};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "PatchMatch CLI (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print the JSON schema and exit.
    #[arg(long)]
    print_schema: bool,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output for performance profiling.
    #[arg(long)]
    trace: bool,
}

#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ColorConfig {
    #[default]
    Rgb,
    Gray,
}

#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
enum DistanceConfig {
    #[default]
    Ssd,
    MaskedSsd,
}

#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
enum InitializerConfig {
    #[default]
    Random,
    RandomHistogram,
    RandomNeighborHistogram,
    Boundary,
}

#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
enum PropagationConfig {
    #[default]
    Directional,
    All,
    Allowed,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct SolverJson {
    patch_radius: usize,
    iterations: usize,
    random_search_attempts: usize,
    initial_search_radius: Option<usize>,
    k: usize,
    seed: u64,
}

impl Default for SolverJson {
    fn default() -> Self {
        let cfg = PatchMatchConfig::default();
        Self {
            patch_radius: cfg.patch_radius,
            iterations: cfg.iterations,
            random_search_attempts: cfg.random_search_attempts,
            initial_search_radius: cfg.initial_search_radius,
            k: 1,
            seed: PatchMatch::<Ssd>::DEFAULT_SEED,
        }
    }
}

impl From<&SolverJson> for PatchMatchConfig {
    fn from(value: &SolverJson) -> Self {
        Self {
            patch_radius: value.patch_radius,
            iterations: value.iterations,
            random_search_attempts: value.random_search_attempts,
            initial_search_radius: value.initial_search_radius,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AcceptanceJson {
    histogram_threshold: Option<f32>,
    neighbor_histogram_multiplier: Option<f32>,
    source_region: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Config {
    image_path: String,
    source_mask_path: String,
    target_mask_path: Option<String>,
    output_path: Option<String>,
    color: ColorConfig,
    distance: DistanceConfig,
    initializer: InitializerConfig,
    propagation: PropagationConfig,
    solver: SolverJson,
    acceptance: AcceptanceJson,
}

#[derive(Debug, Serialize)]
struct MatchRecord {
    x: usize,
    y: usize,
    score: f32,
}

#[derive(Debug, Serialize)]
struct PixelRecord {
    x: usize,
    y: usize,
    matches: Vec<MatchRecord>,
}

#[derive(Debug, Serialize)]
struct Output {
    width: usize,
    height: usize,
    patch_radius: usize,
    state: &'static str,
    iterations: usize,
    initial_mean_score: Option<f64>,
    final_mean_score: Option<f64>,
    pixels: Vec<PixelRecord>,
}

impl Output {
    fn new(
        field: &NnField,
        target: &Mask,
        patch_radius: usize,
        state: SolverState,
        stats: &PatchMatchStats,
    ) -> Self {
        let pixels = field
            .iter()
            .filter(|(p, set)| target.is_valid(*p) && !set.is_empty())
            .map(|(p, set)| PixelRecord {
                x: p.x,
                y: p.y,
                matches: set
                    .iter()
                    .map(|m| MatchRecord {
                        x: m.region.center().x,
                        y: m.region.center().y,
                        score: m.score,
                    })
                    .collect(),
            })
            .collect();
        let state = match state {
            SolverState::Uninitialized => "uninitialized",
            SolverState::Initialized => "initialized",
            SolverState::Converged => "converged",
            SolverState::StoppedAtIterationLimit => "stopped_at_iteration_limit",
        };
        Self {
            width: field.width(),
            height: field.height(),
            patch_radius,
            state,
            iterations: stats.iterations.len(),
            initial_mean_score: stats.initial_mean_score,
            final_mean_score: stats.final_mean_score(),
            pixels,
        }
    }
}

fn acceptance(cfg: &AcceptanceJson, source: &Mask) -> CompositeTest {
    let mut test = CompositeTest::new().with(SsdTest);
    if let Some(threshold) = cfg.histogram_threshold {
        test = test.with(HistogramTest::new(threshold));
    }
    if let Some(multiplier) = cfg.neighbor_histogram_multiplier {
        test = test.with(NeighborHistogramTest::new(multiplier));
    }
    if cfg.source_region {
        test = test.with(SourceRegionTest::new(source.clone()));
    }
    test
}

fn run<D: PatchDistance>(
    distance: D,
    config: &Config,
    image: &Image<f32>,
    source: &Mask,
    target: &Mask,
) -> Result<Output, Box<dyn std::error::Error>> {
    let cfg = PatchMatchConfig::from(&config.solver);
    let solver = if config.solver.k > 1 {
        PatchMatch::generalized(distance, cfg, config.solver.k)
    } else {
        PatchMatch::new(distance, cfg)
    };
    let mut solver = solver
        .with_acceptance(acceptance(&config.acceptance, source))
        .with_seed(config.solver.seed);
    solver = match config.initializer {
        InitializerConfig::Random => solver.with_initializer(RandomInitializer),
        InitializerConfig::RandomHistogram => {
            solver.with_initializer(RandomHistogramInitializer::default())
        }
        InitializerConfig::RandomNeighborHistogram => {
            solver.with_initializer(RandomNeighborHistogramInitializer::default())
        }
        InitializerConfig::Boundary => solver.with_initializer(BoundaryInitializer),
    };
    solver = match config.propagation {
        PropagationConfig::Directional => solver,
        PropagationConfig::All => solver.with_neighbors(AllNeighbors),
        PropagationConfig::Allowed => solver
            .with_neighbors(AllowedPropagationNeighbors::new(source.clone(), target.clone())),
    };

    solver.compute(image.view(), source, target)?;
    let field = solver.field().ok_or("solver finished without a field")?;
    Ok(Output::new(
        field,
        target,
        cfg.patch_radius,
        solver.state(),
        solver.stats(),
    ))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("patchmatch=info".parse()?))
            .with_target(false)
            .init();
    }

    if cli.print_schema {
        println!("{SCHEMA_JSON}");
        return Ok(());
    }
    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    if config.image_path.is_empty() || config.source_mask_path.is_empty() {
        return Err("image_path and source_mask_path must be set in the config".into());
    }
    if config.solver.k == 0 {
        return Err("solver.k must be at least 1".into());
    }

    let image = match config.color {
        ColorConfig::Rgb => load_rgb_image(&config.image_path)?,
        ColorConfig::Gray => load_gray_image(&config.image_path)?,
    };
    let source = load_mask(&config.source_mask_path)?;
    let target = match &config.target_mask_path {
        Some(path) => load_mask(path)?,
        None => source.inverted(),
    };

    let output = match config.distance {
        DistanceConfig::Ssd => run(Ssd, &config, &image, &source, &target)?,
        DistanceConfig::MaskedSsd => {
            run(MaskedSsd::new(source.clone()), &config, &image, &source, &target)?
        }
    };
    let json = serde_json::to_string_pretty(&output)?;

    match config.output_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}
