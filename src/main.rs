use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use sieve_distance::{
    BandConstraint, DistanceParams, DistanceRegistry, Msm, SubsequenceDistance, TimeSeries,
};
use sieve_io::{DatasetReader, ExperimentName, LabeledDataset, ResultWriter};
use sieve_shapelet::{
    ChannelMode, ClassValueMode, QualityRegistry, SearchType, ShapeletConfig, ShapeletOrder,
    ShapeletTransform, count_candidates, estimate_operations, per_series_budget,
};

#[derive(Parser)]
#[command(name = "sieve")]
#[command(about = "Shapelet discovery and shapelet-distance transforms for time series classification")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// RNG seed for reproducibility
    #[arg(long, default_value_t = 42, global = true)]
    seed: u64,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Number of threads for parallel computation (defaults to all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,
}

/// Input dataset options shared by every subcommand.
#[derive(Args, Debug, Clone)]
struct InputArgs {
    /// Path to the input CSV file (label column, then samples)
    #[arg(long)]
    data: PathBuf,

    /// Number of channels each row is split into
    #[arg(long, default_value_t = 1)]
    channels: usize,
}

/// Distance used to compare shapelets with series.
#[derive(Args, Debug, Clone)]
struct DistanceArgs {
    /// Subsequence distance: "znorm-euclidean", "euclidean", or "msm"
    #[arg(long, default_value = "znorm-euclidean")]
    distance: String,

    /// MSM split/merge cost
    #[arg(long, default_value_t = Msm::DEFAULT_COST)]
    msm_cost: f64,

    /// Sakoe-Chiba band radius for MSM (0 = unconstrained)
    #[arg(long, default_value_t = 0)]
    band: usize,
}

/// Discovery tuning parameters.
#[derive(Args, Debug, Clone)]
struct SearchArgs {
    /// Shapelets to keep (defaults to min(number of series, 2000))
    #[arg(long)]
    k: Option<usize>,

    /// Shortest candidate length
    #[arg(long, default_value_t = 3)]
    min_length: usize,

    /// Longest candidate length (defaults to the longest series)
    #[arg(long)]
    max_length: Option<usize>,

    /// Step between candidate lengths
    #[arg(long, default_value_t = 1)]
    length_increment: usize,

    /// Step between candidate start positions
    #[arg(long, default_value_t = 1)]
    position_increment: usize,

    /// Quality measure: "information-gain" or "f-stat"
    #[arg(long, default_value = "information-gain")]
    quality: String,

    /// Ranking after quality: "separation-gap", "shortest-first", or "longest-first"
    #[arg(long, default_value = "separation-gap")]
    order: String,

    /// Random search with this many candidates per series
    #[arg(long)]
    random_per_series: Option<usize>,

    /// Time contract in seconds; a random-search budget is derived from it
    #[arg(long)]
    contract_secs: Option<f64>,

    /// Score one-versus-rest instead of against every class
    #[arg(long, default_value_t = false)]
    binary: bool,

    /// Draw multivariate candidates across all channels at once
    #[arg(long, default_value_t = false)]
    dependent: bool,

    /// Keep k / classes shapelets per class
    #[arg(long, default_value_t = false)]
    balanced: bool,

    /// Visit series interleaved by class
    #[arg(long, default_value_t = false)]
    round_robin: bool,

    /// Keep overlapping shapelets from the same series
    #[arg(long, default_value_t = false)]
    keep_self_similar: bool,

    /// Drop shapelets that duplicate a retained one
    #[arg(long, default_value_t = false)]
    prune_matching: bool,

    /// Disable early abandoning of candidates by the quality bound
    #[arg(long, default_value_t = false)]
    no_candidate_pruning: bool,

    /// Percentage of the order-line seen before the bound is checked
    #[arg(long, default_value_t = 10.0)]
    start_percentage: f64,

    /// Score each candidate against all series in parallel (disables the bound)
    #[arg(long, default_value_t = false)]
    parallel_scoring: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Discover shapelets in a labelled training set and transform it
    Discover {
        #[command(flatten)]
        input: InputArgs,

        /// Experiment name for output files (must match [a-zA-Z0-9_-]+)
        #[arg(long)]
        experiment: String,

        /// Output directory for result files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,

        /// Write a checkpoint after every series
        #[arg(long, default_value_t = false)]
        checkpoint: bool,

        /// Continue from the experiment's checkpoint
        #[arg(long, default_value_t = false)]
        resume: bool,

        #[command(flatten)]
        search: SearchArgs,

        #[command(flatten)]
        distance: DistanceArgs,
    },

    /// Project a dataset onto shapelets read from a shapelet log
    Transform {
        #[command(flatten)]
        input: InputArgs,

        /// Path to the shapelet log written by `discover`
        #[arg(long)]
        shapelets: PathBuf,

        /// Experiment name for output files
        #[arg(long)]
        experiment: String,

        /// Output directory for result files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,

        #[command(flatten)]
        distance: DistanceArgs,
    },

    /// Compute the pairwise MSM distance matrix of a univariate dataset
    Pairwise {
        #[command(flatten)]
        input: InputArgs,

        /// Experiment name for output files
        #[arg(long)]
        experiment: String,

        /// Output directory for result files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,

        /// MSM split/merge cost
        #[arg(long, default_value_t = Msm::DEFAULT_COST)]
        msm_cost: f64,

        /// Sakoe-Chiba band radius (0 = unconstrained)
        #[arg(long, default_value_t = 0)]
        band: usize,
    },

    /// Estimate the cost of a full search and the budget a contract allows
    Estimate {
        #[command(flatten)]
        input: InputArgs,

        /// Shortest candidate length
        #[arg(long, default_value_t = 3)]
        min_length: usize,

        /// Longest candidate length (defaults to the longest series)
        #[arg(long)]
        max_length: Option<usize>,

        /// Time contract in seconds
        #[arg(long)]
        contract_secs: Option<f64>,
    },
}

// --- JSON stdout output structs ---

#[derive(Serialize)]
struct DiscoverOutput {
    experiment: String,
    n_series: usize,
    n_classes: usize,
    k: usize,
    search: String,
    shapelets: usize,
    passes: usize,
    series_processed: usize,
    candidates_evaluated: u64,
    candidates_pruned: u64,
    elapsed_ms: u64,
    contract_expired: bool,
    files: Vec<PathBuf>,
}

#[derive(Serialize)]
struct TransformOutput {
    experiment: String,
    n_series: usize,
    n_shapelets: usize,
    file: PathBuf,
}

#[derive(Serialize)]
struct PairwiseOutput {
    experiment: String,
    n_series: usize,
    cost: f64,
    file: PathBuf,
}

#[derive(Serialize)]
struct EstimateOutput {
    n_series: usize,
    series_length: usize,
    min_length: usize,
    max_length: usize,
    candidates: u64,
    operations: u64,
    estimated_secs: f64,
    per_series_budget: Option<usize>,
}

fn build_constraint(band: usize) -> BandConstraint {
    if band == 0 {
        BandConstraint::Unconstrained
    } else {
        BandConstraint::SakoeChibaRadius(band)
    }
}

fn build_distance(args: &DistanceArgs) -> Result<Arc<dyn SubsequenceDistance>> {
    let params = DistanceParams {
        msm_cost: args.msm_cost,
        band: build_constraint(args.band),
    };
    DistanceRegistry::default()
        .create(&args.distance, &params)
        .context("invalid distance")
}

fn parse_order(s: &str) -> Result<ShapeletOrder> {
    match s {
        "separation-gap" => Ok(ShapeletOrder::SeparationGap),
        "shortest-first" => Ok(ShapeletOrder::ShortestFirst),
        "longest-first" => Ok(ShapeletOrder::LongestFirst),
        other => anyhow::bail!(
            "unknown order: {other} (expected separation-gap, shortest-first, or longest-first)"
        ),
    }
}

fn parse_contract(secs: Option<f64>) -> Result<Option<Duration>> {
    secs.map(|s| Duration::try_from_secs_f64(s).context("contract must be a non-negative number of seconds"))
        .transpose()
}

fn read_input(input: &InputArgs) -> Result<LabeledDataset> {
    DatasetReader::new(&input.data)
        .with_channels(input.channels)
        .read()
        .with_context(|| format!("failed to read {}", input.data.display()))
}

/// Build the discovery configuration, deriving a random budget from the contract.
fn build_config(
    data: &LabeledDataset,
    search: &SearchArgs,
    distance: &DistanceArgs,
    seed: u64,
    checkpoint: Option<PathBuf>,
) -> Result<ShapeletConfig> {
    let n = data.dataset().len();
    let m = data.dataset().max_len();
    let k = search.k.unwrap_or_else(|| n.min(2000));
    let max_length = search.max_length.unwrap_or(m);
    let contract = parse_contract(search.contract_secs)?;

    let search_type = match (search.random_per_series, contract) {
        (Some(per_series), _) => SearchType::Random { per_series },
        (None, Some(contract)) => {
            match per_series_budget(n, m, search.min_length, max_length, contract) {
                Some(per_series) => {
                    info!(per_series, "full search exceeds the contract, using random search");
                    SearchType::Random { per_series }
                }
                None => SearchType::Full,
            }
        }
        (None, None) => SearchType::Full,
    };

    let config = ShapeletConfig::new(k, search.min_length, max_length)?
        .with_search_type(search_type)
        .with_length_increment(search.length_increment)
        .with_position_increment(search.position_increment)
        .with_order(parse_order(&search.order)?)
        .with_class_value_mode(if search.binary {
            ClassValueMode::Binary
        } else {
            ClassValueMode::Normal
        })
        .with_channel_mode(if search.dependent {
            ChannelMode::Dependent
        } else {
            ChannelMode::Independent
        })
        .with_balanced(search.balanced)
        .with_round_robin(search.round_robin)
        .with_remove_self_similar(!search.keep_self_similar)
        .with_prune_matching(search.prune_matching)
        .with_candidate_pruning(!search.no_candidate_pruning)
        .with_start_percentage(search.start_percentage)
        .with_parallel_scoring(search.parallel_scoring)
        .with_contract(contract)
        .with_checkpoint(checkpoint)
        .with_seed(seed)
        .with_distance(build_distance(distance)?)
        .with_quality(
            QualityRegistry::default()
                .create(&search.quality)
                .context("invalid quality measure")?,
        );
    Ok(config)
}

fn first_channels(data: &LabeledDataset) -> Vec<TimeSeries> {
    data.dataset()
        .series()
        .iter()
        .map(|s| s.channels()[0].clone())
        .collect()
}

fn writer_for(output_dir: &Path, experiment: &str) -> Result<ResultWriter> {
    let name = ExperimentName::new(experiment.to_string())?;
    Ok(ResultWriter::new(output_dir, name)?)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Configure Rayon thread pool
    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure thread pool")?;
        info!(threads, "thread pool configured");
    }

    match cli.command {
        Command::Discover {
            input,
            experiment,
            output_dir,
            checkpoint,
            resume,
            search,
            distance,
        } => {
            let writer = writer_for(&output_dir, &experiment)?;
            let data = read_input(&input)?;

            // 1. Configure
            let checkpoint_path = writer.checkpoint_path();
            let config = build_config(
                &data,
                &search,
                &distance,
                cli.seed,
                (checkpoint || resume).then(|| checkpoint_path.clone()),
            )?;

            // 2. Discover or resume
            let result = if resume {
                config
                    .resume(data.dataset(), &checkpoint_path)
                    .context("failed to resume discovery")?
            } else {
                config
                    .discover(data.dataset())
                    .context("shapelet discovery failed")?
            };

            // 3. Write artifacts
            let summary = writer.write_summary(&config, &result, data.class_names())?;
            let log = writer.log_path();
            result
                .transform()
                .write_log(&log)
                .context("failed to write shapelet log")?;
            let table = result
                .transform()
                .project(data.dataset())
                .context("failed to transform training data")?;
            let transform = writer.write_transform(&table, data.class_names())?;

            // 4. Print summary
            let stats = result.stats();
            let output = DiscoverOutput {
                experiment,
                n_series: data.dataset().len(),
                n_classes: data.dataset().n_classes(),
                k: config.k(),
                search: match config.search_type() {
                    SearchType::Full => "full".to_string(),
                    SearchType::Random { per_series } => format!("random({per_series})"),
                },
                shapelets: result.shapelets().len(),
                passes: stats.passes,
                series_processed: stats.series_processed,
                candidates_evaluated: stats.candidates_evaluated,
                candidates_pruned: stats.candidates_pruned,
                elapsed_ms: stats.elapsed_ms,
                contract_expired: stats.contract_expired,
                files: vec![summary, log, transform],
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Transform {
            input,
            shapelets,
            experiment,
            output_dir,
            distance,
        } => {
            let writer = writer_for(&output_dir, &experiment)?;
            let data = read_input(&input)?;

            let transform = ShapeletTransform::from_log(&shapelets, build_distance(&distance)?)
                .with_context(|| format!("failed to read shapelet log {}", shapelets.display()))?;
            let table = transform
                .project(data.dataset())
                .context("failed to transform data")?;
            let file = writer.write_transform(&table, data.class_names())?;

            let output = TransformOutput {
                experiment,
                n_series: table.len(),
                n_shapelets: transform.len(),
                file,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Pairwise {
            input,
            experiment,
            output_dir,
            msm_cost,
            band,
        } => {
            let writer = writer_for(&output_dir, &experiment)?;
            let data = read_input(&input)?;
            if data.dataset().n_channels() > 1 {
                info!(
                    channels = data.dataset().n_channels(),
                    "pairwise MSM uses the first channel only"
                );
            }

            let msm = Msm::new(msm_cost)?.with_constraint(build_constraint(band));
            let matrix = msm.pairwise(&first_channels(&data));
            let labels: Vec<String> = data
                .dataset()
                .labels()
                .iter()
                .map(|&l| data.class_name(l).unwrap_or_default().to_string())
                .collect();
            let file = writer.write_pairwise(&msm, &matrix, &labels)?;

            let output = PairwiseOutput {
                experiment,
                n_series: matrix.len(),
                cost: msm.cost(),
                file,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Estimate {
            input,
            min_length,
            max_length,
            contract_secs,
        } => {
            let data = read_input(&input)?;
            let n = data.dataset().len();
            let m = data.dataset().max_len();
            let max_length = max_length.unwrap_or(m);
            let operations = estimate_operations(n, m, min_length, max_length);
            let budget = parse_contract(contract_secs)?
                .and_then(|c| per_series_budget(n, m, min_length, max_length, c));

            let output = EstimateOutput {
                n_series: n,
                series_length: m,
                min_length,
                max_length,
                candidates: u64::try_from(count_candidates(n, m, min_length, max_length))
                    .unwrap_or(u64::MAX),
                operations: u64::try_from(operations).unwrap_or(u64::MAX),
                estimated_secs: operations as f64
                    * sieve_shapelet::NANOS_PER_OPERATION as f64
                    / 1e9,
                per_series_budget: budget,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
