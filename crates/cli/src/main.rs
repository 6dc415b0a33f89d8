//! Windprep CLI - wind-turbine sample preparation pipeline

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use ndarray::{Array2, Axis};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use windprep_algorithms::classifier::{
    maximum_likelihood, minimum_distance, signatures_from_training, train_test_split,
    ConfusionMatrix,
};
use windprep_algorithms::features::geometric_features;
use windprep_algorithms::sampler::{sample_negatives, SamplerParams};
use windprep_algorithms::scripts::{write_all_scripts, ScriptParams};
use windprep_core::crs::reproject_inventory;
use windprep_core::io::{
    filter_country, read_inventory, read_samples_csv, write_geojson, write_samples_csv,
    write_shapefile, write_summary, zip_shapefile,
};
use windprep_core::region::{country_bounds, NORTH_SOUTH_SPLIT_LAT};
use windprep_core::sample::{BoundingBox, Sample, SampleClass, SampleSet, DEFAULT_BUFFER_DEG};
use windprep_core::Region;

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "windprep")]
#[command(author, version, about = "Wind-turbine sample preparation", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline: filter, reproject, sample, partition, export
    Prepare {
        /// Global turbine inventory CSV
        input: PathBuf,
        /// Output directory
        #[arg(short, long, default_value = "processed_data")]
        output: PathBuf,
        /// ISO-3 country code to keep
        #[arg(long, default_value = "CHN")]
        country: String,
        /// Bounding-box half-width in degrees
        #[arg(long, default_value_t = DEFAULT_BUFFER_DEG)]
        buffer: f64,
        /// Negatives per positive
        #[arg(long, default_value_t = 2.0)]
        negative_ratio: f64,
        /// Minimum distance (degrees) from negatives to other samples
        #[arg(long, default_value_t = 0.01)]
        min_distance: f64,
        /// Attempt budget per requested negative
        #[arg(long, default_value_t = 10)]
        attempts_per_negative: usize,
        /// RNG seed for reproducible sampling
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Generate negative samples against an existing sample CSV
    Sample {
        /// Sample CSV whose centers are kept clear
        positives: PathBuf,
        /// Output CSV for the generated negatives
        output: PathBuf,
        /// Number of negatives to generate
        #[arg(short, long)]
        count: usize,
        /// Minimum distance in degrees
        #[arg(long, default_value_t = 0.01)]
        min_distance: f64,
        /// Attempt budget (default: 10 per requested negative)
        #[arg(long)]
        max_attempts: Option<usize>,
        /// Sampling bounds as "xmin,ymin,xmax,ymax" (default: country bounds)
        #[arg(long)]
        bounds: Option<String>,
        /// Bounding-box half-width in degrees
        #[arg(long, default_value_t = DEFAULT_BUFFER_DEG)]
        buffer: f64,
        /// RNG seed for reproducible sampling
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Generate per-region Earth Engine prediction scripts
    Scripts {
        /// Output directory
        #[arg(short, long, default_value = "gee_scripts")]
        output: PathBuf,
        /// Platform user owning the uploaded sample assets
        #[arg(short, long)]
        user: String,
        /// Random-forest tree count
        #[arg(long, default_value_t = 50)]
        trees: u32,
        /// Cloudy-pixel percentage threshold
        #[arg(long, default_value_t = 20)]
        cloud_threshold: u8,
    },
    /// Train and evaluate the local fallback classifier per region
    Train {
        /// Directory holding <region>_samples.csv files
        #[arg(short, long, default_value = "processed_data")]
        data_dir: PathBuf,
        /// Directory for trained signature files
        #[arg(short, long, default_value = "models")]
        models_dir: PathBuf,
        /// Fraction of rows held out for evaluation
        #[arg(long, default_value_t = 0.3)]
        test_fraction: f64,
        /// Classification method: ml (maximum likelihood) or md (minimum distance)
        #[arg(long, default_value = "ml")]
        method: String,
        /// RNG seed for the train/test split
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn done(name: &str, path: &Path, elapsed: std::time::Duration) {
    println!("{} saved to: {}", name, path.display());
    println!("  Processing time: {:.2?}", elapsed);
}

fn parse_bounds(s: &str) -> Result<BoundingBox> {
    let parts: Vec<f64> = s
        .split(',')
        .map(|p| p.trim().parse::<f64>().context("invalid bounds component"))
        .collect::<Result<_>>()?;
    if parts.len() != 4 {
        anyhow::bail!("bounds must be 'xmin,ymin,xmax,ymax', got: {}", s);
    }
    Ok(BoundingBox::new(parts[0], parts[1], parts[2], parts[3]))
}

fn select_rows(features: &Array2<f64>, indices: &[usize]) -> Array2<f64> {
    features.select(Axis(0), indices)
}

/// Export a subset under `<dir>/<stem>.csv` and `<dir>/<stem>.geojson`.
fn export_tabular(dir: &Path, stem: &str, set: &SampleSet) -> Result<()> {
    write_samples_csv(dir.join(format!("{stem}.csv")), set)
        .with_context(|| format!("Failed to write {stem}.csv"))?;
    write_geojson(dir.join(format!("{stem}.geojson")), set)
        .with_context(|| format!("Failed to write {stem}.geojson"))?;
    Ok(())
}

/// Export a subset as a zipped shapefile under `<dir>/<stem>.shp`.
fn export_shapefile(dir: &Path, stem: &str, set: &SampleSet) -> Result<PathBuf> {
    let shp = dir.join(format!("{stem}.shp"));
    write_shapefile(&shp, set).with_context(|| format!("Failed to write {stem}.shp"))?;
    let zip = zip_shapefile(&shp).with_context(|| format!("Failed to package {stem}.zip"))?;
    Ok(zip)
}

// ─── Command handlers ───────────────────────────────────────────────────

#[allow(clippy::too_many_arguments)]
fn run_prepare(
    input: PathBuf,
    output: PathBuf,
    country: String,
    buffer: f64,
    negative_ratio: f64,
    min_distance: f64,
    attempts_per_negative: usize,
    seed: Option<u64>,
) -> Result<()> {
    let start = Instant::now();
    std::fs::create_dir_all(&output).context("Failed to create output directory")?;

    // 1. Inventory
    let pb = spinner("Reading inventory...");
    let records = read_inventory(&input).context("Failed to read inventory")?;
    let subset = filter_country(&records, &country);
    pb.finish_and_clear();
    if subset.is_empty() {
        let codes: std::collections::BTreeSet<&str> =
            records.iter().map(|r| r.country.as_str()).collect();
        anyhow::bail!(
            "no inventory rows for country {country}; available codes: {:?}",
            codes
        );
    }
    info!(count = subset.len(), country = %country, "inventory subset");

    // 2. Reproject to WGS84
    let projected: Vec<(f64, f64)> = subset.iter().map(|r| (r.x, r.y)).collect();
    let coords = reproject_inventory(&projected).context("Failed to reproject inventory")?;
    let (lon_min, lon_max) = coords
        .iter()
        .fold((f64::MAX, f64::MIN), |(lo, hi), &(lon, _)| (lo.min(lon), hi.max(lon)));
    info!("longitude range: {lon_min:.2} to {lon_max:.2}");

    // 3. Positive samples
    let mut positives = SampleSet::new();
    for (record, &(lon, lat)) in subset.iter().zip(&coords) {
        positives.push(Sample::positive(
            record.wind_id.clone(),
            lon,
            lat,
            record.turbines,
            buffer,
        ));
    }

    // 4. Negative samples
    let target = (positives.len() as f64 * negative_ratio).round() as usize;
    let params = SamplerParams {
        target_count: target,
        min_distance,
        max_attempts: target.saturating_mul(attempts_per_negative),
        seed,
    };
    let pb = spinner(&format!("Sampling {target} negatives..."));
    let accepted = sample_negatives(&positives.centers(), country_bounds(), &params)
        .context("Negative sampling failed")?;
    pb.finish_and_clear();

    let mut combined = positives.clone();
    for (i, &(lon, lat)) in accepted.iter().enumerate() {
        combined.push(Sample::negative(i, lon, lat, buffer));
    }
    println!(
        "Samples: {} total ({} positive, {} negative)",
        combined.len(),
        combined.positive_count(),
        combined.negative_count()
    );

    // 5. Exports
    let pb = spinner("Writing exports...");
    export_tabular(&output, "all_samples", &combined)?;
    for region in Region::NAMED {
        let subset = combined.by_region(region);
        if subset.is_empty() {
            continue;
        }
        export_tabular(&output, &format!("{}_samples", region.name()), &subset)?;
    }
    let (north, south) = combined.split_at_latitude(NORTH_SOUTH_SPLIT_LAT);
    if !north.is_empty() {
        export_tabular(&output, "north_samples", &north)?;
    }
    if !south.is_empty() {
        export_tabular(&output, "south_samples", &south)?;
    }
    export_shapefile(&output, "all_samples", &combined)?;
    export_shapefile(
        &output,
        "positive_samples",
        &combined.by_class(SampleClass::Turbine),
    )?;
    export_shapefile(
        &output,
        "negative_samples",
        &combined.by_class(SampleClass::Background),
    )?;
    write_summary(output.join("data_summary.txt"), &combined)
        .context("Failed to write summary report")?;
    pb.finish_and_clear();

    done("Prepared dataset", &output, start.elapsed());
    Ok(())
}

fn run_sample(
    positives_path: PathBuf,
    output: PathBuf,
    count: usize,
    min_distance: f64,
    max_attempts: Option<usize>,
    bounds: Option<String>,
    buffer: f64,
    seed: Option<u64>,
) -> Result<()> {
    let start = Instant::now();

    let existing = read_samples_csv(&positives_path).context("Failed to read sample CSV")?;
    let region = match bounds {
        Some(s) => parse_bounds(&s)?,
        None => country_bounds(),
    };

    let params = SamplerParams {
        target_count: count,
        min_distance,
        max_attempts: max_attempts.unwrap_or_else(|| count.saturating_mul(10)),
        seed,
    };
    let pb = spinner(&format!("Sampling {count} negatives..."));
    let accepted = sample_negatives(&existing.centers(), region, &params)
        .context("Negative sampling failed")?;
    pb.finish_and_clear();

    let mut negatives = SampleSet::new();
    for (i, &(lon, lat)) in accepted.iter().enumerate() {
        negatives.push(Sample::negative(i, lon, lat, buffer));
    }
    write_samples_csv(&output, &negatives).context("Failed to write negatives CSV")?;

    println!("Accepted {} of {} requested negatives", negatives.len(), count);
    done("Negative samples", &output, start.elapsed());
    Ok(())
}

fn run_scripts(output: PathBuf, user: String, trees: u32, cloud_threshold: u8) -> Result<()> {
    let start = Instant::now();
    let params = ScriptParams {
        username: user,
        tree_count: trees,
        cloud_threshold,
        ..ScriptParams::default()
    };
    let written = write_all_scripts(&output, &params).context("Failed to generate scripts")?;
    for path in &written {
        println!("Generated {}", path.display());
    }
    done("Prediction scripts", &output, start.elapsed());
    Ok(())
}

fn run_train(
    data_dir: PathBuf,
    models_dir: PathBuf,
    test_fraction: f64,
    method: String,
    seed: u64,
) -> Result<()> {
    std::fs::create_dir_all(&models_dir).context("Failed to create models directory")?;

    for region in Region::NAMED {
        let csv_path = data_dir.join(format!("{}_samples.csv", region.name()));
        let set = match read_samples_csv(&csv_path) {
            Ok(set) => set,
            Err(windprep_core::Error::MissingInput(path)) => {
                warn!("{} not found, skipping region", path.display());
                continue;
            }
            Err(e) => return Err(e).context("Failed to read region samples"),
        };
        if set.positive_count() < 2 || set.negative_count() < 2 {
            warn!(
                region = region.name(),
                positives = set.positive_count(),
                negatives = set.negative_count(),
                "not enough samples of each class, skipping region"
            );
            continue;
        }

        let (features, labels) = geometric_features(&set).context("Feature extraction failed")?;
        let (train_idx, test_idx) = train_test_split(&labels, test_fraction, seed)
            .context("Train/test split failed")?;

        let train_features = select_rows(&features, &train_idx);
        let train_labels: Vec<u8> = train_idx.iter().map(|&i| labels[i]).collect();
        let test_features = select_rows(&features, &test_idx);
        let test_labels: Vec<u8> = test_idx.iter().map(|&i| labels[i]).collect();

        let signatures = signatures_from_training(&train_features, &train_labels)
            .context("Signature estimation failed")?;
        let predicted = match method.as_str() {
            "ml" | "maximum-likelihood" => maximum_likelihood(&test_features, &signatures),
            "md" | "minimum-distance" => minimum_distance(&test_features, &signatures),
            _ => anyhow::bail!("unknown method: {method}. Use ml or md."),
        }
        .context("Classification failed")?;

        let matrix = ConfusionMatrix::from_predictions(&test_labels, &predicted)
            .context("Evaluation failed")?;
        println!("\n=== {} EVALUATION ===", region.name().to_uppercase());
        println!("{matrix}");
        for class in [0u8, 1u8] {
            println!(
                "class {class}: precision {:.4}  recall {:.4}  f1 {:.4}",
                matrix.precision(class),
                matrix.recall(class),
                matrix.f1(class)
            );
        }

        let model_path = models_dir.join(format!("{}_signatures.json", region.name()));
        let json = serde_json::to_string_pretty(&signatures)
            .context("Failed to serialize signatures")?;
        std::fs::write(&model_path, json).context("Failed to write signature file")?;
        println!("Signatures saved to {}", model_path.display());
    }
    Ok(())
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        Commands::Prepare {
            input,
            output,
            country,
            buffer,
            negative_ratio,
            min_distance,
            attempts_per_negative,
            seed,
        } => run_prepare(
            input,
            output,
            country,
            buffer,
            negative_ratio,
            min_distance,
            attempts_per_negative,
            seed,
        ),
        Commands::Sample {
            positives,
            output,
            count,
            min_distance,
            max_attempts,
            bounds,
            buffer,
            seed,
        } => run_sample(
            positives,
            output,
            count,
            min_distance,
            max_attempts,
            bounds,
            buffer,
            seed,
        ),
        Commands::Scripts {
            output,
            user,
            trees,
            cloud_threshold,
        } => run_scripts(output, user, trees, cloud_threshold),
        Commands::Train {
            data_dir,
            models_dir,
            test_fraction,
            method,
            seed,
        } => run_train(data_dir, models_dir, test_fraction, method, seed),
    }
}
