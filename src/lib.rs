//! Taxascore - taxonomic inference and scoring for vision model outputs.
//!
//! Turns a flat vector of per-leaf-class model probabilities into the
//! best-supported path through a biological taxonomy tree, optionally blended
//! with geographic/temporal occurrence-frequency priors.

#![warn(missing_docs)]

pub mod classifier;
pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod frequency;
pub mod output;
pub mod taxonomy;
pub mod utils;

use classifier::{
    ClassifyOptions, ObservationContext, PredictionHistory, TaxonClassifier, TaxonFilter,
};
use clap::Parser;
use cli::{Cli, ClassifyArgs, Command};
use config::{Config, OutputFormat, config_file_path, load_default_config, save_default_config};
use frequency::OfflineFrequencyStore;
use output::{CsvWriter, JsonSettings, progress, write_json};
use std::path::{Path, PathBuf};
use taxonomy::{MappingTable, Resolved, TaxonomyStore};
use tracing::{error, info, warn};

pub use error::{Error, Result};

/// File extension of score vector files collected from directories.
const SCORE_FILE_EXTENSION: &str = "scores";

/// Main entry point for the taxascore CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.classify.verbose, cli.classify.quiet);

    let config = load_default_config()?;

    if let Some(command) = cli.command {
        return handle_command(command, &config);
    }

    if cli.inputs.is_empty() {
        println!("No inputs given. Usage: taxascore <scores-file>...");
        println!("Run 'taxascore --help' for all options.");
        std::process::exit(0);
    }

    classify_files(&cli.inputs, &cli.classify, &config)
}

/// Classify input score vector files with the given options.
fn classify_files(inputs: &[PathBuf], args: &ClassifyArgs, config: &Config) -> Result<()> {
    use std::time::Instant;

    let total_start = Instant::now();

    let files = collect_input_files(inputs)?;
    if files.is_empty() {
        return Err(Error::NoInputFiles);
    }
    info!("Found {} score vector file(s) to classify", files.len());

    let classifier = build_classifier(args, config)?;
    info!(
        "Loaded taxonomy: {} nodes, {} leaf classes",
        classifier.store().len(),
        classifier.leaf_count()
    );

    let options = build_options(args, config, classifier.store())?;
    if let Some(context) = options.context {
        info!(
            "Frequency blending enabled: lat={:.4}, lon={:.4}, date={}",
            context.latitude, context.longitude, context.date
        );
    }
    if let Some(ref filter) = options.filter {
        info!(
            "Taxon filter enabled: taxon={}, negate={}",
            filter.taxon_id, filter.negate
        );
    }

    let formats = args
        .format
        .clone()
        .unwrap_or_else(|| config.defaults.formats.clone());

    let progress_enabled = !args.quiet && !args.no_progress;
    let file_progress = progress::create_file_progress(files.len(), progress_enabled);

    let mut history = args.smooth.then(PredictionHistory::default);
    let mut processed = 0;
    let mut errors = 0;

    for file in &files {
        match classify_one(file, &classifier, &options, &formats, args, history.as_mut()) {
            Ok(()) => processed += 1,
            Err(e) => {
                error!("Failed to classify {}: {}", file.display(), e);
                errors += 1;
                if args.fail_fast {
                    progress::finish_progress(file_progress, "Failed");
                    return Err(e);
                }
            }
        }
        progress::inc_progress(file_progress.as_ref());
    }

    progress::finish_progress(file_progress, "Complete");

    let total_duration = total_start.elapsed().as_secs_f64();
    info!(
        "Complete: {} classified, {} errors in {:.2}s",
        processed, errors, total_duration
    );
    if errors > 0 && !args.fail_fast {
        warn!("{} file(s) had errors", errors);
    }

    Ok(())
}

/// Classify a single score vector file and write the requested outputs.
fn classify_one(
    file: &Path,
    classifier: &TaxonClassifier,
    options: &ClassifyOptions,
    formats: &[OutputFormat],
    args: &ClassifyArgs,
    history: Option<&mut PredictionHistory>,
) -> Result<()> {
    let scores = utils::score_vector::read_score_vector(file)?;
    let mut branch = classifier.classify(&scores, options)?;

    if let Some(history) = history {
        history.accept(&branch);
        branch = history.backfill(branch);
    }

    if let Some(best) = branch.last() {
        info!(
            "{}: {} ({}) score {:.4}",
            file.display(),
            best.name,
            best.rank_name,
            best.combined_score
        );
    }

    let output_dir = output_dir_for(file, args.output_dir.as_deref());
    std::fs::create_dir_all(&output_dir).map_err(|e| Error::OutputDirCreateFailed {
        path: output_dir.clone(),
        source: e,
    })?;
    let stem = file
        .file_stem()
        .map_or_else(|| "result".to_string(), |s| s.to_string_lossy().to_string());
    let source_file = file
        .file_name()
        .map_or_else(String::new, |s| s.to_string_lossy().to_string());

    for format in formats {
        match format {
            OutputFormat::Json => {
                let path =
                    output_dir.join(format!("{stem}{}", constants::output_extensions::JSON));
                write_json(&path, &source_file, json_settings(options), &branch)?;
            }
            OutputFormat::Csv => {
                let path =
                    output_dir.join(format!("{stem}{}", constants::output_extensions::CSV));
                let mut writer = CsvWriter::new(&path)?;
                writer.write_header()?;
                for prediction in &branch {
                    writer.write_prediction(prediction)?;
                }
                writer.finish()?;
            }
        }
    }

    Ok(())
}

/// Resolve the output directory for an input file.
fn output_dir_for(file: &Path, output_dir: Option<&Path>) -> PathBuf {
    output_dir.map_or_else(
        || file.parent().map_or_else(|| PathBuf::from("."), Path::to_path_buf),
        Path::to_path_buf,
    )
}

/// Expand the input paths: files pass through, directories contribute their
/// score vector files.
fn collect_input_files(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut entries: Vec<PathBuf> = std::fs::read_dir(input)?
                .filter_map(std::result::Result::ok)
                .map(|entry| entry.path())
                .filter(|path| {
                    path.is_file()
                        && path
                            .extension()
                            .is_some_and(|ext| ext == SCORE_FILE_EXTENSION)
                })
                .collect();
            entries.sort();
            files.extend(entries);
        } else if input.is_file() {
            files.push(input.clone());
        } else {
            warn!("Input does not exist, skipping: {}", input.display());
        }
    }
    Ok(files)
}

/// Build the classifier from CLI arguments and configuration.
fn build_classifier(args: &ClassifyArgs, config: &Config) -> Result<TaxonClassifier> {
    let taxonomy_path = args
        .taxonomy
        .clone()
        .or_else(|| config.assets.taxonomy.clone())
        .ok_or_else(|| Error::ConfigValidation {
            message: "no taxonomy specified (use -t or set assets.taxonomy in config)".to_string(),
        })?;
    let store = TaxonomyStore::load(&taxonomy_path)?;

    let mut classifier = TaxonClassifier::new(store);

    if let Some(mapping_path) = args.mapping.clone().or_else(|| config.assets.mapping.clone()) {
        info!("Loading mapping table: {}", mapping_path.display());
        classifier = classifier.with_mapping(MappingTable::load(&mapping_path)?);
    }

    let wants_frequency = args.lat.is_some();
    if let Some(frequency_path) = args
        .frequency
        .clone()
        .or_else(|| config.assets.frequency.clone())
    {
        info!("Loading frequency store: {}", frequency_path.display());
        classifier =
            classifier.with_frequency(Box::new(OfflineFrequencyStore::load(&frequency_path)?));
    } else if wants_frequency {
        return Err(Error::ConfigValidation {
            message: "location given but no frequency store configured (use --frequency or set assets.frequency in config)"
                .to_string(),
        });
    }

    Ok(classifier)
}

/// Build per-call options from CLI arguments and configuration defaults.
///
/// A filter taxon that does not exist in the loaded taxonomy is rejected here
/// rather than silently producing an all-zero result.
fn build_options(
    args: &ClassifyArgs,
    config: &Config,
    store: &TaxonomyStore,
) -> Result<ClassifyOptions> {
    if let Some(taxon_id) = &args.taxon {
        if store.by_taxon_id(taxon_id).is_none() {
            return Err(Error::TaxonNotFound {
                taxon_id: taxon_id.clone(),
            });
        }
    }
    let filter = args.taxon.clone().map(|taxon_id| TaxonFilter {
        taxon_id,
        negate: args.negate,
    });

    let context = match (args.lat, args.lon, args.date) {
        (Some(latitude), Some(longitude), Some(date)) => Some(ObservationContext {
            date,
            latitude,
            longitude,
        }),
        _ => None,
    };

    Ok(ClassifyOptions {
        filter,
        score_threshold: args.score_threshold.or(config.defaults.score_threshold),
        ancestor_threshold: Some(
            args.ancestor_threshold
                .unwrap_or(config.defaults.ancestor_threshold),
        ),
        context,
    })
}

/// JSON settings block for the current options.
fn json_settings(options: &ClassifyOptions) -> JsonSettings {
    JsonSettings {
        ancestor_threshold: options
            .ancestor_threshold
            .unwrap_or(constants::DEFAULT_ANCESTOR_THRESHOLD),
        score_threshold: options.score_threshold,
        filter_taxon: options.filter.as_ref().map(|f| f.taxon_id.clone()),
        filter_negated: options.filter.as_ref().map(|f| f.negate),
        lat: options.context.map(|c| c.latitude),
        lon: options.context.map(|c| c.longitude),
        date: options.context.map(|c| c.date),
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter_str = if quiet {
        "warn"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_str));

    fmt().with_env_filter(filter).init();
}

fn handle_command(command: Command, config: &Config) -> Result<()> {
    match command {
        Command::Config { action } => handle_config_command(action),
        Command::Taxonomy { action } => handle_taxonomy_command(action, config),
    }
}

fn handle_config_command(action: cli::ConfigAction) -> Result<()> {
    use cli::ConfigAction;

    match action {
        ConfigAction::Init => {
            let path = config_file_path()?;
            if path.exists() {
                println!("Configuration file already exists: {}", path.display());
            } else {
                let config = Config::default();
                let saved_path = save_default_config(&config)?;
                println!("Created configuration file: {}", saved_path.display());
                println!("\nNext steps:");
                println!("  set assets.taxonomy (and optionally assets.mapping,");
                println!("  assets.frequency) to your asset files");
            }
            Ok(())
        }
        ConfigAction::Show => {
            let config = load_default_config()?;
            println!("{config:#?}");
            Ok(())
        }
        ConfigAction::Path => {
            let path = config_file_path()?;
            println!("{}", path.display());
            Ok(())
        }
    }
}

fn handle_taxonomy_command(action: cli::TaxonomyAction, config: &Config) -> Result<()> {
    use cli::TaxonomyAction;

    let taxonomy_path =
        config
            .assets
            .taxonomy
            .clone()
            .ok_or_else(|| Error::ConfigValidation {
                message: "no taxonomy configured (set assets.taxonomy in config)".to_string(),
            })?;

    match action {
        TaxonomyAction::Info => {
            let store = TaxonomyStore::load(&taxonomy_path)?;
            println!("Taxonomy: {}", taxonomy_path.display());
            println!("  Nodes: {}", store.len());
            println!("  Leaf classes: {}", store.leaf_count());
            println!(
                "  Taxonomy-top nodes: {}",
                store.node(store.root()).children.len()
            );
            if let Some(mapping_path) = &config.assets.mapping {
                let mapping = MappingTable::load(mapping_path)?;
                println!("Mapping: {}", mapping_path.display());
                println!("  Entries: {}", mapping.len());
            }
            Ok(())
        }
        TaxonomyAction::Check => {
            config::validate_config(config)?;
            let store = TaxonomyStore::load(&taxonomy_path)?;

            let mut problems = 0;
            for index in 0..store.leaf_count() {
                if store.by_leaf_index(index).is_none() {
                    println!("  missing node for leaf class index {index}");
                    problems += 1;
                }
            }
            if let Some(mapping_path) = &config.assets.mapping {
                let mapping = MappingTable::load(mapping_path)?;
                for id in 0..store.len() {
                    if let Resolved::Remapped(new_id) =
                        mapping.resolve(&store.node(id).taxon_id)
                    {
                        if store.by_taxon_id(new_id).is_none() {
                            println!(
                                "  taxon '{}' remaps to '{}' which is not in the taxonomy",
                                store.node(id).taxon_id,
                                new_id
                            );
                            problems += 1;
                        }
                    }
                }
            }

            if problems == 0 {
                println!("OK: {} nodes, {} leaf classes", store.len(), store.leaf_count());
            } else {
                println!("{problems} problem(s) found");
            }
            Ok(())
        }
    }
}
