//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - trains the two model stages and saves artifacts
//! - loads artifacts and predicts (scripted flags or interactive prompts)
//! - generates synthetic sample CSVs

use clap::Parser;

use crate::cli::prompt;
use crate::cli::{Command, InteractiveArgs, PredictArgs, SampleArgs, TrainArgs};
use crate::domain::{EventQuery, SampleConfig, TrainConfig};
use crate::error::AppError;
use crate::geocode::GeocodeClient;

pub mod pipeline;

/// Entry point for the `stormcast` binary.
pub fn run() -> Result<(), AppError> {
    // We want `stormcast` and `stormcast -m models` to behave like
    // `stormcast interactive ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of the
    // argv list before parsing. This preserves a clean clap structure while
    // retaining the requested UX.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Train(args) => handle_train(args),
        Command::Predict(args) => handle_predict(args),
        Command::Interactive(args) => handle_interactive(args),
        Command::Sample(args) => handle_sample(args),
    }
}

fn handle_train(args: TrainArgs) -> Result<(), AppError> {
    let config = train_config_from_args(&args);
    let out = pipeline::train_models(&config)?;

    // Save before printing; the summary claims the artifacts exist.
    pipeline::save_models(&config.model_dir, &out.model)?;

    println!(
        "{}",
        crate::report::format_train_summary(
            &out.ingest,
            &out.classifier_eval,
            &out.regressor_eval,
            out.regressor_rows,
            &out.direction_labels,
            &config,
        )
    );
    Ok(())
}

fn handle_predict(args: PredictArgs) -> Result<(), AppError> {
    let month = prompt::parse_month(&args.month).map_err(|msg| AppError::new(2, msg))?;
    let (lat, lon) = resolve_location(&args)?;
    let query = EventQuery {
        month,
        day: args.day,
        hour: args.hour,
        lat,
        lon,
    };
    query.validate().map_err(|msg| AppError::new(2, msg))?;

    let model = pipeline::load_models(&args.model_dir)?;
    let result = model.predict_outcome(&query)?;

    println!("{}", crate::report::format_prediction(&result));
    Ok(())
}

/// Coordinates come straight from `--lat`/`--lon` or from geocoding `--place`.
fn resolve_location(args: &PredictArgs) -> Result<(f64, f64), AppError> {
    if let Some(place) = &args.place {
        let geocoder = GeocodeClient::from_env()?;
        let Some(hit) = geocoder.lookup(place)? else {
            return Err(AppError::new(2, format!("No location found for '{place}'.")));
        };
        println!("Using {} ({:.4}, {:.4})", hit.name, hit.lat, hit.lon);
        return Ok((hit.lat, hit.lon));
    }
    match (args.lat, args.lon) {
        (Some(lat), Some(lon)) => Ok((lat, lon)),
        _ => Err(AppError::new(2, "Provide --lat and --lon, or --place.")),
    }
}

fn handle_interactive(args: InteractiveArgs) -> Result<(), AppError> {
    // Load up front so a missing model directory fails before any prompt.
    let model = pipeline::load_models(&args.model_dir)?;
    let geocoder = GeocodeClient::from_env()?;

    println!("stormcast - hypothetical storm outcome calculator");
    loop {
        let Some(query) = prompt::prompt_for_query(&geocoder)? else {
            println!("Bye.");
            return Ok(());
        };

        let result = model.predict_outcome(&query)?;
        println!("\n{}", crate::report::format_prediction(&result));
        println!();
    }
}

fn handle_sample(args: SampleArgs) -> Result<(), AppError> {
    let config = SampleConfig {
        out_path: args.out,
        count: args.count,
        seed: args.seed,
    };
    let summary = crate::data::generate_sample(&config)?;

    println!(
        "{}",
        crate::report::format_sample_summary(&summary, &config)
    );
    Ok(())
}

pub fn train_config_from_args(args: &TrainArgs) -> TrainConfig {
    TrainConfig {
        csv_path: args.csv.clone(),
        model_dir: args.model_dir.clone(),
        seed: args.seed,
        max_row_errors: args.max_row_errors,
    }
}

/// Rewrite argv so `stormcast` defaults to `stormcast interactive`.
///
/// Rules:
/// - `stormcast`                     -> `stormcast interactive`
/// - `stormcast -m dir ...`          -> `stormcast interactive -m dir ...`
/// - `stormcast --help/--version/-h` -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("interactive".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(
        arg1.as_str(),
        "train" | "predict" | "interactive" | "sample"
    );
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "interactive flags".
    if arg1.starts_with('-') {
        argv.insert(1, "interactive".to_string());
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_defaults_to_interactive() {
        assert_eq!(
            rewrite_args(args(&["stormcast"])),
            args(&["stormcast", "interactive"])
        );
    }

    #[test]
    fn leading_flag_goes_to_interactive() {
        assert_eq!(
            rewrite_args(args(&["stormcast", "-m", "models"])),
            args(&["stormcast", "interactive", "-m", "models"])
        );
    }

    #[test]
    fn subcommands_and_help_pass_through() {
        assert_eq!(
            rewrite_args(args(&["stormcast", "train", "-f", "x.csv"])),
            args(&["stormcast", "train", "-f", "x.csv"])
        );
        assert_eq!(
            rewrite_args(args(&["stormcast", "--help"])),
            args(&["stormcast", "--help"])
        );
        assert_eq!(
            rewrite_args(args(&["stormcast", "-V"])),
            args(&["stormcast", "-V"])
        );
    }
}
