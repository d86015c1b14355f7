//! # Calcfolio CLI
//!
//! Terminal front end for the unit converter and the decimal to fraction
//! calculator. Every command prints a human-readable summary, or JSON with
//! `--json` for scripting.

mod logging;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;

use calc_core::errors::CalcResult;
use calc_core::format::{format_or_undefined, parse_number, FormatOptions};
use calc_core::fraction::{parse_fraction, to_fraction_with, FractionConversion};
use calc_core::ledger::{Ledger, LedgerStore, PairUsage, RecentConversion};
use calc_core::units::{
    catalog, conversion_formula, convert, quick_values, related_conversions, CategoryId,
    ConversionFormula, QuickValue, Unit, DEFAULT_QUICK_VALUES,
};
use calc_core::{JsonFileStore, Settings};

#[derive(Parser)]
#[command(name = "calc_cli")]
#[command(about = "Unit conversion and decimal/fraction calculators", long_about = None)]
struct Cli {
    /// Settings file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Persist recent conversions to this JSON file
    #[arg(long, global = true)]
    ledger: Option<PathBuf>,

    /// Print machine-readable JSON
    #[arg(long, global = true)]
    json: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a value between two units of a category
    Convert {
        /// Category slug (e.g. "length", "temperature")
        category: String,

        /// Value to convert
        #[arg(allow_hyphen_values = true)]
        value: String,

        /// Source unit id (e.g. "kilometer")
        from: String,

        /// Target unit id (e.g. "mile")
        to: String,

        /// Also print the quick-values table
        #[arg(long)]
        quick: bool,
    },

    /// Reduce a decimal to a fraction, or evaluate "3/4" and "1 1/2"
    Fraction {
        #[arg(allow_hyphen_values = true)]
        input: String,
    },

    /// List categories, or the units of one category
    Units {
        category: Option<String>,
    },

    /// List every conversion path, optionally for one category
    Paths {
        category: Option<String>,
    },

    /// Show recent conversions, newest first
    Recent {
        /// Maximum entries to show
        #[arg(short, long)]
        limit: Option<usize>,

        /// Show the most-used unit pairs instead
        #[arg(long)]
        frequent: bool,
    },

    /// Forget every recent conversion
    ClearRecent,
}

fn main() {
    let cli = Cli::parse();
    logging::init_logger(cli.verbose);

    if let Err(e) = run(&cli) {
        eprintln!("Error: {}", e);
        if cli.json {
            if let Ok(json) = serde_json::to_string_pretty(&e) {
                eprintln!("{}", json);
            }
        }
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> CalcResult<()> {
    let settings = match &cli.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };

    let ledger_path = cli.ledger.clone().or_else(|| settings.ledger.path.clone());
    match ledger_path {
        Some(path) => {
            log::info!("using ledger file {}", path.display());
            let mut ledger = Ledger::open(JsonFileStore::new(path), settings.ledger.capacity)?;
            execute(cli, &settings, &mut ledger)
        }
        None => {
            let mut ledger = Ledger::in_memory(settings.ledger.capacity)?;
            execute(cli, &settings, &mut ledger)
        }
    }
}

fn execute<S: LedgerStore>(cli: &Cli, settings: &Settings, ledger: &mut Ledger<S>) -> CalcResult<()> {
    match &cli.command {
        Commands::Convert {
            category,
            value,
            from,
            to,
            quick,
        } => {
            let output = convert_command(settings, ledger, category, value, from, to, *quick)?;
            if cli.json {
                print_json(&output)
            } else {
                print_conversion(&output, &settings.format);
                Ok(())
            }
        }
        Commands::Fraction { input } => {
            let output = fraction_command(settings, input)?;
            if cli.json {
                print_json(&output)
            } else {
                print_fraction(&output, &settings.format);
                Ok(())
            }
        }
        Commands::Units { category } => units_command(category.as_deref(), cli.json),
        Commands::Paths { category } => paths_command(category.as_deref(), cli.json),
        Commands::Recent { limit, frequent } => {
            let limit = limit.unwrap_or(ledger.capacity());
            if *frequent {
                let pairs = ledger.frequent_pairs(limit);
                if cli.json {
                    return print_json(&pairs);
                }
                print_pairs(&pairs);
            } else {
                let entries: Vec<&RecentConversion> = ledger.list().into_iter().take(limit).collect();
                if cli.json {
                    return print_json(&entries);
                }
                print_recent(&entries, &settings.format);
            }
            Ok(())
        }
        Commands::ClearRecent => {
            let removed = ledger.len();
            ledger.clear()?;
            log::info!("cleared {} recent conversions", removed);
            if !cli.json {
                println!("Cleared {} recent conversion(s).", removed);
            }
            Ok(())
        }
    }
}

// ============================================================================
// convert
// ============================================================================

#[derive(Debug, Serialize)]
struct ConversionOutput {
    category: CategoryId,
    value: f64,
    from: &'static Unit,
    to: &'static Unit,
    result: f64,
    display: String,
    formula: ConversionFormula,
    formula_text: String,
    related: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    quick_values: Option<Vec<QuickValue>>,
}

fn convert_command<S: LedgerStore>(
    settings: &Settings,
    ledger: &mut Ledger<S>,
    category: &str,
    value: &str,
    from_id: &str,
    to_id: &str,
    quick: bool,
) -> CalcResult<ConversionOutput> {
    let category_id: CategoryId = category.parse()?;
    let definition = catalog()?.get_category(category_id)?;
    let from = definition.member(from_id)?;
    let to = definition.member(to_id)?;
    let value = parse_number(value)?;

    let result = convert(value, from, to, definition)?;
    ledger.record(RecentConversion::new(category_id, from.id, to.id, value, result))?;

    let formula = conversion_formula(from, to, definition)?;
    let related = related_conversions(definition, from.id, to.id, 5)
        .into_iter()
        .map(|(f, t)| format!("{} → {}", f.name, t.name))
        .collect();
    let quick_values = if quick {
        Some(quick_values(from, to, definition, &DEFAULT_QUICK_VALUES)?)
    } else {
        None
    };

    let display = format!(
        "{} {} = {} {}",
        format_or_undefined(value, &settings.format),
        from.symbol,
        format_or_undefined(result, &settings.format),
        to.symbol
    );

    Ok(ConversionOutput {
        category: category_id,
        value,
        from,
        to,
        result,
        display,
        formula_text: formula.to_string(),
        formula,
        related,
        quick_values,
    })
}

fn print_conversion(output: &ConversionOutput, format: &FormatOptions) {
    println!("{}", output.display);
    println!();
    println!("Formula:  {}", output.formula_text);

    if output.quick_values.is_some() {
        println!();
        println!("{} to {}:", output.from.name, output.to.name);
        for line in quick_value_lines(output, format) {
            println!("{}", line);
        }
    }

    if !output.related.is_empty() {
        println!();
        println!("Related:");
        for line in &output.related {
            println!("  {}", line);
        }
    }
}

/// Quick-values table rows, formatted with the same options as the result
fn quick_value_lines(output: &ConversionOutput, format: &FormatOptions) -> Vec<String> {
    output
        .quick_values
        .iter()
        .flatten()
        .map(|row| {
            format!(
                "  {:>10} {:<6} {:>16} {}",
                format_or_undefined(row.input, format),
                output.from.symbol,
                format_or_undefined(row.output, format),
                output.to.symbol
            )
        })
        .collect()
}

// ============================================================================
// fraction
// ============================================================================

#[derive(Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
enum FractionOutput {
    /// A decimal reduced to a fraction
    Reduced {
        #[serde(flatten)]
        conversion: FractionConversion,
        steps: Vec<String>,
    },
    /// A typed fraction evaluated to a decimal
    Evaluated {
        input: String,
        simplified: String,
        decimal: f64,
    },
}

fn fraction_command(settings: &Settings, input: &str) -> CalcResult<FractionOutput> {
    if input.contains('/') {
        let fraction = parse_fraction(input)?;
        return Ok(FractionOutput::Evaluated {
            input: input.trim().to_string(),
            simplified: fraction.simplified().to_string(),
            decimal: fraction.to_f64(),
        });
    }

    let decimal = parse_number(input)?;
    let conversion = to_fraction_with(decimal, &settings.fraction)?;
    Ok(FractionOutput::Reduced {
        steps: conversion.steps(),
        conversion,
    })
}

fn print_fraction(output: &FractionOutput, format: &FormatOptions) {
    match output {
        FractionOutput::Reduced { conversion, steps } => {
            match &conversion.mixed {
                Some(mixed) => println!("{} = {} = {}", conversion.decimal, conversion.fraction, mixed),
                None => println!("{} = {}", conversion.decimal, conversion.fraction),
            }
            println!();
            println!("Steps:");
            for (i, step) in steps.iter().enumerate() {
                println!("  {}. {}", i + 1, step);
            }
            if conversion.approximated {
                println!();
                println!("Note: input has too many digits; the fraction is approximate.");
            }
        }
        FractionOutput::Evaluated {
            input,
            simplified,
            decimal,
        } => {
            println!("{} = {} = {}", input, simplified, format_or_undefined(*decimal, format));
        }
    }
}

// ============================================================================
// units / paths
// ============================================================================

#[derive(Serialize)]
struct CategoryListing {
    id: CategoryId,
    name: &'static str,
    units: &'static [Unit],
}

fn units_command(category: Option<&str>, json: bool) -> CalcResult<()> {
    let catalog = catalog()?;
    let categories = match category {
        Some(slug) => vec![catalog.get_category_by_slug(slug)?],
        None => catalog.categories().iter().collect(),
    };

    let listings: Vec<CategoryListing> = categories
        .into_iter()
        .map(|c| CategoryListing {
            id: c.id,
            name: c.id.display_name(),
            units: c.units,
        })
        .collect();

    if json {
        return print_json(&listings);
    }

    for listing in &listings {
        println!("{} ({})", listing.name, listing.id);
        for unit in listing.units {
            println!("  {:<20} {:<8} {}", unit.id, unit.symbol, unit.name);
        }
        println!();
    }
    Ok(())
}

fn paths_command(category: Option<&str>, json: bool) -> CalcResult<()> {
    let catalog = catalog()?;
    let filter = category.map(str::parse::<CategoryId>).transpose()?;
    let paths: Vec<_> = catalog
        .conversion_paths()
        .into_iter()
        .filter(|p| filter.map_or(true, |id| p.category == id))
        .collect();

    if json {
        return print_json(&paths);
    }

    for path in &paths {
        println!("{}", path.slug());
    }
    log::info!("{} conversion paths", paths.len());
    Ok(())
}

// ============================================================================
// recent
// ============================================================================

/// Symbol for a stored unit id, or the raw id once it no longer resolves
fn unit_label(category: CategoryId, unit_id: &str) -> String {
    calc_core::units::get_unit(category, unit_id)
        .map(|u| u.symbol.to_string())
        .unwrap_or_else(|_| unit_id.to_string())
}

fn print_recent(entries: &[&RecentConversion], format: &FormatOptions) {
    if entries.is_empty() {
        println!("No recent conversions.");
        return;
    }
    for entry in entries {
        println!(
            "{}  {:<12} {} {} = {} {}",
            entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
            entry.category,
            format_or_undefined(entry.value, format),
            unit_label(entry.category, &entry.from_unit),
            format_or_undefined(entry.result, format),
            unit_label(entry.category, &entry.to_unit)
        );
    }
}

fn print_pairs(pairs: &[PairUsage]) {
    if pairs.is_empty() {
        println!("No recent conversions.");
        return;
    }
    for pair in pairs {
        println!(
            "{:>4}×  {:<12} {} → {}",
            pair.count, pair.category, pair.from_unit, pair.to_unit
        );
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> CalcResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_convert_with_negative_value() {
        let cli = Cli::try_parse_from(["calc_cli", "convert", "temperature", "-40", "celsius", "fahrenheit"]).unwrap();
        match cli.command {
            Commands::Convert { value, from, .. } => {
                assert_eq!(value, "-40");
                assert_eq!(from, "celsius");
            }
            _ => panic!("expected convert"),
        }
    }

    #[test]
    fn test_convert_command_records_entry() {
        let settings = Settings::default();
        let mut ledger = Ledger::in_memory(5).unwrap();
        let output =
            convert_command(&settings, &mut ledger, "temperature", "-40", "celsius", "fahrenheit", true).unwrap();

        assert_eq!(output.result, -40.0);
        assert_eq!(output.display, "-40 °C = -40 °F");
        assert_eq!(output.quick_values.as_ref().map(Vec::len), Some(DEFAULT_QUICK_VALUES.len()));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_convert_command_rejects_unknown_unit() {
        let settings = Settings::default();
        let mut ledger = Ledger::in_memory(5).unwrap();
        let err = convert_command(&settings, &mut ledger, "length", "1", "meter", "pound", false).unwrap_err();
        assert_eq!(err.error_code(), "UNIT_MISMATCH");
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_quick_values_use_loaded_format() {
        let settings = Settings::from_json(r#"{ "format": { "max_decimals": 2 } }"#).unwrap();
        let mut ledger = Ledger::in_memory(5).unwrap();
        let output =
            convert_command(&settings, &mut ledger, "length", "1", "kilometer", "mile", true).unwrap();

        let lines = quick_value_lines(&output, &settings.format);
        assert_eq!(lines.len(), DEFAULT_QUICK_VALUES.len());
        assert!(lines[0].trim_end().ends_with("0.62 mi"), "{}", lines[0]);
        assert!(!lines[0].contains("0.621371"));
    }

    #[test]
    fn test_fraction_command_modes() {
        let settings = Settings::default();
        match fraction_command(&settings, "0.375").unwrap() {
            FractionOutput::Reduced { conversion, steps } => {
                assert_eq!(conversion.fraction.to_string(), "3/8");
                assert!(!steps.is_empty());
            }
            _ => panic!("expected reduced"),
        }
        match fraction_command(&settings, "1 1/2").unwrap() {
            FractionOutput::Evaluated { decimal, simplified, .. } => {
                assert_eq!(decimal, 1.5);
                assert_eq!(simplified, "3/2");
            }
            _ => panic!("expected evaluated"),
        }
    }

    #[test]
    fn test_verbose_flag_counts() {
        let cli = Cli::try_parse_from(["calc_cli", "-vv", "units"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }
}
