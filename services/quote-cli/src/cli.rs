use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use lease_quote::config::AppConfig;
use lease_quote::error::AppError;
use lease_quote::money::format_money;
use lease_quote::quote::matrix::{lowest_price_start_date, MoveInRange, RentMatrixImporter};
use lease_quote::quote::{LeaseTerm, LeaseTermId, PeriodUnit, PricingConfig};
use lease_quote::telemetry;

use crate::demo::{run_demo, DemoArgs};
use crate::infra::{load_request, property_today};
use crate::report::{price_request, render_quote};

#[derive(Parser, Debug)]
#[command(
    name = "lease-quote-cli",
    about = "Price leasing quotes and inspect rent matrices from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the payment schedule for every selected lease term of a quote request
    Schedule(ScheduleArgs),
    /// Inspect a rent matrix CSV export
    Matrix {
        #[command(subcommand)]
        command: MatrixCommand,
    },
    /// Price a built-in sample quote
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum MatrixCommand {
    /// Show the interval pricing a move-in date
    Lookup(LookupArgs),
    /// Find the cheapest move-in date across every term length
    Cheapest(CheapestArgs),
}

#[derive(Args, Debug)]
struct ScheduleArgs {
    /// Quote request JSON (terms, fees, optional rent matrix)
    #[arg(long)]
    request: PathBuf,
    /// Lease start date (YYYY-MM-DD). Overrides the request; defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    start: Option<NaiveDate>,
    /// Print the selections as JSON instead of a table
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct LookupArgs {
    /// Rent matrix CSV export
    #[arg(long)]
    matrix: PathBuf,
    /// Lease term length in months
    #[arg(long)]
    term: u32,
    /// Move-in date (YYYY-MM-DD)
    #[arg(long, value_parser = crate::infra::parse_date)]
    date: NaiveDate,
    /// Fall back to the closest interval when none contains the date
    #[arg(long)]
    closest: bool,
}

#[derive(Args, Debug)]
struct CheapestArgs {
    /// Rent matrix CSV export
    #[arg(long)]
    matrix: PathBuf,
    /// Earliest preferred move-in date (YYYY-MM-DD)
    #[arg(long, value_parser = crate::infra::parse_date)]
    from: Option<NaiveDate>,
    /// Latest preferred move-in date (YYYY-MM-DD)
    #[arg(long, value_parser = crate::infra::parse_date)]
    to: Option<NaiveDate>,
    /// Evaluation date (defaults to today)
    #[arg(long, value_parser = crate::infra::parse_date)]
    today: Option<NaiveDate>,
}

pub(crate) fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    match cli.command {
        Command::Schedule(args) => {
            let request = load_request(&args.request)?;
            let start = args
                .start
                .or(request.start_date)
                .unwrap_or_else(|| property_today(config.pricing));
            let quotes = price_request(&request, start, config.pricing)?;
            if args.json {
                let selections: Vec<_> = quotes.iter().map(|quote| &quote.selection).collect();
                println!("{}", serde_json::to_string_pretty(&selections)?);
            } else {
                render_quote(&quotes, start, config.pricing);
            }
            Ok(())
        }
        Command::Matrix {
            command: MatrixCommand::Lookup(args),
        } => run_lookup(args),
        Command::Matrix {
            command: MatrixCommand::Cheapest(args),
        } => run_cheapest(args, config.pricing),
        Command::Demo(args) => run_demo(args, config.pricing),
    }
}

fn run_lookup(args: LookupArgs) -> Result<(), AppError> {
    let matrix = RentMatrixImporter::from_path(&args.matrix)?;
    let Some(table) = matrix.table(args.term) else {
        println!("No {}-month rent table in {}", args.term, args.matrix.display());
        return Ok(());
    };

    match table.resolve(args.date, args.closest) {
        Some(found) => {
            println!(
                "{}-month rent for {}: {} (interval {} to {})",
                args.term,
                args.date,
                format_money(found.range.price),
                found.matched_key,
                found.range.end_date
            );
            if let Some(adjacent) = table.lowest_adjacent(args.date, None) {
                if adjacent.rent < found.range.price {
                    println!(
                        "Cheaper neighbouring interval: {} from {}",
                        format_money(adjacent.rent),
                        adjacent.end_date
                    );
                }
            }
        }
        None => println!("No {}-month interval contains {}", args.term, args.date),
    }
    Ok(())
}

fn run_cheapest(args: CheapestArgs, config: PricingConfig) -> Result<(), AppError> {
    let matrix = RentMatrixImporter::from_path(&args.matrix)?;
    let today = args.today.unwrap_or_else(|| property_today(config));
    let terms: Vec<LeaseTerm> = matrix
        .term_lengths()
        .map(|length| LeaseTerm::new(LeaseTermId(format!("{length}m")), length, PeriodUnit::Month))
        .collect();
    let preference = MoveInRange {
        min: args.from,
        max: args.to,
    };

    match lowest_price_start_date(Some(&matrix), &terms, &preference, today, true)? {
        Some(found) => println!(
            "Cheapest move-in: {} on a {}-month lease at {}",
            found.start_date,
            found.term_length,
            format_money(found.price)
        ),
        None => println!("No rent interval overlaps the requested window"),
    }
    Ok(())
}
