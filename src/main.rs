use chrono::NaiveDate;
use clap::Parser;
use findings_dashboard::{
    DashboardError, DateRange, FilterCriteria, PipelineConfig, Session, Variant,
};
use log::info;
use std::path::PathBuf;
use std::process::ExitCode;

/// Load an audit findings sheet, filter it and print the dashboard data as JSON
#[derive(Parser, Debug)]
#[command(name = "findings", version, about)]
struct Args {
    /// CSV or XLSX file to load
    file: PathBuf,

    /// Built-in dashboard variant
    #[arg(long, value_enum, default_value = "finding-recap", conflicts_with = "config")]
    variant: Variant,

    /// JSON pipeline configuration, instead of a built-in variant
    #[arg(long)]
    config: Option<PathBuf>,

    /// Case-insensitive text to look for in any column
    #[arg(long, default_value = "")]
    search: String,

    #[arg(long = "category")]
    categories: Vec<String>,

    #[arg(long = "status")]
    statuses: Vec<String>,

    #[arg(long = "area")]
    areas: Vec<String>,

    #[arg(long)]
    due_from: Option<NaiveDate>,

    #[arg(long)]
    due_to: Option<NaiveDate>,

    #[arg(long)]
    closed_from: Option<NaiveDate>,

    #[arg(long)]
    closed_to: Option<NaiveDate>,

    /// Write the filtered records as CSV
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Write the filtered records (and summary sheet, if configured) as XLSX
    #[arg(long)]
    xlsx: Option<PathBuf>,
}

impl Args {
    fn criteria(&self) -> FilterCriteria {
        FilterCriteria {
            due: DateRange::new(self.due_from, self.due_to),
            closing: DateRange::new(self.closed_from, self.closed_to),
            categories: self.categories.clone(),
            statuses: self.statuses.clone(),
            areas: self.areas.clone(),
            search: self.search.clone(),
        }
    }
}

fn run(args: &Args) -> Result<(), DashboardError> {
    let config = match &args.config {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::preset(args.variant),
    };

    let mut session = Session::from_path(&args.file, config)?;
    session.set_criteria(args.criteria());

    let view = session.view()?;
    println!("{}", serde_json::to_string_pretty(&view)?);

    if let Some(path) = &args.csv {
        std::fs::write(path, session.export_csv()?)?;
        info!("wrote {}", path.display());
    }
    if let Some(path) = &args.xlsx {
        std::fs::write(path, session.export_xlsx()?)?;
        info!("wrote {}", path.display());
    }

    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
