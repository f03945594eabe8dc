use crate::infra::parse_date;
use chrono::{Local, NaiveDate};
use clap::Args;
use pps_analytics::dashboard::{
    ingest, AggregateStats, DashboardSnapshot, ExportFormat, ExportPipeline, FilterOptions,
    FilterSelection, Selector,
};
use pps_analytics::error::AppError;
use std::path::PathBuf;

/// Filter controls shared by `report` and `export`, mirroring the dashboard
/// dropdowns. Omitted flags mean "all".
#[derive(Args, Debug, Default)]
pub(crate) struct FilterArgs {
    #[arg(long)]
    pub(crate) region: Option<String>,
    #[arg(long)]
    pub(crate) district: Option<String>,
    #[arg(long)]
    pub(crate) sub_county: Option<String>,
    #[arg(long)]
    pub(crate) facility: Option<String>,
    #[arg(long)]
    pub(crate) ownership: Option<String>,
    #[arg(long)]
    pub(crate) level_of_care: Option<String>,
    #[arg(long)]
    pub(crate) ward_name: Option<String>,
    /// Earliest survey date to include (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub(crate) from_date: Option<NaiveDate>,
    /// Latest survey date to include (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub(crate) to_date: Option<NaiveDate>,
}

impl FilterArgs {
    pub(crate) fn selection(&self) -> FilterSelection {
        fn selector(value: &Option<String>) -> Selector {
            match value {
                Some(v) => Selector::only(v.clone()),
                None => Selector::All,
            }
        }

        FilterSelection {
            from_date: self.from_date,
            to_date: self.to_date,
            region: selector(&self.region),
            district: selector(&self.district),
            sub_county: selector(&self.sub_county),
            facility: selector(&self.facility),
            ownership: selector(&self.ownership),
            level_of_care: selector(&self.level_of_care),
            ward_name: selector(&self.ward_name),
        }
    }
}

#[derive(Args, Debug)]
pub(crate) struct ReportArgs {
    /// Patients CSV from a survey export
    #[arg(long)]
    pub(crate) patients_csv: PathBuf,
    #[command(flatten)]
    pub(crate) filters: FilterArgs,
    /// List every record passing the filters
    #[arg(long)]
    pub(crate) list_patients: bool,
}

#[derive(Args, Debug)]
pub(crate) struct ExportArgs {
    /// Patients CSV from a survey export
    #[arg(long)]
    pub(crate) patients_csv: PathBuf,
    /// Output format: csv, json or pdf
    #[arg(long)]
    pub(crate) format: ExportFormat,
    /// Directory to write into (defaults to the current directory); the
    /// filename is always the artifact's own dated name
    #[arg(long)]
    pub(crate) out: Option<PathBuf>,
    #[command(flatten)]
    pub(crate) filters: FilterArgs,
}

pub(crate) fn run_report(args: ReportArgs) -> Result<(), AppError> {
    let patients = ingest::patients_from_path(&args.patients_csv)?;
    let selection = args.filters.selection();

    println!("Point Prevalence Survey report");
    println!(
        "Source: {} ({} records)",
        args.patients_csv.display(),
        patients.len()
    );

    let active = selection.active_fields();
    if active.is_empty() {
        println!("Filters: none");
    } else {
        println!("Filters:");
        for (field, value) in &active {
            println!("- {field}: {value}");
        }
    }

    let options = FilterOptions::derive(&patients, &selection);
    println!("\nAvailable options at this level");
    println!("- regions: {}", format_options(&options.regions));
    println!("- districts: {}", format_options(&options.districts));
    println!("- sub-counties: {}", format_options(&options.sub_counties));
    println!("- facilities: {}", format_options(&options.facilities));
    println!("- wards: {}", format_options(&options.ward_names));
    println!("- ownership: {}", format_options(&options.ownerships));
    println!("- levels of care: {}", format_options(&options.levels_of_care));

    let stats = AggregateStats::for_selection(&patients, &selection);
    let prevalence = if stats.total_patients > 0 {
        stats.patients_on_antibiotic as f64 / stats.total_patients as f64 * 100.0
    } else {
        0.0
    };
    println!("\nAggregate statistics");
    println!("- patients: {}", stats.total_patients);
    println!(
        "- on antibiotics: {} ({prevalence:.1}%)",
        stats.patients_on_antibiotic
    );

    println!("\nPatients by region");
    for entry in &stats.by_region {
        println!("- {}: {}", entry.region, entry.count);
    }
    println!("\nPatients by facility");
    for entry in &stats.by_facility {
        println!("- {}: {}", entry.facility, entry.count);
    }
    println!("\nPatients by ward");
    for entry in &stats.by_ward {
        println!("- {}: {}", entry.ward, entry.count);
    }

    if args.list_patients {
        println!("\nMatching records");
        for patient in patients
            .iter()
            .filter(|p| pps_analytics::dashboard::filters::matches(p, &selection))
        {
            println!(
                "- {} | {} | {} | {} | on antibiotics: {}",
                display_or_dash(&patient.patient_code),
                display_or_dash(&patient.region),
                display_or_dash(&patient.facility),
                display_or_dash(&patient.ward_name),
                display_or_dash(&patient.patient_on_antibiotic),
            );
        }
    }

    Ok(())
}

pub(crate) async fn run_export(args: ExportArgs) -> Result<(), AppError> {
    let patients = ingest::patients_from_path(&args.patients_csv)?;
    let selection = args.filters.selection();
    let snapshot = DashboardSnapshot::capture(&patients, &selection, Local::now().date_naive());

    let pipeline = ExportPipeline::default();
    let artifact = pipeline.export(args.format, &snapshot).await?;

    let path = args
        .out
        .unwrap_or_else(|| PathBuf::from("."))
        .join(&artifact.filename);
    std::fs::write(&path, &artifact.bytes)?;
    println!(
        "Wrote {} ({} bytes, {})",
        path.display(),
        artifact.bytes.len(),
        artifact.content_type
    );

    Ok(())
}

fn format_options(values: &[String]) -> String {
    if values.is_empty() {
        "(none at this level)".to_string()
    } else {
        values.join(", ")
    }
}

fn display_or_dash(value: &str) -> &str {
    if value.is_empty() {
        "-"
    } else {
        value
    }
}
