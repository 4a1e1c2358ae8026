use colored::Colorize;
use hie_replay::pipeline::PipelineReport;
use hie_replay::{RecordOutcome, ReplayStatus};
use serde_json::{Value, json};
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::cli::OutputFormat;

pub fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => print_error(&format!("Failed to render JSON: {e}")),
    }
}

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

pub fn print_table(header: &[&str], rows: Vec<Vec<String>>) {
    if rows.is_empty() {
        println!("No transactions matched.");
        return;
    }
    let mut builder = Builder::default();
    builder.push_record(header.iter().copied());
    for row in rows {
        builder.push_record(row);
    }
    let table = builder.build().with(Style::rounded()).to_string();
    println!("{table}");
}

fn status_label(status: &ReplayStatus) -> String {
    match status {
        ReplayStatus::Replayed { status } => format!("replayed ({status})"),
        ReplayStatus::DryRun => "dry run".to_string(),
        ReplayStatus::Failed(e) => format!("failed: {e}"),
    }
}

fn outcome_json(outcome: &RecordOutcome) -> Value {
    let (result, http_status, error) = match &outcome.result {
        ReplayStatus::Replayed { status } => ("replayed", Some(*status), None),
        ReplayStatus::DryRun => ("dry_run", None, None),
        ReplayStatus::Failed(e) => ("failed", None, Some(e.to_string())),
    };
    json!({
        "transaction": outcome.transaction_id,
        "resource": outcome.resource_id,
        "result": result,
        "httpStatus": http_status,
        "error": error,
    })
}

pub fn print_report(report: &PipelineReport, format: OutputFormat) {
    let counts = report.summary.counts();
    match format {
        OutputFormat::Json => {
            let outcomes: Vec<Value> = report.summary.outcomes.iter().map(outcome_json).collect();
            print_json(&json!({
                "fetched": report.fetched,
                "selected": report.selected,
                "counts": counts,
                "outcomes": outcomes,
            }));
        }
        OutputFormat::Table => {
            let rows = report
                .summary
                .outcomes
                .iter()
                .map(|o| {
                    vec![
                        o.transaction_id.clone().unwrap_or_else(|| "-".into()),
                        o.resource_id.clone().unwrap_or_else(|| "-".into()),
                        status_label(&o.result),
                    ]
                })
                .collect();
            print_table(&["Transaction", "Resource", "Result"], rows);
            println!(
                "Fetched {}, matched {}, {} replayed, {} dry run, {} payload errors, {} transport errors",
                report.fetched,
                report.selected,
                counts.replayed.to_string().green(),
                counts.skipped,
                counts.payload_errors.to_string().red(),
                counts.transport_errors.to_string().red(),
            );
        }
    }
}

