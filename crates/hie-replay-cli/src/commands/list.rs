use anyhow::{Context, Result};
use hie_replay::{ReplayConfig, TransactionRecord, prepare_payload, store};
use serde_json::{Value, json};

use crate::cli::{ListArgs, OutputFormat};
use crate::output::{print_json, print_table};

fn describe(record: &TransactionRecord) -> (String, Option<String>) {
    match record.body().map(prepare_payload) {
        Some(Ok(prepared)) => (prepared.id, None),
        Some(Err(e)) => ("-".to_string(), Some(e.to_string())),
        None => ("-".to_string(), Some("no request body".to_string())),
    }
}

pub async fn list(config: &ReplayConfig, args: &ListArgs, format: OutputFormat) -> Result<()> {
    let store = store::from_config(&config.store)?;
    let records = store
        .fetch_transactions()
        .await
        .with_context(|| format!("Failed to read {}", store.describe()))?;
    let filter = config.filter().with_only_failed(config.replay.only_failed || args.only_failed);
    let selected = filter.select(&records);

    match format {
        OutputFormat::Json => {
            let items: Vec<Value> = selected
                .iter()
                .map(|r| {
                    let (resource, error) = describe(r);
                    json!({
                        "transaction": r.id,
                        "status": r.status,
                        "path": r.path(),
                        "resource": resource,
                        "error": error,
                    })
                })
                .collect();
            print_json(&json!({
                "fetched": records.len(),
                "selected": selected.len(),
                "transactions": items,
            }));
        }
        OutputFormat::Table => {
            let rows = selected
                .iter()
                .map(|r| {
                    let (resource, error) = describe(r);
                    vec![
                        r.display_id().to_string(),
                        r.status.clone().unwrap_or_else(|| "-".into()),
                        r.path().unwrap_or("-").to_string(),
                        error.unwrap_or(resource),
                    ]
                })
                .collect();
            print_table(&["Transaction", "Status", "Path", "Resource / Error"], rows);
            println!("Matched {} of {} transactions", selected.len(), records.len());
        }
    }
    Ok(())
}
