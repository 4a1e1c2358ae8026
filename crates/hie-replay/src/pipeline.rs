use tracing::info;

use crate::config::{EnvironmentName, ReplayConfig};
use crate::error::ReplayResult;
use crate::replay::{ReplaySummary, replay};
use crate::store::TransactionStore;

/// What one fetch-filter-replay pass did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    pub fetched: usize,
    pub selected: usize,
    pub summary: ReplaySummary,
}

/// Fetches the whole log, keeps QuestionnaireResponse submissions and
/// replays them to `environment`.
///
/// Only a store failure or a missing environment aborts; per-record failures
/// are reported in the summary.
pub async fn run(
    store: &dyn TransactionStore,
    config: &ReplayConfig,
    environment: EnvironmentName,
    dry_run: bool,
) -> ReplayResult<PipelineReport> {
    // Resolve the target first so a bad selection fails before the scan.
    config.environment(environment)?;

    let records = store.fetch_transactions().await?;
    let selected = config.filter().select(&records);
    info!(
        store = %store.describe(),
        fetched = records.len(),
        selected = selected.len(),
        "transactions loaded"
    );

    let summary = replay(&selected, environment, config, dry_run).await?;
    Ok(PipelineReport {
        fetched: records.len(),
        selected: selected.len(),
        summary,
    })
}
