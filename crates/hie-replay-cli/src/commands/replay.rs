use anyhow::{Context, Result};
use hie_replay::{EnvironmentName, ReplayConfig, pipeline, store};

use crate::cli::{OutputFormat, ReplayArgs};
use crate::output::{print_error, print_report, print_success};

/// Runs the pipeline. Returns `true` when every matched record went through.
pub async fn replay(
    config: &ReplayConfig,
    environment: EnvironmentName,
    args: &ReplayArgs,
    format: OutputFormat,
) -> Result<bool> {
    let mut config = config.clone();
    config.replay.only_failed |= args.only_failed;

    let store = store::from_config(&config.store)?;
    let report = pipeline::run(store.as_ref(), &config, environment, args.dry_run)
        .await
        .with_context(|| format!("Replay to {environment} aborted"))?;

    print_report(&report, format);
    if matches!(format, OutputFormat::Json) {
        return Ok(!report.summary.has_failures());
    }
    if report.summary.has_failures() {
        print_error(&format!(
            "{} of {} transactions could not be replayed",
            report.summary.failed(),
            report.summary.total()
        ));
        Ok(false)
    } else {
        print_success(&format!(
            "{} transactions processed against {environment}",
            report.summary.total()
        ));
        Ok(true)
    }
}
