//! Sequential replay of logged QuestionnaireResponse submissions.
//!
//! Each record is handled in isolation: a payload or transport failure is
//! recorded in the summary and the loop moves on to the next record.

use serde::Serialize;
use tracing::{info, warn};

use crate::client::ShrClient;
use crate::config::{EnvironmentName, ReplayConfig};
use crate::error::{PayloadError, ReplayError, ReplayResult, TransportError};
use crate::normalize::{PreparedResource, QUESTIONNAIRE_RESPONSE, prepare_payload};
use crate::record::TransactionRecord;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReplayFailure {
    #[error(transparent)]
    Payload(#[from] PayloadError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplayStatus {
    /// The SHR accepted the resource with this HTTP status.
    Replayed { status: u16 },
    /// Prepared but not sent.
    DryRun,
    Failed(ReplayFailure),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordOutcome {
    pub transaction_id: Option<String>,
    /// Derived resource id, once the payload could be prepared.
    pub resource_id: Option<String>,
    pub result: ReplayStatus,
}

impl RecordOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self.result, ReplayStatus::Failed(_))
    }
}

/// Per-record outcomes of one run, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub outcomes: Vec<RecordOutcome>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReplayCounts {
    pub total: usize,
    pub replayed: usize,
    pub skipped: usize,
    pub payload_errors: usize,
    pub transport_errors: usize,
}

impl ReplaySummary {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn replayed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.result, ReplayStatus::Replayed { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failure()).count()
    }

    pub fn has_failures(&self) -> bool {
        self.outcomes.iter().any(RecordOutcome::is_failure)
    }

    pub fn counts(&self) -> ReplayCounts {
        let mut counts = ReplayCounts {
            total: self.total(),
            ..Default::default()
        };
        for outcome in &self.outcomes {
            match &outcome.result {
                ReplayStatus::Replayed { .. } => counts.replayed += 1,
                ReplayStatus::DryRun => counts.skipped += 1,
                ReplayStatus::Failed(ReplayFailure::Payload(_)) => counts.payload_errors += 1,
                ReplayStatus::Failed(ReplayFailure::Transport(_)) => counts.transport_errors += 1,
            }
        }
        counts
    }
}

/// Re-submits records to the SHR environment the client is bound to.
pub struct Replayer {
    client: ShrClient,
    dry_run: bool,
}

impl Replayer {
    pub fn new(client: ShrClient) -> Self {
        Self {
            client,
            dry_run: false,
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub async fn replay<'a, I>(&self, records: I) -> ReplaySummary
    where
        I: IntoIterator<Item = &'a TransactionRecord>,
    {
        let mut summary = ReplaySummary::default();
        for record in records {
            summary.outcomes.push(self.replay_record(record).await);
        }
        info!(
            shr = %self.client.base_url(),
            total = summary.total(),
            replayed = summary.replayed(),
            failed = summary.failed(),
            dry_run = self.dry_run,
            "replay finished"
        );
        summary
    }

    pub async fn replay_record(&self, record: &TransactionRecord) -> RecordOutcome {
        let transaction_id = record.id.clone();
        let prepared = match record
            .body()
            .ok_or(PayloadError::MissingBody)
            .and_then(prepare_payload)
        {
            Ok(p) => p,
            Err(e) => {
                warn!(transaction = record.display_id(), error = %e, "skipping unreadable payload");
                return RecordOutcome {
                    transaction_id,
                    resource_id: None,
                    result: ReplayStatus::Failed(e.into()),
                };
            }
        };

        let result = self.submit(record, &prepared).await;
        RecordOutcome {
            transaction_id,
            resource_id: Some(prepared.id),
            result,
        }
    }

    async fn submit(&self, record: &TransactionRecord, prepared: &PreparedResource) -> ReplayStatus {
        if self.dry_run {
            info!(transaction = record.display_id(), resource = %prepared.id, "dry run, not sending");
            return ReplayStatus::DryRun;
        }
        match self
            .client
            .put_resource(QUESTIONNAIRE_RESPONSE, &prepared.id, &prepared.resource)
            .await
        {
            Ok(resp) => {
                info!(
                    transaction = record.display_id(),
                    resource = %prepared.id,
                    status = resp.status,
                    response = %resp.body,
                    "replayed"
                );
                ReplayStatus::Replayed {
                    status: resp.status,
                }
            }
            Err(e) => {
                warn!(
                    transaction = record.display_id(),
                    resource = %prepared.id,
                    error = %e,
                    "replay failed"
                );
                ReplayStatus::Failed(e.into())
            }
        }
    }
}

/// Replays `records` against the selected environment of `config`.
pub async fn replay(
    records: &[&TransactionRecord],
    environment: EnvironmentName,
    config: &ReplayConfig,
    dry_run: bool,
) -> ReplayResult<ReplaySummary> {
    let target = config.environment(environment)?;
    let client = match config.request_timeout() {
        Some(timeout) => ShrClient::with_timeout(target, timeout)
            .map_err(|e| ReplayError::Config(e.to_string()))?,
        None => ShrClient::new(target),
    };
    info!(environment = %environment, shr = %client.base_url(), records = records.len(), "replaying");
    Ok(Replayer::new(client)
        .with_dry_run(dry_run)
        .replay(records.iter().copied())
        .await)
}
