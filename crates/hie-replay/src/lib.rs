//! # hie-replay
//!
//! Replays FHIR `QuestionnaireResponse` submissions logged by an OpenHIM
//! interoperability layer to a shared health record (SHR).
//!
//! The pipeline is linear:
//!
//! 1. a [`TransactionStore`] reads the transaction log,
//! 2. a [`RecordFilter`] keeps the QuestionnaireResponse ingestion routes,
//! 3. the [`Replayer`] normalizes each logged body and `PUT`s it to
//!    `{base_url}/fhir/QuestionnaireResponse/{id}` of one environment.
//!
//! ```ignore
//! use hie_replay::{EnvironmentName, config::loader::load_config, pipeline, store};
//!
//! let config = load_config(None)?;
//! let store = store::from_config(&config.store)?;
//! let report = pipeline::run(store.as_ref(), &config, EnvironmentName::Dev, false).await?;
//! println!("{} replayed, {} failed", report.summary.replayed(), report.summary.failed());
//! ```

pub mod client;
pub mod config;
mod error;
pub mod filter;
pub mod normalize;
pub mod observability;
pub mod pipeline;
pub mod record;
pub mod replay;
pub mod store;

pub use client::{ShrClient, ShrResponse};
pub use crate::config::{EnvironmentConfig, EnvironmentName, ReplayConfig};
pub use error::{PayloadError, ReplayError, ReplayResult, StoreError, TransportError};
pub use filter::{QUESTIONNAIRE_RESPONSE_ROUTES, RecordFilter, select_questionnaire_responses};
pub use normalize::{PreparedResource, derive_resource_id, normalize_keys, prepare_payload};
pub use record::{LoggedRequest, LoggedResponse, TransactionRecord};
pub use replay::{
    RecordOutcome, ReplayCounts, ReplayFailure, ReplayStatus, ReplaySummary, Replayer, replay,
};
pub use store::{DynTransactionStore, ExportFileStore, OpenHimStore, TransactionStore};
