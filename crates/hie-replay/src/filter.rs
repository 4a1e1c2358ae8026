//! Selection of QuestionnaireResponse ingestion transactions.

use crate::record::TransactionRecord;

/// Routes the interoperability layer accepts QuestionnaireResponse submissions on.
pub const QUESTIONNAIRE_RESPONSE_ROUTES: [&str; 2] =
    ["/custom/QuestionnaireResponse", "/fhir/QuestionnaireResponse"];

/// Keeps records whose request path matches one of `routes`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFilter {
    pub routes: Vec<String>,
    /// Additionally require the transaction to have been logged as failed.
    pub only_failed: bool,
}

impl Default for RecordFilter {
    fn default() -> Self {
        Self {
            routes: QUESTIONNAIRE_RESPONSE_ROUTES
                .iter()
                .map(|r| (*r).to_string())
                .collect(),
            only_failed: false,
        }
    }
}

impl RecordFilter {
    pub fn new(routes: Vec<String>) -> Self {
        Self {
            routes,
            only_failed: false,
        }
    }

    pub fn with_only_failed(mut self, only_failed: bool) -> Self {
        self.only_failed = only_failed;
        self
    }

    pub fn matches(&self, record: &TransactionRecord) -> bool {
        let Some(path) = record.path() else {
            return false;
        };
        if !self.routes.iter().any(|r| r == path) {
            return false;
        }
        !self.only_failed || record.is_failed()
    }

    /// Returns the matching records in input order.
    pub fn select<'a>(&self, records: &'a [TransactionRecord]) -> Vec<&'a TransactionRecord> {
        records.iter().filter(|r| self.matches(r)).collect()
    }
}

/// Default-route selection over every transaction status.
pub fn select_questionnaire_responses(records: &[TransactionRecord]) -> Vec<&TransactionRecord> {
    RecordFilter::default().select(records)
}
