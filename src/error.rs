use crate::model::SearchDomain;
use thiserror::Error;

/// The single failure kind a lookup can report. Callers only need to know it failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("{} lookup failed: {reason}", .domain.label())]
    Failed { domain: SearchDomain, reason: String },
}

impl LookupError {
    pub fn failed(domain: SearchDomain, reason: impl Into<String>) -> Self {
        LookupError::Failed {
            domain,
            reason: reason.into(),
        }
    }

    pub fn from_http(domain: SearchDomain, err: reqwest::Error) -> Self {
        let reason = if err.is_timeout() {
            "request timed out".to_string()
        } else if let Some(status) = err.status() {
            format!("HTTP {status}")
        } else {
            format!("{err:#}")
        };
        LookupError::failed(domain, reason)
    }
}
