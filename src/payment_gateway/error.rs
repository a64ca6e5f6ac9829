use reqwest::StatusCode;

use crate::telemetry::error_chain_fmt;

/// The three remote calls of a simulated transaction, in call order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Tokenize,
    Checkout,
    Payment,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Tokenize => "tokenize",
            Stage::Checkout => "checkout",
            Stage::Payment => "payment",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(thiserror::Error)]
#[error("The {stage} call failed")]
pub struct RemoteCallError {
    pub stage: Stage,
    #[source]
    pub failure: RemoteCallFailure,
}

impl std::fmt::Debug for RemoteCallError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum RemoteCallFailure {
    #[error("Unexpected status {status}: {body}")]
    UnexpectedStatus { status: StatusCode, body: String },
    #[error("The request could not be completed")]
    Transport(#[source] reqwest::Error),
    #[error("The response body is not valid JSON")]
    InvalidBody(#[source] serde_json::Error),
}

impl RemoteCallError {
    pub fn new(stage: Stage, failure: RemoteCallFailure) -> Self {
        Self { stage, failure }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match &self.failure {
            RemoteCallFailure::UnexpectedStatus { status, .. } => Some(*status),
            RemoteCallFailure::Transport(e) => e.status(),
            RemoteCallFailure::InvalidBody(_) => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(&self.failure, RemoteCallFailure::Transport(e) if e.is_timeout())
    }
}
