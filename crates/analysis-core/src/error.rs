use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Network failure for {ticker}: {message}")]
    NetworkFailure { ticker: String, message: String },

    #[error("Lookup failure for {ticker}: field '{path}' not found{}", notice_suffix(.provider_notice))]
    LookupFailure {
        ticker: String,
        path: String,
        provider_notice: Option<String>,
    },

    #[error("Coercion failure for {ticker}: '{path}' holds {raw}, not a number")]
    CoercionFailure {
        ticker: String,
        path: String,
        raw: String,
    },

    #[error("Invalid model state: {0}")]
    InvalidModelState(String),

    #[error("Empty input: {0}")]
    EmptyInput(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

fn notice_suffix(notice: &Option<String>) -> String {
    match notice {
        Some(text) => format!(" (provider said: {})", text),
        None => String::new(),
    }
}

impl AnalysisError {
    /// Ticker the failure is attributed to, if it came from a provider call.
    pub fn ticker(&self) -> Option<&str> {
        match self {
            AnalysisError::NetworkFailure { ticker, .. }
            | AnalysisError::LookupFailure { ticker, .. }
            | AnalysisError::CoercionFailure { ticker, .. } => Some(ticker),
            _ => None,
        }
    }
}
