use analysis_core::{AnalysisError, MetricQuery};
use serde_json::Value;

/// Keys the provider uses for error and throttling documents in place of data.
const NOTICE_KEYS: [&str; 3] = ["Error Message", "Note", "Information"];

/// A parsed provider response. No schema is assumed; fields are addressed
/// by a primary key and an optional nested secondary key.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteDocument(Value);

impl QuoteDocument {
    pub fn new(body: Value) -> Self {
        Self(body)
    }

    pub fn into_inner(self) -> Value {
        self.0
    }

    /// Value at `primary[/secondary]`, or `None` when any step is absent.
    pub fn get_path(&self, primary: &str, secondary: Option<&str>) -> Option<&Value> {
        let first = self.0.get(primary)?;
        match secondary {
            Some(key) => first.get(key),
            None => Some(first),
        }
    }

    /// Provider error / rate limit message, if the document is one.
    pub fn provider_notice(&self) -> Option<String> {
        NOTICE_KEYS.iter().find_map(|key| {
            self.0.get(*key).map(|v| match v.as_str() {
                Some(s) => s.to_string(),
                None => v.to_string(),
            })
        })
    }

    pub fn lookup(&self, query: &MetricQuery) -> Result<&Value, AnalysisError> {
        self.get_path(&query.primary_key, query.secondary_key.as_deref())
            .ok_or_else(|| AnalysisError::LookupFailure {
                ticker: query.ticker.to_string(),
                path: query.path(),
                provider_notice: self.provider_notice(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use analysis_core::{MetricKind, Ticker};
    use serde_json::json;

    fn query(kind: MetricKind) -> MetricQuery {
        kind.query(&Ticker::new("MS").unwrap())
    }

    #[test]
    fn test_flat_lookup() {
        let doc = QuoteDocument::new(json!({"Symbol": "MS", "PERatio": "15.9"}));
        assert_eq!(doc.lookup(&query(MetricKind::PeRatio)).unwrap(), &json!("15.9"));
    }

    #[test]
    fn test_nested_lookup() {
        let doc = QuoteDocument::new(json!({"Global Quote": {"01. symbol": "MS", "05. price": "88.1200"}}));
        assert_eq!(doc.lookup(&query(MetricKind::Price)).unwrap(), &json!("88.1200"));
    }

    #[test]
    fn test_missing_secondary_key() {
        let doc = QuoteDocument::new(json!({"Global Quote": {}}));
        match doc.lookup(&query(MetricKind::Price)) {
            Err(AnalysisError::LookupFailure { ticker, path, provider_notice }) => {
                assert_eq!(ticker, "MS");
                assert_eq!(path, "Global Quote/05. price");
                assert_eq!(provider_notice, None);
            }
            other => panic!("expected lookup failure, got {:?}", other),
        }
    }

    #[test]
    fn test_throttle_document_surfaces_notice() {
        let doc = QuoteDocument::new(json!({
            "Note": "Thank you for using Alpha Vantage! Our standard API call frequency is 5 calls per minute."
        }));
        match doc.lookup(&query(MetricKind::PegRatio)) {
            Err(AnalysisError::LookupFailure { provider_notice: Some(notice), .. }) => {
                assert!(notice.contains("5 calls per minute"));
            }
            other => panic!("expected lookup failure with notice, got {:?}", other),
        }
    }

    #[test]
    fn test_error_document_surfaces_notice() {
        let doc = QuoteDocument::new(json!({"Error Message": "Invalid API call."}));
        assert_eq!(doc.provider_notice().as_deref(), Some("Invalid API call."));
    }
}
