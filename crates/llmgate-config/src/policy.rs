use serde::{Deserialize, Serialize};

/// Status codes retried when a target does not pin its own list.
pub const DEFAULT_RETRY_STATUS_CODES: &[u16] = &[429, 500, 502, 503, 504];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RetryConfig {
    /// Number of retries on top of the initial attempt; 0 disables retry.
    pub attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_status_codes: Option<Vec<u16>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_retry_after_header: Option<bool>,
}

impl RetryConfig {
    /// Status codes this config treats as retriable: the pinned list when
    /// set, the conventional defaults when retry is on, nothing when retry
    /// is off.
    pub fn effective_status_codes(&self) -> Vec<u16> {
        match (&self.on_status_codes, self.attempts) {
            (Some(codes), _) => codes.clone(),
            (None, 0) => Vec::new(),
            (None, _) => DEFAULT_RETRY_STATUS_CODES.to_vec(),
        }
    }

    pub fn retriable(&self, status: u16) -> bool {
        self.effective_status_codes().contains(&status)
    }

    pub fn honor_retry_after(&self) -> bool {
        self.use_retry_after_header.unwrap_or(false)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheMode {
    #[default]
    Simple,
    Semantic,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CacheConfig {
    pub mode: CacheMode,
    /// Entry lifetime in seconds; absent means the backend's default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_age: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_status_list_overrides_defaults() {
        let retry = RetryConfig {
            attempts: 2,
            on_status_codes: Some(vec![503]),
            use_retry_after_header: None,
        };
        assert!(retry.retriable(503));
        assert!(!retry.retriable(500));
    }

    #[test]
    fn default_status_list_applies_once_retry_is_on() {
        let retry = RetryConfig {
            attempts: 1,
            ..RetryConfig::default()
        };
        for status in [429, 500, 502, 503, 504] {
            assert!(retry.retriable(status));
        }
        assert!(!retry.retriable(404));
    }

    #[test]
    fn disabled_retry_marks_nothing_retriable() {
        let retry = RetryConfig::default();
        assert!(!retry.retriable(503));
        assert!(retry.effective_status_codes().is_empty());
    }
}
