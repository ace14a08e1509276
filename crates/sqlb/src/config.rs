use serde::Deserialize;
use std::time::Duration;

/// Execution settings applied by [`Executor`](crate::Executor).
///
/// Deserializes from any serde format; missing fields take their defaults.
///
/// ```
/// use std::time::Duration;
///
/// let config = sqlb::ExecConfig::new()
///     .with_query_timeout(Duration::from_secs(5))
///     .with_max_sql_length(None);
/// assert!(config.log_sql);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ExecConfig {
    /// Query timeout duration. `None` means no timeout (default).
    #[serde(with = "duration_millis")]
    pub query_timeout: Option<Duration>,
    /// Whether statements are logged before they run.
    pub log_sql: bool,
    /// Maximum number of bytes of SQL text to log. `None` logs it whole.
    pub max_sql_length: Option<usize>,
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            query_timeout: None,
            log_sql: true,
            max_sql_length: Some(200),
        }
    }
}

impl ExecConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the query timeout duration.
    ///
    /// Queries exceeding it are cancelled and return a timeout error.
    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = Some(timeout);
        self
    }

    pub fn with_log_sql(mut self, enabled: bool) -> Self {
        self.log_sql = enabled;
        self
    }

    pub fn with_max_sql_length(mut self, max: Option<usize>) -> Self {
        self.max_sql_length = max;
        self
    }
}

/// `query_timeout` as whole milliseconds.
mod duration_millis {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
    }
}
