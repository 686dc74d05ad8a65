//! Store configuration
//!
//! Recognized options and their defaults. The retry fields configure the
//! backend adapter's retry of failed I/O; they never drive store logic.

use serde::Deserialize;

/// Default physical container name
pub const DEFAULT_TABLE_NAME: &str = "auth";
/// Default session tag when the caller does not provide one
pub const DEFAULT_SESSION: &str = "waAuth";
/// Default delay between backend retry attempts, in milliseconds
pub const DEFAULT_RETRY_DELAY_MS: u64 = 200;
/// Default number of retries after a failed backend call
pub const DEFAULT_MAX_RETRIES: u32 = 10;

/// Configuration of one credential store session
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreConfig {
    /// Name of the backend collection/table holding this session's records
    pub table_name: String,
    /// Session tag scoping the key namespace; all of the session's
    /// documents carry it for bulk filtering
    pub session: String,
    /// Delay between backend retry attempts, in milliseconds
    pub retry_request_delay_ms: u64,
    /// Number of retries after a failed backend call
    pub max_retries: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            table_name: DEFAULT_TABLE_NAME.to_string(),
            session: DEFAULT_SESSION.to_string(),
            retry_request_delay_ms: DEFAULT_RETRY_DELAY_MS,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl StoreConfig {
    /// Configuration for a named session with default everything else
    pub fn for_session(session: impl Into<String>) -> Self {
        Self {
            session: session.into(),
            ..Self::default()
        }
    }

    /// Replace the table name
    pub fn with_table_name(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = table_name.into();
        self
    }

    /// Replace the retry settings
    pub fn with_retries(mut self, max_retries: u32, delay_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.retry_request_delay_ms = delay_ms;
        self
    }
}
