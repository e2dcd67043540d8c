//! Transaction log configuration.

use crate::fault::{AbortOnFault, FaultHandler};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Configuration for a [`TransactionLog`](crate::TransactionLog).
#[derive(Clone)]
pub struct LogConfig {
    /// Id of this process instance, embedded in every TID.
    pub host_id: Uuid,

    /// Receives invariant violations found during rollback.
    pub fault_handler: Arc<dyn FaultHandler>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            host_id: Uuid::new_v4(),
            fault_handler: Arc::new(AbortOnFault),
        }
    }
}

impl LogConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the process instance id.
    #[must_use]
    pub fn host_id(mut self, host_id: Uuid) -> Self {
        self.host_id = host_id;
        self
    }

    /// Sets the fault handler.
    #[must_use]
    pub fn fault_handler(mut self, handler: Arc<dyn FaultHandler>) -> Self {
        self.fault_handler = handler;
        self
    }
}

impl fmt::Debug for LogConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogConfig")
            .field("host_id", &self.host_id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_random_host() {
        let a = LogConfig::default();
        let b = LogConfig::default();
        assert!(!a.host_id.is_nil());
        assert_ne!(a.host_id, b.host_id);
    }

    #[test]
    fn builder_pattern() {
        let host = Uuid::from_bytes([1; 16]);
        let config = LogConfig::new().host_id(host);
        assert_eq!(config.host_id, host);
        assert!(format!("{config:?}").contains("LogConfig"));
    }
}
