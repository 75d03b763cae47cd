//! Configuration types for the ingest pipeline.

use crate::errors::IngestError;

/// Default number of entries sent to the store per bulk request.
pub const DEFAULT_BATCH_CAPACITY: usize = 1024;

/// Configuration for the ingest pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestConfig {
    /// Number of entries per batch. Must be positive.
    pub batch_capacity: usize,
    /// Maximum number of batch writes in flight at once.
    /// `None` leaves writes unbounded: the reader never waits for the store.
    pub max_in_flight: Option<usize>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            batch_capacity: DEFAULT_BATCH_CAPACITY,
            max_in_flight: None,
        }
    }
}

impl IngestConfig {
    /// Create a config with a custom batch capacity.
    pub fn with_batch_capacity(mut self, batch_capacity: usize) -> Self {
        self.batch_capacity = batch_capacity;
        self
    }

    /// Create a config that bounds concurrent batch writes.
    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = Some(max_in_flight);
        self
    }

    /// Check that the configuration is usable.
    pub fn validate(&self) -> Result<(), IngestError> {
        if self.batch_capacity == 0 {
            return Err(IngestError::configuration(
                "batch capacity must be a positive integer",
            ));
        }
        if self.max_in_flight == Some(0) {
            return Err(IngestError::configuration(
                "max in-flight writes must be a positive integer",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = IngestConfig::default();

        assert_eq!(config.batch_capacity, 1024);
        assert!(config.max_in_flight.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_capacity_is_configuration_error() {
        let config = IngestConfig::default().with_batch_capacity(0);
        assert!(matches!(
            config.validate(),
            Err(IngestError::ConfigurationError(_))
        ));
    }

    #[test]
    fn test_zero_in_flight_is_configuration_error() {
        let config = IngestConfig::default().with_max_in_flight(0);
        assert!(matches!(
            config.validate(),
            Err(IngestError::ConfigurationError(_))
        ));
    }

    #[test]
    fn test_bounded_config() {
        let config = IngestConfig::default()
            .with_batch_capacity(10)
            .with_max_in_flight(2);

        assert_eq!(config.batch_capacity, 10);
        assert_eq!(config.max_in_flight, Some(2));
        assert!(config.validate().is_ok());
    }
}
