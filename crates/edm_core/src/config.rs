//! Collection configuration.

/// Configuration for building and reconstructing collections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Whether `prepare_after_read` checks that every range column
    /// partitions its buffer exactly before building entries.
    pub verify_on_read: bool,

    /// Capacity reserved for entries in newly created collections.
    pub initial_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            verify_on_read: true,
            initial_capacity: 0,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether read buffers are verified before reconstruction.
    #[must_use]
    pub const fn verify_on_read(mut self, value: bool) -> Self {
        self.verify_on_read = value;
        self
    }

    /// Sets the entry capacity reserved by new collections.
    #[must_use]
    pub const fn initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert!(config.verify_on_read);
        assert_eq!(config.initial_capacity, 0);
    }

    #[test]
    fn builder_pattern() {
        let config = Config::new().verify_on_read(false).initial_capacity(128);

        assert!(!config.verify_on_read);
        assert_eq!(config.initial_capacity, 128);
    }
}
