//! Configuration for prefixkv
//!
//! Centralized configuration with sensible defaults.

/// Tuning knobs for a prefixed store instance
///
/// None of these affect correctness; they size the key-buffer pool and
/// control how aggressively batch allocations are released after a reset.
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Buffer Pool Configuration
    // -------------------------------------------------------------------------
    /// Initial capacity of each pooled key buffer (in bytes)
    pub buffer_capacity: usize,

    /// Number of buffer slots in the pool; buffers released into a full
    /// pool are dropped
    pub pool_capacity: usize,

    // -------------------------------------------------------------------------
    // Batch Configuration
    // -------------------------------------------------------------------------
    /// A batch reset shrinks its write log when retained capacity exceeds
    /// this multiple of the log's current length
    pub max_excess_capacity_factor: usize,

    /// Divisor applied to the retained capacity when a reset shrinks the
    /// write log
    pub capacity_reduction_factor: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            buffer_capacity: 512,
            pool_capacity: 32,
            max_excess_capacity_factor: 4,
            capacity_reduction_factor: 2,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the initial capacity of pooled key buffers (in bytes)
    pub fn buffer_capacity(mut self, bytes: usize) -> Self {
        self.config.buffer_capacity = bytes;
        self
    }

    /// Set the number of buffer slots in the pool
    pub fn pool_capacity(mut self, slots: usize) -> Self {
        self.config.pool_capacity = slots;
        self
    }

    /// Set the excess-capacity multiple that triggers a shrink on batch reset
    pub fn max_excess_capacity_factor(mut self, factor: usize) -> Self {
        self.config.max_excess_capacity_factor = factor;
        self
    }

    /// Set the divisor applied to retained capacity when shrinking
    pub fn capacity_reduction_factor(mut self, factor: usize) -> Self {
        self.config.capacity_reduction_factor = factor;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
