//! Pool configuration options

/// Idle engines kept per variant when no configuration is supplied
pub const DEFAULT_POOL_SIZE_PER_VARIANT: i64 = 16;

/// Configuration for engine pool behavior
///
/// # Examples
///
/// ```
/// use esox_inflaterpool::PoolConfiguration;
///
/// let config = PoolConfiguration::new()
///     .with_pool_size_per_variant(8)
///     .with_warmup(2);
///
/// assert_eq!(config.capacity(), Some(8));
/// assert_eq!(config.warmup_size, Some(2));
///
/// assert!(!PoolConfiguration::disabled().is_pooling_enabled());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PoolConfiguration {
    /// Maximum idle engines retained per variant; `<= 0` disables pooling
    pub pool_size_per_variant: i64,

    /// Engines to pre-create for each variant on construction
    pub warmup_size: Option<usize>,
}

impl Default for PoolConfiguration {
    fn default() -> Self {
        Self {
            pool_size_per_variant: DEFAULT_POOL_SIZE_PER_VARIANT,
            warmup_size: None,
        }
    }
}

impl PoolConfiguration {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration that turns pooling off: every rent allocates
    pub fn disabled() -> Self {
        Self::default().with_pool_size_per_variant(0)
    }

    /// Set the idle capacity per variant
    pub fn with_pool_size_per_variant(mut self, size: i64) -> Self {
        self.pool_size_per_variant = size;
        self
    }

    /// Set warm-up size
    pub fn with_warmup(mut self, size: usize) -> Self {
        self.warmup_size = Some(size);
        self
    }

    pub fn is_pooling_enabled(&self) -> bool {
        self.pool_size_per_variant > 0
    }

    /// Idle capacity per variant, or `None` when pooling is disabled
    pub fn capacity(&self) -> Option<usize> {
        usize::try_from(self.pool_size_per_variant)
            .ok()
            .filter(|&size| size > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_enables_pooling() {
        let config = PoolConfiguration::default();
        assert!(config.is_pooling_enabled());
        assert_eq!(config.capacity(), Some(DEFAULT_POOL_SIZE_PER_VARIANT as usize));
    }

    #[test]
    fn test_non_positive_sizes_disable_pooling() {
        for size in [0, -1, i64::MIN] {
            let config = PoolConfiguration::new().with_pool_size_per_variant(size);
            assert!(!config.is_pooling_enabled());
            assert_eq!(config.capacity(), None);
        }
    }
}
