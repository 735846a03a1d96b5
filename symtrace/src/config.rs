//! Trace configuration

/// Frames captured by default, matching the classic fixed buffer of 62
pub const DEFAULT_MAX_FRAMES: usize = 62;

/// Printed in place of an unknown function name or source file
pub const UNKNOWN_SYMBOL: &str = "??";

/// Options controlling capture, resolution and output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceConfig {
    /// Upper bound on captured frames
    pub max_frames: usize,
    /// Marker for names and files that could not be resolved
    pub unknown_symbol: String,
    /// Print source paths as recorded in the debug info instead of file names
    pub full_paths: bool,
    /// Modules whose symbol state is kept open at once; at least 1
    pub cache_capacity: usize,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            max_frames: DEFAULT_MAX_FRAMES,
            unknown_symbol: UNKNOWN_SYMBOL.to_string(),
            full_paths: false,
            cache_capacity: 1,
        }
    }
}

impl TraceConfig {
    #[must_use]
    pub fn with_max_frames(mut self, max_frames: usize) -> Self {
        self.max_frames = max_frames;
        self
    }

    #[must_use]
    pub fn with_unknown_symbol(mut self, marker: impl Into<String>) -> Self {
        self.unknown_symbol = marker.into();
        self
    }

    #[must_use]
    pub fn with_full_paths(mut self, full_paths: bool) -> Self {
        self.full_paths = full_paths;
        self
    }

    /// Set the cache capacity, clamped to at least one module
    #[must_use]
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TraceConfig::default();
        assert_eq!(config.max_frames, 62);
        assert_eq!(config.unknown_symbol, "??");
        assert!(!config.full_paths);
        assert_eq!(config.cache_capacity, 1);
    }

    #[test]
    fn test_builders() {
        let config = TraceConfig::default()
            .with_max_frames(8)
            .with_unknown_symbol("<unknown>")
            .with_full_paths(true)
            .with_cache_capacity(4);
        assert_eq!(config.max_frames, 8);
        assert_eq!(config.unknown_symbol, "<unknown>");
        assert!(config.full_paths);
        assert_eq!(config.cache_capacity, 4);
    }

    #[test]
    fn test_zero_cache_capacity_is_clamped() {
        assert_eq!(TraceConfig::default().with_cache_capacity(0).cache_capacity, 1);
    }
}
