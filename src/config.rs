//! Covering configuration.
//!
//! Controls the granularity and cell count of the coarse cell coverings
//! used to derive index tokens. Query-time and write-time derivations
//! must use the same configuration for the token families to line up.

use serde::{Deserialize, Serialize};

/// Configuration for cell covering generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoveringConfig {
    /// Minimum cell level (1-12). Lower = coarser cells.
    /// Default: 2 (cells of roughly 1250km x 625km)
    pub min_level: usize,

    /// Maximum cell level (1-12). Higher = finer cells.
    /// Default: 7 (cells of roughly 150m x 150m)
    pub max_level: usize,

    /// Target maximum number of cells in a covering.
    /// More cells = tighter fit but more index probes.
    /// A covering at `min_level` may exceed this for very large regions.
    /// Default: 18
    pub max_cells: usize,
}

impl Default for CoveringConfig {
    fn default() -> Self {
        Self {
            min_level: 2,
            max_level: 7,
            max_cells: 18,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_levels_ordered() {
        let config = CoveringConfig::default();
        assert!(config.min_level <= config.max_level);
        assert!(config.max_cells > 0);
    }
}
