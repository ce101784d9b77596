//! Bridge configuration from environment variables

use std::env;

/// Upper bound on parallel lines requested from the engine.
pub const MAX_MULTI_PV: u32 = 5;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Path to the UCI engine binary
    pub engine_path: String,

    /// Search depth per position
    pub depth: u32,

    /// Number of principal variations, 1..=MAX_MULTI_PV
    pub multi_pv: u32,

    pub threads: Option<u32>,

    pub hash_mb: Option<u32>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            engine_path: "stockfish".to_string(),
            depth: 18,
            multi_pv: 1,
            threads: None,
            hash_mb: None,
        }
    }
}

impl BridgeConfig {
    /// Load configuration from environment variables. Missing or unparsable
    /// values fall back to the defaults.
    pub fn from_env() -> Self {
        Self::from_vars(|key| env::var(key).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let engine_path = var("ENGINE_PATH")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.engine_path);

        let depth = var("ANALYSIS_DEPTH")
            .and_then(|v| v.parse().ok())
            .filter(|d| *d > 0)
            .unwrap_or(defaults.depth);

        let multi_pv = var("MULTI_PV")
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(defaults.multi_pv)
            .clamp(1, MAX_MULTI_PV);

        let threads = var("ENGINE_THREADS").and_then(|v| v.parse().ok());
        let hash_mb = var("ENGINE_HASH_MB").and_then(|v| v.parse().ok());

        Self {
            engine_path,
            depth,
            multi_pv,
            threads,
            hash_mb,
        }
    }
}
