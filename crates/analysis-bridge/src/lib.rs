//! Asynchronous bridge to a UCI analysis engine.

pub mod bridge;
pub mod config;
pub mod error;
pub mod evaluation;
pub mod uci;

pub use bridge::{AnalysisBridge, Observer};
pub use config::BridgeConfig;
pub use error::BridgeError;
pub use evaluation::{AnalysisState, BridgePhase, PvLine, Side};
