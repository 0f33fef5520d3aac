//! Configuration system
//!
//! ```rust,ignore
//! use codegraph_dataflow::config::AnalysisConfig;
//!
//! let config = AnalysisConfig::default().with_analyses(["ifds-taint"]);
//! let config = AnalysisConfig::from_yaml("analyses.yaml")?;
//! ```

pub mod analysis_config;
pub mod error;

pub use analysis_config::AnalysisConfig;
pub use error::{ConfigError, ConfigResult};
