//! Top-level comparison configuration.
//!
//! Every fixed constant of the pipeline lives here and is threaded
//! explicitly into each stage, so a comparison is reproducible and testable
//! with alternate parameter sets.

use serde::{Deserialize, Serialize};

use crate::alignment::AlignmentConfig;
use crate::detector::DetectorParams;
use crate::diffmap::DiffMapConfig;

/// Immutable pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompareConfig {
    /// Analysis resolution (square), the space diff maps and detection use.
    pub analysis_size: u32,
    /// Alignment resolution (square) for feature extraction and estimation.
    pub alignment_size: u32,
    /// Feature alignment controls.
    pub alignment: AlignmentConfig,
    /// Difference-map controls.
    pub diff: DiffMapConfig,
    /// Region extraction and refinement controls.
    pub detector: DetectorParams,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            analysis_size: 256,
            alignment_size: 384,
            alignment: AlignmentConfig::default(),
            diff: DiffMapConfig::default(),
            detector: DetectorParams::default(),
        }
    }
}
