//! High-level comparison pipeline.
//!
//! This module is the internal glue layer that wires together the stages:
//! sampling → alignment → difference map → detection → refinement →
//! coordinate remapping. Algorithmic primitives live in `crate::sampling`,
//! `crate::alignment`, `crate::diffmap`, and `crate::detector`; this layer
//! owns stage boundaries, call order, and data flow.

mod result;
mod run;

pub use result::{AlignmentReport, CompareOutcome, ScoredBox};

pub(crate) use run::{run_compare, run_with_override};
