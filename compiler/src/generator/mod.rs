//! Language-independent code generation decisions.
//!
//! [Analysis](analysis/struct.Analysis.html) derives the per-type facts,
//! [Switches](switches/struct.Switches.html) select the operation families,
//! and [GenerationPlan](plan/struct.GenerationPlan.html) combines both into
//! one plan per definition for backends to render.

pub mod analysis;
pub mod plan;
pub mod switches;

pub use analysis::{Analysis, Properties};
pub use plan::*;
pub use switches::{Operation, Switches};
