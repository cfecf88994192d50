pub mod evaluator;
pub mod slicing;

pub use evaluator::{van_trips, EfficiencyError, EfficiencyEvaluator, EfficiencyReport};
pub use slicing::{EfficiencySeries, Region, Slicer, TimeOfDay};
