pub mod evaluator;

pub use evaluator::{WatchEvaluator, WatchEvaluatorConfig};
