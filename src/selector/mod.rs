pub mod model_selector;
pub mod multicard;

pub use model_selector::{ModelOutcome, ModelSelector};
pub use multicard::MultiCardSelector;
