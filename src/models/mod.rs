pub mod query;
pub mod features;
pub mod product;
pub mod score;
pub mod selection;
pub mod watch;

pub use features::ExtractedFeatures;
pub use product::{Product, ProductFeatures};
pub use query::{Filters, Query};
pub use score::Score;
pub use selection::{ComparisonTable, Model, SelectionMode, SelectionResult};
pub use watch::{Alert, AlertKind, Watch, WatchState};
