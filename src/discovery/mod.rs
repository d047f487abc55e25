pub mod aggregator;
pub mod classifier;
pub mod enumerator;
pub mod inspector;
pub mod poller;

pub use aggregator::{AggregateSnapshot, Aggregator};
pub use classifier::{Classification, Classifier};
pub use enumerator::Enumerator;
pub use inspector::{InspectionResult, Inspector};
pub use poller::{CycleOutcome, Poller};
