//! In-memory knowledge-graph snapshot consumed by the rule engine.

pub mod load;
pub mod store;

pub use load::{load_kqi_list, load_snapshot, LoadReport};
pub use store::{GraphSnapshot, GraphStats};
