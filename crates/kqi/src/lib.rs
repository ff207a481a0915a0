//! KQI aggregation: reduces per-period indicator measurements into one
//! status summary per subcontractor.

pub mod aggregate;
pub mod period;
pub mod series;

pub use aggregate::{
    aggregate_all_entities, aggregate_for_entity, latest_by_indicator, KqiAggregation, KqiStatus,
};
pub use period::is_sortable_period;
pub use series::{evolution, format_value, group_by_indicator};
