//! Dataset filtering: operator filter specs and configured exclusion rules.

pub mod exclusion;
pub mod spec;

pub use exclusion::ExclusionFilters;
pub use spec::{DomainMatcher, FilterSpec};
