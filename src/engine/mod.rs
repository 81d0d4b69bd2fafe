//! The finding-to-fix engine: region matching, candidate search, strategy
//! chaining, and result aggregation.
//!
//! Control flow for one remediation call:
//! chain → (per strategy) search → region → strategy shape / fix →
//! mutation plan → aggregate.

pub mod aggregate;
pub mod chain;
pub mod region;
pub mod search;
pub mod strategy;

pub use chain::{NO_COVERAGE_REASON, StrategyChain};
pub use region::{RegionPolicy, ReportedRegion};
pub use search::{Candidate, SearchResult, SearchSpec, ShapeFilter, UnmatchReason, search};
pub use strategy::{FixFn, Strategy};
