//! Data model shared across the engine.
//!
//! Inputs (`Finding`, `Rule`) arrive from the vulnerability detector and are
//! immutable. Outputs (`Change`, `UnfixedFinding`, `ScanResult`) are pure
//! values handed back to the driver. `Span` is the location currency both
//! sides agree on.

pub mod finding;
pub mod outcome;
pub mod span;

pub use finding::{Finding, Rule};
pub use outcome::{Change, FixFailure, FixOutcome, ScanResult, UnfixedFinding};
pub use span::Span;
