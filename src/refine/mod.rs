//! Expert/reviewer self-correction loop.
//!
//! - [`RefinementLoop`] - bounded expert → reviewer iteration
//! - [`AcceptancePolicy`] - pluggable "is the reviewer satisfied?" predicate
//! - [`RefinementResult`] / [`IterationRecord`] - the returned log and answer

pub mod policy;
pub mod record;
pub mod runner;

pub use policy::{AcceptancePolicy, ContainsToken, NeverAccept};
pub use record::{IterationRecord, RefinementResult, Role, Termination};
pub use runner::{
    DEFAULT_MAX_ITERATIONS, EXTRACTED_OUTPUT, PREVIOUS_OUTPUT, RAW_TEXT, REVIEWER_FEEDBACK,
    RefinementLoop,
};
