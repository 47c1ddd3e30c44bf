//! Interactive aggregation view.
//!
//! `aggregation` holds the pure recomputation; `session` dispatches it on
//! selector changes.

pub mod aggregation;
pub mod session;

pub use aggregation::{validate_selectors, AggregationView};
pub use session::{help_text, SelectorSession, SessionCommand};
