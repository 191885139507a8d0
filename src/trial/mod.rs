//! Trial model
//!
//! ```text
//! Trial<S>    live handle from `ask`, writes through the storage
//! FrozenTrial owned snapshot (independent copy)
//! TrialView   shared read-only view of the storage's snapshot
//! ```

mod frozen_trial;
mod handle;
mod view;

pub use frozen_trial::{FrozenTrial, FrozenTrialBuilder, TrialState};
pub use handle::Trial;
pub use view::TrialView;
