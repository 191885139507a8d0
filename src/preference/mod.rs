//! Preferential optimization
//!
//! Trials are judged pairwise ("A is better than B") rather than scored.
//!
//! ## Overview
//!
//! ```text
//! ask ──> mark_comparison_ready ──> report_preference ──> get_best_trials
//!              │                          │                     │
//!              ▼                          ▼                     ▼
//!       trial system attr         PreferenceLedger     ready pool \ worse set
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use trueno_preference::preference::{create_study, StudyOptions};
//! use trueno_preference::storage::InMemoryStorage;
//!
//! # async fn example() -> trueno_preference::Result<()> {
//! let storage = Arc::new(InMemoryStorage::new());
//! let study = create_study(storage, StudyOptions::builder().study_name("logo").build()).await?;
//!
//! let mut trials = Vec::new();
//! for _ in 0..3 {
//!     let trial = study.ask(None).await?;
//!     study.mark_comparison_ready(&trial).await?;
//!     trials.push(trial);
//! }
//!
//! // Trial 0 beats both others
//! study.report_preference(&trials[0], &trials[1..]).await?;
//!
//! let best = study.get_best_trials().await?;
//! assert_eq!(best.len(), 1);
//! # Ok(())
//! # }
//! ```

mod factory;
mod frontier;
pub mod keys;
mod ledger;
mod readiness;
mod study;
mod trial_set;

pub use factory::{create_study, load_study, StudyOptions, StudyOptionsBuilder};
pub use frontier::{get_best_trials, select_frontier};
pub use ledger::{PreferenceLedger, PreferenceStatement};
pub use readiness::{is_comparison_ready, mark_comparison_ready, TrialRef};
pub use study::PreferentialStudy;
pub use trial_set::TrialSet;
