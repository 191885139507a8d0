//! # trueno-preference: Preferential Optimization Studies
//!
//! **Version**: 0.1.0
//!
//! Record pairwise judgments ("trial A is better than trial B") over the
//! trials of an optimization study and derive the frontier of ready trials
//! that no other trial has beaten.
//!
//! ## Design Principles (Toyota Way Aligned)
//!
//! - **Poka-Yoke safety**: Shared trial views are read-only by type, and
//!   trial references are a sum type instead of runtime type checks
//! - **Jidoka**: Studies without the preferential marker refuse to load
//! - **Genchi Genbutsu**: The frontier is exactly "never reported as worse",
//!   with no hidden ranking or cycle resolution
//!
//! ## Example Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use trueno_preference::{create_study, InMemoryStorage, StudyOptions};
//!
//! # async fn example() -> trueno_preference::Result<()> {
//! let study = create_study(Arc::new(InMemoryStorage::new()), StudyOptions::default()).await?;
//!
//! let a = study.ask(None).await?;
//! let b = study.ask(None).await?;
//! study.mark_comparison_ready(&a).await?;
//! study.mark_comparison_ready(&b).await?;
//! study.report_preference(&a, &b).await?;
//!
//! for trial in study.get_best_trials().await? {
//!     println!("Best: trial #{}", trial.number());
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod error;
pub mod logging;
pub mod preference;
pub mod storage;
pub mod trial;

pub use error::{Error, Result};
pub use preference::{create_study, load_study, PreferentialStudy, StudyOptions};
pub use storage::{InMemoryStorage, TrialStorage};
pub use trial::{FrozenTrial, Trial, TrialState, TrialView};
