//! Reserved system-attribute keys
//!
//! These keys are the only storage schema the preference core owns. All of
//! them live in system attributes under the `preference:` namespace, apart
//! from user attributes.

/// Study marker: `true` on studies created by `create_study`. Set once.
pub const SYSTEM_ATTR_PREFERENTIAL_STUDY: &str = "preference:is_preferential";

/// Trial marker: `true` once the trial may take part in the frontier.
pub const SYSTEM_ATTR_COMPARISON_READY: &str = "preference:comparison_ready";

/// Key prefix of ledger batches. Each batch is a JSON array of
/// `[better, worse]` trial-number pairs.
pub const SYSTEM_ATTR_PREFIX_PREFERENCE: &str = "preference:values:";
