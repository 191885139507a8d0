//! Preferential Study Demo
//!
//! Run with: `cargo run --example preferential_workflow`
//!
//! Walks a human-in-the-loop loop: generate candidates, mark them ready
//! for comparison, record which one a reviewer preferred and read back
//! the current best trials.

use std::sync::Arc;

use serde_json::json;
use trueno_preference::{create_study, load_study, InMemoryStorage, StudyOptions, TrialState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    trueno_preference::logging::init_tracing()?;

    println!("=== Trueno Preferential Study Demo ===\n");

    let storage = Arc::new(InMemoryStorage::new());
    let study = create_study(
        Arc::clone(&storage),
        StudyOptions::builder().study_name("logo-colors").build(),
    )
    .await?;
    println!("1. Created study '{}'", study.study_name());

    // Three candidate colors, each ready for the reviewer
    let mut candidates = Vec::new();
    for hue in [20, 140, 260] {
        let trial = study.ask(None).await?;
        trial.set_param("hue", json!(hue)).await?;
        study.mark_comparison_ready(&trial).await?;
        println!("   Trial #{} hue={hue} ready", trial.number());
        candidates.push(trial);
    }

    // Reviewer prefers the second candidate over the other two
    println!("\n2. Reporting preference: #1 over #0 and #2");
    study
        .report_preference(&candidates[1], [&candidates[0], &candidates[2]])
        .await?;
    study.tell(&candidates[0], TrialState::Complete).await?;

    for (better, worse) in study.get_preferences().await? {
        println!("   #{} > #{}", better.number(), worse.number());
    }

    println!("\n3. Best trials");
    for trial in study.get_best_trials().await? {
        println!(
            "   Trial #{} params={}",
            trial.number(),
            serde_json::to_string(trial.params())?
        );
    }

    // A second handle over the same storage sees the same ledger
    let reloaded = load_study(storage, Some("logo-colors")).await?;
    println!(
        "\n4. Reloaded study holds {} preference(s)",
        reloaded.get_preference_views().await?.len()
    );

    println!("\nDemo completed successfully!");
    Ok(())
}
