use crate::output::print_json;
use chrono::NaiveDate;
use keiko_core::service::CompletionOutcome;
use std::path::Path;

pub fn run(
    root: &Path,
    practitioner: &str,
    challenge: &str,
    date: Option<NaiveDate>,
    json: bool,
) -> anyhow::Result<()> {
    let service = super::open_service(root)?;
    let outcome = service.complete_challenge(practitioner, challenge, date)?;

    if json {
        return print_json(&outcome);
    }

    match &outcome {
        CompletionOutcome::Completed {
            event,
            snapshot,
            diff,
        } => {
            println!(
                "{practitioner} completed {challenge} on {}: +{} XP (total {})",
                event.date, diff.xp_added, snapshot.global_xp
            );
            for change in &diff.virtue_levels {
                let name = snapshot
                    .virtue(&change.virtue)
                    .map(|v| v.level.name.as_str())
                    .unwrap_or("");
                println!(
                    "  {} level {} -> {} ({name})",
                    change.virtue, change.from, change.to
                );
            }
            if diff.global_level.increased() {
                println!(
                    "  global level {} -> {} ({})",
                    diff.global_level.from, diff.global_level.to, snapshot.global_level.name
                );
            }
            if let Some(title) = &diff.new_title {
                println!("  new title: {title}");
            }
            println!("  streak: {} day(s)", diff.streak);
            for badge in &diff.new_badges {
                println!("  badge unlocked: {badge}");
            }
            for trophy in &diff.new_trophies {
                println!("  trophy unlocked: {trophy}");
            }
        }
        CompletionOutcome::AlreadyCompleted { existing, .. } => {
            println!(
                "{practitioner} already completed {challenge} for {}; no XP awarded",
                existing.period
            );
        }
    }
    Ok(())
}
