use crate::output::{print_json, print_table};
use std::path::Path;

pub fn run(root: &Path, limit: usize, json: bool) -> anyhow::Result<()> {
    let service = super::open_service(root)?;
    let entries = service.leaderboard(limit)?;

    if json {
        return print_json(&entries);
    }

    if entries.is_empty() {
        println!("No practitioners yet.");
        return Ok(());
    }

    let rows = entries
        .iter()
        .map(|e| {
            vec![
                e.rank.to_string(),
                e.practitioner.clone(),
                e.global_xp.to_string(),
                format!("{} {}", e.level.rank, e.level.name),
                e.title.name.clone(),
                e.streak.to_string(),
            ]
        })
        .collect();
    print_table(
        &["#", "PRACTITIONER", "XP", "LEVEL", "TITLE", "STREAK"],
        rows,
    );
    Ok(())
}
