use crate::output::{print_json, print_table};
use std::path::Path;

pub fn run(root: &Path, practitioner: &str, json: bool) -> anyhow::Result<()> {
    let service = super::open_service(root)?;
    let events = service.history(practitioner)?;

    if json {
        return print_json(&events);
    }

    if events.is_empty() {
        println!("No completions for {practitioner}.");
        return Ok(());
    }

    let catalog = service.catalog();
    let rows = events
        .iter()
        .map(|e| {
            let xp = catalog
                .challenge(&e.challenge)
                .map(|c| c.xp.to_string())
                .unwrap_or_else(|_| "?".to_string());
            vec![
                e.seq.to_string(),
                e.date.to_string(),
                e.challenge.clone(),
                e.period.key(),
                xp,
            ]
        })
        .collect();
    print_table(&["SEQ", "DATE", "CHALLENGE", "PERIOD", "XP"], rows);
    Ok(())
}
