use crate::output::{print_json, print_table, progress_bar};
use std::path::Path;

pub fn run(root: &Path, practitioner: &str, json: bool) -> anyhow::Result<()> {
    let service = super::open_service(root)?;
    let snapshot = service.snapshot(practitioner)?;
    let status = snapshot.streak_status(service.today());

    if json {
        let mut value = serde_json::to_value(&snapshot)?;
        if let Some(obj) = value.as_object_mut() {
            obj.insert("streak_status".into(), serde_json::json!(status));
        }
        return print_json(&value);
    }

    println!("Practitioner: {}", snapshot.practitioner);
    println!(
        "Level:        {} {} ({} XP)",
        snapshot.global_level.rank, snapshot.global_level.name, snapshot.global_xp
    );
    println!("Title:        {}", snapshot.title.name);
    match snapshot.last_activity {
        Some(last) => println!(
            "Streak:       {} day(s), {status} (last practice {last}, best {})",
            snapshot.streak, snapshot.best_streak
        ),
        None => println!("Streak:       none yet"),
    }
    println!();

    let rows = snapshot
        .virtues
        .iter()
        .map(|(id, v)| {
            let bar = match (v.level.next_xp_required, v.level.xp_to_next(v.xp)) {
                (Some(next), Some(left)) => {
                    let span = next.saturating_sub(v.level.xp_required);
                    format!(
                        "{} {left} to go",
                        progress_bar(span.saturating_sub(left), span, 10)
                    )
                }
                _ => format!("{} max", progress_bar(1, 1, 10)),
            };
            vec![
                id.clone(),
                format!("{} {}", v.level.rank, v.level.name),
                v.xp.to_string(),
                bar,
            ]
        })
        .collect();
    print_table(&["VIRTUE", "LEVEL", "XP", "NEXT"], rows);

    if !snapshot.unlocked_badges.is_empty() {
        println!();
        let badges: Vec<&str> = snapshot.unlocked_badges.iter().map(String::as_str).collect();
        println!("Badges:   {}", badges.join(", "));
    }
    if !snapshot.unlocked_trophies.is_empty() {
        let trophies: Vec<&str> = snapshot
            .unlocked_trophies
            .iter()
            .map(String::as_str)
            .collect();
        println!("Trophies: {}", trophies.join(", "));
    }
    Ok(())
}
