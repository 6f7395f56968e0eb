use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use keiko_core::catalog::{Catalog, Challenge};
use keiko_core::paths;
use keiko_core::types::Scope;
use std::path::Path;

// ---------------------------------------------------------------------------
// Subcommand definition
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum CatalogSubcommand {
    /// List virtues and their level ladders
    Virtues,

    /// List challenges
    Challenges {
        /// Only `daily` or `weekly` challenges
        #[arg(long)]
        scope: Option<Scope>,
    },

    /// List the badges of one virtue
    Badges { virtue: String },

    /// List global trophies
    Trophies,

    /// List titles
    Titles,

    /// Check the catalog for broken ladders and dangling references
    Validate,
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn run(root: &Path, subcmd: CatalogSubcommand, json: bool) -> anyhow::Result<()> {
    let load = || Catalog::load(root).context("failed to load catalog");
    match subcmd {
        CatalogSubcommand::Virtues => virtues(&load()?, json),
        CatalogSubcommand::Challenges { scope } => challenges(&load()?, scope, json),
        CatalogSubcommand::Badges { virtue } => badges(&load()?, &virtue, json),
        CatalogSubcommand::Trophies => trophies(&load()?, json),
        CatalogSubcommand::Titles => titles(&load()?, json),
        CatalogSubcommand::Validate => validate(root, json),
    }
}

// ---------------------------------------------------------------------------
// Listings
// ---------------------------------------------------------------------------

fn virtues(catalog: &Catalog, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(&catalog.virtues());
    }
    let rows = catalog
        .virtues()
        .iter()
        .map(|v| {
            let ladder: Vec<String> = v
                .levels
                .iter()
                .map(|l| format!("{}@{}", l.name, l.xp_required))
                .collect();
            vec![v.id.clone(), v.name.clone(), ladder.join(" ")]
        })
        .collect();
    print_table(&["ID", "NAME", "LEVELS"], rows);
    Ok(())
}

fn challenges(catalog: &Catalog, scope: Option<Scope>, json: bool) -> anyhow::Result<()> {
    let list: Vec<&Challenge> = match scope {
        Some(s) => catalog.list_challenges(s),
        None => catalog.challenges.iter().collect(),
    };
    if json {
        return print_json(&list);
    }
    let rows = list
        .iter()
        .map(|c| {
            vec![
                c.id.clone(),
                c.scope.to_string(),
                c.xp.to_string(),
                c.virtue.clone().unwrap_or_else(|| "-".to_string()),
                c.description.clone(),
            ]
        })
        .collect();
    print_table(&["ID", "SCOPE", "XP", "VIRTUE", "DESCRIPTION"], rows);
    Ok(())
}

fn badges(catalog: &Catalog, virtue: &str, json: bool) -> anyhow::Result<()> {
    let list = catalog.list_badges(virtue)?;
    if json {
        return print_json(&list);
    }
    let rows = list
        .iter()
        .map(|b| vec![b.id.clone(), b.name.clone(), b.condition.to_string()])
        .collect();
    print_table(&["ID", "NAME", "CONDITION"], rows);
    Ok(())
}

fn trophies(catalog: &Catalog, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(&catalog.list_trophies());
    }
    let rows = catalog
        .list_trophies()
        .iter()
        .map(|t| vec![t.id.clone(), t.name.clone(), t.condition.to_string()])
        .collect();
    print_table(&["ID", "NAME", "CONDITION"], rows);
    Ok(())
}

fn titles(catalog: &Catalog, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(&catalog.list_titles());
    }
    let rows = catalog
        .list_titles()
        .iter()
        .map(|t| vec![t.rank.to_string(), t.name.clone(), t.xp_required.to_string()])
        .collect();
    print_table(&["RANK", "NAME", "XP"], rows);
    Ok(())
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

fn validate(root: &Path, json: bool) -> anyhow::Result<()> {
    let source = if paths::catalog_path(root).exists() {
        paths::CATALOG_FILE
    } else {
        "built-in"
    };
    let result = Catalog::load(root);

    if json {
        let value = match &result {
            Ok(c) => serde_json::json!({
                "source": source,
                "valid": true,
                "virtues": c.virtues.len(),
                "challenges": c.challenges.len(),
                "badges": c.badges.len(),
                "trophies": c.trophies.len(),
                "titles": c.titles.len(),
            }),
            Err(e) => serde_json::json!({ "source": source, "valid": false, "error": e.to_string() }),
        };
        print_json(&value)?;
    } else if let Ok(c) = &result {
        println!(
            "Catalog ({source}) is valid: {} virtues, {} challenges, {} badges, {} trophies, {} titles.",
            c.virtues.len(),
            c.challenges.len(),
            c.badges.len(),
            c.trophies.len(),
            c.titles.len()
        );
    }

    result
        .map(|_| ())
        .with_context(|| format!("catalog ({source}) failed validation"))
}
