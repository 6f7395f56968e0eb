use anyhow::Context;
use keiko_core::catalog::BUILTIN_CATALOG;
use keiko_core::{config::Config, io, paths};
use std::path::Path;

pub fn run(root: &Path, name: Option<&str>, write_catalog: bool) -> anyhow::Result<()> {
    let dojo_name = name.map(str::to_string).unwrap_or_else(|| {
        root.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "dojo".to_string())
    });

    println!("Initializing keiko in: {}", root.display());

    let dir = paths::keiko_dir(root);
    io::ensure_dir(&dir).with_context(|| format!("failed to create {}", dir.display()))?;

    if !paths::config_path(root).exists() {
        Config::new(&dojo_name)
            .save(root)
            .context("failed to write config.yaml")?;
        println!("  created: {}", paths::CONFIG_FILE);
    } else {
        println!("  exists:  {}", paths::CONFIG_FILE);
    }

    if write_catalog {
        let written = io::write_if_missing(&paths::catalog_path(root), BUILTIN_CATALOG.as_bytes())
            .context("failed to write catalog.yaml")?;
        let verb = if written { "created:" } else { "exists: " };
        println!("  {verb} {}", paths::CATALOG_FILE);
    }

    Ok(())
}
