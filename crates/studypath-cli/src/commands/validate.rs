//! The `studypath validate` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use studypath_core::pathway::load_pathway_file;

pub fn execute(pathway_path: PathBuf) -> Result<()> {
    let paths = if pathway_path.is_dir() {
        let mut files = Vec::new();
        for entry in std::fs::read_dir(&pathway_path)
            .with_context(|| format!("failed to read directory: {}", pathway_path.display()))?
        {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "toml") {
                files.push(path);
            }
        }
        files.sort();
        files
    } else {
        vec![pathway_path]
    };

    anyhow::ensure!(!paths.is_empty(), "no pathway files found");

    for path in &paths {
        let file = load_pathway_file(path)?;
        println!(
            "Pathway '{}': {} nodes, pathway valid",
            file.name,
            file.pathway.len()
        );
    }
    println!("All pathways valid.");

    Ok(())
}
