//! The `studypath init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    // Create studypath.toml
    if std::path::Path::new("studypath.toml").exists() {
        println!("studypath.toml already exists, skipping.");
    } else {
        std::fs::write("studypath.toml", SAMPLE_CONFIG)?;
        println!("Created studypath.toml");
    }

    // Create example pathway
    std::fs::create_dir_all("pathways")?;
    let example_path = std::path::Path::new("pathways/example.toml");
    if example_path.exists() {
        println!("pathways/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_PATHWAY)?;
        println!("Created pathways/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Edit studypath.toml with your backend URL and API key");
    println!("  2. Run: studypath validate --pathway pathways/example.toml");
    println!("  3. Run: studypath pathway --lecture <id>");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# studypath configuration

user_id = "${STUDYPATH_USER_ID}"
read_retries = 2
retry_delay_ms = 500
poll_interval_ms = 2000
cache_dir = "./.studypath-cache"

[backend]
base_url = "https://your-project.backend.example"
api_key = "${STUDYPATH_API_KEY}"
timeout_secs = 30
"#;

const EXAMPLE_PATHWAY: &str = r#"[pathway]
id = "example"
name = "Example Pathway"

[[nodes]]
id = "segment_1"
title = "Getting started"
kind = "quiz"
difficulty = "beginner"
points = 10
description = "Master the concepts of Getting started"

[[nodes]]
id = "segment_2"
title = "Core ideas"
kind = "concept"
difficulty = "beginner"
prerequisites = ["segment_1"]
points = 20
description = "Master the concepts of Core ideas"

[[nodes]]
id = "segment_3"
title = "Putting it together"
kind = "concept"
difficulty = "beginner"
prerequisites = ["segment_2"]
points = 30
description = "Master the concepts of Putting it together"
"#;
