//! The `studypath upload` command.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use studypath_flows::{upload_lecture, wait_for_segments, LectureUpload};

const SEGMENT_POLL_INTERVAL: Duration = Duration::from_secs(3);
const SEGMENT_TIMEOUT: Duration = Duration::from_secs(300);

pub async fn execute(
    course: i64,
    title: String,
    file: PathBuf,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let (config, rest) = super::connect(config_path.as_ref())?;
    let storage = super::storage(&config);

    let bytes = std::fs::read(&file)
        .with_context(|| format!("failed to read file: {}", file.display()))?;
    let file_name = file
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("file has no usable name: {}", file.display()))?;

    let uploaded = upload_lecture(
        &rest,
        &storage,
        LectureUpload {
            course_id: course,
            title,
            file_name,
            bytes,
        },
    )
    .await?;

    println!(
        "Uploaded lecture {} (document at {}).",
        uploaded.lecture_id, uploaded.pdf_path
    );
    println!("Waiting for segment generation...");

    let segments = wait_for_segments(
        &rest,
        uploaded.lecture_id,
        SEGMENT_POLL_INTERVAL,
        SEGMENT_TIMEOUT,
    )
    .await?;

    println!("{} segment(s) generated:", segments.len());
    for segment in &segments {
        println!("  {}. {}", segment.sequence_number, segment.title);
    }

    Ok(())
}
