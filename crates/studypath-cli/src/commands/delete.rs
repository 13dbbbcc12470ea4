//! The `studypath delete-lecture` and `delete-course` commands.

use std::path::PathBuf;

use anyhow::Result;

use studypath_flows::{delete_course, delete_lecture, CascadeReport};

pub async fn execute_lecture(id: i64, yes: bool, config_path: Option<PathBuf>) -> Result<()> {
    anyhow::ensure!(
        yes,
        "deleting lecture {id} removes all its content; pass --yes to confirm"
    );
    let (config, rest) = super::connect(config_path.as_ref())?;
    let storage = super::storage(&config);

    let report = delete_lecture(&rest, &storage, id).await?;
    print_report("Lecture", id, &report);
    Ok(())
}

pub async fn execute_course(id: i64, yes: bool, config_path: Option<PathBuf>) -> Result<()> {
    anyhow::ensure!(
        yes,
        "deleting course {id} removes all its lectures and content; pass --yes to confirm"
    );
    let (config, rest) = super::connect(config_path.as_ref())?;
    let storage = super::storage(&config);

    let report = delete_course(&rest, &storage, id).await?;
    print_report("Course", id, &report);
    Ok(())
}

fn print_report(what: &str, id: i64, report: &CascadeReport) {
    println!(
        "{what} {id} deleted: {} table(s) cleared, {} blob(s) removed.",
        report.tables_cleared.len(),
        report.blobs_removed
    );
    for warning in &report.warnings {
        println!("  warning: {warning}");
    }
}
