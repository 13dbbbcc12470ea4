//! Cascade deletes for courses and lectures.
//!
//! Row deletes run in foreign-key-safe order and propagate their first
//! error; blob removals are best-effort and only add warnings, since the
//! rows they belong to are already gone.

use anyhow::{Context, Result};
use serde::Deserialize;

use studypath_client::{RestClient, StorageClient};

const PDF_BUCKET: &str = "lecture_pdfs";
const AUDIO_BUCKET: &str = "podcast_audio";

/// Child tables cleared before a lecture row can go, in foreign-key order.
const LECTURE_CHILD_TABLES: &[&str] = &[
    "generated_quizzes",
    "quiz_progress",
    "user_progress",
    "flashcards",
    "lecture_highlights",
    "segments_content",
    "lecture_ai_configs",
    "lecture_segments",
    "study_plans",
    "lecture_additional_resources",
];

#[derive(Debug, Deserialize)]
struct LectureRef {
    id: i64,
    #[serde(default)]
    pdf_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PodcastRef {
    #[serde(default)]
    stored_audio_path: Option<String>,
}

/// What a cascade delete actually did.
#[derive(Debug, Default)]
pub struct CascadeReport {
    /// Tables cleared, in deletion order.
    pub tables_cleared: Vec<String>,
    /// Storage blobs removed.
    pub blobs_removed: usize,
    /// Best-effort steps that failed without blocking the cascade.
    pub warnings: Vec<String>,
}

/// Delete a lecture and everything hanging off it.
pub async fn delete_lecture(
    rest: &RestClient,
    storage: &StorageClient,
    lecture_id: i64,
) -> Result<CascadeReport> {
    tracing::info!(lecture_id, "deleting lecture");
    let mut report = CascadeReport::default();

    // The PDF path must be read before the lecture row goes away.
    let lectures: Vec<LectureRef> = rest
        .select("lectures")
        .columns("id,pdf_path")
        .eq("id", lecture_id)
        .fetch()
        .await
        .context("failed to fetch lecture")?;
    let pdf_path = lectures.first().and_then(|l| l.pdf_path.clone());

    purge_podcast_audio(rest, storage, &[lecture_id], &mut report).await;
    rest.delete("lecture_podcast")
        .eq("lecture_id", lecture_id)
        .execute()
        .await
        .context("failed to delete lecture podcast")?;
    report.tables_cleared.push("lecture_podcast".into());

    for table in LECTURE_CHILD_TABLES {
        rest.delete(table)
            .eq("lecture_id", lecture_id)
            .execute()
            .await
            .with_context(|| format!("failed to clear {table}"))?;
        report.tables_cleared.push((*table).to_string());
    }

    rest.delete("lectures")
        .eq("id", lecture_id)
        .execute()
        .await
        .context("failed to delete lecture")?;
    report.tables_cleared.push("lectures".into());

    if let Some(path) = pdf_path {
        remove_blobs(storage, PDF_BUCKET, vec![path], &mut report).await;
    }

    Ok(report)
}

/// Delete a course, all its lectures, and everything hanging off them.
pub async fn delete_course(
    rest: &RestClient,
    storage: &StorageClient,
    course_id: i64,
) -> Result<CascadeReport> {
    tracing::info!(course_id, "deleting course");
    let mut report = CascadeReport::default();

    let lectures: Vec<LectureRef> = rest
        .select("lectures")
        .columns("id,pdf_path")
        .eq("course_id", course_id)
        .fetch()
        .await
        .context("failed to fetch course lectures")?;
    let lecture_ids: Vec<i64> = lectures.iter().map(|l| l.id).collect();
    let pdf_paths: Vec<String> = lectures.into_iter().filter_map(|l| l.pdf_path).collect();

    if !lecture_ids.is_empty() {
        purge_podcast_audio(rest, storage, &lecture_ids, &mut report).await;
        rest.delete("lecture_podcast")
            .in_list("lecture_id", &lecture_ids)
            .execute()
            .await
            .context("failed to delete lecture podcasts")?;
        report.tables_cleared.push("lecture_podcast".into());

        for table in LECTURE_CHILD_TABLES {
            rest.delete(table)
                .in_list("lecture_id", &lecture_ids)
                .execute()
                .await
                .with_context(|| format!("failed to clear {table}"))?;
            report.tables_cleared.push((*table).to_string());
        }

        rest.delete("lectures")
            .eq("course_id", course_id)
            .execute()
            .await
            .context("failed to delete lectures")?;
        report.tables_cleared.push("lectures".into());
    }

    rest.delete("courses")
        .eq("id", course_id)
        .execute()
        .await
        .context("failed to delete course")?;
    report.tables_cleared.push("courses".into());

    if !pdf_paths.is_empty() {
        remove_blobs(storage, PDF_BUCKET, pdf_paths, &mut report).await;
    }

    Ok(report)
}

/// Best-effort removal of stored podcast audio for the given lectures.
async fn purge_podcast_audio(
    rest: &RestClient,
    storage: &StorageClient,
    lecture_ids: &[i64],
    report: &mut CascadeReport,
) {
    let rows: Vec<PodcastRef> = match rest
        .select("lecture_podcast")
        .columns("stored_audio_path")
        .in_list("lecture_id", lecture_ids)
        .fetch()
        .await
    {
        Ok(rows) => rows,
        Err(e) => {
            tracing::warn!(error = %e, "podcast lookup failed, continuing");
            report.warnings.push(format!("podcast lookup failed: {e}"));
            return;
        }
    };

    let paths: Vec<String> = rows.into_iter().filter_map(|r| r.stored_audio_path).collect();
    if !paths.is_empty() {
        remove_blobs(storage, AUDIO_BUCKET, paths, report).await;
    }
}

/// Best-effort blob removal; failures become warnings.
async fn remove_blobs(
    storage: &StorageClient,
    bucket: &str,
    paths: Vec<String>,
    report: &mut CascadeReport,
) {
    match storage.remove(bucket, &paths).await {
        Ok(()) => report.blobs_removed += paths.len(),
        Err(e) => {
            tracing::warn!(bucket, error = %e, "blob removal failed, continuing");
            report
                .warnings
                .push(format!("blob removal from {bucket} failed: {e}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use studypath_client::config::BackendConfig;
    use wiremock::matchers::{method, path, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn clients(server: &MockServer) -> (RestClient, StorageClient) {
        let config = BackendConfig {
            base_url: server.uri(),
            api_key: "test-key".into(),
            timeout_secs: 5,
        };
        (
            RestClient::new(&config).with_retries(0, Duration::from_millis(1)),
            StorageClient::new(&config),
        )
    }

    async fn mount_lecture_fetch(server: &MockServer, rows: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path("/rest/v1/lectures"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&rows))
            .mount(server)
            .await;
    }

    async fn mount_empty_podcasts(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/rest/v1/lecture_podcast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn lecture_cascade_clears_children_then_row() {
        let server = MockServer::start().await;
        mount_lecture_fetch(
            &server,
            serde_json::json!([{"id": 7, "pdf_path": "3/notes.pdf"}]),
        )
        .await;
        mount_empty_podcasts(&server).await;
        Mock::given(method("DELETE"))
            .and(path_regex(r"^/rest/v1/.*"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path_regex(r"^/storage/v1/object/.*"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let (rest, storage) = clients(&server);
        let report = delete_lecture(&rest, &storage, 7).await.unwrap();

        assert!(report.warnings.is_empty());
        assert_eq!(report.blobs_removed, 1);
        // Children go before the lecture row itself.
        let lectures_pos = report
            .tables_cleared
            .iter()
            .position(|t| t == "lectures")
            .unwrap();
        for table in LECTURE_CHILD_TABLES {
            let pos = report
                .tables_cleared
                .iter()
                .position(|t| t == table)
                .unwrap();
            assert!(pos < lectures_pos, "{table} cleared after lectures");
        }
    }

    #[tokio::test]
    async fn failed_pdf_removal_is_a_warning_not_an_error() {
        let server = MockServer::start().await;
        mount_lecture_fetch(
            &server,
            serde_json::json!([{"id": 7, "pdf_path": "3/notes.pdf"}]),
        )
        .await;
        mount_empty_podcasts(&server).await;
        Mock::given(method("DELETE"))
            .and(path_regex(r"^/rest/v1/.*"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path_regex(r"^/storage/v1/object/.*"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let (rest, storage) = clients(&server);
        let report = delete_lecture(&rest, &storage, 7).await.unwrap();

        assert_eq!(report.blobs_removed, 0);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.tables_cleared.contains(&"lectures".to_string()));
    }

    #[tokio::test]
    async fn blocking_row_delete_stops_the_cascade() {
        let server = MockServer::start().await;
        mount_lecture_fetch(&server, serde_json::json!([{"id": 7}])).await;
        mount_empty_podcasts(&server).await;
        Mock::given(method("DELETE"))
            .and(path("/rest/v1/lecture_podcast"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;
        // First child table in the cascade fails; nothing else is mounted,
        // so reaching a later table would also fail the assertion below.
        Mock::given(method("DELETE"))
            .and(path("/rest/v1/generated_quizzes"))
            .respond_with(ResponseTemplate::new(500).set_body_json(
                serde_json::json!({"message": "constraint violation"}),
            ))
            .mount(&server)
            .await;

        let (rest, storage) = clients(&server);
        let err = delete_lecture(&rest, &storage, 7).await.unwrap_err();
        assert!(format!("{err:#}").contains("generated_quizzes"));
    }

    #[tokio::test]
    async fn course_cascade_covers_every_lecture() {
        let server = MockServer::start().await;
        mount_lecture_fetch(
            &server,
            serde_json::json!([
                {"id": 1, "pdf_path": "9/a.pdf"},
                {"id": 2, "pdf_path": "9/b.pdf"}
            ]),
        )
        .await;
        mount_empty_podcasts(&server).await;
        Mock::given(method("DELETE"))
            .and(path_regex(r"^/rest/v1/.*"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path_regex(r"^/storage/v1/object/.*"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let (rest, storage) = clients(&server);
        let report = delete_course(&rest, &storage, 9).await.unwrap();

        assert_eq!(report.blobs_removed, 2);
        assert!(report.tables_cleared.contains(&"courses".to_string()));
        assert!(report.tables_cleared.contains(&"lectures".to_string()));
    }

    #[tokio::test]
    async fn empty_course_still_deletes_the_course_row() {
        let server = MockServer::start().await;
        mount_lecture_fetch(&server, serde_json::json!([])).await;
        Mock::given(method("DELETE"))
            .and(path("/rest/v1/courses"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let (rest, storage) = clients(&server);
        let report = delete_course(&rest, &storage, 9).await.unwrap();
        assert_eq!(report.tables_cleared, vec!["courses".to_string()]);
    }
}
