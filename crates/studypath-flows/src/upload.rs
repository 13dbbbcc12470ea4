//! Lecture upload flow.
//!
//! Uploads the source document to blob storage, creates the lecture row,
//! then waits for the backend to generate the lecture's segments.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use studypath_client::rest::Order;
use studypath_client::{RestClient, StorageClient};
use studypath_core::model::LectureSegment;

const PDF_BUCKET: &str = "lecture_pdfs";

/// A lecture document ready to upload.
#[derive(Debug, Clone)]
pub struct LectureUpload {
    pub course_id: i64,
    pub title: String,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// The created lecture.
#[derive(Debug, Clone)]
pub struct UploadedLecture {
    pub lecture_id: i64,
    pub pdf_path: String,
}

#[derive(Serialize)]
struct NewLecture<'a> {
    course_id: i64,
    title: &'a str,
    pdf_path: &'a str,
}

#[derive(Deserialize)]
struct InsertedLecture {
    id: i64,
}

/// Upload the document and create the lecture row.
pub async fn upload_lecture(
    rest: &RestClient,
    storage: &StorageClient,
    upload: LectureUpload,
) -> Result<UploadedLecture> {
    anyhow::ensure!(!upload.title.trim().is_empty(), "lecture title is empty");
    anyhow::ensure!(!upload.bytes.is_empty(), "uploaded file is empty");

    // Object paths must stay unique across re-uploads of the same file.
    let pdf_path = format!(
        "{}/{}-{}",
        upload.course_id,
        Uuid::new_v4(),
        upload.file_name
    );

    storage
        .upload(PDF_BUCKET, &pdf_path, upload.bytes, "application/pdf")
        .await
        .context("failed to upload lecture document")?;

    let rows: Vec<InsertedLecture> = rest
        .insert_returning(
            "lectures",
            &[NewLecture {
                course_id: upload.course_id,
                title: &upload.title,
                pdf_path: &pdf_path,
            }],
        )
        .await
        .context("failed to create lecture record")?;

    let lecture_id = rows
        .first()
        .map(|r| r.id)
        .ok_or_else(|| anyhow::anyhow!("backend returned no lecture row"))?;

    tracing::info!(lecture_id, course_id = upload.course_id, "lecture uploaded");

    Ok(UploadedLecture {
        lecture_id,
        pdf_path,
    })
}

/// Poll until the backend has generated segments for a lecture.
///
/// The backend processes uploaded documents asynchronously; segments appear
/// once processing finishes. Gives up after `timeout`.
pub async fn wait_for_segments(
    rest: &RestClient,
    lecture_id: i64,
    poll_interval: Duration,
    timeout: Duration,
) -> Result<Vec<LectureSegment>> {
    let deadline = tokio::time::Instant::now() + timeout;

    loop {
        let segments: Vec<LectureSegment> = rest
            .select("lecture_segments")
            .eq("lecture_id", lecture_id)
            .order("sequence_number", Order::Ascending)
            .fetch()
            .await
            .context("failed to poll lecture segments")?;

        if !segments.is_empty() {
            tracing::info!(lecture_id, count = segments.len(), "segments ready");
            return Ok(segments);
        }
        if tokio::time::Instant::now() >= deadline {
            anyhow::bail!("timed out waiting for segments of lecture {lecture_id}");
        }
        tokio::time::sleep(poll_interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
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

    fn upload() -> LectureUpload {
        LectureUpload {
            course_id: 9,
            title: "Ownership".into(),
            file_name: "ownership.pdf".into(),
            bytes: b"%PDF-1.4".to_vec(),
        }
    }

    #[tokio::test]
    async fn upload_stores_blob_then_creates_row() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path_regex(r"^/storage/v1/object/lecture_pdfs/9/.*-ownership\.pdf$"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/lectures"))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(serde_json::json!([{"id": 42}])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let (rest, storage) = clients(&server);
        let uploaded = upload_lecture(&rest, &storage, upload()).await.unwrap();

        assert_eq!(uploaded.lecture_id, 42);
        assert!(uploaded.pdf_path.starts_with("9/"));
        assert!(uploaded.pdf_path.ends_with("-ownership.pdf"));
    }

    #[tokio::test]
    async fn empty_title_is_rejected_before_any_request() {
        let server = MockServer::start().await;
        let (rest, storage) = clients(&server);

        let mut bad = upload();
        bad.title = "  ".into();
        let err = upload_lecture(&rest, &storage, bad).await.unwrap_err();
        assert!(err.to_string().contains("title"));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_blob_upload_skips_row_creation() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path_regex(r"^/storage/v1/object/.*"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let (rest, storage) = clients(&server);
        let err = upload_lecture(&rest, &storage, upload()).await.unwrap_err();
        assert!(format!("{err:#}").contains("upload"));
        // Only the storage call went out.
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn wait_for_segments_polls_until_rows_appear() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/lecture_segments"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/lecture_segments"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"sequence_number": 1, "title": "Intro", "lecture_id": 42}
            ])))
            .mount(&server)
            .await;

        let (rest, _) = clients(&server);
        let segments = wait_for_segments(
            &rest,
            42,
            Duration::from_millis(5),
            Duration::from_secs(5),
        )
        .await
        .unwrap();

        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].title, "Intro");
    }

    #[tokio::test]
    async fn wait_for_segments_times_out() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/lecture_segments"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;

        let (rest, _) = clients(&server);
        let err = wait_for_segments(
            &rest,
            42,
            Duration::from_millis(5),
            Duration::from_millis(20),
        )
        .await
        .unwrap_err();

        assert!(err.to_string().contains("timed out"));
    }
}
