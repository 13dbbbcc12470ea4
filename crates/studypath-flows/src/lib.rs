//! studypath-flows — Side-effecting orchestration.
//!
//! Glues the pure core to the remote services: lecture upload, cascade
//! deletes, the flashcard ensure flow, and quiz-slot persistence. No flow
//! is fatal to the process; failures surface as errors with context.

pub mod delete;
pub mod flashcards;
pub mod quiz;
pub mod upload;

pub use delete::{delete_course, delete_lecture, CascadeReport};
pub use flashcards::ensure_flashcards;
pub use quiz::SegmentQuizRunner;
pub use upload::{upload_lecture, wait_for_segments, LectureUpload, UploadedLecture};
