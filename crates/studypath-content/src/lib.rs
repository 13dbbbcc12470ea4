//! studypath-content — Content-generation service integrations.
//!
//! Implements the `ContentGenerator` trait against the backend's hosted
//! functions, plus the local quiz-config cache and a mock generator for
//! testing flows without a network.

pub mod cache;
pub mod generate;
pub mod mock;

pub use cache::QuizConfigCache;
pub use generate::ContentClient;
pub use mock::MockGenerator;
