//! Upload, question-answering, and summary orchestration.

pub mod decode;
pub mod service;
pub mod types;

pub use decode::{SourceEncoding, decode_text};
pub use service::{ANSWER_PLACEHOLDER, DocumentService, SUMMARY_INSTRUCTION, SUMMARY_PLACEHOLDER};
pub use types::{DocumentError, HealthSnapshot, UploadedFile};
