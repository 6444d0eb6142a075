// Resume ingestion: PDF → text → CandidateProfile.
// Extraction is pure and rule-based; PDF decoding must run in spawn_blocking.

pub mod contact;
pub mod extractor;
pub mod handlers;
pub mod name;
pub mod pdf;

pub use extractor::ResumeExtractor;
