pub mod form;
pub mod profile;

pub use form::{AutofillReport, FieldCategory, ScannedElement, SelectorMap};
pub use profile::{CandidateProfile, Extracted, ProfileData};
