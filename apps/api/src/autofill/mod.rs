pub mod document;
pub mod fallback;
pub mod normalize;
pub mod reconciler;

pub use document::{LiveDocument, MemoryDocument};
pub use normalize::normalize_profile;
pub use reconciler::{AutofillSession, Reconciler, ReconcilerPhase, OBSERVATION_WINDOW};
