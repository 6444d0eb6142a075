// Profile register: the most recently parsed resume, served raw to the
// extension's background component.

pub mod handlers;

use std::sync::Arc;

use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::info;

use crate::models::profile::CandidateProfile;

#[derive(Clone, Default)]
pub struct ProfileRegister {
    latest: Arc<RwLock<Option<Map<String, Value>>>>,
}

impl ProfileRegister {
    pub async fn store(&self, profile: &CandidateProfile) {
        let record = profile.to_register_record();
        info!("Registered profile with {} field(s)", record.len());
        *self.latest.write().await = Some(record);
    }

    pub async fn latest(&self) -> Option<Map<String, Value>> {
        self.latest.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::ResumeExtractor;

    #[tokio::test]
    async fn test_latest_profile_replaces_previous() {
        let register = ProfileRegister::default();
        assert!(register.latest().await.is_none());

        let extractor = ResumeExtractor::default();
        register
            .store(&extractor.extract("Jane Doe\njane@example.com"))
            .await;
        register
            .store(&extractor.extract("John Roe\njohn@example.com"))
            .await;

        let latest = register.latest().await.unwrap();
        assert_eq!(latest["name"], "John Roe");
        assert_eq!(latest["email"], "john@example.com");
        assert!(!latest.contains_key("github"));
    }
}
