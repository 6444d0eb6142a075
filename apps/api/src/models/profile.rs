use std::collections::BTreeMap;

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// Result of one independent field extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extracted {
    Found(String),
    NotFound,
}

impl Extracted {
    pub fn as_deref(&self) -> Option<&str> {
        match self {
            Extracted::Found(value) => Some(value),
            Extracted::NotFound => None,
        }
    }

    /// Wire text: the found value, or the field's sentinel message.
    pub fn or_sentinel<'a>(&'a self, sentinel: &'a str) -> &'a str {
        self.as_deref().unwrap_or(sentinel)
    }
}

impl From<Option<String>> for Extracted {
    fn from(value: Option<String>) -> Self {
        value.map_or(Extracted::NotFound, Extracted::Found)
    }
}

pub const NAME_NOT_FOUND: &str = "Name not found";
pub const EMAIL_NOT_FOUND: &str = "Email not found";
pub const PHONE_NOT_FOUND: &str = "Phone not found";
pub const GITHUB_NOT_FOUND: &str = "GitHub URL not found";
pub const LINKEDIN_NOT_FOUND: &str = "LinkedIn URL not found";
pub const DOMAIN_NOT_FOUND: &str = "Domain not found";

/// Contact/profile data pulled out of one resume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateProfile {
    pub name: Extracted,
    pub email: Extracted,
    pub phone: Extracted,
    pub github: Extracted,
    pub linkedin: Extracted,
    pub domain: Extracted,
    pub skills: Vec<String>,
}

#[derive(Serialize)]
struct ContactInfoWire<'a> {
    name: &'a str,
    email: &'a str,
    phone: &'a str,
    github: &'a str,
    linkedin: &'a str,
    domain: &'a str,
    skills: &'a [String],
}

impl Serialize for CandidateProfile {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ContactInfoWire {
            name: self.name.or_sentinel(NAME_NOT_FOUND),
            email: self.email.or_sentinel(EMAIL_NOT_FOUND),
            phone: self.phone.or_sentinel(PHONE_NOT_FOUND),
            github: self.github.or_sentinel(GITHUB_NOT_FOUND),
            linkedin: self.linkedin.or_sentinel(LINKEDIN_NOT_FOUND),
            domain: self.domain.or_sentinel(DOMAIN_NOT_FOUND),
            skills: &self.skills,
        }
        .serialize(serializer)
    }
}

impl CandidateProfile {
    /// Raw register record: found fields only, under their resume keys.
    /// Sentinels are left out so they can never be typed into a form.
    pub fn to_register_record(&self) -> Map<String, Value> {
        let mut record = Map::new();
        let scalars = [
            ("name", &self.name),
            ("email", &self.email),
            ("phone", &self.phone),
            ("github", &self.github),
            ("linkedin", &self.linkedin),
            ("domain", &self.domain),
        ];
        for (key, field) in scalars {
            if let Some(value) = field.as_deref() {
                record.insert(key.to_string(), Value::String(value.to_string()));
            }
        }
        if !self.skills.is_empty() {
            record.insert(
                "skills".to_string(),
                Value::Array(self.skills.iter().cloned().map(Value::String).collect()),
            );
        }
        record
    }
}

/// Normalized keyed candidate data consumed by the reconciler.
pub type ProfileData = BTreeMap<String, Value>;
