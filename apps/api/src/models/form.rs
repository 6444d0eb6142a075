use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One scanned form control (`input`, `textarea` or `select`).
///
/// `selector` is only meaningful against the DOM snapshot the scan ran on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScannedElement {
    pub tag: String,
    #[serde(rename = "type")]
    pub input_type: String,
    pub id: String,
    pub name: String,
    pub placeholder: String,
    pub autocomplete: String,
    pub labels: Vec<String>,
    pub selector: String,
}

impl ScannedElement {
    /// Lower-cased `id name placeholder labels...` used for keyword matching.
    pub fn haystack(&self) -> String {
        let mut parts: Vec<&str> = vec![&self.id, &self.name, &self.placeholder];
        parts.extend(self.labels.iter().map(String::as_str));
        parts.join(" ").to_lowercase()
    }
}

/// The fixed set of semantic form-field categories.
///
/// Serialized names are the keys the extension and register data use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FieldCategory {
    FullName,
    #[serde(rename = "email")]
    Email,
    #[serde(rename = "phone")]
    Phone,
    #[serde(rename = "github")]
    Github,
    #[serde(rename = "linkedin")]
    Linkedin,
    #[serde(rename = "domainSpecialization")]
    DomainSpecialization,
    #[serde(rename = "skills")]
    Skills,
    #[serde(rename = "experience")]
    Experience,
}

impl FieldCategory {
    pub const ALL: [FieldCategory; 8] = [
        FieldCategory::FullName,
        FieldCategory::Email,
        FieldCategory::Phone,
        FieldCategory::Github,
        FieldCategory::Linkedin,
        FieldCategory::DomainSpecialization,
        FieldCategory::Skills,
        FieldCategory::Experience,
    ];

    pub fn key(self) -> &'static str {
        match self {
            FieldCategory::FullName => "FullName",
            FieldCategory::Email => "email",
            FieldCategory::Phone => "phone",
            FieldCategory::Github => "github",
            FieldCategory::Linkedin => "linkedin",
            FieldCategory::DomainSpecialization => "domainSpecialization",
            FieldCategory::Skills => "skills",
            FieldCategory::Experience => "experience",
        }
    }
}

impl fmt::Display for FieldCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCategory(pub String);

impl fmt::Display for UnknownCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown field category '{}'", self.0)
    }
}

impl std::error::Error for UnknownCategory {}

impl FromStr for FieldCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldCategory::ALL
            .into_iter()
            .find(|c| c.key() == s)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// Category → selector of the first element bound to it.
pub type SelectorMap = BTreeMap<FieldCategory, String>;

/// Outcome of one autofill run.
///
/// A category never sits in both sets: `mark_filled` evicts it from `unfilled`
/// and `mark_unfilled` ignores categories already filled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutofillReport {
    pub filled: BTreeSet<FieldCategory>,
    pub unfilled: BTreeSet<FieldCategory>,
}

impl AutofillReport {
    pub fn mark_filled(&mut self, category: FieldCategory) {
        self.unfilled.remove(&category);
        self.filled.insert(category);
    }

    pub fn mark_unfilled(&mut self, category: FieldCategory) {
        if !self.filled.contains(&category) {
            self.unfilled.insert(category);
        }
    }

    pub fn is_complete(&self) -> bool {
        self.unfilled.is_empty()
    }
}
