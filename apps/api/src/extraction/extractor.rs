//! Resume text extractor: turns raw resume text into a `CandidateProfile`.
//!
//! Every field is resolved independently; a miss on one field never affects
//! the others and is reported as `Extracted::NotFound`.

use regex::Regex;

use crate::extraction::contact::ContactRules;
use crate::extraction::name::NameRules;
use crate::models::profile::{CandidateProfile, Extracted};

/// Technology domains, in priority order. The first one present in the text wins.
pub const DEFAULT_DOMAIN_KEYWORDS: &[&str] = &[
    "full stack",
    "frontend",
    "backend",
    "android",
    "data science",
    "machine learning",
    "ai",
    "cloud",
    "cybersecurity",
    "web development",
    "devops",
    "software engineering",
];

const TECHNICAL_SKILLS_WINDOW: usize = 300;

pub struct ResumeExtractor {
    names: NameRules,
    contacts: ContactRules,
    domain_keywords: Vec<String>,
    skills_line: Regex,
    technical_skills: Regex,
}

impl ResumeExtractor {
    pub fn new(domain_keywords: Vec<String>) -> Self {
        Self {
            names: NameRules::new(),
            contacts: ContactRules::new(),
            domain_keywords: domain_keywords
                .into_iter()
                .map(|keyword| keyword.to_lowercase())
                .collect(),
            skills_line: Regex::new(r"(?i)skills?:\s*(.+)").expect("valid skills pattern"),
            technical_skills: Regex::new(&format!(
                r"(?is)technical skills.{{0,{TECHNICAL_SKILLS_WINDOW}}}"
            ))
            .expect("valid technical skills pattern"),
        }
    }

    pub fn extract(&self, text: &str) -> CandidateProfile {
        CandidateProfile {
            name: self.names.extract(text).into(),
            email: self.contacts.email(text).into(),
            phone: self.contacts.phone(text).into(),
            github: self.contacts.github(text).into(),
            linkedin: self.contacts.linkedin(text).into(),
            domain: self.extract_domain(text),
            skills: self.extract_skills(text),
        }
    }

    /// Keyword list order decides, not position in the text.
    pub fn extract_domain(&self, text: &str) -> Extracted {
        let lower = text.to_lowercase();
        self.domain_keywords
            .iter()
            .find(|keyword| lower.contains(keyword.as_str()))
            .map(|keyword| capitalize_first(keyword))
            .into()
    }

    pub fn extract_skills(&self, text: &str) -> Vec<String> {
        if let Some(captures) = self.skills_line.captures(text) {
            return split_list(&captures[1]);
        }

        if let Some(section) = self.technical_skills.find(text) {
            // Drop the heading line itself.
            let body = section
                .as_str()
                .split('\n')
                .skip(1)
                .collect::<Vec<_>>()
                .join(", ");
            return split_list(&body);
        }

        Vec::new()
    }
}

impl Default for ResumeExtractor {
    fn default() -> Self {
        Self::new(
            DEFAULT_DOMAIN_KEYWORDS
                .iter()
                .map(|keyword| keyword.to_string())
                .collect(),
        )
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(|c| c == ',' || c == '\n')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
}

fn capitalize_first(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RESUME: &str = r#"
        Priya Sharma
        priya.sharma@example.com | +91-9876543210
        https://github.com/priyasharma | https://www.linkedin.com/in/priya-sharma

        Summary
        Full stack developer with a focus on backend services.

        Skills: Rust, TypeScript, PostgreSQL, Docker
    "#;

    #[test]
    fn test_full_profile_extraction() {
        let profile = ResumeExtractor::default().extract(SAMPLE_RESUME);
        assert_eq!(profile.name, Extracted::Found("Priya Sharma".to_string()));
        assert_eq!(
            profile.email,
            Extracted::Found("priya.sharma@example.com".to_string())
        );
        assert_eq!(profile.phone, Extracted::Found("+91-9876543210".to_string()));
        assert_eq!(
            profile.github,
            Extracted::Found("https://github.com/priyasharma".to_string())
        );
        assert_eq!(
            profile.linkedin,
            Extracted::Found("https://www.linkedin.com/in/priya-sharma".to_string())
        );
        assert_eq!(profile.domain, Extracted::Found("Full stack".to_string()));
        assert_eq!(
            profile.skills,
            vec!["Rust", "TypeScript", "PostgreSQL", "Docker"]
        );
    }

    #[test]
    fn test_missing_fields_are_independent() {
        let profile = ResumeExtractor::default().extract("Bob Stone\nno contact details here");
        assert_eq!(profile.name, Extracted::Found("Bob Stone".to_string()));
        assert_eq!(profile.email, Extracted::NotFound);
        assert_eq!(profile.phone, Extracted::NotFound);
        assert_eq!(profile.github, Extracted::NotFound);
        assert!(profile.skills.is_empty());
    }

    #[test]
    fn test_skills_line_preserves_order_and_trims() {
        let extractor = ResumeExtractor::default();
        assert_eq!(
            extractor.extract_skills("Skills: Go, Rust, C++"),
            vec!["Go", "Rust", "C++"]
        );
        assert_eq!(
            extractor.extract_skills("SKILL:   Kotlin ,, Swift  "),
            vec!["Kotlin", "Swift"]
        );
    }

    #[test]
    fn test_skills_line_may_start_on_next_line() {
        let extractor = ResumeExtractor::default();
        assert_eq!(
            extractor.extract_skills("Skills:\nPython, SQL\nExperience"),
            vec!["Python", "SQL"]
        );
    }

    #[test]
    fn test_technical_skills_heading_fallback() {
        let extractor = ResumeExtractor::default();
        let text = "Technical Skills\nRust, Go\nKubernetes";
        assert_eq!(
            extractor.extract_skills(text),
            vec!["Rust", "Go", "Kubernetes"]
        );
    }

    #[test]
    fn test_technical_skills_window_is_bounded() {
        let extractor = ResumeExtractor::default();
        let text = format!("Technical Skills\nRust\n{}\nCOBOL", "-".repeat(400));
        let skills = extractor.extract_skills(&text);
        assert_eq!(skills[0], "Rust");
        assert!(!skills.iter().any(|s| s == "COBOL"));
    }

    #[test]
    fn test_domain_uses_list_order_not_text_order() {
        let extractor = ResumeExtractor::default();
        let text = "Devops enthusiast who also writes frontend code";
        assert_eq!(
            extractor.extract_domain(text),
            Extracted::Found("Frontend".to_string())
        );
        assert_eq!(extractor.extract_domain(text), extractor.extract_domain(text));
    }

    #[test]
    fn test_domain_not_found() {
        let extractor = ResumeExtractor::default();
        assert_eq!(
            extractor.extract_domain("Gardening and pottery"),
            Extracted::NotFound
        );
    }

    #[test]
    fn test_custom_domain_keywords() {
        let extractor = ResumeExtractor::new(vec!["Embedded".to_string()]);
        assert_eq!(
            extractor.extract_domain("embedded firmware in C"),
            Extracted::Found("Embedded".to_string())
        );
    }
}
