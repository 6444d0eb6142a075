use regex::Regex;

/// Email, phone and profile-link patterns. Every rule returns the first match.
pub struct ContactRules {
    email: Regex,
    phones: Vec<Regex>,
    github: Regex,
    linkedin: Regex,
}

impl ContactRules {
    pub fn new() -> Self {
        Self {
            email: Regex::new(r"[A-Za-z0-9_.-]+@[A-Za-z0-9_.-]+\.[A-Za-z]{2,}")
                .expect("valid email pattern"),
            // Indian mobile numbers first, then a generic 3-3-4 grouping.
            phones: vec![
                Regex::new(r"\+91[-\s]?[0-9]{10}").expect("valid +91 phone pattern"),
                Regex::new(r"[0-9]{3}[-.\s]?[0-9]{3}[-.\s]?[0-9]{4}")
                    .expect("valid phone pattern"),
            ],
            github: Regex::new(r"(?i)https?://(?:www\.)?github\.com/[^\s)]+")
                .expect("valid github pattern"),
            linkedin: Regex::new(r"(?i)https?://(?:www\.)?linkedin\.com/in/[^\s)]+")
                .expect("valid linkedin pattern"),
        }
    }

    pub fn email(&self, text: &str) -> Option<String> {
        first_match(&self.email, text)
    }

    pub fn phone(&self, text: &str) -> Option<String> {
        self.phones
            .iter()
            .find_map(|pattern| first_match(pattern, text))
    }

    pub fn github(&self, text: &str) -> Option<String> {
        first_match(&self.github, text)
    }

    pub fn linkedin(&self, text: &str) -> Option<String> {
        first_match(&self.linkedin, text)
    }
}

impl Default for ContactRules {
    fn default() -> Self {
        Self::new()
    }
}

fn first_match(pattern: &Regex, text: &str) -> Option<String> {
    pattern.find(text).map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_first_match() {
        let rules = ContactRules::new();
        let text = "Reach me at jane.doe-work@mail.example.co.uk or jd@other.io";
        assert_eq!(
            rules.email(text).as_deref(),
            Some("jane.doe-work@mail.example.co.uk")
        );
    }

    #[test]
    fn test_email_requires_at_sign() {
        let rules = ContactRules::new();
        assert_eq!(rules.email("jane.doe at example dot com"), None);
        assert_eq!(rules.email("user@localhost"), None);
    }

    #[test]
    fn test_indian_number_wins_over_generic_pattern() {
        let rules = ContactRules::new();
        let text = "Office 555-123-4567, mobile +91 9876543210";
        assert_eq!(rules.phone(text).as_deref(), Some("+91 9876543210"));
    }

    #[test]
    fn test_generic_phone_groupings() {
        let rules = ContactRules::new();
        assert_eq!(rules.phone("tel: 555.123.4567").as_deref(), Some("555.123.4567"));
        assert_eq!(rules.phone("5551234567").as_deref(), Some("5551234567"));
        assert_eq!(rules.phone("call 555-12-34"), None);
    }

    #[test]
    fn test_profile_links_stop_at_whitespace_and_paren() {
        let rules = ContactRules::new();
        let text = "(https://GitHub.com/janedoe) and https://www.linkedin.com/in/jane-doe-42 next";
        assert_eq!(
            rules.github(text).as_deref(),
            Some("https://GitHub.com/janedoe")
        );
        assert_eq!(
            rules.linkedin(text).as_deref(),
            Some("https://www.linkedin.com/in/jane-doe-42")
        );
    }

    #[test]
    fn test_linkedin_requires_profile_path() {
        let rules = ContactRules::new();
        assert_eq!(rules.linkedin("https://linkedin.com/company/acme"), None);
    }
}
