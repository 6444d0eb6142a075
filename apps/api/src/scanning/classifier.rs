//! Field Classifier: binds scanned elements to semantic categories by keyword.

use crate::models::form::{FieldCategory, ScannedElement, SelectorMap};

/// Lower-case keyword fragments per category, checked in table order.
#[derive(Debug, Clone)]
pub struct KeywordTable {
    entries: Vec<(FieldCategory, Vec<String>)>,
}

impl KeywordTable {
    pub fn new(entries: Vec<(FieldCategory, Vec<String>)>) -> Self {
        let entries = entries
            .into_iter()
            .map(|(category, keywords)| {
                let keywords = keywords.into_iter().map(|k| k.to_lowercase()).collect();
                (category, keywords)
            })
            .collect();
        Self { entries }
    }

    pub fn keywords(&self, category: FieldCategory) -> &[String] {
        self.entries
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, keywords)| keywords.as_slice())
            .unwrap_or_default()
    }
}

impl Default for KeywordTable {
    fn default() -> Self {
        let table: [(FieldCategory, &[&str]); 8] = [
            (FieldCategory::FullName, &["name", "fullname", "full_name"]),
            (FieldCategory::Email, &["email", "e-mail"]),
            (FieldCategory::Phone, &["phone", "mobile", "tel"]),
            (FieldCategory::Github, &["github"]),
            (FieldCategory::Linkedin, &["linkedin"]),
            (
                FieldCategory::DomainSpecialization,
                &["domain", "specialization", "field", "stream"],
            ),
            (FieldCategory::Skills, &["skills", "technologies"]),
            (FieldCategory::Experience, &["experience", "work", "job"]),
        ];
        Self::new(
            table
                .into_iter()
                .map(|(category, keywords)| {
                    (category, keywords.iter().map(|k| k.to_string()).collect())
                })
                .collect(),
        )
    }
}

pub struct FieldClassifier {
    table: KeywordTable,
}

impl FieldClassifier {
    pub fn new(table: KeywordTable) -> Self {
        Self { table }
    }

    /// First element in scan order wins each category; no best-match scoring.
    pub fn classify(&self, elements: &[ScannedElement]) -> SelectorMap {
        let haystacks: Vec<String> = elements.iter().map(ScannedElement::haystack).collect();
        let mut fields = SelectorMap::new();

        for (category, keywords) in &self.table.entries {
            if fields.contains_key(category) {
                continue;
            }
            let matched = elements.iter().zip(&haystacks).find(|(_, haystack)| {
                keywords
                    .iter()
                    .any(|keyword| haystack.contains(keyword.as_str()))
            });
            if let Some((element, _)) = matched {
                fields.insert(*category, element.selector.clone());
            }
        }

        fields
    }
}

impl Default for FieldClassifier {
    fn default() -> Self {
        Self::new(KeywordTable::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanning::scanner::scan_html;

    fn element(id: &str, name: &str, placeholder: &str, labels: &[&str]) -> ScannedElement {
        ScannedElement {
            tag: "input".to_string(),
            input_type: "text".to_string(),
            id: id.to_string(),
            name: name.to_string(),
            placeholder: placeholder.to_string(),
            autocomplete: String::new(),
            labels: labels.iter().map(|l| l.to_string()).collect(),
            selector: format!("input#{id}"),
        }
    }

    #[test]
    fn test_matches_on_every_metadata_source() {
        let elements = vec![
            element("a", "applicant_fullname", "", &[]),
            element("b", "", "Your E-Mail", &[]),
            element("c", "", "", &["Mobile number"]),
            element("gh", "", "", &[]),
            element("d", "", "", &["Years of Experience"]),
        ];
        let fields = FieldClassifier::default().classify(&elements);
        assert_eq!(fields[&FieldCategory::FullName], "input#a");
        assert_eq!(fields[&FieldCategory::Email], "input#b");
        assert_eq!(fields[&FieldCategory::Phone], "input#c");
        assert_eq!(fields[&FieldCategory::Experience], "input#d");
        assert!(!fields.contains_key(&FieldCategory::Github));
        assert!(!fields.contains_key(&FieldCategory::Linkedin));
    }

    #[test]
    fn test_first_match_in_scan_order_wins() {
        let elements = vec![
            element("confirm-email", "", "", &[]),
            element("email", "", "", &[]),
        ];
        let classifier = FieldClassifier::default();
        for _ in 0..3 {
            let fields = classifier.classify(&elements);
            assert_eq!(fields[&FieldCategory::Email], "input#confirm-email");
        }
    }

    #[test]
    fn test_one_element_can_serve_several_categories() {
        let elements = vec![element("work-email", "", "", &[])];
        let fields = FieldClassifier::default().classify(&elements);
        assert_eq!(fields[&FieldCategory::Email], "input#work-email");
        assert_eq!(fields[&FieldCategory::Experience], "input#work-email");
    }

    #[test]
    fn test_custom_table_is_case_insensitive() {
        let table = KeywordTable::new(vec![(FieldCategory::Github, vec!["GitLab".to_string()])]);
        assert_eq!(table.keywords(FieldCategory::Github), ["gitlab"]);
        assert!(table.keywords(FieldCategory::Email).is_empty());

        let fields = FieldClassifier::new(table).classify(&[element("GITLAB-url", "", "", &[])]);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[&FieldCategory::Github], "input#GITLAB-url");
    }

    #[test]
    fn test_classifies_scanned_page() {
        let html = r#"
            <form id="signup">
              <label for="fn">Full name</label><input id="fn">
              <input name="contact_email" type="email">
              <input name="github_profile">
              <textarea placeholder="Tell us about your skills"></textarea>
            </form>
        "#;
        let fields = FieldClassifier::default().classify(&scan_html(html));
        assert_eq!(fields[&FieldCategory::FullName], "input#fn");
        assert_eq!(
            fields[&FieldCategory::Email],
            "form#signup > input:nth-of-type(2)"
        );
        assert_eq!(
            fields[&FieldCategory::Github],
            "form#signup > input:nth-of-type(3)"
        );
        assert_eq!(
            fields[&FieldCategory::Skills],
            "form#signup > textarea:nth-of-type(1)"
        );
    }
}
