/// Selectors tried, in order, when a category's primary selector no longer
/// resolves. Built from the lower-cased category key.
pub fn fallback_selectors(key: &str) -> Vec<String> {
    let key = key.to_lowercase();
    let normalized: String = key.chars().filter(|c| c.is_ascii_lowercase()).collect();
    let name_alias = key.replace("fullname", "name");

    vec![
        format!(r#"input[name="{key}"]"#),
        format!(r#"textarea[name="{key}"]"#),
        format!(r#"select[name="{key}"]"#),
        format!(r#"input[id="{key}"]"#),
        format!(r#"input[name*="{normalized}"]"#),
        format!(r#"input[id*="{normalized}"]"#),
        format!(r#"input[name*="{name_alias}"]"#),
    ]
}
