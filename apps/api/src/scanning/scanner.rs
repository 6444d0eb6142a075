//! Form field scanner: enumerates form controls of a parsed page and gives
//! each one a structural selector.

use scraper::{node::Element, ElementRef, Html, Selector};

use crate::models::form::ScannedElement;

pub const FORM_CONTROLS: &str = "input, textarea, select";

/// Elements whose text is not part of a label's visible caption.
const LABEL_TEXT_EXCLUDED: [&str; 4] = ["textarea", "select", "script", "style"];

pub fn form_control_selector() -> Selector {
    Selector::parse(FORM_CONTROLS).expect("valid form control selector")
}

/// Every `input`, `textarea` and `select`, in document order.
pub fn scan(document: &Html) -> Vec<ScannedElement> {
    let controls = form_control_selector();
    let labels = Selector::parse("label").expect("valid label selector");
    let all_labels: Vec<ElementRef> = document.select(&labels).collect();

    document
        .select(&controls)
        .map(|element| describe(element, &all_labels, &controls))
        .collect()
}

/// Convenience for callers holding raw HTML.
pub fn scan_html(html: &str) -> Vec<ScannedElement> {
    scan(&Html::parse_document(html))
}

fn describe(element: ElementRef, labels: &[ElementRef], controls: &Selector) -> ScannedElement {
    let el = element.value();
    let attr = |name: &str| el.attr(name).unwrap_or_default().to_string();

    ScannedElement {
        tag: el.name().to_string(),
        input_type: control_type(el),
        id: attr("id"),
        name: attr("name"),
        placeholder: attr("placeholder"),
        autocomplete: attr("autocomplete"),
        labels: label_texts(element, labels, controls),
        selector: structural_selector(element),
    }
}

/// Path from the nearest id-bearing ancestor (or the root) down to `element`.
///
/// Each step is `tag#id` (which ends the walk) or `tag:nth-of-type(n)`.
pub fn structural_selector(element: ElementRef) -> String {
    let mut parts = Vec::new();
    let mut current = Some(element);

    while let Some(el) = current {
        let tag = el.value().name();
        if let Some(id) = el.value().id().filter(|id| !id.is_empty()) {
            parts.push(format!("{tag}#{id}"));
            break;
        }

        let nth = 1 + el
            .prev_siblings()
            .filter_map(ElementRef::wrap)
            .filter(|sibling| sibling.value().name() == tag)
            .count();
        parts.push(format!("{tag}:nth-of-type({nth})"));

        current = el.parent().and_then(ElementRef::wrap);
    }

    parts.reverse();
    parts.join(" > ")
}

fn control_type(el: &Element) -> String {
    match el.name() {
        "textarea" => "textarea".to_string(),
        "select" if el.attr("multiple").is_some() => "select-multiple".to_string(),
        "select" => "select-one".to_string(),
        _ => el
            .attr("type")
            .map(|t| t.trim().to_ascii_lowercase())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "text".to_string()),
    }
}

/// Labels pointing at `element` via `for`, or wrapping it without one.
fn label_texts(element: ElementRef, labels: &[ElementRef], controls: &Selector) -> Vec<String> {
    if element.value().name() == "input" && control_type(element.value()) == "hidden" {
        return Vec::new();
    }

    let own_id = element.value().id().filter(|id| !id.is_empty());
    labels
        .iter()
        .filter(|label| match label.value().attr("for") {
            Some(target) => own_id == Some(target),
            // An implicit label targets its first form control descendant.
            None => label
                .select(controls)
                .next()
                .is_some_and(|first| first == element),
        })
        .map(|label| caption(*label))
        .collect()
}

/// Label text as rendered, without nested textarea/select contents or scripts.
fn caption(label: ElementRef) -> String {
    let root = *label;
    let mut text = String::new();
    for node in root.descendants() {
        let Some(fragment) = node.value().as_text() else {
            continue;
        };
        let excluded = node
            .ancestors()
            .take_while(|ancestor| ancestor.id() != root.id())
            .filter_map(ElementRef::wrap)
            .any(|el| LABEL_TEXT_EXCLUDED.contains(&el.value().name()));
        if !excluded {
            text.push_str(fragment);
        }
    }
    collapse_whitespace(&text)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
