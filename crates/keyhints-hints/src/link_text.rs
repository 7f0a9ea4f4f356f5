//! Text used to match and label hints in filter mode.

use crate::dom::Document;
use crate::local_hints::LocalHint;

#[cfg(test)]
#[path = "link_text_tests.rs"]
mod tests;

/// Matchable text for a hint, and whether the marker should display it
/// (true when the text is not visible on the page, e.g. a label or alt).
pub fn generate_link_text(doc: &Document, hint: &LocalHint, max_chars: usize) -> (String, bool) {
    let element = doc.element(hint.element);
    let mut show = false;

    let text = if element.tag == "input" {
        if let Some(label) = doc.labels_for(hint.element).first() {
            show = true;
            let text = doc.text_content(*label);
            let text = text.trim();
            text.strip_suffix(':').unwrap_or(text).to_string()
        } else if element.input_type() == "file" {
            "Choose File".to_string()
        } else if element.input_type() != "password" {
            match element.value().filter(|v| !v.is_empty()) {
                Some(value) => value.to_string(),
                None => element.attr("placeholder").unwrap_or_default().to_string(),
            }
        } else {
            String::new()
        }
    } else if let Some(image) = image_only_link(doc, hint) {
        let image = doc.element(image);
        let text = image
            .attr("alt")
            .filter(|alt| !alt.is_empty())
            .or_else(|| image.attr("title"))
            .unwrap_or_default()
            .to_string();
        show = !text.is_empty();
        text
    } else if let Some(reason) = hint.reason {
        show = true;
        reason.text().to_string()
    } else {
        let content = doc.text_content(hint.element);
        if !content.is_empty() {
            content.chars().take(max_chars).collect()
        } else if let Some(title) = element.attr("title") {
            title.to_string()
        } else {
            doc.inner_html(hint.element).chars().take(max_chars).collect()
        }
    };

    (text.trim().to_string(), show)
}

/// The image of an `<a>` whose only content is an image.
fn image_only_link(doc: &Document, hint: &LocalHint) -> Option<usize> {
    let element = doc.element(hint.element);
    if element.tag != "a" || !doc.text_content(hint.element).trim().is_empty() {
        return None;
    }
    element
        .children
        .first()
        .copied()
        .filter(|child| doc.element(*child).tag == "img")
}

/// Marker label: the hint string, followed by the link text when shown.
/// Long text is cut to fit `max_chars` including the ellipsis.
pub fn render_marker_text(
    hint_string: &str,
    link_text: Option<&str>,
    show_link_text: bool,
    max_chars: usize,
) -> String {
    match link_text {
        Some(text) if show_link_text => {
            let text = if text.chars().count() > max_chars {
                let cut: String = text.chars().take(max_chars.saturating_sub(2)).collect();
                format!("{cut}...")
            } else {
                text.to_string()
            };
            format!("{hint_string}: {text}")
        }
        _ => hint_string.to_string(),
    }
}
