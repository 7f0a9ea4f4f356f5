//! Finds the clickable elements of one frame and where to draw their hints.
//!
//! Resolution runs in three passes over the document in tree order:
//! classify each element, drop suspected false positives that merely wrap a
//! real clickable, then probe the element's rect for occlusion.

use keyhints_config::HintsConfig;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::dom::{Document, ElementId, area_shape_rect};
use crate::link_text::generate_link_text;
use crate::rect::Rect;

#[cfg(test)]
#[path = "local_hints_tests.rs"]
mod tests;

const CLICKABLE_ROLES: [&str; 8] = [
    "button",
    "tab",
    "link",
    "checkbox",
    "menuitem",
    "menuitemcheckbox",
    "menuitemradio",
    "radio",
];

/// Why a non-link element got a hint. Selecting it does something other
/// than a click.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HintReason {
    /// Focus the (unfocused) frame.
    Frame,
    /// Make the element the scroll target.
    Scroll,
    /// Toggle a `<details>` element.
    Open,
}

impl HintReason {
    pub fn text(self) -> &'static str {
        match self {
            HintReason::Frame => "Frame.",
            HintReason::Scroll => "Scroll.",
            HintReason::Open => "Open.",
        }
    }
}

/// A clickable element of this frame. Never leaves the frame; other frames
/// only see its index.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalHint {
    pub element: ElementId,
    /// Hint position in document coordinates.
    pub rect: Rect,
    pub reason: Option<HintReason>,
    /// Only has a non-negative `tabindex` to go on.
    pub second_class_citizen: bool,
    /// Only has a class name containing "button" to go on.
    pub possible_false_positive: bool,
    pub link_text: Option<String>,
    pub show_link_text: bool,
}

impl LocalHint {
    pub fn new(element: ElementId, rect: Rect) -> Self {
        Self {
            element,
            rect,
            reason: None,
            second_class_citizen: false,
            possible_false_positive: false,
            link_text: None,
            show_link_text: false,
        }
    }
}

/// Per-resolution inputs that vary with the frame's state.
#[derive(Debug, Clone, Copy, Default)]
pub struct HintOptions {
    /// Only elements with an `href` (copy-URL and incognito modes).
    pub require_href: bool,
    /// Compute link text for filter-mode matching.
    pub filter_mode: bool,
    pub window_focused: bool,
}

pub struct LocalHints {
    config: HintsConfig,
}

impl LocalHints {
    pub fn new(config: HintsConfig) -> Self {
        Self { config }
    }

    /// Every visible, unobstructed clickable in tree order.
    pub fn get_local_hints(&self, doc: &Document, options: HintOptions) -> Vec<LocalHint> {
        let mut visible: Vec<LocalHint> = Vec::new();
        for id in doc.all_elements() {
            if options.require_href && doc.element(id).href().is_none() {
                continue;
            }
            visible.extend(self.get_visible_clickable(doc, id, options.window_focused));
        }

        // Descendants before ancestors from here on.
        visible.reverse();
        let visible = self.drop_false_positives(doc, visible);

        let mut hints = Vec::new();
        for hint in visible.into_iter().rev() {
            if hint.second_class_citizen {
                continue;
            }
            if !self.is_unobstructed(doc, &hint) {
                trace!(element = hint.element, "hint is covered");
                continue;
            }
            hints.push(hint);
        }

        let (x, y) = (doc.viewport.scroll_x, doc.viewport.scroll_y);
        for hint in &mut hints {
            hint.rect = hint.rect.translate(x, y);
            if options.filter_mode {
                let (text, show) = generate_link_text(doc, hint, self.config.link_text_max_chars);
                hint.link_text = Some(text);
                hint.show_link_text = show;
            }
        }
        hints
    }

    /// A candidate flagged only by its class name is dropped when one of the
    /// few candidates just after it in tree order sits at most a few levels
    /// below it. `reversed` holds candidates in reverse tree order.
    fn drop_false_positives(&self, doc: &Document, reversed: Vec<LocalHint>) -> Vec<LocalHint> {
        let mut kept = Vec::with_capacity(reversed.len());
        for (position, hint) in reversed.iter().enumerate() {
            if !hint.possible_false_positive {
                kept.push(hint.clone());
                continue;
            }
            let start = position.saturating_sub(self.config.false_positive_lookback);
            let wraps_clickable = reversed[start..position].iter().any(|candidate| {
                let mut ancestor = Some(candidate.element);
                (0..self.config.false_positive_ancestor_hops).any(|_| {
                    ancestor = ancestor.and_then(|a| doc.parent(a));
                    ancestor == Some(hint.element)
                })
            });
            if wraps_clickable {
                trace!(element = hint.element, "dropping false positive");
            } else {
                kept.push(hint.clone());
            }
        }
        kept
    }

    /// Probe the center, then each corner nudged inward.
    fn is_unobstructed(&self, doc: &Document, hint: &LocalHint) -> bool {
        let rect = &hint.rect;
        let nudge = self.config.corner_nudge;
        let points = [
            rect.center(),
            (rect.left + nudge, rect.top + nudge),
            (rect.right - nudge, rect.top + nudge),
            (rect.left + nudge, rect.bottom - nudge),
            (rect.right - nudge, rect.bottom - nudge),
        ];
        points.into_iter().any(|(x, y)| {
            doc.element_from_point(x, y).is_some_and(|hit| {
                doc.contains(hint.element, hit) || doc.contains(hit, hint.element)
            })
        })
    }

    /// Hints an element contributes: none, one, or one per image-map area.
    pub fn get_visible_clickable(
        &self,
        doc: &Document,
        id: ElementId,
        window_focused: bool,
    ) -> Vec<LocalHint> {
        let element = doc.element(id);
        let tag = element.tag.as_str();
        let mut clickable = false;
        let mut only_has_tab_index = false;
        let mut possible_false_positive = false;
        let mut reason = None;
        let mut hints = Vec::new();

        if tag == "img" {
            if let (Some(map), Some(image_rect)) = (doc.map_for_image(id), element.rects.first()) {
                clickable = true;
                hints.extend(self.client_rects_for_areas(doc, image_rect, &doc.areas(map)));
            }
        }

        if let Some(aria_disabled) = element.attr("aria-disabled") {
            if matches!(aria_disabled.to_lowercase().as_str(), "" | "true") {
                return Vec::new();
            }
        }

        clickable |= has_angular_click(doc, id);

        if element.has_attr("onclick") {
            clickable = true;
        } else if element
            .attr("role")
            .is_some_and(|role| CLICKABLE_ROLES.contains(&role.to_lowercase().as_str()))
        {
            clickable = true;
        } else if element.is_content_editable() {
            clickable = true;
        }

        if !clickable {
            if let Some(rules) = element.attr("jsaction") {
                clickable = jsaction_is_clickable(rules);
            }
        }

        match tag {
            "a" | "object" | "embed" => clickable = true,
            "textarea" => clickable |= !element.is_disabled() && !element.is_read_only(),
            "input" => {
                clickable |= !(element.input_type() == "hidden"
                    || element.is_disabled()
                    || (element.is_read_only() && element.is_selectable()));
            }
            "button" | "select" => clickable |= !element.is_disabled(),
            "label" => {
                clickable |= doc.label_control(id).is_some_and(|control| {
                    !doc.element(control).is_disabled()
                        && self.get_visible_clickable(doc, control, window_focused).is_empty()
                });
            }
            "body" if doc.body() == Some(id) => {
                let viewport = &doc.viewport;
                if !clickable
                    && !window_focused
                    && viewport.inner_width > 3.0
                    && viewport.inner_height > 3.0
                {
                    clickable = true;
                    reason = Some(HintReason::Frame);
                }
                if !clickable && window_focused && doc.is_scrollable(id) {
                    clickable = true;
                    reason = Some(HintReason::Scroll);
                }
            }
            "img" => {
                clickable |= matches!(element.style.cursor.as_deref(), Some("zoom-in" | "zoom-out"));
            }
            "div" | "ol" | "ul" => {
                if !clickable && element.client_height < element.scroll_height && doc.is_scrollable(id) {
                    clickable = true;
                    reason = Some(HintReason::Scroll);
                }
            }
            "details" => {
                clickable = true;
                reason = Some(HintReason::Open);
            }
            _ => {}
        }

        if !clickable && element.class_name().to_lowercase().contains("button") {
            clickable = true;
            possible_false_positive = true;
        }

        if !clickable {
            let tab_index = element.attr("tabindex").and_then(|t| t.trim().parse::<i32>().ok());
            if tab_index.is_some_and(|t| t >= 0) {
                clickable = true;
                only_has_tab_index = true;
            }
        }

        if clickable && hints.is_empty() {
            if let Some(rect) = self.get_visible_client_rect(doc, id, true) {
                let mut hint = LocalHint::new(id, rect);
                hint.reason = reason;
                hint.second_class_citizen = only_has_tab_index;
                hint.possible_false_positive = possible_false_positive;
                hints.push(hint);
            }
        }
        hints
    }

    /// First client rect of the element that survives cropping and the
    /// size floor. A zero-size rect (with `test_children`) defers to floated
    /// or absolutely positioned children, which is how links wrapping such
    /// content are laid out.
    pub fn get_visible_client_rect(
        &self,
        doc: &Document,
        id: ElementId,
        test_children: bool,
    ) -> Option<Rect> {
        let element = doc.element(id);
        let min = self.config.min_rect_size;
        let inline_zero_font =
            element.style.display.starts_with("inline") && element.style.font_size == 0.0;

        for client_rect in &element.rects {
            if (client_rect.width == 0.0 || client_rect.height == 0.0) && test_children {
                for child in &element.children {
                    let style = &doc.element(*child).style;
                    let positioned = matches!(style.position.as_str(), "absolute" | "fixed");
                    if style.float == "none"
                        && !positioned
                        && !(client_rect.height == 0.0 && inline_zero_font)
                    {
                        continue;
                    }
                    match self.get_visible_client_rect(doc, *child, true) {
                        Some(rect) if rect.width >= min && rect.height >= min => return Some(rect),
                        _ => continue,
                    }
                }
            } else {
                let Some(rect) = self.crop_rect_to_visible(doc, client_rect) else {
                    continue;
                };
                if rect.width < min || rect.height < min {
                    continue;
                }
                if element.style.visibility != "visible" {
                    continue;
                }
                return Some(rect);
            }
        }
        None
    }

    /// Clamp the top-left corner into the viewport. Rects starting in the
    /// last few pixels of the viewport, or beyond it, are not visible.
    pub fn crop_rect_to_visible(&self, doc: &Document, rect: &Rect) -> Option<Rect> {
        let bounded = Rect::create(rect.left.max(0.0), rect.top.max(0.0), rect.right, rect.bottom);
        let viewport = &doc.viewport;
        if bounded.top >= viewport.inner_height - 4.0 || bounded.left >= viewport.inner_width - 4.0 {
            return None;
        }
        Some(bounded)
    }

    /// One hint per visible `<area>` of an image map.
    pub fn client_rects_for_areas(
        &self,
        doc: &Document,
        image_rect: &Rect,
        areas: &[ElementId],
    ) -> Vec<LocalHint> {
        let min = self.config.min_rect_size;
        areas
            .iter()
            .filter_map(|area| {
                let rect = area_shape_rect(image_rect, doc.element(*area))?;
                let rect = self.crop_rect_to_visible(doc, &rect)?;
                (rect.width >= min && rect.height >= min).then(|| LocalHint::new(*area, rect))
            })
            .collect()
    }
}

/// AngularJS click bindings, only looked for on pages using AngularJS.
fn has_angular_click(doc: &Document, id: ElementId) -> bool {
    if !doc.any_has_class("ng-scope") {
        return false;
    }
    let element = doc.element(id);
    ["", "data-", "x-"].iter().any(|prefix| {
        ["-", ":", "_"]
            .iter()
            .any(|separator| element.has_attr(&format!("{prefix}ng{separator}click")))
    })
}

/// `jsaction` rules are `event:namespace.action` separated by `;`. A rule
/// without an event means `click`. Only click rules with a real namespace
/// and action count.
pub fn jsaction_is_clickable(rules: &str) -> bool {
    rules.split(';').any(|rule| {
        let parts: Vec<&str> = rule.trim().split(':').collect();
        let (event, handler) = match parts.as_slice() {
            [handler] => ("click", *handler),
            [event, handler] => (*event, *handler),
            _ => return false,
        };
        let mut names = handler.trim().split('.');
        let namespace = names.next().unwrap_or_default();
        let action = names.next().unwrap_or("_");
        event == "click" && namespace != "none" && action != "_"
    })
}
