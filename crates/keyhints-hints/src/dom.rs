//! In-memory model of a frame's document.
//!
//! A [`Document`] is an arena of [`Element`]s with the layout facts hint
//! resolution needs: client rects, computed style, scroll geometry and
//! stacking order. Documents are usually loaded from a nested JSON tree
//! ([`DocumentSpec`]).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::rect::Rect;

#[cfg(test)]
#[path = "dom_tests.rs"]
mod tests;

/// Index of an element within its [`Document`].
pub type ElementId = usize;

/// Viewport of the frame, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Viewport {
    pub inner_width: f64,
    pub inner_height: f64,
    pub scroll_x: f64,
    pub scroll_y: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            inner_width: 1280.0,
            inner_height: 720.0,
            scroll_x: 0.0,
            scroll_y: 0.0,
        }
    }
}

/// The subset of computed style hint resolution looks at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Style {
    pub visibility: String,
    pub display: String,
    pub position: String,
    pub float: String,
    /// Font size in pixels.
    pub font_size: f64,
    pub cursor: Option<String>,
    pub pointer_events: String,
    pub overflow_y: String,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            visibility: "visible".to_string(),
            display: "block".to_string(),
            position: "static".to_string(),
            float: "none".to_string(),
            font_size: 16.0,
            cursor: None,
            pointer_events: "auto".to_string(),
            overflow_y: "visible".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Element {
    /// Lowercase tag name.
    pub tag: String,
    pub attributes: BTreeMap<String, String>,
    /// Text directly inside this element.
    pub text: String,
    /// Client rects in viewport coordinates.
    pub rects: Vec<Rect>,
    pub style: Style,
    pub scroll_height: f64,
    pub client_height: f64,
    pub z_index: Option<i32>,
    pub parent: Option<ElementId>,
    pub children: Vec<ElementId>,
    pub shadow_root: Vec<ElementId>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_lowercase(),
            attributes: BTreeMap::new(),
            text: String::new(),
            rects: Vec::new(),
            style: Style::default(),
            scroll_height: 0.0,
            client_height: 0.0,
            z_index: None,
            parent: None,
            children: Vec::new(),
            shadow_root: Vec::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    pub fn is_disabled(&self) -> bool {
        self.has_attr("disabled")
    }

    pub fn is_read_only(&self) -> bool {
        self.has_attr("readonly")
    }

    pub fn value(&self) -> Option<&str> {
        self.attr("value")
    }

    /// Non-empty `href`, as a link would report it.
    pub fn href(&self) -> Option<&str> {
        self.attr("href").filter(|href| !href.is_empty())
    }

    /// Lowercase input type; `text` when absent.
    pub fn input_type(&self) -> String {
        self.attr("type")
            .map(str::to_lowercase)
            .unwrap_or_else(|| "text".to_string())
    }

    pub fn class_name(&self) -> &str {
        self.attr("class").unwrap_or_default()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.class_name().split_whitespace().any(|c| c == class)
    }

    /// Content-editable per the `contenteditable` attribute.
    pub fn is_content_editable(&self) -> bool {
        matches!(
            self.attr("contenteditable").map(str::to_lowercase).as_deref(),
            Some("" | "contenteditable" | "true" | "plaintext-only")
        )
    }

    /// Text inputs and text areas which take a selection rather than a click.
    pub fn is_selectable(&self) -> bool {
        const UNSELECTABLE: [&str; 9] = [
            "button", "checkbox", "color", "file", "hidden", "image", "radio", "reset", "submit",
        ];
        (self.tag == "input" && !UNSELECTABLE.contains(&self.input_type().as_str()))
            || self.tag == "textarea"
            || self.is_content_editable()
    }

    fn is_visible_for_hit_testing(&self) -> bool {
        self.style.visibility == "visible" && self.style.pointer_events != "none"
    }
}

/// Nested form of a document, as loaded from JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeSpec {
    pub tag: String,
    pub attributes: BTreeMap<String, String>,
    pub text: String,
    /// Client rects as `[x1, y1, x2, y2]`.
    pub rects: Vec<[f64; 4]>,
    pub style: Style,
    pub scroll_height: f64,
    pub client_height: f64,
    pub z_index: Option<i32>,
    pub children: Vec<NodeSpec>,
    pub shadow_root: Vec<NodeSpec>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentSpec {
    #[serde(default)]
    pub viewport: Viewport,
    pub root: NodeSpec,
}

#[derive(Debug, Clone)]
pub struct Document {
    pub viewport: Viewport,
    elements: Vec<Element>,
    root: ElementId,
}

impl Document {
    /// An empty `<html><body></body></html>` document.
    pub fn new(viewport: Viewport) -> Self {
        let mut document = Self {
            viewport,
            elements: vec![Element::new("html")],
            root: 0,
        };
        document.append_child(0, Element::new("body"));
        document
    }

    pub fn from_spec(spec: DocumentSpec) -> Self {
        let mut document = Self {
            viewport: spec.viewport,
            elements: Vec::new(),
            root: 0,
        };
        document.root = document.insert_spec(spec.root, None, false);
        document
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        Ok(Self::from_spec(serde_json::from_str(json)?))
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        Ok(Self::from_spec(serde_json::from_value(value)?))
    }

    fn insert_spec(&mut self, spec: NodeSpec, parent: Option<ElementId>, shadow: bool) -> ElementId {
        let mut element = Element::new(spec.tag);
        element.attributes = spec.attributes;
        element.text = spec.text;
        element.rects = spec.rects.into_iter().map(Rect::from_corners).collect();
        element.style = spec.style;
        element.scroll_height = spec.scroll_height;
        element.client_height = spec.client_height;
        element.z_index = spec.z_index;
        let id = self.push(element, parent, shadow);
        for child in spec.shadow_root {
            self.insert_spec(child, Some(id), true);
        }
        for child in spec.children {
            self.insert_spec(child, Some(id), false);
        }
        id
    }

    fn push(&mut self, mut element: Element, parent: Option<ElementId>, shadow: bool) -> ElementId {
        let id = self.elements.len();
        element.parent = parent;
        self.elements.push(element);
        if let Some(parent) = parent {
            let host = &mut self.elements[parent];
            if shadow {
                host.shadow_root.push(id);
            } else {
                host.children.push(id);
            }
        }
        id
    }

    pub fn append_child(&mut self, parent: ElementId, element: Element) -> ElementId {
        self.push(element, Some(parent), false)
    }

    pub fn attach_shadow_child(&mut self, host: ElementId, element: Element) -> ElementId {
        self.push(element, Some(host), true)
    }

    pub fn root(&self) -> ElementId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(id)
    }

    /// Panics on an id from another document.
    pub fn element(&self, id: ElementId) -> &Element {
        &self.elements[id]
    }

    pub fn element_mut(&mut self, id: ElementId) -> &mut Element {
        &mut self.elements[id]
    }

    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.elements.get(id).and_then(|e| e.parent)
    }

    /// First `body` element in the light tree.
    pub fn body(&self) -> Option<ElementId> {
        self.descendants(self.root)
            .into_iter()
            .find(|id| self.elements[*id].tag == "body")
    }

    /// Light-tree descendants of `id` in document order.
    pub fn descendants(&self, id: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        let mut stack: Vec<ElementId> = self.elements[id].children.iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.elements[next].children.iter().rev().copied());
        }
        out
    }

    /// Every element below the root in document order. Shadow-root
    /// contents follow their host, ahead of the host's light children.
    pub fn all_elements(&self) -> Vec<ElementId> {
        let mut out = Vec::new();
        self.collect_with_shadow(self.root, &mut out);
        out
    }

    fn collect_with_shadow(&self, id: ElementId, out: &mut Vec<ElementId>) {
        let element = &self.elements[id];
        for child in element.shadow_root.iter().chain(element.children.iter()) {
            out.push(*child);
            self.collect_with_shadow(*child, out);
        }
    }

    /// True when `other` is `id` or lies somewhere below it, including
    /// inside shadow roots.
    pub fn contains(&self, id: ElementId, other: ElementId) -> bool {
        let mut current = Some(other);
        while let Some(candidate) = current {
            if candidate == id {
                return true;
            }
            current = self.parent(candidate);
        }
        false
    }

    pub fn text_content(&self, id: ElementId) -> String {
        let mut text = self.elements[id].text.clone();
        for child in &self.elements[id].children {
            text.push_str(&self.text_content(*child));
        }
        text
    }

    pub fn inner_html(&self, id: ElementId) -> String {
        let mut html = self.elements[id].text.clone();
        for child in &self.elements[id].children {
            html.push_str(&self.outer_html(*child));
        }
        html
    }

    fn outer_html(&self, id: ElementId) -> String {
        let element = &self.elements[id];
        let mut html = format!("<{}", element.tag);
        for (name, value) in &element.attributes {
            html.push_str(&format!(" {}=\"{}\"", name, value));
        }
        html.push('>');
        html.push_str(&self.inner_html(id));
        html.push_str(&format!("</{}>", element.tag));
        html
    }

    pub fn element_by_id(&self, dom_id: &str) -> Option<ElementId> {
        self.all_elements()
            .into_iter()
            .find(|id| self.elements[*id].attr("id") == Some(dom_id))
    }

    pub fn any_has_class(&self, class: &str) -> bool {
        self.elements.iter().any(|e| e.has_class(class))
    }

    /// The labelled control: the `for` target, else the first labelable
    /// descendant.
    pub fn label_control(&self, label: ElementId) -> Option<ElementId> {
        let element = &self.elements[label];
        if element.tag != "label" {
            return None;
        }
        if let Some(target) = element.attr("for") {
            return self.element_by_id(target);
        }
        self.descendants(label).into_iter().find(|id| {
            matches!(
                self.elements[*id].tag.as_str(),
                "input" | "select" | "textarea" | "button"
            )
        })
    }

    /// Labels whose control is `control`, in document order.
    pub fn labels_for(&self, control: ElementId) -> Vec<ElementId> {
        self.all_elements()
            .into_iter()
            .filter(|id| self.elements[*id].tag == "label")
            .filter(|id| self.label_control(*id) == Some(control))
            .collect()
    }

    /// The `<map>` referenced by an image's `usemap`.
    pub fn map_for_image(&self, image: ElementId) -> Option<ElementId> {
        let name = self.elements[image].attr("usemap")?.strip_prefix('#')?;
        self.all_elements().into_iter().find(|id| {
            let element = &self.elements[*id];
            element.tag == "map" && element.attr("name") == Some(name)
        })
    }

    /// `<area>` elements of a map, in document order.
    pub fn areas(&self, map: ElementId) -> Vec<ElementId> {
        self.descendants(map)
            .into_iter()
            .filter(|id| self.elements[*id].tag == "area")
            .collect()
    }

    pub fn is_scrollable(&self, id: ElementId) -> bool {
        let element = &self.elements[id];
        if element.scroll_height <= element.client_height {
            return false;
        }
        match element.style.overflow_y.as_str() {
            "hidden" => false,
            "auto" | "scroll" => true,
            _ => matches!(element.tag.as_str(), "body" | "html"),
        }
    }

    /// Top-most element under a viewport point: highest z-index, then
    /// latest in document order. Image maps resolve to the area hit.
    pub fn element_from_point(&self, x: f64, y: f64) -> Option<ElementId> {
        let mut order = vec![self.root];
        order.extend(self.all_elements());
        let hit = order
            .into_iter()
            .enumerate()
            .filter(|(_, id)| {
                let element = &self.elements[*id];
                element.is_visible_for_hit_testing()
                    && element.rects.iter().any(|r| r.contains_point(x, y))
            })
            .max_by_key(|(position, id)| (self.elements[*id].z_index.unwrap_or(0), *position))
            .map(|(_, id)| id)?;

        if self.elements[hit].tag == "img" {
            if let Some(area) = self.area_at(hit, x, y) {
                return Some(area);
            }
        }
        Some(hit)
    }

    fn area_at(&self, image: ElementId, x: f64, y: f64) -> Option<ElementId> {
        let image_rect = self.elements[image].rects.first()?;
        let map = self.map_for_image(image)?;
        self.areas(map).into_iter().find(|area| {
            area_shape_rect(image_rect, &self.elements[*area])
                .is_some_and(|rect| rect.contains_point(x, y))
        })
    }

    pub fn set_attribute(&mut self, id: ElementId, name: &str, value: &str) {
        self.elements[id]
            .attributes
            .insert(name.to_string(), value.to_string());
    }

    pub fn remove_attribute(&mut self, id: ElementId, name: &str) {
        self.elements[id].attributes.remove(name);
    }
}

/// Viewport rect of an `<area>` within an image at `image_rect`. Circles
/// map to their inscribed square and polygons to the box of their first two
/// points. Malformed coordinates give `None`.
pub fn area_shape_rect(image_rect: &Rect, area: &Element) -> Option<Rect> {
    let coords: Vec<f64> = area
        .attr("coords")
        .unwrap_or_default()
        .split(',')
        .map(|c| c.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .ok()
        .unwrap_or_default();
    let shape = area.attr("shape").unwrap_or("rect").to_lowercase();

    let rect = match shape.as_str() {
        "default" => Rect::create(0.0, 0.0, image_rect.width, image_rect.height),
        "circle" | "circ" => {
            let [x, y, r] = coords.get(..3)? else {
                return None;
            };
            let diff = r / std::f64::consts::SQRT_2;
            Rect::create(x - diff, y - diff, x + diff, y + diff)
        }
        _ => {
            let [x1, y1, x2, y2] = coords.get(..4)? else {
                return None;
            };
            Rect::create(*x1, *y1, *x2, *y2)
        }
    };
    Some(rect.translate(image_rect.left, image_rect.top))
}
