//! Hint markers: one per descriptor, in every participating frame.

use keyhints_protocols::HintDescriptor;

use crate::local_hints::LocalHint;
use crate::rect::Rect;

/// Approximate glyph box of a marker label, for overlap detection.
const LABEL_CHAR_WIDTH: f64 = 8.0;
const LABEL_PADDING: f64 = 4.0;
const LABEL_HEIGHT: f64 = 14.0;

/// A marker for one hint. Markers for other frames' hints carry only the
/// descriptor; they are never drawn here but still take part in matching so
/// every frame assigns the same labels.
#[derive(Debug, Clone, PartialEq)]
pub struct HintMarker {
    pub descriptor: HintDescriptor,
    pub is_local: bool,
    /// Document position, for local markers.
    pub rect: Option<Rect>,
    pub show_link_text: bool,
    pub hint_string: String,
    /// Label as drawn.
    pub rendered: String,
    /// Creation order; breaks score ties in filter mode.
    pub stable_sort_count: u64,
    pub score: f64,
    pub visible: bool,
    pub z_index: i64,
}

impl HintMarker {
    pub fn new(descriptor: HintDescriptor, local: Option<&LocalHint>, stable_sort_count: u64) -> Self {
        Self {
            descriptor,
            is_local: local.is_some(),
            rect: local.map(|hint| hint.rect),
            show_link_text: local.is_some_and(|hint| hint.show_link_text),
            hint_string: String::new(),
            rendered: String::new(),
            stable_sort_count,
            score: 0.0,
            visible: true,
            z_index: 0,
        }
    }

    pub fn link_text(&self) -> &str {
        self.descriptor.link_text.as_deref().unwrap_or_default()
    }

    /// Box covered by the drawn label, anchored at the hint's top-left.
    pub fn label_box(&self) -> Option<Rect> {
        let rect = self.rect?;
        let width = LABEL_PADDING + LABEL_CHAR_WIDTH * self.rendered.chars().count() as f64;
        Some(Rect::create(
            rect.left,
            rect.top,
            rect.left + width,
            rect.top + LABEL_HEIGHT,
        ))
    }
}
