use serde_json::json;

use super::*;

fn sample() -> Document {
    Document::from_value(json!({
        "viewport": {"inner_width": 800.0, "inner_height": 600.0},
        "root": {
            "tag": "html",
            "children": [{
                "tag": "body",
                "rects": [[0, 0, 800, 600]],
                "children": [
                    {"tag": "a", "attributes": {"href": "/one", "id": "one"}, "text": "One",
                     "rects": [[10, 10, 60, 30]]},
                    {"tag": "div", "attributes": {"id": "overlay"}, "z_index": 5,
                     "rects": [[0, 0, 40, 40]]},
                    {"tag": "span", "text": "Host", "rects": [[100, 100, 200, 200]],
                     "shadow_root": [
                        {"tag": "button", "text": "Inner", "rects": [[110, 110, 150, 130]]}
                     ],
                     "children": [{"tag": "b", "text": " light"}]}
                ]
            }]
        }
    }))
    .unwrap()
}

#[test]
fn test_document_order_puts_shadow_contents_after_host() {
    let doc = sample();
    let tags: Vec<_> = doc
        .all_elements()
        .into_iter()
        .map(|id| doc.element(id).tag.clone())
        .collect();
    assert_eq!(tags, ["body", "a", "div", "span", "button", "b"]);
}

#[test]
fn test_text_content_skips_shadow_tree() {
    let doc = sample();
    let span = doc.all_elements()[3];
    assert_eq!(doc.text_content(span), "Host light");
    assert_eq!(doc.inner_html(span), "Host<b> light</b>");
}

#[test]
fn test_element_from_point_prefers_z_index() {
    let doc = sample();
    let overlay = doc.element_by_id("overlay").unwrap();
    let link = doc.element_by_id("one").unwrap();
    assert_eq!(doc.element_from_point(20.0, 20.0), Some(overlay));
    assert_eq!(doc.element_from_point(50.0, 20.0), Some(link));
}

#[test]
fn test_element_from_point_reaches_into_shadow_roots() {
    let doc = sample();
    let hit = doc.element_from_point(120.0, 120.0).unwrap();
    assert_eq!(doc.element(hit).tag, "button");
    let host = doc.all_elements()[3];
    assert!(doc.contains(host, hit));
    assert!(!doc.contains(hit, host));
}

#[test]
fn test_hidden_elements_are_not_hit() {
    let mut doc = sample();
    let overlay = doc.element_by_id("overlay").unwrap();
    doc.element_mut(overlay).style.visibility = "hidden".to_string();
    assert_eq!(doc.element_from_point(20.0, 20.0), doc.element_by_id("one"));
}

#[test]
fn test_label_control_by_for_and_nesting() {
    let doc = Document::from_value(json!({
        "root": {"tag": "html", "children": [{"tag": "body", "children": [
            {"tag": "label", "attributes": {"for": "name"}, "text": "Name"},
            {"tag": "input", "attributes": {"id": "name"}},
            {"tag": "label", "text": "Agree", "children": [{"tag": "input", "attributes": {"type": "checkbox"}}]}
        ]}]}
    }))
    .unwrap();
    let all = doc.all_elements();
    let (label, input, nested_label, checkbox) = (all[1], all[2], all[3], all[4]);
    assert_eq!(doc.label_control(label), Some(input));
    assert_eq!(doc.label_control(nested_label), Some(checkbox));
    assert_eq!(doc.labels_for(input), vec![label]);
}

#[test]
fn test_area_shapes() {
    let image = Rect::create(100.0, 100.0, 150.0, 150.0);
    let mut area = Element::new("area");
    area.attributes.insert("coords".into(), "0,0,20,50".into());
    assert_eq!(
        area_shape_rect(&image, &area),
        Some(Rect::create(100.0, 100.0, 120.0, 150.0))
    );

    area.attributes.insert("shape".into(), "default".into());
    assert_eq!(area_shape_rect(&image, &area), Some(image));

    area.attributes.insert("shape".into(), "circle".into());
    area.attributes.insert("coords".into(), "10,10,10".into());
    let circle = area_shape_rect(&image, &area).unwrap();
    assert!((circle.width - 2.0 * 10.0 / std::f64::consts::SQRT_2).abs() < 1e-9);

    area.attributes.insert("shape".into(), "poly".into());
    area.attributes.insert("coords".into(), "1,2,x".into());
    assert_eq!(area_shape_rect(&image, &area), None);
}

#[test]
fn test_scrollable_requires_overflow() {
    let mut doc = Document::new(Viewport::default());
    let body = doc.body().unwrap();
    let div = doc.append_child(body, Element::new("div"));
    doc.element_mut(div).scroll_height = 500.0;
    doc.element_mut(div).client_height = 100.0;
    assert!(!doc.is_scrollable(div));
    doc.element_mut(div).style.overflow_y = "auto".to_string();
    assert!(doc.is_scrollable(div));

    doc.element_mut(body).scroll_height = 2000.0;
    doc.element_mut(body).client_height = 600.0;
    assert!(doc.is_scrollable(body));
}

#[test]
fn test_element_attributes() {
    let mut input = Element::new("INPUT");
    assert_eq!(input.tag, "input");
    assert_eq!(input.input_type(), "text");
    assert!(input.is_selectable());
    input.attributes.insert("type".into(), "Submit".into());
    assert!(!input.is_selectable());

    let mut div = Element::new("div");
    div.attributes.insert("contenteditable".into(), "".into());
    assert!(div.is_content_editable());
    div.attributes.insert("contenteditable".into(), "false".into());
    assert!(!div.is_content_editable());
}
