use std::collections::BTreeMap;
use std::time::Duration;

use keyhints_config::Settings;
use keyhints_protocols::{HintMessage, KeyState, LinkHintMode};
use serde_json::{Value, json};

use super::*;
use crate::activator::{ClickModifiers, LinkAction};

const FRAME: u64 = 7;

fn page(children: Value) -> Document {
    Document::from_value(json!({
        "viewport": {"inner_width": 800.0, "inner_height": 600.0},
        "root": {"tag": "html", "children": [
            {"tag": "body", "rects": [[0, 0, 800, 600]], "children": children}
        ]}
    }))
    .unwrap()
}

/// Three links; element ids 2, 3 and 4.
fn links() -> Document {
    page(json!([
        {"tag": "a", "attributes": {"href": "/one"}, "text": "one", "rects": [[10, 10, 60, 30]]},
        {"tag": "a", "attributes": {"href": "/two"}, "text": "two", "rects": [[10, 40, 60, 60]]},
        {"tag": "a", "attributes": {"href": "/three"}, "text": "three", "rects": [[10, 70, 60, 90]]}
    ]))
}

fn filter_settings(wait_for_enter: bool) -> Settings {
    Settings {
        filter_link_hints: true,
        wait_for_enter_for_filtered_hints: wait_for_enter,
        ..Settings::default()
    }
}

fn frame(document: Document, settings: Settings) -> FrameCoordinator {
    FrameCoordinator::new(FRAME, document, settings).with_focus(true)
}

fn sent(effects: &[FrameEffect]) -> Vec<HintMessage> {
    effects
        .iter()
        .filter_map(|e| match e {
            FrameEffect::Send(message) => Some(message.clone()),
            _ => None,
        })
        .collect()
}

fn activations(effects: &[FrameEffect]) -> Vec<Activation> {
    effects
        .iter()
        .filter_map(|e| match e {
            FrameEffect::Activate(activation) => Some(activation.clone()),
            _ => None,
        })
        .collect()
}

fn huds(effects: &[FrameEffect]) -> Vec<String> {
    effects
        .iter()
        .filter_map(|e| match e {
            FrameEffect::Hud(text) => Some(text.clone()),
            _ => None,
        })
        .collect()
}

fn timer(effects: &[FrameEffect]) -> (ModeId, u64, Duration) {
    effects
        .iter()
        .find_map(|e| match e {
            FrameEffect::StartTimer {
                mode,
                generation,
                after,
            } => Some((*mode, *generation, *after)),
            _ => None,
        })
        .expect("a timer")
}

/// Run a message through the frame as the tab coordinator would deliver it,
/// looping broadcasts back in. Returns every effect that is not a loop-back.
fn deliver(frame: &mut FrameCoordinator, message: HintMessage) -> Vec<FrameEffect> {
    let mut pending = vec![message];
    let mut effects = Vec::new();
    while let Some(message) = pending.pop() {
        for effect in frame.handle_message(message) {
            match effect {
                FrameEffect::Send(
                    message @ (HintMessage::UpdateKeyState(_)
                    | HintMessage::RotateHints
                    | HintMessage::SetOpenLinkMode { .. }
                    | HintMessage::ActivateActiveHintMarker
                    | HintMessage::Exit { .. }),
                ) => {
                    effects.push(FrameEffect::Send(message.clone()));
                    pending.insert(0, message);
                }
                other => effects.push(other),
            }
        }
    }
    effects
}

fn press(frame: &mut FrameCoordinator, keys: &str) -> Vec<FrameEffect> {
    let mut effects = Vec::new();
    for event in KeyEvent::parse_sequence(keys) {
        let (_, produced) = frame.on_key_down(&event);
        for effect in produced {
            match effect {
                FrameEffect::Send(message) => {
                    effects.push(FrameEffect::Send(message.clone()));
                    effects.extend(deliver(frame, message));
                }
                other => effects.push(other),
            }
        }
    }
    effects
}

/// Activate in a single-frame tab and bring the markers up.
fn start(frame: &mut FrameCoordinator, mode: LinkHintMode, count: usize) -> Vec<FrameEffect> {
    let mut effects = frame.activate(mode, count);
    effects.extend(frame.handle_message(HintMessage::GetHintDescriptors {
        mode_index: mode.index(),
        is_help_dialog: false,
    }));
    effects.extend(deliver(
        frame,
        HintMessage::ActivateMode {
            hint_descriptors: BTreeMap::new(),
            mode_index: mode.index(),
            originating_frame_id: FRAME,
        },
    ));
    effects
}

// ============================================================================
// Setup
// ============================================================================

#[test]
fn test_activate_suppresses_keys_and_asks_the_tab() {
    let mut frame = frame(links(), Settings::default());
    let effects = frame.activate(LinkHintMode::OpenInNewBgTab, 1);

    let (_, generation, after) = timer(&effects);
    assert_eq!(generation, 0);
    assert_eq!(after, Duration::from_millis(1000));
    assert_eq!(
        sent(&effects),
        [HintMessage::PrepareToActivateMode {
            mode_index: 1,
            is_help_dialog: false
        }]
    );
    assert_eq!(frame.snapshot().modes, ["suppress-keys"]);
    assert!(!frame.is_active());
}

#[test]
fn test_descriptors_are_local_indices() {
    let mut frame = frame(links(), Settings::default());
    let effects = frame.handle_message(HintMessage::GetHintDescriptors {
        mode_index: 0,
        is_help_dialog: false,
    });
    match sent(&effects).as_slice() {
        [HintMessage::PostHintDescriptors { hint_descriptors }] => {
            let indices: Vec<_> = hint_descriptors.iter().map(|d| (d.frame_id, d.local_index)).collect();
            assert_eq!(indices, [(FRAME, 0), (FRAME, 1), (FRAME, 2)]);
            assert!(hint_descriptors.iter().all(|d| d.link_text.is_none()));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_filter_mode_descriptors_carry_link_text() {
    let mut frame = frame(links(), filter_settings(false));
    let effects = frame.handle_message(HintMessage::GetHintDescriptors {
        mode_index: 0,
        is_help_dialog: false,
    });
    let Some(HintMessage::PostHintDescriptors { hint_descriptors }) = sent(&effects).pop() else {
        panic!("no descriptors posted");
    };
    let texts: Vec<_> = hint_descriptors.iter().filter_map(|d| d.link_text.clone()).collect();
    assert_eq!(texts, ["one", "two", "three"]);
}

#[test]
fn test_help_dialog_requests_skip_other_frames() {
    let mut frame = frame(links(), Settings::default());
    let effects = frame.handle_message(HintMessage::GetHintDescriptors {
        mode_index: 0,
        is_help_dialog: true,
    });
    assert_eq!(
        sent(&effects),
        [HintMessage::PostHintDescriptors {
            hint_descriptors: vec![]
        }]
    );

    let mut dialog = FrameCoordinator::new(1, links(), Settings::default())
        .with_focus(true)
        .with_help_dialog(true);
    let effects = dialog.handle_message(HintMessage::GetHintDescriptors {
        mode_index: 0,
        is_help_dialog: true,
    });
    let Some(HintMessage::PostHintDescriptors { hint_descriptors }) = sent(&effects).pop() else {
        panic!("no descriptors posted");
    };
    assert_eq!(hint_descriptors.len(), 3);
}

#[test]
fn test_copy_url_mode_requires_href() {
    let doc = page(json!([
        {"tag": "a", "attributes": {"href": "/one"}, "text": "one", "rects": [[10, 10, 60, 30]]},
        {"tag": "button", "text": "go", "rects": [[10, 40, 60, 60]]}
    ]));
    let mut frame = frame(doc, Settings::default());
    let effects = frame.handle_message(HintMessage::GetHintDescriptors {
        mode_index: LinkHintMode::CopyLinkUrl.index(),
        is_help_dialog: false,
    });
    let Some(HintMessage::PostHintDescriptors { hint_descriptors }) = sent(&effects).pop() else {
        panic!("no descriptors posted");
    };
    assert_eq!(hint_descriptors.len(), 1);
}

#[test]
fn test_activate_mode_merges_frames_in_order() {
    let mut frame = frame(links(), Settings::default());
    frame.handle_message(HintMessage::GetHintDescriptors {
        mode_index: 0,
        is_help_dialog: false,
    });
    let mut others = BTreeMap::new();
    others.insert(2, vec![HintDescriptor::new(2, 0)]);
    others.insert(9, vec![HintDescriptor::new(9, 0), HintDescriptor::new(9, 1)]);
    let effects = frame.handle_message(HintMessage::ActivateMode {
        hint_descriptors: others,
        mode_index: 0,
        originating_frame_id: 2,
    });
    assert_eq!(huds(&effects), ["Open link in current tab"]);

    let owners: Vec<_> = frame.snapshot().markers.iter().map(|m| m.frame_id).collect();
    assert_eq!(owners, [2, FRAME, FRAME, FRAME, 9, 9]);
    assert_eq!(frame.snapshot().modes, ["link-hints"]);
}

#[test]
fn test_no_links_shows_message_in_originating_frame_only() {
    let mut origin = frame(page(json!([])), Settings::default());
    let effects = start(&mut origin, LinkHintMode::OpenInCurrentTab, 1);
    assert_eq!(huds(&effects), ["No links to select."]);
    assert!(!origin.is_active());
    assert!(origin.snapshot().modes.is_empty());

    let mut follower = frame(page(json!([])), Settings::default());
    follower.handle_message(HintMessage::GetHintDescriptors {
        mode_index: 0,
        is_help_dialog: false,
    });
    let effects = follower.handle_message(HintMessage::ActivateMode {
        hint_descriptors: BTreeMap::new(),
        mode_index: 0,
        originating_frame_id: 1,
    });
    assert!(huds(&effects).is_empty());
}

#[test]
fn test_messages_are_ignored_when_inactive() {
    let mut frame = frame(links(), Settings::default());
    assert!(frame.handle_message(HintMessage::RotateHints).is_empty());
    assert!(frame
        .handle_message(HintMessage::UpdateKeyState(KeyState::default()))
        .is_empty());
    assert!(frame.handle_message(HintMessage::ActivateActiveHintMarker).is_empty());
}

// ============================================================================
// Alphabet hints
// ============================================================================

#[test]
fn test_typing_a_hint_activates_its_link() {
    let mut frame = frame(links(), Settings::default());
    start(&mut frame, LinkHintMode::OpenInCurrentTab, 1);
    let labels: Vec<_> = frame.snapshot().markers.iter().map(|m| m.hint_string.clone()).collect();
    assert_eq!(labels, ["a", "d", "s"]);

    let effects = press(&mut frame, "d");
    assert!(effects.iter().any(|e| matches!(
        e,
        FrameEffect::Flash { clear_after: Some(after), .. } if *after == Duration::from_millis(400)
    )));
    assert!(sent(&effects).contains(&HintMessage::Exit { is_success: true }));

    let performed = activations(&effects);
    assert_eq!(performed.len(), 1);
    assert_eq!(performed[0].element, 3);
    assert_eq!(performed[0].href.as_deref(), Some("/two"));
    assert_eq!(
        performed[0].action,
        LinkAction::Click {
            modifiers: ClickModifiers::none(),
            focus_first: false
        }
    );
    assert!(!frame.is_active());
    assert!(frame.snapshot().modes.is_empty());
}

#[test]
fn test_keys_typed_while_suppressed_are_replayed() {
    let mut frame = frame(links(), Settings::default());
    frame.activate(LinkHintMode::OpenInCurrentTab, 1);

    let (result, effects) = frame.on_key_down(&KeyEvent::new("s"));
    assert_eq!(result, HandlerResult::Suppress);
    assert!(effects.is_empty());
    frame.on_key_down(&KeyEvent::new("s").repeated());

    frame.handle_message(HintMessage::GetHintDescriptors {
        mode_index: 0,
        is_help_dialog: false,
    });
    let effects = frame.handle_message(HintMessage::ActivateMode {
        hint_descriptors: BTreeMap::new(),
        mode_index: 0,
        originating_frame_id: FRAME,
    });
    assert_eq!(
        sent(&effects),
        [HintMessage::UpdateKeyState(KeyState {
            hint_keystroke_queue: vec!['s'],
            link_text_keystroke_queue: vec![],
            tab_count: 0,
        })]
    );
}

#[test]
fn test_suppression_times_out() {
    let mut frame = frame(links(), Settings::default());
    let effects = frame.activate(LinkHintMode::OpenInCurrentTab, 1);
    let (mode, generation, _) = timer(&effects);
    assert!(frame.on_timeout(mode, generation).is_empty());
    assert!(frame.snapshot().modes.is_empty());

    let (result, _) = frame.on_key_down(&KeyEvent::new("s"));
    assert_eq!(result, HandlerResult::Pass);
}

#[test]
fn test_escape_exits_without_activation() {
    let mut frame = frame(links(), Settings::default());
    start(&mut frame, LinkHintMode::OpenInCurrentTab, 3);

    let effects = press(&mut frame, "<Esc>");
    assert_eq!(sent(&effects), [HintMessage::Exit { is_success: false }]);
    assert!(activations(&effects).is_empty());
    assert!(!frame.is_active());
    // No reactivation after a failed selection.
    assert!(frame.snapshot().modes.is_empty());
}

#[test]
fn test_backspace_on_empty_input_exits() {
    let mut frame = frame(links(), Settings::default());
    start(&mut frame, LinkHintMode::OpenInCurrentTab, 1);
    let effects = press(&mut frame, "<BS>");
    assert_eq!(sent(&effects), [HintMessage::Exit { is_success: false }]);
    assert!(!frame.is_active());
}

#[test]
fn test_click_exits() {
    let mut frame = frame(links(), Settings::default());
    start(&mut frame, LinkHintMode::OpenInCurrentTab, 1);
    let effects = frame.on_click();
    assert_eq!(sent(&effects), [HintMessage::Exit { is_success: false }]);
}

#[test]
fn test_unmatched_key_state_exits_locally() {
    let mut frame = frame(links(), Settings::default());
    start(&mut frame, LinkHintMode::OpenInCurrentTab, 1);
    let effects = frame.handle_message(HintMessage::UpdateKeyState(KeyState {
        hint_keystroke_queue: vec!['z'],
        ..Default::default()
    }));
    assert!(sent(&effects).is_empty());
    assert!(!frame.is_active());
}

#[test]
fn test_count_reenters_hint_mode() {
    let mut frame = frame(links(), Settings::default());
    start(&mut frame, LinkHintMode::OpenInNewBgTab, 2);

    let effects = press(&mut frame, "a");
    assert_eq!(activations(&effects).len(), 1);
    assert!(sent(&effects).contains(&HintMessage::PrepareToActivateMode {
        mode_index: LinkHintMode::OpenInNewBgTab.index(),
        is_help_dialog: false,
    }));
    assert_eq!(frame.snapshot().modes, ["suppress-keys"]);
}

#[test]
fn test_queue_mode_keeps_reentering() {
    let mut frame = frame(links(), Settings::default());
    start(&mut frame, LinkHintMode::OpenWithQueue, 1);
    press(&mut frame, "a");
    assert_eq!(frame.snapshot().modes, ["suppress-keys"]);
}

#[test]
fn test_shift_toggle_reaches_the_activation() {
    let mut frame = frame(links(), Settings::default());
    start(&mut frame, LinkHintMode::OpenInCurrentTab, 1);

    frame.on_key_down(&KeyEvent::new("Shift").with_shift());
    // The toggle takes effect when the broadcast comes back.
    frame.handle_message(HintMessage::SetOpenLinkMode {
        mode_index: LinkHintMode::OpenInNewBgTab.index(),
    });
    let effects = press(&mut frame, "s");
    let performed = activations(&effects);
    assert_eq!(
        performed[0].action,
        LinkAction::Click {
            modifiers: ClickModifiers::ctrl(),
            focus_first: false
        }
    );
}

#[test]
fn test_details_are_toggled_open() {
    let doc = page(json!([
        {"tag": "details", "text": "More", "rects": [[10, 10, 200, 30]]}
    ]));
    let mut frame = frame(doc, Settings::default());
    start(&mut frame, LinkHintMode::OpenInCurrentTab, 1);
    // A lone hint takes the first character of the alphabet.
    let effects = press(&mut frame, "s");
    assert_eq!(activations(&effects)[0].action, LinkAction::ToggleDetails);
    assert!(frame.document().element(2).has_attr("open"));
}

#[test]
fn test_failed_action_is_reported_on_the_hud() {
    let doc = page(json!([
        {"tag": "a", "attributes": {"href": "/x"}, "rects": [[10, 10, 60, 30]], "children": [
            {"tag": "img", "attributes": {"alt": "logo"}, "rects": [[10, 10, 60, 30]]}
        ]}
    ]));
    let mut frame = frame(doc, Settings::default());
    start(&mut frame, LinkHintMode::CopyLinkText, 1);
    let effects = press(&mut frame, "s");
    assert!(activations(&effects).is_empty());
    assert_eq!(huds(&effects), ["Link action failed: no text found"]);
}

// ============================================================================
// Filtered hints
// ============================================================================

#[test]
fn test_typing_protector_gates_the_exit() {
    let mut frame = frame(links(), filter_settings(false));
    start(&mut frame, LinkHintMode::OpenInCurrentTab, 1);

    let effects = press(&mut frame, "tw");
    assert!(effects.iter().any(|e| matches!(e, FrameEffect::Flash { clear_after: None, .. })));
    assert!(!sent(&effects).contains(&HintMessage::Exit { is_success: true }));
    let (mode, generation, after) = timer(&effects);
    assert_eq!(after, Duration::from_millis(200));

    // Over-typing extends the protector; the old timer is stale.
    let extended = press(&mut frame, "o");
    let (_, next_generation, _) = timer(&extended);
    assert_eq!(next_generation, generation + 1);
    assert!(frame.on_timeout(mode, generation).is_empty());

    let effects = frame.on_timeout(mode, next_generation);
    assert_eq!(sent(&effects), [HintMessage::Exit { is_success: true }]);
    let effects = deliver(&mut frame, HintMessage::Exit { is_success: true });
    assert_eq!(effects[0], FrameEffect::ClearFlash);
    assert_eq!(activations(&effects)[0].text, "two");
}

#[test]
fn test_wait_for_enter_gates_the_exit() {
    let mut frame = frame(links(), filter_settings(true));
    start(&mut frame, LinkHintMode::OpenInCurrentTab, 1);

    let effects = press(&mut frame, "thr");
    assert_eq!(huds(&effects), ["Hit <Enter> to proceed..."]);
    assert!(frame.snapshot().modes.contains(&"wait-for-enter".to_string()));

    // Other keys are swallowed.
    let (result, effects) = frame.on_key_down(&KeyEvent::new("x"));
    assert_eq!(result, HandlerResult::Suppress);
    assert!(effects.is_empty());

    let effects = press(&mut frame, "<Enter>");
    assert_eq!(activations(&effects)[0].href.as_deref(), Some("/three"));
}

#[test]
fn test_wait_for_enter_escape_cancels() {
    let mut frame = frame(links(), filter_settings(true));
    start(&mut frame, LinkHintMode::OpenInCurrentTab, 1);
    press(&mut frame, "one");
    let effects = press(&mut frame, "<Esc>");
    assert!(sent(&effects).contains(&HintMessage::Exit { is_success: false }));
    assert!(activations(&effects).is_empty());
    assert!(effects.contains(&FrameEffect::ClearFlash));
}

#[test]
fn test_unfocused_frame_does_not_gate() {
    let mut frame = FrameCoordinator::new(FRAME, links(), filter_settings(true));
    start(&mut frame, LinkHintMode::OpenInCurrentTab, 1);
    let effects = frame.handle_message(HintMessage::UpdateKeyState(KeyState {
        link_text_keystroke_queue: "two".chars().collect(),
        ..Default::default()
    }));
    assert!(sent(&effects).is_empty());
    assert!(!frame.snapshot().modes.contains(&"wait-for-enter".to_string()));
}

#[test]
fn test_enter_activates_the_active_hint() {
    let mut frame = frame(links(), filter_settings(true));
    start(&mut frame, LinkHintMode::OpenInCurrentTab, 1);

    // Tab moves the active hint to the second marker.
    press(&mut frame, "<Tab>");
    let effects = press(&mut frame, "<Enter>");
    assert!(sent(&effects).contains(&HintMessage::ActivateActiveHintMarker));
    assert_eq!(activations(&effects).len(), 1);
}
