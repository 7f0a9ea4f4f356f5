use keyhints_protocols::{HintDescriptor, HintMessage, KeyState, LinkHintMode};

use super::*;
use crate::matcher::{AlphabetHints, FilterHints};
use crate::rect::Rect;

fn local_hint(element: usize, left: f64, top: f64) -> LocalHint {
    LocalHint::new(element, Rect::create(left, top, left + 40.0, top + 12.0))
}

/// Three markers: frame 0 owns the first and last, frame 1 the middle one.
fn alphabet_mode(mode: LinkHintMode) -> LinkHintsMode {
    let descriptors = vec![
        HintDescriptor::new(0, 0),
        HintDescriptor::new(1, 0),
        HintDescriptor::new(0, 1),
    ];
    let locals = vec![local_hint(3, 10.0, 10.0), local_hint(4, 200.0, 10.0)];
    LinkHintsMode::new(
        mode,
        0,
        descriptors,
        &locals,
        Box::new(AlphabetHints::new("ab")),
        false,
    )
}

fn filter_mode() -> LinkHintsMode {
    let descriptors = vec![
        HintDescriptor::new(0, 0).with_link_text("Home"),
        HintDescriptor::new(0, 1).with_link_text("Trees"),
        HintDescriptor::new(1, 0).with_link_text("Tree"),
    ];
    let locals = vec![local_hint(3, 0.0, 0.0), local_hint(4, 0.0, 40.0)];
    LinkHintsMode::new(
        LinkHintMode::OpenInCurrentTab,
        0,
        descriptors,
        &locals,
        Box::new(FilterHints::new("0123456789", 35)),
        true,
    )
}

fn key_state(response: &KeyResponse) -> KeyState {
    match response.broadcast.as_slice() {
        [HintMessage::UpdateKeyState(state)] => state.clone(),
        other => panic!("expected a key-state update, got {other:?}"),
    }
}

#[test]
fn test_markers_follow_descriptor_order() {
    let mode = alphabet_mode(LinkHintMode::OpenInCurrentTab);
    let labels: Vec<_> = mode.markers().iter().map(|m| m.hint_string.as_str()).collect();
    assert_eq!(labels, ["aa", "b", "ab"]);

    let local: Vec<_> = mode.markers().iter().map(|m| m.is_local).collect();
    assert_eq!(local, [true, false, true]);
    assert!(mode.markers()[1].rect.is_none());
    assert_eq!(mode.markers()[2].stable_sort_count, 3);
}

#[test]
fn test_local_markers_get_increasing_z_indices() {
    let mode = alphabet_mode(LinkHintMode::OpenInCurrentTab);
    let z: Vec<_> = mode.markers().iter().map(|m| m.z_index).collect();
    assert!(z[0] > 0);
    assert_eq!(z[1], 0);
    assert!(z[2] > z[0]);
}

#[test]
fn test_typing_broadcasts_key_state() {
    let mut mode = alphabet_mode(LinkHintMode::OpenInCurrentTab);
    let response = mode.on_key_down(&KeyEvent::new("A").with_shift());
    assert_eq!(response.result, HandlerResult::Suppress);
    assert!(!response.exit);
    let state = key_state(&response);
    assert_eq!(state.hint_keystroke_queue, ['a']);
    assert_eq!(state.tab_count, 0);
}

#[test]
fn test_update_key_state_narrows_then_resolves() {
    let mut mode = alphabet_mode(LinkHintMode::OpenInCurrentTab);

    let narrowed = mode.update_key_state(KeyState {
        hint_keystroke_queue: vec!['a'],
        ..Default::default()
    });
    assert_eq!(narrowed, Resolution::Narrowed);
    let visible: Vec<_> = mode.markers().iter().map(|m| m.visible).collect();
    assert_eq!(visible, [true, false, true]);

    let single = mode.update_key_state(KeyState {
        hint_keystroke_queue: vec!['a', 'b'],
        ..Default::default()
    });
    assert_eq!(
        single,
        Resolution::Single {
            marker: 2,
            user_might_over_type: false
        }
    );
}

#[test]
fn test_update_key_state_without_match() {
    let mut mode = alphabet_mode(LinkHintMode::OpenInCurrentTab);
    let resolution = mode.update_key_state(KeyState {
        hint_keystroke_queue: vec!['b', 'b'],
        ..Default::default()
    });
    assert_eq!(resolution, Resolution::NoMatch);
}

#[test]
fn test_backspace_pops_or_exits() {
    let mut mode = alphabet_mode(LinkHintMode::OpenInCurrentTab);
    let exit = mode.on_key_down(&KeyEvent::new("Backspace"));
    assert!(exit.exit);
    assert!(exit.broadcast.is_empty());

    mode.on_key_down(&KeyEvent::new("a"));
    let response = mode.on_key_down(&KeyEvent::new("Delete"));
    assert!(!response.exit);
    assert!(key_state(&response).hint_keystroke_queue.is_empty());
}

#[test]
fn test_repeated_keys_are_swallowed() {
    let mut mode = alphabet_mode(LinkHintMode::OpenInCurrentTab);
    let response = mode.on_key_down(&KeyEvent::new("a").repeated());
    assert_eq!(response.result, HandlerResult::Suppress);
    assert!(response.broadcast.is_empty());
}

#[test]
fn test_non_printable_keys_pass_through() {
    let mut mode = alphabet_mode(LinkHintMode::OpenInCurrentTab);
    let response = mode.on_key_down(&KeyEvent::new("ArrowDown"));
    assert_eq!(response.result, HandlerResult::Pass);
    assert!(response.broadcast.is_empty());
}

#[test]
fn test_tab_moves_the_tab_count() {
    let mut mode = alphabet_mode(LinkHintMode::OpenInCurrentTab);
    assert_eq!(key_state(&mode.on_key_down(&KeyEvent::new("Tab"))).tab_count, 1);
    assert_eq!(key_state(&mode.on_key_down(&KeyEvent::new("Tab"))).tab_count, 2);
    let back = mode.on_key_down(&KeyEvent::new("Tab").with_shift());
    assert_eq!(key_state(&back).tab_count, 1);

    // Any other key resets it.
    assert_eq!(key_state(&mode.on_key_down(&KeyEvent::new("a"))).tab_count, 0);
}

#[test]
fn test_shift_toggles_the_open_mode_until_released() {
    let mut mode = alphabet_mode(LinkHintMode::OpenInCurrentTab);
    let shift = KeyEvent::new("Shift").with_shift();

    let response = mode.on_key_down(&shift);
    assert_eq!(
        response.broadcast,
        [HintMessage::SetOpenLinkMode {
            mode_index: LinkHintMode::OpenInNewBgTab.index()
        }]
    );
    assert_eq!(mode.mode(), LinkHintMode::OpenInNewBgTab);

    let (result, messages) = mode.on_key_up(&shift);
    assert_eq!(result, HandlerResult::Continue);
    assert_eq!(
        messages,
        [HintMessage::SetOpenLinkMode {
            mode_index: LinkHintMode::OpenInCurrentTab.index()
        }]
    );
    assert_eq!(mode.mode(), LinkHintMode::OpenInCurrentTab);
}

#[test]
fn test_control_toggles_to_foreground_tab() {
    let mut mode = alphabet_mode(LinkHintMode::OpenInNewBgTab);
    mode.on_key_down(&KeyEvent::new("Control").with_ctrl());
    assert_eq!(mode.mode(), LinkHintMode::OpenInNewFgTab);
}

#[test]
fn test_modifiers_leave_other_modes_alone() {
    let mut mode = alphabet_mode(LinkHintMode::CopyLinkUrl);
    let response = mode.on_key_down(&KeyEvent::new("Shift").with_shift());
    assert!(response.broadcast.is_empty());
    assert_eq!(mode.mode(), LinkHintMode::CopyLinkUrl);

    let (_, messages) = mode.on_key_up(&KeyEvent::new("Shift"));
    assert!(messages.is_empty());
}

#[test]
fn test_space_rotates_in_alphabet_mode() {
    let mut mode = alphabet_mode(LinkHintMode::OpenInCurrentTab);
    let response = mode.on_key_down(&KeyEvent::new(" "));
    assert_eq!(response.broadcast, [HintMessage::RotateHints]);
}

#[test]
fn test_rotate_hints_cycles_overlapping_markers() {
    let descriptors = (0..3).map(|i| HintDescriptor::new(0, i)).collect();
    let locals = vec![
        local_hint(1, 10.0, 10.0),
        local_hint(2, 14.0, 12.0),
        local_hint(3, 400.0, 300.0),
    ];
    let mut mode = LinkHintsMode::new(
        LinkHintMode::OpenInCurrentTab,
        0,
        descriptors,
        &locals,
        Box::new(AlphabetHints::new("sadf")),
        false,
    );
    let before: Vec<_> = mode.markers().iter().map(|m| m.z_index).collect();

    mode.rotate_hints();
    let after: Vec<_> = mode.markers().iter().map(|m| m.z_index).collect();
    assert_eq!(after, [before[1], before[0], before[2]]);

    mode.rotate_hints();
    let again: Vec<_> = mode.markers().iter().map(|m| m.z_index).collect();
    assert_eq!(again, before);
}

#[test]
fn test_rotate_hints_skips_hidden_markers() {
    let descriptors = (0..2).map(|i| HintDescriptor::new(0, i)).collect();
    let locals = vec![local_hint(1, 10.0, 10.0), local_hint(2, 14.0, 12.0)];
    let mut mode = LinkHintsMode::new(
        LinkHintMode::OpenInCurrentTab,
        0,
        descriptors,
        &locals,
        Box::new(AlphabetHints::new("sadf")),
        false,
    );
    let before: Vec<_> = mode.markers().iter().map(|m| m.z_index).collect();
    mode.hide_markers();
    mode.rotate_hints();
    let after: Vec<_> = mode.markers().iter().map(|m| m.z_index).collect();
    assert_eq!(after, before);
}

// ============================================================================
// Filter mode
// ============================================================================

#[test]
fn test_filter_mode_keeps_typed_case_and_space() {
    let mut mode = filter_mode();
    let state = key_state(&mode.on_key_down(&KeyEvent::new("T").with_shift()));
    assert_eq!(state.link_text_keystroke_queue, ['t']);

    let state = key_state(&mode.on_key_down(&KeyEvent::new(" ")));
    assert_eq!(state.link_text_keystroke_queue, ['t', ' ']);
}

#[test]
fn test_filter_mode_shift_does_not_toggle() {
    let mut mode = filter_mode();
    let response = mode.on_key_down(&KeyEvent::new("Shift").with_shift());
    assert!(response.broadcast.is_empty());
    assert_eq!(mode.mode(), LinkHintMode::OpenInCurrentTab);
}

#[test]
fn test_filter_mode_enter_activates_the_active_hint() {
    let mut mode = filter_mode();
    assert!(mode.active_hint().is_some());
    let response = mode.on_key_down(&KeyEvent::new("Enter"));
    assert_eq!(response.broadcast, [HintMessage::ActivateActiveHintMarker]);
}

#[test]
fn test_filter_mode_text_match_might_be_over_typed() {
    let mut mode = filter_mode();
    let resolution = mode.update_key_state(KeyState {
        link_text_keystroke_queue: "home".chars().collect(),
        ..Default::default()
    });
    assert_eq!(
        resolution,
        Resolution::Single {
            marker: 0,
            user_might_over_type: true
        }
    );
}

#[test]
fn test_filter_mode_narrowing_hides_non_matches() {
    let mut mode = filter_mode();
    let resolution = mode.update_key_state(KeyState {
        link_text_keystroke_queue: "tree".chars().collect(),
        ..Default::default()
    });
    assert_eq!(resolution, Resolution::Narrowed);
    let visible: Vec<_> = mode.markers().iter().map(|m| m.visible).collect();
    assert_eq!(visible, [false, true, true]);
}
