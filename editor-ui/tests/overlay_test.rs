//! Overlay stack tests: backdrop sharing, stacking and atomic dismissal
//!
//! Run with: cargo test -p editor-ui --test overlay_test

use std::rc::Rc;

use editor_ui::{Document, ManualScheduler, MemoryDocument, OverlayStack, UiConfig};

fn open_page(html: &str) -> (Rc<MemoryDocument>, Rc<ManualScheduler>, OverlayStack<MemoryDocument>) {
    let document = Rc::new(MemoryDocument::with_body(html));
    let scheduler = Rc::new(ManualScheduler::new());
    let overlays = OverlayStack::new(
        document.clone(),
        scheduler.clone(),
        Rc::new(UiConfig::default()),
    );
    (document, scheduler, overlays)
}

// ====================================================================================
// Stacking
// ====================================================================================

#[test]
fn test_single_modal_opens_with_backdrop() {
    let (document, _scheduler, overlays) = open_page("<main>Page</main>");
    overlays.open_modal("<p>Hello</p>", None).unwrap();

    assert_eq!(document.count_class("overlay"), 1);
    assert_eq!(document.count_class("modal"), 1);
    assert_eq!(document.count_class("to-close"), 2);
    assert!(overlays.is_open());
}

#[test]
fn test_second_modal_stacks_on_same_backdrop() {
    let (document, _scheduler, overlays) = open_page("");
    let first = overlays.open_modal("first", None).unwrap();
    let second = overlays.open_modal("second", Some("wide")).unwrap();

    assert_eq!(document.count_class("overlay"), 1);
    assert_eq!(document.count_class("modal"), 2);
    assert!(document.is_connected(&first));
    assert!(document.has_class(&second, "wide"));
}

#[test]
fn test_overlays_are_appended_to_body_in_order() {
    let (document, _scheduler, overlays) = open_page("<main>Page</main>");
    overlays.open_modal("x", None).unwrap();
    let children = document.children(&document.body());
    let classes: Vec<String> = children
        .iter()
        .map(|child| document.class_name(child))
        .collect();
    assert_eq!(classes, vec!["", "overlay to-close", "modal to-close"]);
}

#[test]
fn test_existing_server_backdrop_is_reused() {
    let (document, _scheduler, overlays) = open_page(r#"<div class="overlay to-close"></div>"#);
    overlays.open_modal("x", None).unwrap();
    assert_eq!(document.count_class("overlay"), 1);
}

#[test]
fn test_server_backdrop_click_dismisses_stack() {
    let (document, _scheduler, overlays) =
        open_page(r#"<div class="overlay to-close" id="backdrop"></div>"#);
    overlays.open_modal("first", None).unwrap();
    overlays.open_modal("second", None).unwrap();

    let backdrop = document.element_by_id("backdrop").unwrap();
    document.click(&backdrop);
    assert!(!overlays.is_open());
    assert!(!document.is_connected(&backdrop));
}

// ====================================================================================
// Dismissal
// ====================================================================================

#[test]
fn test_dismiss_removes_every_overlay_element() {
    let (document, _scheduler, overlays) = open_page("<main>Page</main>");
    overlays.open_modal("first", None).unwrap();
    overlays.open_modal("second", None).unwrap();
    overlays.open_loader().unwrap();

    assert_eq!(overlays.dismiss(), 4);
    assert_eq!(document.count_class("to-close"), 0);
    assert!(!overlays.is_open());
    assert_eq!(document.children(&document.body()).len(), 1);
}

#[test]
fn test_dismiss_with_nothing_open_is_noop() {
    let (_document, _scheduler, overlays) = open_page("");
    assert_eq!(overlays.dismiss(), 0);
}

#[test]
fn test_backdrop_click_dismisses() {
    let (document, _scheduler, overlays) = open_page("");
    overlays.open_modal("x", None).unwrap();
    let backdrop = document.elements_by_class("overlay")[0];
    document.click(&backdrop);
    assert_eq!(document.count_class("to-close"), 0);
}

#[test]
fn test_close_trigger_dismisses_and_cancels_navigation() {
    let (document, _scheduler, overlays) = open_page("");
    overlays.open_modal("x", None).unwrap();
    let close = document.elements_by_class("close-modal-event")[0];
    let event = document.click(&close);
    assert!(event.default_prevented());
    assert_eq!(document.count_class("to-close"), 0);
}

#[test]
fn test_click_inside_modal_content_keeps_it_open() {
    let (document, _scheduler, overlays) = open_page("");
    let modal = overlays.open_modal(r#"<button id="confirm">OK</button>"#, None).unwrap();
    let button = document.element_by_id("confirm").unwrap();
    document.click(&button);
    assert!(document.is_connected(&modal));
}

#[test]
fn test_server_rendered_close_trigger_is_wired() {
    let (document, _scheduler, overlays) =
        open_page(r#"<a href="/back" class="close-modal-event" id="cancel">Cancel</a>"#);
    overlays.open_modal("x", None).unwrap();
    overlays.open_modal("y", None).unwrap();

    let cancel = document.element_by_id("cancel").unwrap();
    assert!(document.click(&cancel).default_prevented());
    assert!(!overlays.is_open());
    // The trigger is not an overlay element and stays in the page.
    assert!(document.is_connected(&cancel));
}

#[test]
fn test_dismiss_before_activation_cancels_timer() {
    let (document, scheduler, overlays) = open_page("");
    let modal = overlays.open_modal("x", None).unwrap();
    overlays.dismiss();
    assert_eq!(scheduler.pending(), 0);
    scheduler.advance(100);
    assert!(!document.has_class(&modal, "modal-active"));
}

#[test]
fn test_reopen_after_dismiss() {
    let (document, scheduler, overlays) = open_page("");
    overlays.open_modal("x", None).unwrap();
    overlays.dismiss();
    let modal = overlays.open_modal("y", None).unwrap();
    scheduler.advance(10);
    assert!(document.has_class(&modal, "modal-active"));
    assert_eq!(document.count_class("overlay"), 1);
}

#[test]
fn test_dropping_stack_cancels_pending_activation() {
    let (_document, scheduler, overlays) = open_page("");
    overlays.open_modal("x", None).unwrap();
    assert_eq!(scheduler.pending(), 1);
    drop(overlays);
    assert_eq!(scheduler.pending(), 0);
}

// ====================================================================================
// Loader
// ====================================================================================

#[test]
fn test_loader_toggle() {
    let (document, _scheduler, overlays) = open_page("");
    overlays.loader(true);
    assert_eq!(document.count_class("loader"), 1);
    assert_eq!(document.count_class("overlay"), 1);

    overlays.loader(false);
    assert_eq!(document.count_class("to-close"), 0);
}

#[test]
fn test_closing_loader_also_closes_modals() {
    let (document, _scheduler, overlays) = open_page("");
    overlays.open_modal("x", None).unwrap();
    overlays.open_loader().unwrap();
    overlays.close_loader();
    assert_eq!(document.count_class("modal"), 0);
}
