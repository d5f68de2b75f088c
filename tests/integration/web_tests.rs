//! Integration tests for request routing against a live device context.

use crate::mock_hw::{IrCall, MockHardware, MockNvs, RecordingSink};

use irblaster::app::events::AppEvent;

use irblaster::context::DeviceContext;
use irblaster::diagnostics::RuntimeMetrics;
use irblaster::events::{QueueError, TRIGGER_QUEUE_CAP, TriggerQueue};
use irblaster::web::{self, CONTENT_HTML, CONTENT_TEXT, FormBody, Method, TRIGGER_REPLY};

fn device(document: &str) -> DeviceContext<MockNvs, RecordingSink> {
    DeviceContext::load(MockNvs::with_document(document), RecordingSink::new())
}

fn request(
    ctx: &mut DeviceContext<MockNvs, RecordingSink>,
    queue: &TriggerQueue,
    method: Method,
    uri: &str,
    body: FormBody<'_>,
) -> web::Response {
    let metrics = RuntimeMetrics::collect(7);
    web::handle(ctx, queue, web::route(method, uri), body, &metrics)
}

#[test]
fn trigger_path_is_queued_and_acknowledged() {
    let mut ctx = device("/tv_on\n20DF10EF\n");
    let queue = TriggerQueue::new();

    let resp = request(&mut ctx, &queue, Method::Get, "/tv_on?from=phone", FormBody::Read(&[]));

    assert_eq!(resp.content_type, CONTENT_TEXT);
    assert_eq!(resp.body, TRIGGER_REPLY);
    assert_eq!(queue.pop().unwrap().as_str(), "/tv_on");
}

#[test]
fn unknown_path_still_replies_ok() {
    let mut ctx = device("/tv_on\n20DF10EF\n");
    let queue = TriggerQueue::new();
    let mut hw = MockHardware::new();

    let resp = request(&mut ctx, &queue, Method::Post, "/nothing", FormBody::Read(&[]));
    assert_eq!(resp.body, TRIGGER_REPLY);

    let outcome = ctx.step(&queue, &mut hw).unwrap();
    assert!(!outcome.was_found());
    assert!(hw.calls.is_empty());
}

#[test]
fn full_queue_drops_request_but_replies_ok() {
    let mut ctx = device("\n");
    let queue = TriggerQueue::new();
    for _ in 0..TRIGGER_QUEUE_CAP {
        queue.push_str("/x").unwrap();
    }

    let resp = request(&mut ctx, &queue, Method::Get, "/late", FormBody::Read(&[]));

    assert_eq!(resp.body, TRIGGER_REPLY);
    assert_eq!(ctx.service.stats().dropped, 1);
    assert_eq!(queue.len(), TRIGGER_QUEUE_CAP);
}

#[test]
fn index_shows_raw_document() {
    let mut ctx = device("# lounge\n/on\nABCD\n");
    let queue = TriggerQueue::new();

    let resp = request(&mut ctx, &queue, Method::Get, "/", FormBody::Read(&[]));

    assert_eq!(resp.content_type, CONTENT_HTML);
    assert!(resp.body.contains("# lounge\n/on\nABCD\n</textarea>"));
    assert!(resp.body.contains("Uptime: 7 s"));
    assert!(queue.is_empty());
}

#[test]
fn posted_document_is_saved_and_takes_effect() {
    let mut ctx = device("/old\nABCD\n");
    let queue = TriggerQueue::new();
    let mut hw = MockHardware::new();

    let body = b"text=%2Fnew%0AP2%0A0x10%0A";
    let resp = request(&mut ctx, &queue, Method::Post, "/", FormBody::Read(body));

    assert!(resp.body.contains("Saved."));
    assert_eq!(ctx.storage.document().as_deref(), Some("/new\nP2\n0x10\n"));

    queue.push_str("/new").unwrap();
    ctx.step(&queue, &mut hw).unwrap();
    assert_eq!(
        hw.calls,
        vec![IrCall::Delay { ms: 2 }, IrCall::Nec { value: 0x10, bits: 32 }]
    );
}

#[test]
fn post_without_text_field_changes_nothing() {
    let mut ctx = device("/old\nABCD\n");
    let queue = TriggerQueue::new();

    let resp = request(&mut ctx, &queue, Method::Post, "/", FormBody::Read(b"note=hi"));

    assert!(!resp.body.contains("Saved."));
    assert!(!resp.body.contains("Not saved"));
    assert_eq!(ctx.storage.document().as_deref(), Some("/old\nABCD\n"));
    assert!(ctx.service.keymap().contains("/old"));
}

#[test]
fn oversized_form_is_rejected() {
    let mut ctx = device("/old\nABCD\n");
    let queue = TriggerQueue::new();

    let resp = request(&mut ctx, &queue, Method::Post, "/", FormBody::TooLarge);

    assert!(resp.body.contains("Not saved: storage full."));
    assert!(ctx.service.keymap().contains("/old"));
}

#[test]
fn page_escapes_markup_in_document() {
    let mut ctx = device("/a # </textarea><script>\n");
    let queue = TriggerQueue::new();

    let resp = request(&mut ctx, &queue, Method::Get, "/", FormBody::Read(&[]));

    assert!(!resp.body.contains("<script>"));
    assert!(resp.body.contains("&lt;/textarea&gt;&lt;script&gt;"));
}

#[test]
fn overlong_header_is_flagged_on_save() {
    let mut ctx = device("\n");
    let queue = TriggerQueue::new();
    let long = format!("/{}", "k".repeat(70));

    let body = format!("text=%2F{}%0A20DF10EF%0A", "k".repeat(70));
    let resp = request(&mut ctx, &queue, Method::Post, "/", FormBody::Read(body.as_bytes()));

    assert!(resp.body.contains("Saved."));
    assert!(resp.body.contains(&format!("Never fires, longer than 64 bytes: {long}</br>")));
    assert!(ctx.sink.events.contains(&AppEvent::UntriggerableKey { key: long.clone() }));

    let resp = request(&mut ctx, &queue, Method::Get, &long, FormBody::Read(&[]));
    assert_eq!(resp.body, TRIGGER_REPLY);
    assert!(queue.is_empty());
    assert_eq!(ctx.service.stats().dropped, 1);
    assert!(matches!(
        ctx.sink.events.last(),
        Some(AppEvent::TriggerDropped { reason: QueueError::KeyTooLong, .. })
    ));
}

#[test]
fn overlong_header_in_stored_document_shows_on_page() {
    let long = format!("@{}", "X".repeat(65));
    let mut ctx = device(&format!("{long}\nP1\n/ok\nABCD\n"));
    let queue = TriggerQueue::new();

    let resp = request(&mut ctx, &queue, Method::Get, "/", FormBody::Read(&[]));

    assert!(resp.body.contains(&format!("Never fires, longer than 64 bytes: {long}")));
    assert!(!resp.body.contains("Never fires, longer than 64 bytes: /ok"));
}

#[test]
fn other_methods_queue_triggers_even_on_root() {
    let mut ctx = device("/\nABCD\n/tv_on\n20DF10EF\n");
    let queue = TriggerQueue::new();

    let resp = request(&mut ctx, &queue, Method::Other, "/tv_on", FormBody::Read(&[]));
    assert_eq!(resp.body, TRIGGER_REPLY);
    let resp = request(&mut ctx, &queue, Method::Other, "/?x", FormBody::Read(&[]));
    assert_eq!(resp.body, TRIGGER_REPLY);

    assert_eq!(queue.pop().unwrap().as_str(), "/tv_on");
    assert_eq!(queue.pop().unwrap().as_str(), "/");
    assert_eq!(ctx.storage.document().as_deref(), Some("/\nABCD\n/tv_on\n20DF10EF\n"));
}
