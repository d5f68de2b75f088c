//! Integration tests for input edges flowing through the shared queue
//! into the dispatcher.

use crate::mock_hw::{IrCall, MockHardware, MockNvs, RecordingSink};

use irblaster::app::events::AppEvent;
use irblaster::app::service::IrService;
use irblaster::drivers::inputs::{InputId, InputWatcher};
use irblaster::events::{QueueError, TRIGGER_QUEUE_CAP, TriggerQueue};

const DOC: &str = "@IN_1_DOWN\n1111\n@IN_1_UP\n2222\n@IN_2_DOWN\nP20\n3333\n";

#[test]
fn edges_fire_their_sections() {
    let queue = TriggerQueue::new();
    let watcher = InputWatcher::new(100);
    let mut nvs = MockNvs::with_document(DOC);
    let mut sink = RecordingSink::new();
    let mut svc = IrService::new();
    svc.load(&mut nvs, &mut sink);
    let mut hw = MockHardware::new();

    assert!(watcher.line(InputId::In1).on_edge(1_000, true));
    assert!(watcher.line(InputId::In2).on_edge(1_010, true));
    assert!(watcher.line(InputId::In1).on_edge(1_500, false));
    assert_eq!(watcher.forward(&queue, |_, _| {}), 3);
    while svc.step(&queue, &mut hw, &mut sink).is_some() {}

    assert_eq!(
        hw.calls,
        vec![
            IrCall::Nec { value: 0x1111, bits: 32 },
            IrCall::Delay { ms: 20 },
            IrCall::Nec { value: 0x3333, bits: 32 },
            IrCall::Nec { value: 0x2222, bits: 32 },
        ]
    );
}

#[test]
fn bounce_inside_window_is_ignored() {
    let queue = TriggerQueue::new();
    let watcher = InputWatcher::new(100);
    let line = watcher.line(InputId::In1);

    assert!(line.on_edge(1_000, true));
    assert!(!line.on_edge(1_050, false));
    assert!(!line.on_edge(1_099, true));
    assert!(line.on_edge(1_100, false));
    watcher.forward(&queue, |_, _| {});

    assert_eq!(queue.pop().unwrap().as_str(), "@IN_1_DOWN");
    assert_eq!(queue.pop().unwrap().as_str(), "@IN_1_UP");
    assert!(queue.is_empty());
}

#[test]
fn edges_and_requests_share_one_queue() {
    let queue = TriggerQueue::new();
    let watcher = InputWatcher::new(100);

    queue.push_str("/first").unwrap();
    watcher.line(InputId::In2).on_edge(5_000, false);
    watcher.forward(&queue, |_, _| {});
    queue.push_str("/last").unwrap();

    let order: Vec<String> = std::iter::from_fn(|| queue.pop())
        .map(|k| k.as_str().to_owned())
        .collect();
    assert_eq!(order, ["/first", "@IN_2_UP", "/last"]);
}

#[test]
fn edges_lost_to_full_queue_are_reported() {
    let queue = TriggerQueue::new();
    let watcher = InputWatcher::new(10);
    for _ in 0..TRIGGER_QUEUE_CAP {
        queue.push_str("/x").unwrap();
    }

    let line = watcher.line(InputId::In1);
    assert!(line.on_edge(1_000, true));
    assert!(line.on_edge(2_000, false));

    let mut svc = IrService::new();
    let mut sink = RecordingSink::new();
    let queued = watcher.forward(&queue, |label, reason| {
        svc.record_dropped(label, reason, &mut sink);
    });

    assert_eq!(queued, 0);
    assert_eq!(svc.stats().dropped, 2);
    assert!(line.pop_edge().is_none());
    assert!(matches!(
        sink.events.first(),
        Some(AppEvent::TriggerDropped {
            reason: QueueError::Full,
            ..
        })
    ));
}
