//! Integration tests for the TriggerQueue → IrService → transmitter chain.

use crate::mock_hw::{IrCall, MockHardware, MockNvs, RecordingSink};

use irblaster::app::events::{AppEvent, DispatchOutcome};
use irblaster::app::ports::IrError;
use irblaster::app::service::IrService;
use irblaster::events::{TriggerQueue, trigger_key};

fn loaded(document: &str) -> (IrService, MockNvs, RecordingSink) {
    let mut nvs = MockNvs::with_document(document);
    let mut sink = RecordingSink::new();
    let mut svc = IrService::new();
    svc.load(&mut nvs, &mut sink);
    (svc, nvs, sink)
}

#[test]
fn pause_then_nec_code() {
    let (mut svc, _nvs, mut sink) = loaded("/a\nP10\n10EF20DF\n");
    let queue = TriggerQueue::new();
    let mut hw = MockHardware::new();

    queue.push_str("/a").unwrap();
    let outcome = svc.step(&queue, &mut hw, &mut sink).unwrap();

    assert_eq!(
        hw.calls,
        vec![
            IrCall::Delay { ms: 10 },
            IrCall::Nec {
                value: 0x10EF_20DF,
                bits: 32
            },
        ]
    );
    assert_eq!(
        outcome,
        DispatchOutcome::Dispatched {
            key: trigger_key("/a").unwrap(),
            lines: 2,
            emitted: 1,
            paused_ms: 10,
        }
    );
    assert!(queue.is_empty());
}

#[test]
fn missing_key_consumes_trigger_without_output() {
    let (mut svc, _nvs, mut sink) = loaded("/a\nABCD\n");
    let queue = TriggerQueue::new();
    let mut hw = MockHardware::new();

    queue.push_str("/missing").unwrap();
    queue.push_str("/a").unwrap();
    let outcome = svc.step(&queue, &mut hw, &mut sink).unwrap();

    assert!(!outcome.was_found());
    assert!(hw.calls.is_empty());
    assert_eq!(queue.len(), 1);
    assert_eq!(svc.stats().missed, 1);
    assert!(sink.events.iter().any(|e| matches!(
        e,
        AppEvent::Dispatch(DispatchOutcome::NoSuchKey(k)) if k == "/missing"
    )));
}

/// Each step removes the entry it dispatches, oldest first.  The device
/// this firmware replaces read the oldest entry but removed the newest, so
/// this queue would have fired `B B B B` there.
#[test]
fn triggers_drain_fifo_not_newest_removed() {
    let (mut svc, _nvs, mut sink) = loaded("/a\nA\n/b\nB\n@IN_1_DOWN\nC\n");
    let queue = TriggerQueue::new();
    let mut hw = MockHardware::new();

    for key in ["/b", "@IN_1_DOWN", "/a", "/b"] {
        queue.push_str(key).unwrap();
    }
    let mut steps = 0;
    while svc.step(&queue, &mut hw, &mut sink).is_some() {
        steps += 1;
    }

    assert_eq!(steps, 4);
    let values: Vec<u32> = hw
        .codes()
        .into_iter()
        .map(|c| match c {
            IrCall::Nec { value, .. } => value,
            other => panic!("unexpected call {:?}", other),
        })
        .collect();
    assert_eq!(values, vec![0xB, 0xC, 0xA, 0xB]);
}

#[test]
fn panasonic_pair_is_transmitted() {
    let (mut svc, _nvs, mut sink) = loaded("/tv\n4004:0100BCBD\n");
    let mut hw = MockHardware::new();

    svc.dispatch(&trigger_key("/tv").unwrap(), &mut hw, &mut sink);

    assert_eq!(
        hw.calls,
        vec![IrCall::Panasonic {
            address: 0x4004,
            data: 0x0100_BCBD
        }]
    );
}

#[test]
fn repeated_header_keeps_only_last_block() {
    let (mut svc, _nvs, mut sink) = loaded("/a\nAAAA\n/b\nBBBB\n/a\nCCCC\n");
    let mut hw = MockHardware::new();

    svc.dispatch(&trigger_key("/a").unwrap(), &mut hw, &mut sink);

    assert_eq!(hw.calls, vec![IrCall::Nec { value: 0xCCCC, bits: 32 }]);
    assert_eq!(svc.keymap().len(), 2);
}

#[test]
fn comments_and_blank_lines_are_ignored() {
    let doc = "# living room\n\n/on   # power\n  20DF10EF  # toggle\n\n# end\n";
    let (mut svc, _nvs, mut sink) = loaded(doc);
    let mut hw = MockHardware::new();

    svc.dispatch(&trigger_key("/on").unwrap(), &mut hw, &mut sink);

    assert_eq!(hw.codes(), vec![IrCall::Nec { value: 0x20DF_10EF, bits: 32 }]);
    assert_eq!(svc.stats().unparsed_lines, 0);
}

#[test]
fn replacing_document_forgets_old_keys() {
    let (mut svc, mut nvs, mut sink) = loaded("/old\nABCD\n");
    let mut hw = MockHardware::new();

    svc.replace_document("/new\nP5\n", &mut nvs, &mut sink).unwrap();

    let outcome = svc.dispatch(&trigger_key("/old").unwrap(), &mut hw, &mut sink);
    assert!(!outcome.was_found());
    svc.dispatch(&trigger_key("/new").unwrap(), &mut hw, &mut sink);
    assert_eq!(hw.calls, vec![IrCall::Delay { ms: 5 }]);
    assert_eq!(nvs.document().as_deref(), Some("/new\nP5\n"));
}

#[test]
fn failed_write_keeps_previous_keymap() {
    let (mut svc, mut nvs, mut sink) = loaded("/old\nABCD\n");
    nvs.fail_writes = true;

    assert!(svc.replace_document("/new\nP5\n", &mut nvs, &mut sink).is_err());

    assert!(svc.keymap().contains("/old"));
    assert_eq!(svc.document(), "/old\nABCD\n");
    assert!(matches!(sink.events.last(), Some(AppEvent::DocumentRejected(_))));
}

#[test]
fn document_survives_restart() {
    let doc = "/a\nP1\nABCD\n@IN_2_UP\n40040D:00000000\n";
    let (mut svc, mut nvs, mut sink) = loaded("\n");
    svc.replace_document(doc, &mut nvs, &mut sink).unwrap();

    let mut rebooted = IrService::new();
    rebooted.load(&mut nvs, &mut sink);

    assert_eq!(rebooted.document(), doc);
    assert_eq!(rebooted.keymap(), svc.keymap());
}

#[test]
fn transmit_failure_does_not_stop_the_section() {
    let (mut svc, _nvs, mut sink) = loaded("/a\nABCD\nP3\n");
    let mut hw = MockHardware {
        fail_ir: true,
        ..Default::default()
    };

    let outcome = svc.dispatch(&trigger_key("/a").unwrap(), &mut hw, &mut sink);

    assert!(outcome.was_found());
    assert_eq!(hw.calls, vec![IrCall::Delay { ms: 3 }]);
    assert_eq!(svc.stats().ir_failures, 1);
    assert!(sink.events.iter().any(|e| matches!(
        e,
        AppEvent::IrFailed {
            error: IrError::TransmitFailed,
            ..
        }
    )));
}

#[test]
fn unrecognised_lines_are_reported_not_fatal() {
    let (mut svc, _nvs, mut sink) = loaded("/a\nvolume up\nABCD\n");
    let mut hw = MockHardware::new();

    svc.dispatch(&trigger_key("/a").unwrap(), &mut hw, &mut sink);

    assert_eq!(hw.codes().len(), 1);
    assert!(sink.events.iter().any(|e| matches!(
        e,
        AppEvent::Unparsed { line, .. } if line == "volume up"
    )));
}

#[test]
fn empty_queue_step_is_idle() {
    let (mut svc, _nvs, mut sink) = loaded("/a\nABCD\n");
    let queue = TriggerQueue::new();
    let mut hw = MockHardware::new();

    assert!(svc.step(&queue, &mut hw, &mut sink).is_none());
    assert!(hw.calls.is_empty());
    assert_eq!(svc.stats().dispatched, 0);
}
