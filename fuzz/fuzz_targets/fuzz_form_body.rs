//! Fuzz target: `web::parse_form_text`
//!
//! Decodes arbitrary form bodies and renders the result into the editor
//! page, checking the document can never close the textarea early.
//!
//! cargo fuzz run fuzz_form_body

#![no_main]

use irblaster::app::service::DispatchStats;
use irblaster::diagnostics::RuntimeMetrics;
use irblaster::web;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some(text) = web::parse_form_text(data) else {
        return;
    };
    let page = web::render_index(&text, &RuntimeMetrics::collect(0), &DispatchStats::default(), &[], None);
    assert_eq!(page.matches("</textarea>").count(), 1);
});
