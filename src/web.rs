//! Management page and trigger routing.
//!
//! Everything here is transport-free: the HTTP adapter hands in a method,
//! a URI and a body, and sends back what these functions produce.
//!
//! | Request      | Effect                                         |
//! |--------------|------------------------------------------------|
//! | `GET /`      | editor page with the raw document              |
//! | `POST /`     | replace the document from form field `text`    |
//! | anything else| queue the path as a trigger, reply `OK`        |

use core::fmt::Write as _;

use crate::app::events::AppEvent;
use crate::app::ports::{EventSink, StorageError, StoragePort};
use crate::app::service::{DispatchStats, IrService, MAX_DOCUMENT_LEN};
use crate::context::DeviceContext;
use crate::diagnostics::RuntimeMetrics;
use crate::events::{QueueError, TRIGGER_KEY_CAP, TriggerQueue};

pub const CONTENT_HTML: &str = "text/html";
pub const CONTENT_TEXT: &str = "text/plain";

/// Path serving the document editor.
pub const DOCUMENT_PATH: &str = "/";
/// Form field carrying the replacement document.
pub const FORM_FIELD: &str = "text";
/// Body of every trigger reply.
pub const TRIGGER_REPLY: &str = "OK";
/// Largest form body read: a fully percent-encoded maximal document.
pub const MAX_FORM_BODY: usize = 3 * MAX_DOCUMENT_LEN + 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route<'a> {
    ReadDocument,
    WriteDocument,
    /// Queue this path verbatim.
    Trigger(&'a str),
}

/// Path component of a request URI, without query or fragment.
pub fn request_path(uri: &str) -> &str {
    let end = uri.find(['?', '#']).unwrap_or(uri.len());
    &uri[..end]
}

pub fn route(method: Method, uri: &str) -> Route<'_> {
    let path = request_path(uri);
    match (method, path) {
        (Method::Get, DOCUMENT_PATH) => Route::ReadDocument,
        (Method::Post, DOCUMENT_PATH) => Route::WriteDocument,
        _ => Route::Trigger(path),
    }
}

/// Form body of a `POST /`, as far as the transport could read it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormBody<'a> {
    Read(&'a [u8]),
    /// Longer than [`MAX_FORM_BODY`]; left unread.
    TooLarge,
}

/// Every reply is a 200 with `Connection: close`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub content_type: &'static str,
    pub body: String,
}

/// Serve one request against the device context.
///
/// `body` is only consulted for [`Route::WriteDocument`].
pub fn handle<S: StoragePort, E: EventSink>(
    ctx: &mut DeviceContext<S, E>,
    queue: &TriggerQueue,
    route: Route<'_>,
    body: FormBody<'_>,
    metrics: &RuntimeMetrics,
) -> Response {
    match route {
        Route::Trigger(path) => {
            let _ = enqueue_trigger(path, queue, &mut ctx.service, &mut ctx.sink);
            Response {
                content_type: CONTENT_TEXT,
                body: TRIGGER_REPLY.to_owned(),
            }
        }
        Route::ReadDocument => page(ctx, metrics, None),
        Route::WriteDocument => {
            let notice = match body {
                FormBody::Read(bytes) => {
                    apply_document_form(bytes, &mut ctx.service, &mut ctx.storage, &mut ctx.sink)
                }
                FormBody::TooLarge => Some(reject_oversized_form(&mut ctx.sink)),
            };
            page(ctx, metrics, notice)
        }
    }
}

fn page<S, E>(
    ctx: &DeviceContext<S, E>,
    metrics: &RuntimeMetrics,
    notice: Option<Result<(), StorageError>>,
) -> Response {
    let untriggerable: Vec<&str> = ctx.service.keymap().untriggerable_keys().collect();
    Response {
        content_type: CONTENT_HTML,
        body: render_index(
            ctx.service.document(),
            metrics,
            &ctx.service.stats(),
            &untriggerable,
            notice,
        ),
    }
}

// ── Triggers ──────────────────────────────────────────────────

/// Queue `path` as a trigger.  A refused trigger is recorded on the
/// service; the client is answered [`TRIGGER_REPLY`] regardless.
pub fn enqueue_trigger(
    path: &str,
    queue: &TriggerQueue,
    service: &mut IrService,
    sink: &mut impl EventSink,
) -> Result<(), QueueError> {
    queue.push_str(path).inspect_err(|&reason| {
        service.record_dropped(path, reason, sink);
    })
}

// ── Document form ─────────────────────────────────────────────

/// Decode the `text` field of an urlencoded form body.
pub fn parse_form_text(body: &[u8]) -> Option<String> {
    url::form_urlencoded::parse(body)
        .find(|(name, _)| name == FORM_FIELD)
        .map(|(_, value)| value.into_owned())
}

/// Apply a submitted form.  `None` if the body carried no `text` field,
/// in which case nothing is written.
pub fn apply_document_form(
    body: &[u8],
    service: &mut IrService,
    storage: &mut impl StoragePort,
    sink: &mut impl EventSink,
) -> Option<Result<(), StorageError>> {
    let text = parse_form_text(body)?;
    Some(service.replace_document(&text, storage, sink))
}

/// Report a form body that exceeded [`MAX_FORM_BODY`] and was never read.
pub fn reject_oversized_form(sink: &mut impl EventSink) -> Result<(), StorageError> {
    sink.emit(&AppEvent::DocumentRejected(StorageError::Full));
    Err(StorageError::Full)
}

// ── Page ──────────────────────────────────────────────────────

/// Escape text for an HTML text node or a quoted attribute.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 8);
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Render the editor page.  `untriggerable` lists headers too long to
/// ever fire; `notice` is the outcome of a just-submitted form.
pub fn render_index(
    document: &str,
    metrics: &RuntimeMetrics,
    stats: &DispatchStats,
    untriggerable: &[&str],
    notice: Option<Result<(), StorageError>>,
) -> String {
    let mut page = String::with_capacity(document.len() + 1024);
    // Writing to a String never fails.
    let _ = write!(
        page,
        "<html style='font-size: 20px'>\
         App partition: {} bytes</br>\
         Free heap: {} bytes (min {} bytes)</br>\
         Uptime: {} s</br>\
         Dispatched: {} &middot; missed: {} &middot; unparsed lines: {} &middot; \
         IR failures: {} &middot; dropped: {}</br></br>",
        metrics.app_partition_size,
        metrics.heap_free,
        metrics.heap_min_free,
        metrics.uptime_secs,
        stats.dispatched,
        stats.missed,
        stats.unparsed_lines,
        stats.ir_failures,
        stats.dropped,
    );
    match notice {
        Some(Ok(())) => page.push_str("Saved.</br></br>"),
        Some(Err(e)) => {
            let _ = write!(page, "Not saved: {}.</br></br>", e);
        }
        None => {}
    }
    for key in untriggerable {
        let _ = write!(
            page,
            "Never fires, longer than {} bytes: {}</br>",
            TRIGGER_KEY_CAP,
            escape_html(key),
        );
    }
    if !untriggerable.is_empty() {
        page.push_str("</br>");
    }
    let _ = write!(
        page,
        "<form method='POST' id='form' action='{}'>\
         <textarea rows='20' cols='60' name='{}' style='font-size: 20px'>{}</textarea>\
         </br></br><input type='submit' value='Submit'></form></html>",
        DOCUMENT_PATH,
        FORM_FIELD,
        escape_html(document),
    );
    page
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_routes() {
        assert_eq!(route(Method::Get, "/"), Route::ReadDocument);
        assert_eq!(route(Method::Post, "/"), Route::WriteDocument);
        assert_eq!(route(Method::Get, "/?x=1"), Route::ReadDocument);
    }

    #[test]
    fn everything_else_is_a_trigger() {
        assert_eq!(route(Method::Get, "/tv_on"), Route::Trigger("/tv_on"));
        assert_eq!(route(Method::Post, "/tv_on"), Route::Trigger("/tv_on"));
        assert_eq!(route(Method::Other, "/"), Route::Trigger("/"));
        assert_eq!(route(Method::Get, "/a/b?src=phone"), Route::Trigger("/a/b"));
    }

    #[test]
    fn form_text_is_decoded() {
        let body = b"other=1&text=%2Fon%0D%0A20DF10EF+%23+power%0D%0A";
        assert_eq!(
            parse_form_text(body).as_deref(),
            Some("/on\r\n20DF10EF # power\r\n")
        );
    }

    #[test]
    fn form_without_text_is_none() {
        assert_eq!(parse_form_text(b"foo=bar"), None);
        assert_eq!(parse_form_text(b""), None);
    }

    #[test]
    fn html_is_escaped() {
        assert_eq!(escape_html("</textarea><b>&\"'"), "&lt;/textarea&gt;&lt;b&gt;&amp;&quot;&#39;");
    }

    #[test]
    fn page_embeds_escaped_document_and_metrics() {
        let metrics = RuntimeMetrics {
            uptime_secs: 5,
            heap_free: 1000,
            heap_min_free: 900,
            app_partition_size: 2048,
        };
        let page = render_index("/a\n<x>\n", &metrics, &DispatchStats::default(), &[], None);
        assert!(page.contains(">/a\n&lt;x&gt;\n</textarea>"));
        assert!(page.contains("Free heap: 1000 bytes"));
        assert!(page.contains("App partition: 2048 bytes"));
        assert!(!page.contains("Saved."));
        assert!(!page.contains("Never fires"));
    }

    #[test]
    fn page_lists_untriggerable_keys() {
        let metrics = RuntimeMetrics::collect(0);
        let page = render_index("", &metrics, &DispatchStats::default(), &["/<long>"], None);
        assert!(page.contains("Never fires, longer than 64 bytes: /&lt;long&gt;</br>"));
    }

    #[test]
    fn page_reports_rejection() {
        let metrics = RuntimeMetrics::collect(0);
        let page = render_index("", &metrics, &DispatchStats::default(), &[], Some(Err(StorageError::Full)));
        assert!(page.contains("Not saved: storage full."));
    }
}
