//! HTTP server adapter (ESP-IDF only).
//!
//! One wildcard handler per method feeds every request into
//! [`web::route`]/[`web::handle`]; this module only moves bytes.  Each
//! request locks the shared [`DeviceContext`](crate::context::DeviceContext),
//! so a long pause in the dispatch loop stalls the server until it ends.
//!
//! Replies are always `200` with `Connection: close`.

use esp_idf_svc::http::Method;
use esp_idf_svc::http::server::{Configuration, EspHttpConnection, EspHttpServer, Request};
use esp_idf_svc::io::{Read, Write};
use log::{info, warn};

use crate::adapters::time::Uptime;
use crate::app::ports::{EventSink, StoragePort};
use crate::context::{self, SharedContext};
use crate::diagnostics::RuntimeMetrics;
use crate::error::CommsError;
use crate::events::TriggerQueue;
use crate::web::{self, FormBody, MAX_FORM_BODY, Route};

/// Every method the server can parse.  Only `GET /` and `POST /` are
/// reserved; any other method on any path is a trigger.
const METHODS: [(Method, web::Method); 33] = [
    (Method::Get, web::Method::Get),
    (Method::Post, web::Method::Post),
    (Method::Delete, web::Method::Other),
    (Method::Head, web::Method::Other),
    (Method::Put, web::Method::Other),
    (Method::Connect, web::Method::Other),
    (Method::Options, web::Method::Other),
    (Method::Trace, web::Method::Other),
    (Method::Copy, web::Method::Other),
    (Method::Lock, web::Method::Other),
    (Method::MkCol, web::Method::Other),
    (Method::Move, web::Method::Other),
    (Method::Propfind, web::Method::Other),
    (Method::Proppatch, web::Method::Other),
    (Method::Search, web::Method::Other),
    (Method::Unlock, web::Method::Other),
    (Method::Bind, web::Method::Other),
    (Method::Rebind, web::Method::Other),
    (Method::Unbind, web::Method::Other),
    (Method::Acl, web::Method::Other),
    (Method::Report, web::Method::Other),
    (Method::MkActivity, web::Method::Other),
    (Method::Checkout, web::Method::Other),
    (Method::Merge, web::Method::Other),
    (Method::MSearch, web::Method::Other),
    (Method::Notify, web::Method::Other),
    (Method::Subscribe, web::Method::Other),
    (Method::Unsubscribe, web::Method::Other),
    (Method::Patch, web::Method::Other),
    (Method::Purge, web::Method::Other),
    (Method::MkCalendar, web::Method::Other),
    (Method::Link, web::Method::Other),
    (Method::Unlink, web::Method::Other),
];

pub struct HttpAdapter {
    _server: EspHttpServer<'static>,
}

impl HttpAdapter {
    /// Start the server on `port`.  It runs until the adapter is dropped.
    pub fn start<S, E>(
        port: u16,
        ctx: SharedContext<S, E>,
        queue: &'static TriggerQueue,
    ) -> Result<Self, CommsError>
    where
        S: StoragePort + Send + 'static,
        E: EventSink + Send + 'static,
    {
        let config = Configuration {
            http_port: port,
            uri_match_wildcard: true,
            max_uri_handlers: METHODS.len(),
            ..Default::default()
        };
        let mut server = EspHttpServer::new(&config).map_err(|e| {
            warn!("http: server start failed ({})", e);
            CommsError::HttpServerFailed
        })?;

        for (esp_method, method) in METHODS {
            let ctx = ctx.clone();
            server
                .fn_handler("/*", esp_method, move |req| serve(req, method, &ctx, queue))
                .map_err(|e| {
                    warn!("http: handler registration failed ({})", e);
                    CommsError::HttpServerFailed
                })?;
        }

        info!("http: listening on port {}", port);
        Ok(Self { _server: server })
    }
}

fn serve<S: StoragePort, E: EventSink>(
    mut req: Request<&mut EspHttpConnection<'_>>,
    method: web::Method,
    ctx: &SharedContext<S, E>,
    queue: &TriggerQueue,
) -> anyhow::Result<()> {
    let uri = req.uri().to_owned();
    let route = web::route(method, &uri);

    let mut buf = Vec::new();
    let body = if route == Route::WriteDocument {
        read_form(&mut req, &mut buf)?
    } else {
        FormBody::Read(&[])
    };

    let metrics = RuntimeMetrics::collect(Uptime::new().secs());
    let response = {
        let mut guard = context::lock(ctx);
        web::handle(&mut guard, queue, route, body, &metrics)
    };

    let mut resp = req.into_response(
        200,
        None,
        &[("Content-Type", response.content_type), ("Connection", "close")],
    )?;
    resp.write_all(response.body.as_bytes())?;
    Ok(())
}

fn read_form<'b>(
    req: &mut Request<&mut EspHttpConnection<'_>>,
    buf: &'b mut Vec<u8>,
) -> anyhow::Result<FormBody<'b>> {
    let len = req.content_len().unwrap_or(0) as usize;
    if len > MAX_FORM_BODY {
        warn!("http: form body of {} bytes refused", len);
        return Ok(FormBody::TooLarge);
    }

    buf.resize(len, 0);
    let mut filled = 0;
    while filled < len {
        let n = req
            .read(&mut buf[filled..])
            .map_err(|e| anyhow::anyhow!("http: body read failed: {:?}", e))?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    buf.truncate(filled);
    Ok(FormBody::Read(buf))
}
