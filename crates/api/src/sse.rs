//! Server-Sent Events rendering.

use std::convert::Infallible;
use std::time::Duration;

use avstudio_events::StreamEvent;
use axum::http::{header, HeaderName};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use futures::{Stream, StreamExt};

/// Interval between keep-alive comments on idle streams.
pub const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// Render a job stream event as `event: <name>` / `data: <json>`.
pub fn job_event(event: &StreamEvent) -> Event {
    Event::default()
        .event(event.name())
        .data(event.data().to_string())
}

/// Wrap `events` in an SSE response with proxy buffering disabled.
pub fn sse_response<S>(events: S) -> Response
where
    S: Stream<Item = Event> + Send + 'static,
{
    let sse = Sse::new(events.map(Ok::<_, Infallible>))
        .keep_alive(KeepAlive::new().interval(KEEP_ALIVE_INTERVAL));

    (
        [
            (header::CACHE_CONTROL, "no-cache, no-transform"),
            (HeaderName::from_static("x-accel-buffering"), "no"),
        ],
        sse,
    )
        .into_response()
}
