// GET /api/feed: live report changes as server-sent events.
//
// Each store change becomes one event named `insert`, `update` or
// `delete` whose data is the report as JSON. A subscriber that falls too
// far behind gets a `resync` event and should reload the list.

use std::convert::Infallible;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{self, Stream};
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;

use crate::web::AppState;

pub async fn live_feed(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.store.subscribe();

    let events = stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(change) => {
                    match Event::default()
                        .event(change.kind.as_str())
                        .json_data(&change.report)
                    {
                        Ok(event) => return Some((Ok(event), rx)),
                        Err(e) => {
                            warn!(error = %e, id = %change.report.id, "Failed to encode feed event");
                            continue;
                        }
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Feed subscriber lagged");
                    let event = Event::default().event("resync").data(skipped.to_string());
                    return Some((Ok(event), rx));
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}
