use crate::api::EventsQuery;
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
};
use catalog::CatalogEvent;
use futures::stream::{Stream, StreamExt};
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, info, warn};

#[derive(Clone, Debug, Default)]
pub struct EventFilter {
    event_type: Vec<String>,
    key: Vec<String>,
}

impl EventFilter {
    /// Empty lists let everything through.
    pub fn should_send(&self, event: &CatalogEvent) -> bool {
        if !self.event_type.is_empty() && !self.event_type.iter().any(|t| t == event.event_type()) {
            return false;
        }

        if !self.key.is_empty() && !self.key.iter().any(|k| k == event.key()) {
            return false;
        }

        true
    }
}

impl From<&EventsQuery> for EventFilter {
    fn from(query: &EventsQuery) -> Self {
        Self {
            event_type: query.event_types(),
            key: query.keys(),
        }
    }
}

/// SSE endpoint that streams catalog events to clients
pub async fn stream_events(
    State(state): State<AppState>,
    Query(query): Query<EventsQuery>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let filter = EventFilter::from(&query);

    info!(
        "New SSE client connected. Filters: type={:?}, key={:?}",
        filter.event_type, filter.key
    );

    let stream = BroadcastStream::new(state.cache.subscribe());

    let filtered_stream = stream.filter_map(move |result| {
        let filter = filter.clone();
        async move {
            match result {
                Ok(event) => {
                    let should_send = filter.should_send(&event);
                    debug!(
                        "Received event: type={}, key={}, should_send={}",
                        event.event_type(),
                        event.key(),
                        should_send
                    );
                    should_send.then(|| Ok(to_sse_event(&event)))
                }
                Err(BroadcastStreamRecvError::Lagged(n)) => Some(Ok(Event::default()
                    .event("error")
                    .data(format!("Lagged by {} events", n)))),
            }
        }
    });

    Sse::new(filtered_stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Event name is the event type, e.g. `event: products_updated`
fn to_sse_event(event: &CatalogEvent) -> Event {
    Event::default()
        .event(event.event_type())
        .json_data(event)
        .unwrap_or_else(|e| {
            warn!("Failed to encode {} event: {}", event.event_type(), e);
            Event::default().event("error").data("encoding failed")
        })
}
