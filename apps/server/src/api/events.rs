use std::{convert::Infallible, sync::Arc, time::Duration};

use axum::{
    extract::{Query, State},
    response::sse::{Event as SseEvent, KeepAlive, Sse},
    routing::get,
    Router,
};
use futures_core::stream::Stream;
use serde::Deserialize;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};

use crate::{
    error::{ApiError, ApiResult},
    main_lib::AppState,
};

#[derive(Deserialize)]
pub struct StreamQuery {
    /// Election room to join. Without one, only global events are received.
    pub room: Option<String>,
}

async fn stream_events(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StreamQuery>,
) -> ApiResult<Sse<impl Stream<Item = Result<SseEvent, Infallible>>>> {
    let room = match query.room {
        Some(room) if room.trim().is_empty() => {
            return Err(ApiError::BadRequest("room must not be empty".to_string()))
        }
        Some(room) => Some(room.trim().to_string()),
        None => None,
    };
    tracing::debug!("Event stream subscriber joined room {:?}", room);

    let receiver = BroadcastStream::new(state.event_bus.subscribe());
    let stream = tokio_stream::StreamExt::filter_map(receiver, move |event| match event {
        Ok(evt) if evt.is_visible_to(room.as_deref()) => {
            match SseEvent::default().event(evt.name).json_data(&evt.payload) {
                Ok(sse_event) => Some(Ok(sse_event)),
                Err(err) => {
                    tracing::error!("Failed to serialize SSE payload for {}: {}", evt.name, err);
                    None
                }
            }
        }
        Ok(_) => None,
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            tracing::warn!("Event stream subscriber lagged, skipped {} event(s)", skipped);
            None
        }
    });

    let stream = futures::StreamExt::take_until(stream, state.shutdown.clone().cancelled_owned());

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    ))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/events/stream", get(stream_events))
}
