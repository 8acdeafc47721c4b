//! Live rating event stream (server-sent events).
//!
//! One session task per connection bridges the broker to the response
//! body. The task ends on client disconnect, broker shutdown, or write
//! failure, and every exit path releases the registry entry through the
//! broker's drain-then-remove protocol.

use actix_web::http::header;
use actix_web::{web, HttpResponse};
use bytes::Bytes;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::events::{EventBroker, SseFrame, Subscription};
use crate::middleware::AuthUser;
use crate::state::AppState;

const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// The session task never sends an error frame; it breaks out of its loop
/// instead, so the body channel's error type is uninhabited.
type Frame = Result<Bytes, Infallible>;

pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/ratings/events", web::get().to(stream_ratings));
}

async fn stream_ratings(user: AuthUser, state: web::Data<AppState>) -> HttpResponse {
    let subscription = state.broker.subscribe(user.id);

    let (frames, body) = mpsc::channel::<Frame>(8);
    tokio::spawn(run_session(state.broker.clone(), subscription, frames));

    HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header((header::CACHE_CONTROL, "no-cache"))
        .streaming(ReceiverStream::new(body))
}

/// Relay broker events to one connection until it goes away, emitting a
/// keep-alive frame every 15 seconds so intermediary proxies do not cut
/// the idle stream.
async fn run_session(broker: EventBroker, mut subscription: Subscription, out: mpsc::Sender<Frame>) {
    tracing::debug!(user_id = %subscription.user_id(), "rating stream opened");

    let mut keep_alive = tokio::time::interval(KEEP_ALIVE_INTERVAL);
    // The first tick completes immediately; the opening frame doubles as
    // a connection confirmation.
    loop {
        tokio::select! {
            received = subscription.recv() => match received {
                Some(event) => {
                    let frame = match SseFrame::rating(&event) {
                        Ok(frame) => frame,
                        Err(e) => {
                            tracing::error!(error = %e, "dropping unserializable event");
                            continue;
                        }
                    };
                    // A failed send means the client hung up.
                    if out.send(Ok(frame.to_bytes())).await.is_err() {
                        break;
                    }
                }
                // The broker actor is gone; nothing left to relay.
                None => break,
            },
            _ = keep_alive.tick() => {
                if out.send(Ok(SseFrame::keep_alive().to_bytes())).await.is_err() {
                    break;
                }
            }
        }
    }

    tracing::debug!(user_id = %subscription.user_id(), "rating stream closed");
    broker.unsubscribe(subscription);
}
