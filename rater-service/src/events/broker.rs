use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::models::RatingEvent;

/// Buffered capacity of each subscriber's event pipe. Delivery awaits when
/// the pipe is full, so a stalled consumer can delay the rest of one
/// broadcast pass; the drain protocol in [`EventBroker::unsubscribe`]
/// bounds that stall by the client's lifetime.
const SUBSCRIBER_BUFFER: usize = 8;

type EventSender = mpsc::Sender<Arc<RatingEvent>>;

/// One live consumer's receiving end, returned by
/// [`EventBroker::subscribe`]. The matching sender lives in the registry
/// and is only ever dropped by the broker actor.
pub struct Subscription {
    id: u64,
    user_id: Uuid,
    receiver: mpsc::Receiver<Arc<RatingEvent>>,
}

impl Subscription {
    /// Next broadcast event, or `None` once the broker has dropped this
    /// subscription's sender.
    pub async fn recv(&mut self) -> Option<Arc<RatingEvent>> {
        self.receiver.recv().await
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }
}

enum Command {
    Subscribe {
        user_id: Uuid,
        id: u64,
        sender: EventSender,
    },
    Unsubscribe {
        user_id: Uuid,
        id: u64,
    },
    Broadcast {
        event: Arc<RatingEvent>,
        exclude_user_id: Uuid,
    },
}

/// Serializes all subscription registry mutations and event fan-out
/// through one actor task.
///
/// Every state change is a [`Command`] processed by a single task, so the
/// registry needs no lock and no call site can race another. Operations
/// never fail outward; a dead or slow subscriber is handled inside the
/// actor.
#[derive(Clone)]
pub struct EventBroker {
    commands: mpsc::UnboundedSender<Command>,
    next_id: Arc<AtomicU64>,
}

impl EventBroker {
    /// Start the actor task and return a handle to it.
    pub fn spawn() -> Self {
        let (commands, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_actor(rx));
        Self {
            commands,
            next_id: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Register a new output handle for `user_id`. Returns immediately;
    /// the registry insert happens inside the actor. A user may hold any
    /// number of concurrent subscriptions.
    pub fn subscribe(&self, user_id: Uuid) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = mpsc::channel(SUBSCRIBER_BUFFER);

        let _ = self.commands.send(Command::Subscribe {
            user_id,
            id,
            sender,
        });

        Subscription {
            id,
            user_id,
            receiver,
        }
    }

    /// Remove a subscription from the registry.
    ///
    /// The actor may be mid-broadcast, awaiting a send on this very
    /// handle. A drain task therefore keeps consuming the receiver until
    /// the actor drops the sender, which both unblocks any in-flight send
    /// and guarantees only the actor ever closes a handle.
    pub fn unsubscribe(&self, subscription: Subscription) {
        let Subscription {
            id,
            user_id,
            mut receiver,
        } = subscription;

        tokio::spawn(async move { while receiver.recv().await.is_some() {} });

        let _ = self.commands.send(Command::Unsubscribe { user_id, id });
    }

    /// Deliver `event` to every registered handle except those belonging
    /// to `exclude_user_id`. Best-effort fire-and-forget: no acks, no
    /// retries, no persistence of missed events.
    pub fn broadcast(&self, event: RatingEvent, exclude_user_id: Uuid) {
        let _ = self.commands.send(Command::Broadcast {
            event: Arc::new(event),
            exclude_user_id,
        });
    }
}

async fn run_actor(mut commands: mpsc::UnboundedReceiver<Command>) {
    let mut registry: HashMap<Uuid, Vec<(u64, EventSender)>> = HashMap::new();

    while let Some(command) = commands.recv().await {
        match command {
            Command::Subscribe {
                user_id,
                id,
                sender,
            } => {
                registry.entry(user_id).or_default().push((id, sender));
            }
            Command::Unsubscribe { user_id, id } => {
                if let Some(handles) = registry.get_mut(&user_id) {
                    // Dropping the sender closes the channel, which ends
                    // the caller's drain task.
                    handles.retain(|(handle_id, _)| *handle_id != id);
                    if handles.is_empty() {
                        registry.remove(&user_id);
                    }
                }
            }
            Command::Broadcast {
                event,
                exclude_user_id,
            } => {
                for (user_id, handles) in &registry {
                    if *user_id == exclude_user_id {
                        continue;
                    }

                    for (id, sender) in handles {
                        if sender.send(event.clone()).await.is_err() {
                            tracing::debug!(
                                subscription = *id,
                                "subscriber pipe closed mid-broadcast"
                            );
                        }
                    }
                }
            }
        }
    }
}
