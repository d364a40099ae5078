//! Per-connection request feed session.
//!
//! The socket pushes a full category snapshot on connect, after every change
//! event for the category, and on a refresh timer so live requests that age
//! out of the window disappear without a write. Heartbeats ping every 5s and
//! a connection idle for 10s is closed. Tests shorten both intervals.

use std::sync::Arc;
use std::time::{Duration, Instant};

use actix_ws::{CloseCode, CloseReason, Closed, Message, MessageStream, ProtocolError, Session};
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, warn};

use crate::domain::ports::{FeedSignal, RequestFeedSubscription, ServiceRequestQuery};
use crate::domain::{Error, MechanicId, ServiceCategory, ServiceRequest};
use crate::inbound::ws::messages::FeedMessage;

/// Time between heartbeats to the client (5s in production, shorter in tests).
#[cfg(not(test))]
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
#[cfg(test)]
const HEARTBEAT_INTERVAL: Duration = Duration::from_millis(50);

/// Max idle time before disconnecting the client (10s in production, shorter in tests).
#[cfg(not(test))]
const CLIENT_TIMEOUT: Duration = Duration::from_secs(10);
#[cfg(test)]
const CLIENT_TIMEOUT: Duration = Duration::from_millis(100);

/// Which slice of a category feed the socket follows.
#[derive(Debug, Clone, Copy)]
pub(super) struct FeedTarget {
    pub category: ServiceCategory,
    /// When set, requests this mechanic already answered are hidden.
    pub mechanic_id: Option<MechanicId>,
}

pub(super) async fn handle_feed_session(
    requests: Arc<dyn ServiceRequestQuery>,
    target: FeedTarget,
    refresh_interval: Duration,
    session: Session,
    stream: MessageStream,
) {
    FeedSession {
        requests,
        target,
        refresh_interval,
    }
    .run(session, stream)
    .await;
}

enum SessionError {
    ClientClosed(Option<CloseReason>),
    StreamClosed,
    HeartbeatTimeout,
    FeedClosed,
    Protocol(ProtocolError),
    Network(Closed),
}

enum CloseAction {
    None,
    Close(Option<CloseReason>),
}

struct FeedSession {
    requests: Arc<dyn ServiceRequestQuery>,
    target: FeedTarget,
    refresh_interval: Duration,
}

impl FeedSession {
    async fn run(&self, mut session: Session, mut stream: MessageStream) {
        // Subscribe before the first read so no change slips between them.
        let mut subscription = self.requests.subscribe(self.target.category);
        let mut last_heartbeat = Instant::now();
        let mut heartbeat = time::interval(HEARTBEAT_INTERVAL);
        let mut refresh = time::interval(self.refresh_interval.max(HEARTBEAT_INTERVAL));
        refresh.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let result = tokio::select! {
                _ = heartbeat.tick() => {
                    Self::handle_heartbeat_tick(&mut session, &last_heartbeat).await
                }
                // The first tick fires immediately and delivers the initial snapshot.
                _ = refresh.tick() => self.push_snapshot(&mut session).await,
                signal = subscription.next_signal() => {
                    self.handle_feed_signal(&mut session, &mut subscription, signal).await
                }
                message = stream.recv() => {
                    Self::handle_stream_message(&mut session, &mut last_heartbeat, message).await
                }
            };

            if let Err(error) = result {
                Self::log_shutdown_reason(&error);
                let close_action = Self::close_action_for(&error);
                Self::close_session_if_needed(session, close_action).await;
                return;
            }
        }
    }

    async fn handle_heartbeat_tick(
        session: &mut Session,
        last_heartbeat: &Instant,
    ) -> Result<(), SessionError> {
        if Instant::now().duration_since(*last_heartbeat) > CLIENT_TIMEOUT {
            return Err(SessionError::HeartbeatTimeout);
        }

        session.ping(b"").await.map_err(SessionError::Network)
    }

    async fn handle_feed_signal(
        &self,
        session: &mut Session,
        subscription: &mut RequestFeedSubscription,
        signal: FeedSignal,
    ) -> Result<(), SessionError> {
        match signal {
            FeedSignal::Changed(event) => {
                debug!(
                    request_id = %event.request_id,
                    category = %subscription.category(),
                    "request changed; refreshing feed"
                );
                self.push_snapshot(session).await
            }
            FeedSignal::Resync => self.push_snapshot(session).await,
            FeedSignal::Closed => Err(SessionError::FeedClosed),
        }
    }

    async fn load_snapshot(&self) -> Result<Vec<ServiceRequest>, Error> {
        match self.target.mechanic_id {
            Some(mechanic_id) => {
                self.requests
                    .unanswered_feed(self.target.category, mechanic_id)
                    .await
            }
            None => self.requests.feed_for_category(self.target.category).await,
        }
    }

    async fn push_snapshot(&self, session: &mut Session) -> Result<(), SessionError> {
        let frame = match self.load_snapshot().await {
            Ok(requests) => FeedMessage::snapshot(self.target.category, &requests),
            Err(error) => {
                warn!(error = %error, category = %self.target.category, "request feed read failed");
                FeedMessage::error(&error)
            }
        };
        Self::send_json(session, &frame)
            .await
            .map_err(SessionError::Network)
    }

    async fn handle_stream_message(
        session: &mut Session,
        last_heartbeat: &mut Instant,
        message: Option<Result<Message, ProtocolError>>,
    ) -> Result<(), SessionError> {
        let Some(message) = message else {
            return Err(SessionError::StreamClosed);
        };

        match message {
            Ok(Message::Ping(payload)) => {
                *last_heartbeat = Instant::now();
                session.pong(&payload).await.map_err(SessionError::Network)
            }
            Ok(Message::Close(reason)) => Err(SessionError::ClientClosed(reason)),
            // The feed is push-only; any other client frame just counts as liveness.
            Ok(
                Message::Text(_)
                | Message::Pong(_)
                | Message::Binary(_)
                | Message::Continuation(_)
                | Message::Nop,
            ) => {
                *last_heartbeat = Instant::now();
                Ok(())
            }
            Err(error) => Err(SessionError::Protocol(error)),
        }
    }

    async fn send_json<T: serde::Serialize>(
        session: &mut Session,
        payload: &T,
    ) -> Result<(), Closed> {
        match serde_json::to_string(payload) {
            Ok(body) => session.text(body).await,
            Err(error) => {
                warn!(error = %error, "failed to serialise feed frame");
                Ok(())
            }
        }
    }

    fn log_shutdown_reason(error: &SessionError) {
        match error {
            SessionError::HeartbeatTimeout => {
                warn!("feed socket heartbeat timeout; closing connection");
            }
            SessionError::FeedClosed => {
                warn!("request event bus closed; ending feed socket");
            }
            SessionError::Protocol(error) => {
                warn!(error = %error, "feed socket protocol error");
            }
            SessionError::Network(error) => {
                warn!(error = %error, "feed socket send failed; closing connection");
            }
            SessionError::ClientClosed(_) | SessionError::StreamClosed => {}
        }
    }

    fn close_action_for(error: &SessionError) -> CloseAction {
        match error {
            SessionError::HeartbeatTimeout => CloseAction::Close(Some(CloseReason {
                code: CloseCode::Normal,
                description: Some("heartbeat timeout".to_owned()),
            })),
            SessionError::FeedClosed => CloseAction::Close(Some(CloseReason {
                code: CloseCode::Away,
                description: Some("feed closed".to_owned()),
            })),
            SessionError::Protocol(_) => CloseAction::Close(Some(CloseReason {
                code: CloseCode::Protocol,
                description: Some("protocol error".to_owned()),
            })),
            SessionError::ClientClosed(reason) => CloseAction::Close(reason.clone()),
            SessionError::StreamClosed | SessionError::Network(_) => CloseAction::None,
        }
    }

    async fn close_session_if_needed(session: Session, close_action: CloseAction) {
        if let CloseAction::Close(reason) = close_action
            && let Err(error) = session.close(reason).await
        {
            warn!(error = %error, "failed to close feed socket");
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
