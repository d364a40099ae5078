//! In-process request change bus backed by a tokio broadcast channel.

use tokio::sync::broadcast;
use tracing::trace;

use crate::domain::ports::{RequestChanged, RequestEventBus};

/// Buffered events per subscriber before it starts lagging.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Fan-out bus shared by every feed subscriber in the process.
#[derive(Debug, Clone)]
pub struct BroadcastRequestEventBus {
    sender: broadcast::Sender<RequestChanged>,
}

impl BroadcastRequestEventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }
}

impl Default for BroadcastRequestEventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

impl RequestEventBus for BroadcastRequestEventBus {
    fn publish(&self, event: RequestChanged) {
        // A send error only means nobody is listening.
        let receivers = self.sender.send(event).unwrap_or(0);
        trace!(request_id = %event.request_id, receivers, "request change published");
    }

    fn subscribe(&self) -> broadcast::Receiver<RequestChanged> {
        self.sender.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use tokio::sync::broadcast::error::TryRecvError;

    use super::*;
    use crate::domain::{RequestId, RequestStatus, ServiceCategory};

    fn changed(status: RequestStatus) -> RequestChanged {
        RequestChanged {
            request_id: RequestId::random(),
            category: ServiceCategory::Towing,
            status,
        }
    }

    #[rstest]
    fn publishing_without_subscribers_is_silent() {
        let bus = BroadcastRequestEventBus::default();
        bus.publish(changed(RequestStatus::Pending));
    }

    #[rstest]
    fn every_subscriber_sees_each_event() {
        let bus = BroadcastRequestEventBus::new(4);
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();
        let event = changed(RequestStatus::Matched);

        bus.publish(event);

        assert_eq!(first.try_recv(), Ok(event));
        assert_eq!(second.try_recv(), Ok(event));
        assert_eq!(first.try_recv(), Err(TryRecvError::Empty));
    }

    #[rstest]
    fn slow_subscribers_observe_lag() {
        let bus = BroadcastRequestEventBus::new(1);
        let mut receiver = bus.subscribe();

        bus.publish(changed(RequestStatus::Pending));
        bus.publish(changed(RequestStatus::Cancelled));

        assert!(matches!(receiver.try_recv(), Err(TryRecvError::Lagged(1))));
    }
}
