//! Driving port for service request reads and live feed subscriptions.

use async_trait::async_trait;
use tokio::sync::broadcast::{self, error::RecvError};

use crate::domain::{CustomerId, Error, MechanicId, RequestId, ServiceCategory, ServiceRequest};

use super::RequestChanged;

/// What a feed subscriber should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedSignal {
    /// A request in the subscribed category changed.
    Changed(RequestChanged),
    /// Events were dropped; re-read the whole snapshot.
    Resync,
    /// The event bus shut down.
    Closed,
}

/// Live stream of changes affecting one category's feed.
#[derive(Debug)]
pub struct RequestFeedSubscription {
    category: ServiceCategory,
    events: broadcast::Receiver<RequestChanged>,
}

impl RequestFeedSubscription {
    pub fn new(category: ServiceCategory, events: broadcast::Receiver<RequestChanged>) -> Self {
        Self { category, events }
    }

    pub fn category(&self) -> ServiceCategory {
        self.category
    }

    /// Wait for the next change relevant to this category.
    pub async fn next_signal(&mut self) -> FeedSignal {
        loop {
            match self.events.recv().await {
                Ok(event) if event.category == self.category => {
                    return FeedSignal::Changed(event);
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, category = %self.category, "feed subscriber lagged");
                    return FeedSignal::Resync;
                }
                Err(RecvError::Closed) => return FeedSignal::Closed,
            }
        }
    }
}

/// Driving port for service request read operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ServiceRequestQuery: Send + Sync {
    /// Fetch one request.
    async fn get_request(&self, request_id: RequestId) -> Result<ServiceRequest, Error>;

    /// The mechanic-facing feed for a category: live requests inside the
    /// window plus every pending scheduled request, newest first.
    async fn feed_for_category(
        &self,
        category: ServiceCategory,
    ) -> Result<Vec<ServiceRequest>, Error>;

    /// The category feed minus requests the mechanic already answered.
    async fn unanswered_feed(
        &self,
        category: ServiceCategory,
        mechanic_id: MechanicId,
    ) -> Result<Vec<ServiceRequest>, Error>;

    /// A customer's own requests, newest first.
    async fn list_for_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<ServiceRequest>, Error>;

    /// Subscribe to changes affecting `category`.
    fn subscribe(&self, category: ServiceCategory) -> RequestFeedSubscription;
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use rstest::rstest;

    use super::*;
    use crate::domain::RequestStatus;

    fn changed(category: ServiceCategory) -> RequestChanged {
        RequestChanged {
            request_id: RequestId::random(),
            category,
            status: RequestStatus::Pending,
        }
    }

    #[rstest]
    #[tokio::test]
    async fn subscription_skips_other_categories() {
        let (tx, rx) = broadcast::channel(8);
        let mut subscription = RequestFeedSubscription::new(ServiceCategory::Towing, rx);
        let wanted = changed(ServiceCategory::Towing);
        tx.send(changed(ServiceCategory::CarMechanic))
            .expect("receiver alive");
        tx.send(wanted).expect("receiver alive");

        assert_eq!(subscription.next_signal().await, FeedSignal::Changed(wanted));
    }

    #[rstest]
    #[tokio::test]
    async fn lagging_subscriber_is_told_to_resync() {
        let (tx, rx) = broadcast::channel(1);
        let mut subscription = RequestFeedSubscription::new(ServiceCategory::Towing, rx);
        tx.send(changed(ServiceCategory::Towing)).expect("receiver alive");
        tx.send(changed(ServiceCategory::Towing)).expect("receiver alive");

        assert_eq!(subscription.next_signal().await, FeedSignal::Resync);
    }

    #[rstest]
    #[tokio::test]
    async fn dropped_bus_closes_the_subscription() {
        let (tx, rx) = broadcast::channel::<RequestChanged>(1);
        let mut subscription = RequestFeedSubscription::new(ServiceCategory::Towing, rx);
        drop(tx);

        assert_eq!(subscription.next_signal().await, FeedSignal::Closed);
    }
}
