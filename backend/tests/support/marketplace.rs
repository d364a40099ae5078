//! In-memory marketplace wiring shared by integration suites.
//!
//! Mirrors the server's wiring without a database: one store backs every
//! repository port, notifications are recorded instead of delivered and the
//! clock only moves when a test advances it.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use marketplace::domain::ports::{
    BookingCommand, BookingQuery, CreateServiceRequestRequest, CreditPurchaseRequest,
    MechanicCommand, MechanicQuery, NotificationSender, NotificationSenderError, ProposalCommand,
    ProposalQuery, RegisterMechanicRequest, ServiceRequestCommand, ServiceRequestQuery,
    WalletCommand, WalletQuery,
};
use marketplace::domain::{
    BookingCommandService, BookingQueryService, CustomerId, FeedPolicy, GeoPoint, KycStatus,
    Location, MatchingNotifier, MatchingPolicy, Mechanic, MechanicCommandService,
    MechanicQueryService, Notification, PaymentMethod, ProposalCommandService,
    ProposalQueryService, ProposalStores, ServiceCategory, ServiceRequestCommandService,
    ServiceRequestQueryService, Urgency, WalletCommandService, WalletQueryService,
};
use marketplace::inbound::http::state::HttpState;
use marketplace::outbound::attachments::FilesystemAttachmentStore;
use marketplace::outbound::directions::StraightLineRouteEstimator;
use marketplace::outbound::events::BroadcastRequestEventBus;
use marketplace::outbound::memory::InMemoryMarketplaceStore;
use marketplace::test_support::{MutableClock, fixture_now};
use tempfile::TempDir;

/// Notification sender that keeps every payload for later assertions.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().expect("notifier lock").clone()
    }
}

#[async_trait]
impl NotificationSender for RecordingNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotificationSenderError> {
        self.sent
            .lock()
            .expect("notifier lock")
            .push(notification.clone());
        Ok(())
    }
}

/// Every driving port over one in-memory store.
pub struct Marketplace {
    pub requests: Arc<dyn ServiceRequestCommand>,
    pub requests_query: Arc<dyn ServiceRequestQuery>,
    pub proposals: Arc<dyn ProposalCommand>,
    pub proposals_query: Arc<dyn ProposalQuery>,
    pub bookings: Arc<dyn BookingCommand>,
    pub bookings_query: Arc<dyn BookingQuery>,
    pub mechanics: Arc<dyn MechanicCommand>,
    pub mechanics_query: Arc<dyn MechanicQuery>,
    pub wallet: Arc<dyn WalletCommand>,
    pub wallet_query: Arc<dyn WalletQuery>,
    pub notifier: Arc<RecordingNotifier>,
    pub clock: Arc<MutableClock>,
    _attachments_dir: TempDir,
}

impl Marketplace {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryMarketplaceStore::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let clock = Arc::new(MutableClock::new(fixture_now()));
        let events = Arc::new(BroadcastRequestEventBus::default());
        let attachments_dir = TempDir::new().expect("attachments dir");
        let attachments = Arc::new(FilesystemAttachmentStore::new(
            attachments_dir.path(),
            "/attachments",
        ));
        let feed_policy = FeedPolicy::default();

        let matching = MatchingNotifier::new(
            Arc::clone(&store),
            notifier.clone(),
            MatchingPolicy::default(),
        );
        let proposal_stores = ProposalStores {
            proposals: Arc::clone(&store),
            requests: Arc::clone(&store),
            mechanics: Arc::clone(&store),
            bookings: Arc::clone(&store),
        };

        Self {
            requests: Arc::new(ServiceRequestCommandService::new(
                Arc::clone(&store),
                matching,
                attachments,
                events.clone(),
                clock.clone(),
                feed_policy,
            )),
            requests_query: Arc::new(ServiceRequestQueryService::new(
                Arc::clone(&store),
                Arc::clone(&store),
                events.clone(),
                clock.clone(),
                feed_policy,
            )),
            proposals: Arc::new(ProposalCommandService::new(
                proposal_stores,
                notifier.clone(),
                events,
                clock.clone(),
            )),
            proposals_query: Arc::new(ProposalQueryService::new(Arc::clone(&store))),
            bookings: Arc::new(BookingCommandService::new(
                Arc::clone(&store),
                Arc::clone(&store),
                notifier.clone(),
                clock.clone(),
            )),
            bookings_query: Arc::new(BookingQueryService::new(
                Arc::clone(&store),
                Arc::clone(&store),
                Arc::new(StraightLineRouteEstimator::default()),
            )),
            mechanics: Arc::new(MechanicCommandService::new(Arc::clone(&store), clock.clone())),
            mechanics_query: Arc::new(MechanicQueryService::new(Arc::clone(&store))),
            wallet: Arc::new(WalletCommandService::new(Arc::clone(&store), clock.clone())),
            wallet_query: Arc::new(WalletQueryService::new(store)),
            notifier,
            clock,
            _attachments_dir: attachments_dir,
        }
    }

    /// The same ports bundled for the HTTP handlers.
    pub fn http_state(&self) -> HttpState {
        HttpState {
            requests: Arc::clone(&self.requests),
            requests_query: Arc::clone(&self.requests_query),
            proposals: Arc::clone(&self.proposals),
            proposals_query: Arc::clone(&self.proposals_query),
            bookings: Arc::clone(&self.bookings),
            bookings_query: Arc::clone(&self.bookings_query),
            mechanics: Arc::clone(&self.mechanics),
            mechanics_query: Arc::clone(&self.mechanics_query),
            wallet: Arc::clone(&self.wallet),
            wallet_query: Arc::clone(&self.wallet_query),
        }
    }

    /// Register, approve, place and fund a mechanic through the public ports.
    pub async fn onboard_mechanic(
        &self,
        category: ServiceCategory,
        at: GeoPoint,
        diamonds: u32,
    ) -> Mechanic {
        let mechanic = self
            .mechanics
            .register(RegisterMechanicRequest {
                name: "Bilal Autos".to_owned(),
                categories: BTreeSet::from([category]),
            })
            .await
            .expect("register mechanic");
        self.mechanics
            .record_kyc_decision(mechanic.id(), KycStatus::Approved)
            .await
            .expect("approve mechanic");
        self.mechanics
            .update_location(mechanic.id(), at)
            .await
            .expect("place mechanic");
        if diamonds > 0 {
            self.wallet
                .credit_purchase(CreditPurchaseRequest {
                    mechanic_id: mechanic.id(),
                    amount: diamonds,
                    payment_method: PaymentMethod::Jazzcash,
                    payment_reference: format!("JC-{}", mechanic.id()),
                })
                .await
                .expect("fund mechanic");
        }
        self.mechanics_query
            .get_mechanic(mechanic.id())
            .await
            .expect("reload mechanic")
    }
}

impl Default for Marketplace {
    fn default() -> Self {
        Self::new()
    }
}

pub fn point(latitude: f64, longitude: f64) -> GeoPoint {
    GeoPoint::new(latitude, longitude).expect("valid coordinates")
}

/// An immediate request at `at`.
pub fn immediate_request(
    customer_id: CustomerId,
    category: ServiceCategory,
    at: GeoPoint,
) -> CreateServiceRequestRequest {
    CreateServiceRequestRequest {
        customer_id,
        category,
        description: "Car will not start after the rain".to_owned(),
        location: Location::new(at, "F-7 Markaz, Islamabad"),
        urgency: Urgency::Urgent,
        schedule: None,
        attachments: Vec::new(),
    }
}
