//! Builders wiring adapters and domain services into the HTTP state.
//!
//! With a database URL every repository port is backed by Diesel over one
//! shared pool; otherwise a single in-memory store backs them all.

use std::io;
use std::sync::Arc;

use mockable::{Clock, DefaultClock};
use tracing::{info, warn};
use url::Url;

use marketplace::domain::ports::{
    AttachmentStore, BookingRepository, MechanicRepository, NotificationSender,
    ProposalRepository, RequestEventBus, RouteEstimateSource, ServiceRequestRepository,
    WalletRepository,
};
use marketplace::domain::{
    BookingCommandService, BookingQueryService, MatchingNotifier, MechanicCommandService,
    MechanicQueryService, ProposalCommandService, ProposalQueryService, ProposalStores,
    ServiceRequestCommandService, ServiceRequestQueryService, WalletCommandService,
    WalletQueryService,
};
use marketplace::inbound::http::state::HttpState;
use marketplace::outbound::attachments::FilesystemAttachmentStore;
use marketplace::outbound::directions::{
    GOOGLE_DIRECTIONS_ENDPOINT, GoogleDirectionsSource, StraightLineRouteEstimator,
};
use marketplace::outbound::events::BroadcastRequestEventBus;
use marketplace::outbound::memory::InMemoryMarketplaceStore;
use marketplace::outbound::notifications::{HttpPushGateway, LoggingNotificationSender};
use marketplace::outbound::persistence::{
    DbPool, DieselBookingRepository, DieselMechanicRepository, DieselProposalRepository,
    DieselServiceRequestRepository, DieselWalletRepository, PoolConfig, run_pending_migrations,
};

use super::AppSettings;

/// One handle per repository port.
struct Stores<R, M, P, B, W> {
    requests: Arc<R>,
    mechanics: Arc<M>,
    proposals: Arc<P>,
    bookings: Arc<B>,
    wallets: Arc<W>,
}

impl Stores<
    InMemoryMarketplaceStore,
    InMemoryMarketplaceStore,
    InMemoryMarketplaceStore,
    InMemoryMarketplaceStore,
    InMemoryMarketplaceStore,
> {
    fn in_memory() -> Self {
        let store = Arc::new(InMemoryMarketplaceStore::new());
        Self {
            requests: Arc::clone(&store),
            mechanics: Arc::clone(&store),
            proposals: Arc::clone(&store),
            bookings: Arc::clone(&store),
            wallets: store,
        }
    }
}

impl Stores<
    DieselServiceRequestRepository,
    DieselMechanicRepository,
    DieselProposalRepository,
    DieselBookingRepository,
    DieselWalletRepository,
> {
    fn diesel(pool: &DbPool) -> Self {
        Self {
            requests: Arc::new(DieselServiceRequestRepository::new(pool.clone())),
            mechanics: Arc::new(DieselMechanicRepository::new(pool.clone())),
            proposals: Arc::new(DieselProposalRepository::new(pool.clone())),
            bookings: Arc::new(DieselBookingRepository::new(pool.clone())),
            wallets: Arc::new(DieselWalletRepository::new(pool.clone())),
        }
    }
}

/// Adapters shared by every service regardless of the store.
#[derive(Clone)]
struct SharedAdapters {
    notifier: Arc<dyn NotificationSender>,
    attachments: Arc<dyn AttachmentStore>,
    routes: Arc<dyn RouteEstimateSource>,
    events: Arc<dyn RequestEventBus>,
    clock: Arc<dyn Clock>,
}

fn build_notifier(settings: &AppSettings) -> io::Result<Arc<dyn NotificationSender>> {
    let Some(raw) = settings.push_gateway_url.as_deref() else {
        info!("no push gateway configured; notifications are logged only");
        return Ok(Arc::new(LoggingNotificationSender));
    };
    let endpoint = Url::parse(raw).map_err(io::Error::other)?;
    let gateway = HttpPushGateway::new(
        endpoint,
        settings.push_gateway_api_key.clone(),
        settings.outbound_timeout(),
    )
    .map_err(io::Error::other)?;
    Ok(Arc::new(gateway))
}

fn build_route_source(settings: &AppSettings) -> io::Result<Arc<dyn RouteEstimateSource>> {
    let Some(api_key) = settings.directions_api_key.as_deref() else {
        info!("no directions key configured; using straight-line estimates");
        return Ok(Arc::new(StraightLineRouteEstimator::default()));
    };
    let endpoint = Url::parse(GOOGLE_DIRECTIONS_ENDPOINT).map_err(io::Error::other)?;
    let source = GoogleDirectionsSource::new(endpoint, api_key, settings.outbound_timeout())
        .map_err(io::Error::other)?;
    Ok(Arc::new(source))
}

fn build_shared_adapters(settings: &AppSettings) -> io::Result<SharedAdapters> {
    Ok(SharedAdapters {
        notifier: build_notifier(settings)?,
        attachments: Arc::new(FilesystemAttachmentStore::new(
            settings.attachments_dir(),
            settings.attachments_base_url(),
        )),
        routes: build_route_source(settings)?,
        events: Arc::new(BroadcastRequestEventBus::default()),
        clock: Arc::new(DefaultClock),
    })
}

/// Compose the domain services over `stores` and expose them as ports.
fn wire<R, M, P, B, W>(
    stores: Stores<R, M, P, B, W>,
    adapters: SharedAdapters,
    settings: &AppSettings,
) -> HttpState
where
    R: ServiceRequestRepository + 'static,
    M: MechanicRepository + 'static,
    P: ProposalRepository + 'static,
    B: BookingRepository + 'static,
    W: WalletRepository + 'static,
{
    let Stores {
        requests,
        mechanics,
        proposals,
        bookings,
        wallets,
    } = stores;
    let SharedAdapters {
        notifier,
        attachments,
        routes,
        events,
        clock,
    } = adapters;
    let feed_policy = settings.feed_policy();

    let matching = MatchingNotifier::new(
        Arc::clone(&mechanics),
        Arc::clone(&notifier),
        settings.matching_policy(),
    );
    let proposal_stores = ProposalStores {
        proposals: Arc::clone(&proposals),
        requests: Arc::clone(&requests),
        mechanics: Arc::clone(&mechanics),
        bookings: Arc::clone(&bookings),
    };

    HttpState {
        requests: Arc::new(ServiceRequestCommandService::new(
            Arc::clone(&requests),
            matching,
            attachments,
            Arc::clone(&events),
            Arc::clone(&clock),
            feed_policy,
        )),
        requests_query: Arc::new(ServiceRequestQueryService::new(
            requests,
            Arc::clone(&proposals),
            Arc::clone(&events),
            Arc::clone(&clock),
            feed_policy,
        )),
        proposals: Arc::new(ProposalCommandService::new(
            proposal_stores,
            Arc::clone(&notifier),
            events,
            Arc::clone(&clock),
        )),
        proposals_query: Arc::new(ProposalQueryService::new(proposals)),
        bookings: Arc::new(BookingCommandService::new(
            Arc::clone(&bookings),
            Arc::clone(&mechanics),
            notifier,
            Arc::clone(&clock),
        )),
        bookings_query: Arc::new(BookingQueryService::new(
            bookings,
            Arc::clone(&mechanics),
            routes,
        )),
        mechanics: Arc::new(MechanicCommandService::new(
            Arc::clone(&mechanics),
            Arc::clone(&clock),
        )),
        mechanics_query: Arc::new(MechanicQueryService::new(mechanics)),
        wallet: Arc::new(WalletCommandService::new(Arc::clone(&wallets), clock)),
        wallet_query: Arc::new(WalletQueryService::new(wallets)),
    }
}

/// Build every driving port from settings.
///
/// Pending migrations are applied before the pool is opened.
///
/// # Errors
///
/// Returns [`io::Error`] when an outbound adapter cannot be built, migrations
/// fail, or the database pool cannot be created.
pub(super) async fn build_http_state(settings: &AppSettings) -> io::Result<HttpState> {
    let adapters = build_shared_adapters(settings)?;
    let Some(database_url) = settings.database_url() else {
        warn!("no database configured; state is kept in memory and lost on restart");
        return Ok(wire(Stores::in_memory(), adapters, settings));
    };

    run_pending_migrations(database_url)
        .await
        .map_err(io::Error::other)?;
    let mut pool_config = PoolConfig::new(database_url);
    if let Some(max_size) = settings.db_max_connections {
        pool_config = pool_config.with_max_size(max_size);
    }
    let pool = DbPool::new(pool_config).await.map_err(io::Error::other)?;
    info!("connected to PostgreSQL");
    Ok(wire(Stores::diesel(&pool), adapters, settings))
}
