//! Behaviour-driven coverage of the request, proposal and booking flow.
//!
//! Scenarios run against the in-memory wiring so they need no database; the
//! world drives the same driving ports the HTTP handlers call.

use std::sync::Arc;

use marketplace::domain::ports::{AcceptProposalRequest, SubmitProposalRequest};
use marketplace::domain::{
    Booking, BookingStatus, CustomerId, ErrorCode, Mechanic, NotificationKind, ProposalId,
    Recipient, RequestId, ServiceCategory,
};
use rstest::fixture;
use rstest_bdd::Slot;
use rstest_bdd_macros::{ScenarioState, given, scenario, then, when};
use tokio::runtime::Runtime;

#[allow(
    dead_code,
    reason = "Shared wiring exposes ports that only some suites drive."
)]
#[path = "support/marketplace.rs"]
mod marketplace_support;

use marketplace_support::{Marketplace, immediate_request, point};

// -----------------------------------------------------------------------------
// Test World
// -----------------------------------------------------------------------------

/// Wrapper for non-Clone types to enable storage in `Slot`.
#[derive(Clone)]
struct RuntimeHandle(Arc<Runtime>);

#[derive(Clone)]
struct MarketplaceHandle(Arc<Marketplace>);

#[derive(Default, ScenarioState)]
struct MarketplaceWorld {
    runtime: Slot<RuntimeHandle>,
    market: Slot<MarketplaceHandle>,
    mechanic: Slot<Mechanic>,
    customer_id: Slot<CustomerId>,
    request_id: Slot<RequestId>,
    proposal_id: Slot<ProposalId>,
    booking: Slot<Booking>,
    last_error: Slot<ErrorCode>,
}

impl MarketplaceWorld {
    fn runtime(&self) -> Arc<Runtime> {
        if self.runtime.get().is_none() {
            let runtime = Runtime::new().expect("create runtime");
            self.runtime.set(RuntimeHandle(Arc::new(runtime)));
            self.market
                .set(MarketplaceHandle(Arc::new(Marketplace::new())));
        }
        self.runtime.get().expect("runtime").0
    }

    fn market(&self) -> Arc<Marketplace> {
        self.runtime();
        self.market.get().expect("marketplace").0
    }

    fn mechanic(&self) -> Mechanic {
        self.mechanic.get().expect("mechanic onboarded")
    }

    fn request_id(&self) -> RequestId {
        self.request_id.get().expect("request created")
    }
}

fn parse_count(raw: &str) -> u32 {
    raw.parse().expect("numeric step argument")
}

fn wire_code(code: ErrorCode) -> String {
    serde_json::to_value(code)
        .ok()
        .and_then(|value| value.as_str().map(str::to_owned))
        .expect("error code serialises as a string")
}

#[fixture]
fn world() -> MarketplaceWorld {
    MarketplaceWorld::default()
}

// -----------------------------------------------------------------------------
// Given Steps
// -----------------------------------------------------------------------------

#[given("a verified car mechanic near Islamabad holding {diamonds} diamonds")]
fn a_verified_mechanic(world: &MarketplaceWorld, diamonds: String) {
    let market = world.market();
    let mechanic = world.runtime().block_on(market.onboard_mechanic(
        ServiceCategory::CarMechanic,
        point(33.70, 73.05),
        parse_count(&diamonds),
    ));
    world.mechanic.set(mechanic);
}

// -----------------------------------------------------------------------------
// When Steps
// -----------------------------------------------------------------------------

#[when("a customer requests a car mechanic at F-7 Markaz")]
fn a_customer_requests_help(world: &MarketplaceWorld) {
    let market = world.market();
    let customer_id = CustomerId::random();
    let created = world
        .runtime()
        .block_on(market.requests.create_request(immediate_request(
            customer_id,
            ServiceCategory::CarMechanic,
            point(33.6844, 73.0479),
        )))
        .expect("create request");
    world.customer_id.set(customer_id);
    world.request_id.set(created.request.id());
}

#[when("the mechanic proposes {price} rupees")]
fn the_mechanic_proposes(world: &MarketplaceWorld, price: String) {
    let market = world.market();
    let outcome = world
        .runtime()
        .block_on(market.proposals.submit_proposal(SubmitProposalRequest {
            mechanic_id: world.mechanic().id(),
            request_id: world.request_id(),
            price: parse_count(&price),
            estimated_minutes: 35,
            message: None,
        }));
    match outcome {
        Ok(submitted) => world.proposal_id.set(submitted.proposal.id()),
        Err(err) => world.last_error.set(err.code()),
    }
}

#[when("the customer accepts the proposal")]
fn the_customer_accepts(world: &MarketplaceWorld) {
    let market = world.market();
    let booking = world
        .runtime()
        .block_on(market.proposals.accept_proposal(AcceptProposalRequest {
            customer_id: world.customer_id.get().expect("customer"),
            proposal_id: world.proposal_id.get().expect("proposal submitted"),
        }))
        .expect("accept proposal");
    world.booking.set(booking);
}

#[when("the customer cancels the request")]
fn the_customer_cancels(world: &MarketplaceWorld) {
    let market = world.market();
    world
        .runtime()
        .block_on(market.requests.cancel_request(
            world.customer_id.get().expect("customer"),
            world.request_id(),
        ))
        .expect("cancel request");
}

// -----------------------------------------------------------------------------
// Then Steps
// -----------------------------------------------------------------------------

#[then("the mechanic was notified of the request")]
fn the_mechanic_was_notified(world: &MarketplaceWorld) {
    let mechanic_id = world.mechanic().id();
    let notified = world.market().notifier.sent().into_iter().any(|sent| {
        sent.kind == NotificationKind::NewServiceRequest
            && sent.recipient == Recipient::Mechanic(mechanic_id)
    });
    assert!(notified, "expected a new request notification");
}

#[then("the mechanic holds {diamonds} diamonds")]
fn the_mechanic_holds(world: &MarketplaceWorld, diamonds: String) {
    let market = world.market();
    let balance = world
        .runtime()
        .block_on(market.wallet_query.balance(world.mechanic().id()))
        .expect("balance");
    assert_eq!(balance, parse_count(&diamonds));
}

#[then("the booking is ongoing at {price} rupees")]
fn the_booking_is_ongoing(world: &MarketplaceWorld, price: String) {
    let booking = world.booking.get().expect("booking created");
    assert_eq!(booking.status(), BookingStatus::Ongoing);
    assert_eq!(booking.price(), parse_count(&price));
}

#[then("the request is no longer in the feed")]
fn the_request_left_the_feed(world: &MarketplaceWorld) {
    let market = world.market();
    let feed = world
        .runtime()
        .block_on(
            market
                .requests_query
                .feed_for_category(ServiceCategory::CarMechanic),
        )
        .expect("feed");
    let request_id = world.request_id();
    assert!(feed.iter().all(|request| request.id() != request_id));
}

#[then("the proposal is rejected with {code}")]
fn the_proposal_is_rejected(world: &MarketplaceWorld, code: String) {
    let actual = world.last_error.get().expect("proposal should have failed");
    assert_eq!(wire_code(actual), code);
}

// -----------------------------------------------------------------------------
// Scenario Bindings
// -----------------------------------------------------------------------------

#[scenario(
    path = "tests/features/marketplace_flow.feature",
    name = "Accepted proposal becomes an ongoing booking"
)]
fn accepted_proposal_becomes_an_ongoing_booking(world: MarketplaceWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/marketplace_flow.feature",
    name = "Empty wallet cannot bid"
)]
fn empty_wallet_cannot_bid(world: MarketplaceWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/marketplace_flow.feature",
    name = "Mechanic cannot bid twice on one request"
)]
fn mechanic_cannot_bid_twice(world: MarketplaceWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/marketplace_flow.feature",
    name = "Cancelled request stops taking proposals"
)]
fn cancelled_request_stops_taking_proposals(world: MarketplaceWorld) {
    let _ = world;
}
