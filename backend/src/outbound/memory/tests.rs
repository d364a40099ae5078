//! Behaviour of the in-memory store's transactional guarantees.

use std::sync::Arc;

use chrono::Duration;
use rstest::{fixture, rstest};

use crate::domain::ports::{
    BookingRepository, BookingRepositoryError, MechanicRepository, ProposalRepository,
    ProposalRepositoryError, ServiceRequestRepository, WalletRepository, WalletRepositoryError,
};
use crate::domain::{
    Booking, BookingId, BookingReview, BookingStatus, BookingTransition, CustomerId, Mechanic,
    PaymentMethod, ProposalStatus, Rating, RequestStatus, Review, ReviewId, ServiceCategory,
    ServiceRequest, TransactionId, TransactionKind, WalletMovement,
};
use crate::test_support::{
    approved_mechanic, fixture_now, pending_proposal, pending_request, point, proposal_fee,
};

use super::InMemoryMarketplaceStore;

struct Seeded {
    store: Arc<InMemoryMarketplaceStore>,
    mechanic: Mechanic,
    request: ServiceRequest,
}

#[fixture]
async fn seeded() -> Seeded {
    let store = Arc::new(InMemoryMarketplaceStore::new());
    let mechanic = approved_mechanic(ServiceCategory::CarMechanic, point(31.52, 74.35), 1);
    let request = pending_request(
        CustomerId::random(),
        ServiceCategory::CarMechanic,
        None,
        fixture_now(),
    );
    MechanicRepository::create(store.as_ref(), &mechanic)
        .await
        .expect("seed mechanic");
    ServiceRequestRepository::create(store.as_ref(), &request)
        .await
        .expect("seed request");
    Seeded {
        store,
        mechanic,
        request,
    }
}

fn purchase(mechanic: &Mechanic, reference: &str) -> WalletMovement {
    WalletMovement {
        id: TransactionId::random(),
        mechanic_id: mechanic.id(),
        kind: TransactionKind::Purchase,
        amount: 10,
        payment_method: Some(PaymentMethod::Easypaisa),
        reference: Some(reference.to_owned()),
        created_at: fixture_now(),
    }
}

async fn add_mechanic(store: &InMemoryMarketplaceStore, balance: u32) -> Mechanic {
    let mechanic = approved_mechanic(ServiceCategory::CarMechanic, point(31.53, 74.36), balance);
    MechanicRepository::create(store, &mechanic)
        .await
        .expect("seed mechanic");
    mechanic
}

#[rstest]
#[tokio::test]
async fn submitting_a_proposal_charges_exactly_one_diamond(#[future] seeded: Seeded) {
    let Seeded {
        store,
        mechanic,
        request,
    } = seeded.await;
    let proposal = pending_proposal(&request, mechanic.id(), 1500);

    let entry = store
        .submit(&proposal, proposal_fee(&proposal))
        .await
        .expect("submitted");

    assert_eq!(entry.balance_after, 0);
    assert_eq!(store.balance(mechanic.id()).await.expect("balance"), Some(0));
    assert_eq!(store.history(mechanic.id()).await.expect("history").len(), 1);
}

#[rstest]
#[tokio::test]
async fn empty_wallet_blocks_the_proposal_and_writes_nothing(#[future] seeded: Seeded) {
    let Seeded {
        store,
        mechanic,
        request,
    } = seeded.await;
    let first = pending_proposal(&request, mechanic.id(), 1500);
    store
        .submit(&first, proposal_fee(&first))
        .await
        .expect("first proposal");
    let other_request = pending_request(
        CustomerId::random(),
        ServiceCategory::CarMechanic,
        None,
        fixture_now(),
    );
    ServiceRequestRepository::create(store.as_ref(), &other_request)
        .await
        .expect("seed second request");
    let second = pending_proposal(&other_request, mechanic.id(), 1200);

    let err = store
        .submit(&second, proposal_fee(&second))
        .await
        .expect_err("no diamonds left");

    assert_eq!(err, ProposalRepositoryError::insufficient_balance(0_u32));
    assert!(
        ProposalRepository::find_by_id(store.as_ref(), second.id())
            .await
            .expect("lookup")
            .is_none()
    );
    assert_eq!(store.history(mechanic.id()).await.expect("history").len(), 1);
}

#[rstest]
#[tokio::test]
async fn second_proposal_for_the_same_request_is_a_duplicate(#[future] seeded: Seeded) {
    let Seeded {
        store,
        mechanic,
        request,
    } = seeded.await;
    store
        .apply(purchase(&mechanic, "EP-77"))
        .await
        .expect("top up");
    let first = pending_proposal(&request, mechanic.id(), 1500);
    let again = pending_proposal(&request, mechanic.id(), 1400);
    store
        .submit(&first, proposal_fee(&first))
        .await
        .expect("first proposal");

    let err = store
        .submit(&again, proposal_fee(&again))
        .await
        .expect_err("duplicate");

    assert_eq!(
        err,
        ProposalRepositoryError::duplicate(mechanic.id(), request.id())
    );
    assert_eq!(store.balance(mechanic.id()).await.expect("balance"), Some(10));
}

#[rstest]
#[tokio::test]
async fn concurrent_proposals_never_overdraw_the_wallet() {
    let store = Arc::new(InMemoryMarketplaceStore::new());
    let mechanic = add_mechanic(&store, 1).await;
    let mut proposals = Vec::new();
    for _ in 0..8 {
        let request = pending_request(
            CustomerId::random(),
            ServiceCategory::CarMechanic,
            None,
            fixture_now(),
        );
        ServiceRequestRepository::create(store.as_ref(), &request)
            .await
            .expect("seed request");
        proposals.push(pending_proposal(&request, mechanic.id(), 900));
    }

    let handles: Vec<_> = proposals
        .into_iter()
        .map(|proposal| {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.submit(&proposal, proposal_fee(&proposal)).await })
        })
        .collect();
    let mut accepted = 0;
    for handle in handles {
        if handle.await.expect("task").is_ok() {
            accepted += 1;
        }
    }

    assert_eq!(accepted, 1);
    assert_eq!(store.balance(mechanic.id()).await.expect("balance"), Some(0));
}

#[rstest]
#[tokio::test]
async fn replayed_purchase_reference_is_rejected(#[future] seeded: Seeded) {
    let Seeded {
        store, mechanic, ..
    } = seeded.await;
    store
        .apply(purchase(&mechanic, "JC-1001"))
        .await
        .expect("first credit");

    let err = store
        .apply(purchase(&mechanic, "JC-1001"))
        .await
        .expect_err("replay");

    assert_eq!(err, WalletRepositoryError::duplicate_reference("JC-1001"));
    assert_eq!(store.balance(mechanic.id()).await.expect("balance"), Some(11));
}

#[rstest]
#[tokio::test]
async fn accepting_rejects_siblings_and_matches_the_request(#[future] seeded: Seeded) {
    let Seeded {
        store,
        mechanic,
        request,
    } = seeded.await;
    let rival = add_mechanic(&store, 3).await;
    let chosen = pending_proposal(&request, mechanic.id(), 1500);
    let sibling = pending_proposal(&request, rival.id(), 1300);
    store
        .submit(&chosen, proposal_fee(&chosen))
        .await
        .expect("chosen");
    store
        .submit(&sibling, proposal_fee(&sibling))
        .await
        .expect("sibling");
    let booking =
        Booking::from_accepted_proposal(BookingId::random(), &request, &chosen, fixture_now());

    store.accept_proposal(&booking).await.expect("accepted");

    let proposals = store.list_for_request(request.id()).await.expect("list");
    let status_of = |id| {
        proposals
            .iter()
            .find(|proposal| proposal.id() == id)
            .map(|proposal| proposal.status())
    };
    assert_eq!(status_of(chosen.id()), Some(ProposalStatus::Accepted));
    assert_eq!(status_of(sibling.id()), Some(ProposalStatus::Rejected));
    let stored = ServiceRequestRepository::find_by_id(store.as_ref(), request.id())
        .await
        .expect("lookup")
        .expect("request");
    assert_eq!(stored.status(), RequestStatus::Matched);
    assert_eq!(
        store
            .find_ongoing_for_mechanic(mechanic.id())
            .await
            .expect("lookup")
            .map(|found| found.id()),
        Some(booking.id())
    );
}

#[rstest]
#[tokio::test]
async fn accepting_twice_fails_on_the_second_call(#[future] seeded: Seeded) {
    let Seeded {
        store,
        mechanic,
        request,
    } = seeded.await;
    let proposal = pending_proposal(&request, mechanic.id(), 1500);
    store
        .submit(&proposal, proposal_fee(&proposal))
        .await
        .expect("submitted");
    let first =
        Booking::from_accepted_proposal(BookingId::random(), &request, &proposal, fixture_now());
    let second =
        Booking::from_accepted_proposal(BookingId::random(), &request, &proposal, fixture_now());
    store.accept_proposal(&first).await.expect("first accept");

    let err = store
        .accept_proposal(&second)
        .await
        .expect_err("already accepted");

    assert_eq!(err, BookingRepositoryError::proposal_not_pending(proposal.id()));
}

#[rstest]
#[tokio::test]
async fn matched_request_cannot_be_reopened(#[future] seeded: Seeded) {
    let Seeded {
        store,
        mechanic,
        request,
    } = seeded.await;
    let proposal = pending_proposal(&request, mechanic.id(), 1500);
    store
        .submit(&proposal, proposal_fee(&proposal))
        .await
        .expect("submitted");
    let booking =
        Booking::from_accepted_proposal(BookingId::random(), &request, &proposal, fixture_now());
    store.accept_proposal(&booking).await.expect("accepted");

    let reopened = store
        .update_status(
            request.id(),
            RequestStatus::Matched,
            RequestStatus::Pending,
            fixture_now(),
        )
        .await
        .expect("update");

    assert!(reopened.is_none());
    let feed = store
        .list_recent_pending(
            ServiceCategory::CarMechanic,
            fixture_now() - Duration::minutes(10),
        )
        .await
        .expect("feed");
    assert!(feed.iter().all(|pending| pending.id() != request.id()));
}

#[rstest]
#[tokio::test]
async fn mechanic_cannot_hold_two_ongoing_jobs(#[future] seeded: Seeded) {
    let Seeded {
        store,
        mechanic,
        request,
    } = seeded.await;
    store
        .apply(purchase(&mechanic, "EP-1"))
        .await
        .expect("top up");
    let first = pending_proposal(&request, mechanic.id(), 1500);
    store
        .submit(&first, proposal_fee(&first))
        .await
        .expect("first");
    store
        .accept_proposal(&Booking::from_accepted_proposal(
            BookingId::random(),
            &request,
            &first,
            fixture_now(),
        ))
        .await
        .expect("first booking");
    let next_request = pending_request(
        CustomerId::random(),
        ServiceCategory::CarMechanic,
        None,
        fixture_now(),
    );
    ServiceRequestRepository::create(store.as_ref(), &next_request)
        .await
        .expect("seed request");
    let second = pending_proposal(&next_request, mechanic.id(), 1500);
    store
        .submit(&second, proposal_fee(&second))
        .await
        .expect("second");

    let err = store
        .accept_proposal(&Booking::from_accepted_proposal(
            BookingId::random(),
            &next_request,
            &second,
            fixture_now(),
        ))
        .await
        .expect_err("mechanic busy");

    assert_eq!(err, BookingRepositoryError::mechanic_busy(mechanic.id()));
}

#[rstest]
#[tokio::test]
async fn completing_and_reviewing_update_mechanic_counters(#[future] seeded: Seeded) {
    let Seeded {
        store,
        mechanic,
        request,
    } = seeded.await;
    let proposal = pending_proposal(&request, mechanic.id(), 1500);
    store
        .submit(&proposal, proposal_fee(&proposal))
        .await
        .expect("submitted");
    let ongoing =
        Booking::from_accepted_proposal(BookingId::random(), &request, &proposal, fixture_now());
    store.accept_proposal(&ongoing).await.expect("accepted");
    let completed = ongoing
        .apply(
            BookingTransition::Complete,
            fixture_now() + Duration::minutes(50),
        )
        .expect("complete");

    store
        .save(&completed, BookingStatus::Ongoing)
        .await
        .expect("saved");
    let stale = store
        .save(&completed, BookingStatus::Ongoing)
        .await
        .expect_err("status moved on");
    let rating = Rating::new(4).expect("rating");
    let reviewed = completed
        .with_review(BookingReview {
            rating,
            comment: None,
        })
        .expect("review");
    let review = Review {
        id: ReviewId::random(),
        booking_id: reviewed.id(),
        mechanic_id: mechanic.id(),
        customer_id: reviewed.customer_id(),
        rating,
        comment: None,
        created_at: fixture_now() + Duration::hours(1),
    };
    store
        .record_review(&reviewed, &review)
        .await
        .expect("reviewed");
    let again = store
        .record_review(&reviewed, &review)
        .await
        .expect_err("second review");

    assert_eq!(stale, BookingRepositoryError::status_conflict(completed.id()));
    assert_eq!(again, BookingRepositoryError::already_reviewed(reviewed.id()));
    let stored = MechanicRepository::find_by_id(store.as_ref(), mechanic.id())
        .await
        .expect("lookup")
        .expect("mechanic");
    assert_eq!(stored.completed_jobs(), 1);
    assert_eq!(stored.rating().rating_count(), 1);
    assert_eq!(stored.rating().total_rating(), 4);
}

#[rstest]
#[tokio::test]
async fn expiry_skips_scheduled_and_recent_requests(#[future] seeded: Seeded) {
    let Seeded { store, request, .. } = seeded.await;
    let recent = pending_request(
        CustomerId::random(),
        ServiceCategory::CarMechanic,
        None,
        fixture_now() + Duration::minutes(9),
    );
    ServiceRequestRepository::create(store.as_ref(), &recent)
        .await
        .expect("seed recent");
    let cutoff = fixture_now() + Duration::minutes(5);

    let expired = store
        .expire_stale(cutoff, cutoff)
        .await
        .expect("expired");

    assert_eq!(
        expired.iter().map(ServiceRequest::id).collect::<Vec<_>>(),
        vec![request.id()]
    );
    let live = store
        .list_recent_pending(ServiceCategory::CarMechanic, cutoff)
        .await
        .expect("live");
    assert_eq!(live.len(), 1);
}
