//! Tests for the booking services.

use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveTime};
use rstest::{fixture, rstest};

use super::*;
use crate::domain::ports::{
    FixtureNotificationSender, MockBookingRepository, MockMechanicRepository,
    MockNotificationSender, MockRouteEstimateSource, RouteEstimateSourceError,
};
use crate::domain::{
    BookingDraft, ErrorCode, Location, Party, Rating, Recipient, ServiceCategory,
};
use crate::test_support::{MutableClock, approved_mechanic, fixture_now, job_location, point};

fn booking(status: BookingStatus, schedule: Option<Schedule>) -> Booking {
    Booking::from(BookingDraft {
        id: BookingId::random(),
        customer_id: CustomerId::random(),
        mechanic_id: MechanicId::random(),
        request_id: RequestId::random(),
        proposal_id: None,
        category: ServiceCategory::CarMechanic,
        price: 1500,
        location: job_location(),
        status,
        schedule,
        created_at: fixture_now(),
        confirmed_at: None,
        started_at: None,
        completed_at: None,
        cancellation: None,
        review: None,
        mechanic_live_location: None,
    })
}

fn next_week() -> Schedule {
    Schedule {
        date: NaiveDate::from_ymd_opt(2026, 3, 21).expect("valid date"),
        time: NaiveTime::from_hms_opt(11, 0, 0).expect("valid time"),
    }
}

fn command(
    bookings: MockBookingRepository,
    mechanics: MockMechanicRepository,
    notifier: Arc<dyn NotificationSender>,
) -> BookingCommandService<MockBookingRepository, MockMechanicRepository> {
    BookingCommandService::new(
        Arc::new(bookings),
        Arc::new(mechanics),
        notifier,
        Arc::new(MutableClock::new(fixture_now())),
    )
}

fn returning(current: &Booking) -> MockBookingRepository {
    let current = current.clone();
    let mut bookings = MockBookingRepository::new();
    bookings
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(current)));
    bookings
}

#[fixture]
fn scheduled() -> Booking {
    booking(BookingStatus::Scheduled, Some(next_week()))
}

#[rstest]
#[tokio::test]
async fn confirm_writes_with_compare_and_set(scheduled: Booking) {
    let mut bookings = returning(&scheduled);
    bookings
        .expect_save()
        .times(1)
        .withf(|next, expected| {
            next.status() == BookingStatus::Confirmed && *expected == BookingStatus::Scheduled
        })
        .return_once(|_, _| Ok(()));

    let confirmed = command(
        bookings,
        MockMechanicRepository::new(),
        Arc::new(FixtureNotificationSender),
    )
    .confirm(scheduled.mechanic_id(), scheduled.id())
    .await
    .expect("mechanic confirms");

    assert_eq!(confirmed.status(), BookingStatus::Confirmed);
    assert_eq!(confirmed.confirmed_at(), Some(fixture_now()));
}

#[rstest]
#[tokio::test]
async fn another_mechanic_cannot_start_the_job(scheduled: Booking) {
    let mut bookings = returning(&scheduled);
    bookings.expect_save().times(0);

    let err = command(
        bookings,
        MockMechanicRepository::new(),
        Arc::new(FixtureNotificationSender),
    )
    .start_job(MechanicId::random(), scheduled.id())
    .await
    .expect_err("wrong mechanic");

    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[rstest]
#[case(BookingStatus::Completed)]
#[case(BookingStatus::Cancelled)]
#[tokio::test]
async fn terminal_bookings_reject_every_transition(#[case] status: BookingStatus) {
    let current = booking(status, None);
    let mut bookings = returning(&current);
    bookings.expect_save().times(0);

    let err = command(
        bookings,
        MockMechanicRepository::new(),
        Arc::new(FixtureNotificationSender),
    )
    .start_job(current.mechanic_id(), current.id())
    .await
    .expect_err("terminal");

    assert_eq!(err.code(), ErrorCode::InvalidState);
}

#[rstest]
#[tokio::test]
async fn concurrent_writer_yields_conflict(scheduled: Booking) {
    let booking_id = scheduled.id();
    let mut bookings = returning(&scheduled);
    bookings
        .expect_save()
        .return_once(move |_, _| Err(BookingRepositoryError::status_conflict(booking_id)));

    let err = command(
        bookings,
        MockMechanicRepository::new(),
        Arc::new(FixtureNotificationSender),
    )
    .confirm(scheduled.mechanic_id(), booking_id)
    .await
    .expect_err("lost the race");

    assert_eq!(err.code(), ErrorCode::Conflict);
}

#[rstest]
#[tokio::test]
async fn customer_cancellation_notifies_the_mechanic(scheduled: Booking) {
    let mechanic_id = scheduled.mechanic_id();
    let mut bookings = returning(&scheduled);
    bookings.expect_save().return_once(|_, _| Ok(()));
    let mut notifier = MockNotificationSender::new();
    notifier
        .expect_send()
        .times(1)
        .withf(move |notification| notification.recipient == Recipient::Mechanic(mechanic_id))
        .return_once(|_| Ok(()));

    let cancelled = command(bookings, MockMechanicRepository::new(), Arc::new(notifier))
        .cancel(
            BookingActor::Customer(scheduled.customer_id()),
            scheduled.id(),
            Some("  found someone closer ".to_owned()),
        )
        .await
        .expect("customer cancels");

    let cancellation = cancelled.cancellation().expect("cancellation recorded");
    assert_eq!(cancellation.by, Party::Customer);
    assert_eq!(cancellation.reason.as_deref(), Some("found someone closer"));
}

#[rstest]
#[tokio::test]
async fn reschedule_keeps_status_and_replaces_slot(scheduled: Booking) {
    let later = Schedule {
        date: NaiveDate::from_ymd_opt(2026, 3, 28).expect("valid date"),
        time: NaiveTime::from_hms_opt(9, 0, 0).expect("valid time"),
    };
    let mut bookings = returning(&scheduled);
    bookings
        .expect_save()
        .withf(|_, expected| *expected == BookingStatus::Scheduled)
        .return_once(|_, _| Ok(()));

    let moved = command(
        bookings,
        MockMechanicRepository::new(),
        Arc::new(FixtureNotificationSender),
    )
    .reschedule(scheduled.customer_id(), scheduled.id(), later)
    .await
    .expect("customer reschedules");

    assert_eq!(moved.schedule(), Some(later));
    assert_eq!(moved.status(), BookingStatus::Scheduled);
}

#[rstest]
#[tokio::test]
async fn live_location_reports_distance_and_arrival() {
    let ongoing = booking(BookingStatus::Ongoing, None);
    let mut bookings = returning(&ongoing);
    bookings
        .expect_save()
        .withf(|next, expected| {
            next.mechanic_live_location().is_some() && *expected == BookingStatus::Ongoing
        })
        .return_once(|_, _| Ok(()));
    let at_the_door = ongoing.location().point();

    let update = command(
        bookings,
        MockMechanicRepository::new(),
        Arc::new(FixtureNotificationSender),
    )
    .update_live_location(ongoing.mechanic_id(), ongoing.id(), at_the_door)
    .await
    .expect("location accepted");

    assert!(update.arrived);
    assert!(update.distance_km.abs() < f64::EPSILON);
}

#[rstest]
#[tokio::test]
async fn live_location_outside_an_ongoing_job_is_invalid(scheduled: Booking) {
    let mut bookings = returning(&scheduled);
    bookings.expect_save().times(0);

    let err = command(
        bookings,
        MockMechanicRepository::new(),
        Arc::new(FixtureNotificationSender),
    )
    .update_live_location(scheduled.mechanic_id(), scheduled.id(), point(31.0, 74.0))
    .await
    .expect_err("not ongoing");

    assert_eq!(err.code(), ErrorCode::InvalidState);
}

#[rstest]
#[tokio::test]
async fn review_of_completed_booking_is_recorded_once() {
    let completed = booking(BookingStatus::Completed, None);
    let mut bookings = returning(&completed);
    bookings
        .expect_record_review()
        .times(1)
        .withf(|booking, review| booking.is_reviewed() && review.rating.stars() == 5)
        .return_once(|_, _| Ok(()));

    let review = command(
        bookings,
        MockMechanicRepository::new(),
        Arc::new(FixtureNotificationSender),
    )
    .submit_review(SubmitReviewRequest {
        customer_id: completed.customer_id(),
        booking_id: completed.id(),
        rating: Rating::new(5).expect("valid rating"),
        comment: Some("Quick and tidy".to_owned()),
    })
    .await
    .expect("review accepted");

    assert_eq!(review.mechanic_id, completed.mechanic_id());
}

#[rstest]
#[tokio::test]
async fn review_before_completion_is_invalid() {
    let ongoing = booking(BookingStatus::Ongoing, None);
    let mut bookings = returning(&ongoing);
    bookings.expect_record_review().times(0);

    let err = command(
        bookings,
        MockMechanicRepository::new(),
        Arc::new(FixtureNotificationSender),
    )
    .submit_review(SubmitReviewRequest {
        customer_id: ongoing.customer_id(),
        booking_id: ongoing.id(),
        rating: Rating::new(4).expect("valid rating"),
        comment: None,
    })
    .await
    .expect_err("not completed");

    assert_eq!(err.code(), ErrorCode::InvalidState);
}

#[rstest]
#[tokio::test]
async fn direct_booking_requires_an_eligible_mechanic() {
    let mechanic = approved_mechanic(ServiceCategory::Towing, point(31.5, 74.3), 0);
    let mechanic_id = mechanic.id();
    let mut mechanics = MockMechanicRepository::new();
    mechanics
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(mechanic)));
    let mut bookings = MockBookingRepository::new();
    bookings.expect_create_direct().times(0);

    let err = command(bookings, mechanics, Arc::new(FixtureNotificationSender))
        .book_directly(DirectBookingRequest {
            customer_id: CustomerId::random(),
            mechanic_id,
            category: ServiceCategory::CarMechanic,
            description: "Annual service".to_owned(),
            location: job_location(),
            schedule: next_week(),
            price: 4000,
        })
        .await
        .expect_err("tow truck driver does not service cars");

    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[tokio::test]
async fn direct_booking_stores_matched_request_and_scheduled_booking() {
    let mechanic = approved_mechanic(ServiceCategory::CarMechanic, point(31.5, 74.3), 0);
    let mechanic_id = mechanic.id();
    let mut mechanics = MockMechanicRepository::new();
    mechanics
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(mechanic)));
    let mut bookings = MockBookingRepository::new();
    bookings
        .expect_create_direct()
        .times(1)
        .withf(|request, booking| {
            request.status() == RequestStatus::Matched
                && booking.status() == BookingStatus::Scheduled
                && booking.request_id() == request.id()
                && booking.proposal_id().is_none()
        })
        .return_once(|_, _| Ok(()));

    let created = command(bookings, mechanics, Arc::new(FixtureNotificationSender))
        .book_directly(DirectBookingRequest {
            customer_id: CustomerId::random(),
            mechanic_id,
            category: ServiceCategory::CarMechanic,
            description: "Annual service".to_owned(),
            location: Location::new(point(31.52, 74.35), "Gulberg"),
            schedule: next_week(),
            price: 4000,
        })
        .await
        .expect("booking created");

    assert_eq!(created.schedule(), Some(next_week()));
    assert_eq!(created.price(), 4000);
}

#[rstest]
#[tokio::test]
async fn route_falls_back_to_the_mechanic_profile_location() {
    let ongoing = booking(BookingStatus::Ongoing, None);
    let base = point(31.55, 74.34);
    let mechanic = approved_mechanic(ServiceCategory::CarMechanic, base, 0);
    let mut mechanics = MockMechanicRepository::new();
    mechanics
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(mechanic)));
    let mut routes = MockRouteEstimateSource::new();
    routes
        .expect_estimate()
        .times(1)
        .withf(move |origin, _| *origin == base)
        .return_once(|_, _| {
            Ok(RouteEstimate {
                distance_km: 3.4,
                duration_minutes: 9,
                polyline: Vec::new(),
            })
        });

    let service = BookingQueryService::new(
        Arc::new(returning(&ongoing)),
        Arc::new(mechanics),
        Arc::new(routes),
    );
    let route = service
        .route_to_job(ongoing.id())
        .await
        .expect("route estimated");

    assert_eq!(route.duration_minutes, 9);
}

#[rstest]
#[tokio::test]
async fn directions_outage_maps_to_remote_failure() {
    let ongoing = booking(BookingStatus::Ongoing, None)
        .with_live_location(point(31.50, 74.30))
        .expect("ongoing accepts location");
    let mut routes = MockRouteEstimateSource::new();
    routes
        .expect_estimate()
        .return_once(|_, _| Err(RouteEstimateSourceError::transport("timeout")));

    let service = BookingQueryService::new(
        Arc::new(returning(&ongoing)),
        Arc::new(MockMechanicRepository::new()),
        Arc::new(routes),
    );
    let err = service
        .route_to_job(ongoing.id())
        .await
        .expect_err("provider down");

    assert_eq!(err.code(), ErrorCode::RemoteFailure);
}

#[rstest]
#[tokio::test]
async fn past_reschedule_is_rejected(scheduled: Booking) {
    let past = fixture_now() - Duration::hours(1);
    let err = command(
        MockBookingRepository::new(),
        MockMechanicRepository::new(),
        Arc::new(FixtureNotificationSender),
    )
    .reschedule(
        scheduled.customer_id(),
        scheduled.id(),
        Schedule {
            date: past.date_naive(),
            time: past.time(),
        },
    )
    .await
    .expect_err("slot already passed");

    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}
