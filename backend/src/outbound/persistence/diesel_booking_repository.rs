//! PostgreSQL-backed `BookingRepository`.
//!
//! Every multi-row write runs in one transaction. The partial unique indexes
//! on ongoing bookings enforce the one-job-at-a-time rule even when two
//! transitions race; their violations surface as busy errors.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};

use crate::domain::ports::{BookingRepository, BookingRepositoryError};
use crate::domain::{
    Booking, BookingId, BookingStatus, CustomerId, MechanicId, ProposalStatus, RequestStatus,
    Review, ServiceRequest,
};

use super::error_mapping::{self, TxError, violated_unique_constraint};
use super::models::{
    BookingChangeset, BookingRow, NewBookingRow, NewReviewRow, NewServiceRequestRow,
};
use super::pool::{DbPool, PoolError};
use super::schema::{bookings, mechanics, proposals, reviews, service_requests};

const MECHANIC_ONGOING_INDEX: &str = "bookings_one_ongoing_per_mechanic";
const CUSTOMER_ONGOING_INDEX: &str = "bookings_one_ongoing_per_customer";
const REQUEST_PRIMARY_KEY: &str = "service_requests_pkey";
const REVIEW_BOOKING_KEY: &str = "reviews_booking_id_key";

type BookingTxError = TxError<BookingRepositoryError>;

/// Diesel-backed implementation of the `BookingRepository` port.
#[derive(Clone)]
pub struct DieselBookingRepository {
    pool: DbPool,
}

impl DieselBookingRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> BookingRepositoryError {
    error_mapping::map_pool_error(error, BookingRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> BookingRepositoryError {
    error_mapping::map_diesel_error(
        error,
        BookingRepositoryError::query,
        BookingRepositoryError::connection,
    )
}

fn map_tx_error(error: BookingTxError) -> BookingRepositoryError {
    error.into_port_error(map_diesel_error)
}

/// Turn an ongoing-index violation into the matching busy error.
fn busy_or_database(error: diesel::result::Error, booking: &Booking) -> BookingTxError {
    match violated_unique_constraint(&error).as_deref() {
        Some(MECHANIC_ONGOING_INDEX) => {
            TxError::Rejected(BookingRepositoryError::mechanic_busy(booking.mechanic_id()))
        }
        Some(CUSTOMER_ONGOING_INDEX) => {
            TxError::Rejected(BookingRepositoryError::customer_busy(booking.customer_id()))
        }
        _ => TxError::Diesel(error),
    }
}

fn new_booking_row(booking: &Booking) -> Result<NewBookingRow<'_>, BookingRepositoryError> {
    NewBookingRow::from_domain(booking).map_err(BookingRepositoryError::query)
}

async fn insert_booking(
    conn: &mut AsyncPgConnection,
    booking: &Booking,
    row: &NewBookingRow<'_>,
) -> Result<(), BookingTxError> {
    diesel::insert_into(bookings::table)
        .values(row)
        .execute(conn)
        .await
        .map(|_| ())
        .map_err(|error| busy_or_database(error, booking))
}

fn rows_into_domain(rows: Vec<BookingRow>) -> Result<Vec<Booking>, BookingRepositoryError> {
    rows.into_iter()
        .map(|row| row.into_domain().map_err(BookingRepositoryError::query))
        .collect()
}

fn row_into_domain(row: Option<BookingRow>) -> Result<Option<Booking>, BookingRepositoryError> {
    row.map(|row| row.into_domain().map_err(BookingRepositoryError::query))
        .transpose()
}

#[async_trait]
impl BookingRepository for DieselBookingRepository {
    async fn accept_proposal(&self, booking: &Booking) -> Result<(), BookingRepositoryError> {
        let proposal_id = booking
            .proposal_id()
            .ok_or_else(|| BookingRepositoryError::query("booking carries no proposal"))?;
        let request_id = booking.request_id();
        let row = new_booking_row(booking)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        conn.transaction(|conn| {
            async move {
                let proposal_status: Option<String> = proposals::table
                    .find(proposal_id.as_uuid())
                    .select(proposals::status)
                    .for_update()
                    .first(conn)
                    .await
                    .optional()?;
                if proposal_status.as_deref() != Some(ProposalStatus::Pending.as_str()) {
                    return Err(TxError::Rejected(
                        BookingRepositoryError::proposal_not_pending(proposal_id),
                    ));
                }

                let request_status: Option<String> = service_requests::table
                    .find(request_id.as_uuid())
                    .select(service_requests::status)
                    .for_update()
                    .first(conn)
                    .await
                    .optional()?;
                if request_status.as_deref() != Some(RequestStatus::Pending.as_str()) {
                    return Err(TxError::Rejected(
                        BookingRepositoryError::request_not_pending(request_id),
                    ));
                }

                diesel::update(proposals::table.find(proposal_id.as_uuid()))
                    .set(proposals::status.eq(ProposalStatus::Accepted.as_str()))
                    .execute(conn)
                    .await?;
                diesel::update(
                    proposals::table
                        .filter(proposals::request_id.eq(request_id.as_uuid()))
                        .filter(proposals::status.eq(ProposalStatus::Pending.as_str())),
                )
                .set(proposals::status.eq(ProposalStatus::Rejected.as_str()))
                .execute(conn)
                .await?;
                diesel::update(service_requests::table.find(request_id.as_uuid()))
                    .set((
                        service_requests::status.eq(RequestStatus::Matched.as_str()),
                        service_requests::updated_at.eq(booking.created_at()),
                    ))
                    .execute(conn)
                    .await?;

                insert_booking(conn, booking, &row).await
            }
            .scope_boxed()
        })
        .await
        .map_err(map_tx_error)
    }

    async fn create_direct(
        &self,
        request: &ServiceRequest,
        booking: &Booking,
    ) -> Result<(), BookingRepositoryError> {
        let request_row =
            NewServiceRequestRow::from_domain(request).map_err(BookingRepositoryError::query)?;
        let row = new_booking_row(booking)?;
        let request_id = request.id();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        conn.transaction(|conn| {
            async move {
                let inserted = diesel::insert_into(service_requests::table)
                    .values(&request_row)
                    .execute(conn)
                    .await;
                if let Err(error) = inserted {
                    if violated_unique_constraint(&error).as_deref() == Some(REQUEST_PRIMARY_KEY) {
                        return Err(TxError::Rejected(
                            BookingRepositoryError::request_not_pending(request_id),
                        ));
                    }
                    return Err(error.into());
                }
                insert_booking(conn, booking, &row).await
            }
            .scope_boxed()
        })
        .await
        .map_err(map_tx_error)
    }

    async fn find_by_id(
        &self,
        booking_id: BookingId,
    ) -> Result<Option<Booking>, BookingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = bookings::table
            .find(booking_id.as_uuid())
            .select(BookingRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row_into_domain(row)
    }

    async fn find_ongoing_for_mechanic(
        &self,
        mechanic_id: MechanicId,
    ) -> Result<Option<Booking>, BookingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = bookings::table
            .filter(bookings::mechanic_id.eq(mechanic_id.as_uuid()))
            .filter(bookings::status.eq(BookingStatus::Ongoing.as_str()))
            .select(BookingRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row_into_domain(row)
    }

    async fn find_ongoing_for_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Option<Booking>, BookingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = bookings::table
            .filter(bookings::customer_id.eq(customer_id.as_uuid()))
            .filter(bookings::status.eq(BookingStatus::Ongoing.as_str()))
            .select(BookingRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row_into_domain(row)
    }

    async fn list_for_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<Booking>, BookingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<BookingRow> = bookings::table
            .filter(bookings::customer_id.eq(customer_id.as_uuid()))
            .order((bookings::created_at.desc(), bookings::id.desc()))
            .select(BookingRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows_into_domain(rows)
    }

    async fn list_for_mechanic(
        &self,
        mechanic_id: MechanicId,
    ) -> Result<Vec<Booking>, BookingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<BookingRow> = bookings::table
            .filter(bookings::mechanic_id.eq(mechanic_id.as_uuid()))
            .order((bookings::created_at.desc(), bookings::id.desc()))
            .select(BookingRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows_into_domain(rows)
    }

    async fn save(
        &self,
        booking: &Booking,
        expected: BookingStatus,
    ) -> Result<(), BookingRepositoryError> {
        let changes = BookingChangeset::from_domain(booking);
        let completes =
            booking.status() == BookingStatus::Completed && expected != BookingStatus::Completed;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        conn.transaction(|conn| {
            async move {
                let updated = diesel::update(
                    bookings::table
                        .filter(bookings::id.eq(booking.id().as_uuid()))
                        .filter(bookings::status.eq(expected.as_str())),
                )
                .set(&changes)
                .execute(conn)
                .await
                .map_err(|error| busy_or_database(error, booking))?;
                if updated == 0 {
                    return Err(TxError::Rejected(BookingRepositoryError::status_conflict(
                        booking.id(),
                    )));
                }

                if completes {
                    diesel::update(mechanics::table.find(booking.mechanic_id().as_uuid()))
                        .set(mechanics::completed_jobs.eq(mechanics::completed_jobs + 1))
                        .execute(conn)
                        .await?;
                }
                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(map_tx_error)
    }

    async fn record_review(
        &self,
        booking: &Booking,
        review: &Review,
    ) -> Result<(), BookingRepositoryError> {
        let changes = BookingChangeset::from_domain(booking);
        let review_row = NewReviewRow::from_domain(review);
        let stars = review.rating.stars();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        conn.transaction(|conn| {
            async move {
                let updated = diesel::update(
                    bookings::table
                        .filter(bookings::id.eq(booking.id().as_uuid()))
                        .filter(bookings::status.eq(BookingStatus::Completed.as_str()))
                        .filter(bookings::is_reviewed.eq(false)),
                )
                .set(&changes)
                .execute(conn)
                .await?;
                if updated == 0 {
                    let reviewed: Option<bool> = bookings::table
                        .find(booking.id().as_uuid())
                        .select(bookings::is_reviewed)
                        .first(conn)
                        .await
                        .optional()?;
                    let error = if reviewed == Some(true) {
                        BookingRepositoryError::already_reviewed(booking.id())
                    } else {
                        BookingRepositoryError::status_conflict(booking.id())
                    };
                    return Err(TxError::Rejected(error));
                }

                let inserted = diesel::insert_into(reviews::table)
                    .values(&review_row)
                    .execute(conn)
                    .await;
                if let Err(error) = inserted {
                    if violated_unique_constraint(&error).as_deref() == Some(REVIEW_BOOKING_KEY) {
                        return Err(TxError::Rejected(
                            BookingRepositoryError::already_reviewed(booking.id()),
                        ));
                    }
                    return Err(error.into());
                }

                diesel::update(mechanics::table.find(booking.mechanic_id().as_uuid()))
                    .set((
                        mechanics::total_rating.eq(mechanics::total_rating + i64::from(stars)),
                        mechanics::rating_count.eq(mechanics::rating_count + 1),
                    ))
                    .execute(conn)
                    .await?;
                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(map_tx_error)
    }
}

#[cfg(test)]
mod tests {
    //! Constraint-to-error translation.
    use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind, Error as DieselError};
    use rstest::rstest;

    use super::*;
    use crate::domain::ServiceCategory;
    use crate::test_support::{fixture_now, pending_request};

    #[derive(Debug)]
    struct UniqueInfo(&'static str);

    impl DatabaseErrorInformation for UniqueInfo {
        fn message(&self) -> &str {
            "duplicate key value violates unique constraint"
        }
        fn details(&self) -> Option<&str> {
            None
        }
        fn hint(&self) -> Option<&str> {
            None
        }
        fn table_name(&self) -> Option<&str> {
            Some("bookings")
        }
        fn column_name(&self) -> Option<&str> {
            None
        }
        fn constraint_name(&self) -> Option<&str> {
            Some(self.0)
        }
        fn statement_position(&self) -> Option<i32> {
            None
        }
    }

    fn violation(constraint: &'static str) -> DieselError {
        DieselError::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            Box::new(UniqueInfo(constraint)),
        )
    }

    fn booking() -> Booking {
        let request = pending_request(
            CustomerId::random(),
            ServiceCategory::CarMechanic,
            None,
            fixture_now(),
        );
        Booking::direct(BookingId::random(), &request, MechanicId::random(), 1500, fixture_now())
    }

    #[rstest]
    #[case(MECHANIC_ONGOING_INDEX, true)]
    #[case(CUSTOMER_ONGOING_INDEX, false)]
    fn ongoing_index_violations_name_the_busy_party(
        #[case] constraint: &'static str,
        #[case] mechanic: bool,
    ) {
        let booking = booking();
        let expected = if mechanic {
            BookingRepositoryError::mechanic_busy(booking.mechanic_id())
        } else {
            BookingRepositoryError::customer_busy(booking.customer_id())
        };

        let mapped = map_tx_error(busy_or_database(violation(constraint), &booking));

        assert_eq!(mapped, expected);
    }

    #[rstest]
    fn other_violations_stay_database_errors() {
        let booking = booking();
        let mapped = busy_or_database(violation("bookings_pkey"), &booking);
        assert!(matches!(mapped, TxError::Diesel(_)));
    }
}
