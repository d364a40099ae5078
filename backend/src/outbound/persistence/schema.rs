//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. Regenerate with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// Mechanic directory, including the diamond balance and rating aggregate.
    mechanics (id) {
        id -> Uuid,
        name -> Varchar,
        categories -> Array<Text>,
        latitude -> Nullable<Float8>,
        longitude -> Nullable<Float8>,
        is_verified -> Bool,
        kyc_status -> Text,
        /// Never negative; guarded by a CHECK constraint and conditional updates.
        diamond_balance -> Int4,
        total_rating -> Int8,
        rating_count -> Int4,
        completed_jobs -> Int4,
        is_online -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Customer service requests.
    service_requests (id) {
        id -> Uuid,
        customer_id -> Uuid,
        category -> Text,
        description -> Text,
        latitude -> Float8,
        longitude -> Float8,
        address -> Text,
        urgency -> Text,
        schedule_date -> Nullable<Date>,
        schedule_time -> Nullable<Time>,
        /// JSON array of `{kind, url}` objects.
        attachments -> Jsonb,
        status -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Priced offers; unique per `(mechanic_id, request_id)`.
    proposals (id) {
        id -> Uuid,
        request_id -> Uuid,
        mechanic_id -> Uuid,
        price -> Int4,
        estimated_minutes -> Int4,
        message -> Nullable<Text>,
        distance_km -> Nullable<Float8>,
        status -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Bookings; partial unique indexes allow one ongoing row per party.
    bookings (id) {
        id -> Uuid,
        customer_id -> Uuid,
        mechanic_id -> Uuid,
        request_id -> Uuid,
        proposal_id -> Nullable<Uuid>,
        category -> Text,
        price -> Int4,
        latitude -> Float8,
        longitude -> Float8,
        address -> Text,
        status -> Text,
        schedule_date -> Nullable<Date>,
        schedule_time -> Nullable<Time>,
        created_at -> Timestamptz,
        confirmed_at -> Nullable<Timestamptz>,
        started_at -> Nullable<Timestamptz>,
        completed_at -> Nullable<Timestamptz>,
        cancelled_at -> Nullable<Timestamptz>,
        cancelled_by -> Nullable<Text>,
        cancellation_reason -> Nullable<Text>,
        is_reviewed -> Bool,
        rating -> Nullable<Int2>,
        review_comment -> Nullable<Text>,
        live_latitude -> Nullable<Float8>,
        live_longitude -> Nullable<Float8>,
    }
}

diesel::table! {
    /// Append-only diamond ledger.
    wallet_transactions (id) {
        id -> Uuid,
        mechanic_id -> Uuid,
        kind -> Text,
        amount -> Int4,
        balance_after -> Int4,
        payment_method -> Nullable<Text>,
        reference -> Nullable<Text>,
        status -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Customer reviews, at most one per booking.
    reviews (id) {
        id -> Uuid,
        booking_id -> Uuid,
        mechanic_id -> Uuid,
        customer_id -> Uuid,
        rating -> Int2,
        comment -> Nullable<Text>,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(proposals -> service_requests (request_id));
diesel::joinable!(proposals -> mechanics (mechanic_id));
diesel::joinable!(wallet_transactions -> mechanics (mechanic_id));
diesel::joinable!(reviews -> bookings (booking_id));

diesel::allow_tables_to_appear_in_same_query!(
    bookings,
    mechanics,
    proposals,
    reviews,
    service_requests,
    wallet_transactions,
);
