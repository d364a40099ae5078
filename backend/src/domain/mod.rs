//! Domain primitives, aggregates and services for the marketplace.
//!
//! Purpose: model the request → proposal → booking workflow and the diamond
//! wallet with strongly typed entities, pure rules and services that talk to
//! the outside world only through [`ports`].
//!
//! Public surface:
//! - Entities: [`ServiceRequest`], [`Mechanic`], [`Proposal`], [`Booking`],
//!   [`Transaction`], [`Review`].
//! - Pure rules: [`distance_km`], [`rank_by_distance`], [`merge_feed`],
//!   [`filter_unanswered_requests`], [`BookingStatus::next`].
//! - Services implementing the driving ports in [`ports`].
//! - [`Error`] and [`ErrorCode`] for every fallible operation.

mod wire_enum;

pub mod booking;
pub mod category;
pub mod error;
pub mod geo;
pub mod ids;
pub mod matching;
pub mod mechanic;
pub mod notification;
pub mod ports;
pub mod proposal;
pub mod request_feed;
pub mod review;
pub mod service_request;
pub mod trace_id;
pub mod wallet;

mod booking_service;
mod matching_service;
mod mechanic_service;
mod proposal_service;
mod service_request_service;
mod wallet_service;

pub use self::booking::{
    Booking, BookingDraft, BookingReview, BookingRuleError, BookingStatus, BookingTransition,
    Cancellation, Party,
};
pub use self::booking_service::{BookingCommandService, BookingQueryService};
pub use self::category::{ServiceCategory, UnknownCategory};
pub use self::error::{Error, ErrorCode};
pub use self::geo::{
    ARRIVAL_THRESHOLD_KM, EARTH_RADIUS_KM, GeoPoint, GeoPointValidationError, Location,
    distance_km, has_arrived,
};
pub use self::ids::{
    BookingId, CustomerId, MechanicId, ProposalId, RequestId, ReviewId, TransactionId,
};
pub use self::matching::{
    DEFAULT_FAN_OUT, DEFAULT_RADIUS_KM, MatchCandidate, MatchingPolicy, rank_by_distance,
};
pub use self::matching_service::MatchingNotifier;
pub use self::mechanic::{
    KycStatus, Mechanic, MechanicDraft, MechanicValidationError, RatingAggregate,
};
pub use self::mechanic_service::{MechanicCommandService, MechanicQueryService};
pub use self::notification::{Notification, NotificationKind, Recipient};
pub use self::proposal::{
    MAX_MESSAGE_CHARS, PROPOSAL_COST_DIAMONDS, Proposal, ProposalDraft, ProposalStatus,
    ProposalValidationError, filter_unanswered_requests,
};
pub use self::proposal_service::{ProposalCommandService, ProposalQueryService, ProposalStores};
pub use self::request_feed::{DEFAULT_LIVE_WINDOW_MINUTES, FeedPolicy, merge_feed};
pub use self::review::{MAX_COMMENT_CHARS, Rating, RatingOutOfRange, Review};
pub use self::service_request::{
    Attachment, AttachmentKind, MAX_DESCRIPTION_CHARS, RequestStatus, Schedule, ServiceRequest,
    ServiceRequestDraft, ServiceRequestValidationError, Urgency,
};
pub use self::service_request_service::{ServiceRequestCommandService, ServiceRequestQueryService};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::wallet::{PaymentMethod, Transaction, TransactionKind, WalletMovement};
pub use self::wallet_service::{WalletCommandService, WalletQueryService};
pub use self::wire_enum::UnknownVariant;

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use marketplace::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<()> {
///     Err(Error::forbidden("nope"))
/// }
/// assert!(handler().is_err());
/// ```
pub type ApiResult<T> = Result<T, Error>;
