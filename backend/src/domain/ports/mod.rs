//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (`*Repository`, senders, sources, stores) are implemented by
//! outbound adapters. Driving ports (`*Command`, `*Query`) are implemented by
//! domain services and consumed by inbound adapters.

mod macros;
pub(crate) use macros::define_port_error;

mod attachment_store;
mod booking_command;
mod booking_query;
mod booking_repository;
mod mechanic_command;
mod mechanic_query;
mod mechanic_repository;
mod notification_sender;
mod proposal_command;
mod proposal_query;
mod proposal_repository;
mod request_event_bus;
mod route_estimate_source;
mod service_request_command;
mod service_request_query;
mod service_request_repository;
mod wallet_command;
mod wallet_query;
mod wallet_repository;

#[cfg(test)]
pub use attachment_store::MockAttachmentStore;
pub use attachment_store::{
    AttachmentStore, AttachmentStoreError, AttachmentUpload, FixtureAttachmentStore,
    MAX_ATTACHMENT_BYTES,
};
#[cfg(test)]
pub use booking_command::MockBookingCommand;
pub use booking_command::{
    BookingActor, BookingCommand, DirectBookingRequest, LiveLocationUpdate, SubmitReviewRequest,
};
#[cfg(test)]
pub use booking_query::MockBookingQuery;
pub use booking_query::BookingQuery;
#[cfg(test)]
pub use booking_repository::MockBookingRepository;
pub use booking_repository::{BookingRepository, BookingRepositoryError};
#[cfg(test)]
pub use mechanic_command::MockMechanicCommand;
pub use mechanic_command::{MechanicCommand, RegisterMechanicRequest};
#[cfg(test)]
pub use mechanic_query::MockMechanicQuery;
pub use mechanic_query::MechanicQuery;
#[cfg(test)]
pub use mechanic_repository::MockMechanicRepository;
pub use mechanic_repository::{MechanicRepository, MechanicRepositoryError};
#[cfg(test)]
pub use notification_sender::MockNotificationSender;
pub use notification_sender::{
    FixtureNotificationSender, NotificationSender, NotificationSenderError,
};
#[cfg(test)]
pub use proposal_command::MockProposalCommand;
pub use proposal_command::{
    AcceptProposalRequest, ProposalCommand, SubmitProposalRequest, SubmitProposalResponse,
};
#[cfg(test)]
pub use proposal_query::MockProposalQuery;
pub use proposal_query::ProposalQuery;
#[cfg(test)]
pub use proposal_repository::MockProposalRepository;
pub use proposal_repository::{ProposalRepository, ProposalRepositoryError};
#[cfg(test)]
pub use request_event_bus::MockRequestEventBus;
pub use request_event_bus::{RequestChanged, RequestEventBus};
#[cfg(test)]
pub use route_estimate_source::MockRouteEstimateSource;
pub use route_estimate_source::{RouteEstimate, RouteEstimateSource, RouteEstimateSourceError};
#[cfg(test)]
pub use service_request_command::MockServiceRequestCommand;
pub use service_request_command::{
    CreateServiceRequestRequest, CreateServiceRequestResponse, ServiceRequestCommand,
};
#[cfg(test)]
pub use service_request_query::MockServiceRequestQuery;
pub use service_request_query::{FeedSignal, RequestFeedSubscription, ServiceRequestQuery};
#[cfg(test)]
pub use service_request_repository::MockServiceRequestRepository;
pub use service_request_repository::{ServiceRequestRepository, ServiceRequestRepositoryError};
#[cfg(test)]
pub use wallet_command::MockWalletCommand;
pub use wallet_command::{CreditPurchaseRequest, DebitRequest, RefundRequest, WalletCommand};
#[cfg(test)]
pub use wallet_query::MockWalletQuery;
pub use wallet_query::WalletQuery;
#[cfg(test)]
pub use wallet_repository::MockWalletRepository;
pub use wallet_repository::{WalletRepository, WalletRepositoryError};
