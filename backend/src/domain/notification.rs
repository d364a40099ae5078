//! Notifications emitted by the workflow.
//!
//! Delivery is best effort. Services build a [`Notification`] and hand it to
//! the sender port after the state change has committed.

use std::collections::BTreeMap;

use serde::Serialize;

use super::wire_enum::wire_enum;
use super::{Booking, CustomerId, MechanicId, Party, Proposal, ServiceRequest};

wire_enum! {
    /// Notification type understood by client apps.
    pub enum NotificationKind as "notification kind" {
        NewServiceRequest => "new_service_request",
        NewProposal => "new_proposal",
        ProposalAccepted => "proposal_accepted",
        BookingCancelled => "booking_cancelled",
    }
}

/// Who receives a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "role", content = "id", rename_all = "snake_case")]
pub enum Recipient {
    Customer(CustomerId),
    Mechanic(MechanicId),
}

/// A push notification payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub recipient: Recipient,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub data: BTreeMap<String, String>,
}

impl Notification {
    /// Tell a nearby mechanic about a new request.
    pub fn new_service_request(
        mechanic_id: MechanicId,
        request: &ServiceRequest,
        distance_km: f64,
    ) -> Self {
        Self {
            recipient: Recipient::Mechanic(mechanic_id),
            kind: NotificationKind::NewServiceRequest,
            title: "New service request nearby".to_owned(),
            body: format!(
                "{} needed {distance_km:.2} km away",
                request.category().as_str().replace('_', " ")
            ),
            data: BTreeMap::from([
                ("requestId".to_owned(), request.id().to_string()),
                ("category".to_owned(), request.category().to_string()),
                ("distanceKm".to_owned(), format!("{distance_km:.2}")),
            ]),
        }
    }

    /// Tell the customer a mechanic has made an offer.
    pub fn new_proposal(customer_id: CustomerId, proposal: &Proposal) -> Self {
        Self {
            recipient: Recipient::Customer(customer_id),
            kind: NotificationKind::NewProposal,
            title: "New proposal received".to_owned(),
            body: format!(
                "A mechanic offered {} for about {} minutes",
                proposal.price(),
                proposal.estimated_minutes()
            ),
            data: BTreeMap::from([
                ("requestId".to_owned(), proposal.request_id().to_string()),
                ("proposalId".to_owned(), proposal.id().to_string()),
            ]),
        }
    }

    /// Tell the winning mechanic their proposal became a booking.
    pub fn proposal_accepted(booking: &Booking) -> Self {
        Self {
            recipient: Recipient::Mechanic(booking.mechanic_id()),
            kind: NotificationKind::ProposalAccepted,
            title: "Proposal accepted".to_owned(),
            body: format!("Your offer of {} was accepted", booking.price()),
            data: BTreeMap::from([
                ("bookingId".to_owned(), booking.id().to_string()),
                ("requestId".to_owned(), booking.request_id().to_string()),
            ]),
        }
    }

    /// Tell the other side of a booking that it was cancelled.
    pub fn booking_cancelled(booking: &Booking, cancelled_by: Party) -> Self {
        let recipient = match cancelled_by {
            Party::Customer => Recipient::Mechanic(booking.mechanic_id()),
            Party::Mechanic => Recipient::Customer(booking.customer_id()),
        };
        Self {
            recipient,
            kind: NotificationKind::BookingCancelled,
            title: "Booking cancelled".to_owned(),
            body: format!("The {cancelled_by} cancelled the booking"),
            data: BTreeMap::from([("bookingId".to_owned(), booking.id().to_string())]),
        }
    }
}
