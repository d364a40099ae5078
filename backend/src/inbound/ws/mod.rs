//! WebSocket inbound adapter streaming the mechanic request feed.
//!
//! Responsibilities:
//! - validate upgrade requests against the configured origin allow-list
//! - resolve which category feed the socket follows
//! - hand the connection to a per-socket session task

use actix_web::http::header::{HeaderValue, ORIGIN};
use actix_web::web::{self, Payload};
use actix_web::{HttpRequest, HttpResponse, get};
use serde::Deserialize;
use tracing::{error, warn};
use url::Url;

use crate::domain::{MechanicId, ServiceCategory, TraceId};
use crate::inbound::http::validation::{FieldName, parse_id, parse_wire};

mod session;

pub mod messages;
pub mod state;

use session::FeedTarget;
use state::{OriginAllowList, WsState};

/// Optional narrowing of the feed to one mechanic's unanswered requests.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedSocketQuery {
    pub mechanic_id: Option<String>,
}

/// Handle WebSocket upgrade for `/ws/requests/{category}`.
#[get("/ws/requests/{category}")]
pub async fn ws_entry(
    state: web::Data<WsState>,
    path: web::Path<String>,
    query: web::Query<FeedSocketQuery>,
    req: HttpRequest,
    stream: Payload,
) -> actix_web::Result<HttpResponse> {
    let mut origin_iter = req.headers().get_all(ORIGIN);
    let origin_header = origin_iter.next().ok_or_else(|| {
        error!("Missing Origin header on WebSocket upgrade");
        actix_web::error::ErrorForbidden("Origin not allowed")
    })?;
    if origin_iter.next().is_some() {
        error!("Multiple Origin headers on WebSocket upgrade");
        return Err(actix_web::error::ErrorBadRequest("Invalid Origin header"));
    }
    validate_origin(&state.allowed_origins, origin_header)?;

    let target = FeedTarget {
        category: parse_wire::<ServiceCategory>(&path, FieldName::new("category"))?,
        mechanic_id: query
            .into_inner()
            .mechanic_id
            .map(|raw| parse_id::<MechanicId>(&raw, FieldName::new("mechanicId")))
            .transpose()?,
    };

    let (response, session, messages) = actix_ws::handle(&req, stream).map_err(|error| {
        error!(error = %error, "WebSocket upgrade failed");
        actix_web::error::ErrorInternalServerError("WebSocket upgrade failed")
    })?;
    actix_web::rt::spawn(TraceId::scope(
        TraceId::current_or_generate(),
        session::handle_feed_session(
            state.requests_query.clone(),
            target,
            state.refresh_interval,
            session,
            messages,
        ),
    ));
    Ok(response)
}

fn validate_origin(
    allowed: &OriginAllowList,
    origin_header: &HeaderValue,
) -> actix_web::Result<()> {
    let origin_value = match origin_header.to_str() {
        Ok(value) => value,
        Err(error) => {
            error!(error = %error, "Failed to parse Origin header as string");
            return Err(actix_web::error::ErrorBadRequest("Invalid Origin header"));
        }
    };

    let origin = Url::parse(origin_value).map_err(|error| {
        error!(error = %error, "Failed to parse Origin header as URL");
        actix_web::error::ErrorBadRequest("Invalid Origin header")
    })?;

    if allowed.allows(&origin) {
        Ok(())
    } else {
        warn!(
            origin = origin_value,
            "Rejected WS upgrade due to disallowed Origin"
        );
        Err(actix_web::error::ErrorForbidden("Origin not allowed"))
    }
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use rstest::rstest;

    use super::*;

    fn header(value: &str) -> HeaderValue {
        HeaderValue::from_str(value).expect("valid header value")
    }

    fn production() -> OriginAllowList {
        OriginAllowList::new(["https://app.mechanics.example"])
    }

    #[rstest]
    #[case("https://app.mechanics.example")]
    fn accepts_configured_origins(#[case] origin: &str) {
        assert!(validate_origin(&production(), &header(origin)).is_ok());
    }

    #[rstest]
    #[case("http://localhost:3000")]
    #[case("https://example.com")]
    #[case("wss://app.mechanics.example")]
    fn rejects_disallowed_origins(#[case] origin: &str) {
        let error = validate_origin(&production(), &header(origin))
            .expect_err("origin should be rejected");
        assert_eq!(
            error.as_response_error().status_code(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn rejects_non_utf8_origin_header() {
        let header = HeaderValue::from_bytes(&[0x80]).expect("opaque header value");
        let error = validate_origin(&production(), &header).expect_err("origin should be rejected");
        assert_eq!(
            error.as_response_error().status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn rejects_unparsable_origin_header() {
        let header = HeaderValue::from_static("not a url");
        let error = validate_origin(&production(), &header).expect_err("origin should be rejected");
        assert_eq!(
            error.as_response_error().status_code(),
            StatusCode::BAD_REQUEST
        );
    }
}
