//! Driving adapters: the REST API under [`http`] and the live request feed
//! under [`ws`]. Both translate wire payloads into port calls and keep actix
//! types out of the domain.

pub mod http;
pub mod ws;
