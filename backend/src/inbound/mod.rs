//! Inbound adapters that translate external requests into domain service
//! calls while keeping framework details at the edge.
//!
//! Both HTTP surfaces and the Telegram webhook live under [`http`]; the
//! long-polling bot loop is an outbound concern.

pub mod http;
