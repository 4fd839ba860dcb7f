//! HTTP API handlers for pgc-an
//!
//! Page contexts push documents and mutations, the control surface sends
//! protocol messages, and the overlay is observable over REST and SSE.

pub mod health;
pub mod messages;
pub mod overlay;
pub mod page;
pub mod sse;

pub use health::health_routes;
pub use messages::message_routes;
pub use overlay::overlay_routes;
pub use page::page_routes;
pub use sse::event_stream;
