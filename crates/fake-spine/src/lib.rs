//! # Fake Spine
//!
//! HTTP test double for the messaging spine. Incoming requests are checked
//! against an ordered list of [`RequestMatcher`]s; the first match wins and
//! its canned [`SpineResponse`] is returned. Requests nothing matches get a
//! 500.
//!
//! ```rust,ignore
//! let mapper = SpineRequestResponseMapper::default()
//!     .with(
//!         message_id_matcher("ack-for-123", "123"),
//!         SpineResponse::new(StatusCode::ACCEPTED, "<Ack/>"),
//!     );
//! fake_spine::serve(&FakeSpineConfig::from_env(), Arc::new(mapper)).await?;
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod errors;
pub mod matching;
pub mod server;
pub mod wrappers;

pub use config::FakeSpineConfig;
pub use errors::{MatcherError, SpineError};
pub use matching::{RequestMatcher, SpineRequest, SpineRequestResponseMapper, SpineResponse};
pub use server::{router, serve};
pub use wrappers::{body_contains_message_id, message_id_matcher, WS_ADDRESSING_NS};
