//! Presentation client for the Pokédex catalog.
//!
//! - [`service`]: the query-service contract, over HTTP or in-process.
//! - [`session`]: the navigation state machine.
//! - [`view`] and [`render`]: screen models and their terminal rendering.

pub mod error;
pub mod render;
pub mod service;
pub mod session;
pub mod view;

pub use error::ClientError;
pub use service::{HttpQueryService, LocalQueryService, QueryService, DEFAULT_TIMEOUT};
pub use session::{
    DetailTab, ErrorBanner, NavError, Screen, SearchOutcome, SearchState, SearchTicket, Session,
    ERROR_BANNER_TTL, LANDING_PICKS,
};
pub use view::ScreenView;
