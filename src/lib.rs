//! Ticket Desk - client core for course help-desk tickets and FAQs.
//!
//! The crate holds everything below the rendering layer: the REST client
//! and resource services, the session store, local/session storage, routing
//! and one view model per screen. An embedding shell renders view state and
//! forwards user input to the view methods.

pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod models;
pub mod router;
pub mod services;
pub mod views;

pub use config::AppConfig;
pub use context::AppContext;
pub use error::AppError;
pub use router::{HistoryNavigator, NavigationState, Navigator, Route};
