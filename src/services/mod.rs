//! Business logic services.
//!
//! This module contains the session store, the REST client and the resource
//! services built on it, the polling loop and the attachment widget.

pub mod api_client;
pub mod attachments;
pub mod auth_service;
pub mod course_service;
pub mod endpoints;
pub mod error_handler;
pub mod localization;
pub mod polling;
pub mod store;
pub mod ticket_service;

pub use api_client::{ApiClient, ApiClientConfig};
pub use attachments::{AttachmentWidget, WidgetState};
pub use auth_service::AuthService;
pub use course_service::CourseService;
pub use error_handler::{ErrorHandler, ErrorNotification};
pub use localization::{Language, Localizer};
pub use polling::{PollHandle, PollTrigger, Poller};
pub use store::{Store, StoreMessage, Tracker};
pub use ticket_service::TicketService;
