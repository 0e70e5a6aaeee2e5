//! Authoritative item state for the sourcing workflow: requester commands,
//! supplier submissions and back-office payment confirmation, served over HTTP.

pub mod api;
pub mod back_office;
pub mod error;
pub mod handlers;
pub mod models;
pub mod store;

pub use api::{create_router, AppState};
pub use error::{ServiceError, ServiceResult};
