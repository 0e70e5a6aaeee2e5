//! Client-side core for the item sourcing workflow.
//!
//! [`ItemWorkflow`] is a reducer over named events holding the last snapshot
//! fetched from the backend; [`WorkflowController`] drives intents through a
//! [`Backend`] and refetches after each one.

pub mod backend;
pub mod controller;
pub mod error;
pub mod http;
pub mod state;

pub use backend::{dispatch, Backend};
pub use controller::WorkflowController;
pub use error::{ClientError, ClientResult};
pub use http::{Credential, HttpBackend};
pub use state::{Applied, ItemWorkflow, RequestTag, Snapshot, WorkflowEvent};
