//! Types shared between the volunteer backend and its clients.
//!
//! Nothing in this crate performs I/O. It describes the volunteer field
//! schema, the typed records produced while reconciling an uploaded sheet,
//! the outcome reported back to the caller, and the job/request payloads
//! exchanged over HTTP.

pub mod jobs;
pub mod model;
pub mod requests;
