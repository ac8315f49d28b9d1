//! Personnel change requests (event-sourced).
//!
//! A request records intent to create or remove a staff account. Resolving it
//! is a one-shot transition; carrying out the change is someone else's job.

pub mod request;

pub use request::{
    Decision, PersonnelCommand, PersonnelEvent, PersonnelRequest, PersonnelRequestId,
    RequestResolved, RequestStatus, RequestSubmitted, RequestType, ResolveRequest, SubmitRequest,
};
