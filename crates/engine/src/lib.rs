//! Event acceptance and dispatch for Herald.
//!
//! [`validator::EventValidator`] decides whether an inbound payload becomes an
//! [`Event`](herald_common::types::Event); [`dispatcher::Dispatcher`] turns an
//! accepted event into one independent delivery per recipient.

pub mod composer;
pub mod directory;
pub mod dispatcher;
pub mod timestamp;
pub mod validator;
