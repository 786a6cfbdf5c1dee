//! Session store service
//!
//! A small interface built on `dcerpc` and `midl-ndr`: open a named store to
//! get a context handle, set and query typed values, enumerate them at two
//! detail levels, and close the handle.

pub mod client;
pub mod common;
pub mod schema;
pub mod server;

pub use client::SessionClient;
pub use server::{Session, SessionServer};
