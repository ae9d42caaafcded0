//! Shared HTTP plumbing: request builders, transport, document helpers

pub mod client;
pub mod document;
pub mod parallel;
pub mod request;

pub use client::{NetworkClient, Transport};
pub use parallel::{par_flat_map_catching, par_map};
pub use request::{HttpRequest, HttpResponse, Method, RequestBody};
