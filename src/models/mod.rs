//! Request and Response models for the cache server API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing HTTP requests and responses.

mod requests;
mod responses;

pub use requests::{PeerQuery, SetRequest};
pub use responses::{GetResponse, HealthResponse, SetResponse, StatsResponse};
