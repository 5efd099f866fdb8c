//! Client for the model gateway HTTP API.

mod client;

pub use client::{ClientError, GatewayClient, Model, Route};
