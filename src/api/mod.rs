//! REST client module for the scholarship backend

mod client;
mod traits;

pub use client::{ApiClient, ApiError, DEFAULT_API_URL};
pub use traits::ApiClientTrait;

#[cfg(test)]
pub use traits::MockApiClientTrait;
