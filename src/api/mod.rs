mod client;
mod errors;

#[cfg(test)]
mod tests;

pub use client::{AuthResponse, EmbyApi, EmbyUser};
pub use errors::ApiError;
