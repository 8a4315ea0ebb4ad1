//! HTTP access to the calendar backend

pub mod client;
pub mod models;
pub mod single_flight;
pub mod transport;

pub use client::ApiClient;
pub use single_flight::SingleFlight;
pub use transport::{ApiRequest, ApiResponse, ReqwestTransport, Transport};

/// Obtain a token pair
pub const LOGIN_PATH: &str = "/api/token/";
/// Exchange a refresh token for a new access token
pub const REFRESH_PATH: &str = "/api/token/refresh/";
pub const REGISTER_PATH: &str = "/api/user/register/";
