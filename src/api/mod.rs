pub mod api_types;
pub mod auth;
pub mod client;
pub mod error;
pub mod payload;
pub mod types;

pub use auth::AuthClient;
pub use client::{http_client, ResourceClient};
pub use error::ApiError;
pub use payload::{ImageUpload, Payload};
pub use types::{DeleteReceipt, ListQuery, ListResult, Pagination, User};
