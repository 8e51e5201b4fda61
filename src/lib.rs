mod auth;
mod clock;
mod config;
mod error;
mod redis_store;
mod routes;
mod store;
mod types;

pub use auth::*;
pub use clock::*;
pub use config::*;
pub use error::*;
pub use redis_store::*;
pub use routes::*;
pub use store::*;
pub use types::*;
