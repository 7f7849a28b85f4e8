pub mod aggregate;
pub mod auth;
pub mod engagement;
pub mod error;
pub mod feed;
pub mod posts;
pub mod profiles;
pub mod ratings;
pub mod store;
