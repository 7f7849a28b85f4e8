pub mod engagement;
pub mod post;
pub mod rating;
pub mod user;
