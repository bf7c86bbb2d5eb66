pub mod chat;
pub mod location;
pub mod place;
pub mod rating;
pub mod restaurant;
pub mod route;
pub mod search;
pub mod user;
