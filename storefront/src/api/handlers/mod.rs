pub mod auth;
pub mod blog;
pub mod products;
pub mod purchases;
pub mod tickets;
pub mod topups;
pub mod users;
