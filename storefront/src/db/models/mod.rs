pub mod blog_posts;
pub mod products;
pub mod purchases;
pub mod tickets;
pub mod topups;
pub mod users;
