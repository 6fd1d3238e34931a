pub mod blog_posts;
pub mod products;
pub mod purchases;
pub mod repository;
pub mod tickets;
pub mod topups;
pub mod users;

pub use blog_posts::BlogPosts;
pub use products::Products;
pub use purchases::Purchases;
pub use repository::Repository;
pub use tickets::Tickets;
pub use topups::TopUps;
pub use users::Users;
