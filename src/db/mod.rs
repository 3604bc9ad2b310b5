pub mod posts;
pub mod schema;

pub use posts::PostStore;
