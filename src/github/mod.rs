pub mod client;
pub mod tree;

pub use client::GithubClient;
pub use tree::TreeFetcher;
