//! Data transfer objects (DTOs) for API requests and responses.
//!
//! - `post`: CreatePost, PostContent, Post and the gateway response bodies
//! - `tree`: LocationParams, RemoteEntry, TreeEntry for the repository walk

pub mod post;
pub mod tree;

pub use post::*;
pub use tree::*;
