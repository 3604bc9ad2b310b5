//! API route handlers - maps HTTP endpoints to store and remote operations.
//!
//! Each submodule defines routes for a feature area:
//! - `post`: Post CRUD (POST/PUT/GET/DELETE /post)
//! - `github`: Recursive markdown/text discovery in a remote repository (GET /github)

pub mod github;
pub mod post;

use std::sync::Arc;

use axum::Router;

use crate::db::PostStore;
use crate::github::TreeFetcher;

pub fn create_router(store: PostStore, fetcher: Arc<TreeFetcher>) -> Router {
    Router::new()
        .merge(post::routes(store))
        .merge(github::routes(fetcher))
}
