//! Remote repository walk.
//!
//! - GET /github?owner=&repo=&path=&ref=
//!   Walks the repository tree below `path` and returns every markdown and
//!   text file found, each tagged with the params of the listing it came from.

use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    routing::get,
    Json, Router,
};

use crate::error::{AppError, Result};
use crate::github::TreeFetcher;
use crate::models::{LocationParams, TreeResponse};

pub fn routes(fetcher: Arc<TreeFetcher>) -> Router {
    Router::new()
        .route("/github", get(fetch_text_files))
        .with_state(fetcher)
}

async fn fetch_text_files(
    State(fetcher): State<Arc<TreeFetcher>>,
    query: std::result::Result<Query<LocationParams>, QueryRejection>,
) -> Result<Json<TreeResponse>> {
    let Query(params) = query.map_err(|e| AppError::InvalidRequest(e.body_text()))?;
    tracing::info!(owner = %params.owner, repo = %params.repo, path = %params.path, "Fetching repository files");

    let data = fetcher.fetch_text_files(&params).await?;
    tracing::debug!("Found {} text files", data.len());

    Ok(Json(TreeResponse { data, params }))
}
