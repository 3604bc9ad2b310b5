//! Post CRUD endpoints.
//!
//! - POST /post { post: { title, content, source, date, meta, html } }
//!   Inserts a post. `content` may be a list of lines, joined with "\n".
//!
//! - PUT /post { post: { id, ...fields } }
//!   Overwrites the given columns as supplied. Returns { rows_affected }.
//!
//! - GET /post?col=value
//!   Equality filter from the query string, else from the JSON body, else
//!   every row. Returns { posts, query, newline }.
//!
//! - DELETE /post?id= (or body { id })
//!   Deletes one post by id. Returns { rows_affected }.

use std::collections::BTreeMap;

use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, rejection::QueryRejection, Query, State},
    routing::get,
    Json, Router,
};
use serde_json::{Map, Value};

use crate::db::PostStore;
use crate::error::{AppError, Result};
use crate::models::{
    CreatePost, CreatedPost, PostEnvelope, PostFilter, PostListResponse, RowsAffected, NEWLINE,
};

pub fn routes(store: PostStore) -> Router {
    Router::new()
        .route(
            "/post",
            get(read_posts)
                .post(create_post)
                .put(update_post)
                .delete(delete_post),
        )
        .with_state(store)
}

async fn create_post(
    State(store): State<PostStore>,
    payload: std::result::Result<Json<PostEnvelope<CreatePost>>, JsonRejection>,
) -> Result<Json<CreatedPost>> {
    let Json(PostEnvelope { post }) = payload.map_err(invalid_body)?;
    tracing::info!(title = ?post.title, "Creating post");

    let id = store.insert(&post).await?;
    Ok(Json(CreatedPost { id, post }))
}

async fn update_post(
    State(store): State<PostStore>,
    payload: std::result::Result<Json<PostEnvelope<Map<String, Value>>>, JsonRejection>,
) -> Result<Json<RowsAffected>> {
    let Json(PostEnvelope { post: mut fields }) = payload.map_err(invalid_body)?;
    let id = identifier(fields.remove("id"))?;
    tracing::info!(id, columns = ?fields.keys().collect::<Vec<_>>(), "Updating post");

    let rows_affected = store.update(id, fields).await?;
    Ok(Json(RowsAffected { rows_affected }))
}

async fn read_posts(
    State(store): State<PostStore>,
    query: std::result::Result<Query<BTreeMap<String, String>>, QueryRejection>,
    body: Bytes,
) -> Result<Json<PostListResponse>> {
    let filter = PostFilter(request_filter(query, &body)?);
    tracing::info!(query = %filter.echo(), "Searching posts");

    let posts = store.find(&filter).await?;
    Ok(Json(PostListResponse {
        posts,
        query: filter.echo(),
        newline: NEWLINE,
    }))
}

async fn delete_post(
    State(store): State<PostStore>,
    query: std::result::Result<Query<BTreeMap<String, String>>, QueryRejection>,
    body: Bytes,
) -> Result<Json<RowsAffected>> {
    let id = match request_filter(query, &body)? {
        Some(mut filter) => identifier(filter.remove("id"))?,
        None => identifier(None)?,
    };
    tracing::info!(id, "Deleting post");

    let rows_affected = store.delete(id).await?;
    Ok(Json(RowsAffected { rows_affected }))
}

/// Query parameters when there are any, else a non-empty JSON object body.
fn request_filter(
    query: std::result::Result<Query<BTreeMap<String, String>>, QueryRejection>,
    body: &[u8],
) -> Result<Option<Map<String, Value>>> {
    let Query(query) = query.map_err(|e| AppError::InvalidRequest(e.body_text()))?;
    if !query.is_empty() {
        return Ok(Some(
            query.into_iter().map(|(k, v)| (k, Value::String(v))).collect(),
        ));
    }

    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) if !map.is_empty() => Ok(Some(map)),
        Ok(Value::Object(_)) => Ok(None),
        Ok(_) => Err(AppError::InvalidRequest("body must be a JSON object".to_string())),
        Err(e) => Err(AppError::InvalidRequest(format!("malformed JSON body: {}", e))),
    }
}

fn identifier(value: Option<Value>) -> Result<i64> {
    match value {
        None | Some(Value::Null) => Err(AppError::MissingIdentifier(
            "request carries no post id".to_string(),
        )),
        Some(Value::Number(n)) => n
            .as_i64()
            .ok_or_else(|| AppError::InvalidRequest(format!("id {} is not an integer", n))),
        Some(Value::String(s)) => s
            .trim()
            .parse()
            .map_err(|_| AppError::InvalidRequest(format!("id {:?} is not an integer", s))),
        Some(other) => Err(AppError::InvalidRequest(format!(
            "id {} is not an integer",
            other
        ))),
    }
}

fn invalid_body(rejection: JsonRejection) -> AppError {
    AppError::InvalidRequest(rejection.body_text())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use serde_json::json;
    use tower::util::ServiceExt;

    async fn app() -> Router {
        routes(PostStore::open_in_memory().await.unwrap())
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = app
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn create_then_read_scenario() {
        let app = app().await;

        let (status, created) = send(
            &app,
            Method::POST,
            "/post",
            Some(json!({"post": {"title": "A", "content": ["line1", "line2"], "meta": {"tag": "x"}}})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(created["title"], "A");
        assert_eq!(created["content"], json!(["line1", "line2"]));
        assert_eq!(created["meta"], json!({"tag": "x"}));

        let id = created["id"].as_i64().unwrap();
        let (status, listed) = send(&app, Method::GET, &format!("/post?id={}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed["query"], json!({"id": id.to_string()}));
        assert_eq!(listed["newline"], "\n");
        assert_eq!(listed["posts"][0]["content"], "line1\nline2");
        assert_eq!(listed["posts"][0]["meta"], json!({"tag": "x"}));
    }

    #[tokio::test]
    async fn read_without_filter_returns_everything() {
        let app = app().await;
        for title in ["X", "Y"] {
            send(&app, Method::POST, "/post", Some(json!({"post": {"title": title}}))).await;
        }

        let (_, all) = send(&app, Method::GET, "/post", None).await;
        assert_eq!(all["query"], json!(true));
        assert_eq!(all["posts"].as_array().unwrap().len(), 2);

        let (_, xs) = send(&app, Method::GET, "/post", Some(json!({"title": "X"}))).await;
        assert_eq!(xs["posts"].as_array().unwrap().len(), 1);
        assert_eq!(xs["posts"][0]["title"], "X");
    }

    #[tokio::test]
    async fn update_reports_rows_affected() {
        let app = app().await;
        let (_, created) =
            send(&app, Method::POST, "/post", Some(json!({"post": {"title": "old"}}))).await;
        let id = created["id"].clone();

        let (status, updated) = send(
            &app,
            Method::PUT,
            "/post",
            Some(json!({"post": {"id": id, "title": "new"}})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated, json!({"rows_affected": 1}));

        let (status, missing) = send(
            &app,
            Method::PUT,
            "/post",
            Some(json!({"post": {"id": 4242, "title": "new"}})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(missing, json!({"rows_affected": 0}));
    }

    #[tokio::test]
    async fn bad_date_update_leaves_reads_working() {
        let app = app().await;
        send(&app, Method::POST, "/post", Some(json!({"post": {"title": "keep"}}))).await;
        let (_, victim) =
            send(&app, Method::POST, "/post", Some(json!({"post": {"title": "victim"}}))).await;

        let (status, body) = send(
            &app,
            Method::PUT,
            "/post",
            Some(json!({"post": {"id": victim["id"], "date": "yesterday"}})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["err"]["kind"], "invalid_request");

        let (status, all) = send(&app, Method::GET, "/post", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(all["posts"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn update_without_id_is_missing_identifier() {
        let app = app().await;
        let (status, body) =
            send(&app, Method::PUT, "/post", Some(json!({"post": {"title": "t"}}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["err"]["kind"], "missing_identifier");
    }

    #[tokio::test]
    async fn delete_by_query_or_body() {
        let app = app().await;
        let (_, a) = send(&app, Method::POST, "/post", Some(json!({"post": {}}))).await;
        let (_, b) = send(&app, Method::POST, "/post", Some(json!({"post": {}}))).await;

        let (_, removed) =
            send(&app, Method::DELETE, &format!("/post?id={}", a["id"]), None).await;
        assert_eq!(removed, json!({"rows_affected": 1}));

        let (_, removed) =
            send(&app, Method::DELETE, "/post", Some(json!({"id": b["id"]}))).await;
        assert_eq!(removed, json!({"rows_affected": 1}));

        let (_, again) = send(&app, Method::DELETE, "/post", Some(json!({"id": b["id"]}))).await;
        assert_eq!(again, json!({"rows_affected": 0}));
    }

    #[tokio::test]
    async fn delete_without_id_is_rejected() {
        let app = app().await;
        send(&app, Method::POST, "/post", Some(json!({"post": {}}))).await;

        let (status, body) = send(&app, Method::DELETE, "/post", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["err"]["kind"], "missing_identifier");

        let (status, body) = send(&app, Method::DELETE, "/post?id=abc", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["err"]["kind"], "invalid_request");

        let (_, all) = send(&app, Method::GET, "/post", None).await;
        assert_eq!(all["posts"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn store_errors_use_err_shape() {
        let app = app().await;
        let (status, body) = send(&app, Method::GET, "/post?nope=1", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["err"]["kind"], "store_read");
    }

    #[tokio::test]
    async fn malformed_create_body_uses_err_shape() {
        let app = app().await;
        let (status, body) = send(&app, Method::POST, "/post", Some(json!({"title": "no envelope"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["err"]["kind"], "invalid_request");
    }

    #[test]
    fn identifier_accepts_numbers_and_numeric_strings() {
        assert_eq!(identifier(Some(json!(7))).unwrap(), 7);
        assert_eq!(identifier(Some(json!("8"))).unwrap(), 8);
        assert!(matches!(identifier(None), Err(AppError::MissingIdentifier(_))));
        assert!(matches!(identifier(Some(json!(1.5))), Err(AppError::InvalidRequest(_))));
    }
}
