use std::time::Duration;

use axum::{
    extract::{Path, RawQuery},
    http::{header, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

/// What `/echo` saw, returned as JSON.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Echo {
    pub method: String,
    pub query: Option<String>,
    pub cookie: Option<String>,
    pub content_type: Option<String>,
    pub body: String,
}

pub fn app() -> Router {
    Router::new()
        .route("/echo", any(echo))
        .route("/login", post(login))
        .route("/profile", get(profile))
        .route("/hop/{n}", get(hop))
        .route("/temporary", any(temporary))
        .route("/no-location", get(no_location))
        .route("/loop", get(redirect_loop))
        .route("/slow/{ms}", get(slow))
        .route("/status/{code}", get(status))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// Value of cookie `name` from the request's `cookie` header(s).
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v.to_string())
}

fn header_string(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn redirect(status: StatusCode, location: &str) -> Response {
    (status, [(header::LOCATION, location.to_string())]).into_response()
}

async fn echo(
    method: Method,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: String,
) -> Json<Echo> {
    Json(Echo {
        method: method.to_string(),
        query,
        cookie: header_string(&headers, header::COOKIE),
        content_type: header_string(&headers, header::CONTENT_TYPE),
        body,
    })
}

/// Form login that answers 303 See Other with a session cookie.
async fn login(body: String) -> Response {
    let user = url_user(&body).unwrap_or_else(|| "anonymous".to_string());
    (
        StatusCode::SEE_OTHER,
        [
            (header::LOCATION, "/profile".to_string()),
            (header::SET_COOKIE, format!("session={user}; Path=/; HttpOnly")),
        ],
    )
        .into_response()
}

fn url_user(body: &str) -> Option<String> {
    body.split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == "user")
        .map(|(_, v)| v.to_string())
}

async fn profile(
    method: Method,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let user = cookie_value(&headers, "session").ok_or(StatusCode::UNAUTHORIZED)?;
    Ok(Json(serde_json::json!({ "user": user, "method": method.to_string() })))
}

/// `n` more 302 hops, each setting a cookie named after its depth.
async fn hop(Path(n): Path<u32>, headers: HeaderMap) -> Response {
    if n == 0 {
        return Json(serde_json::json!({ "cookie": header_string(&headers, header::COOKIE) }))
            .into_response();
    }
    (
        StatusCode::FOUND,
        [
            (header::LOCATION, format!("/hop/{}", n - 1)),
            (header::SET_COOKIE, format!("hop{n}={n}; Path=/")),
        ],
    )
        .into_response()
}

async fn temporary() -> Response {
    redirect(StatusCode::TEMPORARY_REDIRECT, "/echo")
}

async fn no_location() -> StatusCode {
    StatusCode::FOUND
}

async fn redirect_loop() -> Response {
    redirect(StatusCode::FOUND, "/loop")
}

async fn slow(Path(ms): Path<u64>) -> &'static str {
    tokio::time::sleep(Duration::from_millis(ms)).await;
    "slow"
}

async fn status(Path(code): Path<u16>) -> Response {
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_REQUEST);
    (status, format!("status {code}")).into_response()
}
