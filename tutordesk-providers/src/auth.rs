use crate::request::{Body, HttpRequest, join_url, json_headers};
use serde_json::json;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterPayload {
    pub username: String,
    pub email: String,
    pub password: String,
    pub firstname: String,
    pub lastname: String,
}

pub fn build_login_request(api_base_url: &str, email: &str, password: &str) -> HttpRequest {
    let payload = json!({ "email": email, "password": password });

    HttpRequest {
        method: "POST".into(),
        url: join_url(api_base_url, "/auth/login"),
        headers: json_headers(None),
        body: Body::Json(payload.to_string()),
    }
}

pub fn build_register_request(api_base_url: &str, payload: &RegisterPayload) -> HttpRequest {
    let body = json!({
        "username": payload.username,
        "email": payload.email,
        "password": payload.password,
        "firstname": payload.firstname,
        "lastname": payload.lastname,
    });

    HttpRequest {
        method: "POST".into(),
        url: join_url(api_base_url, "/auth/register"),
        headers: json_headers(None),
        body: Body::Json(body.to_string()),
    }
}

/// Exchange a Google ID token for a backend session.
pub fn build_google_exchange_request(api_base_url: &str, id_token: &str) -> HttpRequest {
    let payload = json!({ "idToken": id_token });

    HttpRequest {
        method: "POST".into(),
        url: join_url(api_base_url, "/oauth/google"),
        headers: json_headers(None),
        body: Body::Json(payload.to_string()),
    }
}
