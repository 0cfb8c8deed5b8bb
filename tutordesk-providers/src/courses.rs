use crate::request::{Body, HttpRequest, join_url};

/// The course directory is public; no authorization header.
pub fn build_courses_request(api_base_url: &str) -> HttpRequest {
    HttpRequest {
        method: "GET".into(),
        url: join_url(api_base_url, "/courses"),
        headers: vec![("Accept".into(), "application/json".into())],
        body: Body::Empty,
    }
}
