use anyhow::anyhow;
use tutordesk_core::types::{Course, CourseId};
use tutordesk_engine::traits::CourseDirectory;
use tutordesk_providers::courses::build_courses_request;
use tutordesk_providers::parse::parse_courses;

#[derive(Debug, Clone)]
pub struct CourseClient {
    api_base_url: String,
}

impl CourseClient {
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self { api_base_url: api_base_url.into() }
    }

    pub async fn fetch(&self) -> anyhow::Result<Vec<Course>> {
        let req = build_courses_request(&self.api_base_url);
        let resp = tutordesk_providers::runtime::execute(&req).await?;

        if !resp.is_success() {
            return Err(anyhow!("course directory returned status {}", resp.status));
        }

        parse_courses(&resp.body)
    }
}

#[async_trait::async_trait]
impl CourseDirectory for CourseClient {
    async fn list_courses(&self) -> anyhow::Result<Vec<Course>> {
        self.fetch().await
    }
}

/// Pick the selection after a directory refresh: keep the current course when
/// it still exists, otherwise fall back to the first listed one.
pub fn reconcile_selection(courses: &[Course], current: Option<&CourseId>) -> Option<CourseId> {
    if let Some(current) = current {
        if courses.iter().any(|c| &c.id == current) {
            return Some(current.clone());
        }
    }
    courses.first().map(|c| c.id.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn course(id: &str) -> Course {
        Course {
            id: CourseId::new(id),
            name: id.to_uppercase(),
            icon_url: None,
            description: String::new(),
        }
    }

    #[test]
    fn reconcile_keeps_a_still_present_selection() {
        let courses = vec![course("nodejs"), course("python")];
        let current = CourseId::new("python");
        assert_eq!(reconcile_selection(&courses, Some(&current)), Some(current));
    }

    #[test]
    fn reconcile_falls_back_to_first_when_gone() {
        let courses = vec![course("nodejs"), course("python")];
        let stale = CourseId::new("rust");
        assert_eq!(
            reconcile_selection(&courses, Some(&stale)),
            Some(CourseId::new("nodejs"))
        );
        assert_eq!(reconcile_selection(&courses, None), Some(CourseId::new("nodejs")));
    }

    #[test]
    fn reconcile_with_empty_directory_clears_selection() {
        let current = CourseId::new("nodejs");
        assert_eq!(reconcile_selection(&[], Some(&current)), None);
    }

    #[tokio::test]
    async fn fetch_normalizes_the_wire_shape() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/courses"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{"courses":[{"courseId":"nodejs","name":"Node.js","iconUrl":"/nodeicon.svg"}]}"#,
                "application/json",
            ))
            .mount(&server)
            .await;

        let client = CourseClient::new(server.uri());
        let courses = client.fetch().await.unwrap();
        assert_eq!(courses.len(), 1);
        assert_eq!(courses[0].id.as_str(), "nodejs");
    }

    #[tokio::test]
    async fn fetch_errors_on_failure_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/courses"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let client = CourseClient::new(server.uri());
        assert!(client.fetch().await.is_err());
    }
}
