use anyhow::anyhow;
use thiserror::Error;
use tutordesk_core::types::CourseId;
use tutordesk_providers::admin::{
    AdminConfig, CourseUpsert, IngestFile, build_create_course_request, build_delete_course_request,
    build_ingest_request, build_insights_request,
};
use tutordesk_providers::parse::{IngestReport, parse_ingest_report, parse_insights};

/// Ingestion failures keep the partial progress log so the operator can see
/// how far the run got before it died.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct IngestError {
    pub message: String,
    pub progress: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct AdminClient {
    cfg: AdminConfig,
}

impl AdminClient {
    pub fn new(api_base_url: impl Into<String>, bearer_token: Option<String>) -> Self {
        Self {
            cfg: AdminConfig {
                api_base_url: api_base_url.into(),
                bearer_token,
            },
        }
    }

    /// Usage analytics, rendered by the shell as-is.
    pub async fn insights(&self) -> anyhow::Result<serde_json::Value> {
        let req = build_insights_request(&self.cfg);
        let resp = tutordesk_providers::runtime::execute(&req).await?;

        if !resp.is_success() {
            return Err(anyhow!(server_message(&resp.body)
                .unwrap_or_else(|| "Failed to load insights".into())));
        }

        parse_insights(&resp.body)
    }

    pub async fn create_course(&self, course: &CourseUpsert) -> anyhow::Result<()> {
        let req = build_create_course_request(&self.cfg, course);
        let resp = tutordesk_providers::runtime::execute(&req).await?;

        if !resp.is_success() {
            return Err(anyhow!(
                server_message(&resp.body).unwrap_or_else(|| "Create failed".into())
            ));
        }
        Ok(())
    }

    pub async fn delete_course(&self, course: &CourseId) -> anyhow::Result<()> {
        let req = build_delete_course_request(&self.cfg, course);
        let resp = tutordesk_providers::runtime::execute(&req).await?;

        if !resp.is_success() {
            return Err(anyhow!(
                server_message(&resp.body).unwrap_or_else(|| "Delete failed".into())
            ));
        }
        Ok(())
    }

    pub async fn ingest(
        &self,
        course: &CourseId,
        files: &[IngestFile],
        force_recreate: bool,
    ) -> Result<IngestReport, IngestError> {
        let req = build_ingest_request(&self.cfg, course, files, force_recreate);
        let resp = tutordesk_providers::runtime::execute(&req)
            .await
            .map_err(|e| IngestError {
                message: e.to_string(),
                progress: Vec::new(),
            })?;

        let report = parse_ingest_report(&resp.body);

        if !resp.is_success() {
            return Err(IngestError {
                message: report
                    .message
                    .clone()
                    .unwrap_or_else(|| "Ingestion failed".into()),
                progress: report.progress,
            });
        }

        Ok(report)
    }
}

fn server_message(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    value.get("message")?.as_str().map(str::to_string)
}
