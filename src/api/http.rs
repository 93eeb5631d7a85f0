// ABOUTME: reqwest-backed control-plane client implementing the ControlPlane
// ABOUTME: trait over a small JSON API rooted at the configured URL.

use super::{
    ApiError, ControlPlane, CreatePipeline, PipelineRecord, PipelineUpdate, Token,
};
use crate::types::PipelineId;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;

/// HTTP client for the control plane.
pub struct HttpControlPlane {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct CreatedPipeline {
    pipeline_id: String,
}

#[derive(Deserialize)]
struct PipelineList {
    pipelines: Vec<String>,
}

#[derive(serde::Serialize)]
struct CloudLaunch<'a> {
    env: &'a HashMap<String, String>,
    is_migration: bool,
}

impl HttpControlPlane {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        match status.as_u16() {
            401 | 403 => Err(ApiError::Unauthorized(body)),
            404 => Err(ApiError::NotFound(body)),
            _ => Err(ApiError::Protocol(format!("{status}: {body}"))),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ApiError::Protocol(e.to_string())
        } else {
            ApiError::Transport(e.to_string())
        }
    }
}

#[async_trait]
impl ControlPlane for HttpControlPlane {
    async fn create_pipeline(
        &self,
        token: &Token,
        request: &CreatePipeline,
    ) -> Result<PipelineId, ApiError> {
        let response = self
            .client
            .post(self.url("pipelines"))
            .bearer_auth(token.as_str())
            .json(request)
            .send()
            .await?;
        let created: CreatedPipeline = Self::check(response).await?.json().await?;
        Ok(PipelineId::new(created.pipeline_id))
    }

    async fn save_serialization(
        &self,
        token: &Token,
        id: &PipelineId,
        serialization: &str,
    ) -> Result<(), ApiError> {
        let response = self
            .client
            .put(self.url(&format!("pipelines/{id}/serialization")))
            .bearer_auth(token.as_str())
            .body(serialization.to_string())
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn update_pipeline(
        &self,
        token: &Token,
        id: &PipelineId,
        update: &PipelineUpdate,
    ) -> Result<(), ApiError> {
        let response = self
            .client
            .patch(self.url(&format!("pipelines/{id}")))
            .bearer_auth(token.as_str())
            .json(update)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn get_pipeline(
        &self,
        token: &Token,
        id: &PipelineId,
    ) -> Result<PipelineRecord, ApiError> {
        let response = self
            .client
            .get(self.url(&format!("pipelines/{id}")))
            .bearer_auth(token.as_str())
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn list_pipelines(&self, token: &Token) -> Result<Vec<PipelineId>, ApiError> {
        let response = self
            .client
            .get(self.url("pipelines"))
            .bearer_auth(token.as_str())
            .send()
            .await?;
        let list: PipelineList = Self::check(response).await?.json().await?;
        Ok(list.pipelines.into_iter().map(PipelineId::new).collect())
    }

    async fn launch_cloud_manager(
        &self,
        token: &Token,
        id: &PipelineId,
        env: &HashMap<String, String>,
        is_migration: bool,
    ) -> Result<(), ApiError> {
        let response = self
            .client
            .post(self.url(&format!("pipelines/{id}/launch")))
            .bearer_auth(token.as_str())
            .json(&CloudLaunch { env, is_migration })
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}
