//! 文档存储投递
//!
//! 生成的文档可选地推送到外部文件存储服务，投递失败只记录日志。

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::{Map, Value};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// 投递错误
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("HTTP 请求失败: {0}")]
    Http(#[from] reqwest::Error),

    #[error("存储服务返回错误 ({status}): {message}")]
    Rejected { status: u16, message: String },
}

/// 文档投递目标
#[async_trait]
pub trait DocumentationSink: Send + Sync {
    async fn save(
        &self,
        file_name: &str,
        content: &str,
        metadata: &Map<String, Value>,
    ) -> Result<(), SinkError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SaveFileRequest<'a> {
    file_name: &'a str,
    content: &'a str,
    metadata: &'a Map<String, Value>,
}

/// 通过 HTTP 投递到文件存储服务
pub struct HttpDocumentationSink {
    client: Client,
    endpoint: String,
}

impl HttpDocumentationSink {
    pub fn new(base_url: &str) -> Result<Self, SinkError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/api/files/save", base_url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl DocumentationSink for HttpDocumentationSink {
    async fn save(
        &self,
        file_name: &str,
        content: &str,
        metadata: &Map<String, Value>,
    ) -> Result<(), SinkError> {
        debug!("Saving documentation to {}", self.endpoint);
        let response = self
            .client
            .post(&self.endpoint)
            .json(&SaveFileRequest {
                file_name,
                content,
                metadata,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SinkError::Rejected {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        info!("Documentation saved successfully: {}", file_name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    #[tokio::test]
    async fn test_posts_file_payload() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/files/save")
            .match_body(Matcher::Json(json!({
                "fileName": "api.md",
                "content": "# API",
                "metadata": {"project": "users"}
            })))
            .with_status(200)
            .create_async()
            .await;

        let sink = HttpDocumentationSink::new(&format!("{}/", server.url())).unwrap();
        let mut metadata = Map::new();
        metadata.insert("project".to_string(), json!("users"));
        sink.save("api.md", "# API", &metadata).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_rejection_is_reported() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/files/save")
            .with_status(503)
            .with_body("down")
            .create_async()
            .await;

        let sink = HttpDocumentationSink::new(&server.url()).unwrap();
        let err = sink.save("a.md", "x", &Map::new()).await.unwrap_err();
        assert!(matches!(err, SinkError::Rejected { status: 503, .. }));
    }
}
