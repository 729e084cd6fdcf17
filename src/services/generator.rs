//! 文档生成服务
//!
//! 切分源码 → 组装提示词 → 调用 LLM → 返回文档，可选投递到文件存储服务。

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::prompts::{assemble, DOC_GENERATION_SYSTEM_PROMPT};
use super::segmenter::{CodeSource, FallbackReason, FunctionUnit, SegmenterRegistry};
use super::sink::DocumentationSink;
use super::templates::DocumentationTemplate;
use super::request_id;
use crate::llm::{ChatMessage, ChatOptions, LlmError, ProviderKind, ProviderRegistry};

/// 默认保存文件名
pub const DEFAULT_FILE_NAME: &str = "generated_documentation.md";

/// 文档生成请求
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentationRequest {
    pub template: DocumentationTemplate,
    #[serde(default)]
    pub code_sources: Vec<CodeSource>,
    #[serde(default)]
    pub text_descriptions: Vec<String>,
    #[serde(default)]
    pub specifications: Vec<String>,
}

/// 单个源文件的切分摘要
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceSummary {
    pub file_name: String,
    pub language: Option<String>,
    pub units: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<FallbackReason>,
}

/// 生成结果
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedDocumentation {
    pub request_id: String,
    pub documentation: String,
    pub model: String,
    pub provider: ProviderKind,
    pub sources: Vec<SourceSummary>,
}

/// 投递选项
#[derive(Debug, Clone, Default)]
pub struct SaveOptions {
    pub file_name: Option<String>,
    pub metadata: Map<String, Value>,
}

/// 文档生成器
pub struct DocumentationGenerator {
    segmenters: Arc<SegmenterRegistry>,
    providers: Arc<ProviderRegistry>,
    sink: Option<Arc<dyn DocumentationSink>>,
}

impl DocumentationGenerator {
    pub fn new(segmenters: Arc<SegmenterRegistry>, providers: Arc<ProviderRegistry>) -> Self {
        Self {
            segmenters,
            providers,
            sink: None,
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn DocumentationSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn has_sink(&self) -> bool {
        self.sink.is_some()
    }

    /// 切分所有源文件，返回按输入顺序拼接的函数单元与摘要
    fn segment_sources(&self, sources: &[CodeSource]) -> (Vec<FunctionUnit>, Vec<SourceSummary>) {
        let mut units = Vec::new();
        let mut summaries = Vec::with_capacity(sources.len());

        for segmentation in self.segmenters.segment_all(sources) {
            summaries.push(SourceSummary {
                file_name: segmentation.file_name.clone(),
                language: segmentation.resolved_language.clone(),
                units: segmentation.units.iter().map(|u| u.name.clone()).collect(),
                fallback: segmentation.fallback,
            });
            units.extend(segmentation.units);
        }

        (units, summaries)
    }

    /// 生成文档
    pub async fn generate(
        &self,
        request: &DocumentationRequest,
        kind: ProviderKind,
        model: Option<&str>,
    ) -> Result<GeneratedDocumentation, LlmError> {
        let request_id = request_id();
        let provider = self.providers.get(kind)?;
        let model = model.unwrap_or_else(|| provider.default_model()).to_string();

        info!(
            "[{}] Starting documentation generation: template={}, sources={}, provider={}, model={}",
            request_id,
            request.template.name,
            request.code_sources.len(),
            kind,
            model
        );

        let (units, sources) = self.segment_sources(&request.code_sources);
        info!("[{}] Extracted {} code units", request_id, units.len());

        let prompt = assemble(
            &request.template,
            &units,
            &request.text_descriptions,
            &request.specifications,
        );
        debug!("[{}] Prompt length: {}", request_id, prompt.len());

        let messages = [
            ChatMessage::system(DOC_GENERATION_SYSTEM_PROMPT),
            ChatMessage::user(prompt),
        ];
        let options = ChatOptions::new().with_temperature(0.3).with_max_tokens(4000);

        let started = Instant::now();
        let documentation = provider
            .send_chat_completion(&model, &messages, &options)
            .await?;
        info!(
            "[{}] Documentation generated in {} ms, length={}",
            request_id,
            started.elapsed().as_millis(),
            documentation.len()
        );

        Ok(GeneratedDocumentation {
            request_id,
            documentation,
            model,
            provider: kind,
            sources,
        })
    }

    /// 投递到文件存储服务，失败只记录日志
    ///
    /// 返回是否投递成功。
    pub async fn save(&self, documentation: &str, options: &SaveOptions) -> bool {
        let Some(sink) = &self.sink else {
            warn!("No documentation sink configured, skipping save");
            return false;
        };

        let file_name = options
            .file_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(DEFAULT_FILE_NAME);

        match sink.save(file_name, documentation, &options.metadata).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to save documentation {}: {}", file_name, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::ScriptedProvider;
    use crate::services::sink::SinkError;
    use crate::services::templates::TemplateType;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        saved: Mutex<Vec<(String, String)>>,
        fail: bool,
    }

    #[async_trait]
    impl DocumentationSink for RecordingSink {
        async fn save(
            &self,
            file_name: &str,
            content: &str,
            _metadata: &Map<String, Value>,
        ) -> Result<(), SinkError> {
            if self.fail {
                return Err(SinkError::Rejected {
                    status: 500,
                    message: "down".to_string(),
                });
            }
            self.saved
                .lock()
                .push((file_name.to_string(), content.to_string()));
            Ok(())
        }
    }

    fn request() -> DocumentationRequest {
        DocumentationRequest {
            template: DocumentationTemplate::new("Guide", TemplateType::Markdown, "# {name}"),
            code_sources: vec![
                CodeSource::new("math.py", "python", "def add(a, b):\n    return a + b\n"),
                CodeSource::new("notes.txt", "plain", "just text"),
            ],
            text_descriptions: vec!["Math helpers".to_string()],
            specifications: vec![],
        }
    }

    #[tokio::test]
    async fn test_generate_pipeline() {
        let provider = Arc::new(ScriptedProvider::replying(ProviderKind::Groq, "# Math"));
        let providers = ProviderRegistry::new().with_provider(provider.clone());
        let generator = DocumentationGenerator::new(
            Arc::new(SegmenterRegistry::with_defaults()),
            Arc::new(providers),
        );

        let result = generator
            .generate(&request(), ProviderKind::Groq, None)
            .await
            .unwrap();

        assert_eq!(result.documentation, "# Math");
        assert_eq!(result.model, "scripted-model");
        assert_eq!(result.request_id.len(), 8);
        assert_eq!(result.sources[0].units, vec!["add"]);
        assert_eq!(result.sources[1].fallback, Some(FallbackReason::UnknownLanguage));

        let calls = provider.calls.lock();
        let (_, messages, options) = &calls[0];
        assert_eq!(messages[0].content, DOC_GENERATION_SYSTEM_PROMPT);
        assert!(messages[1].content.contains("Function: add\n```\ndef add(a, b):\n    return a + b\n```"));
        assert!(messages[1].content.contains("Function: main\n```\njust text\n```"));
        assert!(messages[1].content.contains("- Math helpers"));
        assert_eq!(options.temperature(), Some(0.3));
        assert_eq!(options.max_tokens(), Some(4000));
    }

    #[tokio::test]
    async fn test_unconfigured_provider() {
        let generator = DocumentationGenerator::new(
            Arc::new(SegmenterRegistry::with_defaults()),
            Arc::new(ProviderRegistry::new()),
        );
        let err = generator
            .generate(&request(), ProviderKind::Gemini, Some("gemini-1.5-flash"))
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::ConfigError(_)));
    }

    #[tokio::test]
    async fn test_save_uses_default_name_and_swallows_failures() {
        let sink = Arc::new(RecordingSink::default());
        let generator = DocumentationGenerator::new(
            Arc::new(SegmenterRegistry::with_defaults()),
            Arc::new(ProviderRegistry::new()),
        )
        .with_sink(sink.clone());

        assert!(generator.save("# Doc", &SaveOptions::default()).await);
        assert_eq!(
            sink.saved.lock()[0],
            (DEFAULT_FILE_NAME.to_string(), "# Doc".to_string())
        );

        let failing = DocumentationGenerator::new(
            Arc::new(SegmenterRegistry::with_defaults()),
            Arc::new(ProviderRegistry::new()),
        )
        .with_sink(Arc::new(RecordingSink {
            fail: true,
            ..Default::default()
        }));
        assert!(!failing.save("# Doc", &SaveOptions::default()).await);

        let without_sink = DocumentationGenerator::new(
            Arc::new(SegmenterRegistry::with_defaults()),
            Arc::new(ProviderRegistry::new()),
        );
        assert!(!without_sink.save("# Doc", &SaveOptions::default()).await);
    }
}
