//! 应用状态管理
//!
//! 启动时组装一次的服务集合，在请求处理器之间共享。

use std::sync::Arc;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::error::AppError;
use crate::llm::ProviderRegistry;
use crate::services::{
    DiagnosisReconciler, DiagnosisStore, DocumentationGenerator, HttpDocumentationSink,
    MemoryDiagnosisStore, SegmenterRegistry, TemplateRepository, ValidationService,
};

/// 应用共享状态
pub struct AppState {
    pub config: AppConfig,
    pub providers: Arc<ProviderRegistry>,
    pub segmenters: Arc<SegmenterRegistry>,
    pub templates: Arc<TemplateRepository>,
    pub generator: DocumentationGenerator,
    pub validator: ValidationService,
    pub diagnosis: DiagnosisReconciler,
}

impl AppState {
    /// 根据配置组装全部服务
    pub fn from_config(config: AppConfig) -> Result<Self, AppError> {
        let providers = Arc::new(
            ProviderRegistry::from_config(&config).map_err(|e| AppError::Config(e.to_string()))?,
        );
        if providers.kinds().is_empty() {
            warn!("No LLM provider configured, generation endpoints will return 400");
        }
        Ok(Self::with_providers(config, providers, Arc::new(MemoryDiagnosisStore::new())))
    }

    /// 使用给定的提供方注册表与诊断存储组装
    pub fn with_providers(
        config: AppConfig,
        providers: Arc<ProviderRegistry>,
        diagnosis_store: Arc<dyn DiagnosisStore>,
    ) -> Self {
        let segmenters = Arc::new(SegmenterRegistry::with_defaults());
        let mut generator = DocumentationGenerator::new(Arc::clone(&segmenters), Arc::clone(&providers));

        if let Some(url) = &config.file_storage_url {
            match HttpDocumentationSink::new(url) {
                Ok(sink) => {
                    info!("Documentation sink: {}", url);
                    generator = generator.with_sink(Arc::new(sink));
                }
                Err(e) => warn!("Failed to create documentation sink: {}", e),
            }
        }

        let validator = ValidationService::new(Arc::clone(&providers));
        let diagnosis = DiagnosisReconciler::new(diagnosis_store, Arc::clone(&providers))
            .with_marker(config.diagnosis_marker.clone());

        Self {
            config,
            providers,
            segmenters,
            templates: Arc::new(TemplateRepository::new()),
            generator,
            validator,
            diagnosis,
        }
    }
}

/// 创建可共享的应用状态
pub fn create_shared_state(config: AppConfig) -> Result<Arc<AppState>, AppError> {
    Ok(Arc::new(AppState::from_config(config)?))
}
