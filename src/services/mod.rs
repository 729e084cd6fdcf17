//! 服务层模块

pub mod diagnosis;
pub mod generator;
pub mod prompts;
pub mod segmenter;
pub mod sink;
pub mod store;
pub mod templates;
pub mod validation;

pub use diagnosis::{DiagnosisReconciler, DiagnosisStore, MemoryDiagnosisStore};
pub use generator::DocumentationGenerator;
pub use segmenter::SegmenterRegistry;
pub use sink::{DocumentationSink, HttpDocumentationSink};
pub use store::StoreError;
pub use templates::TemplateRepository;
pub use validation::ValidationService;

use uuid::Uuid;

/// 8 位短请求 id，用于串联同一次调用的日志
pub(crate) fn request_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(8);
    id
}
