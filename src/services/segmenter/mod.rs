//! 代码切分模块
//!
//! 按语言把源码切分为函数级单元，未识别的语言或未找到函数边界时
//! 退化为整个文件一个单元。

mod brace;
mod java;
mod javascript;
mod python;
pub mod types;

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};

pub use java::JavaSegmenter;
pub use javascript::JavaScriptSegmenter;
pub use python::PythonSegmenter;
pub use types::{CodeSource, FallbackReason, FunctionUnit, Segmentation, WHOLE_FILE_UNIT_NAME};

/// 语言切分器
pub trait Segmenter: Send + Sync {
    /// 规范语言名（小写）
    fn language(&self) -> &'static str;

    /// 查找函数边界，未找到时返回空列表
    fn find_units(&self, content: &str) -> Vec<FunctionUnit>;

    /// 切分源文件，未找到函数边界时退化为整个文件并标记原因
    fn segment(&self, source: &CodeSource) -> Segmentation {
        let units = self.find_units(&source.content);
        let language = Some(self.language().to_string());
        if units.is_empty() {
            warn!(
                "No functions found in {}, treating whole file as one unit",
                source.file_name
            );
            return Segmentation::whole_file(source, language, FallbackReason::NoBoundaries);
        }
        info!("Parsed {} functions from {}", units.len(), source.file_name);
        Segmentation {
            file_name: source.file_name.clone(),
            resolved_language: language,
            units,
            fallback: None,
        }
    }

    /// 只取切分出的单元
    fn parse(&self, source: &CodeSource) -> Vec<FunctionUnit> {
        self.segment(source).units
    }
}

/// 切分器注册表
///
/// 语言名在查找前统一转为小写，别名指向规范语言名。
pub struct SegmenterRegistry {
    segmenters: HashMap<String, Arc<dyn Segmenter>>,
    aliases: HashMap<String, String>,
}

impl SegmenterRegistry {
    /// 空注册表
    pub fn new() -> Self {
        Self {
            segmenters: HashMap::new(),
            aliases: HashMap::new(),
        }
    }

    /// 内置 java / javascript / python 及常用别名
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(JavaSegmenter));
        registry.register(Arc::new(JavaScriptSegmenter));
        registry.register(Arc::new(PythonSegmenter));

        for alias in ["typescript", "ts", "tsx", "js", "jsx"] {
            registry.alias(alias, "javascript");
        }
        registry.alias("py", "python");
        registry
    }

    /// 注册切分器，同名覆盖
    pub fn register(&mut self, segmenter: Arc<dyn Segmenter>) {
        self.segmenters
            .insert(segmenter.language().to_string(), segmenter);
    }

    /// 注册别名
    pub fn alias(&mut self, alias: &str, language: &str) {
        self.aliases
            .insert(alias.to_lowercase(), language.to_lowercase());
    }

    /// 解析语言名（含别名），返回对应切分器
    pub fn resolve(&self, language: &str) -> Option<&Arc<dyn Segmenter>> {
        let key = language.trim().to_lowercase();
        let canonical = self.aliases.get(&key).unwrap_or(&key);
        self.segmenters.get(canonical)
    }

    /// 已注册的规范语言名（排序）
    pub fn languages(&self) -> Vec<String> {
        let mut languages: Vec<String> = self.segmenters.keys().cloned().collect();
        languages.sort();
        languages
    }

    /// 切分单个源文件
    pub fn segment(&self, source: &CodeSource) -> Segmentation {
        match self.resolve(&source.language) {
            Some(segmenter) => segmenter.segment(source),
            None => {
                warn!(
                    "Unsupported language '{}' for {}, treating whole file as one unit",
                    source.language, source.file_name
                );
                Segmentation::whole_file(source, None, FallbackReason::UnknownLanguage)
            }
        }
    }

    /// 按输入顺序切分多个源文件
    pub fn segment_all(&self, sources: &[CodeSource]) -> Vec<Segmentation> {
        sources.iter().map(|source| self.segment(source)).collect()
    }
}

impl Default for SegmenterRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
