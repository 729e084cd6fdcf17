//! 代码切分类型定义

use serde::{Deserialize, Serialize};

/// 未识别到任何函数边界时使用的单元名称
pub const WHOLE_FILE_UNIT_NAME: &str = "main";

/// 调用方提交的源码文件
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeSource {
    /// 文件名
    #[serde(default)]
    pub file_name: String,
    /// 语言标识（大小写不敏感）
    #[serde(default)]
    pub language: String,
    /// 源码内容
    #[serde(default)]
    pub content: String,
}

impl CodeSource {
    pub fn new(
        file_name: impl Into<String>,
        language: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            language: language.into(),
            content: content.into(),
        }
    }
}

/// 函数级代码单元
///
/// 偏移量为 UTF-8 字节偏移，且满足 `body == source[start_offset..end_offset]`。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionUnit {
    pub name: String,
    pub body: String,
    pub start_offset: usize,
    pub end_offset: usize,
}

impl FunctionUnit {
    /// 从源码切片构建单元
    pub fn from_span(name: impl Into<String>, source: &str, start: usize, end: usize) -> Self {
        Self {
            name: name.into(),
            body: source[start..end].to_string(),
            start_offset: start,
            end_offset: end,
        }
    }

    /// 整个文件作为一个单元（空内容返回 None）
    pub fn whole_file(source: &str) -> Option<Self> {
        if source.is_empty() {
            return None;
        }
        Some(Self::from_span(WHOLE_FILE_UNIT_NAME, source, 0, source.len()))
    }
}

/// 回退原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    /// 语言未注册
    UnknownLanguage,
    /// 已注册的切分器未找到任何函数边界
    NoBoundaries,
}

/// 单个源文件的切分结果
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Segmentation {
    pub file_name: String,
    /// 实际使用的切分器语言，未解析时为 None
    pub resolved_language: Option<String>,
    pub units: Vec<FunctionUnit>,
    /// 降级标记，非错误
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<FallbackReason>,
}

impl Segmentation {
    /// 整个文件作为唯一单元的降级结果
    pub fn whole_file(
        source: &CodeSource,
        resolved_language: Option<String>,
        reason: FallbackReason,
    ) -> Self {
        Self {
            file_name: source.file_name.clone(),
            resolved_language,
            units: FunctionUnit::whole_file(&source.content).into_iter().collect(),
            fallback: Some(reason),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.fallback.is_some()
    }
}
