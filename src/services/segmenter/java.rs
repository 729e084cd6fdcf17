//! Java 类花括号语言切分

use once_cell::sync::Lazy;
use regex::Regex;

use super::brace::extract_units;
use super::types::FunctionUnit;
use super::Segmenter;

/// 修饰符、返回类型、方法名、参数列表、throws 子句，以 `{` 结尾
static RE_METHOD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:(?:public|private|protected|static|final|abstract|synchronized)\s+)*(?:[\w<>\[\]\s]+\s+)?(\w+)\s*\([^)]*\)\s*(?:throws\s+[^{]+)?\s*\{",
    )
    .unwrap()
});

/// Java 切分器
pub struct JavaSegmenter;

impl Segmenter for JavaSegmenter {
    fn language(&self) -> &'static str {
        "java"
    }

    fn find_units(&self, content: &str) -> Vec<FunctionUnit> {
        extract_units(content, &RE_METHOD, "Java", |caps| {
            caps.get(1)
                .map(|m| m.as_str().to_string())
                .unwrap_or_default()
        })
    }
}
