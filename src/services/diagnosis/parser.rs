//! 诊断行解析
//!
//! 行格式：`病症: 概率;描述`

use once_cell::sync::Lazy;
use regex::Regex;
use std::num::IntErrorKind;
use tracing::debug;

/// 只匹配 ASCII 数字
static RE_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]+").unwrap());

/// 解析出的单条诊断
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDiagnosis {
    pub disease: String,
    /// 概率字段中的第一段数字，没有数字时为 "0"
    pub probability: String,
    pub description: String,
}

impl ParsedDiagnosis {
    /// 数值概率，截断到 0-100；无法解析的概率记为 0
    pub fn probability_value(&self) -> u8 {
        match self.probability.parse::<u32>() {
            Ok(p) => p.min(100) as u8,
            Err(e) if *e.kind() == IntErrorKind::PosOverflow => 100,
            Err(_) => 0,
        }
    }
}

/// 解析单行诊断
///
/// 先按第一个 `:` 切分出病症名，再把剩余部分按第一个 `;` 切分为概率与描述。
/// 空行或缺少任一分隔符时返回 None。
pub fn parse_illness_line(line: &str) -> Option<ParsedDiagnosis> {
    if line.trim().is_empty() {
        return None;
    }

    let (disease, rest) = line.split_once(':')?;
    let (probability, description) = rest.split_once(';')?;

    let probability = RE_DIGITS
        .find(probability.trim())
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| "0".to_string());

    let parsed = ParsedDiagnosis {
        disease: disease.trim().to_string(),
        probability,
        description: description.trim().to_string(),
    };
    debug!(
        "Parsed diagnosis: disease='{}', probability='{}', description='{}'",
        parsed.disease, parsed.probability, parsed.description
    );
    Some(parsed)
}
