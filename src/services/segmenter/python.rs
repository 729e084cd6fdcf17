//! Python 切分（基于缩进）

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use super::types::FunctionUnit;
use super::Segmenter;

// 预编译正则表达式
static RE_DEF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bdef\s+(\w+)\s*\([^)]*\)\s*(?:->\s*[^:\n]+)?:").unwrap()
});

/// Python 切分器
pub struct PythonSegmenter;

impl Segmenter for PythonSegmenter {
    fn language(&self) -> &'static str {
        "python"
    }

    fn find_units(&self, content: &str) -> Vec<FunctionUnit> {
        let mut units = Vec::new();

        for caps in RE_DEF.captures_iter(content) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let start = whole.start();
            let end = find_body_end(content, start, whole.end());

            debug!("Found Python function: {} at {}-{}", name.as_str(), start, end);
            units.push(FunctionUnit::from_span(name.as_str(), content, start, end));
        }

        units
    }
}

/// 行首缩进宽度（空格与制表符各计 1）
fn indent_width(line: &str) -> usize {
    line.len() - line.trim_start_matches([' ', '\t']).len()
}

/// 按缩进查找函数体结束位置
///
/// 基准缩进取 `def` 所在行的缩进。冒号之后逐行扫描，遇到第一个缩进
/// 不大于基准的非空行即结束；注释行（`#`）与装饰器行（`@`）不会终止函数体。
/// 返回值为最后一个属于函数体的非空行的行尾，不含尾随空行。
fn find_body_end(code: &str, def_start: usize, colon_end: usize) -> usize {
    let line_start = code[..def_start].rfind('\n').map_or(0, |p| p + 1);
    let base_indent = indent_width(&code[line_start..def_start]);

    // 冒号后同一行的内容（单行函数体）
    let header_end = code[colon_end..]
        .find('\n')
        .map_or(code.len(), |p| colon_end + p);
    let mut end = colon_end + code[colon_end..header_end].trim_end().len();

    let mut pos = header_end;
    while pos < code.len() {
        let line_start = pos + 1;
        let line_end = code[line_start..]
            .find('\n')
            .map_or(code.len(), |p| line_start + p);
        let line = &code[line_start..line_end];
        let stripped = line.trim();

        if !stripped.is_empty() {
            let is_marker = stripped.starts_with('#') || stripped.starts_with('@');
            if indent_width(line) <= base_indent && !is_marker {
                break;
            }
            end = line_start + line.trim_end().len();
        }

        pos = line_end;
    }

    end
}
