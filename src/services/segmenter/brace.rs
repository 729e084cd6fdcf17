//! 花括号语言的公共扫描逻辑

use regex::{Captures, Regex};
use tracing::debug;

use super::types::FunctionUnit;

/// 从 `open` 处的 `{` 开始按括号深度查找块结束位置
///
/// 返回值为不含端点的结束偏移（即闭合 `}` 之后的位置）。
/// 括号不平衡时返回文本末尾。
pub fn find_block_end(code: &str, open: usize) -> usize {
    let mut depth = 1usize;
    for (offset, byte) in code.as_bytes()[open + 1..].iter().enumerate() {
        match byte {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return open + offset + 2;
                }
            }
            _ => {}
        }
    }
    code.len()
}

/// 用以 `{` 结尾的模式扫描源码，逐个提取函数单元
///
/// 匹配之间不重叠，下一次扫描从上一次匹配到的 `{` 之后开始，
/// 因此嵌套块会被再次独立提取。
pub fn extract_units<F>(code: &str, pattern: &Regex, language: &str, name_of: F) -> Vec<FunctionUnit>
where
    F: Fn(&Captures) -> String,
{
    let mut units = Vec::new();

    for caps in pattern.captures_iter(code) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let start = whole.start();
        let end = find_block_end(code, whole.end() - 1);
        let name = name_of(&caps);

        debug!("Found {} function: {} at {}-{}", language, name, start, end);
        units.push(FunctionUnit::from_span(name, code, start, end));
    }

    units
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_block_end_balanced() {
        let code = "f() { if (x) { y(); } }";
        let open = code.find('{').unwrap();
        assert_eq!(find_block_end(code, open), code.len());
        assert_eq!(&code[open..find_block_end(code, open)], "{ if (x) { y(); } }");
    }

    #[test]
    fn test_find_block_end_stops_at_first_close() {
        let code = "a { b } c { d }";
        assert_eq!(find_block_end(code, 2), 7);
    }

    #[test]
    fn test_find_block_end_unterminated() {
        let code = "void f() { if (x) { y();";
        let open = code.find('{').unwrap();
        assert_eq!(find_block_end(code, open), code.len());
    }
}
