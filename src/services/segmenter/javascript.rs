//! JavaScript / TypeScript 切分

use once_cell::sync::Lazy;
use regex::Regex;

use super::brace::extract_units;
use super::types::FunctionUnit;
use super::Segmenter;

/// 三种形式：
/// 1. `function name(...) {`
/// 2. `name: function(...) {` / `name = function(...) {`
/// 3. `name = (...) => {`
static RE_FUNCTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:function\s+([\w$]+)\s*\([^)]*\)|([\w$]+)\s*[:=]\s*(?:async\s+)?function\s*[\w$]*\s*\([^)]*\)|([\w$]+)\s*=\s*(?:async\s*)?\([^)]*\)\s*=>)\s*\{",
    )
    .unwrap()
});

const ANONYMOUS: &str = "anonymous";

/// JavaScript 切分器（TypeScript 通过别名复用）
pub struct JavaScriptSegmenter;

impl Segmenter for JavaScriptSegmenter {
    fn language(&self) -> &'static str {
        "javascript"
    }

    fn find_units(&self, content: &str) -> Vec<FunctionUnit> {
        extract_units(content, &RE_FUNCTION, "JavaScript", |caps| {
            (1..=3)
                .find_map(|i| caps.get(i))
                .map(|m| m.as_str().to_string())
                .unwrap_or_else(|| ANONYMOUS.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_three_forms() {
        let code = r#"function greet(name) {
  return `hi ${name}`;
}

const handlers = {
  onClick: function(event) {
    event.preventDefault();
  },
};

const add = (a, b) => {
  return a + b;
};

let fetchAll = async () => {
  await load();
};
"#;
        let units = JavaScriptSegmenter.find_units(code);
        let names: Vec<&str> = units.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["greet", "onClick", "add", "fetchAll"]);

        for unit in &units {
            assert_eq!(unit.body, &code[unit.start_offset..unit.end_offset]);
            assert!(unit.body.ends_with('}'));
        }
        assert!(units[0].body.contains("return `hi ${name}`;"));
    }

    #[test]
    fn test_expression_arrow_is_not_a_unit() {
        let code = "const double = x => x * 2;\nconst triple = (x) => x * 3;\n";
        assert!(JavaScriptSegmenter.find_units(code).is_empty());
    }

    #[test]
    fn test_nested_function_duplicated() {
        let code = "function outer() {\n  function inner() {\n    return 1;\n  }\n  return inner();\n}\n";
        let units = JavaScriptSegmenter.find_units(code);
        let names: Vec<&str> = units.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["outer", "inner"]);
        assert!(units[0].start_offset < units[1].start_offset);
        assert!(units[0].end_offset > units[1].end_offset);
    }
}
