//! URL 构建工具

const CHAT_COMPLETIONS_PATH: &str = "/chat/completions";

/// 修复 base_url
///
/// - 移除末尾斜杠
/// - 修复双斜杠（保留协议部分）
pub fn fix_base_url(base_url: &str) -> String {
    let mut url = base_url.trim().trim_end_matches('/').to_string();

    // 修复双斜杠（跳过协议部分）
    if let Some(pos) = url.find("://") {
        let (protocol, rest) = url.split_at(pos + 3);
        let fixed_rest = rest.replace("//", "/");
        url = format!("{}{}", protocol, fixed_rest);
    }

    url
}

/// OpenAI 兼容 API 的根路径（去掉可能已配置的 `/chat/completions`）
fn openai_root(base_url: &str) -> String {
    let url = fix_base_url(base_url);
    match url.strip_suffix(CHAT_COMPLETIONS_PATH) {
        Some(root) => root.to_string(),
        None => url,
    }
}

/// 构建 OpenAI 兼容 Chat Completions 端点
pub fn build_openai_endpoint(base_url: &str) -> String {
    format!("{}{}", openai_root(base_url), CHAT_COMPLETIONS_PATH)
}

/// 构建 OpenAI 兼容模型列表端点
pub fn build_openai_models_endpoint(base_url: &str) -> String {
    format!("{}/models", openai_root(base_url))
}

/// Gemini API 的根路径（统一去掉 `/v1beta`）
fn gemini_root(base_url: &str) -> String {
    let url = fix_base_url(base_url);
    match url.strip_suffix("/v1beta") {
        Some(root) => root.to_string(),
        None => url,
    }
}

/// 构建 Gemini generateContent 端点
pub fn build_gemini_endpoint(base_url: &str, model: &str) -> String {
    format!(
        "{}/v1beta/models/{}:generateContent",
        gemini_root(base_url),
        model.trim_start_matches("models/")
    )
}

/// 构建 Gemini 模型列表端点
pub fn build_gemini_models_endpoint(base_url: &str) -> String {
    format!("{}/v1beta/models", gemini_root(base_url))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fix_base_url() {
        assert_eq!(fix_base_url("https://api.groq.com/"), "https://api.groq.com");
        assert_eq!(
            fix_base_url("https://api.groq.com//openai/v1"),
            "https://api.groq.com/openai/v1"
        );
    }

    #[test]
    fn test_build_openai_endpoint() {
        assert_eq!(
            build_openai_endpoint("https://api.groq.com/openai/v1"),
            "https://api.groq.com/openai/v1/chat/completions"
        );
        assert_eq!(
            build_openai_endpoint("https://api.groq.com/openai/v1/chat/completions"),
            "https://api.groq.com/openai/v1/chat/completions"
        );
        assert_eq!(
            build_openai_models_endpoint("https://api.groq.com/openai/v1/chat/completions/"),
            "https://api.groq.com/openai/v1/models"
        );
    }

    #[test]
    fn test_build_gemini_endpoint() {
        assert_eq!(
            build_gemini_endpoint("https://generativelanguage.googleapis.com", "gemini-1.5-flash"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent"
        );
        assert_eq!(
            build_gemini_endpoint("https://generativelanguage.googleapis.com/v1beta/", "models/gemini-pro"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-pro:generateContent"
        );
        assert_eq!(
            build_gemini_models_endpoint("https://generativelanguage.googleapis.com"),
            "https://generativelanguage.googleapis.com/v1beta/models"
        );
    }
}
