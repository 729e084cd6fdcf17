//! Prompt 构建
//!
//! 文档生成、文档校验、诊断卡片更新三类系统提示词，以及用户提示词的拼装。
//! 拼装函数是纯函数，相同输入得到相同输出，不做截断。

use std::fmt::Write;

use super::segmenter::FunctionUnit;
use super::templates::DocumentationTemplate;

/// 文档生成系统提示词
pub const DOC_GENERATION_SYSTEM_PROMPT: &str = r#"You are an expert technical documentation writer.
Your task is to produce high-quality, well-structured documentation from the provided source code, descriptions and specifications.

REQUIREMENTS:
1. Analyze the code and identify the key functions, classes and methods
2. Describe parameters, return values and exceptions
3. Use the provided template for formatting
4. Be precise and concise
5. Follow the style and format of the given documentation template
6. Include usage examples where appropriate

Answer in the language of the user's request."#;

/// 文档校验系统提示词（描述 JSON 报告结构）
pub const VALIDATION_SYSTEM_PROMPT: &str = r#"You are an expert in technical documentation review.
Your task is to check documentation for compliance with a template and with documentation standards.

ANALYSIS REQUIREMENTS:
1. Check the structure (headings, sections, subsections)
2. Check the formatting (markdown, lists, tables, code)
3. Check compliance with the template (type, style, format)
4. Check completeness (are all sections present)
5. Check content quality (clarity, accuracy, completeness of descriptions)
6. Check adherence to documentation standards

RESPONSE FORMAT (strict JSON):
{
    "isValid": true/false,
    "complianceScore": 0-100,
    "summary": "Short validation summary",
    "issues": [
        {
            "type": "FORMAT|CONTENT|STRUCTURE|STANDARD",
            "severity": "ERROR|WARNING|INFO",
            "description": "Detailed description of the problem",
            "location": "Where the problem was found (section, line, etc.)",
            "recommendation": "How to fix it"
        }
    ]
}

IMPORTANT:
- If the documentation fully complies, isValid=true and issues=[]
- If there are problems, state exactly what does not comply
- Be specific when describing problems
- Give practical recommendations"#;

/// 医疗助手对话系统提示词
pub const MEDICAL_ASSISTANT_SYSTEM_PROMPT: &str = r#"You are the assistant of a medical application.
Answer briefly, precisely and professionally.
If a question is not about medicine or diagnostics, answer neutrally or decline.
Never present unverified diagnoses as facts.
Answer in the language of the user's request.
The user's medical card with the conditions you diagnosed earlier is attached,
followed by a description of the state of their skin, eyes, mood and so on."#;

/// 诊断卡片更新系统提示词，`{marker}` 会被替换为实际的哨兵标记
const CARD_UPDATE_SYSTEM_PROMPT_TEMPLATE: &str = r#"YOU ARE A MEDICAL CARD UPDATE SYSTEM. DO NOT REASON. DO NOT ANALYZE. DO NOT EXPLAIN.

FORBIDDEN:
- Writing <think> or </think>
- Analysis, conclusions or reasoning
- Phrases such as "I think", "based on", "possibly"
- Blank lines, extra spaces or line breaks
- Changing the format
- Adding anything before or after "{marker}"

ALLOWED ONLY:
EXACTLY ONE LINE PER CONDITION:
Condition: probability;Description.

RULES:
1. Probability is a NUMBER 0-100, ONLY if stated EXPLICITLY in the report
2. If the probability is NOT stated, SKIP the entry
3. Description is SHORT and contains ONLY symptoms from the report
4. If a condition is NOT mentioned, DO NOT ADD it
5. If the card is empty, create entries ONLY with an explicit probability
6. NEVER 100 unless the report says "definitely"

FORMAT (STRICT):
{marker}
Condition: 70;Oily skin, shine.
Condition: 95;Dryness, thirst.

START DIRECTLY WITH "{marker}""#;

/// 生成诊断卡片更新系统提示词
pub fn card_update_system_prompt(marker: &str) -> String {
    CARD_UPDATE_SYSTEM_PROMPT_TEMPLATE.replace("{marker}", marker)
}

/// 模板块：类型、名称、描述、元数据与模板正文
fn write_template_block(prompt: &mut String, template: &DocumentationTemplate) {
    prompt.push_str("DOCUMENTATION TEMPLATE:\n");
    let _ = writeln!(prompt, "Type: {}", template.template_type);
    let _ = writeln!(prompt, "Name: {}", template.name);
    if let Some(description) = template.description.as_deref().filter(|d| !d.is_empty()) {
        let _ = writeln!(prompt, "Description: {}", description);
    }
    if !template.metadata.is_empty() {
        prompt.push_str("Metadata:\n");
        for (key, value) in &template.metadata {
            let _ = writeln!(prompt, "- {}: {}", key, value);
        }
    }
    let _ = write!(prompt, "\nTemplate content:\n{}\n\n", template.content);
}

fn write_bullets(prompt: &mut String, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    let _ = writeln!(prompt, "{}:", title);
    for item in items {
        let _ = writeln!(prompt, "- {}", item);
    }
    prompt.push('\n');
}

/// 组装文档生成提示词
///
/// 依次输出模板块、每个函数单元一个代码块、文字描述、规格说明和任务指令。
/// 空列表对应的块整体省略，正文为空的单元不输出代码块。
pub fn assemble(
    template: &DocumentationTemplate,
    units: &[FunctionUnit],
    text_descriptions: &[String],
    specifications: &[String],
) -> String {
    let mut prompt = String::new();
    write_template_block(&mut prompt, template);

    let code_units: Vec<&FunctionUnit> = units
        .iter()
        .filter(|unit| !unit.body.trim().is_empty())
        .collect();
    if !code_units.is_empty() {
        prompt.push_str("SOURCE CODE (split by function):\n\n");
        for unit in code_units {
            let _ = write!(prompt, "Function: {}\n```\n{}\n```\n\n", unit.name, unit.body);
        }
    }

    write_bullets(&mut prompt, "TEXT DESCRIPTIONS", text_descriptions);
    write_bullets(&mut prompt, "SPECIFICATIONS", specifications);

    prompt.push_str(
        "TASK: Generate documentation that follows the provided template, using all of the provided content.",
    );
    prompt
}

/// 组装文档校验提示词
pub fn assemble_validation_prompt(
    template: &DocumentationTemplate,
    documentation: &str,
    additional_standards: Option<&str>,
) -> String {
    let mut prompt = String::new();
    write_template_block(&mut prompt, template);

    if let Some(standards) = additional_standards.map(str::trim).filter(|s| !s.is_empty()) {
        let _ = write!(prompt, "ADDITIONAL DOCUMENTATION STANDARDS:\n{}\n\n", standards);
    }

    let _ = write!(
        prompt,
        "DOCUMENTATION TO VALIDATE:\n```\n{}\n```\n\n",
        documentation
    );
    prompt.push_str(
        "TASK: Check the documentation against the template and the documentation standards. \
         List every problem found and give recommendations for fixing it. \
         Respond strictly in the JSON format given in the system prompt.",
    );
    prompt
}
