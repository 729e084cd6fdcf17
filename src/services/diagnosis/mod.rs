//! 诊断对账模块
//!
//! 解析 LLM 回复中哨兵标记之后的诊断行，并与主体已有的记录合并：
//! - 已有记录时只更新回复中出现的病症，其余保持不变，新出现的病症被丢弃；
//! - 没有记录时为每条解析结果新建记录；
//! - 回复中没有哨兵标记时不做任何修改。

mod parser;
mod store;

pub use parser::{parse_illness_line, ParsedDiagnosis};
pub use store::{DiagnosisRecord, DiagnosisStore, MemoryDiagnosisStore};

use serde::Serialize;
use std::fmt::Write;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::prompts::{card_update_system_prompt, MEDICAL_ASSISTANT_SYSTEM_PROMPT};
use super::store::StoreError;
use crate::llm::{ChatMessage, ChatOptions, LlmError, ProviderKind, ProviderRegistry};

/// 默认哨兵标记
pub const DEFAULT_MARKER: &str = "Answer:";

/// 卡片更新错误
#[derive(Debug, Error)]
pub enum CardUpdateError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// 一次对账的结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileOutcome {
    /// 回复中是否找到哨兵标记
    pub marker_found: bool,
    /// 被更新的病症
    pub updated: Vec<String>,
    /// 新建的病症
    pub created: Vec<String>,
    /// 已有但回复中未提及、保持不变的病症
    pub untouched: Vec<String>,
    /// 回复中出现但因主体已有记录而未写入的病症
    pub dropped: Vec<String>,
    /// 无法解析的行
    pub skipped_lines: Vec<String>,
}

/// 诊断对账器
pub struct DiagnosisReconciler {
    store: Arc<dyn DiagnosisStore>,
    providers: Arc<ProviderRegistry>,
    marker: String,
}

impl DiagnosisReconciler {
    pub fn new(store: Arc<dyn DiagnosisStore>, providers: Arc<ProviderRegistry>) -> Self {
        Self {
            store,
            providers,
            marker: DEFAULT_MARKER.to_string(),
        }
    }

    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = marker.into();
        self
    }

    pub async fn records(&self, subject_id: u64) -> Result<Vec<DiagnosisRecord>, StoreError> {
        self.store.find_by_subject(subject_id).await
    }

    /// 解析标记之后的诊断行
    ///
    /// 结果按病症首次出现的顺序排列，同名病症以后出现的为准。
    /// 没有标记时返回 None。
    pub fn parse_reply(&self, text: &str) -> Option<(Vec<ParsedDiagnosis>, Vec<String>)> {
        let (_, body) = text.split_once(self.marker.as_str())?;

        let mut parsed: Vec<ParsedDiagnosis> = Vec::new();
        let mut skipped = Vec::new();

        for line in body.lines().filter(|l| !l.trim().is_empty()) {
            match parse_illness_line(line) {
                Some(diagnosis) => {
                    match parsed.iter_mut().find(|p| p.disease == diagnosis.disease) {
                        Some(slot) => *slot = diagnosis,
                        None => parsed.push(diagnosis),
                    }
                }
                None => {
                    warn!("Skipped unparsable diagnosis line: {}", line);
                    skipped.push(line.trim().to_string());
                }
            }
        }

        Some((parsed, skipped))
    }

    /// 把 LLM 回复与主体的已有记录对账
    pub async fn reconcile(&self, subject_id: u64, text: &str) -> Result<ReconcileOutcome, StoreError> {
        let Some((parsed, skipped_lines)) = self.parse_reply(text) else {
            error!(
                "LLM reply for subject {} has no '{}' block, nothing to reconcile",
                subject_id, self.marker
            );
            return Ok(ReconcileOutcome::default());
        };

        let mut outcome = ReconcileOutcome {
            marker_found: true,
            skipped_lines,
            ..Default::default()
        };

        let existing = self.store.find_by_subject(subject_id).await?;
        info!(
            "Reconciling subject {}: existing={}, parsed={}",
            subject_id,
            existing.len(),
            parsed.len()
        );

        if existing.is_empty() {
            for diagnosis in &parsed {
                let record = DiagnosisRecord::new(
                    subject_id,
                    &diagnosis.disease,
                    diagnosis.probability_value(),
                    &diagnosis.description,
                );
                self.store.save(record).await?;
                debug!("Created diagnosis {} for subject {}", diagnosis.disease, subject_id);
                outcome.created.push(diagnosis.disease.clone());
            }
        } else {
            for mut record in existing.iter().cloned() {
                let Some(diagnosis) = parsed.iter().find(|p| p.disease == record.disease) else {
                    outcome.untouched.push(record.disease);
                    continue;
                };
                record.probability = diagnosis.probability_value();
                record.description = diagnosis.description.clone();
                self.store.save(record).await?;
                outcome.updated.push(diagnosis.disease.clone());
            }

            outcome.dropped = parsed
                .iter()
                .filter(|p| !existing.iter().any(|r| r.disease == p.disease))
                .map(|p| p.disease.clone())
                .collect();
            if !outcome.dropped.is_empty() {
                warn!(
                    "Subject {} already has records, new diagnoses not saved: {:?}",
                    subject_id, outcome.dropped
                );
            }
        }

        info!(
            "Reconciliation for subject {} done: updated={}, created={}, untouched={}, dropped={}, skipped={}",
            subject_id,
            outcome.updated.len(),
            outcome.created.len(),
            outcome.untouched.len(),
            outcome.dropped.len(),
            outcome.skipped_lines.len()
        );
        Ok(outcome)
    }

    /// 医疗助手对话：附上主体当前的卡片，返回模型回复原文
    ///
    /// 回复可作为 `update_card` 的报告。
    pub async fn chat(
        &self,
        subject_id: u64,
        prompt: &str,
        kind: ProviderKind,
        model: Option<&str>,
    ) -> Result<String, CardUpdateError> {
        let provider = self.providers.get(kind)?;
        let model = model.unwrap_or_else(|| provider.default_model()).to_string();
        let existing = self.store.find_by_subject(subject_id).await?;

        info!(
            "Medical chat for subject {}: provider={}, model={}, prompt_length={}",
            subject_id,
            kind,
            model,
            prompt.len()
        );

        let messages = [
            ChatMessage::system(MEDICAL_ASSISTANT_SYSTEM_PROMPT),
            ChatMessage::user(render_with_card(&existing, "REQUEST", prompt)),
        ];
        let reply = provider
            .send_chat_completion(&model, &messages, &ChatOptions::new())
            .await?;
        debug!("Medical chat reply: {}", reply);
        Ok(reply)
    }

    /// 让 LLM 根据文字报告更新卡片，再对账其回复
    pub async fn update_card(
        &self,
        subject_id: u64,
        report: &str,
        kind: ProviderKind,
        model: Option<&str>,
    ) -> Result<ReconcileOutcome, CardUpdateError> {
        let provider = self.providers.get(kind)?;
        let model = model.unwrap_or_else(|| provider.default_model()).to_string();
        let existing = self.store.find_by_subject(subject_id).await?;

        info!(
            "Updating card for subject {}: provider={}, model={}, existing={}",
            subject_id,
            kind,
            model,
            existing.len()
        );

        let messages = [
            ChatMessage::system(card_update_system_prompt(&self.marker)),
            ChatMessage::user(render_with_card(&existing, "REPORT", report)),
        ];
        let reply = provider
            .send_chat_completion(&model, &messages, &ChatOptions::new())
            .await?;
        debug!("Card update reply: {}", reply);

        Ok(self.reconcile(subject_id, &reply).await?)
    }
}

/// 当前卡片加上一段带标题的正文
fn render_with_card(existing: &[DiagnosisRecord], heading: &str, text: &str) -> String {
    let mut message = String::from("CURRENT CARD:\n");
    if existing.is_empty() {
        message.push_str("(empty)\n");
    }
    for record in existing {
        let _ = writeln!(message, "{}: {};{}", record.disease, record.probability, record.description);
    }
    let _ = write!(message, "\n{}:\n{}", heading, text);
    message
}
