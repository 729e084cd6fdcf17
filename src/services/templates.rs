//! 文档模板仓库
//!
//! 内存中的模板 CRUD 存储，按 id 或名称读取。

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};

use super::store::StoreError;

/// 模板类型
///
/// 反序列化时大小写不敏感，未知的类型字符串退化为 `MARKDOWN`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", from = "String")]
pub enum TemplateType {
    Mkdocs,
    CodeComments,
    #[default]
    Markdown,
    RestApi,
    Custom,
}

impl From<String> for TemplateType {
    fn from(value: String) -> Self {
        match value.trim().to_uppercase().as_str() {
            "MKDOCS" => TemplateType::Mkdocs,
            "CODE_COMMENTS" => TemplateType::CodeComments,
            "MARKDOWN" => TemplateType::Markdown,
            "REST_API" => TemplateType::RestApi,
            "CUSTOM" => TemplateType::Custom,
            other => {
                warn!("Invalid template type '{}', using MARKDOWN", other);
                TemplateType::Markdown
            }
        }
    }
}

impl fmt::Display for TemplateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TemplateType::Mkdocs => "MKDOCS",
            TemplateType::CodeComments => "CODE_COMMENTS",
            TemplateType::Markdown => "MARKDOWN",
            TemplateType::RestApi => "REST_API",
            TemplateType::Custom => "CUSTOM",
        };
        f.write_str(name)
    }
}

/// 文档模板
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentationTemplate {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type", default)]
    pub template_type: TemplateType,
    #[serde(default)]
    pub content: String,
    /// 附加元数据（如版本、作者），按键排序
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl DocumentationTemplate {
    pub fn new(name: impl Into<String>, template_type: TemplateType, content: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: None,
            template_type,
            content: content.into(),
            metadata: BTreeMap::new(),
            created_at: None,
            updated_at: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    fn validate(&self) -> Result<(), StoreError> {
        if self.name.trim().is_empty() {
            return Err(StoreError::Invalid("template name is required".to_string()));
        }
        if self.content.trim().is_empty() {
            return Err(StoreError::Invalid("template content is required".to_string()));
        }
        Ok(())
    }
}

/// 模板仓库
///
/// `names` 是名称到 id 的唯一索引，写操作总是先锁名称索引再锁模板表。
pub struct TemplateRepository {
    templates: DashMap<u64, DocumentationTemplate>,
    names: DashMap<String, u64>,
    next_id: AtomicU64,
}

impl TemplateRepository {
    pub fn new() -> Self {
        Self {
            templates: DashMap::new(),
            names: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// 全部模板（按 id 排序）
    pub fn find_all(&self) -> Vec<DocumentationTemplate> {
        let mut templates: Vec<DocumentationTemplate> =
            self.templates.iter().map(|entry| entry.value().clone()).collect();
        templates.sort_by_key(|t| t.id);
        debug!("Found {} templates", templates.len());
        templates
    }

    pub fn find_by_id(&self, id: u64) -> Option<DocumentationTemplate> {
        self.templates.get(&id).map(|entry| entry.value().clone())
    }

    pub fn find_by_name(&self, name: &str) -> Option<DocumentationTemplate> {
        let id = *self.names.get(name)?;
        self.find_by_id(id)
    }

    pub fn find_by_type(&self, template_type: TemplateType) -> Vec<DocumentationTemplate> {
        let mut templates: Vec<DocumentationTemplate> = self
            .templates
            .iter()
            .filter(|entry| entry.value().template_type == template_type)
            .map(|entry| entry.value().clone())
            .collect();
        templates.sort_by_key(|t| t.id);
        templates
    }

    fn name_conflict(name: &str) -> StoreError {
        warn!("Template with name '{}' already exists", name);
        StoreError::Conflict(format!("template '{}' already exists", name))
    }

    /// 新建模板，名称重复时返回冲突
    pub fn create(&self, mut template: DocumentationTemplate) -> Result<DocumentationTemplate, StoreError> {
        template.validate()?;

        let slot = match self.names.entry(template.name.clone()) {
            Entry::Occupied(_) => return Err(Self::name_conflict(&template.name)),
            Entry::Vacant(slot) => slot,
        };

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let now = Utc::now();
        template.id = Some(id);
        template.created_at = Some(now);
        template.updated_at = Some(now);

        self.templates.insert(id, template.clone());
        slot.insert(id);
        info!("Template created: id={}, name={}", id, template.name);
        Ok(template)
    }

    /// 更新模板的可编辑字段，保留 id 与创建时间
    pub fn update(&self, id: u64, updated: DocumentationTemplate) -> Result<DocumentationTemplate, StoreError> {
        updated.validate()?;

        let current_name = self
            .templates
            .get(&id)
            .map(|entry| entry.value().name.clone())
            .ok_or_else(|| StoreError::NotFound(format!("template {}", id)))?;

        let renamed = updated.name != current_name;
        if renamed {
            match self.names.entry(updated.name.clone()) {
                Entry::Occupied(_) => return Err(Self::name_conflict(&updated.name)),
                Entry::Vacant(slot) => {
                    slot.insert(id);
                }
            }
        }

        let Some(mut entry) = self.templates.get_mut(&id) else {
            // 期间被删除
            if renamed {
                self.names.remove_if(&updated.name, |_, owner| *owner == id);
            }
            return Err(StoreError::NotFound(format!("template {}", id)));
        };

        let existing = entry.value_mut();
        existing.name = updated.name;
        existing.description = updated.description;
        existing.template_type = updated.template_type;
        existing.content = updated.content;
        existing.metadata = updated.metadata;
        existing.updated_at = Some(Utc::now());
        let result = existing.clone();
        drop(entry);

        if renamed {
            self.names.remove_if(&current_name, |_, owner| *owner == id);
        }
        info!("Template updated: id={}", id);
        Ok(result)
    }

    pub fn delete(&self, id: u64) -> Result<(), StoreError> {
        match self.templates.remove(&id) {
            Some((_, removed)) => {
                self.names.remove_if(&removed.name, |_, owner| *owner == id);
                info!("Template deleted: id={}", id);
                Ok(())
            }
            None => Err(StoreError::NotFound(format!("template {}", id))),
        }
    }
}

impl Default for TemplateRepository {
    fn default() -> Self {
        Self::new()
    }
}
