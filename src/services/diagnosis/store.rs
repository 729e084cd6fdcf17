//! 诊断记录存储

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::services::store::StoreError;

/// 单条诊断记录，自然键为 `(subject_id, disease)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosisRecord {
    pub id: Option<u64>,
    pub subject_id: u64,
    pub disease: String,
    /// 0-100
    pub probability: u8,
    pub description: String,
}

impl DiagnosisRecord {
    pub fn new(subject_id: u64, disease: impl Into<String>, probability: u8, description: impl Into<String>) -> Self {
        Self {
            id: None,
            subject_id,
            disease: disease.into(),
            probability: probability.min(100),
            description: description.into(),
        }
    }
}

/// 诊断记录存储接口（不提供删除）
#[async_trait]
pub trait DiagnosisStore: Send + Sync {
    /// 按主体查询全部记录
    async fn find_by_subject(&self, subject_id: u64) -> Result<Vec<DiagnosisRecord>, StoreError>;

    /// 保存记录：有 id 时更新，无 id 时新建
    ///
    /// 新建或改名导致自然键重复时返回 `StoreError::Conflict`。
    async fn save(&self, record: DiagnosisRecord) -> Result<DiagnosisRecord, StoreError>;
}

#[derive(Debug, Default)]
struct MemoryInner {
    records: BTreeMap<u64, DiagnosisRecord>,
    last_id: u64,
}

impl MemoryInner {
    fn has_conflict(&self, record: &DiagnosisRecord) -> bool {
        self.records.values().any(|existing| {
            existing.subject_id == record.subject_id
                && existing.disease == record.disease
                && existing.id != record.id
        })
    }
}

/// 内存诊断存储
#[derive(Debug, Default)]
pub struct MemoryDiagnosisStore {
    inner: Mutex<MemoryInner>,
}

impl MemoryDiagnosisStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DiagnosisStore for MemoryDiagnosisStore {
    async fn find_by_subject(&self, subject_id: u64) -> Result<Vec<DiagnosisRecord>, StoreError> {
        let inner = self.inner.lock();
        Ok(inner
            .records
            .values()
            .filter(|record| record.subject_id == subject_id)
            .cloned()
            .collect())
    }

    async fn save(&self, mut record: DiagnosisRecord) -> Result<DiagnosisRecord, StoreError> {
        let mut inner = self.inner.lock();
        if inner.has_conflict(&record) {
            return Err(StoreError::Conflict(format!(
                "diagnosis '{}' already exists for subject {}",
                record.disease, record.subject_id
            )));
        }

        let id = match record.id {
            Some(id) if inner.records.contains_key(&id) => id,
            Some(id) => return Err(StoreError::NotFound(format!("diagnosis {}", id))),
            None => {
                inner.last_id += 1;
                inner.last_id
            }
        };

        record.id = Some(id);
        record.probability = record.probability.min(100);
        inner.records.insert(id, record.clone());
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_and_update() {
        let store = MemoryDiagnosisStore::new();
        let created = store
            .save(DiagnosisRecord::new(7, "Acne", 40, "Spots"))
            .await
            .unwrap();
        assert_eq!(created.id, Some(1));

        let mut changed = created.clone();
        changed.probability = 70;
        store.save(changed).await.unwrap();

        let records = store.find_by_subject(7).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].probability, 70);
        assert!(store.find_by_subject(8).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_natural_key_is_conflict() {
        let store = MemoryDiagnosisStore::new();
        store.save(DiagnosisRecord::new(1, "Acne", 40, "")).await.unwrap();

        let err = store
            .save(DiagnosisRecord::new(1, "Acne", 60, ""))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        // 不同主体可以有同名病症
        assert!(store.save(DiagnosisRecord::new(2, "Acne", 60, "")).await.is_ok());
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let store = MemoryDiagnosisStore::new();
        let mut record = DiagnosisRecord::new(1, "Flu", 10, "");
        record.id = Some(42);
        assert!(matches!(store.save(record).await, Err(StoreError::NotFound(_))));
    }
}
