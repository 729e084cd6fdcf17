//! 存储层错误

use thiserror::Error;

/// 存储错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// 记录不存在
    #[error("{0} 不存在")]
    NotFound(String),

    /// 自然键冲突
    #[error("冲突: {0}")]
    Conflict(String),

    /// 字段校验失败
    #[error("无效数据: {0}")]
    Invalid(String),
}
