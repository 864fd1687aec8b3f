use crate::diff::PathChange;
use thiserror::Error;

/// codetrace 的错误类型定义
#[derive(Error, Debug)]
pub enum CodetraceError {
    #[error("Git repository error: {0}")]
    GitError(String),

    #[error("Invalid revision: {0}")]
    InvalidRevision(String),

    #[error("Path '{path}' not found in commit {commit}")]
    NotFound { commit: String, path: String },

    #[error(
        "Ambiguous diff for '{path}' between {old_commit} and {new_commit}: {} candidate changes",
        candidates.len()
    )]
    Ambiguous {
        old_commit: String,
        new_commit: String,
        path: String,
        candidates: Vec<PathChange>,
    },

    #[error("File I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl CodetraceError {
    /// 是否为路径缺失错误
    pub fn is_not_found(&self) -> bool {
        matches!(self, CodetraceError::NotFound { .. })
    }

    /// 是否为差异歧义错误（同一路径匹配到多个变更）
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, CodetraceError::Ambiguous { .. })
    }
}

/// 项目通用的 Result 类型别名
pub type Result<T> = std::result::Result<T, CodetraceError>;
