//! 提交内容读取模块
//!
//! 读取某个提交中单个文件的内容。结果不做缓存，缓存由调用方通过
//! [`ResultCache`](crate::cache::ResultCache) 自行管理。

use crate::error::{CodetraceError, Result};
use crate::git::TreeSource;
use rayon::prelude::*;
use tracing::debug;

/// 某个提交中某个文件的内容
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileContent {
    pub commit: String,
    pub path: String,
    pub text: String,
}

/// 提交内容解析器
#[derive(Debug, Clone, Copy, Default)]
pub struct CommitContentResolver;

impl CommitContentResolver {
    pub fn new() -> Self {
        Self
    }

    /// 读取 `commit` 中 `path` 的文本内容
    ///
    /// `path` 为 `None` 时直接返回 `Ok(None)`，不会访问仓库。
    /// 路径不存在时返回 [`CodetraceError::NotFound`]。
    pub fn resolve(
        &self,
        repo: &impl TreeSource,
        commit: &str,
        path: Option<&str>,
    ) -> Result<Option<String>> {
        let Some(path) = path else {
            return Ok(None);
        };

        let data = repo
            .read_blob(commit, path)?
            .ok_or_else(|| CodetraceError::NotFound {
                commit: commit.to_string(),
                path: path.to_string(),
            })?;

        debug!("Read {} bytes of {} at {}", data.len(), path, commit);
        Ok(Some(decode_utf8(data)))
    }

    /// 读取文件内容并附带提交与路径信息
    pub fn resolve_file(
        &self,
        repo: &impl TreeSource,
        commit: &str,
        path: &str,
    ) -> Result<FileContent> {
        let text = self.resolve(repo, commit, Some(path))?.unwrap_or_default();
        Ok(FileContent {
            commit: commit.to_string(),
            path: path.to_string(),
            text,
        })
    }

    /// 并发读取多个互相独立的 `(commit, path)` 请求，结果顺序与输入一致
    pub fn resolve_batch<S, C, P>(
        &self,
        repo: &S,
        requests: &[(C, P)],
    ) -> Vec<Result<FileContent>>
    where
        S: TreeSource,
        C: AsRef<str> + Sync,
        P: AsRef<str> + Sync,
    {
        requests
            .par_iter()
            .map(|(commit, path)| self.resolve_file(repo, commit.as_ref(), path.as_ref()))
            .collect()
    }
}

/// 按 UTF-8 解码，非法字节序列替换为 U+FFFD
fn decode_utf8(data: Vec<u8>) -> String {
    match String::from_utf8(data) {
        Ok(text) => text,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    }
}
