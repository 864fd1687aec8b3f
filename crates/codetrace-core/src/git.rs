//! Git 仓库访问模块
//!
//! 定义解析器访问仓库所用的 [`TreeSource`] 接口，以及基于 gix 的实现 [`GitRepository`]。
//! 每次操作都会获取独立的线程本地仓库视图，并在返回时释放。

use crate::diff::{ChangeType, PathChange, RenameDetection};
use crate::error::{CodetraceError, Result};
use gix::ThreadSafeRepository;
use std::path::{Path, PathBuf};
use tracing::debug;

/// 仓库只读访问接口
///
/// 内容解析器与差异解析器只通过该接口访问仓库，测试中可以替换为计数用的实现。
pub trait TreeSource: Send + Sync {
    /// 将修订字符串解析为完整的提交 ID（十六进制）
    fn resolve_commit(&self, rev: &str) -> Result<String>;

    /// 读取提交树中指定路径的 blob 内容，路径不存在或不是文件时返回 `None`
    fn read_blob(&self, rev: &str, path: &str) -> Result<Option<Vec<u8>>>;

    /// 计算两个提交之间涉及 `path` 的全部变更（旧路径或新路径等于 `path`）
    fn changes_for_path(
        &self,
        old_rev: &str,
        new_rev: &str,
        path: &str,
        renames: &RenameDetection,
    ) -> Result<Vec<PathChange>>;
}

/// 基于 gix 的本地仓库句柄
pub struct GitRepository {
    repo: ThreadSafeRepository,
    path: PathBuf,
}

impl GitRepository {
    /// 打开指定路径下的 Git 仓库
    pub fn open(repo_path: impl Into<PathBuf>) -> Result<Self> {
        let path = repo_path.into();
        let repo = ThreadSafeRepository::open(path.clone()).map_err(|e| {
            CodetraceError::GitError(format!(
                "Failed to open repository at {}: {}",
                path.display(),
                e
            ))
        })?;

        Ok(Self { repo, path })
    }

    /// 仓库路径
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 解析修订并返回对应提交的树
    fn commit_tree<'repo>(
        repo: &'repo gix::Repository,
        rev: &str,
    ) -> Result<(gix::ObjectId, gix::Tree<'repo>)> {
        if rev.is_empty() {
            return Err(CodetraceError::InvalidRevision(
                "Empty revision".to_string(),
            ));
        }

        let commit = repo
            .rev_parse_single(rev)
            .map_err(|e| {
                CodetraceError::InvalidRevision(format!("Failed to resolve revision {rev}: {e}"))
            })?
            .object()
            .map_err(|e| CodetraceError::GitError(format!("Failed to find object {rev}: {e}")))?
            .peel_to_commit()
            .map_err(|e| {
                CodetraceError::InvalidRevision(format!("Revision {rev} is not a commit: {e}"))
            })?;

        let tree = commit
            .tree()
            .map_err(|e| CodetraceError::GitError(format!("Failed to get commit tree: {e}")))?;

        Ok((commit.id, tree))
    }
}

impl TreeSource for GitRepository {
    fn resolve_commit(&self, rev: &str) -> Result<String> {
        let repo = self.repo.to_thread_local();
        let (id, _) = Self::commit_tree(&repo, rev)?;
        Ok(id.to_string())
    }

    fn read_blob(&self, rev: &str, path: &str) -> Result<Option<Vec<u8>>> {
        let repo = self.repo.to_thread_local();
        let (id, mut tree) = Self::commit_tree(&repo, rev)?;

        let entry = tree.peel_to_entry_by_path(Path::new(path)).map_err(|e| {
            CodetraceError::GitError(format!("Failed to walk tree of commit {id}: {e}"))
        })?;

        let Some(entry) = entry else {
            debug!("Path {} not present in commit {}", path, id);
            return Ok(None);
        };

        if !entry.mode().is_blob() {
            debug!("Path {} in commit {} is not a file", path, id);
            return Ok(None);
        }

        let blob = entry
            .object()
            .map_err(|e| CodetraceError::GitError(format!("Failed to find blob: {e}")))?
            .detach();

        Ok(Some(blob.data))
    }

    fn changes_for_path(
        &self,
        old_rev: &str,
        new_rev: &str,
        path: &str,
        renames: &RenameDetection,
    ) -> Result<Vec<PathChange>> {
        let repo = self.repo.to_thread_local();
        let (_, old_tree) = Self::commit_tree(&repo, old_rev)?;
        let (_, new_tree) = Self::commit_tree(&repo, new_rev)?;

        let mut changes = Vec::new();
        let rewrites = renames.to_rewrites();

        let mut platform = old_tree.changes().map_err(|e| {
            CodetraceError::GitError(format!("Failed to create tree changes iterator: {e}"))
        })?;
        platform.options(|opts| {
            opts.track_path().track_rewrites(rewrites);
        });

        platform
            .for_each_to_obtain_tree(&new_tree, |change| {
                if let Some(path_change) = convert_change(change) {
                    if path_change.touches(path) {
                        changes.push(path_change);
                    }
                }
                Ok::<_, gix::object::tree::diff::for_each::Error>(
                    gix::object::tree::diff::Action::Continue,
                )
            })
            .map_err(|e| {
                CodetraceError::GitError(format!("Failed to process tree changes: {e}"))
            })?;

        debug!(
            "{} change(s) touching {} between {} and {}",
            changes.len(),
            path,
            old_rev,
            new_rev
        );

        Ok(changes)
    }
}

/// 将 gix 的树变更转换为单路径变更记录，目录条目返回 `None`
fn convert_change(change: gix::object::tree::diff::Change) -> Option<PathChange> {
    use gix::object::tree::diff::Change;

    match change {
        Change::Addition {
            location,
            entry_mode,
            ..
        } => (!entry_mode.is_tree()).then(|| PathChange {
            change_type: ChangeType::Added,
            old_path: None,
            new_path: Some(location.to_string()),
        }),
        Change::Deletion {
            location,
            entry_mode,
            ..
        } => (!entry_mode.is_tree()).then(|| PathChange {
            change_type: ChangeType::Deleted,
            old_path: Some(location.to_string()),
            new_path: None,
        }),
        Change::Modification {
            location,
            entry_mode,
            ..
        } => (!entry_mode.is_tree()).then(|| PathChange {
            change_type: ChangeType::Modified,
            old_path: Some(location.to_string()),
            new_path: Some(location.to_string()),
        }),
        Change::Rewrite {
            source_location,
            location,
            entry_mode,
            copy,
            ..
        } => (!entry_mode.is_tree()).then(|| PathChange {
            change_type: if copy {
                ChangeType::Copied
            } else {
                ChangeType::Renamed
            },
            old_path: Some(source_location.to_string()),
            new_path: Some(location.to_string()),
        }),
    }
}
