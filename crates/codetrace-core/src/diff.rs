//! 重命名感知的单路径差异模块
//!
//! 比较两个提交之间某一个逻辑文件的变化，并开启重命名追踪：
//! 旧提交中的 `path` 可以在新提交中以另一个路径出现。

use crate::error::{CodetraceError, Result};
use crate::git::TreeSource;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// 变更类型枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Added,
    Modified,
    Deleted,
    Renamed,
    Copied,
}

/// 单个路径在两个提交之间的变更记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathChange {
    pub change_type: ChangeType,
    /// 旧提交中的路径，新增文件为 `None`
    pub old_path: Option<String>,
    /// 新提交中的路径，删除文件为 `None`
    pub new_path: Option<String>,
}

impl PathChange {
    /// 旧路径或新路径是否等于 `path`
    pub fn touches(&self, path: &str) -> bool {
        self.old_path.as_deref() == Some(path) || self.new_path.as_deref() == Some(path)
    }

    /// 是否为路径发生变化的变更（重命名或复制）
    pub fn is_move(&self) -> bool {
        matches!(self.change_type, ChangeType::Renamed | ChangeType::Copied)
    }
}

/// 重命名检测配置
#[derive(Debug, Clone, PartialEq)]
pub struct RenameDetection {
    enabled: bool,
    /// 内容相似度阈值（0.0 - 1.0），`None` 表示只匹配完全相同的内容
    similarity: Option<f32>,
    /// 参与相似度比较的最大候选数量，0 表示不限
    limit: usize,
    track_copies: bool,
}

impl Default for RenameDetection {
    fn default() -> Self {
        Self {
            enabled: true,
            similarity: Some(0.5),
            limit: 1000,
            track_copies: false,
        }
    }
}

impl RenameDetection {
    /// 关闭重命名检测
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// 设置相似度阈值
    pub fn with_similarity(mut self, similarity: Option<f32>) -> Result<Self> {
        if let Some(value) = similarity {
            if !(0.0..=1.0).contains(&value) {
                return Err(CodetraceError::ConfigError(format!(
                    "Rename similarity must be between 0.0 and 1.0, got {value}"
                )));
            }
        }
        self.similarity = similarity;
        Ok(self)
    }

    /// 设置候选数量上限
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// 是否同时检测复制
    pub fn with_copies(mut self, track_copies: bool) -> Self {
        self.track_copies = track_copies;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn similarity(&self) -> Option<f32> {
        self.similarity
    }

    /// 转换为 gix 的重写追踪配置
    pub(crate) fn to_rewrites(&self) -> Option<gix::diff::Rewrites> {
        if !self.enabled {
            return None;
        }

        let copies = self.track_copies.then(|| gix::diff::rewrites::Copies {
            source: gix::diff::rewrites::CopySource::FromSetOfModifiedFiles,
            percentage: self.similarity,
        });

        Some(gix::diff::Rewrites {
            copies,
            percentage: self.similarity,
            limit: self.limit,
            ..Default::default()
        })
    }
}

/// 重命名感知的差异解析器
#[derive(Debug, Clone, Default)]
pub struct RenameAwareDiffResolver {
    renames: RenameDetection,
}

impl RenameAwareDiffResolver {
    /// 使用默认重命名检测配置创建解析器
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rename_detection(mut self, renames: RenameDetection) -> Self {
        self.renames = renames;
        self
    }

    pub fn rename_detection(&self) -> &RenameDetection {
        &self.renames
    }

    /// 计算 `path` 在两个提交之间的变更
    ///
    /// 返回 `Ok(None)` 表示没有变化。同一路径匹配到多个变更时返回
    /// [`CodetraceError::Ambiguous`]，由调用方决定跳过还是中止。
    pub fn diff(
        &self,
        repo: &impl TreeSource,
        old_commit: &str,
        new_commit: &str,
        path: &str,
    ) -> Result<Option<PathChange>> {
        let old_id = repo.resolve_commit(old_commit)?;
        let new_id = repo.resolve_commit(new_commit)?;

        if old_id == new_id {
            debug!("Identical commits {}, skipping diff of {}", old_id, path);
            return Ok(None);
        }

        let candidates = repo.changes_for_path(&old_id, &new_id, path, &self.renames)?;
        single_change(candidates, &old_id, &new_id, path)
    }
}

/// 保证每个 `(old, new, path)` 至多对应一个变更
fn single_change(
    mut candidates: Vec<PathChange>,
    old_commit: &str,
    new_commit: &str,
    path: &str,
) -> Result<Option<PathChange>> {
    match candidates.len() {
        0 => Ok(None),
        1 => Ok(candidates.pop()),
        _ => Err(CodetraceError::Ambiguous {
            old_commit: old_commit.to_string(),
            new_commit: new_commit.to_string(),
            path: path.to_string(),
            candidates,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestRepo;
    use pretty_assertions::assert_eq;

    /// 返回固定变更列表的仓库实现
    struct FixedChanges {
        changes: Vec<PathChange>,
    }

    impl TreeSource for FixedChanges {
        fn resolve_commit(&self, rev: &str) -> Result<String> {
            Ok(rev.to_string())
        }

        fn read_blob(&self, _rev: &str, _path: &str) -> Result<Option<Vec<u8>>> {
            Ok(None)
        }

        fn changes_for_path(
            &self,
            _old_rev: &str,
            _new_rev: &str,
            path: &str,
            _renames: &RenameDetection,
        ) -> Result<Vec<PathChange>> {
            Ok(self
                .changes
                .iter()
                .filter(|change| change.touches(path))
                .cloned()
                .collect())
        }
    }

    fn rename(old: &str, new: &str) -> PathChange {
        PathChange {
            change_type: ChangeType::Renamed,
            old_path: Some(old.to_string()),
            new_path: Some(new.to_string()),
        }
    }

    #[test]
    fn test_two_renames_to_same_path_are_ambiguous() {
        let source = FixedChanges {
            changes: vec![
                rename("a/Foo.java", "b/Foo.java"),
                rename("c/Foo.java", "b/Foo.java"),
            ],
        };

        let err = RenameAwareDiffResolver::new()
            .diff(&source, "c1", "c2", "b/Foo.java")
            .unwrap_err();

        assert!(err.is_ambiguous());
        match err {
            CodetraceError::Ambiguous {
                candidates, path, ..
            } => {
                assert_eq!(path, "b/Foo.java");
                assert_eq!(candidates.len(), 2);
            }
            other => panic!("Expected ambiguous error, got {other:?}"),
        }
    }

    #[test]
    fn test_single_rename_is_returned() {
        let source = FixedChanges {
            changes: vec![rename("a/Foo.java", "b/Foo.java")],
        };

        let change = RenameAwareDiffResolver::new()
            .diff(&source, "c1", "c2", "a/Foo.java")
            .unwrap();

        assert_eq!(change, Some(rename("a/Foo.java", "b/Foo.java")));
    }

    #[test]
    fn test_identical_commits_never_change() {
        let source = FixedChanges {
            changes: vec![rename("a/Foo.java", "b/Foo.java")],
        };

        let change = RenameAwareDiffResolver::new()
            .diff(&source, "c1", "c1", "a/Foo.java")
            .unwrap();

        assert_eq!(change, None);
    }

    #[test]
    fn test_similarity_validation() {
        assert!(RenameDetection::default().with_similarity(Some(0.9)).is_ok());
        assert!(RenameDetection::default().with_similarity(None).is_ok());
        assert!(matches!(
            RenameDetection::default().with_similarity(Some(1.5)),
            Err(CodetraceError::ConfigError(_))
        ));
    }

    #[test]
    fn test_disabled_detection_has_no_rewrites() {
        assert!(RenameDetection::disabled().to_rewrites().is_none());
        let rewrites = RenameDetection::default().to_rewrites().unwrap();
        assert_eq!(rewrites.percentage, Some(0.5));
        assert!(rewrites.copies.is_none());
    }

    #[test]
    fn test_diff_follows_rename_in_repository() {
        let repo = TestRepo::new();
        let content = "class Bar {\n    int a;\n    int b;\n    int c;\n}\n";
        repo.write("src/org/foo/Bar.java", content);
        repo.write("src/org/foo/Other.java", "class Other {}\n");
        let first = repo.commit("Add Bar");
        repo.remove("src/org/foo/Bar.java");
        repo.write("src/org/baz/Bar.java", content);
        let second = repo.commit("Move Bar");

        let git = repo.open();
        let change = RenameAwareDiffResolver::new()
            .diff(&git, &first, &second, "src/org/foo/Bar.java")
            .unwrap()
            .expect("rename should be reported");

        assert_eq!(change.change_type, ChangeType::Renamed);
        assert!(change.is_move());
        assert_eq!(change.new_path.as_deref(), Some("src/org/baz/Bar.java"));
    }

    #[test]
    fn test_replacing_renamed_path_yields_one_change_per_path() {
        let repo = TestRepo::new();
        let content = "class Foo {\n    int a;\n    int b;\n    int c;\n}\n";
        repo.write("src/Foo.java", content);
        repo.write("src/Keep.java", "class Keep {}\n");
        let first = repo.commit("Add Foo");
        repo.write("src/Bar.java", content);
        repo.write("src/Foo.java", "interface Foo {\n    void run();\n}\n");
        let second = repo.commit("Move Foo to Bar and add a new Foo");

        let git = repo.open();
        let resolver = RenameAwareDiffResolver::new();

        // 两个树中都存在 src/Foo.java，它是修改而不是重命名的来源
        assert_eq!(
            resolver.diff(&git, &first, &second, "src/Foo.java").unwrap(),
            Some(PathChange {
                change_type: ChangeType::Modified,
                old_path: Some("src/Foo.java".to_string()),
                new_path: Some("src/Foo.java".to_string()),
            })
        );
        assert_eq!(
            resolver.diff(&git, &first, &second, "src/Bar.java").unwrap(),
            Some(PathChange {
                change_type: ChangeType::Added,
                old_path: None,
                new_path: Some("src/Bar.java".to_string()),
            })
        );
    }

    #[test]
    fn test_diff_same_commit_in_repository() {
        let repo = TestRepo::new();
        repo.write("a.txt", "alpha\n");
        let commit = repo.commit("Add a.txt");

        let git = repo.open();
        let resolver = RenameAwareDiffResolver::new();
        assert_eq!(resolver.diff(&git, &commit, &commit, "a.txt").unwrap(), None);
        assert_eq!(resolver.diff(&git, &commit, "HEAD", "a.txt").unwrap(), None);
    }

    #[test]
    fn test_diff_unchanged_path_in_repository() {
        let repo = TestRepo::new();
        repo.write("a.txt", "alpha\n");
        repo.write("b.txt", "beta\n");
        let first = repo.commit("Add files");
        repo.write("b.txt", "beta two\n");
        let second = repo.commit("Modify b.txt");

        let git = repo.open();
        let resolver = RenameAwareDiffResolver::new();
        assert_eq!(resolver.diff(&git, &first, &second, "a.txt").unwrap(), None);
        assert_eq!(
            resolver.diff(&git, &first, &second, "b.txt").unwrap(),
            Some(PathChange {
                change_type: ChangeType::Modified,
                old_path: Some("b.txt".to_string()),
                new_path: Some("b.txt".to_string()),
            })
        );
    }
}
