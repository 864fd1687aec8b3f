//! codetrace-core - 代码历史追踪核心库
//!
//! 为上层的代码历史工具回答四类问题：某个提交中文件的内容、两个提交之间
//! 某个路径（含重命名）是否变化、如何为类型生成跨历史稳定的标识键、以及
//! 语法树偏移量对应的行号；另外提供一个持久化的结果缓存。

pub mod cache;
pub mod content;
pub mod diff;
pub mod error;
pub mod git;
pub mod position;
pub mod reconcile;

#[cfg(test)]
pub(crate) mod test_support;

// 重新导出主要的公共 API
pub use cache::{LoadState, ResultCache};
pub use content::{CommitContentResolver, FileContent};
pub use diff::{ChangeType, PathChange, RenameAwareDiffResolver, RenameDetection};
pub use error::{CodetraceError, Result};
pub use git::{GitRepository, TreeSource};
pub use position::LineIndex;
pub use reconcile::{FallbackReason, PackagePathReconciler, Reconciliation};
