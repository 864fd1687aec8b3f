//! 命令行接口模块
//!
//! 提供命令行参数解析和参数校验功能

use clap::{Parser, Subcommand};
use codetrace_core::{CodetraceError, RenameDetection, Result};
use std::path::PathBuf;

/// codetrace - 代码历史查询工具
///
/// 对本地 Git 仓库执行单次历史查询，便于检查核心库的行为。
#[derive(Parser, Debug)]
#[command(name = "codetrace")]
#[command(author = "codetrace contributors")]
#[command(version = "0.1.0")]
#[command(about = "Inspect file history lookups in a local Git repository")]
#[command(
    long_about = "codetrace exposes the core history lookups: file content at a commit, rename-aware single-path diffs, canonical type keys, offset-to-line mapping and the persisted result cache."
)]
pub struct Cli {
    /// 仓库路径
    #[arg(
        short = 'r',
        long = "repo",
        env = "CODETRACE_REPO",
        default_value = ".",
        global = true,
        help = "Path to the Git repository",
        value_name = "PATH"
    )]
    pub repo_path: PathBuf,

    /// 详细输出
    #[arg(
        short = 'v',
        long = "verbose",
        global = true,
        help = "Enable verbose logging output"
    )]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// 子命令
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// 输出文件在某个提交中的内容
    Show {
        #[arg(value_name = "COMMIT", help = "Revision to read from")]
        commit: String,
        #[arg(value_name = "PATH", help = "Repository-relative file path")]
        path: String,
    },

    /// 输出单个路径在两个提交之间的变更
    Diff {
        #[arg(value_name = "OLD", help = "Old revision")]
        old_commit: String,
        #[arg(value_name = "NEW", help = "New revision")]
        new_commit: String,
        #[arg(value_name = "PATH", help = "Repository-relative file path")]
        path: String,

        /// 重命名相似度阈值（百分比）
        #[arg(
            long = "similarity",
            value_name = "PERCENT",
            default_value_t = 50,
            help = "Minimum content similarity for rename detection (0-100)",
            value_parser = clap::value_parser!(u8).range(0..=100)
        )]
        similarity: u8,

        /// 关闭重命名检测
        #[arg(long = "no-renames", help = "Disable rename detection")]
        no_renames: bool,

        /// 检测复制
        #[arg(long = "copies", help = "Also detect copies from modified files")]
        copies: bool,
    },

    /// 计算文件路径与限定类型名的规范键
    Key {
        #[arg(value_name = "FILE_PATH", help = "File path as recorded in history")]
        file_path: String,
        #[arg(value_name = "QUALIFIED_NAME", help = "Fully qualified type name")]
        qualified_name: String,
    },

    /// 将字节偏移转换为行号
    Line {
        #[arg(value_name = "FILE", help = "File to index")]
        file: String,
        #[arg(value_name = "OFFSET", help = "Byte offset into the file")]
        offset: usize,

        /// 从指定提交读取文件，而不是工作区
        #[arg(
            long = "commit",
            value_name = "COMMIT",
            help = "Read FILE from this revision instead of the filesystem"
        )]
        commit: Option<String>,
    },

    /// 读写结果缓存
    Cache {
        #[arg(
            long = "file",
            value_name = "CACHE_FILE",
            default_value = ".codetrace/cache.json",
            help = "Cache file location"
        )]
        file: PathBuf,

        #[command(subcommand)]
        action: CacheAction,
    },
}

/// 缓存操作
#[derive(Subcommand, Debug, Clone)]
pub enum CacheAction {
    /// 查询键
    Get {
        #[arg(value_name = "KEY")]
        key: String,
    },
    /// 写入键（键已存在时不覆盖）
    Put {
        #[arg(value_name = "KEY")]
        key: String,
        #[arg(value_name = "VALUE", help = "String value, or JSON when it parses as JSON")]
        value: String,
    },
}

/// 应用程序配置信息
#[derive(Debug, Clone)]
pub struct Config {
    /// 仓库路径
    pub repo_path: PathBuf,
    /// 是否启用详细输出
    pub verbose: bool,
    /// 要执行的子命令
    pub command: Command,
}

impl Command {
    /// 子命令是否需要打开仓库
    pub fn needs_repository(&self) -> bool {
        match self {
            Command::Show { .. } | Command::Diff { .. } => true,
            Command::Line { commit, .. } => commit.is_some(),
            Command::Key { .. } | Command::Cache { .. } => false,
        }
    }
}

impl Config {
    /// 根据 diff 子命令的参数构造重命名检测配置
    pub fn rename_detection(
        similarity: u8,
        no_renames: bool,
        copies: bool,
    ) -> Result<RenameDetection> {
        if no_renames {
            return Ok(RenameDetection::disabled());
        }

        Ok(RenameDetection::default()
            .with_similarity(Some(f32::from(similarity) / 100.0))?
            .with_copies(copies))
    }
}

impl From<Cli> for Config {
    fn from(cli: Cli) -> Self {
        Config {
            repo_path: cli.repo_path,
            verbose: cli.verbose,
            command: cli.command,
        }
    }
}

impl Cli {
    /// 解析命令行参数
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// 验证参数的有效性
    pub fn validate(&self) -> Result<()> {
        // 验证仓库路径
        if self.command.needs_repository() && !self.repo_path.exists() {
            return Err(CodetraceError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!(
                    "Repository path does not exist: {}",
                    self.repo_path.display()
                ),
            )));
        }

        match &self.command {
            Command::Show { commit, .. } | Command::Line { commit: Some(commit), .. }
                if commit.is_empty() =>
            {
                Err(CodetraceError::InvalidRevision(
                    "Revision cannot be empty".to_string(),
                ))
            }
            Command::Diff {
                old_commit,
                new_commit,
                ..
            } if old_commit.is_empty() || new_commit.is_empty() => Err(
                CodetraceError::InvalidRevision("Revision cannot be empty".to_string()),
            ),
            _ => Ok(()),
        }
    }
}
