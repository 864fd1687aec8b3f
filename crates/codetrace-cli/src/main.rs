//! codetrace - 代码历史查询工具
//!
//! 对本地 Git 仓库执行单次查询：文件内容、重命名感知差异、
//! 类型规范键、偏移量行号以及结果缓存的读写。

mod cli;

use cli::{CacheAction, Cli, Command, Config};
use codetrace_core::{
    CommitContentResolver, GitRepository, LineIndex, PackagePathReconciler,
    RenameAwareDiffResolver, Result, ResultCache,
};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

/// 差异歧义时使用的退出码，便于调用方与普通错误区分
const EXIT_AMBIGUOUS: i32 = 2;

fn main() {
    // 解析命令行参数
    let cli = Cli::parse_args();

    // 初始化日志记录，输出到 stderr
    init_logging(cli.verbose);

    // 验证参数
    if let Err(e) = cli.validate() {
        error!("Invalid arguments: {}", e);
        std::process::exit(1);
    }

    let config: Config = cli.into();
    debug!(
        "Configuration: repo_path={}, command={:?}",
        config.repo_path.display(),
        config.command
    );

    // 运行主要逻辑
    if let Err(e) = run(config) {
        error!("Application error: {}", e);
        let code = if e.is_ambiguous() { EXIT_AMBIGUOUS } else { 1 };
        std::process::exit(code);
    }
}

/// 初始化 tracing，`RUST_LOG` 优先于 `--verbose`
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// 主要应用逻辑
fn run(config: Config) -> Result<()> {
    match config.command {
        Command::Show { commit, path } => {
            let repo = GitRepository::open(&config.repo_path)?;
            let text =
                CommitContentResolver::new().resolve(&repo, &commit, Some(path.as_str()))?;
            print!("{}", text.unwrap_or_default());
        }
        Command::Diff {
            old_commit,
            new_commit,
            path,
            similarity,
            no_renames,
            copies,
        } => {
            let repo = GitRepository::open(&config.repo_path)?;
            let renames = Config::rename_detection(similarity, no_renames, copies)?;
            let change = RenameAwareDiffResolver::new()
                .with_rename_detection(renames)
                .diff(&repo, &old_commit, &new_commit, &path)?;

            match change {
                Some(change) => println!("{}", serde_json::to_string_pretty(&change)?),
                None => info!(
                    "{} is unchanged between {} and {}",
                    path, old_commit, new_commit
                ),
            }
        }
        Command::Key {
            file_path,
            qualified_name,
        } => {
            let reconciler = PackagePathReconciler::new();
            let result = reconciler.reconcile_detailed(&file_path, &qualified_name);
            if !result.is_found() {
                debug!("Reconciliation fell back: {:?}", result);
            }
            println!("key: {}", result.key());
            println!(
                "package: {}",
                reconciler.package_of(&file_path, &qualified_name)
            );
            println!(
                "path_key: {}",
                reconciler.path_key(&file_path, &qualified_name)
            );
        }
        Command::Line {
            file,
            offset,
            commit,
        } => {
            let text = match commit {
                Some(commit) => {
                    let repo = GitRepository::open(&config.repo_path)?;
                    CommitContentResolver::new()
                        .resolve_file(&repo, &commit, &file)?
                        .text
                }
                None => std::fs::read_to_string(&file)?,
            };

            let index = LineIndex::build(&text);
            if offset > index.text_len() {
                info!(
                    "Offset {} is past the end of {} ({} bytes)",
                    offset,
                    file,
                    index.text_len()
                );
            }
            println!("{}", index.line_of(offset));
        }
        Command::Cache { file, action } => run_cache(ResultCache::open(file), action)?,
    }

    Ok(())
}

/// 缓存子命令
fn run_cache(mut cache: ResultCache, action: CacheAction) -> Result<()> {
    match action {
        CacheAction::Get { key } => match cache.get(&key) {
            Some(value) => println!("{}", serde_json::to_string_pretty(value)?),
            None => info!("{} is not cached in {}", key, cache.path().display()),
        },
        CacheAction::Put { key, value } => {
            let value: serde_json::Value =
                serde_json::from_str(&value).unwrap_or(serde_json::Value::String(value));
            if cache.contains_key(&key) {
                info!("Key {} already cached, keeping the first value", key);
            }
            cache.put(key, value);
            cache.save()?;
        }
    }

    Ok(())
}
