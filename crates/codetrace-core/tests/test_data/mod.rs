//! 测试数据集模块
//!
//! 提供带有多次提交历史的临时 Git 仓库

use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// 一次提交中的文件操作
pub enum FileOp {
    Write(&'static str, String),
    Remove(&'static str),
}

/// 带历史的测试仓库
pub struct HistoryRepo {
    pub temp_dir: TempDir,
    /// 按提交顺序排列的提交哈希
    pub commits: Vec<String>,
}

impl HistoryRepo {
    /// 创建空仓库
    pub fn new() -> std::io::Result<Self> {
        let temp_dir = TempDir::new()?;
        let repo = Self {
            temp_dir,
            commits: Vec::new(),
        };

        repo.git(&["init"])?;
        repo.git(&["config", "user.name", "Test User"])?;
        repo.git(&["config", "user.email", "test@example.com"])?;
        repo.git(&["config", "commit.gpgsign", "false"])?;

        Ok(repo)
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// 应用一组文件操作并提交
    pub fn commit(&mut self, message: &str, ops: Vec<FileOp>) -> std::io::Result<String> {
        for op in ops {
            match op {
                FileOp::Write(name, content) => {
                    let file_path: PathBuf = self.path().join(name);
                    if let Some(parent) = file_path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(file_path, content)?;
                }
                FileOp::Remove(name) => std::fs::remove_file(self.path().join(name))?,
            }
        }

        self.git(&["add", "-A"])?;
        self.git(&["commit", "-m", message])?;
        let hash = self.git(&["rev-parse", "HEAD"])?.trim().to_string();
        self.commits.push(hash.clone());
        Ok(hash)
    }

    fn git(&self, args: &[&str]) -> std::io::Result<String> {
        let output = Command::new("git")
            .args(args)
            .current_dir(self.path())
            .output()?;

        if !output.status.success() {
            return Err(std::io::Error::other(format!(
                "git {:?} failed: {}",
                args,
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

/// Java 风格的类源码，`fields` 决定类体的行数
pub fn java_class(package: &str, name: &str, fields: usize) -> String {
    let mut source = format!("package {package};\n\npublic class {name} {{\n");
    for i in 0..fields {
        source.push_str(&format!("    private int field{i} = {i};\n"));
    }
    source.push_str("}\n");
    source
}

/// 构建一段包含修改、移动包和删除的历史
///
/// 1. 新增 `org/foo/Bar.java` 和 `org/foo/Baz.java`
/// 2. 修改 `Bar.java`
/// 3. 将 `Bar.java` 移动到 `org/moved/`（内容只改包名）
/// 4. 删除 `Baz.java`
pub fn create_java_history() -> std::io::Result<HistoryRepo> {
    let mut repo = HistoryRepo::new()?;

    repo.commit(
        "Add Bar and Baz",
        vec![
            FileOp::Write(
                "src/main/java/org/foo/Bar.java",
                java_class("org.foo", "Bar", 10),
            ),
            FileOp::Write(
                "src/main/java/org/foo/Baz.java",
                java_class("org.foo", "Baz", 3),
            ),
        ],
    )?;

    repo.commit(
        "Grow Bar",
        vec![FileOp::Write(
            "src/main/java/org/foo/Bar.java",
            java_class("org.foo", "Bar", 12),
        )],
    )?;

    repo.commit(
        "Move Bar to org.moved",
        vec![
            FileOp::Remove("src/main/java/org/foo/Bar.java"),
            FileOp::Write(
                "src/main/java/org/moved/Bar.java",
                java_class("org.moved", "Bar", 12),
            ),
        ],
    )?;

    repo.commit(
        "Remove Baz",
        vec![FileOp::Remove("src/main/java/org/foo/Baz.java")],
    )?;

    Ok(repo)
}
