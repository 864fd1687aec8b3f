//! 单元测试用的临时 Git 仓库

use crate::git::GitRepository;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

/// 使用系统 git 命令构建的临时仓库（仅用于测试）
pub(crate) struct TestRepo {
    temp_dir: TempDir,
}

impl TestRepo {
    /// 初始化仓库并配置提交用户
    pub(crate) fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let repo = Self { temp_dir };

        repo.git(&["init"]);
        repo.git(&["config", "user.name", "Test User"]);
        repo.git(&["config", "user.email", "test@example.com"]);
        repo.git(&["config", "commit.gpgsign", "false"]);

        repo
    }

    pub(crate) fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// 写入文件，自动创建父目录
    pub(crate) fn write(&self, file_name: &str, content: &str) {
        let file_path = self.path().join(file_name);
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(&file_path, content).expect("Failed to write file");
    }

    pub(crate) fn remove(&self, file_name: &str) {
        std::fs::remove_file(self.path().join(file_name)).expect("Failed to remove file");
    }

    /// 提交工作区的全部改动并返回提交哈希
    pub(crate) fn commit(&self, message: &str) -> String {
        self.git(&["add", "-A"]);
        self.git(&["commit", "-m", message]);
        self.git(&["rev-parse", "HEAD"]).trim().to_string()
    }

    pub(crate) fn open(&self) -> GitRepository {
        GitRepository::open(self.path()).expect("Failed to open test repository")
    }

    fn git(&self, args: &[&str]) -> String {
        let output = Command::new("git")
            .args(args)
            .current_dir(self.path())
            .output()
            .expect("Failed to run git");

        if !output.status.success() {
            panic!(
                "git {:?} failed: {}",
                args,
                String::from_utf8_lossy(&output.stderr)
            );
        }

        String::from_utf8(output.stdout).expect("Invalid git output")
    }
}
