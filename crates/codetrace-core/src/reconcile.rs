//! 文件路径与限定类型名的对齐模块
//!
//! 目录结构并不总是与限定类型名一一对应（嵌套类型与外部类型共用一个文件，
//! 历史中积累的大小写差异等）。这里通过两者的最长公共子串推断共享的包前缀，
//! 得到跨提交稳定的规范键。

use tracing::debug;

/// 对齐失败的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    /// 限定名为空
    EmptyName,
    /// 目录与限定名没有公共子串
    NoCommonSubstring,
    /// 公共子串不是限定名的前缀
    PrefixNotConfirmed,
}

/// 对齐结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// 找到了共享前缀
    Found {
        /// 规范键：小写路径中共享前缀之前的部分
        key: String,
        /// 推断出的包名，可能为空
        package: String,
    },
    /// 无法对齐，`key` 为原始目录
    Fallback { key: String, reason: FallbackReason },
}

impl Reconciliation {
    pub fn key(&self) -> &str {
        match self {
            Reconciliation::Found { key, .. } | Reconciliation::Fallback { key, .. } => key,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Reconciliation::Found { .. })
    }

    pub fn into_key(self) -> String {
        match self {
            Reconciliation::Found { key, .. } | Reconciliation::Fallback { key, .. } => key,
        }
    }
}

/// 路径与限定名对齐器
#[derive(Debug, Clone, Copy, Default)]
pub struct PackagePathReconciler;

impl PackagePathReconciler {
    pub fn new() -> Self {
        Self
    }

    /// 计算 `file_path` 与 `qualified_name` 的规范键
    pub fn reconcile(&self, file_path: &str, qualified_name: &str) -> String {
        self.reconcile_detailed(file_path, qualified_name).into_key()
    }

    /// 推断包名，任何失败都返回空字符串
    pub fn package_of(&self, file_path: &str, qualified_name: &str) -> String {
        match self.reconcile_detailed(file_path, qualified_name) {
            Reconciliation::Found { package, .. } => package,
            Reconciliation::Fallback { .. } => String::new(),
        }
    }

    /// 组合规范键与限定名，作为跨提交关联类型的标识
    pub fn path_key(&self, file_path: &str, qualified_name: &str) -> String {
        format!(
            "{}#{}",
            self.reconcile(file_path, qualified_name),
            qualified_name
        )
    }

    /// 计算规范键并给出详细结果
    pub fn reconcile_detailed(&self, file_path: &str, qualified_name: &str) -> Reconciliation {
        let normalized = file_path.replace('\\', "/");
        let directory = directory_of(&normalized).to_string();

        if qualified_name.trim().is_empty() {
            return Reconciliation::Fallback {
                key: directory,
                reason: FallbackReason::EmptyName,
            };
        }

        let lower_directory: Vec<char> = directory.to_lowercase().chars().collect();
        let lower_name: Vec<char> = qualified_name.to_lowercase().chars().collect();
        let slashed_name: Vec<char> = lower_name
            .iter()
            .map(|&c| if c == '.' { '/' } else { c })
            .collect();

        let common = longest_common_substring(&lower_directory, &slashed_name);
        if common.is_empty() {
            return Reconciliation::Fallback {
                key: directory,
                reason: FallbackReason::NoCommonSubstring,
            };
        }

        let dotted: Vec<char> = common
            .iter()
            .map(|&c| if c == '/' { '.' } else { c })
            .collect();
        if !lower_name.starts_with(&dotted) {
            debug!(
                "Common substring of {} and {} is not a name prefix",
                file_path, qualified_name
            );
            return Reconciliation::Fallback {
                key: directory,
                reason: FallbackReason::PrefixNotConfirmed,
            };
        }

        let lower_path = normalized.to_lowercase();
        let prefix: String = common.iter().collect();
        // 前缀的各次出现从左到右互不重叠，取最后一次出现的起点
        let Some(position) = lower_path
            .match_indices(prefix.as_str())
            .last()
            .map(|(index, _)| index)
        else {
            return Reconciliation::Fallback {
                key: directory,
                reason: FallbackReason::PrefixNotConfirmed,
            };
        };

        Reconciliation::Found {
            key: lower_path[..position].to_string(),
            package: package_prefix(qualified_name, dotted.len()),
        }
    }
}

/// 路径中最后一个 `/` 之前（含）的部分，没有目录时为空
fn directory_of(path: &str) -> &str {
    match path.rfind('/') {
        Some(index) => &path[..=index],
        None => "",
    }
}

/// 取限定名前 `len` 个字符中完整的包段，不包含最后的类型名
fn package_prefix(qualified_name: &str, len: usize) -> String {
    let segments: Vec<&str> = qualified_name.split('.').collect();
    let mut package = Vec::new();
    let mut consumed = 0;

    // 最后一段是类型名本身
    for segment in &segments[..segments.len().saturating_sub(1)] {
        if segment.is_empty() {
            return String::new();
        }
        consumed += segment.chars().count();
        if consumed > len {
            break;
        }
        package.push(*segment);
        consumed += 1;
    }

    package.join(".")
}

/// 最长公共连续子串，只保留两行动态规划表
///
/// 长度相同时取在 `a` 中最先结束的那个。
pub fn longest_common_substring(a: &[char], b: &[char]) -> Vec<char> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }

    let mut previous = vec![0usize; b.len() + 1];
    let mut current = vec![0usize; b.len() + 1];
    let mut best_len = 0;
    let mut best_end = 0;

    for i in 1..=a.len() {
        for j in 1..=b.len() {
            current[j] = if a[i - 1] == b[j - 1] {
                previous[j - 1] + 1
            } else {
                0
            };
            if current[j] > best_len {
                best_len = current[j];
                best_end = i;
            }
        }
        std::mem::swap(&mut previous, &mut current);
    }

    a[best_end - best_len..best_end].to_vec()
}
