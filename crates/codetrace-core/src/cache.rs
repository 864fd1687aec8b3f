//! 结果缓存模块
//!
//! 持久化的键值缓存，保证每个 `(commit, element)` 的昂贵结果在多次运行之间
//! 只计算一次。缓存文件是一个 JSON 对象，整体读取、合并后整体写回。
//!
//! 写回时没有加锁：两个进程同时保存时，后写入的进程覆盖整个文件。

use crate::error::Result;
use serde_json::{Map, Value};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// 缓存加载状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    /// 从缓存文件读取了指定数量的条目
    Loaded(usize),
    /// 缓存文件不存在
    Missing,
    /// 缓存文件无法读取或解析，以空缓存启动
    Degraded(String),
}

/// 持久化的结果缓存
#[derive(Debug)]
pub struct ResultCache {
    path: PathBuf,
    entries: Map<String, Value>,
    load_state: LoadState,
}

impl ResultCache {
    /// 打开缓存文件
    ///
    /// 文件不存在、无法读取或不是 JSON 对象时都以空缓存启动，不会返回错误。
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();

        let (entries, load_state) = if path.exists() {
            match read_entries(&path) {
                Ok(entries) => {
                    debug!("Loaded {} cache entries from {}", entries.len(), path.display());
                    let count = entries.len();
                    (entries, LoadState::Loaded(count))
                }
                Err(reason) => {
                    warn!(
                        "Cache file {} is unavailable, starting empty: {}",
                        path.display(),
                        reason
                    );
                    (Map::new(), LoadState::Degraded(reason.to_string()))
                }
            }
        } else {
            (Map::new(), LoadState::Missing)
        };

        Self {
            path,
            entries,
            load_state,
        }
    }

    /// 查询缓存值
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// 查询字符串类型的缓存值
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.entries.get(key).and_then(Value::as_str)
    }

    /// 插入缓存值
    ///
    /// 只在键不存在时插入：同一个键第一次写入的值会一直保留到进程结束，
    /// 之后的写入被静默忽略。
    pub fn put(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        if self.entries.contains_key(&key) {
            return;
        }
        self.entries.insert(key, value.into());
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load_state
    }

    /// 保存到缓存文件
    ///
    /// 文件已存在时重新读取，把内存中的条目覆盖上去后整体写回；
    /// 键冲突时以内存中的值为准。内存状态不会改变。
    ///
    /// 文件内容无法解析时直接替换；重新读取时的 I/O 错误会返回给调用方，
    /// 文件保持原样。
    pub fn save(&self) -> Result<()> {
        let mut merged = if self.path.exists() {
            match read_entries(&self.path) {
                Ok(entries) => entries,
                Err(ReadFailure::Io(e)) => return Err(e.into()),
                Err(reason @ ReadFailure::Content(_)) => {
                    warn!(
                        "Replacing unreadable cache file {}: {}",
                        self.path.display(),
                        reason
                    );
                    Map::new()
                }
            }
        } else {
            Map::new()
        };

        for (key, value) in &self.entries {
            merged.insert(key.clone(), value.clone());
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(&Value::Object(merged))?;
        fs::write(&self.path, json)?;

        debug!(
            "Saved {} in-memory cache entries to {}",
            self.entries.len(),
            self.path.display()
        );
        Ok(())
    }
}

/// 读取缓存文件失败的原因
#[derive(Debug)]
enum ReadFailure {
    /// 文件无法读取
    Io(io::Error),
    /// 文件可以读取，但不是合法的 JSON 对象
    Content(String),
}

impl fmt::Display for ReadFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadFailure::Io(e) => write!(f, "{e}"),
            ReadFailure::Content(reason) => f.write_str(reason),
        }
    }
}

/// 读取并解析缓存文件
fn read_entries(path: &Path) -> std::result::Result<Map<String, Value>, ReadFailure> {
    let data = fs::read(path).map_err(ReadFailure::Io)?;
    let value = serde_json::from_slice::<Value>(&data)
        .map_err(|e| ReadFailure::Content(e.to_string()))?;

    match value {
        Value::Object(entries) => Ok(entries),
        other => Err(ReadFailure::Content(format!(
            "expected a JSON object, found {}",
            kind_of(&other)
        ))),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
