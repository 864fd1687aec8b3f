//! 偏移量到行号的映射模块
//!
//! 对一段文本预先计算所有换行符的字节偏移，之后通过二分查找把语法树
//! 报告的偏移量映射为从 1 开始的行号。同一份文本只需构建一次索引。

use tree_sitter::Node;

/// 行号索引
///
/// 构建时完整扫描文本，构建完成前无法查询。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    /// 每个 `\n` 的字节偏移，严格递增
    newlines: Vec<usize>,
    len: usize,
}

impl LineIndex {
    /// 扫描文本构建索引
    pub fn build(text: &str) -> Self {
        let newlines = text
            .bytes()
            .enumerate()
            .filter_map(|(offset, byte)| (byte == b'\n').then_some(offset))
            .collect();

        Self {
            newlines,
            len: text.len(),
        }
    }

    /// 字节偏移所在的行号（从 1 开始）
    ///
    /// 超出文本末尾的偏移归入最后一行。换行符本身属于它结束的那一行。
    pub fn line_of(&self, offset: usize) -> usize {
        let offset = offset.min(self.len);
        self.newlines.partition_point(|&newline| newline < offset) + 1
    }

    /// 总行数，等于换行符数量加一
    pub fn line_count(&self) -> usize {
        self.newlines.len() + 1
    }

    /// 指定行第一个字节的偏移，行号越界时返回 `None`
    pub fn line_start(&self, line: usize) -> Option<usize> {
        match line {
            0 => None,
            1 => Some(0),
            _ => self.newlines.get(line - 2).map(|&newline| newline + 1),
        }
    }

    /// 文本长度（字节）
    pub fn text_len(&self) -> usize {
        self.len
    }

    /// 语法树节点覆盖的起止行号（从 1 开始）
    ///
    /// 结束偏移是开区间，所以按最后一个字节计算结束行。
    pub fn node_lines(&self, node: &Node) -> (usize, usize) {
        let start = node.start_byte();
        let end = node.end_byte();
        let last = if end > start { end - 1 } else { start };
        (self.line_of(start), self.line_of(last))
    }
}
