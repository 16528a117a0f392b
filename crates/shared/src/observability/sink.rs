//! # ログ出力先
//!
//! [`Logger`](super::Logger) がシリアライズ済みの 1 行を書き込む先を抽象化する。

use std::{
    io::{self, Write},
    sync::{Arc, Mutex, PoisonError},
};

/// ログ出力先トレイト
///
/// `line` は末尾に改行を含む 1 レコード分の JSON。
/// 書き込みエラーは [`Logger`](super::Logger) 側で握りつぶされる。
pub trait LogSink: Send + Sync {
    fn write_line(&self, line: &[u8]) -> io::Result<()>;
}

/// 標準出力への書き込み
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutSink;

impl LogSink for StdoutSink {
    fn write_line(&self, line: &[u8]) -> io::Result<()> {
        // ロックを取ってから書くことで、並行リクエストの行が混ざらない
        let mut stdout = io::stdout().lock();
        stdout.write_all(line)?;
        stdout.flush()
    }
}

/// メモリ上に書き込む出力先
///
/// テストで出力内容を検証するために使う。clone は同じバッファを共有する。
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// 書き込まれた内容全体
    pub fn contents(&self) -> String {
        let buffer = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&buffer).into_owned()
    }

    /// 書き込まれた行
    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_owned).collect()
    }

    /// 書き込まれた行を JSON として解釈したもの（解釈できない行は除く）
    pub fn records(&self) -> Vec<serde_json::Value> {
        self.lines()
            .iter()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect()
    }
}

impl LogSink for MemorySink {
    fn write_line(&self, line: &[u8]) -> io::Result<()> {
        let mut buffer = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
        buffer.extend_from_slice(line);
        Ok(())
    }
}
