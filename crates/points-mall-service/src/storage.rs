//! 导出文件存储
//!
//! 导出的 CSV 通过存储接口落盘并换取带时效的下载链接。
//! 内置内存实现用于开发环境和集成测试，生产环境可替换为对象存储。

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use tracing::debug;

use crate::error::{MallError, Result};

/// 导出文件存储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExportStorage: Send + Sync {
    /// 写入文件内容，同名覆盖
    async fn put(&self, file_name: &str, bytes: Vec<u8>) -> Result<()>;

    /// 生成带时效的下载链接
    async fn signed_url(&self, file_name: &str, ttl_seconds: u64) -> Result<String>;
}

/// 内存存储实现
#[derive(Default)]
pub struct MemoryExportStorage {
    files: DashMap<String, Vec<u8>>,
}

impl MemoryExportStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// 读取已存储的文件内容（测试用）
    pub fn get(&self, file_name: &str) -> Option<Vec<u8>> {
        self.files.get(file_name).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[async_trait]
impl ExportStorage for MemoryExportStorage {
    async fn put(&self, file_name: &str, bytes: Vec<u8>) -> Result<()> {
        debug!(file_name = %file_name, size = bytes.len(), "写入导出文件");
        self.files.insert(file_name.to_string(), bytes);
        Ok(())
    }

    async fn signed_url(&self, file_name: &str, ttl_seconds: u64) -> Result<String> {
        if !self.files.contains_key(file_name) {
            return Err(MallError::Storage(format!("导出文件不存在: {file_name}")));
        }

        let expires_at = Utc::now().timestamp() + ttl_seconds as i64;
        Ok(format!("memory://exports/{file_name}?expires={expires_at}"))
    }
}
