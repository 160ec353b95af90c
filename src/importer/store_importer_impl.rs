// ==========================================
// InsightStore - 门店数据导入器实现
// ==========================================
// 职责: 文件级导入门面（异步）
// 流程: 读取配置快照 → 读取字节 → 解码 → 管道（阻塞线程池）
// 超时: 读取 + 解码 + 构建视为一个可整体丢弃的工作单元
// ==========================================

use crate::config::{ImportConfig, ImportConfigReader};
use crate::domain::import::ImportOutcome;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::extension_of;
use crate::importer::pipeline::IngestionPipeline;
use crate::importer::store_importer_trait::StoreImporter;
use async_trait::async_trait;
use futures::future::join_all;
use std::future::Future;
use std::path::Path;
use std::time::Duration;
use tracing::{error, info, instrument, warn};

// ==========================================
// StoreImporterImpl - 门店数据导入器实现
// ==========================================
pub struct StoreImporterImpl<C>
where
    C: ImportConfigReader,
{
    // 配置读取器（每次导入开始时生成快照）
    config: C,
}

impl<C> StoreImporterImpl<C>
where
    C: ImportConfigReader,
{
    /// 创建新的 StoreImporter 实例
    ///
    /// # 参数
    /// - config: 配置读取器（ImportConfig 或 ConfigManager）
    pub fn new(config: C) -> Self {
        Self { config }
    }

    /// 在超时约束下执行 读取 → 解码 → 构建
    ///
    /// 超时后丢弃全部中间结果
    async fn ingest_with_deadline<F>(
        &self,
        source: F,
        extension_hint: String,
    ) -> ImportResult<ImportOutcome>
    where
        F: Future<Output = ImportResult<Vec<u8>>> + Send,
    {
        let config = ImportConfig::load(&self.config).await?;
        let timeout_ms = config.decode_timeout_ms;

        let work = async move {
            let bytes = source.await?;
            let pipeline = IngestionPipeline::new(config);
            tokio::task::spawn_blocking(move || pipeline.ingest_bytes(&bytes, &extension_hint))
                .await
                .map_err(|e| ImportError::InternalError(e.to_string()))?
        };

        match tokio::time::timeout(Duration::from_millis(timeout_ms), work).await {
            Ok(result) => result,
            Err(_) => {
                warn!(timeout_ms, "导入超时，已丢弃中间结果");
                Err(ImportError::DecodeTimeout(timeout_ms))
            }
        }
    }
}

#[async_trait]
impl<C> StoreImporter for StoreImporterImpl<C>
where
    C: ImportConfigReader + Send + Sync,
{
    #[instrument(skip(self, file_path))]
    async fn import_file<P: AsRef<Path> + Send>(&self, file_path: P) -> ImportResult<ImportOutcome> {
        let path = file_path.as_ref().to_path_buf();
        let extension = extension_of(&path);
        info!(file = %path.display(), "开始导入文件");

        let source = async move {
            tokio::fs::read(&path).await.map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => ImportError::FileNotFound(path.display().to_string()),
                _ => ImportError::FileReadError(e.to_string()),
            })
        };

        self.ingest_with_deadline(source, extension).await
    }

    async fn import_bytes(&self, bytes: Vec<u8>, extension_hint: &str) -> ImportResult<ImportOutcome> {
        self.ingest_with_deadline(async move { Ok(bytes) }, extension_hint.to_string())
            .await
    }

    async fn batch_import<P: AsRef<Path> + Send + Sync>(
        &self,
        file_paths: Vec<P>,
    ) -> Vec<ImportResult<ImportOutcome>> {
        info!(count = file_paths.len(), "开始批量导入文件");

        // 为每个文件创建独立的导入任务
        let import_tasks = file_paths.into_iter().map(|path| {
            let path_str = path.as_ref().display().to_string();
            async move {
                let result = self.import_file(path).await;
                match &result {
                    Ok(outcome) => info!(
                        file = %path_str,
                        products = outcome.report.products,
                        sales = outcome.report.sales,
                        "文件导入成功"
                    ),
                    Err(e) => error!(file = %path_str, error = %e, "文件导入失败"),
                }
                result
            }
        });

        // 并发执行所有导入任务
        let results = join_all(import_tasks).await;

        info!(
            total = results.len(),
            success = results.iter().filter(|r| r.is_ok()).count(),
            failed = results.iter().filter(|r| r.is_err()).count(),
            "批量导入完成"
        );

        results
    }
}
