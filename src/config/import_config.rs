// ==========================================
// InsightStore - 导入配置快照
// ==========================================
// 一次导入开始时读取全部配置项，导入过程中不再变化
// ==========================================

use crate::config::import_config_trait::ImportConfigReader;
use crate::i18n::DEFAULT_LOCALE;
use crate::importer::error::ImportResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CATEGORY: &str = "General";
pub const DEFAULT_MIN_STOCK: i64 = 5;
pub const DEFAULT_REJECTED_ROW_LOG_LIMIT: usize = 3;
pub const DEFAULT_REJECTED_ROW_SAMPLE_LIMIT: usize = 3;
pub const DEFAULT_DECODE_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportConfig {
    pub default_category: String,
    pub default_min_stock: i64,
    pub rejected_row_log_limit: usize,
    pub rejected_row_sample_limit: usize,
    pub decode_timeout_ms: u64,
    pub locale: String,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            default_category: DEFAULT_CATEGORY.to_string(),
            default_min_stock: DEFAULT_MIN_STOCK,
            rejected_row_log_limit: DEFAULT_REJECTED_ROW_LOG_LIMIT,
            rejected_row_sample_limit: DEFAULT_REJECTED_ROW_SAMPLE_LIMIT,
            decode_timeout_ms: DEFAULT_DECODE_TIMEOUT_MS,
            locale: DEFAULT_LOCALE.to_string(),
        }
    }
}

impl ImportConfig {
    /// 从配置读取器生成快照
    pub async fn load<R: ImportConfigReader + ?Sized>(reader: &R) -> ImportResult<Self> {
        Ok(Self {
            default_category: reader.get_default_category().await?,
            default_min_stock: reader.get_default_min_stock().await?,
            rejected_row_log_limit: reader.get_rejected_row_log_limit().await?,
            rejected_row_sample_limit: reader.get_rejected_row_sample_limit().await?,
            decode_timeout_ms: reader.get_decode_timeout_ms().await?,
            locale: reader.get_locale().await?,
        })
    }
}

#[async_trait]
impl ImportConfigReader for ImportConfig {
    async fn get_default_category(&self) -> ImportResult<String> {
        Ok(self.default_category.clone())
    }

    async fn get_default_min_stock(&self) -> ImportResult<i64> {
        Ok(self.default_min_stock)
    }

    async fn get_rejected_row_log_limit(&self) -> ImportResult<usize> {
        Ok(self.rejected_row_log_limit)
    }

    async fn get_rejected_row_sample_limit(&self) -> ImportResult<usize> {
        Ok(self.rejected_row_sample_limit)
    }

    async fn get_decode_timeout_ms(&self) -> ImportResult<u64> {
        Ok(self.decode_timeout_ms)
    }

    async fn get_locale(&self) -> ImportResult<String> {
        Ok(self.locale.clone())
    }
}
