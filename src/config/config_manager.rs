// ==========================================
// InsightStore - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写
// 存储: config_kv 表 (scope_id='global')
// 缺省: 未配置的键回退到 ImportConfig::default()
// ==========================================

use crate::config::import_config::{
    DEFAULT_CATEGORY, DEFAULT_DECODE_TIMEOUT_MS, DEFAULT_MIN_STOCK,
    DEFAULT_REJECTED_ROW_LOG_LIMIT, DEFAULT_REJECTED_ROW_SAMPLE_LIMIT,
};
use crate::config::import_config_trait::ImportConfigReader;
use crate::db::{configure_sqlite_connection, ensure_schema, open_sqlite_connection};
use crate::i18n::DEFAULT_LOCALE;
use crate::importer::error::{ImportError, ImportResult};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例（必要时建表）
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> ImportResult<Self> {
        let conn = open_sqlite_connection(db_path).map_err(storage_error)?;
        ensure_schema(&conn).map_err(storage_error)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ImportResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| ImportError::InternalError(format!("锁获取失败: {}", e)))?;
            configure_sqlite_connection(&guard).map_err(storage_error)?;
            ensure_schema(&guard).map_err(storage_error)?;
        }

        Ok(Self { conn })
    }

    fn lock(&self) -> ImportResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| ImportError::InternalError(format!("锁获取失败: {}", e)))
    }

    /// 读取 global scope 的配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> ImportResult<Option<String>> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        )
        .optional()
        .map_err(storage_error)
    }

    /// 写入 global scope 的配置值（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> ImportResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )
        .map_err(storage_error)?;
        Ok(())
    }

    /// 获取所有 global 配置的快照（JSON 格式，键有序）
    pub fn get_config_snapshot(&self) -> ImportResult<String> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")
            .map_err(storage_error)?;

        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))
            .map_err(storage_error)?;

        let mut config_map = BTreeMap::new();
        for row in rows {
            let (key, value) = row.map_err(storage_error)?;
            config_map.insert(key, value);
        }

        serde_json::to_string(&config_map).map_err(|e| ImportError::InternalError(e.to_string()))
    }

    /// 读取并解析配置；不存在时使用默认值，无法解析时报 Config 错误
    fn get_parsed_or_default<T>(&self, key: &str, default: T) -> ImportResult<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get_global_config_value(key)? {
            None => Ok(default),
            Some(raw) => raw.trim().parse::<T>().map_err(|e| ImportError::Config {
                key: key.to_string(),
                message: format!("{} ({})", raw, e),
            }),
        }
    }

    fn get_text_or_default(&self, key: &str, default: &str) -> ImportResult<String> {
        Ok(self
            .get_global_config_value(key)?
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| default.to_string()))
    }
}

fn storage_error(err: rusqlite::Error) -> ImportError {
    ImportError::Config {
        key: "config_kv".to_string(),
        message: err.to_string(),
    }
}

// ==========================================
// ImportConfigReader Trait 实现
// ==========================================
#[async_trait]
impl ImportConfigReader for ConfigManager {
    async fn get_default_category(&self) -> ImportResult<String> {
        self.get_text_or_default(config_keys::DEFAULT_CATEGORY, DEFAULT_CATEGORY)
    }

    async fn get_default_min_stock(&self) -> ImportResult<i64> {
        let value = self.get_parsed_or_default(config_keys::DEFAULT_MIN_STOCK, DEFAULT_MIN_STOCK)?;
        if value < 0 {
            return Err(ImportError::Config {
                key: config_keys::DEFAULT_MIN_STOCK.to_string(),
                message: format!("{} < 0", value),
            });
        }
        Ok(value)
    }

    async fn get_rejected_row_log_limit(&self) -> ImportResult<usize> {
        self.get_parsed_or_default(
            config_keys::REJECTED_ROW_LOG_LIMIT,
            DEFAULT_REJECTED_ROW_LOG_LIMIT,
        )
    }

    async fn get_rejected_row_sample_limit(&self) -> ImportResult<usize> {
        self.get_parsed_or_default(
            config_keys::REJECTED_ROW_SAMPLE_LIMIT,
            DEFAULT_REJECTED_ROW_SAMPLE_LIMIT,
        )
    }

    async fn get_decode_timeout_ms(&self) -> ImportResult<u64> {
        self.get_parsed_or_default(config_keys::DECODE_TIMEOUT_MS, DEFAULT_DECODE_TIMEOUT_MS)
    }

    async fn get_locale(&self) -> ImportResult<String> {
        self.get_text_or_default(config_keys::LOCALE, DEFAULT_LOCALE)
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 实体默认值
    pub const DEFAULT_CATEGORY: &str = "import.default_category";
    pub const DEFAULT_MIN_STOCK: &str = "import.default_min_stock";

    // 诊断
    pub const REJECTED_ROW_LOG_LIMIT: &str = "import.rejected_row_log_limit";
    pub const REJECTED_ROW_SAMPLE_LIMIT: &str = "import.rejected_row_sample_limit";

    // 传输层
    pub const DECODE_TIMEOUT_MS: &str = "import.decode_timeout_ms";

    // 文案语言
    pub const LOCALE: &str = "ui.locale";
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ImportConfig;
    use tempfile::NamedTempFile;

    fn manager() -> (NamedTempFile, ConfigManager) {
        let temp_file = NamedTempFile::new().unwrap();
        let manager = ConfigManager::new(temp_file.path().to_str().unwrap()).unwrap();
        (temp_file, manager)
    }

    #[tokio::test]
    async fn test_defaults_when_unset() {
        let (_file, manager) = manager();

        let config = ImportConfig::load(&manager).await.unwrap();

        assert_eq!(config, ImportConfig::default());
    }

    #[tokio::test]
    async fn test_overrides_from_config_kv() {
        let (_file, manager) = manager();
        manager.set_global_config_value(config_keys::DEFAULT_CATEGORY, "Geral").unwrap();
        manager.set_global_config_value(config_keys::DEFAULT_MIN_STOCK, " 10 ").unwrap();

        let config = ImportConfig::load(&manager).await.unwrap();

        assert_eq!(config.default_category, "Geral");
        assert_eq!(config.default_min_stock, 10);
    }

    #[tokio::test]
    async fn test_unparseable_value_is_config_error() {
        let (_file, manager) = manager();
        manager.set_global_config_value(config_keys::DECODE_TIMEOUT_MS, "soon").unwrap();

        let err = manager.get_decode_timeout_ms().await.unwrap_err();

        assert!(matches!(err, ImportError::Config { ref key, .. } if key == config_keys::DECODE_TIMEOUT_MS));
    }

    #[tokio::test]
    async fn test_negative_min_stock_rejected() {
        let (_file, manager) = manager();
        manager.set_global_config_value(config_keys::DEFAULT_MIN_STOCK, "-1").unwrap();

        assert!(manager.get_default_min_stock().await.is_err());
    }

    #[test]
    fn test_config_snapshot() {
        let (_file, manager) = manager();
        manager.set_global_config_value(config_keys::LOCALE, "en").unwrap();

        let snapshot = manager.get_config_snapshot().unwrap();

        assert_eq!(snapshot, r#"{"ui.locale":"en"}"#);
    }
}
