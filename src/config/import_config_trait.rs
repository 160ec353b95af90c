// ==========================================
// InsightStore - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入模块所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::importer::error::ImportResult;
use async_trait::async_trait;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 用途: 导入模块所需的配置读取接口
// 实现者:
// - ImportConfig（静态配置，直接返回字段）
// - ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    // ===== 实体默认值 =====

    /// 商品分类缺失时的默认值
    ///
    /// # 默认值
    /// - "General"
    async fn get_default_category(&self) -> ImportResult<String>;

    /// 最低库存缺失时的默认值
    ///
    /// # 默认值
    /// - 5
    async fn get_default_min_stock(&self) -> ImportResult<i64>;

    // ===== 诊断配置 =====

    /// 被拒行写入 warn 日志的条数上限
    ///
    /// # 默认值
    /// - 3
    async fn get_rejected_row_log_limit(&self) -> ImportResult<usize>;

    /// 导入报告中保留的被拒行样本数上限
    ///
    /// # 默认值
    /// - 3
    async fn get_rejected_row_sample_limit(&self) -> ImportResult<usize>;

    // ===== 传输层配置 =====

    /// 读取源文件的超时（毫秒）
    ///
    /// # 默认值
    /// - 30000
    async fn get_decode_timeout_ms(&self) -> ImportResult<u64>;

    /// 面向用户的错误文案语言
    ///
    /// # 默认值
    /// - "pt-BR"
    async fn get_locale(&self) -> ImportResult<String>;
}
