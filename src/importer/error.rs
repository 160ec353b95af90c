// ==========================================
// InsightStore - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 文案: 经 rust-i18n 目录渲染（默认 pt-BR）
// ==========================================
// 致命错误: SourceUnreadable / EmptySource / NoValidProducts
// 非致命: 行被拒、字段转换回退 → 只进入 ImportReport 计数
// ==========================================

use crate::i18n::{t, t_with_args};
use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件传输相关错误 =====
    #[error("{}", tr("import.file_not_found", "path", .0))]
    FileNotFound(String),

    #[error("{}", tr("import.unsupported_format", "ext", .0))]
    UnsupportedFormat(String),

    #[error("{}", tr("import.file_read_error", "reason", .0))]
    FileReadError(String),

    #[error("{}", timeout_message(.0))]
    DecodeTimeout(u64),

    // ===== 解码错误（致命）=====
    #[error("{}", tr("import.source_unreadable", "reason", .0))]
    SourceUnreadable(String),

    #[error("{}", t("import.empty_source"))]
    EmptySource,

    // ===== 校验错误（致命）=====
    #[error("{}", no_valid_products_message(.columns))]
    NoValidProducts { columns: Vec<String> },

    // ===== 配置错误 =====
    #[error("{}", config_message(.key, .message))]
    Config { key: String, message: String },

    // ===== 通用错误 =====
    #[error("{}", tr("import.internal_error", "reason", .0))]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ImportError {
    /// 是否值得调用方自动重试
    ///
    /// 源内容错误（编码/空表/无有效商品）不会自行修复，一律返回 false
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ImportError::DecodeTimeout(_) | ImportError::FileReadError(_)
        )
    }

    /// 观测到的规范化列（仅 NoValidProducts 携带）
    pub fn observed_columns(&self) -> Option<&[String]> {
        match self {
            ImportError::NoValidProducts { columns } => Some(columns),
            _ => None,
        }
    }
}

// ===== 文案渲染 =====

fn tr(key: &str, name: &str, value: &str) -> String {
    t_with_args(key, &[(name, value)])
}

fn timeout_message(ms: &u64) -> String {
    t_with_args("import.decode_timeout", &[("ms", &ms.to_string())])
}

fn no_valid_products_message(columns: &[String]) -> String {
    t_with_args("import.no_valid_products", &[("columns", &columns.join(", "))])
}

fn config_message(key: &str, message: &str) -> String {
    t_with_args("import.config_error", &[("key", key), ("reason", message)])
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => ImportError::FileNotFound(err.to_string()),
            _ => ImportError::FileReadError(err.to_string()),
        }
    }
}

// 实现 From<std::str::Utf8Error>（CSV 必须是 UTF-8 文本）
impl From<std::str::Utf8Error> for ImportError {
    fn from(err: std::str::Utf8Error) -> Self {
        ImportError::SourceUnreadable(format!("UTF-8: {}", err))
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::SourceUnreadable(err.to_string())
    }
}

// 实现 From<calamine::Error>
impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::SourceUnreadable(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(ImportError::DecodeTimeout(100).is_retryable());
        assert!(!ImportError::EmptySource.is_retryable());
        assert!(!ImportError::NoValidProducts { columns: vec![] }.is_retryable());
        assert!(!ImportError::SourceUnreadable("x".to_string()).is_retryable());
    }

    #[test]
    fn test_observed_columns_accessor() {
        let err = ImportError::NoValidProducts {
            columns: vec!["foo".to_string(), "bar".to_string()],
        };
        assert_eq!(err.observed_columns().unwrap(), &["foo".to_string(), "bar".to_string()]);
        assert!(ImportError::EmptySource.observed_columns().is_none());
    }

    #[test]
    fn test_io_not_found_maps_to_file_not_found() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.csv");
        assert!(matches!(ImportError::from(io), ImportError::FileNotFound(_)));
    }
}
