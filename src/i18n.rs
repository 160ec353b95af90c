// ==========================================
// 国际化 (i18n) 模块
// ==========================================
// 使用 rust-i18n 库
// 支持葡萄牙语（巴西，默认）、英文、中文
// ==========================================
// 注意: rust_i18n::i18n! 宏已在 lib.rs 中初始化
// ==========================================

use std::sync::Once;

/// 默认语言（面向最终用户的错误文案）
pub const DEFAULT_LOCALE: &str = "pt-BR";

static DEFAULT_LOCALE_INIT: Once = Once::new();

// rust-i18n 进程级默认为 "en"，首次使用前切换到 DEFAULT_LOCALE
fn ensure_default_locale() {
    DEFAULT_LOCALE_INIT.call_once(|| rust_i18n::set_locale(DEFAULT_LOCALE));
}

/// 获取当前语言
pub fn current_locale() -> String {
    ensure_default_locale();
    rust_i18n::locale().to_string()
}

/// 设置语言
///
/// # 参数
/// - locale: 语言代码（"pt-BR" / "en" / "zh-CN"）
pub fn set_locale(locale: &str) {
    ensure_default_locale();
    rust_i18n::set_locale(locale);
}

/// 翻译消息（无参数）
///
/// # 示例
/// ```no_run
/// use insight_store::i18n::t;
/// let msg = t("import.empty_source");
/// ```
pub fn t(key: &str) -> String {
    ensure_default_locale();
    rust_i18n::t!(key).to_string()
}

/// 翻译消息（带参数）
///
/// # 示例
/// ```no_run
/// use insight_store::i18n::t_with_args;
/// let msg = t_with_args("import.file_not_found", &[("path", "/tmp/vendas.csv")]);
/// ```
pub fn t_with_args(key: &str, args: &[(&str, &str)]) -> String {
    let mut result = t(key);
    for (k, v) in args {
        let placeholder = format!("%{{{}}}", k);
        result = result.replace(&placeholder, v);
    }
    result
}

// rust-i18n 的 locale 为全局状态，且 Rust 测试默认并行执行；
// 凡是切换语言或断言文案语言的测试都需持有此锁。
#[cfg(test)]
pub(crate) static LOCALE_TEST_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_locale() {
        let _guard = LOCALE_TEST_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        set_locale(DEFAULT_LOCALE);
        assert_eq!(current_locale(), "pt-BR");
    }

    #[test]
    fn test_set_locale() {
        let _guard = LOCALE_TEST_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        set_locale("en");
        assert_eq!(current_locale(), "en");

        set_locale("zh-CN");
        assert_eq!(current_locale(), "zh-CN");

        // 恢复默认语言
        set_locale(DEFAULT_LOCALE);
    }

    #[test]
    fn test_translate_simple() {
        let _guard = LOCALE_TEST_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        set_locale("pt-BR");
        assert_eq!(t("import.empty_source"), "A planilha está vazia ou não pôde ser lida.");

        set_locale("en");
        assert_eq!(t("import.empty_source"), "The spreadsheet is empty or could not be read.");

        set_locale(DEFAULT_LOCALE);
    }

    #[test]
    fn test_translate_with_args() {
        let _guard = LOCALE_TEST_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        set_locale("pt-BR");
        let msg = t_with_args("import.file_not_found", &[("path", "/tmp/vendas.csv")]);
        assert!(msg.contains("/tmp/vendas.csv"));
        assert!(msg.contains("Arquivo não encontrado"));

        set_locale("en");
        let msg = t_with_args("import.file_not_found", &[("path", "/tmp/vendas.csv")]);
        assert!(msg.contains("File not found"));

        set_locale(DEFAULT_LOCALE);
    }
}
