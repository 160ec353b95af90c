// ==========================================
// InsightStore - 表头规范化
// ==========================================
// 职责: 任意列名 → 稳定的查找标识（canonical token）
// 规则: 小写 → NFD 分解并去除变音符号 → trim
//       → 非 [a-z0-9] 连续段替换为单个 '_' → 去除首尾 '_'
// 纯函数，永不失败；纯符号/空表头得到空串，由调用方丢弃
// ==========================================

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// 规范化表头
///
/// # 示例
/// - "Código" → "codigo"
/// - " Preço de Venda " → "preco_de_venda"
/// - "Qtd. Vendida" → "qtd_vendida"
pub fn normalize_key(raw: &str) -> String {
    let folded: String = raw
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect();

    let mut token = String::with_capacity(folded.len());
    let mut pending_separator = false;
    for c in folded.trim().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_separator && !token.is_empty() {
                token.push('_');
            }
            pending_separator = false;
            token.push(c);
        } else {
            pending_separator = true;
        }
    }

    token
}
