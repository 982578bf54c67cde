//! Section HTML Rendering Module
//!
//! （セクション名, 本文）の並びをフィードの1フィールドに収まるHTML
//! 文字列へ描画するモジュール。CMS側はHTMLフィールドとして取り込む
//! ため、段落区切りは `<br /><br />` で表現します。

/// TRS抜粋のセクション名（スプレッドシートの`P`〜`W`列に対応）
pub const EXTRACT_SECTION_TITLES: [&str; 8] = [
    "ECDD Technical summary",
    "Substance identification",
    "WHO review history",
    "Similarity to known substances and effects on the CNS",
    "Dependence potential",
    "Actual abuse and or/evidence of likelihood of abuse",
    "Therapeutic usefulness",
    "Recommendation",
];

/// セクションの並びを1つのHTML文字列に描画する
///
/// 各セクション名は `<b><i>...</i></b><br />` で囲み、本文中の改行
/// （=段落区切り）は `<br /><br />` に置き換えます。本文が空の
/// セクションは出力しません。
///
/// # 使用例
///
/// ```rust
/// use ecddfeed::feed::render_sections;
///
/// let html = render_sections([("Recommendation", "Keep under surveillance.")]);
/// assert_eq!(
///     html,
///     "<b><i>Recommendation</i></b><br />Keep under surveillance."
/// );
/// ```
pub fn render_sections<'a>(sections: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    sections
        .into_iter()
        .filter(|(_, text)| !text.is_empty())
        .map(|(name, text)| format!("<b><i>{}</i></b><br />{}", name, paragraphs(text)))
        .collect::<Vec<_>>()
        .join("<br /><br />")
}

fn paragraphs(text: &str) -> String {
    text.split('\n').collect::<Vec<_>>().join("<br /><br />")
}
