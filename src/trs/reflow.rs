//! Paragraph Reflow Module
//!
//! pdftotextが生成した行折り返し付きのテキストを、1行1段落の
//! 通常の段落形式に整形するモジュール。

use crate::trs::PARAGRAPH_BREAK;

/// セクション本文を段落単位に整形する
///
/// 改行 + スペース4個のマーカーで段落に分割し、各段落の前後の空白を
/// 取り除いたうえで、段落内に残った改行（行折り返し）をスペース1個に
/// 置き換えます。結果は段落を改行1個で連結した文字列です。
///
/// ```text
/// "Sentence one. Sentence\ntwo. Same paragraph.\n    New paragraph."
/// ->
/// "Sentence one. Sentence two. Same paragraph.\nNew paragraph."
/// ```
///
/// 出力の各行は整形済みの段落そのものなので、行単位で再適用しても
/// 変化しません（改行を含まない整形済み文字列は不動点です）。
///
/// # 引数
///
/// * `text`: セクションの生の本文
///
/// # 戻り値
///
/// 1行1段落に整形された文字列
pub fn reflow_paragraphs(text: &str) -> String {
    text.split(PARAGRAPH_BREAK)
        .map(|paragraph| paragraph.trim().replace('\n', " "))
        .collect::<Vec<_>>()
        .join("\n")
}
