//! TRS Parser Module
//!
//! WHO TRS（Technical Report Series）レポートのテキストから3階層構造
//! （カテゴリ → 薬物 → セクション）を復元するモジュール。
//! 入力は `pdftotext -layout` の出力を手作業で整形したテキストファイルです。

mod parser;
mod reflow;

pub use parser::{flatten, parse_drugs, parse_report};
pub use reflow::reflow_paragraphs;

/// 薬物名が次の行に続くことを示すマーカー（改行 + スペース3個）
///
/// 4個スペースの段落マーカーとは別物。この2つを混同すると
/// 薬物名の継続行検出が壊れるため、必ず区別して扱う。
pub(crate) const NAME_CONTINUATION: &str = "\n   ";

/// セクション本文内で新しい段落が始まることを示すマーカー（改行 + スペース4個）
pub(crate) const PARAGRAPH_BREAK: &str = "\n    ";
