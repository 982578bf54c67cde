//! Console Output Module
//!
//! バイナリの出力で使うANSIカラーと表示幅揃えの小さなヘルパー。
//! アウトライン表示（カテゴリ・薬物・セクション）の色分けと、複数
//! ファイルを並べたときのラベル列の整列に使います。

use unicode_width::UnicodeWidthStr;

/// ANSI基本8色
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
}

impl Color {
    /// SGRのカラーコード（30〜37）
    fn code(self) -> u8 {
        match self {
            Color::Black => 30,
            Color::Red => 31,
            Color::Green => 32,
            Color::Yellow => 33,
            Color::Blue => 34,
            Color::Magenta => 35,
            Color::Cyan => 36,
            Color::White => 37,
        }
    }
}

/// テキストを指定色のエスケープシーケンスで包む
///
/// # 使用例
///
/// ```rust
/// use ecddfeed::console::{paint, Color};
///
/// assert_eq!(paint(Color::Yellow, "Opioids"), "\x1b[33mOpioids\x1b[0m");
/// ```
pub fn paint(color: Color, text: &str) -> String {
    format!("\x1b[{}m{}\x1b[0m", color.code(), text)
}

/// テキストを指定色の太字エスケープシーケンスで包む
pub fn paint_bold(color: Color, text: &str) -> String {
    format!("\x1b[{};1m{}\x1b[0m", color.code(), text)
}

/// テキストの端末上の表示幅を数える（全角文字は2列）
pub fn width(text: &str) -> usize {
    UnicodeWidthStr::width(text)
}

/// 表示幅が`target`になるまで右側に空白を足す
///
/// 幅は文字数ではなく端末上の表示幅で数えます。すでに`target`以上の
/// テキストはそのまま返します。
pub fn pad(text: &str, target: usize) -> String {
    let current = width(text);
    if current >= target {
        text.to_string()
    } else {
        format!("{}{}", text, " ".repeat(target - current))
    }
}
