//! Spreadsheet Access Module
//!
//! ECDDリポジトリのスプレッドシート（xlsx）からセル値とハイパーリンクを
//! 取り出すモジュール。値はcalamineで読み、calamineが返さないハイパー
//! リンクはZIPアーカイブ内のXMLを直接解析して取得します。

mod columns;
mod hyperlinks;
mod workbook;

pub use columns::{column_index, column_letter};
pub use hyperlinks::HyperlinkIndex;
pub use workbook::SheetReader;
