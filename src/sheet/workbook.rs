//! Workbook Reading Module
//!
//! calamineを使用したシート値の読み出しを提供するモジュール。
//! セル値はフィード生成で扱いやすいように文字列へ正規化します。

use calamine::{open_workbook_auto_from_rs, Data, Reader, Sheets, Xlsx};
use std::io::Cursor;
use std::path::Path;

use crate::error::FeedError;
use crate::security::ZipLimits;
use crate::sheet::HyperlinkIndex;

/// スプレッドシートリーダー
///
/// セル値はcalamineで、ハイパーリンクはZIP内のXML解析で取得します。
/// 後者のためにファイル内容をメモリに保持します。
///
/// # 使用例
///
/// ```rust,no_run
/// use ecddfeed::sheet::SheetReader;
///
/// # fn main() -> Result<(), ecddfeed::FeedError> {
/// let mut reader = SheetReader::open("substances.xlsx")?;
/// let rows = reader.rows("Full Sheet")?;
/// let links = reader.hyperlinks("Full Sheet")?;
///
/// println!("{} rows, {} links", rows.len(), links.len());
/// # Ok(())
/// # }
/// ```
pub struct SheetReader {
    /// calamineのワークブック（XLSX形式のみサポート）
    workbook: Xlsx<Cursor<Vec<u8>>>,
    /// ハイパーリンク抽出用のファイル内容
    buffer: Vec<u8>,
}

impl SheetReader {
    /// パスからワークブックを開く
    ///
    /// # 引数
    ///
    /// * `path` - xlsxファイルのパス
    ///
    /// # 戻り値
    ///
    /// * `Ok(SheetReader)` - 読み込みに成功した場合
    /// * `Err(FeedError)` - ファイルが読めない、またはXLSX形式でない場合
    pub fn open(path: impl AsRef<Path>) -> Result<Self, FeedError> {
        let buffer = std::fs::read(path)?;
        Self::from_bytes(buffer)
    }

    /// メモリ上のxlsxからワークブックを開く
    pub fn from_bytes(buffer: Vec<u8>) -> Result<Self, FeedError> {
        // セキュリティチェック: 入力ファイルサイズの上限
        let limits = ZipLimits::default();
        if buffer.len() as u64 > limits.max_workbook_size {
            return Err(FeedError::SecurityViolation(format!(
                "Input file size exceeds maximum: {} bytes (max: {} bytes)",
                buffer.len(),
                limits.max_workbook_size
            )));
        }

        // calamineでワークブックを開く
        let sheets =
            open_workbook_auto_from_rs(Cursor::new(buffer.clone())).map_err(FeedError::Sheet)?;
        let workbook = match sheets {
            Sheets::Xlsx(workbook) => workbook,
            _ => {
                return Err(FeedError::Config(
                    "Only XLSX workbooks are supported".to_string(),
                ))
            }
        };

        Ok(Self { workbook, buffer })
    }

    /// すべてのシート名を取得する
    pub fn sheet_names(&self) -> Vec<String> {
        self.workbook.sheet_names().to_vec()
    }

    /// シートの全セルを正規化済みの文字列で取得する
    ///
    /// 戻り値の添字は絶対座標です。calamineの範囲はシート左上からでは
    /// なく最初の非空セルから始まるため、先頭の空行・空列を詰めて座標
    /// をハイパーリンク索引と揃えます。
    ///
    /// # 引数
    ///
    /// * `sheet_name` - 対象シート名
    ///
    /// # 戻り値
    ///
    /// * `Ok(Vec<Vec<String>>)` - 行ごとのセル値
    /// * `Err(FeedError)` - シートが見つからない場合
    pub fn rows(&mut self, sheet_name: &str) -> Result<Vec<Vec<String>>, FeedError> {
        let range = self
            .workbook
            .worksheet_range(sheet_name)
            .map_err(|e| FeedError::Sheet(e.into()))?;

        let (row_offset, col_offset) = match range.start() {
            Some((row, col)) => (row as usize, col as usize),
            None => return Ok(Vec::new()),
        };

        let mut rows = vec![Vec::new(); row_offset];
        for row in range.rows() {
            let mut cells = vec![String::new(); col_offset];
            cells.extend(row.iter().map(clean_value));
            rows.push(cells);
        }

        Ok(rows)
    }

    /// 指定シートのハイパーリンク索引を構築する
    pub fn hyperlinks(&self, sheet_name: &str) -> Result<HyperlinkIndex, FeedError> {
        HyperlinkIndex::new(Cursor::new(self.buffer.as_slice()), sheet_name)
    }
}

/// セル値をフィード用の文字列に正規化する
///
/// 前後の空白を取り除き、U+2010（ハイフン）をASCIIハイフンに置き換え
/// ます。整数値の数値セルは小数点なしで文字列化します。
fn clean_value(cell: &Data) -> String {
    let raw = match cell {
        Data::String(s) => s.clone(),
        Data::Float(f) => {
            if f.is_finite() && f.fract() == 0.0 {
                format!("{}", *f as i64)
            } else {
                f.to_string()
            }
        }
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => {
            if *b {
                "True".to_string()
            } else {
                "False".to_string()
            }
        }
        Data::Empty => String::new(),
        _ => String::new(),
    };

    raw.trim().replace('\u{2010}', "-")
}
