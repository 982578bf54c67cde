//! Error Types Module
//!
//! クレート全体で使用する構造化エラー型を定義するモジュール。
//! `thiserror`を使用して、エラーの自動変換とメッセージフォーマットを実現する。

use thiserror::Error;

/// ecddfeedクレート全体で使用するエラー型
///
/// このエラー型は、TRSテキストの解析、スプレッドシートの読み込み、
/// フィード生成処理中に発生する構造的な失敗を統一的に扱うために使用されます。
///
/// 回復可能な状態（名前のルックアップミス、マージのスキップなど）はエラーでは
/// なく、戻り値に含まれる警告として呼び出し元に渡されます。
///
/// # エラーの種類
///
/// - `Io`: I/O操作中に発生したエラー（ファイル読み込み失敗など）
/// - `Sheet`: スプレッドシートの解析中に発生したエラー（calamine由来）
/// - `MalformedSection`: TRSテキストのセクションブロックが不正な場合のエラー
/// - `Config`: 設定の検証に失敗したエラー（無効なシート名指定など）
///
/// # 使用例
///
/// ```rust,no_run
/// use ecddfeed::FeedError;
/// use std::fs::File;
///
/// fn read_sheet_file(path: &str) -> Result<(), FeedError> {
///     let file = File::open(path)?;  // Ioエラーが自動的に変換される
///     // ... 処理 ...
///     Ok(())
/// }
/// ```
#[derive(Error, Debug)]
pub enum FeedError {
    /// I/O操作中に発生したエラー
    ///
    /// ファイルの読み込み失敗、書き込み失敗など、標準ライブラリの
    /// `std::io::Error`が発生した場合に使用されます。
    ///
    /// `#[from]`属性により、`std::io::Error`から自動的に変換されます。
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// スプレッドシートの解析中に発生したエラー
    ///
    /// calamineクレートがxlsxファイルを解析する際に発生したエラーです。
    /// ファイル形式が不正、破損したファイル、サポートされていない形式などが
    /// 原因となります。
    ///
    /// `#[from]`属性により、`calamine::Error`から自動的に変換されます。
    #[error("Failed to read spreadsheet: {0}")]
    Sheet(#[from] calamine::Error),

    /// UTF-8文字列の変換エラー
    ///
    /// XML解析時にUTF-8文字列への変換に失敗した場合に発生します。
    #[error("UTF-8 conversion error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// ZIPアーカイブの解析エラー
    ///
    /// XLSXファイル（ZIPアーカイブ）の解析中に発生したエラーです。
    #[error("ZIP archive error: {0}")]
    Zip(String),

    /// TRSテキストのセクションブロックが不正な場合のエラー
    ///
    /// 空行で区切られたブロックにセクション名の行しかなく、本文との区切りと
    /// なる改行が存在しない場合に発生します。該当ドキュメントの解析はこの時点で
    /// 中断されます（部分的な結果は返しません）。
    ///
    /// エラーメッセージには、修正すべき箇所を特定できるように、ブロックを囲む
    /// 薬物名とブロック本体が含まれます。
    ///
    /// # 例
    ///
    /// ```rust,no_run
    /// use ecddfeed::FeedError;
    ///
    /// let error = FeedError::MalformedSection {
    ///     drug: "Fentanyl".to_string(),
    ///     block: "Recommendation".to_string(),
    /// };
    ///
    /// println!("{}", error);
    /// // 出力: "Malformed section block in drug 'Fentanyl': \"Recommendation\""
    /// ```
    #[error("Malformed section block in drug '{drug}': {block:?}")]
    MalformedSection {
        /// ブロックを囲む薬物名
        drug: String,
        /// 区切りを欠いたブロック本体
        block: String,
    },

    /// 設定の検証に失敗したエラー
    ///
    /// `FeedBuilder::build()`時に設定を検証し、無効な設定が検出された
    /// 場合に発生します。例えば、シート名が空の場合や、公開URLの形式が
    /// 不正な場合などです。
    ///
    /// # 例
    ///
    /// ```rust,no_run
    /// use ecddfeed::{FeedBuilder, FeedError};
    ///
    /// let result = FeedBuilder::new()
    ///     .with_sheet_name("")  // 無効なシート名
    ///     .build();
    ///
    /// match result {
    ///     Err(FeedError::Config(msg)) => {
    ///         println!("設定エラー: {}", msg);
    ///     }
    ///     _ => {}
    /// }
    /// ```
    #[error("Configuration error: {0}")]
    Config(String),

    /// セキュリティ制限に違反したエラー
    ///
    /// ZIP bomb攻撃、パストラバーサル攻撃、ファイルサイズ制限などの
    /// セキュリティ制限に違反した場合に発生します。
    #[error("Security violation: {0}")]
    SecurityViolation(String),
}
