//! Builder Module
//!
//! Fluent Builder APIを提供し、`Feed`インスタンスを段階的に構築する。

use std::io::{Read, Seek, Write};
use std::path::{Path, PathBuf};

use crate::error::FeedError;
use crate::feed::{collect_records, write_feed};
use crate::lookup::TrsLibrary;
use crate::sheet::SheetReader;

/// フィード生成の設定を保持する内部構造体
#[derive(Debug, Clone)]
pub(crate) struct FeedConfig {
    /// 物質レコードが載っているシート名
    pub sheet_name: String,

    /// 公開ファイルのベースURL（必ず`/`で終わる）
    pub base_url: String,

    /// 抽出済みTRSテキストのディレクトリ（Option: Noneの場合はルックアップなし）
    pub trs_dir: Option<PathBuf>,

    /// フィードの`field_link{n}`列の数
    pub link_slots: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            sheet_name: "Full Sheet".to_string(),
            base_url: "https://ecddrepository.org/sites/default/files/".to_string(),
            trs_dir: None,
            link_slots: 10,
        }
    }
}

/// Fluent Builder APIを提供する構造体
///
/// `Feed`インスタンスを段階的に構築するためのビルダーです。
/// すべての設定項目にデフォルト値が設定されており、必要な設定のみをオーバーライドできます。
///
/// # 使用例
///
/// ```rust,no_run
/// use ecddfeed::FeedBuilder;
///
/// # fn main() -> Result<(), ecddfeed::FeedError> {
/// let feed = FeedBuilder::new()
///     .with_sheet_name("Full Sheet")
///     .with_trs_dir("extracted_from_trs")
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct FeedBuilder {
    /// 内部設定（構築中）
    config: FeedConfig,
}

impl Default for FeedBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedBuilder {
    /// デフォルト設定を持つビルダーインスタンスを生成する
    ///
    /// # デフォルト設定
    ///
    /// - シート名: `Full Sheet`
    /// - ベースURL: `https://ecddrepository.org/sites/default/files/`
    /// - TRSディレクトリ: なし（TRS本文へのフォールバックを行わない）
    /// - リンク列数: 10
    ///
    /// # 使用例
    ///
    /// ```rust,no_run
    /// use ecddfeed::FeedBuilder;
    ///
    /// let builder = FeedBuilder::new();
    /// ```
    pub fn new() -> Self {
        Self {
            config: FeedConfig::default(),
        }
    }

    /// 物質レコードを読むシートを指定する
    ///
    /// # 引数
    ///
    /// * `name`: シート名
    ///
    /// # 使用例
    ///
    /// ```rust,no_run
    /// use ecddfeed::FeedBuilder;
    ///
    /// let builder = FeedBuilder::new()
    ///     .with_sheet_name("Full Sheet");
    /// ```
    pub fn with_sheet_name(mut self, name: impl Into<String>) -> Self {
        self.config.sheet_name = name.into();
        self
    }

    /// 公開ファイルのベースURLを指定する
    ///
    /// レポート・質問票・審査文書の各リンクはこのURLにファイル名を
    /// つなげて出力されます。
    ///
    /// # 引数
    ///
    /// * `url`: ベースURL（`/`で終わること）
    ///
    /// # 使用例
    ///
    /// ```rust,no_run
    /// use ecddfeed::FeedBuilder;
    ///
    /// let builder = FeedBuilder::new()
    ///     .with_base_url("https://example.org/files/");
    /// ```
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    /// 抽出済みTRSテキストのディレクトリを指定する
    ///
    /// 指定すると、スプレッドシート側の抜粋が空の物質について
    /// `{TRS番号}.txt` から勧告セクションを引いて補完します。
    ///
    /// # 引数
    ///
    /// * `dir`: `{TRS番号}.txt` ファイルが並ぶディレクトリ
    ///
    /// # 使用例
    ///
    /// ```rust,no_run
    /// use ecddfeed::FeedBuilder;
    ///
    /// let builder = FeedBuilder::new()
    ///     .with_trs_dir("extracted_from_trs");
    /// ```
    pub fn with_trs_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.trs_dir = Some(dir.into());
        self
    }

    /// フィードの`field_link{n}`列の数を指定する
    ///
    /// 審査文書リンクがこの数に満たない物質は空欄で埋められます。
    /// 超えた分のリンクは捨てずにそのまま出力されます。
    ///
    /// # 引数
    ///
    /// * `slots`: リンク列の数（1以上）
    ///
    /// # 使用例
    ///
    /// ```rust,no_run
    /// use ecddfeed::FeedBuilder;
    ///
    /// let builder = FeedBuilder::new()
    ///     .with_link_slots(12);
    /// ```
    pub fn with_link_slots(mut self, slots: usize) -> Self {
        self.config.link_slots = slots;
        self
    }

    /// 設定を検証し、`Feed`インスタンスを生成する
    ///
    /// # 戻り値
    ///
    /// * `Ok(Feed)`: 設定が有効な場合、Feedインスタンス
    /// * `Err(FeedError::Config)`: 設定が無効な場合
    ///
    /// # 発生し得るエラー
    ///
    /// * `FeedError::Config(String)`: 設定の検証に失敗した場合
    ///   * シート名が空
    ///   * ベースURLが`/`で終わっていない
    ///   * リンク列数が0
    ///
    /// # 使用例
    ///
    /// ```rust,no_run
    /// use ecddfeed::FeedBuilder;
    ///
    /// # fn main() -> Result<(), ecddfeed::FeedError> {
    /// let feed = FeedBuilder::new()
    ///     .with_base_url("https://example.org/files/")
    ///     .build()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn build(self) -> Result<Feed, FeedError> {
        // 1. シート名の検証
        if self.config.sheet_name.is_empty() {
            return Err(FeedError::Config(
                "Sheet name must not be empty".to_string(),
            ));
        }

        // 2. ベースURLの検証
        if !self.config.base_url.ends_with('/') {
            return Err(FeedError::Config(format!(
                "Invalid base URL: '{}' (must end with '/')",
                self.config.base_url
            )));
        }

        // 3. リンク列数の検証
        if self.config.link_slots == 0 {
            return Err(FeedError::Config(
                "Invalid link slots: 0 (at least one link column is required)".to_string(),
            ));
        }

        // 4. Feedインスタンス生成
        Ok(Feed::new(self.config))
    }
}

/// フィード生成1回分の結果
///
/// 警告はエラーではなく、読み飛ばしたマージやTRSルックアップのミスを
/// 呼び出し元へ報告するためのものです。バイナリはstderrへ流します。
#[derive(Debug, Clone)]
pub struct FeedReport {
    /// マージ後の物質数
    pub substances: usize,

    /// 書き出したデータ行数（ヘッダーを除く）
    pub rows_written: usize,

    /// 処理中に積まれた警告
    pub warnings: Vec<String>,
}

/// フィード生成処理のファサード
///
/// 物質スプレッドシートからCMSインポート用CSVを生成するためのメイン
/// エントリーポイントです。`FeedBuilder`を使用して構築された設定に
/// 基づいてフィード生成を実行します。
///
/// # 使用例
///
/// ```rust,no_run
/// use ecddfeed::FeedBuilder;
/// use std::fs::File;
///
/// # fn main() -> Result<(), ecddfeed::FeedError> {
/// let feed = FeedBuilder::new()
///     .with_trs_dir("extracted_from_trs")
///     .build()?;
///
/// let output = File::create("substances.csv")?;
/// let report = feed.generate_file("substances.xlsx", output)?;
///
/// for warning in &report.warnings {
///     eprintln!("{}", warning);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Feed {
    /// フィード生成設定
    config: FeedConfig,
}

impl Feed {
    pub(crate) fn new(config: FeedConfig) -> Self {
        Self { config }
    }

    /// スプレッドシートを読み込み、CSVフィードを書き出す
    ///
    /// # 引数
    ///
    /// * `input` - xlsxを読み込むためのリーダー（Read + Seekトレイトを実装）
    /// * `output` - CSV出力先のライター（Writeトレイトを実装）
    ///
    /// # 戻り値
    ///
    /// * `Ok(FeedReport)` - 生成に成功した場合（警告を含むことがある）
    /// * `Err(FeedError)` - エラーが発生した場合
    ///
    /// # 処理フロー
    ///
    /// 1. シートのセル値とハイパーリンク索引を取得
    /// 2. 行を物質名ごとにマージ（マージできない行は警告）
    /// 3. TRSディレクトリが設定されていればルックアップを用意
    /// 4. ヘッダーと物質ごとの行をCSVとして書き出す
    ///
    /// # 使用例
    ///
    /// ```rust,no_run
    /// use ecddfeed::FeedBuilder;
    /// use std::io::Cursor;
    ///
    /// # fn main() -> Result<(), ecddfeed::FeedError> {
    /// let feed = FeedBuilder::new().build()?;
    /// let sheet_data: Vec<u8> = vec![]; // xlsxファイルのバイト列
    /// let mut csv_output = Vec::new();
    /// feed.generate(Cursor::new(sheet_data), &mut csv_output)?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn generate<R: Read + Seek, W: Write>(
        &self,
        mut input: R,
        output: W,
    ) -> Result<FeedReport, FeedError> {
        // 入力をメモリへ読み込む（サイズ上限はSheetReader側で検証する）
        let mut buffer = Vec::new();
        input.read_to_end(&mut buffer)?;

        self.run(SheetReader::from_bytes(buffer)?, output)
    }

    /// パスで指定したスプレッドシートからCSVフィードを書き出す
    ///
    /// # 引数
    ///
    /// * `path` - xlsxファイルのパス
    /// * `output` - CSV出力先のライター（Writeトレイトを実装）
    ///
    /// # 使用例
    ///
    /// ```rust,no_run
    /// use ecddfeed::FeedBuilder;
    /// use std::fs::File;
    ///
    /// # fn main() -> Result<(), ecddfeed::FeedError> {
    /// let feed = FeedBuilder::new().build()?;
    /// let output = File::create("substances.csv")?;
    /// let report = feed.generate_file("substances.xlsx", output)?;
    /// println!("{} substances", report.substances);
    /// # Ok(())
    /// # }
    /// ```
    pub fn generate_file<W: Write>(
        &self,
        path: impl AsRef<Path>,
        output: W,
    ) -> Result<FeedReport, FeedError> {
        self.run(SheetReader::open(path)?, output)
    }

    fn run<W: Write>(&self, mut reader: SheetReader, mut output: W) -> Result<FeedReport, FeedError> {
        use std::io::BufWriter;

        // 1. シートのセル値とハイパーリンク索引を取得
        let rows = reader.rows(&self.config.sheet_name)?;
        let links = reader.hyperlinks(&self.config.sheet_name)?;

        // 2. 行を物質名ごとにマージ
        let (records, mut warnings) = collect_records(&rows, &links);

        // 3. TRSディレクトリが設定されていればルックアップを用意
        //    （ファイルは参照されたときに初めて読む）
        let mut library = self.config.trs_dir.as_ref().map(TrsLibrary::new);

        // 4. CSVを書き出す
        let mut writer = BufWriter::new(&mut output);
        let rows_written = write_feed(
            &mut writer,
            &records,
            &self.config,
            &mut library,
            &mut warnings,
        )?;
        writer.flush()?;

        Ok(FeedReport {
            substances: records.len(),
            rows_written,
            warnings,
        })
    }
}
