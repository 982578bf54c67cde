//! CSV Splitting Module
//!
//! 生成したCSVフィードをインポーターが受け付けるサイズのピースに
//! 分割するモジュール。各ピースはヘッダー行を繰り返し、元のファイル
//! 名から `{名前}_{連番}.{拡張子}` の形で命名されます。

use std::path::PathBuf;

use crate::error::FeedError;

/// サイズ分割のデフォルト上限（バイト）
pub const DEFAULT_PIECE_SIZE: usize = 20_000;

/// 分割1回分の結果
///
/// 書き出したピースのパスを順番に保持します。上限を超える行を単独で
/// 書き出した場合は警告が積まれます。
#[derive(Debug, Clone)]
pub struct SplitReport {
    /// 書き出したピースのパス（書き出した順）
    pub pieces: Vec<PathBuf>,

    /// 処理中に積まれた警告
    pub warnings: Vec<String>,
}

/// CSVファイルをヘッダー付きのピースへ分割するスプリッター
///
/// 既存のファイルを上書きすることは決してありません。出力先に同名の
/// ファイルがある場合はエラーを返し、そこで分割を中断します。
///
/// # 使用例
///
/// ```rust,no_run
/// use ecddfeed::split::{CsvSplitter, DEFAULT_PIECE_SIZE};
///
/// # fn main() -> Result<(), ecddfeed::FeedError> {
/// let splitter = CsvSplitter::new("substances.csv")?;
/// let report = splitter.by_size(DEFAULT_PIECE_SIZE)?;
///
/// for piece in &report.pieces {
///     println!("Writing: {}", piece.display());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct CsvSplitter {
    /// 入力CSVのパス
    path: PathBuf,
    /// 拡張子を除いたファイル名
    stem: String,
    /// 入力の拡張子（ピースにも同じ拡張子を付ける）
    extension: String,
}

impl CsvSplitter {
    /// 指定したCSVファイルを対象とするスプリッターを生成する
    ///
    /// # 引数
    ///
    /// * `path`: 入力CSVのパス（拡張子が必要）
    ///
    /// # 戻り値
    ///
    /// * `Ok(CsvSplitter)`: パスからピース名を組み立てられる場合
    /// * `Err(FeedError::Config)`: 拡張子がない、またはファイル名が不正な場合
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, FeedError> {
        let path = path.into();

        let extension = match path.extension().and_then(|e| e.to_str()) {
            Some(extension) => extension.to_string(),
            None => {
                return Err(FeedError::Config(format!(
                    "Input file has no extension: {}",
                    path.display()
                )))
            }
        };

        let stem = match path.file_stem().and_then(|s| s.to_str()) {
            Some(stem) => stem.to_string(),
            None => {
                return Err(FeedError::Config(format!(
                    "Invalid input file name: {}",
                    path.display()
                )))
            }
        };

        Ok(Self {
            path,
            stem,
            extension,
        })
    }

    /// ピースのバイト数を上限以内に抑えて分割する
    ///
    /// ヘッダーを含めたピースの大きさが上限を超えない範囲でデータ行を
    /// 詰めていきます。1行だけで上限を超える行は、警告を積んだ上で
    /// その行だけのピースとして書き出します。
    ///
    /// # 引数
    ///
    /// * `max_bytes`: ピースの上限（ヘッダーを含むバイト数）
    ///
    /// # 戻り値
    ///
    /// * `Ok(SplitReport)`: 書き出したピースと警告
    /// * `Err(FeedError)`: 入力が読めない、または出力先が既に存在する場合
    pub fn by_size(&self, max_bytes: usize) -> Result<SplitReport, FeedError> {
        let text = std::fs::read_to_string(&self.path)?;
        let mut lines = text.split_inclusive('\n');
        let header = lines.next().unwrap_or("");

        let mut report = SplitReport {
            pieces: Vec::new(),
            warnings: Vec::new(),
        };
        let mut dumper = Dumper::new(self);
        let mut buffer = header.to_string();

        for line in lines {
            if buffer.len() + line.len() < max_bytes {
                // 通常の追記
                buffer.push_str(line);
            } else if buffer != header {
                // 上限に達した（データあり）
                dumper.dump(&buffer, &mut report)?;
                buffer = format!("{}{}", header, line);
            } else {
                // 1行だけで上限を超えた
                report.warnings.push(format!(
                    "In the {}-th file, line is bigger than {} bytes!",
                    dumper.nfiles, max_bytes
                ));
                dumper.dump(&format!("{}{}", header, line), &mut report)?;
                buffer = header.to_string();
            }
        }

        if buffer != header {
            dumper.dump(&buffer, &mut report)?;
        }

        Ok(report)
    }

    /// ピースあたりのデータ行数を固定して分割する
    ///
    /// 各ピースはヘッダーと`rows_per_piece`行のデータを持ちます
    /// （最後のピースだけ少なくなることがあります）。
    ///
    /// # 引数
    ///
    /// * `rows_per_piece`: ピースあたりのデータ行数（1以上）
    ///
    /// # 戻り値
    ///
    /// * `Ok(SplitReport)`: 書き出したピース
    /// * `Err(FeedError)`: 行数が0、入力が読めない、または出力先が既に存在する場合
    pub fn by_rows(&self, rows_per_piece: usize) -> Result<SplitReport, FeedError> {
        if rows_per_piece == 0 {
            return Err(FeedError::Config(
                "Rows per piece must be at least 1".to_string(),
            ));
        }

        let text = std::fs::read_to_string(&self.path)?;
        let mut lines = text.split_inclusive('\n');

        let mut report = SplitReport {
            pieces: Vec::new(),
            warnings: Vec::new(),
        };

        let header = match lines.next() {
            Some(header) => header,
            // 空の入力からはピースを作らない
            None => return Ok(report),
        };

        let mut dumper = Dumper::new(self);
        let mut buffer = header.to_string();
        let mut rows = 0;

        for line in lines {
            if rows == rows_per_piece {
                dumper.dump(&buffer, &mut report)?;
                buffer = header.to_string();
                rows = 0;
            }
            buffer.push_str(line);
            rows += 1;
        }

        // 最後のピース（データ行がない入力でもヘッダーだけのピースを書く）
        dumper.dump(&buffer, &mut report)?;

        Ok(report)
    }

    /// `index`番目のピースのパスを組み立てる
    fn piece_path(&self, index: usize) -> PathBuf {
        self.path
            .with_file_name(format!("{}_{}.{}", self.stem, index, self.extension))
    }
}

/// 連番ファイルへの書き出し係
///
/// 既存ファイルの上書きを拒否し、書いた数を数えます。
struct Dumper<'a> {
    splitter: &'a CsvSplitter,
    nfiles: usize,
}

impl<'a> Dumper<'a> {
    fn new(splitter: &'a CsvSplitter) -> Self {
        Self {
            splitter,
            nfiles: 0,
        }
    }

    fn dump(&mut self, text: &str, report: &mut SplitReport) -> Result<(), FeedError> {
        let path = self.splitter.piece_path(self.nfiles);

        if path.exists() {
            return Err(FeedError::Io(std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                format!("file already exists: {}", path.display()),
            )));
        }

        std::fs::write(&path, text)?;
        report.pieces.push(path);
        self.nfiles += 1;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_csv(dir: &std::path::Path, name: &str, text: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn test_splitter_requires_extension() {
        let result = CsvSplitter::new("no_extension");
        match result {
            Err(FeedError::Config(msg)) => {
                assert!(msg.contains("no extension"));
            }
            _ => panic!("Expected Config error"),
        }
    }

    #[test]
    fn test_by_rows_fixed_piece_sizes() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(dir.path(), "data.csv", "h\nr1\nr2\nr3\nr4\nr5\n");

        let splitter = CsvSplitter::new(&path).unwrap();
        let report = splitter.by_rows(2).unwrap();

        assert_eq!(report.pieces.len(), 3);
        assert!(report.warnings.is_empty());

        assert_eq!(
            std::fs::read_to_string(dir.path().join("data_0.csv")).unwrap(),
            "h\nr1\nr2\n"
        );
        assert_eq!(
            std::fs::read_to_string(dir.path().join("data_1.csv")).unwrap(),
            "h\nr3\nr4\n"
        );
        // 最後のピースは少なくてよい
        assert_eq!(
            std::fs::read_to_string(dir.path().join("data_2.csv")).unwrap(),
            "h\nr5\n"
        );
    }

    #[test]
    fn test_by_rows_header_only_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(dir.path(), "data.csv", "h\n");

        let report = CsvSplitter::new(&path).unwrap().by_rows(3).unwrap();

        assert_eq!(report.pieces.len(), 1);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("data_0.csv")).unwrap(),
            "h\n"
        );
    }

    #[test]
    fn test_by_rows_zero_rows_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(dir.path(), "data.csv", "h\nr1\n");

        let result = CsvSplitter::new(&path).unwrap().by_rows(0);
        assert!(matches!(result, Err(FeedError::Config(_))));
    }

    #[test]
    fn test_by_size_accumulates_under_budget() {
        let dir = tempfile::tempdir().unwrap();
        // ヘッダー2バイト、各行5バイト
        let path = write_csv(dir.path(), "data.csv", "h\naaaa\nbbbb\ncccc\ndddd\n");

        let report = CsvSplitter::new(&path).unwrap().by_size(13).unwrap();

        assert_eq!(report.pieces.len(), 2);
        assert!(report.warnings.is_empty());
        assert_eq!(
            std::fs::read_to_string(dir.path().join("data_0.csv")).unwrap(),
            "h\naaaa\nbbbb\n"
        );
        assert_eq!(
            std::fs::read_to_string(dir.path().join("data_1.csv")).unwrap(),
            "h\ncccc\ndddd\n"
        );
    }

    #[test]
    fn test_by_size_oversized_line_gets_own_piece() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            dir.path(),
            "data.csv",
            "h\nthis line alone is way over budget\nok\n",
        );

        let report = CsvSplitter::new(&path).unwrap().by_size(10).unwrap();

        assert_eq!(report.pieces.len(), 2);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("bigger than 10 bytes"));
        assert_eq!(
            std::fs::read_to_string(dir.path().join("data_0.csv")).unwrap(),
            "h\nthis line alone is way over budget\n"
        );
        assert_eq!(
            std::fs::read_to_string(dir.path().join("data_1.csv")).unwrap(),
            "h\nok\n"
        );
    }

    #[test]
    fn test_by_size_empty_input_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(dir.path(), "data.csv", "");

        let report = CsvSplitter::new(&path).unwrap().by_size(100).unwrap();
        assert!(report.pieces.is_empty());
    }

    #[test]
    fn test_refuses_to_overwrite_existing_piece() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(dir.path(), "data.csv", "h\nr1\nr2\n");
        write_csv(dir.path(), "data_0.csv", "already here");

        let result = CsvSplitter::new(&path).unwrap().by_rows(1);
        match result {
            Err(FeedError::Io(e)) => {
                assert_eq!(e.kind(), std::io::ErrorKind::AlreadyExists);
                assert!(e.to_string().contains("file already exists"));
            }
            _ => panic!("Expected Io error"),
        }

        // 既存ファイルはそのまま
        assert_eq!(
            std::fs::read_to_string(dir.path().join("data_0.csv")).unwrap(),
            "already here"
        );
    }

    #[test]
    fn test_pieces_keep_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(dir.path(), "feed.csv", "h\nr1\n");

        let report = CsvSplitter::new(&path).unwrap().by_size(100).unwrap();

        assert_eq!(report.pieces, vec![dir.path().join("feed_0.csv")]);
    }
}
