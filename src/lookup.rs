//! Name Lookup Module
//!
//! 解析済みTRSレポートから物質名でセクションを引くためのモジュール。
//! スプレッドシート側の名前とTRS見出しの名前は表記が揺れる（ギリシャ文字、
//! 音訳、末尾の修飾語など）ため、両側を正規化してから照合します。

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::PathBuf;

use rayon::prelude::*;

use crate::error::FeedError;
use crate::trs::{flatten, parse_report};
use crate::types::{DrugMap, SectionMap, TrsReport};

/// 物質名を照合用に正規化する
///
/// 前後の空白を取り除き、固定の置換表（`α` → `alpha`、`γ` → `gamma`、
/// `pheta` → `feta`）を適用してから小文字化します。名前が `)` で終わる
/// 場合は最後の `(` 以降を切り落とします（`Name (INN)` 形式の修飾語を
/// 除去するため）。
///
/// # 使用例
///
/// ```rust
/// use ecddfeed::lookup::simplify_name;
///
/// assert_eq!(
///     simplify_name("α-Lisdexamphetamine (INN) "),
///     "alpha-lisdexamfetamine"
/// );
/// ```
pub fn simplify_name(name: &str) -> String {
    let mut name = name.trim().to_string();

    for (from, to) in [("α", "alpha"), ("γ", "gamma"), ("pheta", "feta")] {
        name = name.replace(from, to);
    }

    if name.ends_with(')') {
        let cut = name.rfind('(').unwrap_or(name.len() - 1);
        name.truncate(cut);
        name.trim().to_lowercase()
    } else {
        name.to_lowercase()
    }
}

/// ルックアップ1回の結果
///
/// 名前が見つからなくても処理は続行できるように、ミスはエラーではなく
/// 空のセクションマップと診断メッセージの組で返します。
#[derive(Debug)]
pub struct LookupOutcome {
    /// 見つかったセクション（ミスの場合は空）
    pub sections: SectionMap,
    /// 診断メッセージ（ヒットの場合はなし）
    pub warning: Option<String>,
}

impl LookupOutcome {
    fn missing(warning: String) -> Self {
        Self {
            sections: SectionMap::new(),
            warning: Some(warning),
        }
    }
}

/// 抽出済みTRSテキストのディレクトリを対象とするキャッシュ付きルックアップ
///
/// ディレクトリには `{TRS番号}.txt` という名前のファイルが並んでいる想定
/// です。ファイルは初回アクセス時に解析されてキャッシュされます。
///
/// ファイルが存在しない場合や名前が見つからない場合は警告付きの空の結果を
/// 返し、バッチ処理を続行できます。ファイルはあるが構造が壊れている場合
/// （`MalformedSection`）は上流の整形ミスなので、即座にエラーを返します。
///
/// # 使用例
///
/// ```rust,no_run
/// use ecddfeed::lookup::TrsLibrary;
///
/// # fn main() -> Result<(), ecddfeed::FeedError> {
/// let mut library = TrsLibrary::new("extracted_from_trs");
/// let outcome = library.lookup("1038", "Etonitazene")?;
///
/// if let Some(warning) = &outcome.warning {
///     eprintln!("{}", warning);
/// }
/// # Ok(())
/// # }
/// ```
pub struct TrsLibrary {
    /// 抽出済みTRSテキストのディレクトリ
    dir: PathBuf,
    /// TRS番号 → 正規化済みの名前で引ける薬物マップ
    cache: HashMap<String, DrugMap>,
}

impl TrsLibrary {
    /// 指定ディレクトリを対象とするライブラリを生成する
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            cache: HashMap::new(),
        }
    }

    /// ディレクトリ内のすべての `.txt` ファイルを先読みして解析する
    ///
    /// 解析はファイル単位で独立なのでrayonで並列化します。
    ///
    /// # 戻り値
    ///
    /// * `Ok(usize)`: キャッシュされたレポート数
    /// * `Err(FeedError)`: ディレクトリが読めない、またはいずれかの
    ///   ファイルの構造が壊れている場合
    pub fn preload(&mut self) -> Result<usize, FeedError> {
        // 1. 対象ファイルを列挙
        let mut files = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("txt") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                files.push((stem.to_string(), path.clone()));
            }
        }

        // 2. ファイルごとに並列で解析
        let parsed: Result<Vec<(String, DrugMap)>, FeedError> = files
            .par_iter()
            .map(|(trs, path)| {
                let text = std::fs::read_to_string(path)?;
                let report = parse_report(&text)?;
                Ok((trs.clone(), simplified_drugs(&report)))
            })
            .collect();

        // 3. キャッシュへ取り込み
        for (trs, drugs) in parsed? {
            self.cache.insert(trs, drugs);
        }

        Ok(self.cache.len())
    }

    /// 指定TRSの中から物質名でセクションを引く
    ///
    /// # 引数
    ///
    /// * `trs`: TRS番号（例: `"942"`）
    /// * `name`: 物質名（正規化前のままでよい）
    ///
    /// # 戻り値
    ///
    /// * `Ok(LookupOutcome)`: ヒットならセクション、ミスなら警告付きの空
    /// * `Err(FeedError)`: ファイルの読み込みや構造解析に失敗した場合
    pub fn lookup(&mut self, trs: &str, name: &str) -> Result<LookupOutcome, FeedError> {
        // 1. キャッシュを埋める（初回アクセス時のみファイルを解析）
        let drugs = match self.cache.entry(trs.to_string()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(slot) => {
                let path = self.dir.join(format!("{}.txt", trs));
                if !path.exists() {
                    return Ok(LookupOutcome::missing(format!(
                        "Not reading TRS from nonexistent file {}",
                        path.display()
                    )));
                }
                let text = std::fs::read_to_string(&path)?;
                let report = parse_report(&text)?;
                slot.insert(simplified_drugs(&report))
            }
        };

        // 2. 正規化した名前で照合
        let wanted = simplify_name(name);
        match drugs.get(&wanted) {
            Some(sections) => Ok(LookupOutcome {
                sections: sections.clone(),
                warning: None,
            }),
            None => {
                let mut known: Vec<&str> = drugs.keys().collect();
                known.sort_unstable();
                Ok(LookupOutcome::missing(format!(
                    "In TRS {}, missing {:?} in {:?}",
                    trs, wanted, known
                )))
            }
        }
    }
}

/// レポートを平坦化し、キーを正規化済みの名前に置き換える
fn simplified_drugs(report: &TrsReport) -> DrugMap {
    let mut drugs = DrugMap::new();
    for (name, sections) in flatten(report) {
        drugs.insert(simplify_name(&name), sections);
    }
    drugs
}
