//! Substance Record Module
//!
//! スプレッドシートの1行を物質レコードへ抽出し、同名レコードの
//! マージを提供するモジュール。物質は複数の委員会で審査されるため
//! 複数行に分かれて現れることがあり、セッション・年・審査種別の
//! リストを時系列に連結します。

use crate::sheet::{column_index, HyperlinkIndex};

/// TRS抜粋のテキストが入る列（`P`〜`W`、8セクション分）
const EXTRACT_COLUMNS: [&str; 8] = ["P", "Q", "R", "S", "T", "U", "V", "W"];

/// レビュー文書リンクが入る列（`X`〜`AE`）
const REVIEW_LINK_COLUMNS: [&str; 8] = ["X", "Y", "Z", "AA", "AB", "AC", "AD", "AE"];

/// スプレッドシート1行から抽出した物質レコード
///
/// リンク系のフィールドはURLそのものではなく、公開ファイルベースに
/// 続けて使うファイル名（最後のパスセグメント、クエリ除去済み）を
/// 保持します。
#[derive(Debug, Clone, PartialEq)]
pub struct SubstanceRecord {
    /// 物質名（`A`列）
    pub name: String,
    /// 別名（`B`列）
    pub alt_names: String,
    /// 作用（`E`列）
    pub effect: String,
    /// 薬物クラス（`F`列、小文字化済み）
    pub class: String,
    /// 審査セッション（例: `"45th ECDD"`）
    pub sessions: Vec<String>,
    /// 審査年
    pub years: Vec<String>,
    /// 審査種別
    pub assessments: Vec<String>,
    /// ECDD勧告（`K`列）
    pub recommendation: String,
    /// 現在のスケジュール状況（`L`列）
    pub scheduling: String,
    /// 最終会合レポートのファイル名（`M`列のハイパーリンク）
    pub report_link: String,
    /// 加盟国質問票レポートのファイル名（`N`列のハイパーリンク）
    pub questionnaire_link: String,
    /// TRS抜粋のセクションテキスト（`P`〜`W`列、8要素）
    pub extract_texts: Vec<String>,
    /// レビュー文書のファイル名（`X`〜`AE`列、空欄は除く）
    pub review_links: Vec<String>,
    /// 最終会合レポートのTRS番号（`AF`列の最後のトークン）
    pub trs: String,
}

impl SubstanceRecord {
    /// 行からレコードを抽出する
    ///
    /// # 引数
    ///
    /// * `row` - 0始まりの絶対行番号（ハイパーリンク索引と揃える）
    /// * `cells` - 正規化済みのセル値
    /// * `links` - シートのハイパーリンク索引
    ///
    /// # 戻り値
    ///
    /// * `Some(SubstanceRecord)` - 抽出に成功した場合
    /// * `None` - 物質名が空の行（末尾の空行など）
    pub fn from_row(row: u32, cells: &[String], links: &HyperlinkIndex) -> Option<Self> {
        let name = value(cells, "A");
        if name.is_empty() {
            return None;
        }

        let mut review_links = Vec::new();
        for letters in REVIEW_LINK_COLUMNS {
            let file = link_value(links, row, letters);
            if !file.is_empty() {
                review_links.push(file);
            }
        }

        let extract_texts = EXTRACT_COLUMNS
            .iter()
            .map(|letters| value(cells, letters))
            .collect();

        Some(Self {
            name,
            alt_names: value(cells, "B"),
            effect: value(cells, "E"),
            class: value(cells, "F").to_lowercase(),
            sessions: vec![value(cells, "G")],
            years: vec![value(cells, "H")],
            assessments: vec![value(cells, "J")],
            recommendation: value(cells, "K"),
            scheduling: value(cells, "L"),
            report_link: link_value(links, row, "M"),
            questionnaire_link: link_value(links, row, "N"),
            extract_texts,
            review_links,
            trs: value(cells, "AF")
                .split_whitespace()
                .last()
                .unwrap_or_default()
                .to_string(),
        })
    }

    /// 既存レコードに新しい行のレコードをマージする
    ///
    /// スカラー値は新しいレコードのものを採用し、セッション・年・
    /// 審査種別・レビューリンクは旧→新の順に連結します。
    ///
    /// # 戻り値
    ///
    /// * `Ok(SubstanceRecord)` - マージ後のレコード
    /// * `Err(String)` - クラス不一致、セッションが時系列でない、
    ///   またはセッション表記が壊れている場合の診断
    pub fn merge(old: &SubstanceRecord, new: SubstanceRecord) -> Result<SubstanceRecord, String> {
        if old.class != new.class {
            return Err(format!("classes differ: {}, {}", old.class, new.class));
        }

        let last_old = match old.sessions.last() {
            Some(session) => session_number(session)?,
            None => return Err("no recorded session to merge onto".to_string()),
        };
        let last_new = match new.sessions.last() {
            Some(session) => session_number(session)?,
            None => return Err("no new session to merge".to_string()),
        };
        if last_old >= last_new {
            return Err(format!(
                "not in chronological order: {}, {}",
                last_old, last_new
            ));
        }

        let mut merged = new;
        merged.sessions = join_lists(&old.sessions, std::mem::take(&mut merged.sessions));
        merged.years = join_lists(&old.years, std::mem::take(&mut merged.years));
        merged.assessments = join_lists(&old.assessments, std::mem::take(&mut merged.assessments));
        merged.review_links = join_lists(&old.review_links, std::mem::take(&mut merged.review_links));
        Ok(merged)
    }
}

/// セッション表記からセッション番号を取り出す
///
/// `"12th ECDD"` のように、序数と ` ECDD` で終わる表記だけを受け
/// 付けます。
///
/// # 使用例
///
/// ```rust
/// use ecddfeed::record::session_number;
///
/// assert_eq!(session_number("45th ECDD"), Ok(45));
/// assert!(session_number("45 ECDD").is_err());
/// ```
pub fn session_number(session: &str) -> Result<u32, String> {
    let head = match session.strip_suffix(" ECDD") {
        Some(head) => head,
        None => return Err(format!("session has incorrect ending: {:?}", session)),
    };
    let ordinal = ["st", "nd", "rd", "th"]
        .iter()
        .any(|suffix| head.ends_with(suffix));
    if !ordinal {
        return Err(format!("session has incorrect ending: {:?}", session));
    }
    head[..head.len() - 2]
        .parse::<u32>()
        .map_err(|_| format!("session has incorrect number: {:?}", session))
}

/// URLからクエリ文字列を取り除く
///
/// 最後の `?` 以降を捨てます。先頭の `?` はクエリ区切りとして扱い
/// ません。
pub fn strip_query(url: &str) -> &str {
    match url.rfind('?') {
        Some(pos) if pos > 0 => &url[..pos],
        _ => url,
    }
}

/// URLからファイル名を取り出す
///
/// クエリ文字列を捨てた上で、最後の `/` セグメントを返します。
pub fn link_file_name(url: &str) -> &str {
    let url = strip_query(url);
    match url.rfind('/') {
        Some(pos) => &url[pos + 1..],
        None => url,
    }
}

/// 列参照でセル値を引く（範囲外・不正参照は空文字列）
fn value(cells: &[String], letters: &str) -> String {
    match column_index(letters) {
        Some(index) => cells.get(index as usize).cloned().unwrap_or_default(),
        None => String::new(),
    }
}

/// 列参照でハイパーリンクのファイル名を引く（リンクなしは空文字列）
fn link_value(links: &HyperlinkIndex, row: u32, letters: &str) -> String {
    match column_index(letters) {
        Some(col) => links
            .get(row, col)
            .map(|url| link_file_name(url).to_string())
            .unwrap_or_default(),
        None => String::new(),
    }
}

fn join_lists(old: &[String], new: Vec<String>) -> Vec<String> {
    let mut joined = old.to_vec();
    joined.extend(new);
    joined
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_session_number_ordinals() {
        assert_eq!(session_number("1st ECDD"), Ok(1));
        assert_eq!(session_number("42nd ECDD"), Ok(42));
        assert_eq!(session_number("3rd ECDD"), Ok(3));
        assert_eq!(session_number("45th ECDD"), Ok(45));
    }

    #[test]
    fn test_session_number_bad_ending() {
        let err = session_number("45 ECDD").unwrap_err();
        assert_eq!(err, "session has incorrect ending: \"45 ECDD\"");
        assert!(session_number("45th").is_err());
        assert!(session_number("").is_err());
    }

    #[test]
    fn test_session_number_bad_number() {
        let err = session_number("xth ECDD").unwrap_err();
        assert_eq!(err, "session has incorrect number: \"xth ECDD\"");
    }

    #[test]
    fn test_strip_query() {
        assert_eq!(
            strip_query("CriticalReview_5FPB22.pdf?ua=1"),
            "CriticalReview_5FPB22.pdf"
        );
        assert_eq!(strip_query("report.pdf"), "report.pdf");
        assert_eq!(strip_query("?odd/name"), "?odd/name");
    }

    #[test]
    fn test_link_file_name() {
        assert_eq!(
            link_file_name("https://origin.who.int/a/b/WHO_TRS_942.pdf?ua=1"),
            "WHO_TRS_942.pdf"
        );
        assert_eq!(link_file_name("https://example.org/report.pdf"), "report.pdf");
        assert_eq!(link_file_name("report.pdf"), "report.pdf");
        // 先頭の`?`はクエリ区切りとして扱わない
        assert_eq!(link_file_name("?odd/name"), "name");
    }

    fn cells_with(values: &[(&str, &str)]) -> Vec<String> {
        let size = column_index("AF").unwrap() as usize + 1;
        let mut cells = vec![String::new(); size];
        for (letters, value) in values {
            cells[column_index(letters).unwrap() as usize] = value.to_string();
        }
        cells
    }

    fn links_with(row: u32, values: &[(&str, &str)]) -> HyperlinkIndex {
        let mut links = HashMap::new();
        for (letters, url) in values {
            links.insert((row, column_index(letters).unwrap()), url.to_string());
        }
        HyperlinkIndex::from_links(links)
    }

    #[test]
    fn test_from_row_extracts_fields() {
        let cells = cells_with(&[
            ("A", "Etonitazene"),
            ("B", "etonitazen"),
            ("E", "Opioid agonist"),
            ("F", "Opioid"),
            ("G", "45th ECDD"),
            ("H", "1957"),
            ("J", "Critical review"),
            ("K", "Schedule I"),
            ("L", "Schedule I (1961)"),
            ("P", "Technical summary text."),
            ("AF", "WHO TRS 942"),
        ]);
        let links = links_with(
            1,
            &[
                ("M", "https://origin.who.int/trs/WHO_TRS_942.pdf?ua=1"),
                ("X", "https://example.org/review1.pdf"),
                ("Z", "https://example.org/review2.pdf"),
            ],
        );

        let record = SubstanceRecord::from_row(1, &cells, &links).unwrap();
        assert_eq!(record.name, "Etonitazene");
        assert_eq!(record.class, "opioid");
        assert_eq!(record.sessions, vec!["45th ECDD"]);
        assert_eq!(record.years, vec!["1957"]);
        assert_eq!(record.report_link, "WHO_TRS_942.pdf");
        assert_eq!(record.questionnaire_link, "");
        // 空欄のリンク列は飛ばして詰める
        assert_eq!(record.review_links, vec!["review1.pdf", "review2.pdf"]);
        assert_eq!(record.extract_texts[0], "Technical summary text.");
        assert_eq!(record.extract_texts[7], "");
        assert_eq!(record.trs, "942");
    }

    #[test]
    fn test_from_row_skips_unnamed() {
        let cells = cells_with(&[("F", "Opioid")]);
        let links = links_with(1, &[]);
        assert!(SubstanceRecord::from_row(1, &cells, &links).is_none());
    }

    fn record(name: &str, class: &str, session: &str, year: &str) -> SubstanceRecord {
        SubstanceRecord {
            name: name.to_string(),
            alt_names: String::new(),
            effect: String::new(),
            class: class.to_string(),
            sessions: vec![session.to_string()],
            years: vec![year.to_string()],
            assessments: vec!["Critical review".to_string()],
            recommendation: String::new(),
            scheduling: String::new(),
            report_link: String::new(),
            questionnaire_link: String::new(),
            extract_texts: vec![String::new(); 8],
            review_links: Vec::new(),
            trs: String::new(),
        }
    }

    #[test]
    fn test_merge_concatenates_lists() {
        let old = record("Cocaine", "stimulant", "12th ECDD", "1961");
        let mut new = record("Cocaine", "stimulant", "45th ECDD", "2007");
        new.review_links.push("later.pdf".to_string());

        let merged = SubstanceRecord::merge(&old, new).unwrap();
        assert_eq!(merged.sessions, vec!["12th ECDD", "45th ECDD"]);
        assert_eq!(merged.years, vec!["1961", "2007"]);
        assert_eq!(merged.assessments.len(), 2);
        assert_eq!(merged.review_links, vec!["later.pdf"]);
    }

    #[test]
    fn test_merge_rejects_class_mismatch() {
        let old = record("Cocaine", "stimulant", "12th ECDD", "1961");
        let new = record("Cocaine", "opioid", "45th ECDD", "2007");

        let err = SubstanceRecord::merge(&old, new).unwrap_err();
        assert_eq!(err, "classes differ: stimulant, opioid");
    }

    #[test]
    fn test_merge_rejects_out_of_order_sessions() {
        let old = record("Cocaine", "stimulant", "45th ECDD", "2007");
        let new = record("Cocaine", "stimulant", "12th ECDD", "1961");

        let err = SubstanceRecord::merge(&old, new).unwrap_err();
        assert_eq!(err, "not in chronological order: 45, 12");
    }

    #[test]
    fn test_merge_rejects_malformed_session() {
        let old = record("Cocaine", "stimulant", "ECDD", "1961");
        let new = record("Cocaine", "stimulant", "45th ECDD", "2007");

        let err = SubstanceRecord::merge(&old, new).unwrap_err();
        assert!(err.starts_with("session has incorrect ending"));
    }
}
