//! CSV Feed Module
//!
//! マージ済みの物質レコードからCMSの"Substance record importer"
//! フィードが取り込むCSVを組み立てるモジュール。列の並びと
//! エスケープ規則はインポーター側の定義に固定されています。

use std::io::Write;

use chrono::NaiveDate;

use crate::builder::FeedConfig;
use crate::error::FeedError;
use crate::lookup::TrsLibrary;
use crate::record::SubstanceRecord;
use crate::sheet::HyperlinkIndex;
use crate::types::OrderedMap;

mod html;

pub use html::{render_sections, EXTRACT_SECTION_TITLES};

/// フィードの固定フィールド（この後ろに`field_link0`〜が続く）
pub const FEED_FIELDS: [&str; 13] = [
    "title",
    "field_drug_name",
    "field_alternative_names",
    "field_year",
    "field_year_s_and_type_of_review_",
    "field_drug_class",
    "field_drug_effect",
    "field_ecdd_recommendation",
    "field_current_scheduling_status",
    "field_technical_information_most",
    "field_ms_questionnaire_report",
    "field_recommendation_from_trs_",
    "field_link_to_full_trs",
];

/// TRS番号から公開リポジトリ上のPDFファイル名を引く
///
/// 古い号は `WHO_TRS_{n}.pdf`、近年の号はISBNベースのファイル名で
/// 公開されているため、対応表で引きます。表にない番号は `None`。
pub fn trs_filename(trs: &str) -> Option<&'static str> {
    let file = match trs {
        "21" => "WHO_TRS_21.pdf",
        "57" => "WHO_TRS_57.pdf",
        "76" => "WHO_TRS_76.pdf",
        "95" => "WHO_TRS_95.pdf",
        "102" => "WHO_TRS_102.pdf",
        "116" => "WHO_TRS_116.pdf",
        "142" => "WHO_TRS_142.pdf",
        "160" => "WHO_TRS_160.pdf",
        "188" => "WHO_TRS_188.pdf",
        "211" => "WHO_TRS_211.pdf",
        "229" => "WHO_TRS_229.pdf",
        "273" => "WHO_TRS_273.pdf",
        "312" => "WHO_TRS_312.pdf",
        "343" => "WHO_TRS_343.pdf",
        "407" => "WHO_TRS_407.pdf",
        "437" => "WHO_TRS_437.pdf",
        "460" => "WHO_TRS_460.pdf",
        "526" => "WHO_TRS_526.pdf",
        "551" => "WHO_TRS_551.pdf",
        "729" => "WHO_TRS_729.pdf",
        "741" => "WHO_TRS_741.pdf",
        "761" => "WHO_TRS_761.pdf",
        "775" => "WHO_TRS_775.pdf",
        "787" => "WHO_TRS_787.pdf",
        "808" => "WHO_TRS_808.pdf",
        "836" => "WHO_TRS_836.pdf",
        "856" => "WHO_TRS_856.pdf",
        "873" => "WHO_TRS_873.pdf",
        "903" => "WHO_TRS_903.pdf",
        "915" => "WHO_TRS_915.pdf",
        "942" => "WHO_TRS_942.pdf",
        "973" => "WHO_trs_973_eng.pdf",
        "991" => "WHO_TRS_991_eng.pdf",
        "998" => "WHO_TRS_998_eng.pdf",
        "1005" => "9789241210140-eng.pdf",
        "1009" => "9789241210188-eng.pdf",
        "1013" => "9789241210225-eng.pdf",
        "1018" => "9789241210270-eng.pdf",
        "1026" => "9789240001848-eng.pdf",
        "1034" => "9789240023024-eng.pdf",
        "1038" => "9789240042834-eng.pdf",
        _ => return None,
    };
    Some(file)
}

/// フィールドをCSV用にエスケープする
///
/// `,`・`“`・`”`・`"` のいずれかを含むフィールドは、カーリー引用符を
/// 直立引用符に直した上で、引用符を二重化してダブルクォートで囲み
/// ます。それ以外はそのまま返します。
pub fn escape_field(field: &str) -> String {
    let needs_quoting = field.contains(',')
        || field.contains('“')
        || field.contains('”')
        || field.contains('"');
    if !needs_quoting {
        return field.to_string();
    }

    let normalized = field.replace('“', "\"").replace('”', "\"");
    format!("\"{}\"", normalized.replace('"', "\"\""))
}

/// ヘッダー行のフィールド一覧を組み立てる
pub(crate) fn header_fields(link_slots: usize) -> Vec<String> {
    let mut fields: Vec<String> = FEED_FIELDS.iter().map(|f| f.to_string()).collect();
    for i in 0..link_slots {
        fields.push(format!("field_link{}", i));
    }
    fields
}

/// ファイル名に公開ファイルベースを前置する（空欄はそのまま）
///
/// リポジトリ側はファイル名を小文字で公開しているため、ファイル名
/// 部分だけを小文字化します。
fn prefix_path(base: &str, file: &str) -> String {
    if file.is_empty() {
        String::new()
    } else {
        format!("{}{}", base, file.to_lowercase())
    }
}

/// `field_year` 用の日付文字列（最後の審査年の1月1日）
fn year_date(years: &[String]) -> String {
    let last = years.last().map(String::as_str).unwrap_or("");
    match last
        .parse::<i32>()
        .ok()
        .and_then(|year| NaiveDate::from_ymd_opt(year, 1, 1))
    {
        Some(date) => date.format("%Y-%m-%d").to_string(),
        // 数値でない年（"c. 1950"など）はそのまま通す
        None => format!("{}-01-01", last),
    }
}

/// `field_year_s_and_type_of_review_` 用のセッション一覧
fn sessions_summary(record: &SubstanceRecord) -> String {
    record
        .sessions
        .iter()
        .zip(&record.years)
        .zip(&record.assessments)
        .map(|((session, year), assessment)| format!("{} ({}) - {}", session, year, assessment))
        .collect::<Vec<_>>()
        .join(", ")
}

/// シートの行からマージ済みレコード一覧を構築する
///
/// 物質名をキーに初出順で蓄積し、同名の行は既存レコードへマージ
/// します。マージできない行は警告を積んで読み飛ばします。
pub(crate) fn collect_records(
    rows: &[Vec<String>],
    links: &HyperlinkIndex,
) -> (OrderedMap<SubstanceRecord>, Vec<String>) {
    let mut records: OrderedMap<SubstanceRecord> = OrderedMap::new();
    let mut warnings = Vec::new();

    // 先頭行はヘッダー
    for (i, cells) in rows.iter().enumerate().skip(1) {
        let record = match SubstanceRecord::from_row(i as u32, cells, links) {
            Some(record) => record,
            None => continue,
        };

        let name = record.name.clone();
        match records.get(&name) {
            Some(existing) => match SubstanceRecord::merge(existing, record) {
                Ok(merged) => {
                    records.insert(name, merged);
                }
                Err(reason) => warnings.push(format!(
                    // 行番号はスプレッドシート表記（1始まり）
                    "Skipping merge - in row {}, substance {}: {}",
                    i + 1,
                    name,
                    reason
                )),
            },
            None => {
                records.insert(name, record);
            }
        }
    }

    (records, warnings)
}

/// 1物質分のフィールド列を組み立てる
pub(crate) fn feed_row(
    record: &SubstanceRecord,
    config: &FeedConfig,
    library: &mut Option<TrsLibrary>,
    warnings: &mut Vec<String>,
) -> Result<Vec<String>, FeedError> {
    // スプレッドシートの抜粋が空のときだけTRS本文へフォールバック
    let extract = render_sections(
        EXTRACT_SECTION_TITLES
            .iter()
            .copied()
            .zip(record.extract_texts.iter().map(String::as_str)),
    );
    let recommendation = if !extract.is_empty() {
        extract
    } else {
        lookup_recommendation(record, library, warnings)?
    };

    let mut fields = vec![
        record.name.clone(),
        record.name.clone(),
        record.alt_names.clone(),
        year_date(&record.years),
        sessions_summary(record),
        record.class.clone(),
        record.effect.clone(),
        record.recommendation.clone(),
        record.scheduling.clone(),
        prefix_path(&config.base_url, &record.report_link),
        prefix_path(&config.base_url, &record.questionnaire_link),
        recommendation,
        prefix_path(&config.base_url, trs_filename(&record.trs).unwrap_or("")),
    ];

    for link in &record.review_links {
        fields.push(prefix_path(&config.base_url, link));
    }
    while fields.len() < FEED_FIELDS.len() + config.link_slots {
        fields.push(String::new());
    }

    Ok(fields)
}

fn lookup_recommendation(
    record: &SubstanceRecord,
    library: &mut Option<TrsLibrary>,
    warnings: &mut Vec<String>,
) -> Result<String, FeedError> {
    let library = match library {
        Some(library) => library,
        None => return Ok(String::new()),
    };

    let outcome = library.lookup(&record.trs, &record.name)?;
    if let Some(warning) = outcome.warning {
        warnings.push(warning);
    }

    Ok(render_sections(
        outcome
            .sections
            .iter()
            .map(|(name, text)| (name, text.as_str())),
    ))
}

/// レコード一覧をCSVとして書き出す
///
/// # 戻り値
///
/// * `Ok(usize)`: 書き出したデータ行数（ヘッダーを除く）
pub(crate) fn write_feed<W: Write>(
    writer: &mut W,
    records: &OrderedMap<SubstanceRecord>,
    config: &FeedConfig,
    library: &mut Option<TrsLibrary>,
    warnings: &mut Vec<String>,
) -> Result<usize, FeedError> {
    writeln!(writer, "{}", join_escaped(&header_fields(config.link_slots)))?;

    let mut rows_written = 0;
    for (_, record) in records.iter() {
        let fields = feed_row(record, config, library, warnings)?;
        writeln!(writer, "{}", join_escaped(&fields))?;
        rows_written += 1;
    }

    Ok(rows_written)
}

fn join_escaped(fields: &[String]) -> String {
    fields
        .iter()
        .map(|field| escape_field(field))
        .collect::<Vec<_>>()
        .join(",")
}
