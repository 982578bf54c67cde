//! TRS Hierarchical Parser Module
//!
//! 番号付きの見出し行（`d.d` と `d.d.d`）と空行を手掛かりに、フラットな
//! テキストから3階層構造を復元します。各階層は前の階層の本文に対する
//! 1回の走査で処理され、再帰はありません。

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::FeedError;
use crate::trs::reflow::reflow_paragraphs;
use crate::trs::{NAME_CONTINUATION, PARAGRAPH_BREAK};
use crate::types::{DrugMap, SectionMap, TrsReport};

/// カテゴリ見出し（例: `4.2  Benzodiazepines`）にマッチするパターン
///
/// `d.d.d` の薬物見出しには構造上マッチしない（2つ目の数字の直後に
/// `.` が来るとバックトラックの余地なく失敗する）。
static CATEGORY_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\d+\.\d+\s+(.*)").unwrap());

/// 薬物見出し（例: `4.2.1  Example Drug`）にマッチするパターン
static DRUG_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\d+\.\d+\.\d+\s+(.*)").unwrap());

/// TRSレポート全文を解析して3階層構造を返す
///
/// 同じ入力からは常に同じ構造・同じ順序が得られます（純粋関数）。
/// 各階層のキーはドキュメント内の出現順に並びます。
///
/// カテゴリ見出しが1つも見つからない場合は、テキスト全体を空文字列名の
/// 暗黙カテゴリ1個の本文として扱います。これは意図された
/// 「緩やかに劣化する」動作であり、エラーではありません。
///
/// # 引数
///
/// * `text`: 整形済みTRSレポートの全文
///
/// # 戻り値
///
/// * `Ok(TrsReport)`: カテゴリ → 薬物 → セクションの3階層マップ
/// * `Err(FeedError::MalformedSection)`: セクションブロックに名前と本文の
///   区切りがない場合（該当ドキュメントの解析は中断されます）
///
/// # 使用例
///
/// ```rust
/// use ecddfeed::trs::parse_report;
///
/// # fn main() -> Result<(), ecddfeed::FeedError> {
/// let text = "\n1.1 Opioids\n\n1.1.1 Fentanyl\nSummary\nShort text.\n";
/// let report = parse_report(text)?;
///
/// let drugs = report.get("Opioids").unwrap();
/// let sections = drugs.get("Fentanyl").unwrap();
/// assert_eq!(sections.get("Summary").map(String::as_str), Some("Short text."));
/// # Ok(())
/// # }
/// ```
pub fn parse_report(text: &str) -> Result<TrsReport, FeedError> {
    let mut categories = TrsReport::new();

    // 1. カテゴリ見出しでテキストを分割
    let parts = split_at_markers(&CATEGORY_MARKER, text);

    // 2. 見出しなし: 全文を空文字列名の単一バケットとして薬物解析へ渡す
    if parts.is_empty() {
        categories.insert("", parse_drugs(text)?);
        return Ok(categories);
    }

    // 3. 最初の見出しより前の前書きは捨て、(見出し, 本文) を順に組にする
    for (title, body) in parts {
        // 薬物見出しのパターンが本文先頭でも確実にマッチするように、
        // 整形した本文の前に改行を1つ補う
        let body = format!("\n{}", body.trim());
        categories.insert(title.trim(), parse_drugs(&body)?);
    }

    Ok(categories)
}

/// カテゴリ本文1件を解析して薬物マップを返す
///
/// 薬物見出しが1つも見つからない本文は、薬物0件として扱います
/// （エラーではありません）。
///
/// 見出しの次の行が改行 + スペース3個で始まる間は、その行を薬物名の
/// 継続行として名前にスペース区切りで連結します。スペース4個は段落
/// マーカーなので継続行とは見なしません。
///
/// # 引数
///
/// * `text`: カテゴリ1件分の本文（先頭に改行があること）
///
/// # 戻り値
///
/// * `Ok(DrugMap)`: 薬物名 → セクションマップ
/// * `Err(FeedError::MalformedSection)`: セクションブロックが不正な場合
pub fn parse_drugs(text: &str) -> Result<DrugMap, FeedError> {
    let mut drugs = DrugMap::new();

    for (title, body) in split_at_markers(&DRUG_MARKER, text) {
        let mut name = title.trim().to_string();
        let mut body = body;

        // 1. 薬物名の継続行を名前に取り込む
        while body.starts_with(NAME_CONTINUATION) && !body.starts_with(PARAGRAPH_BREAK) {
            let (line, rest) = match body[1..].find('\n') {
                Some(offset) => body.split_at(offset + 1),
                None => (body, ""),
            };
            name.push(' ');
            name.push_str(line.trim());
            body = rest;
        }

        // 2. 残りの本文をセクションに分割
        let sections = parse_sections(body, &name)?;
        drugs.insert(name, sections);
    }

    Ok(drugs)
}

/// 薬物本文1件をセクションマップに分割する
///
/// 空行（連続する改行2個）でブロックに区切り、各ブロックの先頭行を
/// セクション名、残りを本文とします。空白のみのブロックは読み飛ばします。
/// 名前の行しかない非空ブロックは不正入力です。
fn parse_sections(text: &str, drug: &str) -> Result<SectionMap, FeedError> {
    let mut sections = SectionMap::new();

    for block in text.split("\n\n") {
        let block = block.trim_start();
        if block.is_empty() {
            continue;
        }

        let (name, content) = block
            .split_once('\n')
            .ok_or_else(|| FeedError::MalformedSection {
                drug: drug.to_string(),
                block: block.to_string(),
            })?;

        sections.insert(name, reflow_paragraphs(content));
    }

    Ok(sections)
}

/// 3階層構造をカテゴリ階層なしの薬物マップに平坦化する
///
/// 薬物をドキュメント内の出現順に集め、カテゴリ階層を捨てます。
/// 複数のカテゴリに同名の薬物がある場合は後の値が勝ち、最初の位置が
/// 保たれます（挿入と同じポリシー）。
///
/// カテゴリを気にせず物質名でセクションを引く下流のマージ処理で
/// 使用されます。
pub fn flatten(report: &TrsReport) -> DrugMap {
    let mut drugs = DrugMap::new();
    for category in report.values() {
        for (name, sections) in category.iter() {
            drugs.insert(name, sections.clone());
        }
    }
    drugs
}

/// マーカーのパターンでテキストを分割し、(見出し, 本文) の組を順に返す
///
/// 本文はマッチ終端から次のマッチ開始（最後はテキスト末尾）までの範囲です。
/// マッチが1つもなければ空のVecを返し、フォールバックの判断は呼び出し元に
/// 委ねます。
fn split_at_markers<'t>(marker: &Regex, text: &'t str) -> Vec<(&'t str, &'t str)> {
    // 1. すべてのマーカー位置と見出しを集める
    let mut markers = Vec::new();
    for caps in marker.captures_iter(text) {
        if let (Some(whole), Some(title)) = (caps.get(0), caps.get(1)) {
            markers.push((whole.start(), whole.end(), title.as_str()));
        }
    }

    // 2. 連続するマーカー位置で本文の範囲を区切る
    let mut parts = Vec::with_capacity(markers.len());
    for (i, &(_, body_start, title)) in markers.iter().enumerate() {
        let body_end = match markers.get(i + 1) {
            Some(&(next_start, _, _)) => next_start,
            None => text.len(),
        };
        parts.push((title, &text[body_start..body_end]));
    }

    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_category_drug_section() {
        let text = "\n1.1 Opioids\n\n1.1.1 Fentanyl\nSummary\nShort text.\n";
        let report = parse_report(text).unwrap();

        assert_eq!(report.len(), 1);
        let drugs = report.get("Opioids").unwrap();
        assert_eq!(drugs.len(), 1);
        let sections = drugs.get("Fentanyl").unwrap();
        assert_eq!(sections.len(), 1);
        assert_eq!(
            sections.get("Summary").map(String::as_str),
            Some("Short text.")
        );
    }

    #[test]
    fn test_parse_no_markers_yields_single_empty_category() {
        let report = parse_report("Summary\nJust text.\n").unwrap();

        assert_eq!(report.len(), 1);
        let drugs = report.get("").unwrap();
        assert!(drugs.is_empty());
    }

    #[test]
    fn test_parse_empty_input() {
        let report = parse_report("").unwrap();

        assert_eq!(report.len(), 1);
        assert!(report.get("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_discards_preamble() {
        let text = "Committee introduction, ignored.\n\n\n2.1 Stimulants\n\n2.1.1 Amfetamine\nSummary\nText.\n";
        let report = parse_report(text).unwrap();

        assert_eq!(report.len(), 1);
        assert!(report.contains_key("Stimulants"));
    }

    #[test]
    fn test_parse_multiple_categories_in_order() {
        let text = "\n3.1 Opioids\n\n3.1.1 Fentanyl\nSummary\nA.\n\n3.2 Benzodiazepines\n\n3.2.1 Diazepam\nSummary\nB.\n";
        let report = parse_report(text).unwrap();

        let names: Vec<&str> = report.keys().collect();
        assert_eq!(names, ["Opioids", "Benzodiazepines"]);
    }

    #[test]
    fn test_parse_category_without_drugs() {
        let text = "\n4.1 General considerations\n\n4.2 Opioids\n\n4.2.1 Fentanyl\nSummary\nText.\n";
        let report = parse_report(text).unwrap();

        assert!(report.get("General considerations").unwrap().is_empty());
        assert_eq!(report.get("Opioids").unwrap().len(), 1);
    }

    #[test]
    fn test_category_marker_does_not_match_drug_lines() {
        // 薬物見出しの行はカテゴリ見出しとして扱われない
        let text = "\n5.1.1 Loose drug heading\nSummary\nText.\n";
        let report = parse_report(text).unwrap();

        // カテゴリマーカーは見つからず、全体が空文字列カテゴリへ落ちる
        assert_eq!(report.len(), 1);
        let drugs = report.get("").unwrap();
        assert_eq!(drugs.len(), 1);
        assert!(drugs.contains_key("Loose drug heading"));
    }

    #[test]
    fn test_drug_name_continuation_absorbed() {
        let text = "\n1.2 Opioids\n\n1.2.1 Very long drug\n   name (INN)\nSummary\nShort text.\n";
        let report = parse_report(text).unwrap();

        let drugs = report.get("Opioids").unwrap();
        let names: Vec<&str> = drugs.keys().collect();
        assert_eq!(names, ["Very long drug name (INN)"]);

        // 継続行はセクション本文に漏れない
        let sections = drugs.get("Very long drug name (INN)").unwrap();
        assert_eq!(
            sections.get("Summary").map(String::as_str),
            Some("Short text.")
        );
    }

    #[test]
    fn test_multiple_continuation_lines() {
        let text = "\n1.2 Opioids\n\n1.2.1 First\n   second\n   third\nSummary\nText.\n";
        let report = parse_report(text).unwrap();

        let drugs = report.get("Opioids").unwrap();
        assert!(drugs.contains_key("First second third"));
    }

    #[test]
    fn test_four_space_indent_is_not_a_continuation() {
        // スペース4個は段落マーカーなので薬物名には取り込まれない
        let text = "\n1.2 Opioids\n\n1.2.1 Drug\nSummary\nFirst.\n    Second paragraph.\n";
        let report = parse_report(text).unwrap();

        let drugs = report.get("Opioids").unwrap();
        let names: Vec<&str> = drugs.keys().collect();
        assert_eq!(names, ["Drug"]);

        let sections = drugs.get("Drug").unwrap();
        assert_eq!(
            sections.get("Summary").map(String::as_str),
            Some("First.\nSecond paragraph.")
        );
    }

    #[test]
    fn test_continuation_without_following_newline() {
        // 継続行の後に改行がない場合は残り全体を名前に取り込む
        let drugs = parse_drugs("\n9.9.9 Base\n   tail").unwrap();

        let names: Vec<&str> = drugs.keys().collect();
        assert_eq!(names, ["Base tail"]);
        assert!(drugs.get("Base tail").unwrap().is_empty());
    }

    #[test]
    fn test_malformed_section_block_fails() {
        // 名前の行だけで本文との区切りがないブロックは不正
        let text = "\n1.1 Opioids\n\n1.1.1 Fentanyl\nSummary\nText.\n\nRecommendation";
        let result = parse_report(text);

        match result {
            Err(FeedError::MalformedSection { drug, block }) => {
                assert_eq!(drug, "Fentanyl");
                assert_eq!(block, "Recommendation");
            }
            other => panic!("Expected MalformedSection error, got {:?}", other),
        }
    }

    #[test]
    fn test_whitespace_only_block_is_skipped() {
        // カテゴリなしの経路では本文はトリムされずにここまで届く
        let drugs = parse_drugs("\n1.1.1 Fentanyl\nSummary\nText.\n\n  \n").unwrap();
        assert_eq!(drugs.get("Fentanyl").unwrap().len(), 1);

        // セクションの間に挟まった空白のみのブロックも読み飛ばす
        let drugs =
            parse_drugs("\n1.1.1 Fentanyl\nSummary\nA.\n\n   \n\nRecommendation\nB.\n").unwrap();
        let sections = drugs.get("Fentanyl").unwrap();
        let names: Vec<&str> = sections.keys().collect();
        assert_eq!(names, ["Summary", "Recommendation"]);
    }

    #[test]
    fn test_sections_in_order() {
        let text = "\n1.1 Opioids\n\n1.1.1 Fentanyl\nSummary\nA.\n\nWHO review history\nB.\n\nRecommendation\nC.\n";
        let report = parse_report(text).unwrap();

        let sections = report.get("Opioids").unwrap().get("Fentanyl").unwrap();
        let names: Vec<&str> = sections.keys().collect();
        assert_eq!(names, ["Summary", "WHO review history", "Recommendation"]);
    }

    #[test]
    fn test_duplicate_section_names_last_value_first_position() {
        let text = "\n1.1 Opioids\n\n1.1.1 Fentanyl\nSummary\nOld.\n\nRecommendation\nMid.\n\nSummary\nNew.\n";
        let report = parse_report(text).unwrap();

        let sections = report.get("Opioids").unwrap().get("Fentanyl").unwrap();
        let entries: Vec<(&str, &String)> = sections.iter().collect();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0, "Summary");
        assert_eq!(entries[0].1, "New.");
        assert_eq!(entries[1].0, "Recommendation");
    }

    #[test]
    fn test_section_content_is_reflowed() {
        let text = "\n1.1 Opioids\n\n1.1.1 Fentanyl\nSummary\nWrapped\nline.\n    Next paragraph.\n";
        let report = parse_report(text).unwrap();

        let sections = report.get("Opioids").unwrap().get("Fentanyl").unwrap();
        assert_eq!(
            sections.get("Summary").map(String::as_str),
            Some("Wrapped line.\nNext paragraph.")
        );
    }

    #[test]
    fn test_flatten_collects_drugs_in_document_order() {
        let text = "\n1.1 Opioids\n\n1.1.1 Fentanyl\nSummary\nA.\n\n1.2 Stimulants\n\n1.2.1 Amfetamine\nSummary\nB.\n";
        let report = parse_report(text).unwrap();
        let drugs = flatten(&report);

        let names: Vec<&str> = drugs.keys().collect();
        assert_eq!(names, ["Fentanyl", "Amfetamine"]);
        assert_eq!(
            drugs.get("Fentanyl").unwrap().get("Summary").unwrap(),
            "A."
        );
    }

    #[test]
    fn test_flatten_duplicate_drug_across_categories() {
        let text = "\n1.1 First\n\n1.1.1 Shared\nSummary\nOld.\n\n1.2 Second\n\n1.2.1 Shared\nSummary\nNew.\n";
        let report = parse_report(text).unwrap();
        let drugs = flatten(&report);

        assert_eq!(drugs.len(), 1);
        assert_eq!(
            drugs.get("Shared").unwrap().get("Summary").unwrap(),
            "New."
        );
    }

    #[test]
    fn test_flatten_equivalent_to_direct_drug_parse() {
        // カテゴリ階層を取り除いたドキュメントの直接解析と一致する
        let with_categories =
            "\n1.1 Opioids\n\n1.1.1 Fentanyl\nSummary\nA.\n\n1.1.2 Etonitazene\nSummary\nB.\n";
        let without_categories =
            "\n1.1.1 Fentanyl\nSummary\nA.\n\n1.1.2 Etonitazene\nSummary\nB.\n";

        let flattened = flatten(&parse_report(with_categories).unwrap());
        let direct = parse_drugs(without_categories).unwrap();

        assert_eq!(flattened, direct);
    }

    #[test]
    fn test_drug_titles_are_trimmed() {
        let drugs = parse_drugs("\n2.2.2 Spaced out   \nSummary\nText.\n").unwrap();
        assert!(drugs.contains_key("Spaced out"));
    }

    // プロパティベーステスト
    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            // セクションはドキュメント内の出現順で返る
            #[test]
            fn test_sections_keep_document_order(
                words in prop::collection::vec("[A-Z][a-z]{2,10}", 1..8),
            ) {
                // 添字を付けて名前の衝突を避ける
                let names: Vec<String> = words
                    .iter()
                    .enumerate()
                    .map(|(i, word)| format!("{} {}", word, i))
                    .collect();

                let mut text = String::from("\n1.1 Category\n\n1.1.1 Drug\n");
                for (i, name) in names.iter().enumerate() {
                    text.push_str(&format!("{}\nContent {}.\n\n", name, i));
                }

                let report = parse_report(&text).unwrap();
                let sections = report.get("Category").unwrap().get("Drug").unwrap();
                let got: Vec<&str> = sections.keys().collect();
                let want: Vec<&str> = names.iter().map(String::as_str).collect();
                prop_assert_eq!(got, want);
            }

            // 名前の継続行は何行あってもすべて薬物名へ取り込まれる
            #[test]
            fn test_continuation_lines_absorbed(
                base in "[A-Z][a-z]{2,10}",
                frags in prop::collection::vec("[a-z][a-z0-9]{0,8}", 0..4),
            ) {
                let mut text = format!("\n2.1 Category\n\n2.1.1 {}", base);
                for frag in &frags {
                    text.push_str("\n   ");
                    text.push_str(frag);
                }
                text.push_str("\nSummary\nText here.\n");

                let mut expected = base.clone();
                for frag in &frags {
                    expected.push(' ');
                    expected.push_str(frag);
                }

                let report = parse_report(&text).unwrap();
                let drugs = report.get("Category").unwrap();
                prop_assert_eq!(drugs.keys().collect::<Vec<_>>(), vec![expected.as_str()]);

                // 継続行はセクション本文に漏れない
                let sections = drugs.get(&expected).unwrap();
                prop_assert_eq!(
                    sections.get("Summary").map(String::as_str),
                    Some("Text here.")
                );
            }
        }
    }
}
