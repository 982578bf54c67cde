//! Get Links Binary
//!
//! スプレッドシートのレポート列（L〜V）からハイパーリンクを抜き出して
//! 一行ずつ出力する。アップロード前のリンク検証（wgetなどへのパイプ）に
//! 使うため、クエリ文字列を落とし、www.who.intをorigin.who.intへ
//! 書き換える。

use std::process;

use ecddfeed::record::strip_query;
use ecddfeed::sheet::{column_index, SheetReader};
use ecddfeed::FeedError;

/// リンクが並ぶ最初の列
const FIRST_LINK_COLUMN: &str = "L";
/// リンクが並ぶ最後の列（批判的審査レビューのリンク）
const LAST_LINK_COLUMN: &str = "V";

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <sheet.xlsx> [options]", args[0]);
        eprintln!("\nOptions:");
        eprintln!("  --with-reviews       Only critical review links of substances with documents");
        eprintln!("  --sheet-name <name>  Sheet holding the records (default: \"Full Sheet\")");
        eprintln!("\nExamples:");
        eprintln!("  {} substances.xlsx | xargs -n1 curl -sfI -o /dev/null || echo broken", args[0]);
        eprintln!("  {} substances.xlsx --with-reviews", args[0]);
        process::exit(1);
    }

    let sheet_path = &args[1];
    let mut sheet_name = "Full Sheet".to_string();
    let mut with_reviews = false;

    // オプションの解析
    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--with-reviews" => {
                with_reviews = true;
                i += 1;
            }
            "--sheet-name" => {
                if i + 1 >= args.len() {
                    eprintln!("Error: --sheet-name requires a value");
                    process::exit(1);
                }
                sheet_name = args[i + 1].clone();
                i += 2;
            }
            _ => {
                eprintln!("Error: Unknown option: {}", args[i]);
                process::exit(1);
            }
        }
    }

    if let Err(e) = run(sheet_path, &sheet_name, with_reviews) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(sheet_path: &str, sheet_name: &str, with_reviews: bool) -> Result<(), FeedError> {
    let mut reader = SheetReader::open(sheet_path)?;
    let rows = reader.rows(sheet_name)?;
    let links = reader.hyperlinks(sheet_name)?;

    let first = column_index(FIRST_LINK_COLUMN)
        .ok_or_else(|| FeedError::Config(format!("Invalid column: {}", FIRST_LINK_COLUMN)))?;
    let last = column_index(LAST_LINK_COLUMN)
        .ok_or_else(|| FeedError::Config(format!("Invalid column: {}", LAST_LINK_COLUMN)))?;

    for (row_index, row) in rows.iter().enumerate() {
        let row_index = row_index as u32;
        if with_reviews {
            // 文書列に値がある行の、批判的審査レビューのリンクだけを出す
            let has_documents = row
                .get(first as usize)
                .map(|value| !value.is_empty())
                .unwrap_or(false);
            if has_documents {
                if let Some(url) = links.get(row_index, last) {
                    println!("{}", feed_link(url));
                }
            }
        } else {
            for col in first..=last {
                if let Some(url) = links.get(row_index, col) {
                    println!("{}", feed_link(url));
                }
            }
        }
    }
    Ok(())
}

/// ダウンロードできる形へリンクを整える
fn feed_link(url: &str) -> String {
    strip_query(url).replace("www.who.int", "origin.who.int")
}
