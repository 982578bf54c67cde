//! Get Column Binary
//!
//! スプレッドシートの1列を上から順に出力するデバッグ用ツール。
//! セル値はRustのデバッグ表記で引用符付きで出し、ハイパーリンクが
//! あれば「 -> リンク先」を添える。

use std::process;

use ecddfeed::record::strip_query;
use ecddfeed::sheet::{column_index, SheetReader};
use ecddfeed::FeedError;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 3 {
        eprintln!("Usage: {} <column> <sheet.xlsx> [options]", args[0]);
        eprintln!("\nOptions:");
        eprintln!("  --sheet-name <name>  Sheet holding the records (default: \"Full Sheet\")");
        eprintln!("\nExamples:");
        eprintln!("  {} B substances.xlsx", args[0]);
        eprintln!("  {} V substances.xlsx --sheet-name 'Full Sheet'", args[0]);
        process::exit(1);
    }

    let column = &args[1];
    let sheet_path = &args[2];
    let mut sheet_name = "Full Sheet".to_string();

    // オプションの解析
    let mut i = 3;
    while i < args.len() {
        match args[i].as_str() {
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

    if let Err(e) = run(column, sheet_path, &sheet_name) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(column: &str, sheet_path: &str, sheet_name: &str) -> Result<(), FeedError> {
    let col = column_index(column)
        .ok_or_else(|| FeedError::Config(format!("Invalid column: {}", column)))?;

    let mut reader = SheetReader::open(sheet_path)?;
    let rows = reader.rows(sheet_name)?;
    let links = reader.hyperlinks(sheet_name)?;

    for (row_index, row) in rows.iter().enumerate() {
        let value = row.get(col as usize).map(String::as_str).unwrap_or("");
        match links.get(row_index as u32, col) {
            Some(url) => println!("{:?} -> {}", value, strip_query(url)),
            None => println!("{:?}", value),
        }
    }
    Ok(())
}
