//! Make CSV Binary
//!
//! 物質スプレッドシートを読み込み、CMSの"Substance record importer"
//! フィードへアップロードできるCSVを生成する。マージできなかった行や
//! TRSルックアップのミスは警告としてstderrに出力する。

use std::fs::File;
use std::process;

use ecddfeed::{FeedBuilder, FeedError, FeedReport};

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <sheet.xlsx> [options]", args[0]);
        eprintln!("\nOptions:");
        eprintln!("  --output <file>      Output CSV file (default: substances.csv)");
        eprintln!("  --sheet-name <name>  Sheet holding the records (default: \"Full Sheet\")");
        eprintln!("  --trs-dir <dir>      Directory with extracted TRS texts (default: extracted_from_trs)");
        eprintln!("  --base-url <url>     Public file base URL, must end with '/'");
        eprintln!("\nExamples:");
        eprintln!("  {} 'ECDD1950_Substances considered (2023_01_23 TLR).xlsx'", args[0]);
        eprintln!("  {} substances.xlsx --output feed.csv --trs-dir texts", args[0]);
        process::exit(1);
    }

    let sheet_path = &args[1];
    let mut output_path = "substances.csv".to_string();
    let mut builder = FeedBuilder::new().with_trs_dir("extracted_from_trs");

    // オプションの解析
    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--output" => {
                if i + 1 >= args.len() {
                    eprintln!("Error: --output requires a value");
                    process::exit(1);
                }
                output_path = args[i + 1].clone();
                i += 2;
            }
            "--sheet-name" => {
                if i + 1 >= args.len() {
                    eprintln!("Error: --sheet-name requires a value");
                    process::exit(1);
                }
                builder = builder.with_sheet_name(args[i + 1].clone());
                i += 2;
            }
            "--trs-dir" => {
                if i + 1 >= args.len() {
                    eprintln!("Error: --trs-dir requires a value");
                    process::exit(1);
                }
                builder = builder.with_trs_dir(args[i + 1].clone());
                i += 2;
            }
            "--base-url" => {
                if i + 1 >= args.len() {
                    eprintln!("Error: --base-url requires a value");
                    process::exit(1);
                }
                builder = builder.with_base_url(args[i + 1].clone());
                i += 2;
            }
            _ => {
                eprintln!("Error: Unknown option: {}", args[i]);
                process::exit(1);
            }
        }
    }

    match run(builder, sheet_path, &output_path) {
        Ok(report) => {
            for warning in &report.warnings {
                eprintln!("{}", warning);
            }
            println!("Wrote {} substances to {}", report.substances, output_path);
        }
        Err(e) => {
            handle_error(e);
            process::exit(1);
        }
    }
}

fn run(builder: FeedBuilder, sheet_path: &str, output_path: &str) -> Result<FeedReport, FeedError> {
    let feed = builder.build()?;
    let output = File::create(output_path)?;
    feed.generate_file(sheet_path, output)
}

fn handle_error(error: FeedError) {
    match error {
        FeedError::Io(io_err) => {
            eprintln!("I/O Error: {}", io_err);
            eprintln!("Please check that the file exists and you have permission to access it.");
        }
        FeedError::Sheet(sheet_err) => {
            eprintln!("Spreadsheet Error: {}", sheet_err);
            eprintln!("The file may not be a valid xlsx workbook, or the sheet may be missing.");
        }
        FeedError::Utf8(utf8_err) => {
            eprintln!("UTF-8 Conversion Error: {}", utf8_err);
            eprintln!("The workbook contains invalid UTF-8 text.");
        }
        FeedError::Zip(msg) => {
            eprintln!("ZIP Archive Error: {}", msg);
            eprintln!("The file may be corrupted or not a valid ZIP archive.");
        }
        FeedError::MalformedSection { drug, block } => {
            eprintln!("Malformed TRS Section:");
            eprintln!("  Drug: {}", drug);
            eprintln!("  Block: {:?}", block);
            eprintln!("Fix the extracted TRS text file and run again.");
        }
        FeedError::Config(msg) => {
            eprintln!("Configuration Error: {}", msg);
        }
        FeedError::SecurityViolation(msg) => {
            eprintln!("Security Violation: {}", msg);
            eprintln!("The file violates security constraints (e.g., file size limit).");
        }
    }
}
