//! Cut CSV Binary
//!
//! CSVファイルをヘッダー付きのピースへ分割する。行数を渡せば
//! ピースあたりの行数で、渡さなければバイト数上限で分割する。

use std::process;

use ecddfeed::split::{CsvSplitter, SplitReport, DEFAULT_PIECE_SIZE};
use ecddfeed::FeedError;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if !(2..=3).contains(&args.len()) {
        eprintln!("Usage: {} <csv file> [<rows per file>]", args[0]);
        process::exit(1);
    }

    let fname = &args[1];
    if !fname.ends_with(".csv") {
        eprintln!("Error: input file may not be a csv: {}", fname);
        process::exit(1);
    }

    let rows_per_file = if args.len() == 3 {
        match args[2].parse::<usize>() {
            Ok(n) => Some(n),
            Err(_) => {
                eprintln!("Error: Invalid number of rows: {}", args[2]);
                process::exit(1);
            }
        }
    } else {
        None
    };

    match run(fname, rows_per_file) {
        Ok(report) => {
            for piece in &report.pieces {
                println!("Writing: {}", piece.display());
            }
            for warning in &report.warnings {
                eprintln!("{}", warning);
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn run(fname: &str, rows_per_file: Option<usize>) -> Result<SplitReport, FeedError> {
    let splitter = CsvSplitter::new(fname)?;
    match rows_per_file {
        Some(n) => splitter.by_rows(n),
        None => splitter.by_size(DEFAULT_PIECE_SIZE),
    }
}
