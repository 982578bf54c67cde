//! TRS Outline Binary
//!
//! 整形済みTRSテキストを解析し、カテゴリ・薬物・セクションの
//! アウトラインを色分けして表示する。複数ファイルを渡すと並列に
//! 解析し、行頭にファイル名の列を付けて揃える。

use std::process;

use rayon::prelude::*;

use ecddfeed::console::{pad, paint, width, Color};
use ecddfeed::trs::parse_report;
use ecddfeed::{FeedError, OrderedMap, TrsReport};

fn main() {
    let args: Vec<String> = std::env::args().collect();

    let mut files: Vec<String> = Vec::new();
    let mut json = false;
    let mut contents = false;

    for arg in &args[1..] {
        match arg.as_str() {
            "--json" => json = true,
            "--contents" => contents = true,
            _ if arg.starts_with("--") => {
                eprintln!("Error: Unknown option: {}", arg);
                process::exit(1);
            }
            _ => files.push(arg.clone()),
        }
    }

    if files.is_empty() {
        eprintln!("Usage: {} <trs.txt>... [options]", args[0]);
        eprintln!("\nOptions:");
        eprintln!("  --json      Dump the parsed structure as JSON instead of an outline");
        eprintln!("  --contents  Print section contents under each section name");
        eprintln!("\nExamples:");
        eprintln!("  {} extracted_from_trs/942.txt", args[0]);
        eprintln!("  {} extracted_from_trs/*.txt --json", args[0]);
        process::exit(1);
    }

    if let Err(e) = run(&files, json, contents) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(files: &[String], json: bool, contents: bool) -> Result<(), FeedError> {
    // 1. ファイルごとに並列で解析
    let parsed: Result<Vec<(usize, TrsReport)>, FeedError> = files
        .par_iter()
        .enumerate()
        .map(|(index, path)| {
            let text = std::fs::read_to_string(path)?;
            Ok((index, parse_report(&text)?))
        })
        .collect();

    // 2. 結果を入力順に戻す
    let mut parsed = parsed?;
    parsed.sort_by_key(|(index, _)| *index);
    let reports: Vec<TrsReport> = parsed.into_iter().map(|(_, report)| report).collect();

    // 3. 出力
    if json {
        print_json(files, &reports)?;
    } else {
        print_outline(files, &reports, contents);
    }

    Ok(())
}

fn print_json(files: &[String], reports: &[TrsReport]) -> Result<(), FeedError> {
    let dump = if reports.len() == 1 {
        serde_json::to_string_pretty(&reports[0])
    } else {
        // 複数ファイルはパスをキーにした1つのオブジェクトにまとめる
        let mut all: OrderedMap<&TrsReport> = OrderedMap::new();
        for (path, report) in files.iter().zip(reports) {
            all.insert(path.clone(), report);
        }
        serde_json::to_string_pretty(&all)
    };

    let dump = dump.map_err(|e| FeedError::Io(std::io::Error::other(e)))?;
    println!("{}", dump);
    Ok(())
}

fn print_outline(files: &[String], reports: &[TrsReport], contents: bool) {
    // 複数ファイルのときだけ行頭にファイル名の列を付ける
    let label_width = if files.len() > 1 {
        files.iter().map(|path| width(path)).max().unwrap_or(0) + 2
    } else {
        0
    };

    for (path, report) in files.iter().zip(reports) {
        let label = if label_width > 0 {
            pad(path, label_width)
        } else {
            String::new()
        };

        for (category, drugs) in report.iter() {
            println!("{}{}", label, paint(Color::Yellow, category));

            for (drug, sections) in drugs.iter() {
                println!("{}{}", label, paint(Color::Green, drug));

                for (section, content) in sections.iter() {
                    println!("{}{}", label, paint(Color::Magenta, section));
                    if contents {
                        println!("{}", content);
                    }
                }
            }
        }
    }
}
