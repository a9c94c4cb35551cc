use std::path::Path;
use std::sync::Arc;

use detectia_lib::services::detection::section_scorer::{classify, locate};
use detectia_lib::services::detection::{HeuristicConfig, SectionScorer};
use detectia_lib::services::extraction::{extract_text, DocumentKind};
use detectia_lib::services::text_processor::{normalize_punctuation, split_sentences, word_count};
use serde::Serialize;

fn preview(s: &str, max_chars: usize) -> String {
    let mut out: String = s.chars().take(max_chars).collect();
    if s.chars().count() > max_chars {
        out.push_str("...");
    }
    out.replace('\n', " ")
}

fn parse_arg_value(args: &[String], key: &str) -> Option<String> {
    args.iter()
        .position(|a| a == key)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn positional_arg(args: &[String]) -> Option<String> {
    let mut rest = args.iter().skip(1);
    while let Some(arg) = rest.next() {
        if arg == "--sentences" || arg == "--out" {
            rest.next();
        } else if !arg.starts_with("--") {
            return Some(arg.clone());
        }
    }
    None
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SentenceRow {
    index: usize,
    text: String,
    start: Option<usize>,
    end: Option<usize>,
    words: usize,
    score: u32,
    reasons: Vec<String>,
    level: String,
    retained: bool,
}

fn main() -> Result<(), String> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!(
            "Usage:\n  inspect_sections <path.pdf|.docx|.doc|.txt> [--sentences <n>] [--out <json_path>]\n\nPrints every sentence with its located byte offsets, local score and whether it becomes a section."
        );
        return Ok(());
    }

    let path = positional_arg(&args).ok_or_else(|| "no input file given".to_string())?;
    let kind = DocumentKind::from_path(Path::new(&path))
        .ok_or_else(|| format!("unsupported file extension: {}", path))?;
    let sentences_n: usize = parse_arg_value(&args, "--sentences")
        .and_then(|s| s.parse().ok())
        .unwrap_or(50);
    let out_path = parse_arg_value(&args, "--out");

    let bytes = std::fs::read(&path).map_err(|e| format!("read file failed: {}", e))?;
    let extracted = extract_text(kind.mime_type(), &bytes).map_err(|e| e.to_string())?;
    let text = normalize_punctuation(&extracted);

    let config = Arc::new(HeuristicConfig::default());
    let scorer = SectionScorer::new(config.clone());
    let rules = &config.sections;

    let mut rows = Vec::new();
    let mut cursor = 0usize;
    for (index, sentence) in split_sentences(&text).iter().enumerate() {
        let trimmed = sentence.trim();
        let start = locate(&text, trimmed, cursor);
        if let Some(s) = start {
            cursor = s + trimmed.len();
        }
        let scored = scorer.score_sentence(trimmed);
        rows.push(SentenceRow {
            index,
            text: trimmed.to_string(),
            start,
            end: start.map(|s| s + trimmed.len()),
            words: word_count(trimmed),
            score: scored.score,
            level: classify(scored.score, rules).as_str().to_string(),
            retained: start.is_some() && scored.score > rules.retain_above,
            reasons: scored.reasons,
        });
    }

    let scan = scorer.scan(&text);

    println!("File: {}", path);
    println!("Extracted: {} chars ({} bytes)", text.chars().count(), text.len());
    println!(
        "Sentences: {}  sections: {}  misses: {}",
        rows.len(),
        scan.sections.len(),
        scan.misses.len()
    );
    println!();

    for row in rows.iter().take(sentences_n) {
        let offsets = match (row.start, row.end) {
            (Some(s), Some(e)) => format!("[{},{}]", s, e),
            _ => "[miss]".to_string(),
        };
        println!(
            "[S{:04}] bytes={} words={} score={} {}{}  {}",
            row.index,
            offsets,
            row.words,
            row.score,
            row.level,
            if row.retained { " *" } else { "" },
            preview(&row.text, 100)
        );
    }
    if rows.len() > sentences_n {
        println!("... ({} more sentences)", rows.len() - sentences_n);
    }

    if let Some(out_path) = out_path {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Output {
            file: String,
            extracted_chars: usize,
            extracted_bytes: usize,
            sentences: Vec<SentenceRow>,
            sections: Vec<detectia_lib::models::Section>,
        }

        let out = Output {
            file: path.clone(),
            extracted_chars: text.chars().count(),
            extracted_bytes: text.len(),
            sentences: rows,
            sections: scan.sections,
        };

        let json = serde_json::to_string_pretty(&out).map_err(|e| e.to_string())?;
        std::fs::write(&out_path, json).map_err(|e| format!("write out failed: {}", e))?;
        println!();
        println!("Wrote JSON: {}", out_path);
    }

    Ok(())
}
