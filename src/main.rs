use std::path::PathBuf;

use anyhow::{anyhow, Context};
use detectia_lib::api::{analyze_file, analyze_text, AppContext};
use detectia_lib::logging::init_logging;
use detectia_lib::models::{AnalysisResult, AnalyzeTextRequest, FileUpload};
use detectia_lib::services::config_store::ConfigStore;
use detectia_lib::services::detection::render_highlighted;
use detectia_lib::services::extraction::DocumentKind;

const USAGE: &str = "Usage:
  detectia <file.pdf|file.docx|file.doc|file.txt> [options]
  detectia --text \"<texte>\" [options]

Options:
  --advanced          run the extended indicator set
  --out <json_path>   write the full result as JSON
  --html <html_path>  write the text with suspicious sections highlighted
  --no-store          do not persist the detection
  --config <dir>      read config.json from this directory";

fn parse_arg_value(args: &[String], key: &str) -> Option<String> {
    args.iter()
        .position(|a| a == key)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn has_flag(args: &[String], key: &str) -> bool {
    args.iter().any(|a| a == key)
}

/// Options followed by a value; that value is never the input path.
const VALUE_OPTIONS: [&str; 4] = ["--out", "--html", "--config", "--text"];

/// First argument that is neither an option nor an option's value
fn positional_path(args: &[String]) -> Option<PathBuf> {
    let mut rest = args.iter().skip(1);
    while let Some(arg) = rest.next() {
        if VALUE_OPTIONS.contains(&arg.as_str()) {
            rest.next();
        } else if !arg.starts_with("--") {
            return Some(PathBuf::from(arg));
        }
    }
    None
}

fn preview(s: &str, max_chars: usize) -> String {
    let mut out: String = s.chars().take(max_chars).collect();
    if s.chars().count() > max_chars {
        out.push_str("...");
    }
    out.replace('\n', " ")
}

fn print_summary(result: &AnalysisResult) {
    println!("AI probability: {:.2}%", result.ai_probability);
    println!(
        "Suspected agent: {}",
        result.suspected_agent.as_deref().unwrap_or("unknown")
    );
    if let Some(ref a) = result.attribution {
        println!(
            "  triggered by {} = {:.1} (> {}), {} high indicators",
            a.indicator.label(),
            a.score,
            a.threshold,
            a.high_score_count
        );
    }
    if let Some(ref id) = result.id {
        println!("Detection id: {}", id);
    }
    println!();

    println!("Indicators: {}", result.indicators.len());
    for indicator in &result.indicators {
        println!(
            "  {:<32} {:>6.2}  (x{:.1})",
            indicator.name, indicator.score, indicator.weight
        );
    }
    println!();

    println!("Sections: {}", result.sections.len());
    for section in &result.sections {
        println!(
            "  [{:<6}] bytes=[{},{}] {}%  {}  -- {}",
            section.suspicion_level.as_str(),
            section.start_position,
            section.end_position,
            section.ai_probability,
            preview(&section.text, 80),
            section.reasoning
        );
    }
}

fn html_page(body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"fr\">\n<head><meta charset=\"utf-8\"><title>Detectia</title></head>\n<body>\n<div style=\"white-space: pre-wrap\">{}</div>\n</body>\n</html>\n",
        body
    )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 || has_flag(&args, "--help") {
        eprintln!("{}", USAGE);
        return Ok(());
    }

    init_logging();

    let store = match parse_arg_value(&args, "--config") {
        Some(dir) => ConfigStore::new(PathBuf::from(dir)),
        None => ConfigStore::with_default_dir()?,
    };
    let mut config = store.load()?;
    if has_flag(&args, "--no-store") {
        config.storage.enabled = false;
    }
    let ctx = AppContext::from_config(&config).context("invalid heuristic configuration")?;

    let analysis_type = if has_flag(&args, "--advanced") { "advanced" } else { "quick" };

    let result = if let Some(text) = parse_arg_value(&args, "--text") {
        let request = AnalyzeTextRequest {
            text: Some(text),
            analysis_type: Some(analysis_type.to_string()),
        };
        analyze_text(&ctx, request)
            .await
            .map_err(|e| anyhow!(e.to_response().error))?
    } else {
        let path = positional_path(&args).ok_or_else(|| anyhow!("no input file given\n\n{}", USAGE))?;
        let kind = DocumentKind::from_path(&path)
            .ok_or_else(|| anyhow!("unsupported file extension: {}", path.display()))?;
        let bytes = std::fs::read(&path).with_context(|| format!("read {} failed", path.display()))?;
        let file_name = path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "document".to_string());

        let upload = FileUpload {
            file_name,
            mime_type: kind.mime_type().to_string(),
            bytes,
            analysis_type: Some(analysis_type.to_string()),
        };
        let response = analyze_file(&ctx, upload)
            .await
            .map_err(|e| anyhow!(e.to_response().error))?;

        println!("File: {}", path.display());
        println!(
            "Extracted: {} chars ({} bytes on disk)",
            response.extracted_text_length, response.file_size
        );
        response.result
    };

    print_summary(&result);

    if let Some(out_path) = parse_arg_value(&args, "--out") {
        let json = serde_json::to_string_pretty(&result)?;
        std::fs::write(&out_path, json).with_context(|| format!("write {} failed", out_path))?;
        println!();
        println!("Wrote JSON: {}", out_path);
    }

    if let Some(html_path) = parse_arg_value(&args, "--html") {
        let body = render_highlighted(&result.original_text, &result.sections);
        std::fs::write(&html_path, html_page(&body)).with_context(|| format!("write {} failed", html_path))?;
        println!("Wrote HTML: {}", html_path);
    }

    Ok(())
}
