use std::env;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use soundproof_core::config::Config;
use soundproof_core::corpus::load_corpus;
use soundproof_core::Match;
use soundproof_text::CorpusIndex;
use tracing_subscriber::EnvFilter;

// Search the remediation catalog with a diagnosis text.
// Usage:
//   soundproof-search "bruit de circulation, simple vitrage" [--corpus data/solutions.json] [--limit 5] [--json]
//   soundproof-search -- "-bruit"  (`--` ends flags)
//   soundproof-search            (interactive; an empty line quits)

const USAGE: &str = "Usage: soundproof-search [--corpus PATH] [--limit N] [--json] [--] [QUERY]";

#[derive(Debug, Default, PartialEq)]
struct Args {
    query: Option<String>,
    corpus: Option<PathBuf>,
    limit: Option<usize>,
    json: bool,
    help: bool,
}

fn parse_args(args: &[String]) -> Result<Args, String> {
    let mut parsed = Args::default();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--corpus" => {
                let value = args.get(i + 1).ok_or("--corpus requires a path")?;
                parsed.corpus = Some(PathBuf::from(value));
                i += 2;
            }
            "--limit" => {
                let value = args.get(i + 1).ok_or("--limit requires a number")?;
                let limit: usize = value.parse().map_err(|_| format!("--limit expects a number, got '{value}'"))?;
                if limit == 0 { return Err("--limit must be at least 1".to_string()); }
                parsed.limit = Some(limit);
                i += 2;
            }
            "--json" => { parsed.json = true; i += 1; }
            "-h" | "--help" => { parsed.help = true; i += 1; }
            // everything after `--` is the query, even when it starts with '-'
            "--" => {
                for s in &args[i + 1..] { set_query(&mut parsed, s)?; }
                break;
            }
            s if s.starts_with('-') && s.len() > 1 => return Err(format!("Unknown flag: {s}")),
            s => { set_query(&mut parsed, s)?; i += 1; }
        }
    }
    Ok(parsed)
}

fn set_query(parsed: &mut Args, s: &str) -> Result<(), String> {
    if parsed.query.is_some() { return Err(format!("Unexpected argument: {s}")); }
    parsed.query = Some(s.to_string());
    Ok(())
}

/// First `max_chars` characters of `text`, with an ellipsis when cut.
fn snippet(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}…", &text[..cut]),
        None => text.to_string(),
    }
}

struct Printer<'a> {
    json: bool,
    snippet_chars: usize,
    text_field: &'a str,
}

impl Printer<'_> {
    fn print(&self, out: &mut impl Write, query: &str, matches: &[Match<'_>]) -> anyhow::Result<()> {
        if self.json {
            let rows: Vec<serde_json::Value> = matches
                .iter()
                .map(|m| serde_json::json!({ "id": m.id(), "score": m.score, "document": &m.document.fields }))
                .collect();
            writeln!(out, "{}", serde_json::to_string_pretty(&rows)?)?;
            return Ok(());
        }
        writeln!(out, "\nTop {} results for: {:?}\n", matches.len(), query)?;
        for (rank, m) in matches.iter().enumerate() {
            let text = m.document.text(self.text_field).unwrap_or_default();
            writeln!(out, "{:>2}. id={} | score={:.4}", rank + 1, m.id(), m.score)?;
            writeln!(out, "    {}\n", snippet(text, self.snippet_chars))?;
        }
        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let raw: Vec<String> = env::args().skip(1).collect();
    let args = match parse_args(&raw) {
        Ok(args) => args,
        Err(msg) => { eprintln!("{msg}\n{USAGE}"); std::process::exit(2); }
    };
    if args.help { println!("{USAGE}"); return Ok(()); }

    let config = Config::load()?;
    let settings = config.settings()?;
    let (default_path, base_dir) = settings.corpus.resolved_paths();
    let corpus_path = args.corpus.unwrap_or(default_path);
    let mapping = settings.corpus.mapping();

    let documents = load_corpus(&corpus_path, &base_dir, &mapping)?;
    let index = CorpusIndex::build(documents, &mapping.text_field)?;
    tracing::info!(env = config.env_name(), documents = index.len(), terms = index.vocabulary().len(), "index ready");

    let top_k = args.limit.unwrap_or(settings.search.top_k);
    let printer = Printer { json: args.json, snippet_chars: settings.search.snippet_chars, text_field: index.text_field() };
    let stdout = io::stdout();

    if let Some(query) = args.query {
        let matches = index.search(&query, top_k);
        return printer.print(&mut stdout.lock(), &query, &matches);
    }

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("\nEnter your search query (or empty to quit): ");
        io::stdout().flush()?;
        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 { break; }
        let query = line.trim();
        if query.is_empty() { break; }
        let matches = index.search(query, top_k);
        printer.print(&mut stdout.lock(), query, &matches)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use soundproof_core::Document;

    fn argv(items: &[&str]) -> Vec<String> { items.iter().map(|s| s.to_string()).collect() }

    #[test]
    fn parses_query_and_flags() {
        let args = parse_args(&argv(&["bruit voisin", "--limit", "3", "--json", "--corpus", "c.json"])).unwrap();
        assert_eq!(args.query.as_deref(), Some("bruit voisin"));
        assert_eq!(args.limit, Some(3));
        assert!(args.json);
        assert_eq!(args.corpus, Some(PathBuf::from("c.json")));
    }

    #[test]
    fn double_dash_allows_query_starting_with_dash() {
        let args = parse_args(&argv(&["--limit", "2", "--", "-bruit voisin"])).unwrap();
        assert_eq!(args.query.as_deref(), Some("-bruit voisin"));
        assert_eq!(args.limit, Some(2));

        let args = parse_args(&argv(&["--", "--json"])).unwrap();
        assert_eq!(args.query.as_deref(), Some("--json"));
        assert!(!args.json);

        assert!(parse_args(&argv(&["-bruit"])).is_err());
        assert!(parse_args(&argv(&["fenêtre", "--", "-bruit"])).is_err());
    }

    #[test]
    fn rejects_bad_flags() {
        assert!(parse_args(&argv(&["--limit"])).is_err());
        assert!(parse_args(&argv(&["--limit", "abc"])).is_err());
        assert!(parse_args(&argv(&["--limit", "0"])).is_err());
        assert!(parse_args(&argv(&["--verbose"])).is_err());
        assert!(parse_args(&argv(&["one", "two"])).is_err());
    }

    #[test]
    fn snippet_counts_chars_not_bytes() {
        assert_eq!(snippet("fenêtre", 7), "fenêtre");
        assert_eq!(snippet("fenêtre simple", 7), "fenêtre…");
        assert_eq!(snippet("", 3), "");
    }

    #[test]
    fn prints_text_and_json() {
        let index = CorpusIndex::build(
            vec![Document::with_text("fen", "faiblesses", "fenêtre simple vitrage bruit"), Document::with_text("mur", "faiblesses", "mur mince")],
            "faiblesses",
        )
        .unwrap();
        let matches = index.search("bruit fenêtre", 5);

        let mut out = Vec::new();
        Printer { json: false, snippet_chars: 10, text_field: "faiblesses" }.print(&mut out, "bruit fenêtre", &matches).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Top 1 results for: \"bruit fenêtre\""));
        assert!(text.contains(" 1. id=fen | score="));
        assert!(text.contains("fenêtre si…"));

        let mut out = Vec::new();
        Printer { json: true, snippet_chars: 10, text_field: "faiblesses" }.print(&mut out, "bruit fenêtre", &matches).unwrap();
        let rows: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(rows[0]["id"], "fen");
        assert_eq!(rows[0]["document"]["faiblesses"], "fenêtre simple vitrage bruit");
    }
}
