use std::path::PathBuf;
use std::time::Instant;

use benone_core::{
    AnalysisRecord, CounterKind, DigitCounter, FrequencyMap, JsonFileStore, analyze,
    analyze_cached,
};
use benone_stats::{BENFORD_REFERENCE, TestResult};

pub struct AnalyzeCommandConfig<'a> {
    pub path: &'a str,
    pub hint: &'a str,
    pub column: Option<&'a str>,
    pub output_path: Option<&'a str>,
    /// `None` disables the cache.
    pub store_path: Option<PathBuf>,
}

pub fn run(cfg: AnalyzeCommandConfig<'_>) {
    let t0 = Instant::now();
    let record = match &cfg.store_path {
        Some(store_path) => {
            let mut store = JsonFileStore::open(store_path).unwrap_or_else(|e| super::fail(e));
            analyze_cached(&mut store, cfg.path, cfg.hint).unwrap_or_else(|e| super::fail(e))
        }
        None => analyze(cfg.path, cfg.hint).unwrap_or_else(|e| super::fail(e)),
    };
    let elapsed = t0.elapsed().as_secs_f64();

    print_summary(&record, elapsed);
    print_benford_table(&record);

    if let Some(column) = cfg.column {
        if let Err(e) = print_column_detail(&record, column) {
            super::fail(e);
        }
    }

    if let Some(path) = cfg.output_path {
        match write_record(&record, path) {
            Ok(()) => println!("\n📄 Analysis saved to: {path}"),
            Err(e) => super::fail(e),
        }
    }
}

/// Write `record` as pretty JSON to `path`.
fn write_record(record: &AnalysisRecord, path: &str) -> Result<(), String> {
    let json = serde_json::to_string_pretty(record)
        .map_err(|e| format!("failed to serialize analysis: {e}"))?;
    std::fs::write(path, json).map_err(|e| format!("failed to write analysis to {path}: {e}"))
}

fn print_summary(record: &AnalysisRecord, elapsed: f64) {
    let stats = record.stats();
    let ext = if stats.ext.is_empty() {
        "raw"
    } else {
        stats.ext.as_str()
    };
    println!("🔬 {} ({ext}) [{elapsed:.2}s]", stats.filename);
    println!("   id       {}", record.id());
    println!("   columns  {}", stats.header_size);
    println!(
        "   rows     {} parsed, {} omitted, {} values",
        stats.parsed_lines, stats.omitted_lines, stats.parsed_words
    );
}

fn print_benford_table(record: &AnalysisRecord) {
    println!("\n{}", "=".repeat(92));
    print!("{:<24} {:>8} {:>6} ", "Column", "p-value", "Grade");
    for digit in 1..=9 {
        print!("{digit:>6}");
    }
    println!();
    println!("{}", "-".repeat(92));

    print!("{:<24} {:>8} {:>6} ", "(Benford)", "", "");
    for pct in BENFORD_REFERENCE {
        print!("{pct:>6.1}");
    }
    println!();

    let leads = record.get_frequency_maps(CounterKind::Lead);
    for (column, p) in record.benford() {
        let grade = TestResult::grade_from_p(Some(*p));
        print!("  {:<22} {:>8.4} {:>6} ", truncate(column, 22), p, grade);
        if let Some(freq) = leads.get(column) {
            for pct in freq.leading_digits() {
                print!("{pct:>6.1}");
            }
        }
        println!();
    }
}

fn print_column_detail(
    record: &AnalysisRecord,
    column: &str,
) -> Result<(), benone_core::AnalysisError> {
    let simple = record.get_counter(CounterKind::Simple, Some(column))?;
    let lead = record.get_counter(CounterKind::Lead, Some(column))?;
    let simple_freq = record.get_frequencies(CounterKind::Simple, Some(column))?;
    let lead_freq = record.get_frequencies(CounterKind::Lead, Some(column))?;

    println!("\n📊 Column '{column}'");
    println!("{:>7} {:>12} {:>8} {:>12} {:>8}", "Digit", "All", "%", "Leading", "%");
    print_digit_rows(simple, &simple_freq, lead, &lead_freq);
    println!(
        "{:>7} {:>12} {:>8} {:>12} {:>8}",
        "total",
        simple.total(),
        "",
        lead.total(),
        ""
    );
    Ok(())
}

fn print_digit_rows(
    simple: &DigitCounter,
    simple_freq: &FrequencyMap,
    lead: &DigitCounter,
    lead_freq: &FrequencyMap,
) {
    let rows = simple
        .iter()
        .zip(simple_freq.iter())
        .zip(lead.iter().zip(lead_freq.iter()));
    for (((digit, s), (_, sf)), ((_, l), (_, lf))) in rows {
        println!("{digit:>7} {s:>12} {sf:>8.1} {l:>12} {lf:>8.1}");
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}
