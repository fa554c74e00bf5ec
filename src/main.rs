use anyhow::Result;
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

use metis_backend::{init_logging, Config, GraduateReader, GraduateRow};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let config = Config::from_env()?;
    init_logging(config.log_format);

    // Optional path argument overrides METIS_GRADUATES_PATH
    let path = args
        .get(2)
        .map(PathBuf::from)
        .unwrap_or_else(|| config.graduates_path.clone());

    match args.get(1).map(String::as_str) {
        Some("inspect") => run_inspect(path)?,
        Some("rows") => run_rows(path)?,
        _ => print_usage(),
    }

    Ok(())
}

fn load(path: PathBuf) -> Result<Vec<GraduateRow>> {
    let reader = GraduateReader::new(path);
    Ok(reader.load()?)
}

fn run_inspect(path: PathBuf) -> Result<()> {
    println!("📂 Graduates source: {}", path.display());

    let rows = load(path)?;

    let employed = rows.iter().filter(|r| r.work_current).count();
    let missing_graduation = rows.iter().filter(|r| r.graduation_date.is_none()).count();

    let mut by_career: HashMap<&str, usize> = HashMap::new();
    for row in &rows {
        *by_career.entry(row.career.as_str()).or_insert(0) += 1;
    }
    let mut by_career: Vec<(&str, usize)> = by_career.into_iter().collect();
    by_career.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("✓ Rows:                     {}", rows.len());
    println!("✓ Currently employed:       {}", employed);
    println!("✓ Missing graduation date:  {}", missing_graduation);
    println!("\nRows per career:");
    for (career, count) in by_career {
        println!("  {:>5}  {}", count, career);
    }

    Ok(())
}

fn run_rows(path: PathBuf) -> Result<()> {
    let rows = load(path)?;
    println!("{}", serde_json::to_string_pretty(&rows)?);
    Ok(())
}

fn print_usage() {
    println!("Metis backend {}", metis_backend::VERSION);
    println!();
    println!("Usage:");
    println!("  metis-backend inspect [PATH]   Summarize the graduates spreadsheet");
    println!("  metis-backend rows [PATH]      Print normalized rows as JSON");
    println!();
    println!("The HTTP API is served by the metis-server binary.");
}
