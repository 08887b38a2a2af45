// Keytran Rule Table CLI
// Applies an LDML-style transform/reorder rule table to text

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use keytran_core::config::RuleFile;
use keytran_core::Transforms;

/// Apply keyboard transform and reorder rules to text
#[derive(Parser, Debug)]
#[command(name = "keytran")]
#[command(author = "keytran contributors")]
#[command(about = "Apply keyboard transform and reorder rules to text", long_about = None)]
struct Args {
    /// TOML rule file
    #[arg(short, long, value_name = "RULES")]
    rules: PathBuf,

    /// Transform this text instead of reading stdin lines
    #[arg(short, long, value_name = "TEXT")]
    text: Option<String>,

    /// Report the suffix-match path (consumed length and replacement)
    /// instead of rewriting the whole line
    #[arg(long)]
    match_tail: bool,

    /// Validate the rule file and exit
    #[arg(long)]
    check_rules: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn run_line(table: &Transforms, line: &str, match_tail: bool, out: &mut impl Write) -> io::Result<()> {
    if match_tail {
        match table.apply(line) {
            Some(applied) => writeln!(out, "{}\t{}", applied.consumed, applied.output),
            None => writeln!(out, "0\t"),
        }
    } else {
        let mut text = line.to_string();
        table.apply_in_place(&mut text);
        writeln!(out, "{}", text)
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let file = RuleFile::load(&args.rules)
        .with_context(|| format!("failed to load rules from {}", args.rules.display()))?;
    let table = file.build().context("invalid rule table")?;

    if args.check_rules {
        println!("OK: {} groups", table.len());
        return Ok(());
    }

    log::debug!("applying {} groups", table.len());

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if let Some(text) = &args.text {
        run_line(&table, text, args.match_tail, &mut out)?;
        return Ok(());
    }

    for line in io::stdin().lock().lines() {
        let line = line.context("failed to read stdin")?;
        run_line(&table, &line, args.match_tail, &mut out)?;
    }

    Ok(())
}
