use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use edkit::{
    file_search,
    file_search::FileFilters,
    highlight::{self, HighlightRuleSet, StyleSpan},
    Direction, SearchQuery, Settings,
};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a settings file (.edkit.yaml layout)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search for a pattern across files under a folder
    Search {
        /// Pattern to search for
        pattern: String,

        /// Root directory to search in
        #[arg(short = 'd', long, default_value = ".")]
        root: PathBuf,

        /// Space-separated glob list of file types, e.g. "*.pli *.inc"
        #[arg(short, long, default_value = "*")]
        filters: String,

        /// Match case exactly
        #[arg(short = 'm', long)]
        match_case: bool,

        /// Treat the pattern as a regular expression
        #[arg(short = 'r', long)]
        regex: bool,

        /// Number of threads to use
        #[arg(short = 'j', long)]
        threads: Option<NonZeroUsize>,

        /// Show only statistics, not matches
        #[arg(short, long)]
        stats: bool,
    },

    /// Replace a plain substring across files under a folder
    Replace {
        /// Text to search for (case-sensitive substring)
        search: String,

        /// Text to replace it with
        replacement: String,

        /// Root directory to replace in
        #[arg(short = 'd', long, default_value = ".")]
        root: PathBuf,

        /// Space-separated glob list of file types
        #[arg(short, long, default_value = "*")]
        filters: String,
    },

    /// Print a file with highlight rules applied
    Highlight {
        /// File to render
        file: PathBuf,

        /// YAML rules file (the built-in PL/1 rules when omitted)
        #[arg(long)]
        rules: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load_from(cli.config.as_deref())?;
    init_logging(&settings.log_level);

    match cli.command {
        Commands::Search {
            pattern,
            root,
            filters,
            match_case,
            regex,
            threads,
            stats,
        } => {
            let cli_settings = Settings {
                root_path: root,
                file_filters: filters,
                case_sensitive: match_case,
                rules_file: None,
                thread_count: threads.unwrap_or(settings.thread_count),
                log_level: settings.log_level.clone(),
            };
            let settings = settings.merge_with_cli(cli_settings);

            let query = SearchQuery::new(
                pattern,
                settings.case_sensitive,
                regex,
                Direction::Forward,
            )?;
            let filters = FileFilters::parse(&settings.file_filters)?;
            let output = file_search::search(
                &query,
                &settings.root_path,
                &filters,
                settings.thread_count,
            )?;

            if !stats {
                for hit in &output.matches {
                    println!(
                        "{}:{} - {}",
                        hit.path.display().to_string().blue(),
                        hit.line_number.to_string().green(),
                        hit.line_text
                    );
                }
            }
            if output.total_matches() == 0 {
                println!("No matches found.");
            } else {
                println!(
                    "Found {} matches in {} files",
                    output.total_matches(),
                    output.files_with_matches
                );
            }
        }
        Commands::Replace {
            search,
            replacement,
            root,
            filters,
        } => {
            let filters = FileFilters::parse(&filters)?;
            let count = file_search::replace_all(&search, &replacement, &root, &filters)?;
            if count == 0 {
                println!("No matches found.");
            } else {
                println!("Replaced in {count} file(s).");
            }
        }
        Commands::Highlight { file, rules } => {
            let rule_set = match rules.or(settings.rules_file) {
                Some(path) => highlight::load_rules_file(&path)?,
                None => highlight::pl1(),
            };
            let content = std::fs::read_to_string(&file)?;
            for line in content.lines() {
                println!("{}", render_line(line, &rule_set));
            }
        }
    }
    Ok(())
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Renders one line with its style spans as ANSI-colored text.
fn render_line(line: &str, rules: &HighlightRuleSet) -> String {
    let spans = rules.highlight(line);
    let mut out = String::new();
    let mut pos = 0;
    for span in &spans {
        out.push_str(&line[pos..span.start]);
        out.push_str(&paint(&line[span.start..span.end()], span));
        pos = span.end();
    }
    out.push_str(&line[pos..]);
    out
}

fn paint(text: &str, span: &StyleSpan) -> String {
    let mut painted = match hex_rgb(&span.style.color) {
        Some((r, g, b)) => text.truecolor(r, g, b),
        None => text.normal(),
    };
    if span.style.bold {
        painted = painted.bold();
    }
    if span.style.italic {
        painted = painted.italic();
    }
    painted.to_string()
}

fn hex_rgb(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some((r, g, b))
}
