//! CLI entry point for `tm`.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use humansize::{format_size, BINARY};
use indicatif::{ProgressBar, ProgressStyle};

use thunder_muscle::config::{self, Config};
use thunder_muscle::export::{self, OutputFormat, WriteOptions};
use thunder_muscle::filter::FilterSpec;
use thunder_muscle::model::record::EmailRecord;
use thunder_muscle::search::{ContentQuery, DEFAULT_PATTERN};
use thunder_muscle::stats::domains::{self, DatasetStats};
use thunder_muscle::stats::keywords::{self, KeywordSet};
use thunder_muscle::stats::temporal::{self, BucketRow, Grouping};
use thunder_muscle::store::gloda;

#[derive(Parser)]
#[command(
    name = "tm",
    version,
    about = "Extract a Thunderbird mail archive into a dataset, then filter, query and aggregate it"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file
    #[arg(long, global = true, env = "TM_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract every message from a Thunderbird profile into a dataset
    Extract {
        /// Profile directory or Gloda database file
        #[arg(short, long)]
        profile: Option<PathBuf>,
        /// Dataset to write
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(short, long)]
        format: Option<OutputFormat>,
        /// Skip the exclusion rules from the configuration
        #[arg(long)]
        no_filters: bool,
    },
    /// Select records by domain, date, subject and more
    Filter {
        input: PathBuf,
        output: PathBuf,
        /// Sender domain: `*.suffix`, a regex, or a literal
        #[arg(long)]
        domain: Option<String>,
        /// Year substring of the date
        #[arg(long)]
        year: Option<String>,
        #[arg(long)]
        subject_contains: Option<String>,
        #[arg(long)]
        to_contains: Option<String>,
        #[arg(long)]
        folder_contains: Option<String>,
        /// Keep dates >= this value
        #[arg(long, value_name = "DATE")]
        after: Option<String>,
        /// Keep dates <= this value
        #[arg(long, value_name = "DATE")]
        before: Option<String>,
        /// Only records with a body
        #[arg(long)]
        has_body: bool,
        /// Keep at most N records (0 = no limit)
        #[arg(long)]
        limit: Option<usize>,
        #[arg(short, long)]
        format: Option<OutputFormat>,
    },
    /// Write the records whose subject or body matches a pattern
    Query {
        input: PathBuf,
        output: PathBuf,
        #[arg(short, long, default_value = DEFAULT_PATTERN)]
        pattern: String,
        #[arg(long)]
        case_sensitive: bool,
        #[arg(short, long)]
        format: Option<OutputFormat>,
    },
    /// Report how often a pattern occurs in subjects and bodies
    Analyze {
        input: PathBuf,
        #[arg(short, long, default_value = DEFAULT_PATTERN)]
        pattern: String,
        #[arg(long)]
        case_sensitive: bool,
    },
    /// Show dataset statistics
    Stats {
        input: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Group records by time period or sender domain
    Temporal {
        input: PathBuf,
        #[arg(long, value_enum, default_value_t = GroupBy::Summary)]
        by: GroupBy,
        /// Restrict month buckets to one year
        #[arg(long)]
        year: Option<i32>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(short, long)]
        format: Option<OutputFormat>,
    },
    /// Measure survey and marketing keywords over time
    Spam {
        input: PathBuf,
        /// JSON object of extra or replacement keyword patterns
        #[arg(short, long, value_name = "FILE")]
        keywords: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(short, long)]
        format: Option<OutputFormat>,
    },
    /// Find the domains covering most pattern matches and compare them with a domain filter
    Domains {
        input: PathBuf,
        /// Domain pattern selecting the comparison set
        compare: String,
        #[arg(short, long, default_value = DEFAULT_PATTERN)]
        pattern: String,
        #[arg(long)]
        case_sensitive: bool,
        /// Cumulative share of matches to cover (0-1]
        #[arg(long, default_value_t = 0.95)]
        threshold: f64,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(short, long)]
        format: Option<OutputFormat>,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate a man page
    Manpage,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum GroupBy {
    Year,
    Month,
    Weekday,
    Hour,
    Domain,
    Summary,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match cli.config {
        Some(ref path) => config::load_config_from(path),
        None => config::load_config(),
    };

    // Configure logging: stderr + optional log file
    let log_level = match cli.verbose {
        0 => None,
        1 => Some("info"),
        2 => Some("debug"),
        _ => Some("trace"),
    };
    setup_logging(log_level, &config);

    match cli.command {
        Commands::Extract {
            profile,
            output,
            format,
            no_filters,
        } => cmd_extract(&config, profile, output, format, no_filters),
        Commands::Filter {
            input,
            output,
            domain,
            year,
            subject_contains,
            to_contains,
            folder_contains,
            after,
            before,
            has_body,
            limit,
            format,
        } => {
            let spec = FilterSpec::new()
                .domain(domain)
                .year(year)
                .subject_contains(subject_contains)
                .to_contains(to_contains)
                .folder_contains(folder_contains)
                .date_after(after)
                .date_before(before)
                .has_body(has_body)
                .limit(limit);
            cmd_filter(&config, &input, &output, &spec, format)
        }
        Commands::Query {
            input,
            output,
            pattern,
            case_sensitive,
            format,
        } => cmd_query(&config, &input, &output, &pattern, case_sensitive, format),
        Commands::Analyze {
            input,
            pattern,
            case_sensitive,
        } => cmd_analyze(&input, &pattern, case_sensitive),
        Commands::Stats { input, json } => cmd_stats(&input, json),
        Commands::Temporal {
            input,
            by,
            year,
            output,
            format,
        } => cmd_temporal(&config, &input, by, year, output.as_deref(), format),
        Commands::Spam {
            input,
            keywords,
            output,
            format,
        } => cmd_spam(&config, &input, keywords.as_deref(), output.as_deref(), format),
        Commands::Domains {
            input,
            compare,
            pattern,
            case_sensitive,
            threshold,
            output,
            format,
        } => cmd_domains(
            &config,
            &input,
            &compare,
            &pattern,
            case_sensitive,
            threshold,
            output.as_deref(),
            format,
        ),
        Commands::Completions { shell } => cmd_completions(shell),
        Commands::Manpage => cmd_manpage(),
    }
}

/// Set up tracing with stderr output and optional file logging.
///
/// An explicit `-v` level wins over `RUST_LOG`, which wins over the config.
fn setup_logging(verbose_level: Option<&str>, config: &Config) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = match verbose_level {
        Some(level) => tracing_subscriber::EnvFilter::new(level),
        None => tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.general.log_level)),
    };

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    // Try to set up file logging
    let log_dir = config::cache_dir(config);
    if std::fs::create_dir_all(&log_dir).is_ok() {
        let file_appender = tracing_appender::rolling::never(&log_dir, "tm.log");
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(file_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        // Fall back to stderr only
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
    }
}

/// Generate shell completions and print to stdout.
fn cmd_completions(shell: clap_complete::Shell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "tm", &mut std::io::stdout());
    Ok(())
}

/// Generate a man page and print to stdout.
fn cmd_manpage() -> anyhow::Result<()> {
    let cmd = Cli::command();
    let man = clap_mangen::Man::new(cmd);
    let mut buf = Vec::new();
    man.render(&mut buf)?;
    std::io::Write::write_all(&mut std::io::stdout(), &buf)?;
    Ok(())
}

/// Writer options for `path`, honoring `--format`, then the extension, then the config.
fn write_options(config: &Config, path: &Path, explicit: Option<OutputFormat>) -> WriteOptions {
    WriteOptions {
        format: OutputFormat::resolve(explicit, path, config.defaults.output_format),
        csv_separator: config.export.csv_separator,
    }
}

fn ensure_parent_dir(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

fn load_input(path: &Path) -> anyhow::Result<Vec<EmailRecord>> {
    if !path.exists() {
        anyhow::bail!("Dataset not found: {}", path.display());
    }
    Ok(export::read_dataset(path)?)
}

fn written_size(path: &Path) -> String {
    std::fs::metadata(path)
        .map(|m| format_size(m.len(), BINARY))
        .unwrap_or_else(|_| "-".to_string())
}

/// Extract the Gloda store into a dataset file.
fn cmd_extract(
    config: &Config,
    profile: Option<PathBuf>,
    output: Option<PathBuf>,
    format: Option<OutputFormat>,
    no_filters: bool,
) -> anyhow::Result<()> {
    let Some(profile) = profile.or_else(|| config.store.profile.clone()) else {
        anyhow::bail!("No profile given: pass --profile or set [store] profile in the config");
    };
    let output = output.unwrap_or_else(|| config.defaults.complete_dataset.clone());

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} Reading messages {pos} ({elapsed})")
            .expect("valid template"),
    );
    pb.enable_steady_tick(Duration::from_millis(100));

    let start = Instant::now();
    let extracted = gloda::extract_dataset(
        &profile,
        Some(&|read| {
            pb.set_position(read as u64);
        }),
    );
    pb.finish_and_clear();
    let mut records = extracted?;
    let elapsed = start.elapsed();

    let mut excluded = 0usize;
    if !no_filters && !config.filters.is_empty() {
        let before = records.len();
        records = config.filters.retain(&records);
        excluded = before - records.len();
    }

    ensure_parent_dir(&output)?;
    let opts = write_options(config, &output, format);
    export::write_dataset(&records, &output, opts)?;

    let summary = gloda::ExtractSummary::of(&records);
    println!();
    println!("  {:<20} {}", "Store", profile.display());
    println!("  {:<20} {}", "Emails", summary.total);
    println!(
        "  {:<20} {} ({:.1}%)",
        "With body",
        summary.with_body,
        thunder_muscle::stats::percentage(summary.with_body, summary.total)
    );
    if excluded > 0 {
        println!("  {:<20} {}", "Excluded", excluded);
    }
    println!("  {:<20} {:.2?}", "Extraction time", elapsed);
    println!("  {:<20} {} ({})", "Output", output.display(), opts.format);
    println!("  {:<20} {}", "Output size", written_size(&output));
    println!();

    Ok(())
}

/// Apply a filter spec to a dataset.
fn cmd_filter(
    config: &Config,
    input: &Path,
    output: &Path,
    spec: &FilterSpec,
    format: Option<OutputFormat>,
) -> anyhow::Result<()> {
    let records = load_input(input)?;
    let selected = spec.apply(&records);

    ensure_parent_dir(output)?;
    export::write_dataset(&selected, output, write_options(config, output, format))?;

    println!(
        "  Filtered {} of {} email(s) to {}",
        selected.len(),
        records.len(),
        output.display()
    );
    Ok(())
}

/// Write the records matching a content pattern.
fn cmd_query(
    config: &Config,
    input: &Path,
    output: &Path,
    pattern: &str,
    case_sensitive: bool,
    format: Option<OutputFormat>,
) -> anyhow::Result<()> {
    let query = ContentQuery::new(pattern, case_sensitive)?;
    let records = load_input(input)?;
    let selected = query.select(&records);

    ensure_parent_dir(output)?;
    export::write_dataset(&selected, output, write_options(config, output, format))?;

    println!(
        "  {} of {} email(s) match '{}', written to {}",
        selected.len(),
        records.len(),
        query.pattern(),
        output.display()
    );
    Ok(())
}

/// Print subject/body hit rates for a pattern.
fn cmd_analyze(input: &Path, pattern: &str, case_sensitive: bool) -> anyhow::Result<()> {
    let query = ContentQuery::new(pattern, case_sensitive)?;
    let records = load_input(input)?;
    let report = query.report(&records);

    println!();
    println!("  {:<20} '{}'", "Pattern", report.pattern);
    println!("  {:<20} {}", "Emails", report.total);
    println!("  {:<20} {}", "With body", report.with_body);
    println!(
        "  {:<20} {} ({:.1}%)",
        "Subject matches",
        report.subject_matches,
        report.subject_percentage()
    );
    println!(
        "  {:<20} {} ({:.1}% of emails with body)",
        "Body matches",
        report.body_matches,
        report.body_percentage()
    );
    println!();
    Ok(())
}

/// Show dataset statistics.
fn cmd_stats(input: &Path, json: bool) -> anyhow::Result<()> {
    let records = load_input(input)?;
    let stats = domains::dataset_stats(&records);

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        print_stats_table(input, &stats);
    }
    Ok(())
}

/// Print statistics in a human-readable table.
fn print_stats_table(path: &Path, stats: &DatasetStats) {
    println!();
    println!("  {:<20} {}", "Dataset", path.display());
    println!("  {:<20} {}", "Emails", stats.total);
    println!(
        "  {:<20} {} ({:.1}%)",
        "With body",
        stats.with_body,
        thunder_muscle::stats::percentage(stats.with_body, stats.total)
    );
    println!("  {:<20} {}", "Unique domains", stats.unique_domains);
    if let Some(ref range) = stats.date_range {
        println!("  {:<20} {} to {}", "Date range", range.oldest, range.newest);
    }

    if !stats.top_domains.is_empty() {
        println!();
        println!("  Top domains:");
        for d in &stats.top_domains {
            println!("    {:>6}  {}", d.count, d.domain);
        }
    }
    println!();
}

/// Group a dataset by period or domain.
fn cmd_temporal(
    config: &Config,
    input: &Path,
    by: GroupBy,
    year: Option<i32>,
    output: Option<&Path>,
    format: Option<OutputFormat>,
) -> anyhow::Result<()> {
    let records = load_input(input)?;

    let grouping = match by {
        GroupBy::Year => Grouping::Year,
        GroupBy::Month => Grouping::Month { year },
        GroupBy::Weekday => Grouping::Weekday,
        GroupBy::Hour => Grouping::Hour,
        GroupBy::Domain => Grouping::Domain,
        GroupBy::Summary => {
            let summary = temporal::summarize(&records);
            println!();
            println!("  {:<20} {}", "Emails", summary.total_emails);
            println!("  {:<20} {}", "With body", summary.emails_with_body);
            if let Some(ref range) = summary.date_range {
                println!("  {:<20} {} to {}", "Date range", range.start, range.end);
            }
            println!();
            println!("  Busiest years:");
            print_bucket_rows(&summary.busiest_years(5).into_iter().cloned().collect::<Vec<_>>());
            println!();
            println!("  By weekday:");
            print_bucket_rows(&summary.by_weekday);
            println!();

            if let Some(path) = output {
                ensure_parent_dir(path)?;
                let opts = write_options(config, path, format);
                export::write_document(&summary, path, opts.format)?;
                println!("  Written to {}", path.display());
            }
            return Ok(());
        }
    };

    let rows = temporal::group_rows(&records, grouping);
    println!();
    print_bucket_rows(&rows);
    println!();

    if let Some(path) = output {
        ensure_parent_dir(path)?;
        export::write_rows(&rows, path, write_options(config, path, format))?;
        println!("  Written to {}", path.display());
    }
    Ok(())
}

fn print_bucket_rows(rows: &[BucketRow]) {
    println!(
        "    {:<20} {:>8} {:>10} {:>8}",
        "Bucket", "Emails", "With body", "Body %"
    );
    for row in rows {
        println!(
            "    {:<20} {:>8} {:>10} {:>7.1}%",
            row.bucket, row.total_emails, row.emails_with_body, row.body_percentage
        );
    }
}

/// Keyword (survey/marketing) analysis.
fn cmd_spam(
    config: &Config,
    input: &Path,
    keywords_file: Option<&Path>,
    output: Option<&Path>,
    format: Option<OutputFormat>,
) -> anyhow::Result<()> {
    let mut set = KeywordSet::defaults()?;
    if let Some(path) = keywords_file {
        set.merge_file(path)?;
    }

    let records = load_input(input)?;
    let report = keywords::analyze(&records, &set);
    let summary = &report.summary;

    println!();
    println!("  {:<20} {}", "Emails analyzed", summary.total_emails_analyzed);
    println!(
        "  {:<20} {} ({:.1}%)",
        "Keyword matches", summary.total_spam_emails, summary.overall_spam_percentage
    );
    println!("  {:<20} {}", "Patterns", set.len());

    let top = report.top_spam_years(5, 10);
    if !top.is_empty() {
        println!();
        println!("  Top years by keyword share:");
        for (year, bucket) in top {
            println!(
                "    {year}  {:>5.1}%  ({} of {})",
                bucket.spam_percentage, bucket.spam_emails, bucket.total_emails
            );
        }
    }
    println!();

    if let Some(path) = output {
        ensure_parent_dir(path)?;
        let opts = write_options(config, path, format);
        export::write_document(&report, path, opts.format)?;
        println!("  Written to {}", path.display());
    }
    Ok(())
}

/// Domain coverage of pattern matches versus a domain-filtered subset.
#[allow(clippy::too_many_arguments)]
fn cmd_domains(
    config: &Config,
    input: &Path,
    compare: &str,
    pattern: &str,
    case_sensitive: bool,
    threshold: f64,
    output: Option<&Path>,
    format: Option<OutputFormat>,
) -> anyhow::Result<()> {
    if !(threshold > 0.0 && threshold <= 1.0) {
        anyhow::bail!("Threshold must be in (0, 1], got {threshold}");
    }

    let query = ContentQuery::new(pattern, case_sensitive)?;
    let records = load_input(input)?;
    let matches = query.select(&records);
    let comparison = FilterSpec::new()
        .domain(Some(compare.to_string()))
        .apply(&records);
    let result = domains::compare_domains(&matches, &comparison, threshold);
    let coverage = &result.pattern_analysis;

    println!();
    println!("  {:<20} '{}' ({} email(s))", "Pattern", query.pattern(), coverage.total_emails);
    println!(
        "  {:<20} {} domain(s) cover {:.1}%",
        "Coverage",
        coverage.top_domains.len(),
        coverage.actual_coverage * 100.0
    );
    for share in &coverage.top_domains {
        println!(
            "    {:>6}  {:>5.1}%  {}",
            share.count, share.percentage, share.domain
        );
    }
    println!();
    println!(
        "  {:<20} '{}' ({} email(s), {} domain(s))",
        "Comparison",
        compare,
        result.comparison_total,
        result.comparison_domains.len()
    );
    println!("  {:<20} {}", "Overlap", result.overlap.join(", "));
    println!();

    if let Some(path) = output {
        ensure_parent_dir(path)?;
        let opts = write_options(config, path, format);
        if opts.format == OutputFormat::Csv {
            export::write_rows(&coverage.top_domains, path, opts)?;
        } else {
            export::write_document(&result, path, opts.format)?;
        }
        println!("  Written to {}", path.display());
    }
    Ok(())
}
