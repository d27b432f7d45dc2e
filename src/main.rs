//! logsentry entrypoint: generate sample logs or analyze a log file, print the
//! summary, optionally export scored rows and stream flagged events as ndjson.

use clap::{Parser, Subcommand};
use logsentry::{
    config::AppConfig,
    events::{self, sample::SampleSpec, EventFormat},
    logging::{AnomalyLine, StructuredLogger},
    report::{self, AnalysisResult},
    Analyzer,
};
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "logsentry", about = "Flag anomalous requests in structured logs", version)]
struct Cli {
    /// Config file (defaults to $LOGSENTRY_CONFIG_PATH, ./config.json, then the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a synthetic log file (csv, json or ndjson by extension)
    Generate {
        #[arg(long, default_value = "logs.csv")]
        output: PathBuf,
        #[arg(long, default_value_t = 1000)]
        count: usize,
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Share of rows drawn from the slow/failing profile
        #[arg(long, default_value_t = 0.1)]
        anomaly_fraction: f64,
    },
    /// Analyze a log file and print summary statistics
    Analyze {
        #[arg(long)]
        input: PathBuf,
        /// Export scored rows (.csv) or the full result (.json)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Print one JSON line per anomalous event to stdout
        #[arg(long)]
        emit_anomalies: bool,
    },
}

fn print_summary(result: &AnalysisResult, out: &mut impl Write) -> std::io::Result<()> {
    writeln!(out, "Total logs:         {}", result.total)?;
    writeln!(out, "Normal logs:        {}", result.normal_count)?;
    writeln!(out, "Anomalies detected: {}", result.anomalous_count)?;
    writeln!(out, "Anomaly rate:       {:.1}%", result.anomaly_rate * 100.0)?;
    writeln!(out, "Contamination:      {:.3}", result.contamination)?;
    writeln!(out, "Status codes:")?;
    for (code, count) in &result.status_code_histogram {
        writeln!(out, "  {code}: {count}")?;
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();
    let config_path = cli.config.clone().unwrap_or_else(AppConfig::resolve_path);
    let config = AppConfig::load(&config_path);

    StructuredLogger::init(&config.log)?;

    match cli.command {
        Commands::Generate {
            output,
            count,
            seed,
            anomaly_fraction,
        } => {
            let spec = SampleSpec {
                count,
                seed,
                anomaly_fraction,
                ..SampleSpec::default()
            };
            let logs = events::sample::generate(&spec);
            let format = EventFormat::from_path(&output)?;
            events::write_events(&output, &logs, format)?;
            info!(path = %output.display(), rows = logs.len(), "sample logs generated");
        }
        Commands::Analyze {
            input,
            output,
            emit_anomalies,
        } => {
            let rows = events::read_events(&input, None)?;
            if rows.len() > config.ingest.max_events {
                return Err(format!(
                    "{} rows exceed ingest.max_events ({})",
                    rows.len(),
                    config.ingest.max_events
                )
                .into());
            }
            let analyzer = Analyzer::new(config.model.clone());
            let result = analyzer.analyze(&rows)?;

            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            print_summary(&result, &mut out)?;
            if emit_anomalies {
                for s in &result.anomalies {
                    StructuredLogger::emit_json(&AnomalyLine::from(s), &mut out)?;
                }
            }
            if let Some(path) = output {
                report::export(&path, &result, None)?;
            }
        }
    }

    Ok(())
}
