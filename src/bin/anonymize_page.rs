//! Anonymize a JSON page description.
//!
//! Renders every page twice: once anonymized, once with the diagnostic
//! overlay on top, and writes a JSON report of all replacements.
//!
//! Usage:
//!   anonymize_page <document.json> <output-dir> [--whitelist zones.json]
//!                  [--config config.json] [--frequencies table.json] [--seed N]
//!
//! Output:
//!   <output-dir>/page-N.png       anonymized page N (1-based)
//!   <output-dir>/page-N.info.png  same page with highlights and zone outlines
//!   <output-dir>/report.json      per-page replacement reports

use pdf_anonymizer::anonymizer::{Anonymizer, PageSource};
use pdf_anonymizer::catalog::SubstitutionTable;
use pdf_anonymizer::config::AnonymizerConfig;
use pdf_anonymizer::document::JsonDocument;
use pdf_anonymizer::whitelist::ZoneRecord;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

struct Args {
    document: PathBuf,
    output_dir: PathBuf,
    whitelist: Option<PathBuf>,
    config: Option<PathBuf>,
    frequencies: Option<PathBuf>,
    seed: Option<u64>,
}

impl Args {
    fn from_args() -> Result<Self, String> {
        let args: Vec<String> = std::env::args().skip(1).collect();
        let mut positional = Vec::new();
        let mut whitelist = None;
        let mut config = None;
        let mut frequencies = None;
        let mut seed = None;

        let mut i = 0;
        while i < args.len() {
            let flag = args[i].as_str();
            match flag {
                "--whitelist" | "--config" | "--frequencies" | "--seed" => {
                    i += 1;
                    let value = args
                        .get(i)
                        .ok_or_else(|| format!("{} needs a value", flag))?;
                    match flag {
                        "--whitelist" => whitelist = Some(PathBuf::from(value)),
                        "--config" => config = Some(PathBuf::from(value)),
                        "--frequencies" => frequencies = Some(PathBuf::from(value)),
                        _ => {
                            seed = Some(
                                value
                                    .parse::<u64>()
                                    .map_err(|e| format!("invalid seed {:?}: {}", value, e))?,
                            )
                        },
                    }
                },
                "--help" | "-h" => return Err(String::new()),
                other if other.starts_with("--") => {
                    return Err(format!("unknown option {}", other));
                },
                other => positional.push(PathBuf::from(other)),
            }
            i += 1;
        }

        let [document, output_dir]: [PathBuf; 2] = positional
            .try_into()
            .map_err(|_| "expected <document.json> <output-dir>".to_string())?;
        Ok(Self {
            document,
            output_dir,
            whitelist,
            config,
            frequencies,
            seed,
        })
    }
}

fn usage() {
    eprintln!(
        "Usage: anonymize_page <document.json> <output-dir> [--whitelist zones.json] \
         [--config config.json] [--frequencies table.json] [--seed N]"
    );
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => AnonymizerConfig::from_json_file(path)?,
        None => AnonymizerConfig::default(),
    };
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }

    let mut anonymizer = Anonymizer::new(config)?;
    if let Some(path) = &args.frequencies {
        anonymizer = anonymizer.with_substitution_table(SubstitutionTable::from_json_file(path)?);
    }
    if let Some(path) = &args.whitelist {
        anonymizer = anonymizer.with_zone_records(ZoneRecord::load_all(path)?);
    }

    let document = JsonDocument::open(&args.document)?;
    fs::create_dir_all(&args.output_dir)?;

    let mut reports = Vec::with_capacity(document.page_count());
    for index in 0..document.page_count() {
        let start = Instant::now();
        let rendered = anonymizer.render_page(&document, index)?;
        let page = index + 1;
        rendered
            .clean
            .save(args.output_dir.join(format!("page-{}.png", page)))?;
        rendered
            .highlighted
            .save(args.output_dir.join(format!("page-{}.info.png", page)))?;
        log::info!(
            "Wrote page {} ({}x{}) in {:.2?}",
            page,
            rendered.report.width,
            rendered.report.height,
            start.elapsed()
        );
        reports.push(rendered.report);
    }

    let report_path = args.output_dir.join("report.json");
    serde_json::to_writer_pretty(BufWriter::new(File::create(&report_path)?), &reports)?;
    log::info!("Report written to {}", report_path.display());
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = match Args::from_args() {
        Ok(args) => args,
        Err(message) => {
            if !message.is_empty() {
                eprintln!("Error: {}", message);
            }
            usage();
            return ExitCode::FAILURE;
        },
    };

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        },
    }
}
