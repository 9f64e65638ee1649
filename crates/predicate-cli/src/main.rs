use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use predicate_core::session::{clear_working_set, load_working_set, save_working_set};
use predicate_core::{AppConfig, DeviceRecord};
use predicate_match::clearance::clearance_key;
use predicate_match::{
    MatchResolver, MergePolicy, PdfExtraction, ReconcileReport, Reconciler, SearchQuery,
    SearchResponse, WorkingSet, normalize, similarity,
};

// ─── CLI Definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "predicate",
    about = "Reconcile predicate device records from search results and PDF extraction",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output in JSON format. Also enabled by setting PREDICATE_JSON=1.
    #[arg(long, global = true)]
    json: bool,

    /// Session file holding the working set (defaults to the configured path).
    #[arg(long, global = true)]
    session: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the normalized form of a device name.
    Normalize { name: String },

    /// Score the similarity of two device names.
    Similarity { a: String, b: String },

    /// Find the working-set record a device refers to.
    Match {
        name: String,
        /// Clearance number of the device, if known.
        #[arg(long)]
        key: Option<String>,
    },

    /// Show the request body a search query produces.
    Query {
        query: String,
        #[arg(long)]
        product_code: Option<String>,
    },

    /// Reconcile a search endpoint response into the session.
    IngestSearch {
        /// Response body file, or `-` for stdin.
        body: String,
        /// The query the response answers.
        #[arg(long)]
        query: String,
        #[arg(long)]
        product_code: Option<String>,
    },

    /// Reconcile a PDF extraction response into the session.
    IngestPdf {
        /// Response body file, or `-` for stdin.
        body: String,
        #[arg(long)]
        product_code: Option<String>,
    },

    /// List the working set.
    List,

    /// Add a record to the comparison.
    Select { id: String },

    /// Remove a record from the comparison.
    Deselect { id: String },

    /// Delete the session file.
    Clear,

    /// Config management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Show version information.
    Version,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show all config values.
    List,
    /// Print the config file path.
    Path,
    /// Write the effective config to the config file.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

// ─── Main ────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let start = Instant::now();
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let json_output = cli.json || std::env::var("PREDICATE_JSON").as_deref() == Ok("1");

    let config_path = AppConfig::config_path();
    let config = AppConfig::load_from(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    let session_path = config.session_path(cli.session.as_deref());
    let resolver = MatchResolver::from_config(&config.matching);
    tracing::debug!(session = %session_path.display(), threshold = resolver.threshold(), "loaded config");

    match cli.command {
        Commands::Normalize { name } => {
            let normalized = normalize(&name);
            let dur = start.elapsed().as_millis();
            if json_output {
                print_json(&serde_json::json!({"status":"ok","data":{"name":name,"normalized":normalized},"meta":{"duration_ms":dur}}))?;
            } else {
                println!("{normalized}");
            }
        }

        Commands::Similarity { a, b } => {
            let score = similarity(&a, &b);
            let dur = start.elapsed().as_millis();
            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": { "a": a, "b": b, "similarity": score, "threshold": resolver.threshold() },
                    "meta": { "duration_ms": dur }
                }))?;
            } else {
                println!("{score:.4}");
            }
        }

        Commands::Match { name, key } => {
            let records = load_working_set(&session_path)?;
            let lookup = lookup_record(name, key.as_deref());
            let found = resolver.resolve(&lookup, &records);
            let dur = start.elapsed().as_millis();

            if json_output {
                let matched = found.map(|m| {
                    serde_json::json!({"record": &records[m.index], "tier": m.tier, "similarity": m.similarity})
                });
                print_json(&serde_json::json!({"status":"ok","data":matched,"meta":{"duration_ms":dur}}))?;
            } else {
                match found {
                    Some(m) => println!(
                        "{}  {}  ({:?}, similarity {:.4})",
                        records[m.index].id, records[m.index].device_name, m.tier, m.similarity
                    ),
                    None => println!("No match in {} records.", records.len()),
                }
            }
        }

        Commands::Query { query, product_code } => {
            let fallback = product_code.or(config.session.product_code.clone());
            let parsed = SearchQuery::parse(&query, fallback.as_deref())
                .with_context(|| format!("query too short: {query:?}"))?;
            let request = parsed.to_request();
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": { "request": request, "accumulates": parsed.accumulates() },
                    "meta": { "duration_ms": dur }
                }))?;
            } else {
                println!("{}", serde_json::to_string_pretty(&request)?);
            }
        }

        Commands::IngestSearch { body, query, product_code } => {
            let fallback = product_code.or(config.session.product_code.clone());
            let parsed = SearchQuery::parse(&query, fallback.as_deref())
                .with_context(|| format!("query too short: {query:?}"))?;
            let response = SearchResponse::from_json(&read_body(&body)?)?;
            let results = response.into_records(&parsed);

            let set = WorkingSet::from_records(load_working_set(&session_path)?);
            let reconciler = Reconciler::new(resolver, MergePolicy::fill_missing());
            let (updated, report) = set.apply_search(&parsed, results, &reconciler);
            save_working_set(&session_path, updated.records())?;

            print_report(&report, updated.len(), json_output, start)?;
        }

        Commands::IngestPdf { body, product_code } => {
            let fallback = product_code.or(config.session.product_code.clone());
            let extraction = PdfExtraction::from_json(&read_body(&body)?)?;
            let record = extraction.into_record(fallback.as_deref());

            let set = WorkingSet::from_records(load_working_set(&session_path)?);
            let reconciler = Reconciler::new(resolver, MergePolicy::from(config.merge.upload_policy));
            let (updated, report) = set.reconcile([record], &reconciler);
            save_working_set(&session_path, updated.records())?;

            print_report(&report, updated.len(), json_output, start)?;
        }

        Commands::List => {
            let records = load_working_set(&session_path)?;
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": { "items": records, "total": records.len() },
                    "meta": { "duration_ms": dur }
                }))?;
            } else if records.is_empty() {
                println!("Working set is empty. Use `predicate ingest-search` or `predicate ingest-pdf`.");
            } else {
                for rec in &records {
                    let mark = if rec.added_to_comparison { "*" } else { " " };
                    println!(
                        "{mark} {id:<28}  {name:<40}  {manufacturer:<24}  {missing} missing",
                        id = rec.id,
                        name = rec.device_name,
                        manufacturer = rec.manufacturer.as_deref().unwrap_or("-"),
                        missing = rec.missing_fields().len(),
                    );
                }
            }
        }

        Commands::Select { id } => {
            let set = WorkingSet::from_records(load_working_set(&session_path)?);
            let updated = set.select(&id, config.session.max_selected)?;
            save_working_set(&session_path, updated.records())?;
            print_selection(&updated, json_output, start)?;
        }

        Commands::Deselect { id } => {
            let set = WorkingSet::from_records(load_working_set(&session_path)?);
            let updated = set.deselect(&id)?;
            save_working_set(&session_path, updated.records())?;
            print_selection(&updated, json_output, start)?;
        }

        Commands::Clear => {
            clear_working_set(&session_path)?;
            if json_output {
                print_json(&serde_json::json!({"status":"ok","data":{"cleared":session_path},"meta":{"duration_ms":start.elapsed().as_millis()}}))?;
            } else {
                println!("Cleared {}", session_path.display());
            }
        }

        Commands::Config { action } => {
            let dur = start.elapsed().as_millis();
            match action {
                ConfigAction::List => {
                    let kv = config_key_values(&config, &session_path);
                    if json_output {
                        print_json(&serde_json::json!({"status":"ok","data":kv,"meta":{"duration_ms":dur}}))?;
                    } else {
                        for (k, v) in &kv {
                            println!("{k} = {v}");
                        }
                    }
                }
                ConfigAction::Path => {
                    if json_output {
                        print_json(&serde_json::json!({"status":"ok","data":{"path":config_path,"exists":config_path.exists()},"meta":{"duration_ms":dur}}))?;
                    } else {
                        println!("{}", config_path.display());
                    }
                }
                ConfigAction::Init { force } => {
                    if config_path.exists() && !force {
                        anyhow::bail!("{} already exists, pass --force to overwrite", config_path.display());
                    }
                    config.save_to(&config_path)?;
                    if json_output {
                        print_json(&serde_json::json!({"status":"ok","data":{"path":config_path},"meta":{"duration_ms":dur}}))?;
                    } else {
                        println!("Wrote {}", config_path.display());
                    }
                }
            }
        }

        Commands::Version => {
            let version = env!("CARGO_PKG_VERSION");
            let dur = start.elapsed().as_millis();
            if json_output {
                print_json(&serde_json::json!({"status":"ok","data":{"version":version},"meta":{"duration_ms":dur}}))?;
            } else {
                println!("predicate v{version}");
            }
        }
    }

    Ok(())
}

// ─── Helpers ────────────────────────────────────────────────────────────────

/// Record to resolve for `match`: the name plus a canonical clearance key.
fn lookup_record(name: String, key: Option<&str>) -> DeviceRecord {
    let mut record = DeviceRecord::new("lookup", name);
    record.clearance_key = key.and_then(clearance_key);
    record
}

fn print_json(val: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(val)?);
    Ok(())
}

fn read_body(source: &str) -> Result<String> {
    if source == "-" {
        let mut body = String::new();
        std::io::stdin().read_to_string(&mut body)?;
        return Ok(body);
    }
    std::fs::read_to_string(Path::new(source)).with_context(|| format!("reading {source}"))
}

fn print_report(report: &ReconcileReport, total: usize, json_output: bool, start: Instant) -> Result<()> {
    let dur = start.elapsed().as_millis();
    if json_output {
        return print_json(&serde_json::json!({
            "status": "ok",
            "data": { "report": report, "total": total },
            "meta": { "duration_ms": dur }
        }));
    }

    if report.replaced {
        println!(
            "Working set replaced: merged {}, appended {}; {total} records kept.",
            report.merged_count(),
            report.appended_count()
        );
    } else {
        println!(
            "Merged {}, appended {}; working set now holds {total} records.",
            report.merged_count(),
            report.appended_count()
        );
    }
    Ok(())
}

fn print_selection(set: &WorkingSet, json_output: bool, start: Instant) -> Result<()> {
    let selected: Vec<&DeviceRecord> = set.selected().collect();
    let dur = start.elapsed().as_millis();
    if json_output {
        return print_json(&serde_json::json!({"status":"ok","data":{"selected":selected},"meta":{"duration_ms":dur}}));
    }

    if selected.is_empty() {
        println!("No predicates selected.");
    }
    for rec in selected {
        println!("* {}  {}", rec.id, rec.device_name);
    }
    Ok(())
}

fn config_key_values(config: &AppConfig, session_path: &Path) -> std::collections::BTreeMap<&'static str, String> {
    let mut map = std::collections::BTreeMap::new();
    map.insert("matching.similarity_threshold", config.matching.similarity_threshold.to_string());
    map.insert("matching.empty_names", config.matching.empty_names.as_str().to_string());
    map.insert("merge.upload_policy", config.merge.upload_policy.as_str().to_string());
    map.insert("session.path", session_path.to_string_lossy().to_string());
    map.insert(
        "session.product_code",
        config.session.product_code.clone().unwrap_or_default(),
    );
    map.insert("session.max_selected", config.session.max_selected.to_string());
    map
}
