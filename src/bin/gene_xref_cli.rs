use gene_xref::{
    CorrectionPolicy, GeneDictionary, Route, SchemaRegistry, SchemePair, TableSource, XrefConfig,
};
use serde::Serialize;
use std::{env, path::PathBuf};
use tracing_subscriber::EnvFilter;

fn usage() {
    eprintln!(
        "Usage:\n  \
  gene_xref_cli --version\n  \
  gene_xref_cli [OPTIONS] convert PAIR ID...\n  \
  gene_xref_cli [OPTIONS] dump PAIR\n  \
  gene_xref_cli [OPTIONS] pairs\n  \
  gene_xref_cli [OPTIONS] stats\n  \
  gene_xref_cli [OPTIONS] corrections\n\n  \
  Options:\n  \
    --table PATH       use PATH instead of the cached HGNC download\n  \
    --config PATH      JSON configuration file\n  \
    --interactive      ask before correcting unrecognized symbols\n  \
    --no-correction    never correct unrecognized symbols\n\n  \
  PAIR is <src>2<dst>, e.g. symbol2entrez; schemes: hgncid symbol entrez refseq uniprot ensembl"
    );
}

#[derive(Debug, Default)]
struct CliArgs {
    table: Option<PathBuf>,
    config: Option<PathBuf>,
    interactive: bool,
    no_correction: bool,
    command: Vec<String>,
}

#[derive(Serialize)]
struct Conversion {
    input: String,
    output: String,
}

#[derive(Serialize)]
struct PairSummary {
    pair: String,
    route: Route,
}

fn parse_args(args: &[String]) -> Result<CliArgs, String> {
    let mut out = CliArgs::default();
    let mut idx = 1usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "--table" | "--config" => {
                if idx + 1 >= args.len() {
                    return Err(format!("Missing PATH after {}", args[idx]));
                }
                let path = Some(PathBuf::from(&args[idx + 1]));
                if args[idx] == "--table" {
                    out.table = path;
                } else {
                    out.config = path;
                }
                idx += 2;
            }
            "--interactive" => {
                out.interactive = true;
                idx += 1;
            }
            "--no-correction" => {
                out.no_correction = true;
                idx += 1;
            }
            other if other.starts_with("--") => {
                return Err(format!("Unknown option '{other}'"));
            }
            _ => {
                out.command = args[idx..].to_vec();
                break;
            }
        }
    }
    Ok(out)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Could not serialize JSON output: {e}"))?;
    println!("{text}");
    Ok(())
}

fn parse_pair(args: &[String], command: &str) -> Result<SchemePair, String> {
    let raw = args
        .get(1)
        .ok_or_else(|| format!("{command} requires a PAIR such as symbol2entrez"))?;
    raw.parse().map_err(|e: gene_xref::XrefError| e.to_string())
}

fn open_dictionary(cli: &CliArgs) -> Result<GeneDictionary, String> {
    let config = XrefConfig::load(cli.config.as_deref()).map_err(|e| e.to_string())?;
    let mut settings = config.correction;
    if cli.interactive {
        settings.policy = CorrectionPolicy::Interactive;
    }
    if cli.no_correction {
        settings.enabled = false;
    }
    gene_xref::correction::set_correction_settings(settings);
    let source = TableSource::from(cli.table.clone());
    GeneDictionary::open(&source, &config).map_err(|e| e.to_string())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let args: Vec<String> = env::args().collect();
    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("gene_xref_cli {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }
    if args.iter().any(|a| a == "--help" || a == "-h") {
        usage();
        return Ok(());
    }
    let cli = parse_args(&args)?;
    let Some(command) = cli.command.first().cloned() else {
        usage();
        return Err("Missing command".to_string());
    };

    match command.as_str() {
        "convert" => {
            let pair = parse_pair(&cli.command, &command)?;
            let ids = &cli.command[2..];
            if ids.is_empty() {
                return Err("convert requires at least one ID".to_string());
            }
            let dictionary = open_dictionary(&cli)?;
            let conversions = ids
                .iter()
                .map(|id| {
                    dictionary
                        .convert_pair(pair, id)
                        .map(|output| Conversion {
                            input: id.clone(),
                            output,
                        })
                        .map_err(|e| e.to_string())
                })
                .collect::<Result<Vec<_>, String>>()?;
            print_json(&conversions)
        }
        "dump" => {
            let pair = parse_pair(&cli.command, &command)?;
            let dictionary = open_dictionary(&cli)?;
            let table = dictionary
                .table(pair.src, pair.dst)
                .map_err(|e| e.to_string())?;
            let mut rows: Vec<(&String, &String)> = table.iter().collect();
            rows.sort();
            for (key, value) in rows {
                println!("{key}\t{value}");
            }
            Ok(())
        }
        "pairs" => {
            let pairs: Vec<PairSummary> = SchemaRegistry::hgnc()
                .converter_list()
                .into_iter()
                .map(|(pair, route)| PairSummary {
                    pair: pair.to_string(),
                    route,
                })
                .collect();
            print_json(&pairs)
        }
        "stats" => print_json(&open_dictionary(&cli)?.stats()),
        "corrections" => print_json(&open_dictionary(&cli)?.corrections()),
        _ => {
            usage();
            Err(format!("Unknown command '{command}'"))
        }
    }
}
