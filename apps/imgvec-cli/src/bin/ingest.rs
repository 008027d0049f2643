use std::env;
use std::process::ExitCode;

use imgvec_cli::init_tracing;
use imgvec_core::config::Config;
use imgvec_pipeline::IngestPipeline;

struct Args { url: String, id: String, namespace: Option<String> }

fn parse_args() -> Option<Args> {
    let mut args = env::args().skip(1);
    let mut positional = Vec::new();
    let mut namespace = None;
    while let Some(a) = args.next() {
        match a.as_str() {
            "--namespace" | "-n" => namespace = Some(args.next()?),
            _ => positional.push(a),
        }
    }
    if positional.len() != 2 { return None; }
    let id = positional.pop()?;
    let url = positional.pop()?;
    Some(Args { url, id, namespace })
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    init_tracing();
    let Some(args) = parse_args() else {
        eprintln!("Usage: imgvec-ingest <image-url> <id> [--namespace NS]");
        return Ok(ExitCode::from(2));
    };

    let settings = Config::load()?.settings()?;
    let mut pipeline = IngestPipeline::from_settings(&settings).await?;
    if let Some(ns) = &args.namespace { pipeline = pipeline.with_namespace(ns); }

    match pipeline.ingest(&args.url, &args.id).await {
        Ok(record) => {
            println!("{}", record.id);
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            eprintln!("{} [{}]: {}", err.stage, err.category(), err.kind);
            Ok(ExitCode::FAILURE)
        }
    }
}
