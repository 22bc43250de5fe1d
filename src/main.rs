//! Issuer velocity entrypoint. Batch mode sorts the whole input and persists the
//! result; stream mode computes online over time-ordered input until EOF or Ctrl+C.

use issuer_velocity::{
    assembler::{write_ndjson, VelocityRecord},
    config::{InputFormat, RunMode, VelocityConfig},
    error::VelocityError,
    logging::StructuredLogger,
    normalizer::{CustomerDecoder, FlatEventDecoder, Normalizer, RecordDecoder},
    pipeline::BatchPipeline,
    storage::VelocityStore,
    stream::StreamRunner,
};
use serde::Serialize;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

fn open_input(path: Option<&Path>) -> Result<Box<dyn BufRead>, VelocityError> {
    Ok(match path {
        Some(p) => Box::new(BufReader::new(File::open(p)?)),
        None => Box::new(BufReader::new(std::io::stdin())),
    })
}

fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>, VelocityError> {
    Ok(match path {
        Some(p) => Box::new(BufWriter::new(File::create(p)?)),
        None => Box::new(BufWriter::new(std::io::stdout())),
    })
}

fn open_report(path: Option<&Path>) -> Result<Option<BufWriter<File>>, VelocityError> {
    Ok(match path {
        Some(p) => Some(BufWriter::new(File::create(p)?)),
        None => None,
    })
}

fn run_batch<D>(config: &VelocityConfig, decoder: D) -> Result<(), VelocityError>
where
    D: RecordDecoder,
    D::Payload: Serialize + Send,
{
    let input = open_input(config.input.path.as_deref())?;
    let mut normalizer = Normalizer::new(input, decoder);
    let outcomes = normalizer.by_ref().collect::<std::io::Result<Vec<_>>>()?;
    info!(lines = normalizer.lines_read(), records = outcomes.len(), "input normalized");

    let report = BatchPipeline::new(config).run(outcomes)?;

    if let Some(mut w) = open_report(config.output.rejections_path.as_deref())? {
        for r in &report.rejections {
            StructuredLogger::emit_json(r, &mut w)?;
        }
        w.flush()?;
    }

    let mut out = open_output(config.output.ndjson_path.as_deref())?;
    let written = write_ndjson(&report.records, &mut out)?;
    info!(written, "records exported");

    if let Some(db_path) = &config.output.db_path {
        let mut store = VelocityStore::open(db_path)?;
        let run_id = report.summary.run_id.to_string();
        let stored = store.insert_records(&run_id, &report.records)?;
        store.record_run(&report.summary)?;
        info!(stored, db = %db_path.display(), "records stored");
    }
    Ok(())
}

fn run_stream<D>(config: &VelocityConfig, decoder: D, stop: Arc<AtomicBool>) -> Result<(), VelocityError>
where
    D: RecordDecoder,
    D::Payload: Serialize,
{
    let input = open_input(config.input.path.as_deref())?;
    let mut out = open_output(config.output.ndjson_path.as_deref())?;
    let mut report = open_report(config.output.rejections_path.as_deref())?;
    let mut runner = StreamRunner::new(&config.window, stop);

    runner.run(
        Normalizer::new(input, decoder),
        |record: VelocityRecord<D::Payload>| {
            write_ndjson(std::iter::once(&record), &mut out)?;
            Ok(())
        },
        |rejection| {
            if let Some(w) = report.as_mut() {
                StructuredLogger::emit_json(rejection, w)?;
                w.flush()?;
            }
            Ok(())
        },
    )?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config_path = std::env::var("VELOCITY_CONFIG_PATH")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|_| std::path::PathBuf::from("config.json"));
    let loaded = VelocityConfig::try_load(&config_path);
    let config = loaded.as_ref().cloned().unwrap_or_default();

    StructuredLogger::init(config.log.json, &config.log.level);
    if let Err(e) = &loaded {
        warn!(path = %config_path.display(), error = %e, "config unusable; using defaults");
    }

    info!(
        mode = ?config.mode,
        format = ?config.input.format,
        window_secs = config.window.window_secs,
        "issuer velocity starting"
    );

    match config.mode {
        RunMode::Batch => match config.input.format {
            InputFormat::Customers => run_batch(&config, CustomerDecoder)?,
            InputFormat::Events => run_batch(&config, FlatEventDecoder)?,
        },
        RunMode::Stream => {
            let stop = Arc::new(AtomicBool::new(false));
            let flag = Arc::clone(&stop);
            let _ = ctrlc::set_handler(move || {
                // second Ctrl+C while blocked on input exits immediately
                if flag.swap(true, Ordering::Relaxed) {
                    std::process::exit(130);
                }
            });
            match config.input.format {
                InputFormat::Customers => run_stream(&config, CustomerDecoder, stop)?,
                InputFormat::Events => run_stream(&config, FlatEventDecoder, stop)?,
            }
        }
    }

    info!("issuer velocity done");
    Ok(())
}
