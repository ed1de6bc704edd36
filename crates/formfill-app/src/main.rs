// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// formfill: Fill form templates from JSON requests.
//
// Entry point. Initialises logging, loads configuration and templates once,
// then runs a single fill, a parallel batch, or lists templates.

mod batch;
mod request;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use formfill_core::clock::{Clock, FixedClock, SystemClock};
use formfill_core::config::EngineConfig;
use formfill_core::error::Result;
use formfill_core::types::RequestId;
use formfill_forms::{FormFiller, TemplateRegistry};

use request::{Envelope, read_request};

#[derive(Debug, Parser)]
#[command(name = "formfill", version, about = "Fill form templates with text and signatures")]
struct Cli {
    /// JSON engine configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the configured template directory.
    #[arg(long, global = true)]
    template_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fill one request and print the JSON envelope.
    Fill {
        /// Request file (`{ "template", "formData" }` or bare form data).
        #[arg(long)]
        input: PathBuf,
        /// Template used when the request does not name one.
        #[arg(long, default_value = "form60")]
        template: String,
        /// Write the JPEG here instead of printing base64.
        #[arg(long)]
        output: Option<PathBuf>,
        /// Freeze the consent date (RFC 3339) for reproducible output.
        #[arg(long)]
        now: Option<DateTime<Utc>>,
    },
    /// Fill every request in a directory in parallel.
    Batch {
        #[arg(long)]
        input_dir: PathBuf,
        #[arg(long)]
        output_dir: PathBuf,
        #[arg(long, default_value = "form60")]
        template: String,
        #[arg(long)]
        now: Option<DateTime<Utc>>,
        /// Worker threads (defaults to one per CPU).
        #[arg(long)]
        workers: Option<usize>,
    },
    /// List registered templates.
    Templates,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            tracing::error!(error = %err, "formfill failed");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if let Some(dir) = cli.template_dir {
        config.template_dir = dir;
    }
    tracing::info!(template_dir = %config.template_dir.display(), "formfill starting");

    let registry = TemplateRegistry::from_config(&config)?;

    match cli.command {
        Command::Templates => {
            for template in registry.iter() {
                let doc = template.document();
                println!(
                    "{}\t{}\t{}x{}\t{}",
                    template.definition().id,
                    template.definition().name,
                    doc.width(),
                    doc.height(),
                    doc.fingerprint()
                );
            }
            Ok(ExitCode::SUCCESS)
        }

        Command::Fill {
            input,
            template,
            output,
            now,
        } => {
            let filler = FormFiller::new(registry, &config, clock_for(now))?;
            let (request_id, result) = match read_request(&input, &template) {
                Ok(request) => (request.request_id, filler.fill(&request)),
                Err(err) => (RequestId::new(), Err(err)),
            };

            let (envelope, code) = match result {
                Ok(image) => match output {
                    Some(path) => {
                        std::fs::write(&path, image.as_bytes())?;
                        tracing::info!(path = %path.display(), "JPEG written");
                        return Ok(ExitCode::SUCCESS);
                    }
                    None => (Envelope::success(request_id, image.to_base64()), ExitCode::SUCCESS),
                },
                Err(err) => (Envelope::failure(request_id, &err), ExitCode::FAILURE),
            };
            println!("{}", serde_json::to_string(&envelope)?);
            Ok(code)
        }

        Command::Batch {
            input_dir,
            output_dir,
            template,
            now,
            workers,
        } => {
            let filler = FormFiller::new(registry, &config, clock_for(now))?;
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(workers.unwrap_or(0))
                .build()
                .map_err(|err| std::io::Error::other(err.to_string()))?;
            let summary =
                pool.install(|| batch::run_batch(&filler, &input_dir, &output_dir, &template))?;
            println!("filled {} failed {}", summary.filled, summary.failed);
            Ok(if summary.failed == 0 {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

fn clock_for(now: Option<DateTime<Utc>>) -> Arc<dyn Clock> {
    match now {
        Some(instant) => Arc::new(FixedClock(instant)),
        None => Arc::new(SystemClock),
    }
}
