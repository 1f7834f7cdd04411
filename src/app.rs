use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use crate::config::APP_NAME;
use crate::error::EngineError;
use crate::file;
use crate::processor::Processor;
use crate::secret::SecretBytes;
use crate::status::StatusListener;
use crate::types::{Processing, ProcessorMode};
use crate::ui;
use crate::ui::progress::ProgressListener;
use crate::ui::prompt;

#[derive(Args)]
pub struct RunArgs {
    /// Files or directories to process.
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Key; prompted interactively when omitted.
    #[arg(short, long)]
    key: Option<String>,

    /// Keep source files after processing.
    #[arg(short, long)]
    preserve: bool,

    /// Recurse into directories.
    #[arg(short, long)]
    recursive: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Encrypt files, producing `.xrv` outputs.
    Encrypt(RunArgs),

    /// Decrypt `.xrv` files.
    Decrypt(RunArgs),
}

#[derive(Parser)]
#[command(name = "xorvault", version = "1.2.0", about = "Chunked, concurrent file encryption built on a keyed byte-substitution transform.")]
pub struct App {
    #[command(subcommand)]
    command: Commands,
}

impl App {
    pub fn init() -> Result<Self> {
        let subscriber = tracing_subscriber::fmt().with_target(false).finish();
        tracing::subscriber::set_global_default(subscriber)?;
        Ok(Self::parse())
    }

    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Encrypt(args) => Self::run(args, Processing::Encryption).await,
            Commands::Decrypt(args) => Self::run(args, Processing::Decryption).await,
        }
    }

    async fn run(args: RunArgs, processing: Processing) -> Result<()> {
        let mode = processing.mode();

        let targets = file::collect_targets(&args.paths, mode, args.recursive);
        if targets.is_empty() {
            bail!("no eligible files found");
        }

        let key = Self::get_key(args.key, mode)?;
        let processor = Arc::new(Processor::new(key)?);
        let listener: Arc<dyn StatusListener> = Arc::new(ProgressListener::new());

        info!(files = targets.len(), mode = %mode, "{APP_NAME} starting");

        let mut succeeded = 0usize;
        let mut failed = 0usize;

        // Files are isolated: one failure is reported and the batch
        // moves on.
        for src in targets {
            let dest = file::output_path(&src, mode);

            let result = {
                let processor = Arc::clone(&processor);
                let listener = Arc::clone(&listener);
                let src = src.clone();
                let dest = dest.clone();

                tokio::task::spawn_blocking(move || match processing {
                    Processing::Encryption => {
                        processor.encrypt_file(args.preserve, &src, &dest, &listener)
                    }
                    Processing::Decryption => {
                        processor.decrypt_file(args.preserve, &src, &dest, &listener)
                    }
                })
                .await
                .context("processing task panicked")?
            };

            match result {
                Ok(true) => {
                    succeeded += 1;
                    ui::show_success(mode, &dest);
                }
                Ok(false) => failed += 1,
                Err(EngineError::WrongKey) => {
                    failed += 1;
                    ui::show_failure(&src, "wrong key");
                }
                Err(err) => {
                    failed += 1;
                    ui::show_failure(&src, &err.to_string());
                }
            }
        }

        ui::show_summary(succeeded, failed);
        if succeeded == 0 {
            bail!("all files failed");
        }

        Ok(())
    }

    fn get_key(key: Option<String>, mode: ProcessorMode) -> Result<SecretBytes> {
        match key {
            Some(key) => {
                prompt::validate_key(&key)?;
                Ok(SecretBytes::from_vec(key.into_bytes()))
            }
            None => prompt::prompt_key(mode),
        }
    }
}
