use std::path::PathBuf;

use anyhow::{bail, Context, Result};

/// Run configuration loaded from environment variables.
/// Every value has a default matching the working-directory layout
/// (`prod_docs/`, `barcodes/`, `finished/`).
#[derive(Debug, Clone)]
pub struct Config {
    pub input_dir: PathBuf,
    pub image_dir: PathBuf,
    pub output_dir: PathBuf,
    /// TrueType font for barcode captions. `None` falls back to system fonts.
    pub caption_font: Option<PathBuf>,
    /// Cells already consumed on the first page of every sheet.
    pub skip_cells: u32,
    /// Outline each placed label.
    pub border: bool,
    pub rust_log: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            input_dir: PathBuf::from("./prod_docs"),
            image_dir: PathBuf::from("./barcodes"),
            output_dir: PathBuf::from("./finished"),
            caption_font: None,
            skip_cells: 0,
            border: false,
            rust_log: "info".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = Config::default();
        Ok(Config {
            input_dir: env_path("LABELIZER_INPUT_DIR").unwrap_or(defaults.input_dir),
            image_dir: env_path("LABELIZER_IMAGE_DIR").unwrap_or(defaults.image_dir),
            output_dir: env_path("LABELIZER_OUTPUT_DIR").unwrap_or(defaults.output_dir),
            caption_font: env_path("LABELIZER_CAPTION_FONT"),
            skip_cells: match std::env::var("LABELIZER_SKIP_CELLS") {
                Ok(raw) => raw
                    .trim()
                    .parse::<u32>()
                    .context("LABELIZER_SKIP_CELLS must be a non-negative integer")?,
                Err(_) => defaults.skip_cells,
            },
            border: match std::env::var("LABELIZER_BORDER") {
                Ok(raw) => parse_flag(&raw).context("LABELIZER_BORDER must be true or false")?,
                Err(_) => defaults.border,
            },
            rust_log: std::env::var("RUST_LOG").unwrap_or(defaults.rust_log),
        })
    }
}

fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
}

fn parse_flag(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => bail!("unrecognised flag value '{other}'"),
    }
}
