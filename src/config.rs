use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cluster::Thresholds;
use crate::order::OrderMode;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Read(String),
    #[error("Failed to parse config: {0}")]
    Parse(String),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    pub lang: String,
    pub dpi: u32,
    pub psm: u8,
    pub oem: u8,
    /// Worker threads for page recognition. 1 keeps it sequential.
    pub jobs: usize,
}

impl Default for OcrConfig {
    fn default() -> Self {
        OcrConfig { lang: "vie+eng".into(), dpi: 600, psm: 6, oem: 3, jobs: 1 }
    }
}

/// Run configuration as read from `labels.yaml`. Thresholds are kept wide here so that
/// out-of-range values reach `validate` instead of failing inside the YAML parser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub input: String,
    pub output_dir: String,
    pub name_threshold: i64,
    pub category_threshold: i64,
    pub category_gate: bool,
    pub order: String,
    pub per_cluster: bool,
    pub keep_unclassified: bool,
    pub max_pages: Option<usize>,
    pub artifacts: bool,
    pub ocr: OcrConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            input: "./input/**/*.pdf".into(),
            output_dir: "./output".into(),
            name_threshold: 80,
            category_threshold: 99,
            category_gate: false,
            order: OrderMode::default().as_str().into(),
            per_cluster: false,
            keep_unclassified: false,
            max_pages: None,
            artifacts: false,
            ocr: OcrConfig::default(),
        }
    }
}

impl RunConfig {
    /// Check ranges and enum values. Nothing is clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_percent("name_threshold", self.name_threshold)?;
        check_percent("category_threshold", self.category_threshold)?;
        self.order_mode()?;
        if self.input.trim().is_empty() {
            return Err(ConfigError::Invalid("missing input".into()));
        }
        if self.output_dir.trim().is_empty() {
            return Err(ConfigError::Invalid("missing output_dir".into()));
        }
        if self.ocr.jobs == 0 {
            return Err(ConfigError::Invalid("ocr.jobs must be at least 1".into()));
        }
        if self.ocr.dpi < 72 {
            return Err(ConfigError::Invalid(format!("ocr.dpi {} is below 72", self.ocr.dpi)));
        }
        if self.ocr.lang.trim().is_empty() {
            return Err(ConfigError::Invalid("missing ocr.lang".into()));
        }
        if self.max_pages == Some(0) {
            return Err(ConfigError::Invalid("max_pages must be at least 1".into()));
        }
        Ok(())
    }

    pub fn thresholds(&self) -> Result<Thresholds, ConfigError> {
        Ok(Thresholds {
            name: check_percent("name_threshold", self.name_threshold)?,
            category: check_percent("category_threshold", self.category_threshold)?,
            category_gate: self.category_gate,
        })
    }

    pub fn order_mode(&self) -> Result<OrderMode, ConfigError> {
        self.order.parse::<OrderMode>().map_err(ConfigError::Invalid)
    }

    /// Apply command-line flags on top of the file values.
    pub fn apply_args(&mut self, args: &[String]) -> Result<(), ConfigError> {
        let mut positional: Vec<&String> = Vec::new();
        let mut i = 1;
        while i < args.len() {
            let arg = &args[i];
            match arg.as_str() {
                "--config" => i += 1, // consumed by `config_path_from_args`
                "--name-threshold" => self.name_threshold = parse_int(arg, args.get(i + 1))?,
                "--category-threshold" => self.category_threshold = parse_int(arg, args.get(i + 1))?,
                "--order" => self.order = flag_value(arg, args.get(i + 1))?.to_string(),
                "--max-pages" => self.max_pages = Some(parse_count(arg, args.get(i + 1))?),
                "--ocr-lang" => self.ocr.lang = flag_value(arg, args.get(i + 1))?.to_string(),
                "--ocr-dpi" => self.ocr.dpi = parse_count(arg, args.get(i + 1))?,
                "--ocr-jobs" => self.ocr.jobs = parse_count(arg, args.get(i + 1))?,
                "--category-gate" => self.category_gate = true,
                "--per-cluster" => self.per_cluster = true,
                "--keep-unclassified" => self.keep_unclassified = true,
                "--artifacts" | "--artifacts=on" => self.artifacts = true,
                "--artifacts=off" => self.artifacts = false,
                other if other.starts_with("--") => {
                    return Err(ConfigError::Invalid(format!("unknown flag: {}", other)));
                }
                _ => positional.push(arg),
            }
            if takes_value(arg) {
                i += 1;
            }
            i += 1;
        }
        match positional.as_slice() {
            [] => {}
            [input] => self.input = input.to_string(),
            [input, output] => {
                self.input = input.to_string();
                self.output_dir = output.to_string();
            }
            _ => return Err(ConfigError::Invalid("expected at most INPUT and OUTPUT_DIR".into())),
        }
        Ok(())
    }
}

/// Read and validate a YAML config file.
pub fn load_config(path: &Path) -> Result<RunConfig, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Read(e.to_string()))?;
    let cfg: RunConfig = serde_yaml::from_str(&raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Resolve the run configuration: file (explicit `--config`, else `labels.yaml` when present,
/// else defaults), then CLI flags, then validation.
pub fn resolve_config(args: &[String]) -> Result<RunConfig, ConfigError> {
    let explicit = config_path_from_args(args)?;
    let mut cfg = match explicit {
        Some(p) => load_config(Path::new(p))?,
        None if Path::new("labels.yaml").is_file() => load_config(Path::new("labels.yaml"))?,
        None => RunConfig::default(),
    };
    cfg.apply_args(args)?;
    cfg.validate()?;
    Ok(cfg)
}

fn config_path_from_args(args: &[String]) -> Result<Option<&str>, ConfigError> {
    match args.iter().position(|a| a == "--config") {
        Some(pos) => flag_value("--config", args.get(pos + 1)).map(Some),
        None => Ok(None),
    }
}

fn takes_value(flag: &str) -> bool {
    matches!(
        flag,
        "--name-threshold"
            | "--category-threshold"
            | "--order"
            | "--max-pages"
            | "--ocr-lang"
            | "--ocr-dpi"
            | "--ocr-jobs"
    )
}

fn flag_value<'a>(flag: &str, val: Option<&'a String>) -> Result<&'a str, ConfigError> {
    match val {
        Some(v) if !v.starts_with("--") => Ok(v.as_str()),
        _ => Err(ConfigError::Invalid(format!("{} needs a value", flag))),
    }
}

fn parse_int(flag: &str, val: Option<&String>) -> Result<i64, ConfigError> {
    let raw = flag_value(flag, val)?;
    let n = raw
        .parse::<i64>()
        .map_err(|_| ConfigError::Invalid(format!("{} expects an integer, got {}", flag, raw)))?;
    if n < 0 && !flag.ends_with("threshold") {
        return Err(ConfigError::Invalid(format!("{} must not be negative", flag)));
    }
    Ok(n)
}

fn parse_count<T: TryFrom<i64>>(flag: &str, val: Option<&String>) -> Result<T, ConfigError> {
    let n = parse_int(flag, val)?;
    T::try_from(n).map_err(|_| ConfigError::Invalid(format!("{} is out of range: {}", flag, n)))
}

fn check_percent(field: &str, value: i64) -> Result<u8, ConfigError> {
    if (0..=100).contains(&value) {
        Ok(value as u8)
    } else {
        Err(ConfigError::Invalid(format!("{} must be within 0..=100, got {}", field, value)))
    }
}
