use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::error::FillError;

/// Version of the configuration format this build understands.
pub const CONFIG_VERSION: u32 = 2;

pub const MAX_ROWS: usize = 1000;

pub const SAMPLE_CONFIG: &str = r#"# copysmith configuration
version = 2
# data_dir = "/path/to/data"   # brands_ru.json, slogans.txt, slogan_lock.json

[request]
brand = "Ray-Ban"
# brand_local = "Рэй Бэн"
shape = "авиаторы"
lens = "UV400"
collection = "Весна–Лето 2026"
# occasion = "auto"
seo_level = "high"            # low | normal | high
audience = "auto"             # auto | female | male | unisex
tone = "neutral"              # premium | market | social | neutral
uniqueness_strength = 90      # 60..95
brand_in_title = "balanced"   # always | never | balanced
rows = 6
skip_top_rows = 4
wb_safe_mode = true
wb_strict = false

[batch]
input = "template.xlsx"
files = 1
slogan_lock = true
"#;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    pub data_dir: Option<PathBuf>,
    pub request: GenerationRequest,
    #[serde(default)]
    pub batch: BatchConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SeoLevel {
    Low,
    Normal,
    #[default]
    High,
}

impl SeoLevel {
    /// Number of keyword sentences woven into each description.
    pub fn insertions(self) -> usize {
        match self {
            SeoLevel::Low => 1,
            SeoLevel::Normal => 2,
            SeoLevel::High => 3,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Audience {
    #[default]
    #[serde(alias = "Auto")]
    Auto,
    #[serde(alias = "Женские")]
    Female,
    #[serde(alias = "Мужские")]
    Male,
    #[serde(alias = "Унисекс")]
    Unisex,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Premium,
    Market,
    Social,
    #[default]
    Neutral,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BrandInTitle {
    Always,
    Never,
    #[default]
    #[serde(alias = "smart50")]
    Balanced,
}

/// Everything the generators need for one fill operation.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GenerationRequest {
    /// Latin brand, used in descriptions
    pub brand: String,
    /// Localized brand for titles; looked up in the brand map when absent
    #[serde(default)]
    pub brand_local: Option<String>,
    #[serde(default)]
    pub shape: String,
    #[serde(default)]
    pub lens: String,
    #[serde(default)]
    pub collection: String,
    /// Free text, or "auto" to derive it from the calendar
    #[serde(default)]
    pub occasion: Option<String>,
    #[serde(default)]
    pub seo_level: SeoLevel,
    #[serde(default)]
    pub audience: Audience,
    #[serde(default)]
    pub tone: Tone,
    #[serde(default = "default_strength")]
    pub uniqueness_strength: u8,
    #[serde(default)]
    pub brand_in_title: BrandInTitle,
    #[serde(default = "default_rows")]
    pub rows: usize,
    /// Protected header region, never written
    #[serde(default = "default_skip_top_rows")]
    pub skip_top_rows: usize,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
    #[serde(default = "default_true")]
    pub wb_safe_mode: bool,
    #[serde(default)]
    pub wb_strict: bool,
    /// Pins the random sequence. Production runs leave this unset.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl GenerationRequest {
    pub fn new(brand: &str) -> Self {
        Self {
            brand: brand.to_string(),
            brand_local: None,
            shape: String::new(),
            lens: String::new(),
            collection: String::new(),
            occasion: None,
            seo_level: SeoLevel::default(),
            audience: Audience::default(),
            tone: Tone::default(),
            uniqueness_strength: default_strength(),
            brand_in_title: BrandInTitle::default(),
            rows: default_rows(),
            skip_top_rows: default_skip_top_rows(),
            max_attempts: default_max_attempts(),
            wb_safe_mode: true,
            wb_strict: false,
            seed: None,
        }
    }

    pub fn validate(&self) -> Result<(), FillError> {
        if self.brand.trim().is_empty() {
            return Err(FillError::InvalidRequest("brand must not be empty".into()));
        }
        if self.rows == 0 || self.rows > MAX_ROWS {
            return Err(FillError::InvalidRequest(format!(
                "rows must be between 1 and {}, got {}",
                MAX_ROWS, self.rows
            )));
        }
        if self.max_attempts == 0 {
            return Err(FillError::InvalidRequest("max_attempts must be at least 1".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct BatchConfig {
    pub input: Option<PathBuf>,
    /// Defaults to the input's directory
    pub output_dir: Option<PathBuf>,
    #[serde(default = "default_files")]
    pub files: usize,
    #[serde(default = "default_true")]
    pub slogan_lock: bool,
    /// Forget openers used by earlier batches
    #[serde(default)]
    pub reset_lock: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            input: None,
            output_dir: None,
            files: default_files(),
            slogan_lock: true,
            reset_lock: false,
        }
    }
}

impl Config {
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(default_data_dir)
    }
}

pub fn default_data_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    Path::new(&home).join(".copysmith").join("data")
}

fn default_version() -> u32 {
    CONFIG_VERSION
}

fn default_strength() -> u8 {
    90
}

fn default_rows() -> usize {
    6
}

fn default_skip_top_rows() -> usize {
    4
}

fn default_max_attempts() -> usize {
    320
}

fn default_files() -> usize {
    1
}

fn default_true() -> bool {
    true
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content)?;
    if config.version > CONFIG_VERSION {
        bail!(
            "config version {} is newer than supported version {}",
            config.version,
            CONFIG_VERSION
        );
    }
    Ok(config)
}

pub fn load_config(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    parse_config(&content).with_context(|| format!("Invalid config {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_config_parses() {
        let config = parse_config(SAMPLE_CONFIG).unwrap();
        assert_eq!(config.version, CONFIG_VERSION);
        assert_eq!(config.request.brand, "Ray-Ban");
        assert_eq!(config.request.rows, 6);
        assert_eq!(config.request.seo_level, SeoLevel::High);
        assert_eq!(config.batch.files, 1);
        assert!(config.batch.slogan_lock);
        config.request.validate().unwrap();
    }

    #[test]
    fn missing_fields_take_defaults() {
        let config = parse_config("[request]\nbrand = \"Dior\"\n").unwrap();
        let r = &config.request;
        assert_eq!(r.uniqueness_strength, 90);
        assert_eq!(r.brand_in_title, BrandInTitle::Balanced);
        assert_eq!(r.skip_top_rows, 4);
        assert_eq!(r.max_attempts, 320);
        assert!(r.wb_safe_mode);
        assert!(!r.wb_strict);
        assert!(r.seed.is_none());
        assert!(config.batch.input.is_none());
    }

    #[test]
    fn legacy_names_are_accepted() {
        let config = parse_config(
            "[request]\nbrand = \"Dior\"\naudience = \"Женские\"\nbrand_in_title = \"smart50\"\n",
        )
        .unwrap();
        assert_eq!(config.request.audience, Audience::Female);
        assert_eq!(config.request.brand_in_title, BrandInTitle::Balanced);
    }

    #[test]
    fn newer_version_is_rejected() {
        let err = parse_config("version = 99\n[request]\nbrand = \"Dior\"\n").unwrap_err();
        assert!(err.to_string().contains("newer"));
    }

    #[test]
    fn validation_rejects_bad_requests() {
        let mut r = GenerationRequest::new("Dior");
        r.rows = 0;
        assert!(matches!(r.validate(), Err(FillError::InvalidRequest(_))));
        let r = GenerationRequest::new("  ");
        assert!(r.validate().is_err());
        let mut r = GenerationRequest::new("Dior");
        r.max_attempts = 0;
        assert!(r.validate().is_err());
    }
}
