use anyhow::{Context, Result};
use papercut::codec::WireFormat;
use papercut::SegmentationRule;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Segmentation {
    Speaker,
    SpeakerGap,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub segmentation: Segmentation,
    pub max_gap_seconds: f64,
    pub history_limit: usize,
    pub wire_format: WireFormat,
    pub show_sources: bool,
    pub sources_width: u16,
    pub session_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            segmentation: Segmentation::Speaker,
            max_gap_seconds: papercut::blocks::DEFAULT_MAX_GAP_SECONDS,
            history_limit: 0,
            wire_format: WireFormat::PaperCut,
            show_sources: true,
            sources_width: 40,
            session_file: dirs::data_dir().map(|dir| dir.join("papercut").join("session.json")),
        }
    }
}

impl Config {
    pub fn rule(&self) -> SegmentationRule {
        match self.segmentation {
            Segmentation::Speaker => SegmentationRule::Speaker,
            Segmentation::SpeakerGap => SegmentationRule::SpeakerOrGap {
                max_gap: self.max_gap_seconds,
            },
        }
    }

    pub fn session_path(&self) -> Result<PathBuf> {
        match &self.session_file {
            Some(path) => Ok(path.clone()),
            None => {
                let base = dirs::data_dir().context("Could not determine data directory")?;
                Ok(base.join("papercut").join("session.json"))
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct PartialConfig {
    segmentation: Option<Segmentation>,
    max_gap_seconds: Option<f64>,
    history_limit: Option<usize>,
    wire_format: Option<WireFormat>,
    show_sources: Option<bool>,
    sources_width: Option<u16>,
    session_file: Option<PathBuf>,
}

impl PartialConfig {
    fn apply_defaults(self) -> (Config, bool) {
        let defaults = Config::default();
        let mut changed = false;

        let segmentation = match self.segmentation {
            Some(v) => v,
            None => {
                changed = true;
                defaults.segmentation
            }
        };
        let max_gap_seconds = match self.max_gap_seconds {
            Some(v) if v.is_finite() && v >= 0.0 => v,
            _ => {
                changed = true;
                defaults.max_gap_seconds
            }
        };
        let history_limit = match self.history_limit {
            Some(v) => v,
            None => {
                changed = true;
                defaults.history_limit
            }
        };
        let wire_format = match self.wire_format {
            Some(v) => v,
            None => {
                changed = true;
                defaults.wire_format
            }
        };
        let show_sources = match self.show_sources {
            Some(v) => v,
            None => {
                changed = true;
                defaults.show_sources
            }
        };
        let sources_width = match self.sources_width {
            Some(v) => v,
            None => {
                changed = true;
                defaults.sources_width
            }
        };
        let session_file = match self.session_file {
            Some(v) => Some(v),
            None => {
                changed = true;
                defaults.session_file
            }
        };

        (
            Config {
                segmentation,
                max_gap_seconds,
                history_limit,
                wire_format,
                show_sources,
                sources_width,
                session_file,
            },
            changed,
        )
    }
}

pub fn config_path() -> Result<PathBuf> {
    let base = dirs::config_dir().context("Could not determine config directory")?;
    Ok(base.join("papercut").join("config.toml"))
}

pub fn ensure_config_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    Ok(())
}

pub fn load_config() -> Result<Config> {
    let path = config_path()?;
    if !path.exists() {
        let cfg = Config::default();
        write_config(&cfg)?;
        return Ok(cfg);
    }

    let raw = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let (cfg, changed) = parse_config(&raw)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    if changed {
        write_config(&cfg)?;
    }
    Ok(cfg)
}

fn parse_config(raw: &str) -> Result<(Config, bool)> {
    let partial: PartialConfig = toml::from_str(raw)?;
    Ok(partial.apply_defaults())
}

pub fn write_config(cfg: &Config) -> Result<()> {
    let path = config_path()?;
    ensure_config_dir(&path)?;
    let text = toml::to_string_pretty(cfg).context("Failed to serialize config")?;
    fs::write(&path, text).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

pub fn open_config_in_editor() -> Result<()> {
    let path = config_path()?;
    if !path.exists() {
        let cfg = Config::default();
        write_config(&cfg)?;
    }

    let editor = env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());
    let mut parts = match shell_words::split(&editor) {
        Ok(p) if !p.is_empty() => p,
        _ => vec![editor],
    };
    let cmd = parts.remove(0);
    let status = Command::new(cmd)
        .args(parts)
        .arg(&path)
        .status()
        .with_context(|| format!("Failed to launch editor for {}", path.display()))?;
    if !status.success() {
        anyhow::bail!("Editor exited with status {}", status);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{parse_config, Config, Segmentation};
    use papercut::codec::WireFormat;
    use papercut::SegmentationRule;

    #[test]
    fn fills_missing_keys_and_reports_change() {
        let (cfg, changed) = parse_config("segmentation = \"speaker_gap\"\n").expect("parse");
        assert!(changed);
        assert_eq!(cfg.segmentation, Segmentation::SpeakerGap);
        assert_eq!(cfg.sources_width, 40);
        assert_eq!(cfg.rule(), SegmentationRule::SpeakerOrGap { max_gap: 2.0 });
    }

    #[test]
    fn complete_file_is_unchanged() {
        let mut cfg = Config::default();
        cfg.session_file = Some("/tmp/papercut-session.json".into());
        cfg.wire_format = WireFormat::Compact;
        let text = toml::to_string_pretty(&cfg).expect("serialize");
        let (parsed, changed) = parse_config(&text).expect("parse");
        assert!(!changed);
        assert_eq!(parsed.wire_format, WireFormat::Compact);
        assert_eq!(parsed.rule(), SegmentationRule::Speaker);
    }

    #[test]
    fn rejects_negative_gap() {
        let (cfg, changed) = parse_config("max_gap_seconds = -3.0\n").expect("parse");
        assert!(changed);
        assert_eq!(cfg.max_gap_seconds, 2.0);
        assert!(parse_config("segmentation = \"loud\"\n").is_err());
    }
}
