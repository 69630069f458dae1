use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::{env, fs, io};

use serde::Deserialize;

use crate::text_utils::WORDS_PER_MINUTE;

fn default_words_per_minute() -> usize {
    WORDS_PER_MINUTE
}

#[derive(Deserialize, Debug)]
pub struct Render {
    #[serde(default = "default_words_per_minute")]
    pub words_per_minute: usize,
    pub media_base_url: Option<String>,
    pub signed_url_ttl_secs: Option<i64>,
    pub template_path: Option<PathBuf>,
}

impl Default for Render {
    fn default() -> Self {
        Render {
            words_per_minute: WORDS_PER_MINUTE,
            media_base_url: None,
            signed_url_ttl_secs: None,
            template_path: None,
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct Log {
    pub level: LogLevel,
    pub log_to_console: bool,
    pub location: Option<PathBuf>,
}

#[derive(Deserialize, Copy, Clone, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Critical = 0,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Deserialize, Debug, Default)]
pub struct Config {
    #[serde(default)]
    pub render: Render,
    pub log: Option<Log>,
}

fn parse_path(path: PathBuf) -> io::Result<PathBuf> {
    let Some(str_path) = path.to_str() else {
        return Ok(path);
    };
    if !str_path.starts_with("${exe_dir}") {
        return Ok(path);
    }

    let cur_exe = env::current_exe()?;
    let exe_dir = cur_exe.parent().and_then(Path::to_str).ok_or_else(|| {
        io::Error::new(ErrorKind::NotFound, "Could not find the executable directory")
    })?;
    Ok(PathBuf::from(str_path.replace("${exe_dir}", exe_dir)))
}

pub fn parse_config(cfg_content: &str) -> io::Result<Config> {
    let mut cfg: Config = match toml::from_str::<Config>(cfg_content) {
        Ok(cfg) => cfg,
        Err(e) => return Err(io::Error::new(
            ErrorKind::InvalidData, format!("Error parsing configuration file: {}", e))),
    };

    if cfg.render.words_per_minute == 0 {
        return Err(io::Error::new(ErrorKind::InvalidData, "render.words_per_minute must be positive"));
    }

    if let Some(path) = cfg.render.template_path.take() {
        cfg.render.template_path = Some(parse_path(path)?);
    }
    if let Some(log) = cfg.log.as_mut() {
        if let Some(location) = log.location.take() {
            log.location = Some(parse_path(location)?);
        }
    }

    Ok(cfg)
}

pub fn read_config(cfg_path: &PathBuf) -> io::Result<Config> {
    let cfg_content = match fs::read_to_string(cfg_path) {
        Ok(content) => content,
        Err(e) => return Err(io::Error::new(e.kind(), format!("Error opening configuration file {}: {}", cfg_path.display(), e))),
    };

    parse_config(&cfg_content)
}
