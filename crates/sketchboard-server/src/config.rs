//! Server configuration parsed from environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use sketchboard_core::canvas::{DEFAULT_CANVAS_HEIGHT, DEFAULT_CANVAS_WIDTH};

pub const DEFAULT_STATIC_DIR: &str = "public";
pub const DEFAULT_BODY_LIMIT: usize = 10 * 1024 * 1024;
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub static_dir: PathBuf,
    /// Font file for text shapes; system fonts are probed when absent.
    pub font: Option<PathBuf>,
    pub body_limit: usize,
    pub canvas_width: f64,
    pub canvas_height: f64,
    pub fetch_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
            font: None,
            body_limit: DEFAULT_BODY_LIMIT,
            canvas_width: DEFAULT_CANVAS_WIDTH,
            canvas_height: DEFAULT_CANVAS_HEIGHT,
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
        }
    }
}

impl ServerConfig {
    /// Build typed config from environment variables.
    ///
    /// Optional:
    /// - `SKETCHBOARD_ADDR`: listen address, default `0.0.0.0:3000`
    /// - `SKETCHBOARD_STATIC_DIR`: browser client directory, default `public`
    /// - `SKETCHBOARD_FONT`: TTF/OTF used for text shapes
    /// - `SKETCHBOARD_BODY_LIMIT`: request body limit in bytes, default 10 MiB
    /// - `SKETCHBOARD_CANVAS_WIDTH` / `SKETCHBOARD_CANVAS_HEIGHT`: default 800 x 500
    /// - `SKETCHBOARD_FETCH_TIMEOUT_SECS`: remote image fetch timeout, default 10
    ///
    /// Malformed values fall back to the default with a warning.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let canvas_width = parse_or(&lookup, "SKETCHBOARD_CANVAS_WIDTH", defaults.canvas_width);
        let canvas_height = parse_or(&lookup, "SKETCHBOARD_CANVAS_HEIGHT", defaults.canvas_height);
        let valid_dim = |v: f64| v.is_finite() && v > 0.0;
        let (canvas_width, canvas_height) = if valid_dim(canvas_width) && valid_dim(canvas_height) {
            (canvas_width, canvas_height)
        } else {
            tracing::warn!(canvas_width, canvas_height, "Invalid canvas size, using default");
            (defaults.canvas_width, defaults.canvas_height)
        };

        Self {
            addr: parse_or(&lookup, "SKETCHBOARD_ADDR", defaults.addr),
            static_dir: non_empty("SKETCHBOARD_STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.static_dir),
            font: non_empty("SKETCHBOARD_FONT").map(PathBuf::from),
            body_limit: parse_or(&lookup, "SKETCHBOARD_BODY_LIMIT", defaults.body_limit),
            canvas_width,
            canvas_height,
            fetch_timeout: Duration::from_secs(parse_or(
                &lookup,
                "SKETCHBOARD_FETCH_TIMEOUT_SECS",
                DEFAULT_FETCH_TIMEOUT_SECS,
            )),
        }
    }
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse::<T>().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "Malformed environment value, using default");
            default
        }),
    }
}
