pub mod api;
pub mod capture;
pub mod chat;
pub mod codec;
pub mod forms;
pub mod pipeline;
pub mod sink;
pub mod weight;
pub mod workout;

use std::path::Path;
use std::time::Duration;

use capture::frame::PixelFormat;
use serde::{Deserialize, Serialize};

/// Prefix for environment overrides, e.g. `FITBUDDY__PIPELINE__MIN_INTERVAL_MS=500`.
pub const ENV_PREFIX: &str = "FITBUDDY";

/// System configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub capture: CaptureConfig,
    pub pipeline: PipelineConfig,
    pub api: ApiConfig,
    pub chat: ApiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Device path for V4L2 capture. Empty selects the synthetic pattern source.
    pub device: String,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub format: PixelFormat,
    /// Frame slots shared between capture and processing
    pub buffer_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Minimum spacing between accepted samples
    pub min_interval_ms: u64,
    /// JPEG quality for the raw frame → JPEG step
    pub capture_quality: u8,
    /// JPEG quality for the re-compression before upload
    pub upload_quality: u8,
    /// Cap on concurrent analysis requests. Unset means unbounded.
    pub max_in_flight: Option<usize>,
    /// Depth of the capture → sampler channel
    pub frame_queue: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub connect_timeout_ms: u64,
    /// Per-read timeout
    pub read_timeout_ms: Option<u64>,
    /// Whole-call timeout. Unset lets a call run as long as reads keep arriving.
    pub request_timeout_ms: Option<u64>,
}

impl PipelineConfig {
    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }
}

impl ApiConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout_ms.map(Duration::from_millis)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capture: CaptureConfig {
                device: String::new(),
                width: 640,
                height: 480,
                fps: 30,
                format: PixelFormat::I420,
                buffer_count: 4,
            },
            pipeline: PipelineConfig {
                min_interval_ms: 700,
                capture_quality: 75,
                upload_quality: 80,
                max_in_flight: None,
                frame_queue: 1,
            },
            api: ApiConfig {
                base_url: "http://127.0.0.1:8000".into(),
                connect_timeout_ms: 10_000,
                read_timeout_ms: Some(10_000),
                request_timeout_ms: None,
            },
            // Generative replies can take minutes
            chat: ApiConfig {
                base_url: "http://127.0.0.1:8000".into(),
                connect_timeout_ms: 60_000,
                read_timeout_ms: Some(300_000),
                request_timeout_ms: Some(300_000),
            },
        }
    }
}

impl Config {
    /// Load configuration: built-in defaults, then an optional TOML file, then
    /// `FITBUDDY__*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self, ::config::ConfigError> {
        let mut builder = ::config::Config::builder()
            .add_source(::config::Config::try_from(&Config::default())?);

        if let Some(path) = path {
            builder = builder.add_source(
                ::config::File::from(path)
                    .format(::config::FileFormat::Toml)
                    .required(true),
            );
        }

        builder
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_sampling_contract() {
        let config = Config::default();
        assert_eq!(config.pipeline.min_interval(), Duration::from_millis(700));
        assert_eq!(config.pipeline.capture_quality, 75);
        assert_eq!(config.pipeline.upload_quality, 80);
        assert!(config.pipeline.max_in_flight.is_none());
        assert_eq!(config.chat.connect_timeout(), Duration::from_secs(60));
        assert_eq!(config.chat.read_timeout(), Some(Duration::from_secs(300)));
        assert_eq!(config.chat.request_timeout(), Some(Duration::from_secs(300)));
        assert_eq!(config.api.connect_timeout(), Duration::from_secs(10));
        assert_eq!(config.api.read_timeout(), Some(Duration::from_secs(10)));
        assert_eq!(config.api.request_timeout(), None);
    }

    #[test]
    fn toml_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[pipeline]\nmin_interval_ms = 250\nmax_in_flight = 2\n\n[api]\nbase_url = \"http://backend:9000\""
        )
        .unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.pipeline.min_interval_ms, 250);
        assert_eq!(config.pipeline.max_in_flight, Some(2));
        assert_eq!(config.api.base_url, "http://backend:9000");
        // Untouched keys keep their defaults
        assert_eq!(config.pipeline.upload_quality, 80);
        assert_eq!(config.api.request_timeout_ms, None);
        assert_eq!(config.capture.width, 640);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(Config::load(Some(Path::new("/nonexistent/fitbuddy.toml"))).is_err());
    }
}
