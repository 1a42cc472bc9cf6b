//! Configuration management for songsmith

use crate::error::ConfigError;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use songsmith_api::PollConfig;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Values shipped in example `.env` files; treated as "not configured"
const PLACEHOLDER_KEYS: [&str; 2] = ["your_sonauto_api_key", "your_lemonslice_api_key"];

const DEFAULT_CHARACTER: &str = "https://6ammc3n5zzf5ljnz.public.blob.vercel-storage.com/actor_previews/actor_preview_sophia-eBMR0dI7joEpZ542diXv7kib5AEJwz";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub paths: PathsConfig,
    pub output: OutputConfig,
    pub http: HttpConfig,
    pub polling: PollingConfig,
    pub sonauto: SonautoConfig,
    pub lemonslice: LemonSliceConfig,
    pub transition: TransitionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Path to yt-dlp binary (auto-detected if not set)
    pub yt_dlp: Option<PathBuf>,
    /// Path to FFmpeg binary (auto-detected if not set)
    pub ffmpeg: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory for files named by songsmith
    pub directory: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout; inpaint uploads can be tens of megabytes
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Delay between status checks; fractions allowed
    pub interval_secs: f64,
    pub song_timeout_secs: u64,
    pub video_timeout_secs: u64,
    pub max_transient_errors: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SonautoConfig {
    pub base_url: String,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LemonSliceConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    /// Output height in pixels
    pub resolution: String,
    pub expressiveness: f32,
    pub crop_head: bool,
    pub whole_body_mode: bool,
    /// Character image URL per occasion; `default` is the fallback
    pub character_images: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionConfig {
    /// Seconds kept from each song
    pub song_duration_secs: f64,
    /// Seconds of silence handed to the inpainter
    pub silence_secs: f64,
    /// Upload size above which the splice is reduced to mono 128k
    pub max_upload_mb: f64,
}

impl Default for Config {
    fn default() -> Self {
        let character_images = [("birthday", DEFAULT_CHARACTER), ("default", DEFAULT_CHARACTER)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        Self {
            paths: PathsConfig {
                yt_dlp: None,
                ffmpeg: None,
            },
            output: OutputConfig {
                directory: PathBuf::from("."),
            },
            http: HttpConfig { timeout_secs: 300 },
            polling: PollingConfig {
                interval_secs: 5.0,
                song_timeout_secs: 600,
                video_timeout_secs: 900,
                max_transient_errors: 3,
            },
            sonauto: SonautoConfig {
                base_url: songsmith_api::sonauto::DEFAULT_BASE_URL.to_string(),
                api_key: None,
            },
            lemonslice: LemonSliceConfig {
                base_url: songsmith_api::lemonslice::DEFAULT_BASE_URL.to_string(),
                api_key: None,
                resolution: "320".to_string(),
                expressiveness: 1.0,
                crop_head: false,
                whole_body_mode: true,
                character_images,
            },
            transition: TransitionConfig {
                song_duration_secs: 45.0,
                silence_secs: 5.0,
                max_upload_mb: 35.0,
            },
        }
    }
}

impl Config {
    /// Load configuration from defaults, config files and environment
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        // Load from default config directory
        if let Some(config_dir) = dirs::config_dir() {
            let default_config = config_dir.join("songsmith/config.toml");
            if default_config.exists() {
                figment = figment.merge(Toml::file(&default_config));
            }
        }

        // Load from specified config file
        if let Some(path) = config_file {
            if !path.exists() {
                return Err(ConfigError::LoadError(format!(
                    "config file {} does not exist",
                    path.display()
                )));
            }
            figment = figment.merge(Toml::file(path));
        }

        // Conventional key variables, then SONGSMITH_SECTION__KEY overrides
        figment = figment
            .merge(
                Env::raw()
                    .only(&["SONAUTO_API_KEY"])
                    .map(|_| "sonauto.api_key".into()),
            )
            .merge(
                Env::raw()
                    .only(&["LEMON_SLICE_API_KEY"])
                    .map(|_| "lemonslice.api_key".into()),
            )
            .merge(Env::prefixed("SONGSMITH_").split("__"));

        let config: Config = figment
            .extract()
            .map_err(|e| ConfigError::LoadError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let interval = self.polling.interval_secs;
        if !interval.is_finite() || interval <= 0.0 {
            return Err(ConfigError::InvalidValue(format!(
                "polling.interval_secs must be a positive number, got {}",
                interval
            )));
        }
        if Duration::try_from_secs_f64(interval).is_err() {
            return Err(ConfigError::InvalidValue(format!(
                "polling.interval_secs {} is out of range",
                interval
            )));
        }
        if self.transition.max_upload_mb <= 0.0 {
            return Err(ConfigError::InvalidValue(
                "transition.max_upload_mb must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn sonauto_api_key(&self) -> Result<&str, ConfigError> {
        usable_key(self.sonauto.api_key.as_deref()).ok_or(ConfigError::MissingApiKey {
            service: "Sonauto",
            env: "SONAUTO_API_KEY",
        })
    }

    pub fn lemonslice_api_key(&self) -> Result<&str, ConfigError> {
        usable_key(self.lemonslice.api_key.as_deref()).ok_or(ConfigError::MissingApiKey {
            service: "Lemon Slice",
            env: "LEMON_SLICE_API_KEY",
        })
    }

    /// Get yt-dlp path, auto-detecting if not configured
    pub fn yt_dlp_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(ref path) = self.paths.yt_dlp {
            Ok(path.clone())
        } else {
            which::which("yt-dlp")
                .map_err(|_| ConfigError::InvalidValue("yt-dlp not found in PATH".to_string()))
        }
    }

    /// Get FFmpeg path, auto-detecting if not configured
    pub fn ffmpeg_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(ref path) = self.paths.ffmpeg {
            Ok(path.clone())
        } else {
            which::which("ffmpeg")
                .map_err(|_| ConfigError::InvalidValue("ffmpeg not found in PATH".to_string()))
        }
    }

    /// Poll cadence for song and inpaint jobs
    pub fn poll_config(&self) -> PollConfig {
        PollConfig {
            interval: Duration::try_from_secs_f64(self.polling.interval_secs)
                .unwrap_or_else(|_| PollConfig::default().interval),
            timeout: Duration::from_secs(self.polling.song_timeout_secs),
            max_transient_errors: self.polling.max_transient_errors,
        }
    }

    pub fn video_timeout(&self) -> Duration {
        Duration::from_secs(self.polling.video_timeout_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_secs)
    }

    /// Character image for an occasion, falling back to the `default` entry
    pub fn character_image(&self, occasion: &str) -> Option<&str> {
        let images = &self.lemonslice.character_images;
        images
            .get(&occasion.trim().to_lowercase())
            .or_else(|| images.get("default"))
            .map(String::as_str)
    }

    /// Copy safe to print: API keys are masked
    pub fn redacted(&self) -> Config {
        let mut copy = self.clone();
        for key in [&mut copy.sonauto.api_key, &mut copy.lemonslice.api_key] {
            if let Some(k) = key.as_mut() {
                *k = mask(k);
            }
        }
        copy
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::InvalidValue(e.to_string()))
    }
}

fn usable_key(key: Option<&str>) -> Option<&str> {
    key.map(str::trim)
        .filter(|k| !k.is_empty() && !PLACEHOLDER_KEYS.contains(&k))
}

fn mask(key: &str) -> String {
    let visible: String = key.chars().take(4).collect();
    if key.chars().count() <= 8 {
        "********".to_string()
    } else {
        format!("{}********", visible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.polling.interval_secs, 5.0);
        assert_eq!(config.transition.song_duration_secs, 45.0);
        assert_eq!(config.sonauto.base_url, "https://api.sonauto.ai/v1");
        assert_eq!(config.poll_config().timeout, Duration::from_secs(600));
        assert_eq!(config.video_timeout(), Duration::from_secs(900));
    }

    #[test]
    fn test_file_and_env_layering() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "songsmith.toml",
                r#"
                [transition]
                silence_secs = 20.0

                [sonauto]
                api_key = "from-file"
                "#,
            )?;
            jail.set_env("SONAUTO_API_KEY", "from-env");
            jail.set_env("LEMON_SLICE_API_KEY", "lemon-env");
            jail.set_env("SONGSMITH_POLLING__INTERVAL_SECS", "2");

            let config = Config::load(Some(Path::new("songsmith.toml"))).map_err(|e| e.to_string())?;

            assert_eq!(config.transition.silence_secs, 20.0);
            assert_eq!(config.transition.song_duration_secs, 45.0);
            assert_eq!(config.polling.interval_secs, 2.0);
            assert_eq!(config.sonauto_api_key().map_err(|e| e.to_string())?, "from-env");
            assert_eq!(config.lemonslice_api_key().map_err(|e| e.to_string())?, "lemon-env");
            Ok(())
        });
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let err = Config::load(Some(Path::new("/definitely/not/here/songsmith.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::LoadError(_)));
    }

    #[test]
    fn test_rejects_non_positive_interval() {
        let mut config = Config::default();
        config.polling.interval_secs = 0.0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue(_))));

        config.polling.interval_secs = 0.25;
        assert!(config.validate().is_ok());
        assert_eq!(config.poll_config().interval, Duration::from_millis(250));

        config.polling.interval_secs = 1e20;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue(_))));
        assert_eq!(config.poll_config().interval, Duration::from_secs(5));

        config.polling.interval_secs = 1e18;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_placeholder_key_counts_as_missing() {
        let mut config = Config::default();
        config.sonauto.api_key = Some("your_sonauto_api_key".to_string());
        config.lemonslice.api_key = Some("   ".to_string());

        let err = config.sonauto_api_key().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Sonauto API key missing. Set SONAUTO_API_KEY in the environment or a .env file"
        );
        assert!(config.lemonslice_api_key().is_err());

        config.sonauto.api_key = Some(" sk-real ".to_string());
        assert_eq!(config.sonauto_api_key().unwrap(), "sk-real");
    }

    #[test]
    fn test_character_image_lookup() {
        let mut config = Config::default();
        config
            .lemonslice
            .character_images
            .insert("graduation".to_string(), "https://img/grad.png".to_string());

        assert_eq!(config.character_image("Graduation"), Some("https://img/grad.png"));
        assert_eq!(config.character_image("anniversary"), Some(DEFAULT_CHARACTER));

        config.lemonslice.character_images.clear();
        assert_eq!(config.character_image("birthday"), None);
    }

    #[test]
    fn test_redacted_masks_keys() {
        let mut config = Config::default();
        config.sonauto.api_key = Some("sk-live-1234567890".to_string());
        config.lemonslice.api_key = Some("short".to_string());

        let shown = config.redacted();
        assert_eq!(shown.sonauto.api_key.as_deref(), Some("sk-l********"));
        assert_eq!(shown.lemonslice.api_key.as_deref(), Some("********"));
        assert!(shown.to_toml().unwrap().contains("sk-l********"));
        assert_eq!(config.sonauto.api_key.as_deref(), Some("sk-live-1234567890"));
    }
}
