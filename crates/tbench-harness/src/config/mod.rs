use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tbench_common::ProcessRole;

pub mod validation;

/// Launch plan shipped with the harness.
const BUILTIN_PLAN: &str = include_str!("../../../../configs/launch-plan.yaml");

/// Top-level configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchConfig {
    #[serde(default)]
    pub benchmark: BenchmarkOptions,
    pub launches: Vec<LaunchDescriptor>,
}

/// Run options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkOptions {
    /// Working directory of the processes under test; new `*.log` files
    /// are collected from here.
    #[serde(default = "default_project_root")]
    pub project_root: PathBuf,

    #[serde(default = "default_measurement_duration", with = "duration_serde")]
    pub measurement_duration: Duration,

    #[serde(default = "default_warmup", with = "duration_serde")]
    pub warmup: Duration,

    #[serde(default = "default_sample_interval", with = "duration_serde")]
    pub sample_interval: Duration,

    #[serde(default = "default_shutdown_timeout", with = "duration_serde")]
    pub shutdown_timeout: Duration,

    #[serde(default = "default_startup_grace", with = "duration_serde")]
    pub startup_grace: Duration,

    #[serde(default = "default_top_latency_tags")]
    pub top_latency_tags: usize,

    /// Build script, relative to the project root.
    #[serde(default = "default_build_script")]
    pub build_script: PathBuf,

    /// Results directory override. Defaults to a timestamped directory
    /// under `<project_root>/perf-results`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results_dir: Option<PathBuf>,

    #[serde(default)]
    pub skip_build: bool,
}

impl Default for BenchmarkOptions {
    fn default() -> Self {
        Self {
            project_root: default_project_root(),
            measurement_duration: default_measurement_duration(),
            warmup: default_warmup(),
            sample_interval: default_sample_interval(),
            shutdown_timeout: default_shutdown_timeout(),
            startup_grace: default_startup_grace(),
            top_latency_tags: default_top_latency_tags(),
            build_script: default_build_script(),
            results_dir: None,
            skip_build: false,
        }
    }
}

/// One process to launch, in plan order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LaunchDescriptor {
    pub label: String,
    pub role: ProcessRole,
    /// Program first, then its positional arguments.
    pub command: Vec<String>,
    /// Pause after this process is confirmed alive.
    #[serde(default, with = "duration_serde")]
    pub delay: Duration,
}

impl BenchConfig {
    /// Load configuration from a YAML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        Self::load_from_string(&content)
    }

    /// Load configuration from a YAML string
    pub fn load_from_string(content: &str) -> Result<Self> {
        let config: BenchConfig = serde_yaml::from_str(content)
            .context("Failed to parse YAML configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// The built-in plan: the exchange followed by five trading clients.
    pub fn builtin() -> Result<Self> {
        Self::load_from_string(BUILTIN_PLAN).context("Built-in launch plan is invalid")
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }
}

// Default value functions
fn default_project_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_measurement_duration() -> Duration {
    Duration::from_secs(120)
}

fn default_warmup() -> Duration {
    Duration::from_secs(10)
}

fn default_sample_interval() -> Duration {
    Duration::from_millis(500)
}

fn default_shutdown_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_startup_grace() -> Duration {
    Duration::from_secs(1)
}

fn default_top_latency_tags() -> usize {
    tbench_report::DEFAULT_TOP_LATENCY_TAGS
}

fn default_build_script() -> PathBuf {
    PathBuf::from("scripts/build.sh")
}

// Custom serialization for Duration
pub mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if duration.subsec_nanos() == 0 {
            serializer.serialize_str(&format!("{}s", duration.as_secs()))
        } else {
            serializer.serialize_str(&format!("{}ms", duration.as_millis()))
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_duration(&s).map_err(serde::de::Error::custom)
    }

    /// Parse `<number><unit>` with unit `ms`, `s` or `m`. Fractional values
    /// are allowed.
    pub fn parse_duration(s: &str) -> Result<Duration, String> {
        let s = s.trim();
        // Check for "ms" BEFORE "s" since "ms" ends with 's'
        let (num_str, unit_nanos) = if let Some(num) = s.strip_suffix("ms") {
            (num, 1e6)
        } else if let Some(num) = s.strip_suffix('s') {
            (num, 1e9)
        } else if let Some(num) = s.strip_suffix('m') {
            (num, 60e9)
        } else {
            return Err(format!("Duration must end with 's', 'ms', or 'm': {}", s));
        };

        let value: f64 = num_str.trim().parse().map_err(|_| format!("Invalid duration: {}", s))?;
        from_nanos_f64(value * unit_nanos).ok_or_else(|| format!("Invalid duration: {}", s))
    }

    /// Duration of `secs` seconds, rounded to the nanosecond.
    pub fn from_secs(secs: f64) -> Result<Duration, String> {
        from_nanos_f64(secs * 1e9).ok_or_else(|| format!("Invalid duration: {}s", secs))
    }

    fn from_nanos_f64(nanos: f64) -> Option<Duration> {
        let nanos = nanos.round();
        if nanos.is_finite() && nanos >= 0.0 && nanos <= u64::MAX as f64 {
            Some(Duration::from_nanos(nanos as u64))
        } else {
            None
        }
    }
}
