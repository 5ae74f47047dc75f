//! Sandbox configuration and its file format.

use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::runner::plugin::types::DEFAULT_MAX_CALL_DEPTH;

/// Message shown when a snippet completes without printing anything.
pub const NO_OUTPUT_MESSAGE: &str = "Code executed successfully (no output)";

/// Message shown when a snippet throws something that is not an `Error`.
pub const ERROR_FALLBACK_MESSAGE: &str = "An error occurred";

/// Default stack for the evaluation thread.
pub const DEFAULT_STACK_SIZE: usize = 256 * 1024 * 1024;

/// Problems reading a sandbox config file.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    /// A line that is neither a section header, a comment nor `key = value`.
    Syntax { line: usize, text: String },
    UnknownKey { line: usize, key: String },
    InvalidValue { line: usize, key: String, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "Failed to read config file: {}", e),
            ConfigError::Syntax { line, text } => write!(f, "line {}: cannot parse '{}'", line, text),
            ConfigError::UnknownKey { line, key } => write!(f, "line {}: unknown key '{}'", line, key),
            ConfigError::InvalidValue { line, key, value } => {
                write!(f, "line {}: invalid value '{}' for '{}'", line, value, key)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

/// Settings shared by every widget an engine serves.
#[derive(Debug, Clone, PartialEq)]
pub struct SandboxConfig {
    /// Success message when nothing was printed.
    pub no_output_message: String,
    /// Failure message for thrown values that are not `Error` instances.
    pub error_fallback_message: String,
    /// Pause between the run trigger and evaluation. Purely cosmetic.
    pub run_delay: Duration,
    /// Nested calls allowed before `RangeError: Maximum call stack size exceeded`.
    pub max_call_depth: usize,
    /// Stack size of the evaluation thread, in bytes.
    pub stack_size: usize,
    /// Fixed seed for `Math.random`; a fresh seed per run when `None`.
    pub random_seed: Option<u64>,
    /// Fixed wall-clock start for `Date`, in ms since the epoch; the real time when `None`.
    pub start_time_ms: Option<f64>,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        SandboxConfig {
            no_output_message: NO_OUTPUT_MESSAGE.to_string(),
            error_fallback_message: ERROR_FALLBACK_MESSAGE.to_string(),
            run_delay: Duration::from_millis(0),
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            stack_size: DEFAULT_STACK_SIZE,
            random_seed: None,
            start_time_ms: None,
        }
    }
}

impl SandboxConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_no_output_message(mut self, message: impl Into<String>) -> Self {
        self.no_output_message = message.into();
        self
    }

    pub fn with_error_fallback_message(mut self, message: impl Into<String>) -> Self {
        self.error_fallback_message = message.into();
        self
    }

    pub fn with_run_delay(mut self, delay: Duration) -> Self {
        self.run_delay = delay;
        self
    }

    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    pub fn with_stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = bytes;
        self
    }

    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    pub fn with_start_time_ms(mut self, ms: f64) -> Self {
        self.start_time_ms = Some(ms);
        self
    }

    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration text.
    ///
    /// Expected format:
    /// ```toml
    /// [sandbox]
    /// no_output_message = "Done, nothing printed"
    /// error_fallback_message = "Something went wrong"
    /// run_delay_ms = 300
    /// max_call_depth = 500
    /// stack_size = 67108864
    /// random_seed = 42
    /// start_time_ms = 1705708800000
    /// ```
    ///
    /// Keys outside `[sandbox]` are ignored. Keys missing from the file keep
    /// their defaults.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let mut config = SandboxConfig::default();
        let mut current_section = String::new();

        for (index, raw) in content.lines().enumerate() {
            let line_no = index + 1;
            let line = raw.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if line.starts_with('[') && line.ends_with(']') {
                current_section = line[1..line.len() - 1].trim().to_string();
                continue;
            }

            let (key, value) = match line.split_once('=') {
                Some((k, v)) => (k.trim(), strip_comment(v.trim())),
                None => {
                    return Err(ConfigError::Syntax {
                        line: line_no,
                        text: line.to_string(),
                    })
                }
            };

            if current_section != "sandbox" {
                continue;
            }

            let invalid = || ConfigError::InvalidValue {
                line: line_no,
                key: key.to_string(),
                value: value.to_string(),
            };

            match key {
                "no_output_message" => {
                    config.no_output_message = parse_string(value).ok_or_else(invalid)?;
                }
                "error_fallback_message" => {
                    config.error_fallback_message = parse_string(value).ok_or_else(invalid)?;
                }
                "run_delay_ms" => {
                    config.run_delay = Duration::from_millis(value.parse().map_err(|_| invalid())?);
                }
                "max_call_depth" => {
                    config.max_call_depth = value.parse().map_err(|_| invalid())?;
                }
                "stack_size" => {
                    config.stack_size = value.parse().map_err(|_| invalid())?;
                }
                "random_seed" => {
                    config.random_seed = Some(value.parse().map_err(|_| invalid())?);
                }
                "start_time_ms" => {
                    config.start_time_ms = Some(value.parse().map_err(|_| invalid())?);
                }
                _ => {
                    return Err(ConfigError::UnknownKey {
                        line: line_no,
                        key: key.to_string(),
                    })
                }
            }
        }

        Ok(config)
    }
}

/// Drops a trailing `# comment` that sits outside quotes.
fn strip_comment(value: &str) -> &str {
    let mut in_quotes = false;
    let mut escaped = false;
    for (i, c) in value.char_indices() {
        match c {
            '\\' if in_quotes && !escaped => {
                escaped = true;
                continue;
            }
            '"' if !escaped => in_quotes = !in_quotes,
            '#' if !in_quotes => return value[..i].trim_end(),
            _ => {}
        }
        escaped = false;
    }
    value
}

/// A double-quoted string with `\"`, `\\`, `\n` and `\t` escapes.
fn parse_string(value: &str) -> Option<String> {
    let inner = value.strip_prefix('"')?.strip_suffix('"')?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next()? {
                'n' => out.push('\n'),
                't' => out.push('\t'),
                '"' => out.push('"'),
                '\\' => out.push('\\'),
                _ => return None,
            }
        } else if c == '"' {
            return None;
        } else {
            out.push(c);
        }
    }
    Some(out)
}
