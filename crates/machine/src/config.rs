//! Machine configuration.
//!
//! Parameterizes the pieces of the machine that vary between deployments:
//! main memory size and access delays, and the control store size. Supplied
//! as JSON or built with [`Config::default`] for the stock machine.

use serde::Deserialize;

/// Baseline hardware constants used when a field is not overridden.
mod defaults {
    /// Main memory size in 16-bit words (4 Ki words, a 12-bit address space).
    pub const MEMORY_WORDS: usize = 4096;

    /// Clock ticks between arming a memory read and its data appearing.
    pub const READ_DELAY: usize = 6;

    /// Clock ticks between arming a memory write and the cell changing.
    pub const WRITE_DELAY: usize = 6;

    /// Control store size in microwords (an 8-bit microaddress space).
    pub const CONTROL_STORE_WORDS: usize = 256;
}

/// Simulator configuration.
///
/// ```
/// use mic1_core::config::Config;
///
/// let config = Config::from_json(r#"{ "read_delay": 2, "write_delay": 2 }"#).unwrap();
/// assert_eq!(config.read_delay, 2);
/// assert_eq!(config.memory_words, 4096);
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Main memory size in 16-bit words.
    #[serde(default = "Config::default_memory_words")]
    pub memory_words: usize,

    /// Clock ticks between arming a memory read and its completion.
    #[serde(default = "Config::default_read_delay")]
    pub read_delay: usize,

    /// Clock ticks between arming a memory write and its completion.
    #[serde(default = "Config::default_write_delay")]
    pub write_delay: usize,

    /// Control store size in microwords.
    #[serde(default = "Config::default_control_store_words")]
    pub control_store_words: usize,
}

impl Config {
    /// Parses a configuration from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns the underlying parse error if the document is not valid JSON
    /// or a field has the wrong type.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    fn default_memory_words() -> usize {
        defaults::MEMORY_WORDS
    }

    fn default_read_delay() -> usize {
        defaults::READ_DELAY
    }

    fn default_write_delay() -> usize {
        defaults::WRITE_DELAY
    }

    fn default_control_store_words() -> usize {
        defaults::CONTROL_STORE_WORDS
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            memory_words: defaults::MEMORY_WORDS,
            read_delay: defaults::READ_DELAY,
            write_delay: defaults::WRITE_DELAY,
            control_store_words: defaults::CONTROL_STORE_WORDS,
        }
    }
}
