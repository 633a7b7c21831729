//! Tunables for allocating and rebalancing keys.

use crate::allocator::DEFAULT_SPACING;
use crate::allocator::DEFAULT_THRESHOLD;
use crate::allocator::KeyAllocator;
use crate::alphabet::Alphabet;

/// Environment variable naming a built-in alphabet.
pub const ENV_ALPHABET: &str = "ORDERKEY_ALPHABET";
/// Environment variable holding the rebalance length threshold.
pub const ENV_THRESHOLD: &str = "ORDERKEY_THRESHOLD";
/// Environment variable holding the rebalance spacing.
pub const ENV_SPACING: &str = "ORDERKEY_SPACING";

/// Settings shared by every collection that uses them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    pub alphabet: Alphabet,
    /// Keys longer than this trigger a rebalance.
    pub threshold: usize,
    /// Numeral steps between neighbors after a rebalance.
    pub spacing: usize,
}

impl Default for Config {
    fn default() -> Config {
        return Config {
            alphabet: Alphabet::LOWERCASE,
            threshold: DEFAULT_THRESHOLD,
            spacing: DEFAULT_SPACING,
        };
    }
}

impl Config {
    /// Read the config from `ORDERKEY_*` environment variables.
    pub fn from_env() -> Config {
        return Config::from_lookup(|name| std::env::var(name).ok());
    }

    /// Build a config from any variable source. Missing variables keep
    /// their defaults; malformed ones are logged and ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Config {
        let mut config = Config::default();

        if let Some(name) = lookup(ENV_ALPHABET) {
            match Alphabet::named(name.trim()) {
                Some(alphabet) => config.alphabet = alphabet,
                None => tracing::warn!(value = %name, "unknown {ENV_ALPHABET}, using lowercase"),
            }
        }
        if let Some(threshold) = parse_positive(&lookup, ENV_THRESHOLD) {
            config.threshold = threshold;
        }
        if let Some(spacing) = parse_positive(&lookup, ENV_SPACING) {
            config.spacing = spacing;
        }

        return config;
    }

    /// Replace zero threshold or spacing with the defaults.
    pub fn normalized(mut self) -> Config {
        if self.threshold == 0 {
            self.threshold = DEFAULT_THRESHOLD;
        }
        if self.spacing == 0 {
            self.spacing = DEFAULT_SPACING;
        }
        return self;
    }

    pub fn allocator(&self) -> KeyAllocator {
        return KeyAllocator::new(self.alphabet);
    }
}

fn parse_positive(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<usize> {
    let raw = lookup(name)?;
    return match raw.trim().parse::<usize>() {
        Ok(value) if value > 0 => Some(value),
        _ => {
            tracing::warn!(
                variable = name,
                value = %raw,
                "ignoring non-positive or malformed value"
            );
            None
        }
    };
}
