//! Verifier configuration.
//!
//! Configuration is loaded from environment variables and may be overridden
//! on the command line.
//!
//! # Environment Variables
//!
//! - `BTREE_VERIFY_LEAF_CHAIN_CAP`: most leaves the chain may hold before it
//!   is treated as looping; a positive integer or `pages` for the file's page
//!   count (default: `1000`)
//! - `BTREE_VERIFY_CHECK_INTERNAL_ORDER`: also check key order inside
//!   internal nodes (default: `false`)

use std::str::FromStr;

/// Log filter used when `RUST_LOG` is not set. Violations are logged at
/// debug level, so by default they only appear in the report.
pub const DEFAULT_LOG_FILTER: &str = "btree_verify=info";

/// Bound on the length of the leaf chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeafChainCap {
    /// A fixed number of leaves.
    Fixed(usize),
    /// The number of complete pages in the file.
    PageCount,
}

impl LeafChainCap {
    /// Default number of leaves.
    pub const DEFAULT_LEAVES: usize = 1000;

    /// The cap in leaves for a file with `total_pages` pages.
    #[must_use]
    pub fn resolve(self, total_pages: u64) -> usize {
        match self {
            Self::Fixed(leaves) => leaves,
            Self::PageCount => usize::try_from(total_pages).unwrap_or(usize::MAX),
        }
    }
}

impl Default for LeafChainCap {
    fn default() -> Self {
        Self::Fixed(Self::DEFAULT_LEAVES)
    }
}

impl FromStr for LeafChainCap {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("pages") {
            return Ok(Self::PageCount);
        }
        match s.parse::<usize>() {
            Ok(leaves) if leaves > 0 => Ok(Self::Fixed(leaves)),
            _ => Err(ConfigError::InvalidValue {
                name: VerifyConfig::LEAF_CHAIN_CAP_VAR.to_string(),
                message: format!("'{s}' is not a positive integer or 'pages'"),
            }),
        }
    }
}

impl std::fmt::Display for LeafChainCap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fixed(leaves) => write!(f, "{leaves}"),
            Self::PageCount => write!(f, "pages"),
        }
    }
}

/// Settings for one verification run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VerifyConfig {
    pub leaf_chain_cap: LeafChainCap,
    /// Report decreasing keys inside a single internal node.
    pub check_internal_order: bool,
}

/// Error returned when loading configuration fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable has an invalid value.
    InvalidValue { name: String, message: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { name, message } => {
                write!(f, "invalid value for {name}: {message}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl VerifyConfig {
    pub const LEAF_CHAIN_CAP_VAR: &'static str = "BTREE_VERIFY_LEAF_CHAIN_CAP";
    pub const CHECK_INTERNAL_ORDER_VAR: &'static str = "BTREE_VERIFY_CHECK_INTERNAL_ORDER";

    /// Load configuration from environment variables.
    ///
    /// Unset variables take their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let leaf_chain_cap = match lookup(Self::LEAF_CHAIN_CAP_VAR) {
            Some(value) => value.trim().parse()?,
            None => LeafChainCap::default(),
        };
        let check_internal_order = match lookup(Self::CHECK_INTERNAL_ORDER_VAR) {
            Some(value) => parse_bool(Self::CHECK_INTERNAL_ORDER_VAR, value.trim())?,
            None => false,
        };

        Ok(Self {
            leaf_chain_cap,
            check_internal_order,
        })
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            name: name.to_string(),
            message: format!("'{value}' is not a boolean"),
        }),
    }
}
