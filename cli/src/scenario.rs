//! Scenario files: a start time plus an ordered list of steps.
//!
//! ```toml
//! start = 1000
//!
//! [[step]]
//! action = "mint"
//! account = "alice"
//! token = "GOV"
//! amount = "1000e18"
//! ```
//!
//! Amounts may be TOML integers or strings. Strings accept a plain decimal
//! number or `<digits>e<exponent>` for values past the TOML integer range.

use std::path::Path;

use anyhow::Context;
use ballot_types::VotingType;
use serde::{Deserialize, Deserializer};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    /// Simulated clock reading before the first step, in seconds.
    #[serde(default)]
    pub start: u64,

    /// Stop at the first failing step instead of recording it and moving on.
    #[serde(default)]
    pub strict: bool,

    #[serde(default, rename = "step")]
    pub steps: Vec<Step>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    SetTime {
        at: u64,
    },
    Advance {
        secs: u64,
    },
    Mint {
        account: String,
        token: String,
        #[serde(deserialize_with = "amount")]
        amount: u128,
    },
    /// Let the engine's custody account pull `amount` from `owner`.
    Approve {
        owner: String,
        token: String,
        #[serde(deserialize_with = "amount")]
        amount: u128,
    },
    Create {
        creator: String,
        title: String,
        #[serde(default)]
        description: String,
        voting_type: VotingType,
        #[serde(default)]
        token: Option<String>,
        #[serde(default, deserialize_with = "amount")]
        min_token_required: u128,
        registration_start: u64,
        registration_end: u64,
        voting_start: u64,
        voting_end: u64,
    },
    Register {
        election: u64,
        candidate: String,
        name: String,
        #[serde(default)]
        description: String,
    },
    Vote {
        election: u64,
        voter: String,
        candidate: String,
        #[serde(default, deserialize_with = "amount")]
        weight: u128,
    },
    Stake {
        voter: String,
        token: String,
        #[serde(deserialize_with = "amount")]
        amount: u128,
    },
    Unstake {
        voter: String,
        token: String,
        #[serde(deserialize_with = "amount")]
        amount: u128,
    },
}

impl Step {
    pub fn action(&self) -> &'static str {
        match self {
            Self::SetTime { .. } => "set_time",
            Self::Advance { .. } => "advance",
            Self::Mint { .. } => "mint",
            Self::Approve { .. } => "approve",
            Self::Create { .. } => "create",
            Self::Register { .. } => "register",
            Self::Vote { .. } => "vote",
            Self::Stake { .. } => "stake",
            Self::Unstake { .. } => "unstake",
        }
    }
}

impl Scenario {
    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        toml::from_str(s).context("invalid scenario")
    }

    pub fn from_toml_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        Self::from_toml_str(&content)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AmountRepr {
    Int(u64),
    Text(String),
}

fn amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
    match AmountRepr::deserialize(deserializer)? {
        AmountRepr::Int(n) => Ok(u128::from(n)),
        AmountRepr::Text(s) => parse_amount(&s).map_err(serde::de::Error::custom),
    }
}

/// Parse `"1500"` or `"15e20"` into an exact integer amount.
pub fn parse_amount(raw: &str) -> Result<u128, String> {
    let raw = raw.trim().replace('_', "");
    let (digits, exponent) = match raw.split_once(|c: char| c == 'e' || c == 'E') {
        Some((digits, exp)) => {
            let exp: u32 = exp
                .parse()
                .map_err(|_| format!("bad exponent in amount '{raw}'"))?;
            (digits, exp)
        }
        None => (raw.as_str(), 0),
    };
    let base: u128 = digits
        .parse()
        .map_err(|_| format!("bad amount '{raw}'"))?;
    10u128
        .checked_pow(exponent)
        .and_then(|scale| base.checked_mul(scale))
        .ok_or_else(|| format!("amount '{raw}' does not fit in 128 bits"))
}
