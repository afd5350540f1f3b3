//! Affiliate brands and the keyword rules used to recognize them in messages.
//!
//! Rules are built once at startup and never mutated. Order matters: the detector
//! walks them in declaration order and the first match wins.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Affiliate brand identifier. Serialized lowercase (`"thrill"`, `"shuffle"`, `"goated"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrandId {
    Thrill,
    Shuffle,
    Goated,
}

impl BrandId {
    /// All brands in declaration order.
    pub const ALL: [BrandId; 3] = [BrandId::Thrill, BrandId::Shuffle, BrandId::Goated];

    pub fn as_str(self) -> &'static str {
        match self {
            BrandId::Thrill => "thrill",
            BrandId::Shuffle => "shuffle",
            BrandId::Goated => "goated",
        }
    }

    /// Env variable holding this brand's Discord webhook URL.
    pub fn webhook_env_var(self) -> &'static str {
        match self {
            BrandId::Thrill => "DISCORD_WEBHOOK_THRILL",
            BrandId::Shuffle => "DISCORD_WEBHOOK_SHUFFLE",
            BrandId::Goated => "DISCORD_WEBHOOK_GOATED",
        }
    }
}

impl fmt::Display for BrandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keyword rule for one brand, plus how its notifications look.
#[derive(Debug, Clone)]
pub struct BrandRule {
    pub brand: BrandId,
    /// Lowercase keywords; matched as case-insensitive substrings.
    pub keywords: Vec<String>,
    pub display_name: String,
    /// Embed color as 0xRRGGBB.
    pub color: u32,
    pub icon: String,
}

impl BrandRule {
    pub fn new(
        brand: BrandId,
        keywords: &[&str],
        display_name: &str,
        color: u32,
        icon: &str,
    ) -> Self {
        Self {
            brand,
            keywords: keywords.iter().map(|k| k.trim().to_lowercase()).collect(),
            display_name: display_name.to_string(),
            color,
            icon: icon.to_string(),
        }
    }

    /// True if any non-empty keyword occurs in `lowered` (already lowercased text).
    pub(crate) fn matches_lowered(&self, lowered: &str) -> bool {
        self.keywords
            .iter()
            .any(|k| !k.is_empty() && lowered.contains(k.as_str()))
    }
}

/// Built-in rule set, in detection order.
pub fn default_rules() -> Vec<BrandRule> {
    vec![
        BrandRule::new(
            BrandId::Thrill,
            &["thrill", "portervip", "playthrill"],
            "Thrill Codes",
            0x00FF7F,
            "🎰",
        ),
        BrandRule::new(
            BrandId::Shuffle,
            &["shuffle", "playshuffle", "playshuffleus"],
            "Shuffle Codes",
            0x7717FF,
            "🎲",
        ),
        BrandRule::new(
            BrandId::Goated,
            &["goated", "playgoated", "discord"],
            "Goated Codes",
            0xFF6B35,
            "🐐",
        ),
    ]
}

/// Look up the rule for a brand.
pub fn rule_for(rules: &[BrandRule], brand: BrandId) -> Option<&BrandRule> {
    rules.iter().find(|r| r.brand == brand)
}
