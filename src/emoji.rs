use std::fmt;
use std::str::FromStr;

pub mod directory;
pub mod table;

pub use self::directory::{
    EmojiDirectory, EmojiDirectoryCache, EmojiDirectorySource, SystemClock,
};
pub use self::table::{EmojiTable, default_table};

const SKIN_TONE_SEPARATOR: &str = "::";

/// Which side of the relay an emoji token is headed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmojiTarget {
    /// Slack short name, as `reactions.add` expects it.
    Api,
    /// Unicode glyph, as subscribers render it.
    Display,
}

impl FromStr for EmojiTarget {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "api" => Ok(Self::Api),
            "display" => Ok(Self::Display),
            other => Err(format!("unknown emoji target: {other}")),
        }
    }
}

impl fmt::Display for EmojiTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Api => f.write_str("api"),
            Self::Display => f.write_str("display"),
        }
    }
}

/// Normalizes a token against the builtin table.
pub fn normalize(token: &str, target: EmojiTarget) -> String {
    normalize_with(default_table(), token, target)
}

/// Translates between glyphs and Slack names. Never fails: anything the table
/// does not know falls back to itself.
pub fn normalize_with(table: &EmojiTable, token: &str, target: EmojiTarget) -> String {
    let bare = bare_name(token);
    let clean = clean_name(token);

    match target {
        EmojiTarget::Api => {
            if table.is_name(bare) {
                return bare.to_string();
            }
            if let Some(name) = table.name_for(bare) {
                return name.to_string();
            }
            if table.is_name(&clean) {
                return clean;
            }
            table
                .name_for(&clean)
                .map(ToOwned::to_owned)
                .unwrap_or(clean)
        }
        EmojiTarget::Display => {
            if table.name_for(bare).is_some() {
                return bare.to_string();
            }
            table
                .glyph_for(bare)
                .or_else(|| table.glyph_for(&clean))
                .map(ToOwned::to_owned)
                .unwrap_or_else(|| token.to_string())
        }
    }
}

/// Token with colons and any skin-tone modifier removed, but with its
/// disambiguation suffix intact.
pub fn bare_name(token: &str) -> &str {
    let trimmed = token.trim().trim_matches(':');
    let base = trimmed
        .split_once(SKIN_TONE_SEPARATOR)
        .map(|(base, _)| base)
        .unwrap_or(trimmed);
    base.trim_matches(':')
}

/// Lookup key for a Slack name: colons gone, trailing `[0-9_]+` run gone.
/// Names made only of that run (`100`) are kept whole.
pub fn clean_name(token: &str) -> String {
    let bare = bare_name(token);
    let without_colons: String = bare.chars().filter(|c| *c != ':').collect();
    let stripped = without_colons.trim_end_matches(|c: char| c.is_ascii_digit() || c == '_');
    if stripped.is_empty() {
        without_colons
    } else {
        stripped.to_string()
    }
}
