use std::collections::HashMap;

use once_cell::sync::Lazy;
use thiserror::Error;

const VARIATION_SELECTOR: char = '\u{FE0F}';

/// Glyph and Slack short name, one row per glyph. The first name listed for a
/// glyph is the one sent to the Slack API.
const PRIMARY_PAIRS: &[(&str, &str)] = &[
    ("👍", "thumbsup"),
    ("👎", "thumbsdown"),
    ("😄", "smile"),
    ("😊", "blush"),
    ("😆", "laughing"),
    ("😂", "joy"),
    ("🤣", "rolling_on_the_floor_laughing"),
    ("🙂", "slightly_smiling_face"),
    ("😀", "grinning"),
    ("😃", "smiley"),
    ("😉", "wink"),
    ("😍", "heart_eyes"),
    ("🥰", "smiling_face_with_3_hearts"),
    ("😘", "kissing_heart"),
    ("😎", "sunglasses"),
    ("🤔", "thinking_face"),
    ("🙃", "upside_down_face"),
    ("😅", "sweat_smile"),
    ("😢", "cry"),
    ("😭", "sob"),
    ("😮", "open_mouth"),
    ("😱", "scream"),
    ("😡", "rage"),
    ("😴", "sleeping"),
    ("🤯", "exploding_head"),
    ("🥳", "partying_face"),
    ("🤩", "star-struck"),
    ("😬", "grimacing"),
    ("🙄", "face_with_rolling_eyes"),
    ("🤗", "hugging_face"),
    ("🫡", "saluting_face"),
    ("👀", "eyes"),
    ("👋", "wave"),
    ("👏", "clap"),
    ("🙌", "raised_hands"),
    ("🙏", "pray"),
    ("👌", "ok_hand"),
    ("✌️", "v"),
    ("🤞", "crossed_fingers"),
    ("💪", "muscle"),
    ("👉", "point_right"),
    ("👈", "point_left"),
    ("👆", "point_up_2"),
    ("👇", "point_down"),
    ("✋", "raised_hand"),
    ("🤝", "handshake"),
    ("❤️", "heart"),
    ("🧡", "orange_heart"),
    ("💛", "yellow_heart"),
    ("💚", "green_heart"),
    ("💙", "blue_heart"),
    ("💜", "purple_heart"),
    ("🖤", "black_heart"),
    ("💔", "broken_heart"),
    ("💯", "100"),
    ("🔥", "fire"),
    ("✨", "sparkles"),
    ("⭐", "star"),
    ("🌟", "star2"),
    ("⚡", "zap"),
    ("☀️", "sunny"),
    ("🌈", "rainbow"),
    ("🎉", "tada"),
    ("🎊", "confetti_ball"),
    ("🎈", "balloon"),
    ("🎁", "gift"),
    ("🏆", "trophy"),
    ("🥇", "first_place_medal"),
    ("🚀", "rocket"),
    ("💡", "bulb"),
    ("📌", "pushpin"),
    ("📎", "paperclip"),
    ("📝", "memo"),
    ("📣", "mega"),
    ("🔔", "bell"),
    ("🔗", "link"),
    ("🔒", "lock"),
    ("🐛", "bug"),
    ("🛠️", "hammer_and_wrench"),
    ("⏳", "hourglass_flowing_sand"),
    ("⏰", "alarm_clock"),
    ("☕", "coffee"),
    ("🍕", "pizza"),
    ("🍻", "beers"),
    ("🎂", "birthday"),
    ("🐶", "dog"),
    ("🐱", "cat"),
    ("🦄", "unicorn_face"),
    ("🙈", "see_no_evil"),
    ("💀", "skull"),
    ("👻", "ghost"),
    ("🤖", "robot_face"),
    ("✅", "white_check_mark"),
    ("✔️", "heavy_check_mark"),
    ("☑️", "ballot_box_with_check"),
    ("❌", "x"),
    ("⚠️", "warning"),
    ("🚫", "no_entry_sign"),
    ("❓", "question"),
    ("❗", "exclamation"),
    ("➕", "heavy_plus_sign"),
    ("➖", "heavy_minus_sign"),
    ("🆗", "ok"),
    ("🆕", "new"),
    ("🔴", "red_circle"),
    ("🟢", "large_green_circle"),
    ("🏻", "skin-tone-2"),
    ("🏼", "skin-tone-3"),
    ("🏽", "skin-tone-4"),
    ("🏾", "skin-tone-5"),
    ("🏿", "skin-tone-6"),
];

/// Extra Slack names that resolve to a glyph but are never produced from one.
const ALIASES: &[(&str, &str)] = &[
    ("+1", "thumbsup"),
    ("-1", "thumbsdown"),
    ("thumbs_up", "thumbsup"),
    ("thumbs_down", "thumbsdown"),
    ("simple_smile", "slightly_smiling_face"),
    ("satisfied", "laughing"),
    ("heavy_heart_exclamation_mark_ornament", "heart"),
    ("hugs", "hugging_face"),
    ("thinking", "thinking_face"),
    ("rofl", "rolling_on_the_floor_laughing"),
    ("check", "white_check_mark"),
    ("hand", "raised_hand"),
    ("party_popper", "tada"),
    ("partying", "partying_face"),
];

static DEFAULT_TABLE: Lazy<EmojiTable> = Lazy::new(|| {
    EmojiTable::build(PRIMARY_PAIRS, ALIASES).unwrap_or_else(|err| {
        tracing::error!("builtin emoji table rejected: {}", err);
        EmojiTable::default()
    })
});

pub fn default_table() -> &'static EmojiTable {
    &DEFAULT_TABLE
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    #[error("glyph {glyph} listed twice")]
    DuplicateGlyph { glyph: String },

    #[error("name {name} listed twice")]
    DuplicateName { name: String },

    #[error("alias {alias} points at unknown name {target}")]
    DanglingAlias { alias: String, target: String },
}

/// Bidirectional glyph/name table. Both directions come from the same rows so
/// every primary pair round-trips.
#[derive(Debug, Clone, Default)]
pub struct EmojiTable {
    name_to_glyph: HashMap<String, String>,
    glyph_to_name: HashMap<String, String>,
    primary: Vec<(String, String)>,
}

impl EmojiTable {
    pub fn build(pairs: &[(&str, &str)], aliases: &[(&str, &str)]) -> Result<Self, TableError> {
        let mut table = Self::default();

        for (glyph, name) in pairs {
            if table.glyph_to_name.contains_key(*glyph) {
                return Err(TableError::DuplicateGlyph {
                    glyph: glyph.to_string(),
                });
            }
            if table.name_to_glyph.contains_key(*name) {
                return Err(TableError::DuplicateName {
                    name: name.to_string(),
                });
            }
            table
                .name_to_glyph
                .insert(name.to_string(), glyph.to_string());
            table
                .glyph_to_name
                .insert(glyph.to_string(), name.to_string());
            let bare = strip_variation_selector(glyph);
            if bare != *glyph {
                table
                    .glyph_to_name
                    .entry(bare)
                    .or_insert_with(|| name.to_string());
            }
            table.primary.push((glyph.to_string(), name.to_string()));
        }

        for (alias, target) in aliases {
            if table.name_to_glyph.contains_key(*alias) {
                return Err(TableError::DuplicateName {
                    name: alias.to_string(),
                });
            }
            // Aliases must point at a primary name, never at another alias.
            let Some(glyph) = table.glyph_for_primary(target) else {
                return Err(TableError::DanglingAlias {
                    alias: alias.to_string(),
                    target: target.to_string(),
                });
            };
            table.name_to_glyph.insert(alias.to_string(), glyph);
        }

        Ok(table)
    }

    fn glyph_for_primary(&self, name: &str) -> Option<String> {
        self.primary
            .iter()
            .find(|(_, primary)| primary == name)
            .map(|(glyph, _)| glyph.clone())
    }

    pub fn glyph_for(&self, name: &str) -> Option<&str> {
        self.name_to_glyph.get(name).map(String::as_str)
    }

    pub fn name_for(&self, glyph: &str) -> Option<&str> {
        self.glyph_to_name
            .get(glyph)
            .or_else(|| self.glyph_to_name.get(&strip_variation_selector(glyph)))
            .map(String::as_str)
    }

    pub fn is_name(&self, name: &str) -> bool {
        self.name_to_glyph.contains_key(name)
    }

    pub fn primary_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.primary
            .iter()
            .map(|(glyph, name)| (glyph.as_str(), name.as_str()))
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.primary.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.primary.is_empty()
    }
}

fn strip_variation_selector(glyph: &str) -> String {
    glyph.chars().filter(|c| *c != VARIATION_SELECTOR).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_builds_without_errors() {
        let table = EmojiTable::build(PRIMARY_PAIRS, ALIASES).expect("builtin table is consistent");
        assert_eq!(table.len(), PRIMARY_PAIRS.len());
        assert!(!default_table().is_empty());
    }

    #[test]
    fn every_primary_pair_resolves_in_both_directions() {
        let table = default_table();
        for (glyph, name) in table.primary_pairs() {
            assert_eq!(table.glyph_for(name), Some(glyph), "name {name}");
            assert_eq!(table.name_for(glyph), Some(name), "glyph {glyph}");
        }
    }

    #[test]
    fn aliases_resolve_to_glyph_only() {
        let table = default_table();
        assert_eq!(table.glyph_for("+1"), Some("👍"));
        assert_eq!(table.name_for("👍"), Some("thumbsup"));
    }

    #[test]
    fn glyph_without_variation_selector_still_resolves() {
        let table = default_table();
        assert_eq!(table.name_for("\u{2764}"), Some("heart"));
        assert_eq!(table.name_for("❤️"), Some("heart"));
    }

    #[test]
    fn duplicate_glyph_is_rejected() {
        let err = EmojiTable::build(&[("👍", "thumbsup"), ("👍", "like")], &[])
            .expect_err("duplicate glyph must fail");
        assert_eq!(
            err,
            TableError::DuplicateGlyph {
                glyph: "👍".to_string()
            }
        );
    }

    #[test]
    fn dangling_alias_is_rejected() {
        let err = EmojiTable::build(&[("👍", "thumbsup")], &[("yes", "missing")])
            .expect_err("alias without target must fail");
        assert!(matches!(err, TableError::DanglingAlias { .. }));
    }
}
