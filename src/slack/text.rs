use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::emoji::{EmojiDirectory, EmojiTarget, default_table, normalize};

static USER_MENTION_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<@([A-Z0-9]+)(?:\|[^>]+)?>").expect("valid user mention regex"));
static CHANNEL_MENTION_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<#([A-Z0-9]+)\|([^>]+)>").expect("valid channel mention regex")
});
static LINK_WITH_LABEL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<((?:https?|mailto):[^>|]+)\|([^>]+)>").expect("valid labeled link regex")
});
static RAW_LINK_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<((?:https?|mailto):[^>]+)>").expect("valid raw link regex"));
static SHORTCODE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r":([\w+-]+):").expect("valid shortcode regex"));

/// Text as subscribers should see it: Slack markup flattened, shortcodes
/// replaced.
pub fn display_text(input: &str, directory: &EmojiDirectory) -> String {
    substitute_shortcodes(&normalize_slack_text(input), directory)
}

pub fn normalize_slack_text(input: &str) -> String {
    let mut text = USER_MENTION_REGEX
        .replace_all(input, |caps: &Captures| format!("@{}", &caps[1]))
        .into_owned();
    text = CHANNEL_MENTION_REGEX
        .replace_all(&text, |caps: &Captures| format!("#{}", &caps[2]))
        .into_owned();
    text = text
        .replace("<!channel>", "@channel")
        .replace("<!here>", "@here")
        .replace("<!everyone>", "@everyone");
    text = LINK_WITH_LABEL_REGEX
        .replace_all(&text, |caps: &Captures| format!("{} ({})", &caps[2], &caps[1]))
        .into_owned();
    RAW_LINK_REGEX
        .replace_all(&text, |caps: &Captures| caps[1].to_string())
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        // last, so an escaped entity decodes exactly once
        .replace("&amp;", "&")
}

/// Replaces `:name:` with a custom emoji image, then a builtin glyph. Unknown
/// shortcodes stay literal.
pub fn substitute_shortcodes(text: &str, directory: &EmojiDirectory) -> String {
    SHORTCODE_REGEX
        .replace_all(text, |caps: &Captures| {
            let name = &caps[1];
            if let Some(resolved) = directory.resolve(name) {
                return resolved.into_text();
            }
            let glyph = normalize(name, EmojiTarget::Display);
            if default_table().name_for(&glyph).is_some() {
                glyph
            } else {
                caps[0].to_string()
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escaped_markup_is_decoded_after_rewriting() {
        assert_eq!(normalize_slack_text("&lt;@U1&gt; hi"), "<@U1> hi");
        assert_eq!(normalize_slack_text("a &amp;lt; b"), "a &lt; b");
        assert_eq!(normalize_slack_text("1 &lt; 2 &amp;&amp; 3 &gt; 2"), "1 < 2 && 3 > 2");
    }

    #[test]
    fn flattens_markup() {
        let input = "hey <@U123|alice> see <#C42|general> &amp; <https://example.com|docs> <!here>";
        assert_eq!(
            normalize_slack_text(input),
            "hey @U123 see #general & docs (https://example.com) @here"
        );
        assert_eq!(
            normalize_slack_text("<https://example.com/a>"),
            "https://example.com/a"
        );
    }

    #[test]
    fn builtin_shortcodes_become_glyphs() {
        let directory = EmojiDirectory::default();
        assert_eq!(
            substitute_shortcodes("ship it :rocket: :+1:", &directory),
            "ship it 🚀 👍"
        );
        assert_eq!(
            substitute_shortcodes("great :thumbsup_2:", &directory),
            "great 👍"
        );
    }

    #[test]
    fn custom_shortcodes_use_directory_first() {
        let directory = EmojiDirectory::from_listing([
            ("party_parrot", "https://emoji.slack-edge.com/T1/party_parrot/abc.gif"),
            ("rocket", "alias:tada"),
        ]);
        assert_eq!(
            substitute_shortcodes(":party_parrot: :rocket:", &directory),
            "https://emoji.slack-edge.com/T1/party_parrot/abc.gif 🎉"
        );
    }

    #[test]
    fn unknown_shortcodes_and_times_stay_literal() {
        let directory = EmojiDirectory::default();
        assert_eq!(
            substitute_shortcodes(":not_a_real_emoji: at 10:30:45", &directory),
            ":not_a_real_emoji: at 10:30:45"
        );
    }

    #[test]
    fn display_text_runs_both_passes() {
        let directory = EmojiDirectory::default();
        assert_eq!(
            display_text("<@U1> :wave: &lt;3", &directory),
            "@U1 👋 <3"
        );
    }
}
