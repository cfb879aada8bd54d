//! Target-name patterns and wildcard matching.
//!
//! A pattern is classified once, in priority order: empty, special token,
//! exact name, wildcard. Matching against a concrete target name is
//! case-sensitive. A wildcard pattern matches any name that starts with the
//! text before its first `*`; the rest of the pattern is ignored.

/// Wildcard marker in target patterns.
pub const WILDCARD: char = '*';

/// Special tokens that resolve relative to the firing context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecialTarget {
    /// `!self` -- the firing entity.
    SelfEntity,
    /// `!caller` -- the entity directly responsible for the fire.
    Caller,
    /// `!activator` -- the entity originally responsible for the chain.
    Activator,
    /// `!player` -- the first live entity of class `player`.
    Player,
}

impl SpecialTarget {
    /// Parse a `!token`. Returns `None` for unknown tokens.
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "!self" => Some(Self::SelfEntity),
            "!caller" => Some(Self::Caller),
            "!activator" => Some(Self::Activator),
            "!player" => Some(Self::Player),
            _ => None,
        }
    }
}

/// A classified target pattern, borrowing from the source string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetPattern<'a> {
    /// Empty pattern: fires nothing.
    Empty,
    /// A known special token.
    Special(SpecialTarget),
    /// A `!`-prefixed token this layer does not know. Resolves to nothing.
    UnknownSpecial(&'a str),
    /// A literal target name.
    Exact(&'a str),
    /// A pattern containing at least one [`WILDCARD`].
    Wildcard(&'a str),
}

impl<'a> TargetPattern<'a> {
    /// Classify a raw pattern string.
    pub fn parse(raw: &'a str) -> Self {
        if raw.is_empty() {
            return Self::Empty;
        }
        if raw.starts_with('!') {
            return SpecialTarget::parse(raw).map_or(Self::UnknownSpecial(raw), Self::Special);
        }
        if raw.contains(WILDCARD) {
            Self::Wildcard(raw)
        } else {
            Self::Exact(raw)
        }
    }

    /// Test a concrete target name against an exact or wildcard pattern.
    ///
    /// Special and empty patterns never match by name.
    pub fn matches_name(&self, name: &str) -> bool {
        match *self {
            Self::Exact(pattern) => pattern == name,
            Self::Wildcard(pattern) => wildcard_match(pattern, name),
            Self::Empty | Self::Special(_) | Self::UnknownSpecial(_) => false,
        }
    }
}

/// Prefix-match `name` against `pattern`: the text before the first `*`
/// must start `name`, and everything from the `*` on is ignored. A pattern
/// without `*` must equal `name`. Case-sensitive; there is no escape syntax.
pub fn wildcard_match(pattern: &str, name: &str) -> bool {
    match pattern.split_once(WILDCARD) {
        Some((prefix, _)) => name.starts_with(prefix),
        None => pattern == name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_priority() {
        assert_eq!(TargetPattern::parse(""), TargetPattern::Empty);
        assert_eq!(
            TargetPattern::parse("!self"),
            TargetPattern::Special(SpecialTarget::SelfEntity)
        );
        assert_eq!(
            TargetPattern::parse("!activator"),
            TargetPattern::Special(SpecialTarget::Activator)
        );
        assert_eq!(
            TargetPattern::parse("!nobody"),
            TargetPattern::UnknownSpecial("!nobody")
        );
        assert_eq!(TargetPattern::parse("door_01"), TargetPattern::Exact("door_01"));
        assert_eq!(TargetPattern::parse("button_*"), TargetPattern::Wildcard("button_*"));
    }

    #[test]
    fn trailing_wildcard_is_prefix_match() {
        assert!(wildcard_match("button_*", "button_a"));
        assert!(wildcard_match("button_*", "button_"));
        assert!(!wildcard_match("button_*", "xbutton_a"));
        assert!(!wildcard_match("button_*", "Button_a"));
    }

    #[test]
    fn text_after_first_wildcard_is_ignored() {
        assert!(wildcard_match("door_*_left", "door_01_left"));
        assert!(wildcard_match("door_*_left", "door_01_right"));
        assert!(!wildcard_match("door_*_left", "gate_01_left"));
        assert!(wildcard_match("*lamp", "hall_light"));
        assert!(wildcard_match("*", ""));
        assert!(!wildcard_match("lamp", "lamp_1"));
        assert!(wildcard_match("lamp", "lamp"));
    }

    #[test]
    fn exact_match_is_case_sensitive() {
        let pattern = TargetPattern::parse("Relay");
        assert!(pattern.matches_name("Relay"));
        assert!(!pattern.matches_name("relay"));
    }

    #[test]
    fn specials_never_match_by_name() {
        assert!(!TargetPattern::parse("!self").matches_name("!self"));
        assert!(!TargetPattern::parse("").matches_name(""));
    }
}
