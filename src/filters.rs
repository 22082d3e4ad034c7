//! Search filters: named collection toggles and phrase augmentation.
//!
//! Each toggle restricts the provider search to one content partition
//! (a provider "collection code"). With every toggle off the search is
//! unrestricted and no `collection_codes` parameter is sent at all.

use serde::{Deserialize, Serialize};

/// The fixed set of collections an operator can restrict a search to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Wwd,
    Variety,
    Billboard,
    RollingStone,
    Deadline,
}

impl Collection {
    pub const ALL: [Collection; 5] = [
        Collection::Wwd,
        Collection::Variety,
        Collection::Billboard,
        Collection::RollingStone,
        Collection::Deadline,
    ];

    /// Provider collection code.
    pub fn code(&self) -> &'static str {
        match self {
            Collection::Wwd => "WWD",
            Collection::Variety => "VAR",
            Collection::Billboard => "BIL",
            Collection::RollingStone => "RST",
            Collection::Deadline => "DLN",
        }
    }

    /// Toggle name as used in `[filters]` and the `filter` session command.
    pub fn key(&self) -> &'static str {
        match self {
            Collection::Wwd => "wwd",
            Collection::Variety => "variety",
            Collection::Billboard => "billboard",
            Collection::RollingStone => "rolling_stone",
            Collection::Deadline => "deadline",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Collection::Wwd => "WWD",
            Collection::Variety => "Variety",
            Collection::Billboard => "Billboard",
            Collection::RollingStone => "Rolling Stone",
            Collection::Deadline => "Deadline",
        }
    }

    /// Accepts either the toggle key or the collection code.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.key().eq_ignore_ascii_case(s) || c.code().eq_ignore_ascii_case(s))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    #[serde(default)]
    pub wwd: bool,
    #[serde(default)]
    pub variety: bool,
    #[serde(default)]
    pub billboard: bool,
    #[serde(default)]
    pub rolling_stone: bool,
    #[serde(default)]
    pub deadline: bool,
    /// Append the phrase marker token to every search phrase.
    #[serde(default)]
    pub phrase_augmentation: bool,
}

impl FilterConfig {
    pub fn is_enabled(&self, collection: Collection) -> bool {
        match collection {
            Collection::Wwd => self.wwd,
            Collection::Variety => self.variety,
            Collection::Billboard => self.billboard,
            Collection::RollingStone => self.rolling_stone,
            Collection::Deadline => self.deadline,
        }
    }

    pub fn set(&mut self, collection: Collection, enabled: bool) {
        let flag = match collection {
            Collection::Wwd => &mut self.wwd,
            Collection::Variety => &mut self.variety,
            Collection::Billboard => &mut self.billboard,
            Collection::RollingStone => &mut self.rolling_stone,
            Collection::Deadline => &mut self.deadline,
        };
        *flag = enabled;
    }

    pub fn active_collections(&self) -> Vec<Collection> {
        Collection::ALL
            .into_iter()
            .filter(|c| self.is_enabled(*c))
            .collect()
    }

    /// Comma-joined active collection codes, or `None` for "search all".
    pub fn collection_codes(&self) -> Option<String> {
        let codes: Vec<&str> = self
            .active_collections()
            .iter()
            .map(|c| c.code())
            .collect();
        if codes.is_empty() {
            None
        } else {
            Some(codes.join(","))
        }
    }

    /// Builds the provider search phrase for a person's name.
    pub fn phrase_for(&self, name: &str, marker: &str) -> String {
        if self.phrase_augmentation {
            format!("{} {}", name, marker)
        } else {
            name.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_toggles_means_unrestricted() {
        assert_eq!(FilterConfig::default().collection_codes(), None);
    }

    #[test]
    fn codes_follow_fixed_order() {
        let mut filter = FilterConfig::default();
        filter.set(Collection::Deadline, true);
        filter.set(Collection::Wwd, true);
        assert_eq!(filter.collection_codes().as_deref(), Some("WWD,DLN"));
    }

    #[test]
    fn phrase_augmentation_appends_marker() {
        let mut filter = FilterConfig::default();
        assert_eq!(filter.phrase_for("Jane Doe", "PMCARC"), "Jane Doe");
        filter.phrase_augmentation = true;
        assert_eq!(filter.phrase_for("Jane Doe", "PMCARC"), "Jane Doe PMCARC");
    }

    #[test]
    fn parse_accepts_key_or_code() {
        assert_eq!(Collection::parse("rolling_stone"), Some(Collection::RollingStone));
        assert_eq!(Collection::parse("var"), Some(Collection::Variety));
        assert_eq!(Collection::parse("nope"), None);
    }
}
