// ── Filter predicates for list views ──
//
// Applied to store snapshots locally; filtering never re-queries the API.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::model::{Effect, Trigger};

/// Something a list view can search and filter by kind.
pub trait Listable {
    fn name(&self) -> &str;
    fn kind(&self) -> &str;
}

impl Listable for Effect {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &str {
        self.kind.as_str()
    }
}

impl Listable for Trigger {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &str {
        self.condition.kind()
    }
}

/// Kind filter. `"all"` (or nothing) disables it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum KindFilter {
    #[default]
    All,
    Only(String),
}

impl KindFilter {
    pub const ALL: &'static str = "all";

    /// Exact, case-sensitive match on the wire kind.
    pub fn matches(&self, kind: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == kind,
        }
    }
}

impl FromStr for KindFilter {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "" | Self::ALL => Self::All,
            kind => Self::Only(kind.to_owned()),
        })
    }
}

impl fmt::Display for KindFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str(Self::ALL),
            Self::Only(kind) => f.write_str(kind),
        }
    }
}

/// Name search plus kind filter. Both must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    pub search: String,
    pub kind: KindFilter,
}

impl ListFilter {
    pub fn new(search: impl Into<String>, kind: KindFilter) -> Self {
        Self {
            search: search.into(),
            kind,
        }
    }

    pub fn is_active(&self) -> bool {
        !self.search.is_empty() || self.kind != KindFilter::All
    }

    pub fn matches<T: Listable + ?Sized>(&self, item: &T) -> bool {
        let name_ok = self.search.is_empty()
            || item
                .name()
                .to_lowercase()
                .contains(&self.search.to_lowercase());
        name_ok && self.kind.matches(item.kind())
    }

    /// Matching items, in their original order.
    pub fn apply<T: Listable>(&self, items: &[Arc<T>]) -> Vec<Arc<T>> {
        items
            .iter()
            .filter(|item| self.matches(item.as_ref()))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named(&'static str, &'static str);

    impl Listable for Named {
        fn name(&self) -> &str {
            self.0
        }

        fn kind(&self) -> &str {
            self.1
        }
    }

    fn items() -> Vec<Arc<Named>> {
        vec![
            Arc::new(Named("Fireworks", "particle")),
            Arc::new(Named("Thunder", "sound")),
            Arc::new(Named("Fire Ring", "visual")),
        ]
    }

    #[test]
    fn all_sentinel_parses_to_no_filter() {
        assert_eq!("all".parse::<KindFilter>().ok(), Some(KindFilter::All));
        assert_eq!("".parse::<KindFilter>().ok(), Some(KindFilter::All));
        assert_eq!(
            "sound".parse::<KindFilter>().ok(),
            Some(KindFilter::Only("sound".into()))
        );
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let filter = ListFilter::new("FIRE", KindFilter::All);
        let names: Vec<_> = filter.apply(&items()).iter().map(|n| n.0).collect();
        assert_eq!(names, ["Fireworks", "Fire Ring"]);
    }

    #[test]
    fn search_and_kind_combine() {
        let filter = ListFilter::new("fire", KindFilter::Only("visual".into()));
        let names: Vec<_> = filter.apply(&items()).iter().map(|n| n.0).collect();
        assert_eq!(names, ["Fire Ring"]);
    }

    #[test]
    fn kind_match_is_exact() {
        let filter = ListFilter::new("", KindFilter::Only("Sound".into()));
        assert!(filter.apply(&items()).is_empty());
    }
}
