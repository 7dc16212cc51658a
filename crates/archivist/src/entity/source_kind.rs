//! Source kind enum for the two mirrored entity families.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// The kind of remote source an item was mirrored from.
///
/// Tracked issues come from the issue tracker and are scoped by project;
/// wiki pages come from the wiki service and are scoped by space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum SourceKind {
    /// An issue from the tracker.
    #[sea_orm(string_value = "tracked_issue")]
    TrackedIssue,
    /// A page from the wiki.
    #[sea_orm(string_value = "wiki_page")]
    WikiPage,
}

impl SourceKind {
    /// Stable string form, matching the database representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::TrackedIssue => "tracked_issue",
            SourceKind::WikiPage => "wiki_page",
        }
    }

    /// What the scope key means for this kind.
    #[must_use]
    pub fn scope_label(self) -> &'static str {
        match self {
            SourceKind::TrackedIssue => "project",
            SourceKind::WikiPage => "space",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tracked_issue" | "issue" | "issues" => Ok(SourceKind::TrackedIssue),
            "wiki_page" | "page" | "pages" => Ok(SourceKind::WikiPage),
            _ => Err(format!("Unknown source kind: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(SourceKind::TrackedIssue.to_string(), "tracked_issue");
        assert_eq!(SourceKind::WikiPage.to_string(), "wiki_page");
    }

    #[test]
    fn test_from_str_accepts_aliases() {
        assert_eq!("issues".parse::<SourceKind>(), Ok(SourceKind::TrackedIssue));
        assert_eq!("issue".parse::<SourceKind>(), Ok(SourceKind::TrackedIssue));
        assert_eq!("pages".parse::<SourceKind>(), Ok(SourceKind::WikiPage));
        assert_eq!("WIKI_PAGE".parse::<SourceKind>(), Ok(SourceKind::WikiPage));
        assert!("board".parse::<SourceKind>().is_err());
    }

    #[test]
    fn test_scope_label() {
        assert_eq!(SourceKind::TrackedIssue.scope_label(), "project");
        assert_eq!(SourceKind::WikiPage.scope_label(), "space");
    }
}
