//! Ledger of human-readable changes made by migration steps.

use serde::Serialize;

/// Title and description of a step as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepDescription {
    pub title: String,
    pub description: String,
}

impl StepDescription {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }
}

/// Ordered "updated" and "removed" entries.
///
/// Entries are append-only and never deduplicated. [`MigrationReport::merge`]
/// appends the other report's entries after this one's, which makes it
/// associative with [`MigrationReport::empty_report`] as identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    updates: Vec<String>,
    removals: Vec<String>,
}

impl MigrationReport {
    pub fn empty_report() -> Self {
        Self::default()
    }

    pub fn updated(&mut self, message: impl Into<String>) -> &mut Self {
        self.updates.push(message.into());
        self
    }

    pub fn removed(&mut self, message: impl Into<String>) -> &mut Self {
        self.removals.push(message.into());
        self
    }

    pub fn merge(&mut self, other: MigrationReport) -> &mut Self {
        self.updates.extend(other.updates);
        self.removals.extend(other.removals);
        self
    }

    pub fn updates(&self) -> &[String] {
        &self.updates
    }

    pub fn removals(&self) -> &[String] {
        &self.removals
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty() && self.removals.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn report(updates: Vec<String>, removals: Vec<String>) -> MigrationReport {
        let mut report = MigrationReport::empty_report();
        for u in updates {
            report.updated(u);
        }
        for r in removals {
            report.removed(r);
        }
        report
    }

    fn merged(mut a: MigrationReport, b: MigrationReport) -> MigrationReport {
        a.merge(b);
        a
    }

    #[test]
    fn test_repeated_messages_are_kept() {
        let mut report = MigrationReport::empty_report();
        report.updated("Same entry").updated("Same entry");
        report.removed("Gone").removed("Gone");
        assert_eq!(report.updates(), ["Same entry", "Same entry"]);
        assert_eq!(report.removals(), ["Gone", "Gone"]);
    }

    #[test]
    fn test_merge_keeps_call_order() {
        let mut first = MigrationReport::empty_report();
        first.updated("a");
        let mut second = MigrationReport::empty_report();
        second.updated("b").removed("c");

        first.merge(second);
        assert_eq!(first.updates(), ["a", "b"]);
        assert_eq!(first.removals(), ["c"]);
    }

    #[test]
    fn test_empty_report() {
        assert!(MigrationReport::empty_report().is_empty());
    }

    fn entries() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec("[a-z ]{0,8}", 0..4)
    }

    fn any_report() -> impl Strategy<Value = MigrationReport> {
        (entries(), entries()).prop_map(|(u, r)| report(u, r))
    }

    proptest! {
        #[test]
        fn prop_merge_is_associative(a in any_report(), b in any_report(), c in any_report()) {
            let left = merged(merged(a.clone(), b.clone()), c.clone());
            let right = merged(a, merged(b, c));
            prop_assert_eq!(left, right);
        }

        #[test]
        fn prop_empty_report_is_identity(r in any_report()) {
            prop_assert_eq!(merged(MigrationReport::empty_report(), r.clone()), r.clone());
            prop_assert_eq!(merged(r.clone(), MigrationReport::empty_report()), r);
        }
    }
}
