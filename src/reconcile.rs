//! Copyright notice reconciliation.
//!
//! [`reconcile`] compares the notice found in a document with the year the
//! document was last modified and rewrites the notice when it is behind.
//! It is a pure function: no I/O, no logging, no clock.

use crate::notice::{FROM, NoticeConfig, TO, YEAR};
use crate::year::Year;
use serde::Serialize;

/// What [`reconcile`] decided for a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// The notice already reflects the reference year.
    UpToDate,
    /// The notice span was replaced.
    Rewritten {
        /// Notice text before the rewrite
        before: String,
        /// Notice text after the rewrite
        after: String,
    },
    /// No notice was found.
    Missing,
}

/// Result of reconciling one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    ok: bool,
    content: String,
    outcome: Outcome,
}

impl Reconciliation {
    /// Returns true when the document needs no change (or, for a missing
    /// notice, when the notice is not required).
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.ok
    }

    /// The document after reconciliation.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// What happened to the notice.
    #[must_use]
    pub const fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    /// Splits into `(ok, updated_document)`.
    #[must_use]
    pub fn into_parts(self) -> (bool, String) {
        (self.ok, self.content)
    }
}

/// Brings the copyright notice of `document` up to `reference_year`.
///
/// The range form is looked up first, then the single-year form; only the
/// first match is considered and only its span is replaced. New ranges end
/// at `current_year`. A degenerate range such as `2024-2024` is collapsed to
/// a single year when it equals `current_year`, otherwise extended to
/// `current_year`.
///
/// A document without a notice is left unchanged and is ok unless
/// `required` is set.
///
/// # Examples
///
/// ```
/// use precommit_utl::{reconcile, NoticeConfig, Year};
///
/// let notice = NoticeConfig::default();
/// let year: Year = "2023".parse().unwrap();
/// let result = reconcile("// Copyright (c) 2022\n", year, &notice, false, year);
///
/// assert!(!result.is_ok());
/// assert_eq!(result.content(), "// Copyright (c) 2022-2023\n");
/// ```
#[must_use]
pub fn reconcile(
    document: &str,
    reference_year: Year,
    notice: &NoticeConfig,
    required: bool,
    current_year: Year,
) -> Reconciliation {
    let current = current_year.to_string();

    if let Some(caps) = notice.two_pattern().find(document) {
        if let (Some(span), Some(from), Some(to)) = (caps.get(0), caps.name(FROM), caps.name(TO)) {
            let (from, to) = (from.as_str(), to.as_str());

            if from == to {
                let replacement = if current_year.is(from) {
                    notice.render_single(&current)
                } else {
                    notice.render_range(from, &current)
                };
                return rewrite(document, span.range(), replacement);
            }

            if reference_year.is(to) {
                return unchanged(document, true, Outcome::UpToDate);
            }

            return rewrite(document, span.range(), notice.render_range(from, &current));
        }
    }

    if let Some(caps) = notice.one_pattern().find(document) {
        if let (Some(span), Some(year)) = (caps.get(0), caps.name(YEAR)) {
            let year = year.as_str();

            if reference_year.is(year) {
                return unchanged(document, true, Outcome::UpToDate);
            }

            return rewrite(document, span.range(), notice.render_range(year, &current));
        }
    }

    unchanged(document, !required, Outcome::Missing)
}

fn unchanged(document: &str, ok: bool, outcome: Outcome) -> Reconciliation {
    Reconciliation {
        ok,
        content: document.to_string(),
        outcome,
    }
}

fn rewrite(document: &str, span: std::ops::Range<usize>, replacement: String) -> Reconciliation {
    let before = document[span.clone()].to_string();
    let mut content = String::with_capacity(document.len() + replacement.len());
    content.push_str(&document[..span.start]);
    content.push_str(&replacement);
    content.push_str(&document[span.end..]);

    Reconciliation {
        ok: false,
        content,
        outcome: Outcome::Rewritten {
            before,
            after: replacement,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn year(s: &str) -> Year {
        s.parse().unwrap()
    }

    fn run(document: &str, reference: &str, current: &str, required: bool) -> (bool, String) {
        reconcile(
            document,
            year(reference),
            &NoticeConfig::default(),
            required,
            year(current),
        )
        .into_parts()
    }

    fn hash_notice() -> NoticeConfig {
        NoticeConfig::parse(
            r"^# Copyright \(c\) (?P<year>[0-9]{4})",
            r"^# Copyright \(c\) (?P<from>[0-9]{4})-(?P<to>[0-9]{4})",
            "# Copyright (c) {year}",
            "# Copyright (c) {from}-{to}",
        )
        .unwrap()
    }

    #[test]
    fn test_single_year_up_to_date() {
        assert_eq!(
            run("Copyright (c) 2023", "2023", "2024", false),
            (true, "Copyright (c) 2023".to_string())
        );
    }

    #[test]
    fn test_single_year_promotion() {
        assert_eq!(
            run("Copyright (c) 2022", "2023", "2023", false),
            (false, "Copyright (c) 2022-2023".to_string())
        );
    }

    #[test]
    fn test_single_year_promotion_uses_current_year() {
        assert_eq!(
            run("Copyright (c) 2021", "2023", "2025", false),
            (false, "Copyright (c) 2021-2025".to_string())
        );
    }

    #[test]
    fn test_range_up_to_date() {
        assert_eq!(
            run("Copyright (c) 2022-2023", "2023", "2024", false),
            (true, "Copyright (c) 2022-2023".to_string())
        );
    }

    #[test]
    fn test_range_upper_bound_correction() {
        assert_eq!(
            run("Copyright (c) 2021-2022", "2023", "2023", false),
            (false, "Copyright (c) 2021-2023".to_string())
        );
    }

    #[test]
    fn test_degenerate_range_collapse() {
        assert_eq!(
            run("Copyright (c) 2024-2024", "2024", "2024", false),
            (false, "Copyright (c) 2024".to_string())
        );
    }

    #[test]
    fn test_degenerate_range_bump() {
        assert_eq!(
            run("Copyright (c) 2023-2023", "2023", "2024", false),
            (false, "Copyright (c) 2023-2024".to_string())
        );
    }

    #[test]
    fn test_degenerate_range_equal_to_reference_only() {
        // Collapsing is keyed on the current year, not the reference year.
        assert_eq!(
            run("Copyright (c) 2023-2023", "2023", "2025", false),
            (false, "Copyright (c) 2023-2025".to_string())
        );
    }

    #[test]
    fn test_absent_required() {
        assert_eq!(run("toto", "2023", "2023", true), (false, "toto".to_string()));
    }

    #[test]
    fn test_absent_not_required() {
        assert_eq!(run("toto", "2023", "2023", false), (true, "toto".to_string()));
    }

    #[test]
    fn test_missing_outcome() {
        let result = reconcile("", year("2023"), &NoticeConfig::default(), true, year("2023"));
        assert_eq!(result.outcome(), &Outcome::Missing);
        assert!(!result.is_ok());
    }

    #[test]
    fn test_rewritten_outcome_records_span() {
        let result = reconcile(
            "/* Copyright (c) 2020 ACME */",
            year("2023"),
            &NoticeConfig::default(),
            false,
            year("2023"),
        );
        assert_eq!(
            result.outcome(),
            &Outcome::Rewritten {
                before: "Copyright (c) 2020".to_string(),
                after: "Copyright (c) 2020-2023".to_string(),
            }
        );
    }

    #[test]
    fn test_surrounding_bytes_preserved() {
        let prefix = "#!/usr/bin/env python3\n# -*- coding: utf-8 -*-\n# ";
        let suffix = ", Stéphane Brunner\n\nimport sys\r\n\tprint('ü')\n";
        let document = format!("{prefix}Copyright (c) 2019{suffix}");

        let (ok, content) = run(&document, "2022", "2022", false);

        assert!(!ok);
        assert_eq!(content, format!("{prefix}Copyright (c) 2019-2022{suffix}"));
    }

    #[test]
    fn test_only_first_notice_is_rewritten() {
        let document = "Copyright (c) 2020\n...\nCopyright (c) 2018\n";
        let (ok, content) = run(document, "2023", "2023", false);

        assert!(!ok);
        assert_eq!(content, "Copyright (c) 2020-2023\n...\nCopyright (c) 2018\n");
    }

    #[test]
    fn test_range_takes_precedence_over_earlier_single_year() {
        let document = "Copyright (c) 2019\nCopyright (c) 2020-2022\n";
        let (ok, content) = run(document, "2023", "2023", false);

        assert!(!ok);
        assert_eq!(content, "Copyright (c) 2019\nCopyright (c) 2020-2023\n");
    }

    #[test]
    fn test_idempotent() {
        let cases = [
            "Copyright (c) 2019\nbody",
            "Copyright (c) 2019-2021\nbody",
            "Copyright (c) 2024-2024\nbody",
            "Copyright (c) 2022-2022\nbody",
            "Copyright (c) 2024\nbody",
            "no notice here",
        ];
        for document in cases {
            let (_, first) = run(document, "2024", "2024", false);
            let (ok, second) = run(&first, "2024", "2024", false);
            assert!(ok, "second pass not ok for {document:?}");
            assert_eq!(first, second, "second pass changed {document:?}");
        }
    }

    #[test]
    fn test_second_pass_is_stable_when_reference_is_older() {
        let (_, first) = run("Copyright (c) 2019", "2022", "2024", false);
        let (_, second) = run(&first, "2022", "2024", false);
        assert_eq!(first, "Copyright (c) 2019-2024");
        assert_eq!(first, second);
    }

    #[test]
    fn test_hash_prefixed_notices() {
        let notice = hash_notice();
        let cases = [
            ("toto", "toto", true),
            ("# Copyright (c) 2023\ntoto", "# Copyright (c) 2023\ntoto", true),
            ("# Copyright (c) 2022\ntoto", "# Copyright (c) 2022-2023\ntoto", false),
            ("# Copyright (c) 2022-2023\ntoto", "# Copyright (c) 2022-2023\ntoto", true),
            ("# Copyright (c) 2021-2022\ntoto", "# Copyright (c) 2021-2023\ntoto", false),
        ];
        for (document, expected, expected_ok) in cases {
            let result = reconcile(document, year("2023"), &notice, false, year("2023"));
            assert_eq!(result.is_ok(), expected_ok, "{document:?}");
            assert_eq!(result.content(), expected, "{document:?}");
        }
    }

    #[test]
    fn test_anchored_pattern_ignores_indented_notice() {
        let result = reconcile(
            "  # Copyright (c) 2020\n",
            year("2023"),
            &hash_notice(),
            true,
            year("2023"),
        );
        assert_eq!(result.outcome(), &Outcome::Missing);
    }

    #[test]
    fn test_outcome_serializes_with_status_tag() {
        let json = serde_json::to_value(Outcome::UpToDate).unwrap();
        assert_eq!(json, serde_json::json!({ "status": "up_to_date" }));
    }
}
