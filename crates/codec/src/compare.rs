//! Semantic comparison of structured documents.
//!
//! Two documents produced by independent runtimes for the same configuration
//! should agree field by field. Differences are classified as:
//!
//! - **major**: structural mismatches, missing keys, differing strings,
//!   booleans or integers, and reals outside the rounding tolerance;
//! - **minor**: reals that differ but lie within the rounding tolerance.
//!
//! Keys on the ignore list (run metadata such as export timestamps) are
//! skipped wherever they occur.

use serde_json::{Map, Number, Value};
use std::fmt;

/// Default keys skipped during comparison.
pub const DEFAULT_IGNORED: &[&str] = &["exported", "generator"];

/// Rounding tolerance for real-valued fields.
///
/// Two reals `a` and `b` are considered a minor difference when
/// `|a - b| <= max(absolute, relative * max(|a|, |b|))`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    pub absolute: f64,
    pub relative: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            absolute: 1e-12,
            relative: 1e-9,
        }
    }
}

impl Tolerance {
    pub fn accepts(&self, a: f64, b: f64) -> bool {
        if a.is_nan() || b.is_nan() {
            return false;
        }
        let scale = a.abs().max(b.abs());
        (a - b).abs() <= self.absolute.max(self.relative * scale)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Major,
    Minor,
}

/// A single differing field.
#[derive(Debug, Clone, PartialEq)]
pub struct Difference {
    /// Dotted path to the field, e.g. `statistics.species[0].mean[1]`.
    pub path: String,
    pub severity: Severity,
    pub reference: String,
    pub candidate: String,
}

impl fmt::Display for Difference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            Severity::Major => "MAJOR",
            Severity::Minor => "minor",
        };
        write!(
            f,
            "[{tag}] {}: {} != {}",
            self.path, self.reference, self.candidate
        )
    }
}

/// Result of comparing two documents.
#[derive(Debug, Clone, Default)]
pub struct DiffReport {
    pub differences: Vec<Difference>,
}

impl DiffReport {
    pub fn major_count(&self) -> usize {
        self.count(Severity::Major)
    }

    pub fn minor_count(&self) -> usize {
        self.count(Severity::Minor)
    }

    /// True when no major differences were found.
    pub fn passed(&self) -> bool {
        self.major_count() == 0
    }

    pub fn is_identical(&self) -> bool {
        self.differences.is_empty()
    }

    pub fn majors(&self) -> impl Iterator<Item = &Difference> {
        self.differences
            .iter()
            .filter(|d| d.severity == Severity::Major)
    }

    pub fn minors(&self) -> impl Iterator<Item = &Difference> {
        self.differences
            .iter()
            .filter(|d| d.severity == Severity::Minor)
    }

    fn count(&self, severity: Severity) -> usize {
        self.differences
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

/// Field-by-field document comparator.
#[derive(Debug, Clone)]
pub struct Comparator {
    ignored: Vec<String>,
    tolerance: Tolerance,
}

impl Default for Comparator {
    fn default() -> Self {
        Self::new()
    }
}

impl Comparator {
    pub fn new() -> Self {
        Self {
            ignored: DEFAULT_IGNORED.iter().map(|s| s.to_string()).collect(),
            tolerance: Tolerance::default(),
        }
    }

    pub fn with_tolerance(mut self, tolerance: Tolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Add a key to the ignore list.
    pub fn ignore(mut self, key: impl Into<String>) -> Self {
        self.ignored.push(key.into());
        self
    }

    pub fn tolerance(&self) -> Tolerance {
        self.tolerance
    }

    pub fn ignored(&self) -> &[String] {
        &self.ignored
    }

    pub fn compare(&self, reference: &Value, candidate: &Value) -> DiffReport {
        let mut report = DiffReport::default();
        self.walk("", reference, candidate, &mut report);
        report
    }

    fn walk(&self, path: &str, reference: &Value, candidate: &Value, report: &mut DiffReport) {
        match (reference, candidate) {
            (Value::Object(a), Value::Object(b)) => self.walk_objects(path, a, b, report),
            (Value::Array(a), Value::Array(b)) => {
                if a.len() != b.len() {
                    push(
                        report,
                        path,
                        Severity::Major,
                        format!("array of {}", a.len()),
                        format!("array of {}", b.len()),
                    );
                    return;
                }
                for (i, (x, y)) in a.iter().zip(b.iter()).enumerate() {
                    self.walk(&format!("{path}[{i}]"), x, y, report);
                }
            }
            (Value::Number(a), Value::Number(b)) => self.compare_numbers(path, a, b, report),
            (a, b) => {
                if a != b {
                    push(report, path, Severity::Major, a.to_string(), b.to_string());
                }
            }
        }
    }

    fn walk_objects(
        &self,
        path: &str,
        a: &Map<String, Value>,
        b: &Map<String, Value>,
        report: &mut DiffReport,
    ) {
        let child = |key: &str| {
            if path.is_empty() {
                key.to_string()
            } else {
                format!("{path}.{key}")
            }
        };
        for (key, x) in a {
            if self.is_ignored(key) {
                continue;
            }
            match b.get(key) {
                Some(y) => self.walk(&child(key), x, y, report),
                None => push(
                    report,
                    &child(key),
                    Severity::Major,
                    x.to_string(),
                    "<missing>".into(),
                ),
            }
        }
        for (key, y) in b {
            if self.is_ignored(key) || a.contains_key(key) {
                continue;
            }
            push(
                report,
                &child(key),
                Severity::Major,
                "<missing>".into(),
                y.to_string(),
            );
        }
    }

    fn compare_numbers(&self, path: &str, a: &Number, b: &Number, report: &mut DiffReport) {
        if a == b {
            return;
        }
        let both_integral = (a.is_i64() || a.is_u64()) && (b.is_i64() || b.is_u64());
        let severity = match (both_integral, a.as_f64(), b.as_f64()) {
            (true, _, _) => Severity::Major,
            (false, Some(x), Some(y)) if x.to_bits() == y.to_bits() => return,
            (false, Some(x), Some(y)) if self.tolerance.accepts(x, y) => Severity::Minor,
            _ => Severity::Major,
        };
        push(report, path, severity, a.to_string(), b.to_string());
    }

    fn is_ignored(&self, key: &str) -> bool {
        self.ignored.iter().any(|k| k == key)
    }
}

fn push(report: &mut DiffReport, path: &str, severity: Severity, reference: String, candidate: String) {
    report.differences.push(Difference {
        path: path.to_string(),
        severity,
        reference,
        candidate,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_identical_documents() {
        let doc = json!({ "a": 1, "b": [0.5, "x"], "c": { "d": null } });
        let report = Comparator::new().compare(&doc, &doc);
        assert!(report.is_identical());
        assert!(report.passed());
    }

    #[test]
    fn test_ignores_metadata() {
        let a = json!({ "exported": "2024-01-01T00:00:00Z", "generator": "x 0.1", "v": 1 });
        let b = json!({ "exported": "2026-10-19T12:00:00Z", "v": 1 });
        assert!(Comparator::new().compare(&a, &b).is_identical());
    }

    #[test]
    fn test_rounding_difference_is_minor() {
        let a = json!({ "mean": [0.1 + 0.2] });
        let b = json!({ "mean": [0.3] });
        let report = Comparator::new().compare(&a, &b);
        assert_eq!(report.minor_count(), 1);
        assert_eq!(report.major_count(), 0);
        assert!(report.passed());
        assert_eq!(report.differences[0].path, "mean[0]");
    }

    #[test]
    fn test_large_real_difference_is_major() {
        let a = json!({ "mean": 0.25 });
        let b = json!({ "mean": 0.26 });
        let report = Comparator::new().compare(&a, &b);
        assert_eq!(report.major_count(), 1);
        assert!(!report.passed());
    }

    #[test]
    fn test_integer_difference_is_major() {
        let a = json!({ "counts": [500, 500] });
        let b = json!({ "counts": [501, 499] });
        let report = Comparator::new().compare(&a, &b);
        assert_eq!(report.major_count(), 2);
        assert_eq!(report.differences[1].path, "counts[1]");
    }

    #[test]
    fn test_structural_differences_are_major() {
        let a = json!({ "x": [1, 2], "y": "s", "only_a": true });
        let b = json!({ "x": [1, 2, 3], "y": 1, "only_b": false });
        let report = Comparator::new().compare(&a, &b);
        assert_eq!(report.major_count(), 4);
        assert_eq!(report.minor_count(), 0);
    }

    #[test]
    fn test_custom_ignore_and_tolerance() {
        let a = json!({ "t": 1.0, "note": "a" });
        let b = json!({ "t": 1.001, "note": "b" });
        let cmp = Comparator::new().ignore("note").with_tolerance(Tolerance {
            absolute: 0.01,
            relative: 0.0,
        });
        let report = cmp.compare(&a, &b);
        assert_eq!(report.minor_count(), 1);
        assert_eq!(report.major_count(), 0);
    }

    #[test]
    fn test_tolerance_accepts() {
        let tol = Tolerance::default();
        assert!(tol.accepts(1.0, 1.0 + 1e-12));
        assert!(!tol.accepts(1.0, 1.0 + 1e-6));
        assert!(tol.accepts(0.0, 1e-13));
        assert!(!tol.accepts(f64::NAN, f64::NAN));
    }
}
