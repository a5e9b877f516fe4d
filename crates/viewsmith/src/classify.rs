//! The widget-classifier boundary.
//!
//! The pipeline treats the classifier as a pure function: feature rows in,
//! one predicted control kind per row out, aligned by index. Anything
//! honoring [`WidgetClassifier`] is substitutable: the built-in
//! [`HeuristicClassifier`], or an external trained model spoken to over a
//! JSON pipe ([`ExternalClassifier`]).

use std::io::Write;
use std::process::{Command, Stdio};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::table::{FeatureRow, FeatureTable, PyType, has_lower_bound, has_upper_bound};

/// The fixed enumeration of control kinds the generator can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WidgetKind {
    /// Free-text input.
    Entry,
    /// Boolean toggle.
    Checkbutton,
    /// Multi-choice, exclusive.
    Radiobutton,
    /// Multi-choice list.
    Listbox,
    /// Numeric slider.
    Scale,
    /// Numeric stepper.
    Spinbox,
    /// Hierarchical browser.
    Treeview,
    /// Read-only display.
    Label,
}

/// The feature columns the classifier sees for one argument/return row.
/// This is the wire format of the collaborator boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Type tag (`int`, `str`, ...).
    pub ty: String,
    pub is_argument: bool,
    pub has_lower_bound: bool,
    pub has_upper_bound: bool,
    /// Number of enumerated possible values (0 when unconstrained).
    pub choice_count: usize,
    /// `upper - lower` when both bounds are finite, else 0.
    pub range: f64,
}

/// Extract the classifier request from a scanned table: one vector per
/// argument/return row, in table order.
pub fn feature_vectors(table: &FeatureTable) -> Vec<FeatureVector> {
    let mut out = Vec::new();
    for row in &table.rows {
        match row {
            FeatureRow::Argument(a) => {
                let lo = has_lower_bound(a.lower);
                let hi = has_upper_bound(a.upper);
                out.push(FeatureVector {
                    ty: a.ty.name().to_string(),
                    is_argument: true,
                    has_lower_bound: lo,
                    has_upper_bound: hi,
                    choice_count: choice_count(&a.possible_values),
                    range: if lo && hi { a.upper - a.lower } else { 0.0 },
                });
            }
            FeatureRow::Return(r) => {
                out.push(FeatureVector {
                    ty: r.ty.name().to_string(),
                    is_argument: false,
                    has_lower_bound: false,
                    has_upper_bound: false,
                    choice_count: 0,
                    range: 0.0,
                });
            }
            FeatureRow::Method(_) => {}
        }
    }
    out
}

fn choice_count(possible_values: &str) -> usize {
    if possible_values.is_empty() {
        0
    } else {
        possible_values.split(',').count()
    }
}

pub trait WidgetClassifier {
    /// Predict one control kind per feature row, aligned by index.
    fn predict(&self, rows: &[FeatureVector]) -> Result<Vec<WidgetKind>>;
}

// ---------------------------------------------------------------------------
// Rule-based default
// ---------------------------------------------------------------------------

/// Deterministic rule-based predictor. Stands in for the trained model when
/// none is configured; satisfies the same contract.
#[derive(Debug, Default)]
pub struct HeuristicClassifier;

/// Bounded numeric ranges up to this width render better as a slider than
/// as a stepper.
const SLIDER_RANGE_MAX: f64 = 1000.0;

/// Choice sets up to this size fit a radio group; larger sets get a list.
const RADIO_CHOICE_MAX: usize = 4;

impl WidgetClassifier for HeuristicClassifier {
    fn predict(&self, rows: &[FeatureVector]) -> Result<Vec<WidgetKind>> {
        Ok(rows.iter().map(predict_one).collect())
    }
}

fn predict_one(row: &FeatureVector) -> WidgetKind {
    let ty = PyType::from_name(&row.ty);

    if !row.is_argument {
        return match ty {
            Some(PyType::List | PyType::Tuple | PyType::Set | PyType::Dict) => WidgetKind::Treeview,
            _ => WidgetKind::Label,
        };
    }

    if row.choice_count > 0 {
        return if row.choice_count <= RADIO_CHOICE_MAX {
            WidgetKind::Radiobutton
        } else {
            WidgetKind::Listbox
        };
    }

    match ty {
        Some(PyType::Bool) => WidgetKind::Checkbutton,
        Some(PyType::Int | PyType::Float) => {
            if row.has_lower_bound && row.has_upper_bound && row.range <= SLIDER_RANGE_MAX {
                WidgetKind::Scale
            } else {
                WidgetKind::Spinbox
            }
        }
        Some(PyType::List | PyType::Tuple | PyType::Set | PyType::Dict) => WidgetKind::Treeview,
        _ => WidgetKind::Entry,
    }
}

// ---------------------------------------------------------------------------
// External predictor (subprocess over JSON)
// ---------------------------------------------------------------------------

/// Talks to an external classifier process: the feature rows go to its stdin
/// as a JSON array, a JSON array of kind names comes back on stdout.
/// Invoked synchronously at the stage boundary.
#[derive(Debug)]
pub struct ExternalClassifier {
    command: String,
    args: Vec<String>,
}

impl ExternalClassifier {
    pub fn new(command_line: &str) -> Self {
        let mut parts = command_line.split_whitespace().map(String::from);
        let command = parts.next().unwrap_or_default();
        Self {
            command,
            args: parts.collect(),
        }
    }
}

impl WidgetClassifier for ExternalClassifier {
    fn predict(&self, rows: &[FeatureVector]) -> Result<Vec<WidgetKind>> {
        let request = serde_json::to_vec(rows)
            .map_err(|e| Error::Classifier(format!("failed to encode request: {e}")))?;

        let mut child = Command::new(&self.command)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()
            .map_err(|e| Error::Classifier(format!("failed to spawn '{}': {e}", self.command)))?;

        if let Some(stdin) = child.stdin.take() {
            let mut stdin = stdin;
            stdin
                .write_all(&request)
                .map_err(|e| Error::Classifier(format!("failed to write request: {e}")))?;
        }

        let output = child
            .wait_with_output()
            .map_err(|e| Error::Classifier(format!("classifier did not finish: {e}")))?;

        if !output.status.success() {
            return Err(Error::Classifier(format!(
                "classifier exited with {}",
                output.status
            )));
        }

        let kinds: Vec<WidgetKind> = serde_json::from_slice(&output.stdout)
            .map_err(|e| Error::Classifier(format!("failed to decode response: {e}")))?;

        if kinds.len() != rows.len() {
            return Err(Error::ClassifierMisaligned {
                want: rows.len(),
                got: kinds.len(),
            });
        }

        Ok(kinds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arg(ty: &str) -> FeatureVector {
        FeatureVector {
            ty: ty.into(),
            is_argument: true,
            has_lower_bound: false,
            has_upper_bound: false,
            choice_count: 0,
            range: 0.0,
        }
    }

    #[test]
    fn bool_argument_is_a_toggle() {
        assert_eq!(predict_one(&arg("bool")), WidgetKind::Checkbutton);
    }

    #[test]
    fn bounded_int_is_a_slider_unbounded_a_stepper() {
        let mut v = arg("int");
        assert_eq!(predict_one(&v), WidgetKind::Spinbox);
        v.has_lower_bound = true;
        v.has_upper_bound = true;
        v.range = 10.0;
        assert_eq!(predict_one(&v), WidgetKind::Scale);
        v.range = 1e9;
        assert_eq!(predict_one(&v), WidgetKind::Spinbox);
    }

    #[test]
    fn choices_win_over_type() {
        let mut v = arg("str");
        v.choice_count = 3;
        assert_eq!(predict_one(&v), WidgetKind::Radiobutton);
        v.choice_count = 9;
        assert_eq!(predict_one(&v), WidgetKind::Listbox);
    }

    #[test]
    fn scalar_returns_are_labels_containers_are_trees() {
        let mut v = arg("str");
        v.is_argument = false;
        assert_eq!(predict_one(&v), WidgetKind::Label);
        v.ty = "dict".into();
        assert_eq!(predict_one(&v), WidgetKind::Treeview);
    }

    #[test]
    fn kind_names_round_trip_through_json() {
        let json = serde_json::to_string(&WidgetKind::Radiobutton).unwrap();
        assert_eq!(json, "\"radiobutton\"");
        let back: WidgetKind = serde_json::from_str(&json).unwrap();
        assert_eq!(back, WidgetKind::Radiobutton);
    }
}
