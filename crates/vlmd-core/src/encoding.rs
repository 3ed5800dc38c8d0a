//! Enum constraint resolution from value labels and observed data.

use vlmd_model::{Encodings, Scalar};

/// Decide whether a labelled field gets an enum constraint.
///
/// The candidate enum is the label keys minus the missing values, in label
/// order. It is attached only when every distinct non-null, non-missing
/// observed value is one of the candidates; members are normalized to
/// integers where integral. Fields without labels never get an enum.
pub fn resolve_enum(
    labels: &Encodings,
    missing: &[Scalar],
    observed: &[Scalar],
) -> Option<Vec<Scalar>> {
    let is_missing = |value: &Scalar| missing.iter().any(|code| code.same_value(value));

    let candidate: Vec<Scalar> = labels
        .values()
        .filter(|value| !is_missing(value))
        .map(Scalar::normalized)
        .collect();
    if candidate.is_empty() {
        return None;
    }

    let covered = observed
        .iter()
        .filter(|value| !is_missing(value))
        .all(|value| candidate.iter().any(|code| code.same_value(value)));
    covered.then_some(candidate)
}
