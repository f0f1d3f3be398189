//! Error taxonomy of the kernels.
//!
//! Configuration errors (`InvalidEnum`, `InvalidValue`, `MissingKey`)
//! are raised before any computation. Data errors (`NanInSelection`,
//! `EmptySelection`, `ZeroDegree`, `NonFinite`) abort before anything
//! is written back to the store.

use anno_beans::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KernelError {
    #[error("unable to find `{key}` in `{slot}`{}", valid_hint(.valid))]
    MissingKey {
        slot: &'static str,
        key: Box<str>,
        valid: Vec<Box<str>>,
    },

    #[error("invalid {name} `{value}`; valid options are: {}", .valid.join(", "))]
    InvalidEnum {
        name: &'static str,
        value: Box<str>,
        valid: Vec<&'static str>,
    },

    #[error("{0}")]
    InvalidValue(Box<str>),

    #[error("expected `{name}` to be `{expected}`, found `{found}`")]
    Type {
        name: &'static str,
        expected: &'static str,
        found: Box<str>,
    },

    #[error("top `{n_selected}` {modifier} correlated genes contain `{n_nan}` NaN values")]
    NanInSelection {
        modifier: &'static str,
        n_selected: usize,
        n_nan: usize,
    },

    #[error("no {modifier} correlated genes have been selected")]
    EmptySelection { modifier: &'static str },

    #[error("{} node(s) with zero degree, e.g., {:?}; remove isolated cells before density normalization", .nodes.len(), &.nodes[..(.nodes.len().min(5))])]
    ZeroDegree { nodes: Vec<usize> },

    #[error("non-finite values in `{0}`")]
    NonFinite(Box<str>),

    #[error("incomplete specification: no entry for `{key}` and no `*` fallback")]
    IncompleteSpec { key: Box<str> },

    #[error("expected `{what}` of shape {expected:?}, found {found:?}")]
    ShapeMismatch {
        what: Box<str>,
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn valid_hint(valid: &[Box<str>]) -> String {
    if valid.is_empty() {
        String::new()
    } else {
        format!("; valid options are: {}", valid.join(", "))
    }
}

impl KernelError {
    pub fn invalid_value(msg: impl Into<String>) -> Self {
        KernelError::InvalidValue(msg.into().into_boxed_str())
    }

    pub fn missing_key(slot: &'static str, key: &str) -> Self {
        KernelError::MissingKey {
            slot,
            key: key.into(),
            valid: vec![],
        }
    }
}

pub type Result<T> = std::result::Result<T, KernelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_offender() {
        let err = KernelError::MissingKey {
            slot: "layers",
            key: "Ms".into(),
            valid: vec!["X".into(), "spliced".into()],
        };
        assert_eq!(
            err.to_string(),
            "unable to find `Ms` in `layers`; valid options are: X, spliced"
        );

        let err = KernelError::ZeroDegree {
            nodes: vec![3, 7],
        };
        assert!(err.to_string().starts_with("2 node(s) with zero degree, e.g., [3, 7]"));

        let err = KernelError::InvalidEnum {
            name: "aggregation",
            value: "mode".into(),
            valid: vec!["mean", "median"],
        };
        assert!(err.to_string().contains("`mode`"));
    }
}
