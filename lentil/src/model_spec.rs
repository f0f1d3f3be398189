//! Resolution of per-key settings with a `*` fallback.
//!
//! A setting (a model, a callback, ...) can be given once for all
//! keys, per key, or per key with a wildcard default for the rest.
//! Resolution turns any of these into one entry per requested key or
//! fails if some key is left uncovered.

use crate::error::{KernelError, Result};
use crate::logging::Logger;
use std::collections::{BTreeMap, HashSet};

pub const WILDCARD: &str = "*";

/// Entries in the order of the requested keys
pub type Resolved<V> = Vec<(Box<str>, V)>;

fn unique_keys(keys: &[Box<str>]) -> Vec<&str> {
    let mut seen = HashSet::new();
    keys.iter()
        .map(|k| k.as_ref())
        .filter(|&k| seen.insert(k))
        .collect()
}

/// Complete `explicit` for `keys` using `wildcard`.
///
/// Explicit entries win. A key with neither an explicit entry nor a
/// wildcard yields [`KernelError::IncompleteSpec`] naming the first
/// such key. Explicit entries for keys that were not requested are
/// ignored.
pub fn resolve<V: Clone>(
    explicit: &BTreeMap<Box<str>, V>,
    wildcard: Option<&V>,
    keys: &[Box<str>],
    logger: &Logger,
) -> Result<Resolved<V>> {
    let unique = unique_keys(keys);

    let requested: HashSet<&str> = unique.iter().copied().collect();
    let ignored: Vec<&str> = explicit
        .keys()
        .map(|k| k.as_ref())
        .filter(|&k| k != WILDCARD && !requested.contains(k))
        .collect();
    if !ignored.is_empty() {
        logger.warning(&format!(
            "Ignoring settings for unrequested keys: {}",
            ignored.join(", ")
        ));
    }

    unique
        .into_iter()
        .map(|key| -> Result<(Box<str>, V)> {
            let value = explicit
                .get(key)
                .or(wildcard)
                .cloned()
                .ok_or_else(|| KernelError::IncompleteSpec { key: key.into() })?;
            Ok((key.into(), value))
        })
        .collect()
}

/// Settings of one observation (e.g., a gene) across lineages
#[derive(Clone, Debug)]
pub enum LineageSpec<M> {
    /// the same setting for every lineage
    Shared(M),
    /// per-lineage settings; `*` covers the remaining lineages
    PerLineage(BTreeMap<Box<str>, M>),
}

/// Two-level specification over (observation, lineage)
#[derive(Clone, Debug)]
pub enum ModelSpec<M> {
    Shared(M),
    /// per-observation settings; `*` covers the remaining observations
    PerObs(BTreeMap<Box<str>, LineageSpec<M>>),
}

fn resolve_lineages<M: Clone>(
    spec: &LineageSpec<M>,
    lineages: &[Box<str>],
    logger: &Logger,
) -> Result<Resolved<M>> {
    match spec {
        LineageSpec::Shared(m) => Ok(unique_keys(lineages)
            .into_iter()
            .map(|lin| (lin.into(), m.clone()))
            .collect()),
        LineageSpec::PerLineage(map) => resolve(map, map.get(WILDCARD), lineages, logger),
    }
}

/// Resolve a two-level specification for every (obs, lineage) pair
pub fn resolve_nested<M: Clone>(
    spec: &ModelSpec<M>,
    obs: &[Box<str>],
    lineages: &[Box<str>],
    logger: &Logger,
) -> Result<Resolved<Resolved<M>>> {
    match spec {
        ModelSpec::Shared(m) => {
            let shared = LineageSpec::Shared(m.clone());
            unique_keys(obs)
                .into_iter()
                .map(|o| -> Result<(Box<str>, Resolved<M>)> {
                    Ok((o.into(), resolve_lineages(&shared, lineages, logger)?))
                })
                .collect()
        }
        ModelSpec::PerObs(map) => {
            let per_obs = resolve(map, map.get(WILDCARD), obs, logger)?;
            per_obs
                .into_iter()
                .map(|(o, lin_spec)| -> Result<(Box<str>, Resolved<M>)> {
                    let resolved = resolve_lineages(&lin_spec, lineages, logger).map_err(|e| {
                        match e {
                            KernelError::IncompleteSpec { key } => KernelError::IncompleteSpec {
                                key: format!("{}/{}", o, key).into_boxed_str(),
                            },
                            other => other,
                        }
                    })?;
                    Ok((o, resolved))
                })
                .collect()
        }
    }
}
