use crate::expr_matrix::ExprMatrix;
use crate::frame::Frame;
use nalgebra_sparse::CsrMatrix;
use ndarray::Array2;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unable to find `{key}` in `{slot}`")]
    MissingKey { slot: &'static str, key: Box<str> },

    #[error("expected `{what}` of shape {expected:?}, found {found:?}")]
    ShapeMismatch {
        what: Box<str>,
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("expected `{what}` of length {expected}, found {found}")]
    LengthMismatch {
        what: Box<str>,
        expected: usize,
        found: usize,
    },

    #[error("expected `{slot}[{key}]` to be {expected}, found {found}")]
    ColumnType {
        slot: &'static str,
        key: Box<str>,
        expected: &'static str,
        found: &'static str,
    },

    #[error("index {index} is out of bounds for length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("{0}")]
    Invalid(Box<str>),
}

/// Unnormalized counterpart of the primary matrix; it shares the
/// cells but may carry a different set of genes
#[derive(Clone, Debug)]
pub struct RawData {
    pub x: ExprMatrix,
    pub var: Frame,
}

/// A cell x gene matrix with aligned metadata:
///
/// * `x` - primary matrix
/// * `raw` - optional raw matrix with its own gene index
/// * `layers` - alternative matrices with the shape of `x`
/// * `obs`/`var` - per-cell and per-gene columns
/// * `uns` - unstructured parameters
/// * `obsp` - cell x cell sparse matrices (e.g., kNN connectivities)
/// * `obsm` - dense per-cell embeddings
///
/// All mutation goes through `&mut self`, so a store has a single
/// writer at any time.
#[derive(Clone, Debug)]
pub struct AnnoStore {
    x: ExprMatrix,
    raw: Option<RawData>,
    layers: BTreeMap<Box<str>, ExprMatrix>,
    obs: Frame,
    var: Frame,
    uns: Map<String, Value>,
    obsp: BTreeMap<Box<str>, CsrMatrix<f64>>,
    obsm: BTreeMap<Box<str>, Array2<f64>>,
}

impl AnnoStore {
    pub fn new(
        x: ExprMatrix,
        obs_names: Vec<Box<str>>,
        var_names: Vec<Box<str>>,
    ) -> Result<Self, StoreError> {
        let expected = (obs_names.len(), var_names.len());
        if x.shape() != expected {
            return Err(StoreError::ShapeMismatch {
                what: "X".into(),
                expected,
                found: x.shape(),
            });
        }
        Ok(AnnoStore {
            x,
            raw: None,
            layers: BTreeMap::new(),
            obs: Frame::new(obs_names),
            var: Frame::new(var_names),
            uns: Map::new(),
            obsp: BTreeMap::new(),
            obsm: BTreeMap::new(),
        })
    }

    pub fn n_obs(&self) -> usize {
        self.obs.len()
    }

    pub fn n_vars(&self) -> usize {
        self.var.len()
    }

    pub fn obs_names(&self) -> &[Box<str>] {
        self.obs.names()
    }

    pub fn var_names(&self) -> &[Box<str>] {
        self.var.names()
    }

    pub fn x(&self) -> &ExprMatrix {
        &self.x
    }

    pub fn raw(&self) -> Option<&RawData> {
        self.raw.as_ref()
    }

    pub fn set_raw(&mut self, x: ExprMatrix, var_names: Vec<Box<str>>) -> Result<(), StoreError> {
        let expected = (self.n_obs(), var_names.len());
        if x.shape() != expected {
            return Err(StoreError::ShapeMismatch {
                what: "raw.X".into(),
                expected,
                found: x.shape(),
            });
        }
        self.raw = Some(RawData {
            x,
            var: Frame::new(var_names),
        });
        Ok(())
    }

    pub fn add_layer(&mut self, name: &str, layer: ExprMatrix) -> Result<(), StoreError> {
        if layer.shape() != self.x.shape() {
            return Err(StoreError::ShapeMismatch {
                what: format!("layers[{}]", name).into_boxed_str(),
                expected: self.x.shape(),
                found: layer.shape(),
            });
        }
        self.layers.insert(name.into(), layer);
        Ok(())
    }

    pub fn has_layer(&self, name: &str) -> bool {
        self.layers.contains_key(name)
    }

    pub fn layer(&self, name: &str) -> Result<&ExprMatrix, StoreError> {
        self.layers.get(name).ok_or_else(|| StoreError::MissingKey {
            slot: "layers",
            key: name.into(),
        })
    }

    /// Layer names in sorted order
    pub fn layer_names(&self) -> Vec<&str> {
        self.layers.keys().map(|k| k.as_ref()).collect()
    }

    pub fn obs(&self) -> &Frame {
        &self.obs
    }

    pub fn obs_mut(&mut self) -> &mut Frame {
        &mut self.obs
    }

    pub fn var(&self) -> &Frame {
        &self.var
    }

    pub fn var_mut(&mut self) -> &mut Frame {
        &mut self.var
    }

    pub fn uns(&self) -> &Map<String, Value> {
        &self.uns
    }

    pub fn uns_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.uns
    }

    pub fn add_obsp(&mut self, key: &str, mat: CsrMatrix<f64>) -> Result<(), StoreError> {
        let expected = (self.n_obs(), self.n_obs());
        let found = (mat.nrows(), mat.ncols());
        if found != expected {
            return Err(StoreError::ShapeMismatch {
                what: format!("obsp[{}]", key).into_boxed_str(),
                expected,
                found,
            });
        }
        self.obsp.insert(key.into(), mat);
        Ok(())
    }

    pub fn obsp(&self, key: &str) -> Result<&CsrMatrix<f64>, StoreError> {
        self.obsp.get(key).ok_or_else(|| StoreError::MissingKey {
            slot: "obsp",
            key: key.into(),
        })
    }

    pub fn add_obsm(&mut self, key: &str, mat: Array2<f64>) -> Result<(), StoreError> {
        if mat.nrows() != self.n_obs() {
            return Err(StoreError::LengthMismatch {
                what: format!("obsm[{}]", key).into_boxed_str(),
                expected: self.n_obs(),
                found: mat.nrows(),
            });
        }
        self.obsm.insert(key.into(), mat);
        Ok(())
    }

    pub fn obsm(&self, key: &str) -> Result<&Array2<f64>, StoreError> {
        self.obsm.get(key).ok_or_else(|| StoreError::MissingKey {
            slot: "obsm",
            key: key.into(),
        })
    }

    pub fn has_obsm(&self, key: &str) -> bool {
        self.obsm.contains_key(key)
    }
}
