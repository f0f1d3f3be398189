use crate::store::StoreError;
use fnv::FnvHashMap as HashMap;

/// A metadata column aligned with the rows of a `Frame`
#[derive(Clone, Debug, PartialEq)]
pub enum Column {
    Float(Vec<f64>),
    Int(Vec<i64>),
    Bool(Vec<bool>),
    Str(Vec<Box<str>>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Float(v) => v.len(),
            Column::Int(v) => v.len(),
            Column::Bool(v) => v.len(),
            Column::Str(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Column::Float(_) => "float",
            Column::Int(_) => "int",
            Column::Bool(_) => "bool",
            Column::Str(_) => "str",
        }
    }

    /// Numeric view of the column; strings are not numeric
    pub fn to_f64(&self) -> Option<Vec<f64>> {
        match self {
            Column::Float(v) => Some(v.clone()),
            Column::Int(v) => Some(v.iter().map(|&x| x as f64).collect()),
            Column::Bool(v) => Some(v.iter().map(|&x| if x { 1.0 } else { 0.0 }).collect()),
            Column::Str(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<&[bool]> {
        match self {
            Column::Bool(v) => Some(v),
            _ => None,
        }
    }

    fn format_value(&self, i: usize) -> String {
        match self {
            Column::Float(v) => format!("{}", v[i]),
            Column::Int(v) => format!("{}", v[i]),
            Column::Bool(v) => format!("{}", v[i]),
            Column::Str(v) => v[i].to_string(),
        }
    }
}

/// Named rows (cells or genes) with named columns of equal length
#[derive(Clone, Debug, Default)]
pub struct Frame {
    names: Vec<Box<str>>,
    position: HashMap<Box<str>, usize>,
    columns: Vec<(Box<str>, Column)>,
}

impl Frame {
    /// Create a frame without any columns. For duplicated names only
    /// the first occurrence can be looked up.
    pub fn new(names: Vec<Box<str>>) -> Self {
        let mut position = HashMap::default();
        for (i, name) in names.iter().enumerate() {
            position.entry(name.clone()).or_insert(i);
        }
        if position.len() < names.len() {
            log::warn!(
                "{} duplicated names; only the first occurrence is indexed",
                names.len() - position.len()
            );
        }
        Frame {
            names,
            position,
            columns: vec![],
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[Box<str>] {
        &self.names
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.position.get(name).copied()
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.position.contains_key(name)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(k, _)| k.as_ref())
    }

    pub fn get(&self, key: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|(k, _)| k.as_ref() == key)
            .map(|(_, c)| c)
    }

    /// Numeric column by key
    pub fn get_f64(&self, slot: &'static str, key: &str) -> Result<Vec<f64>, StoreError> {
        let column = self.get(key).ok_or_else(|| StoreError::MissingKey {
            slot,
            key: key.into(),
        })?;
        column.to_f64().ok_or_else(|| StoreError::ColumnType {
            slot,
            key: key.into(),
            expected: "numeric",
            found: column.type_name(),
        })
    }

    /// Insert or replace a column; its length must match the rows
    pub fn insert(&mut self, key: &str, column: Column) -> Result<(), StoreError> {
        if column.len() != self.len() {
            return Err(StoreError::LengthMismatch {
                what: key.into(),
                expected: self.len(),
                found: column.len(),
            });
        }
        match self.columns.iter_mut().find(|(k, _)| k.as_ref() == key) {
            Some((_, existing)) => *existing = column,
            None => self.columns.push((key.into(), column)),
        }
        Ok(())
    }

    /// Tab-separated lines with a `name` header followed by every column
    pub fn to_tsv_lines(&self) -> Vec<Box<str>> {
        let mut lines = Vec::with_capacity(self.len() + 1);
        let header: Vec<&str> = std::iter::once("name").chain(self.keys()).collect();
        lines.push(header.join("\t").into_boxed_str());

        for (i, name) in self.names.iter().enumerate() {
            let mut fields = vec![name.to_string()];
            fields.extend(self.columns.iter().map(|(_, c)| c.format_value(i)));
            lines.push(fields.join("\t").into_boxed_str());
        }
        lines
    }
}
