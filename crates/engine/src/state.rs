//! Desired record state
//!
//! A record description is a tree of named sections. Each entry of a section
//! is a scalar field, a nested section, or a table (an ordered list of
//! homogeneous rows). The tree is validated when it is built, so the rest of
//! the engine never sees a table row with nested values or rows with
//! mismatched field sets.

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_yaml::{Mapping, Number, Value};
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use crate::error::{EngineError, EngineResult};

/// Identifier used to address a live control on the form
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
#[serde(transparent)]
pub struct FieldId(String);

impl FieldId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a repeating table (panel) on the form
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
#[serde(transparent)]
pub struct TableId(String);

impl TableId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A leaf value
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    /// Kept as parsed so `1.0` stays `1.0` rather than collapsing to `1`
    Number(Number),
    Text(String),
}

impl Scalar {
    /// The string the UI renders for this value. Null is an explicitly
    /// blank field. Booleans render capitalized, the way QAD shows them.
    pub fn to_ui_string(&self) -> String {
        match self {
            Scalar::Null => String::new(),
            Scalar::Bool(true) => "True".to_string(),
            Scalar::Bool(false) => "False".to_string(),
            Scalar::Number(n) => n.to_string(),
            Scalar::Text(s) => s.clone(),
        }
    }

    fn from_yaml(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(Scalar::Null),
            Value::Bool(b) => Some(Scalar::Bool(*b)),
            Value::Number(n) => Some(Scalar::Number(n.clone())),
            Value::String(s) => Some(Scalar::Text(s.clone())),
            Value::Tagged(tagged) => Self::from_yaml(&tagged.value),
            Value::Sequence(_) | Value::Mapping(_) => None,
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Text(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::Text(s)
    }
}

impl From<i64> for Scalar {
    fn from(i: i64) -> Self {
        Scalar::Number(i.into())
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Bool(b)
    }
}

/// One record of a repeating table
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    cells: Vec<(String, Scalar)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, replacing any existing cell of the same name
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Scalar>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Scalar>) {
        let name = name.into();
        let value = value.into();
        match self.cells.iter_mut().find(|(k, _)| *k == name) {
            Some(cell) => cell.1 = value,
            None => self.cells.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Scalar> {
        self.cells.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Scalar)> {
        self.cells.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn field_names(&self) -> BTreeSet<&str> {
        self.cells.iter().map(|(k, _)| k.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (name, value)) in self.cells.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {:?}", name, value.to_ui_string())?;
        }
        f.write_str("}")
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (name, value) in &self.cells {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// An entry of a section
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Scalar(Scalar),
    Section(Section),
    Table(Vec<Row>),
}

/// Ordered mapping of names to nodes
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Section {
    entries: Vec<(String, Node)>,
}

impl Section {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node. Duplicate names are rejected.
    pub fn insert(&mut self, name: impl Into<String>, node: Node) -> EngineResult<()> {
        let name = name.into();
        if self.get(&name).is_some() {
            return Err(EngineError::Schema(format!("duplicate entry `{}`", name)));
        }
        if let Node::Table(rows) = &node {
            check_homogeneous(&name, rows)?;
        }
        self.entries.push((name, node));
        Ok(())
    }

    /// Builder-style insert for literals known to be valid
    pub fn with(mut self, name: impl Into<String>, node: impl Into<Node>) -> Self {
        let name = name.into();
        self.entries.retain(|(k, _)| *k != name);
        self.entries.push((name, node.into()));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Node> {
        self.entries.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        match self.get(name) {
            Some(Node::Section(s)) => Some(s),
            _ => None,
        }
    }

    pub fn scalar(&self, name: &str) -> Option<&Scalar> {
        match self.get(name) {
            Some(Node::Scalar(s)) => Some(s),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every scalar field in depth-first order, tables excluded
    pub fn scalar_fields(&self) -> Vec<(FieldId, &Scalar)> {
        let mut out = Vec::new();
        self.collect_scalars(&mut out);
        out
    }

    fn collect_scalars<'a>(&'a self, out: &mut Vec<(FieldId, &'a Scalar)>) {
        for (name, node) in &self.entries {
            match node {
                Node::Scalar(value) => out.push((FieldId::new(name.clone()), value)),
                Node::Section(section) => section.collect_scalars(out),
                Node::Table(_) => {}
            }
        }
    }

    /// Every table in depth-first order
    pub fn tables(&self) -> Vec<(&str, &[Row])> {
        let mut out = Vec::new();
        self.collect_tables(&mut out);
        out
    }

    fn collect_tables<'a>(&'a self, out: &mut Vec<(&'a str, &'a [Row])>) {
        for (name, node) in &self.entries {
            match node {
                Node::Table(rows) => out.push((name.as_str(), rows.as_slice())),
                Node::Section(section) => section.collect_tables(out),
                Node::Scalar(_) => {}
            }
        }
    }
}

impl From<Scalar> for Node {
    fn from(s: Scalar) -> Self {
        Node::Scalar(s)
    }
}

impl From<&str> for Node {
    fn from(s: &str) -> Self {
        Node::Scalar(Scalar::from(s))
    }
}

impl From<Section> for Node {
    fn from(s: Section) -> Self {
        Node::Section(s)
    }
}

impl From<Vec<Row>> for Node {
    fn from(rows: Vec<Row>) -> Self {
        Node::Table(rows)
    }
}

pub(crate) fn check_homogeneous(table: &str, rows: &[Row]) -> EngineResult<()> {
    let Some(first) = rows.first() else {
        return Ok(());
    };
    let expected = first.field_names();
    for (index, row) in rows.iter().enumerate().skip(1) {
        if row.field_names() != expected {
            return Err(EngineError::Schema(format!(
                "row {} of table `{}` has fields {:?}, expected {:?}",
                index, table, row.field_names(), expected
            )));
        }
    }
    Ok(())
}

/// Caller-supplied target description of one record
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DesiredState {
    root: Section,
}

impl DesiredState {
    pub fn new(root: Section) -> Self {
        Self { root }
    }

    /// Parse a record description from YAML
    pub fn from_yaml(yaml: &str) -> EngineResult<Self> {
        let value: Value = serde_yaml::from_str(yaml)
            .map_err(|e| EngineError::Schema(format!("YAML parse error: {}", e)))?;
        Self::try_from(value)
    }

    /// Parse a record description from a YAML file
    pub fn from_file(path: &Path) -> EngineResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            EngineError::Schema(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&content)
    }

    pub fn root(&self) -> &Section {
        &self.root
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.root.section(name)
    }
}

impl TryFrom<Value> for DesiredState {
    type Error = EngineError;

    fn try_from(value: Value) -> EngineResult<Self> {
        match value {
            Value::Mapping(map) => Ok(Self {
                root: section_from_mapping(&map, "")?,
            }),
            Value::Null => Ok(Self::default()),
            other => Err(EngineError::Schema(format!(
                "record description must be a mapping, found {}",
                kind_of(&other)
            ))),
        }
    }
}

fn section_from_mapping(map: &Mapping, path: &str) -> EngineResult<Section> {
    let mut section = Section::new();
    for (key, value) in map {
        let name = key_name(key, path)?;
        let child_path = join_path(path, &name);
        let node = match value {
            Value::Mapping(inner) => Node::Section(section_from_mapping(inner, &child_path)?),
            Value::Sequence(items) => Node::Table(rows_from_sequence(items, &child_path)?),
            scalar => Node::Scalar(Scalar::from_yaml(scalar).ok_or_else(|| {
                EngineError::Schema(format!("unsupported value at `{}`", child_path))
            })?),
        };
        section.insert(name, node)?;
    }
    Ok(section)
}

fn rows_from_sequence(items: &[Value], path: &str) -> EngineResult<Vec<Row>> {
    let mut rows = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let Value::Mapping(map) = item else {
            return Err(EngineError::Schema(format!(
                "row {} of table `{}` must be a mapping, found {}",
                index,
                path,
                kind_of(item)
            )));
        };
        let mut row = Row::new();
        for (key, value) in map {
            let name = key_name(key, path)?;
            let scalar = Scalar::from_yaml(value).ok_or_else(|| {
                EngineError::Schema(format!(
                    "cell `{}` in row {} of table `{}` must be a scalar",
                    name, index, path
                ))
            })?;
            if row.get(&name).is_some() {
                return Err(EngineError::Schema(format!(
                    "duplicate cell `{}` in row {} of table `{}`",
                    name, index, path
                )));
            }
            row.set(name, scalar);
        }
        rows.push(row);
    }
    check_homogeneous(path, &rows)?;
    Ok(rows)
}

fn key_name(key: &Value, path: &str) -> EngineResult<String> {
    match key {
        Value::String(s) => Ok(s.clone()),
        other => Err(EngineError::Schema(format!(
            "keys must be strings, found {} under `{}`",
            kind_of(other),
            if path.is_empty() { "<root>" } else { path }
        ))),
    }
}

pub(crate) fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", parent, name)
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
