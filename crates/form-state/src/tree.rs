//! Arena-backed form tree.
//!
//! Nodes live in a flat arena and refer to each other by index. Paths are
//! never stored on nodes: a named node contributes its name, a row
//! contributes its position among its siblings. Reordering rows therefore
//! moves one index in the parent's child list and every descendant path
//! follows. A path→node index is rebuilt after each structural change so
//! lookups stay O(1).

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use form_model::{FieldKind, FieldName, FormError, Generation, Path, Result, RowId, Value};
use uuid::Uuid;

use crate::capability::{FieldCapabilities, RenderContext};
use crate::field::FieldState;
use crate::registry::CapabilityRegistry;

pub(crate) type NodeId = usize;

/// The root node. It never holds a field itself.
pub(crate) const ROOT: NodeId = 0;

/// Key under which a row carries its identity in reduced data.
pub const ROW_ID_KEY: &str = "id";

/// A fresh row identity seed, unique to one form state.
pub fn unique_row_seed() -> String {
    Uuid::new_v4().simple().to_string()
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    /// `None` for rows and the root.
    pub(crate) name: Option<FieldName>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) field: FieldState,
}

/// The live state of one form: an ordered tree of fields addressed by path.
///
/// Iteration order is pre-order: declaration order for named fields, index
/// order for rows.
#[derive(Debug, Clone)]
pub struct FormState {
    nodes: Vec<Node>,
    free: Vec<NodeId>,
    index: HashMap<Path, NodeId>,
    row_ids: HashSet<RowId>,
    pub(crate) clock: u64,
    row_seed: String,
    rows_minted: u64,
    registry: Arc<CapabilityRegistry>,
}

impl FormState {
    /// An empty form. Row identities are minted from a seed unique to this
    /// state unless [`FormState::with_row_seed`] fixes one.
    pub fn new(registry: Arc<CapabilityRegistry>) -> Self {
        let root = Node {
            name: None,
            parent: None,
            children: Vec::new(),
            field: FieldState::group(None),
        };
        let mut index = HashMap::new();
        index.insert(Path::root(), ROOT);
        Self {
            nodes: vec![root],
            free: Vec::new(),
            index,
            row_ids: HashSet::new(),
            clock: 0,
            row_seed: unique_row_seed(),
            rows_minted: 0,
            registry,
        }
    }

    /// Seed for deterministic row identity minting. The same seed and the
    /// same sequence of actions always yield the same identities.
    #[must_use]
    pub fn with_row_seed(mut self, seed: impl Into<String>) -> Self {
        self.row_seed = seed.into();
        self
    }

    /// Continue minting row identities where `previous` left off, so no
    /// identity it handed out is minted again.
    pub(crate) fn inherit_row_minting(&mut self, previous: &FormState) {
        self.row_seed.clone_from(&previous.row_seed);
        self.rows_minted = self.rows_minted.max(previous.rows_minted);
    }

    pub fn registry(&self) -> &Arc<CapabilityRegistry> {
        &self.registry
    }

    /// Number of fields (the root is not a field).
    pub fn len(&self) -> usize {
        self.index.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The latest generation stamp handed out.
    pub fn clock(&self) -> Generation {
        Generation::new(self.clock)
    }

    pub fn contains(&self, path: &Path) -> bool {
        !path.is_root() && self.index.contains_key(path)
    }

    /// Read one field. Fails with `UnknownPath` if absent.
    pub fn get_field(&self, path: &Path) -> Result<&FieldState> {
        let id = self.find_field(path)?;
        Ok(&self.nodes[id].field)
    }

    /// Read one field's value. Fails with `UnknownPath` if absent.
    pub fn get_value(&self, path: &Path) -> Result<&Value> {
        self.get_field(path).map(FieldState::value)
    }

    /// All fields with their current paths, in order.
    pub fn iter(&self) -> impl Iterator<Item = (Path, &FieldState)> + '_ {
        self.walk(ROOT)
            .into_iter()
            .skip(1)
            .map(|(path, id)| (path, &self.nodes[id].field))
    }

    pub fn paths(&self) -> Vec<Path> {
        self.iter().map(|(path, _)| path).collect()
    }

    /// Row identities of a repeating group, in index order.
    pub fn rows(&self, group: &Path) -> Result<Vec<RowId>> {
        let array = self.find_array(group)?;
        Ok(self.nodes[array]
            .children
            .iter()
            .filter_map(|row| self.nodes[*row].field.row_id)
            .collect())
    }

    /// Current path of the row with the given identity.
    pub fn row_path(&self, row_id: RowId) -> Option<Path> {
        self.index
            .iter()
            .find(|(_, id)| self.nodes[**id].field.row_id == Some(row_id))
            .map(|(path, _)| path.clone())
    }

    /// The field and every ancestor pass their conditions.
    pub fn is_visible(&self, path: &Path) -> Result<bool> {
        let id = self.find_field(path)?;
        Ok(self.node_visible(id))
    }

    /// Any field differs from its value at load time.
    pub fn is_dirty(&self) -> bool {
        self.iter().any(|(_, field)| field.is_dirty())
    }

    /// Reduce the form to nested data: groups and rows become objects
    /// (rows carry their identity under `id`), arrays become lists.
    pub fn to_values(&self) -> Value {
        self.data_of(ROOT)
    }

    /// Leaf paths and values, in order.
    pub fn flat_values(&self) -> Vec<(Path, Value)> {
        self.iter()
            .filter(|(_, field)| field.kind() == FieldKind::Leaf)
            .map(|(path, field)| (path, field.value().clone()))
            .collect()
    }

    /// Values of the named siblings of a field, itself included.
    pub fn siblings(&self, path: &Path) -> Result<BTreeMap<String, Value>> {
        let id = self.find_field(path)?;
        Ok(self.siblings_of(id))
    }

    /// Display label from the field's render hook, if it has one.
    pub fn render_label(&self, path: &Path) -> Result<Option<String>> {
        let id = self.find_field(path)?;
        let field = &self.nodes[id].field;
        let Some(hook) = field
            .capabilities
            .as_deref()
            .and_then(FieldCapabilities::render_hook)
        else {
            return Ok(None);
        };
        let data = self.data_of(id);
        let context = RenderContext {
            path,
            field,
            row_index: path.row_index(),
            data: &data,
        };
        Ok(Some(hook.render(&context)))
    }

    /// Verify every structural invariant of the tree.
    pub fn check_invariants(&self) -> Result<()> {
        let mut seen_rows = HashSet::new();
        let mut count = 0usize;

        for (path, id) in self.walk(ROOT) {
            count += 1;
            let node = &self.nodes[id];
            let field = &node.field;

            let mut names = HashSet::new();
            for &child in &node.children {
                let child_node = &self.nodes[child];
                if child_node.parent != Some(id) {
                    return Err(FormError::structural(format!(
                        "a child of '{path}' points at another parent"
                    )));
                }
                match (&child_node.name, field.kind) {
                    (None, FieldKind::Array) => {}
                    (None, kind) => {
                        return Err(FormError::structural(format!(
                            "{} '{path}' holds an unnamed row",
                            kind.label()
                        )));
                    }
                    (Some(name), FieldKind::Array) => {
                        return Err(FormError::structural(format!(
                            "repeating group '{path}' holds named field '{name}'"
                        )));
                    }
                    (Some(name), _) => {
                        if !names.insert(name.as_str()) {
                            return Err(FormError::structural(format!(
                                "'{path}' holds two fields named '{name}'"
                            )));
                        }
                    }
                }
            }

            match field.kind {
                FieldKind::Leaf if !node.children.is_empty() => {
                    return Err(FormError::structural(format!("leaf '{path}' has children")));
                }
                FieldKind::Array if field.row_count != Some(node.children.len()) => {
                    return Err(FormError::structural(format!(
                        "repeating group '{path}' declares {:?} rows but holds {}",
                        field.row_count,
                        node.children.len()
                    )));
                }
                FieldKind::Row => match field.row_id {
                    None => {
                        return Err(FormError::structural(format!("row '{path}' has no identity")));
                    }
                    Some(row_id) if !seen_rows.insert(row_id) => {
                        return Err(FormError::structural(format!(
                            "row identity {row_id} appears twice (again at '{path}')"
                        )));
                    }
                    Some(_) => {}
                },
                _ => {}
            }

            if id != ROOT && node.name.is_none() && field.kind != FieldKind::Row {
                return Err(FormError::structural(format!(
                    "unnamed node at '{path}' is not a row"
                )));
            }
        }

        if count != self.index.len() {
            return Err(FormError::structural("path index is out of date"));
        }
        Ok(())
    }

    // ---- arena internals ----

    pub(crate) fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id]
    }

    pub(crate) fn find(&self, path: &Path) -> Option<NodeId> {
        self.index.get(path).copied()
    }

    /// Like [`FormState::find`], but the root is not a field.
    pub(crate) fn find_field(&self, path: &Path) -> Result<NodeId> {
        match self.find(path) {
            Some(id) if id != ROOT => Ok(id),
            _ => Err(FormError::unknown(path)),
        }
    }

    pub(crate) fn find_array(&self, group: &Path) -> Result<NodeId> {
        let id = self.find_field(group)?;
        let kind = self.nodes[id].field.kind;
        if kind != FieldKind::Array {
            return Err(FormError::structural(format!(
                "'{group}' is a {}, not a repeating group",
                kind.label()
            )));
        }
        Ok(id)
    }

    /// Every field node, in order.
    pub(crate) fn field_ids(&self) -> Vec<NodeId> {
        let mut ids = self.subtree(ROOT);
        ids.remove(0);
        ids
    }

    pub(crate) fn path_of(&self, id: NodeId) -> Path {
        let mut chain = Vec::new();
        let mut current = id;
        while let Some(parent) = self.nodes[current].parent {
            chain.push((parent, current));
            current = parent;
        }
        chain.iter().rev().fold(Path::root(), |path, &(parent, child)| {
            let position = self.nodes[parent]
                .children
                .iter()
                .position(|c| *c == child)
                .unwrap_or_default();
            self.child_path(&path, child, position)
        })
    }

    fn child_path(&self, parent_path: &Path, child: NodeId, position: usize) -> Path {
        match &self.nodes[child].name {
            Some(name) => parent_path.join(name),
            None => parent_path.row(position),
        }
    }

    /// Pre-order `(path, node)` pairs of the subtree at `from`.
    pub(crate) fn walk(&self, from: NodeId) -> Vec<(Path, NodeId)> {
        let mut out = Vec::new();
        let mut stack = vec![(self.path_of(from), from)];
        while let Some((path, id)) = stack.pop() {
            for (position, &child) in self.nodes[id].children.iter().enumerate().rev() {
                stack.push((self.child_path(&path, child, position), child));
            }
            out.push((path, id));
        }
        out
    }

    /// Pre-order node ids of the subtree at `from`, itself included.
    pub(crate) fn subtree(&self, from: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            stack.extend(self.nodes[id].children.iter().rev());
            out.push(id);
        }
        out
    }

    pub(crate) fn reindex(&mut self) {
        self.index = self.walk(ROOT).into_iter().collect();
    }

    /// Index one appended node without a full rebuild.
    pub(crate) fn reindex_insert(&mut self, path: Path, id: NodeId) {
        self.index.insert(path, id);
    }

    /// Next stamp of the form-wide generation clock.
    pub(crate) fn tick(&mut self) -> Generation {
        self.clock += 1;
        Generation::new(self.clock)
    }

    /// Give every field a fresh stamp, in order.
    pub(crate) fn restamp_all(&mut self) {
        for id in self.field_ids() {
            let generation = self.tick();
            self.nodes[id].field.generation = generation;
        }
    }

    /// Store a new, detached node stamped with the next generation.
    pub(crate) fn alloc(&mut self, name: Option<FieldName>, mut field: FieldState) -> NodeId {
        field.generation = self.tick();
        let node = Node {
            name,
            parent: None,
            children: Vec::new(),
            field,
        };
        if let Some(id) = self.free.pop() {
            self.nodes[id] = node;
            id
        } else {
            self.nodes.push(node);
            self.nodes.len() - 1
        }
    }

    /// Link `child` under `parent`, at `position` or at the end.
    pub(crate) fn attach(&mut self, parent: NodeId, child: NodeId, position: Option<usize>) {
        self.nodes[child].parent = Some(parent);
        let children = &mut self.nodes[parent].children;
        match position {
            Some(position) if position < children.len() => children.insert(position, child),
            _ => children.push(child),
        }
    }

    pub(crate) fn detach(&mut self, child: NodeId) {
        if let Some(parent) = self.nodes[child].parent.take() {
            self.nodes[parent].children.retain(|c| *c != child);
        }
    }

    /// Release a detached subtree back to the arena.
    pub(crate) fn free_subtree(&mut self, from: NodeId) {
        for id in self.subtree(from) {
            if let Some(row_id) = self.nodes[id].field.row_id {
                self.row_ids.remove(&row_id);
            }
            self.nodes[id].children.clear();
            self.nodes[id].parent = None;
            self.free.push(id);
        }
    }

    /// Reserve a row identity: `preferred` if it is still free, otherwise
    /// the next minted one that does not collide.
    pub(crate) fn claim_row_id(&mut self, preferred: Option<RowId>) -> RowId {
        if let Some(id) = preferred
            && self.row_ids.insert(id)
        {
            return id;
        }
        loop {
            let id = RowId::derive(&self.row_seed, self.rows_minted);
            self.rows_minted += 1;
            if self.row_ids.insert(id) {
                return id;
            }
        }
    }

    pub(crate) fn node_visible(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if !self.nodes[node].field.passes_condition {
                return false;
            }
            current = self.nodes[node].parent;
        }
        true
    }

    /// Nested data of the subtree at `id`.
    pub(crate) fn data_of(&self, id: NodeId) -> Value {
        let node = &self.nodes[id];
        match node.field.kind {
            FieldKind::Leaf => node.field.value.clone(),
            FieldKind::Array => {
                Value::List(node.children.iter().map(|row| self.data_of(*row)).collect())
            }
            FieldKind::Group | FieldKind::Row => {
                let mut map = self.named_children_data(id);
                if let Some(row_id) = node.field.row_id {
                    map.insert(ROW_ID_KEY.to_string(), Value::from(row_id.to_hex()));
                }
                Value::Object(map)
            }
        }
    }

    pub(crate) fn named_children_data(&self, parent: NodeId) -> BTreeMap<String, Value> {
        self.nodes[parent]
            .children
            .iter()
            .filter_map(|child| {
                self.nodes[*child]
                    .name
                    .as_ref()
                    .map(|name| (name.as_str().to_string(), self.data_of(*child)))
            })
            .collect()
    }

    pub(crate) fn siblings_of(&self, id: NodeId) -> BTreeMap<String, Value> {
        match self.nodes[id].parent {
            Some(parent) => self.named_children_data(parent),
            None => BTreeMap::new(),
        }
    }
}
