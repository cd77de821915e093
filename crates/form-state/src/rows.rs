//! Structural mutation of repeating groups.
//!
//! Rows are reordered by moving their node within the group's child list,
//! so descendant paths follow without any stored key being rewritten.
//! Every node whose path changed is re-stamped: a validation captured under
//! the old path can then never match the node now living there.

use form_model::{FormError, Path, Result, Validity, Value, rewrite_row_index};

use crate::build::Origin;
use crate::request::{Dispatched, PathRewrite};
use crate::tree::{FormState, NodeId};

impl FormState {
    pub(crate) fn insert_row(&mut self, group: &Path, index: usize, initial: &Value) -> Result<Dispatched> {
        let array = self.find_array(group)?;
        let before = self.node(array).children.clone();
        let index = index.min(before.len());
        let row = self.instantiate_row(array, &group.shape(), Some(initial), Origin::Inserted, Some(index))?;
        Ok(self.finish_rows(group, array, &before, &[row], Vec::new()))
    }

    pub(crate) fn remove_row(&mut self, group: &Path, index: usize) -> Result<Dispatched> {
        let array = self.find_array(group)?;
        let before = self.node(array).children.clone();
        let Some(&row) = before.get(index) else {
            return Err(FormError::unknown(&group.row(index)));
        };
        self.detach(row);
        self.free_subtree(row);
        Ok(self.finish_rows(group, array, &before, &[], vec![group.row(index)]))
    }

    pub(crate) fn move_row(&mut self, group: &Path, from: usize, to: usize) -> Result<Dispatched> {
        let array = self.find_array(group)?;
        let before = self.node(array).children.clone();
        if from >= before.len() {
            return Err(FormError::unknown(&group.row(from)));
        }
        let to = to.min(before.len() - 1);
        if from == to {
            return Ok(Dispatched::default());
        }
        let children = &mut self.node_mut(array).children;
        let row = children.remove(from);
        children.insert(to, row);
        Ok(self.finish_rows(group, array, &before, &[], Vec::new()))
    }

    pub(crate) fn duplicate_row(&mut self, group: &Path, index: usize) -> Result<Dispatched> {
        let array = self.find_array(group)?;
        let before = self.node(array).children.clone();
        let Some(&source) = before.get(index) else {
            return Err(FormError::unknown(&group.row(index)));
        };
        let copy = self.copy_subtree(source, array, Some(index + 1));
        Ok(self.finish_rows(group, array, &before, &[copy], Vec::new()))
    }

    pub(crate) fn set_row_count(&mut self, group: &Path, count: usize) -> Result<Dispatched> {
        let array = self.find_array(group)?;
        let before = self.node(array).children.clone();
        if count == before.len() {
            return Ok(Dispatched::default());
        }

        let mut inserted = Vec::new();
        let mut removed = Vec::new();
        if count > before.len() {
            let shape = group.shape();
            for _ in before.len()..count {
                inserted.push(self.instantiate_row(array, &shape, None, Origin::Inserted, None)?);
            }
        } else {
            for (index, &row) in before.iter().enumerate().skip(count) {
                self.detach(row);
                self.free_subtree(row);
                removed.push(group.row(index));
            }
        }
        Ok(self.finish_rows(group, array, &before, &inserted, removed))
    }

    /// Clone the subtree at `source` under `parent`. Rows get fresh
    /// identities, validated fields start over as `unvalidated`.
    fn copy_subtree(&mut self, source: NodeId, parent: NodeId, position: Option<usize>) -> NodeId {
        let name = self.node(source).name.clone();
        let mut field = self.node(source).field.clone();
        if field.row_id.is_some() {
            let row_id = self.claim_row_id(None);
            field.row_id = Some(row_id);
            field.value = Value::from(row_id.to_hex());
            field.initial_value = Value::Null;
        } else {
            field.initial_value = field.value.clone();
        }
        if field.kind.is_validated() {
            field.validity = Validity::Unvalidated;
        }

        let copy = self.alloc(name, field);
        self.attach(parent, copy, position);
        let children = self.node(source).children.clone();
        for child in children {
            self.copy_subtree(child, copy, None);
        }
        copy
    }

    /// Common tail of every row operation: re-stamp moved rows and report
    /// their rewrites, update the group's row count, evaluate conditions of
    /// new rows and collect validation requests.
    fn finish_rows(
        &mut self,
        group: &Path,
        array: NodeId,
        before: &[NodeId],
        inserted: &[NodeId],
        removed: Vec<Path>,
    ) -> Dispatched {
        self.reindex();
        let after = self.node(array).children.clone();

        let created: Vec<NodeId> = inserted.iter().flat_map(|row| self.subtree(*row)).collect();
        let mut touched = created.clone();
        let mut rewrites = Vec::new();
        for (new_index, row) in after.iter().enumerate() {
            let Some(old_index) = before.iter().position(|r| r == row) else {
                continue;
            };
            if old_index == new_index {
                continue;
            }
            for (path, id) in self.walk(*row) {
                let generation = self.tick();
                self.node_mut(id).field.generation = generation;
                rewrites.push(PathRewrite {
                    from: rewrite_row_index(&path, group, new_index, old_index),
                    to: path,
                });
                touched.push(id);
            }
        }

        let mut flipped = Vec::new();
        if after.len() != before.len() {
            let generation = self.tick();
            let field = &mut self.node_mut(array).field;
            field.set_row_count(after.len());
            field.generation = generation;
            field.validity = Validity::Unvalidated;
            touched.push(array);
            flipped = self.refresh_dependents(array);
        }
        flipped.extend(self.evaluate_conditions(&created));

        Dispatched {
            validations: self.validation_requests(&touched),
            rewrites,
            removed,
            inserted: inserted.iter().map(|row| self.path_of(*row)).collect(),
            visibility_changed: flipped.into_iter().map(|id| self.path_of(id)).collect(),
            discarded: false,
        }
    }
}
