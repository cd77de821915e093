//! Conditional visibility.
//!
//! Each condition names the siblings it reads. When a field's value
//! changes, only siblings whose condition lists that field's name are
//! re-evaluated; a failing condition hides the field without touching its
//! value or validity.

use form_model::Value;

use crate::capability::ConditionContext;
use crate::tree::{FormState, NodeId};

impl FormState {
    fn evaluate_condition(&self, id: NodeId, data: &Value) -> Option<bool> {
        let condition = self.node(id).field.capabilities()?.condition()?;
        let siblings = self.siblings_of(id);
        Some(condition.evaluate(&ConditionContext {
            siblings: &siblings,
            data,
        }))
    }

    /// Re-evaluate the conditions of `ids`; returns the nodes whose
    /// visibility flipped.
    pub(crate) fn evaluate_conditions(&mut self, ids: &[NodeId]) -> Vec<NodeId> {
        let data = self.to_values();
        let mut flipped = Vec::new();
        for &id in ids {
            let Some(passes) = self.evaluate_condition(id, &data) else {
                continue;
            };
            let field = &mut self.node_mut(id).field;
            if field.passes_condition != passes {
                field.passes_condition = passes;
                flipped.push(id);
            }
        }
        flipped
    }

    /// Re-evaluate every sibling of `changed` whose condition reads it.
    pub(crate) fn refresh_dependents(&mut self, changed: NodeId) -> Vec<NodeId> {
        let node = self.node(changed);
        let (Some(parent), Some(name)) = (node.parent, node.name.as_ref()) else {
            return Vec::new();
        };
        let dependents: Vec<NodeId> = self
            .node(parent)
            .children
            .iter()
            .copied()
            .filter(|sibling| {
                self.node(*sibling)
                    .field
                    .capabilities()
                    .and_then(|caps| caps.condition())
                    .is_some_and(|condition| condition.reads(name.as_str()))
            })
            .collect();
        if dependents.is_empty() {
            return Vec::new();
        }
        self.evaluate_conditions(&dependents)
    }
}
