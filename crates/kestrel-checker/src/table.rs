//! Per-node results of checking.
//!
//! The syntax tree is never mutated. Everything the checker learns about a
//! node is recorded in a [`NodeTable`] keyed by [`NodeId`]: one table per
//! file, plus one table per specialization, whose cloned body reuses the
//! template's node ids.

use kestrel_core::{ConstValue, EntityId, NodeId, ScopeId, TypeId};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::builtins::BuiltinId;
use crate::specialization::{GenericId, PolyStructId, SpecializationId};

/// What a call expression resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    /// An ordinary call through a function value.
    Call,
    Builtin(BuiltinId),
    /// A call to a polymorphic function, routed to its specialization.
    Specialized(SpecializationId),
    /// `Pair(i32, f64)`: instantiation of a polymorphic struct.
    TypeInstance(TypeId),
}

/// What a selector expression resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorKind {
    /// A declaration reached through an import.
    File(EntityId),
    /// Field `index` of a struct, `offset` bits in.
    StructField { index: u32, offset: u32 },
    UnionTag,
    UnionCase(u32),
    /// An enum case selected from the enum type.
    EnumCase(i128),
    /// `len` or `cap` of an array, slice or string.
    Length,
    Capacity,
    /// Data pointer of a slice or string.
    Raw,
    /// Lane `index` of a vector.
    VectorLane(u32),
    /// Lanes reordered into a new vector.
    Swizzle,
    /// The type payload of an `any`.
    AnyType,
    AnyData,
}

/// Labels attached to a loop or switch statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Labels {
    pub break_label: EntityId,
    pub continue_label: Option<EntityId>,
}

/// A conversion the back end must materialise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Conversion {
    pub from: TypeId,
    pub to: TypeId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    Array,
    Slice,
    String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForInInfo {
    pub element: EntityId,
    pub index: Option<EntityId>,
    pub aggregate: Aggregate,
}

/// A name `using` introduced for a field of a struct value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsingField {
    /// The expression whose field the name stands for.
    pub receiver: NodeId,
    pub index: u32,
    pub through_pointer: bool,
}

/// A checked function literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionInfo {
    pub ty: TypeId,
    pub scope: ScopeId,
    pub params: Vec<EntityId>,
    /// The body was left unchecked; it is checked per specialization.
    pub polymorphic: bool,
}

#[derive(Debug, Clone, Default)]
pub struct NodeTable {
    pub types: FxHashMap<NodeId, TypeId>,
    pub constants: FxHashMap<NodeId, ConstValue>,
    /// Entity an identifier (or labelled selector) resolved to.
    pub entities: FxHashMap<NodeId, EntityId>,
    /// Entities a declaration created, one per name.
    pub declared: FxHashMap<NodeId, Vec<EntityId>>,
    /// Entities a declaration's values depend on.
    pub dependencies: FxHashMap<NodeId, FxHashSet<EntityId>>,
    pub calls: FxHashMap<NodeId, CallKind>,
    pub selectors: FxHashMap<NodeId, SelectorKind>,
    pub conversions: FxHashMap<NodeId, Conversion>,
    pub labels: FxHashMap<NodeId, Labels>,
    /// Label entity a branch statement transfers control to.
    pub branch_targets: FxHashMap<NodeId, EntityId>,
    /// Payload binding introduced by a union or `any` case clause.
    pub case_bindings: FxHashMap<NodeId, EntityId>,
    pub for_in: FxHashMap<NodeId, ForInInfo>,
    pub functions: FxHashMap<NodeId, FunctionInfo>,
    /// Polymorphic function literals.
    pub generics: FxHashMap<NodeId, GenericId>,
    pub poly_structs: FxHashMap<NodeId, PolyStructId>,
    pub using_fields: FxHashMap<EntityId, UsingField>,
    /// Which branch a `#if` took.
    pub directives: FxHashMap<NodeId, bool>,
    /// Declarations whose check has started.
    pub(crate) checked: FxHashSet<NodeId>,
}

impl NodeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn type_of(&self, node: NodeId) -> Option<TypeId> {
        self.types.get(&node).copied()
    }

    pub fn constant_of(&self, node: NodeId) -> Option<&ConstValue> {
        self.constants.get(&node)
    }

    pub fn entity_of(&self, node: NodeId) -> Option<EntityId> {
        self.entities.get(&node).copied()
    }

    pub fn declared_by(&self, node: NodeId) -> &[EntityId] {
        self.declared.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn call_kind(&self, node: NodeId) -> Option<CallKind> {
        self.calls.get(&node).copied()
    }

    pub fn selector_kind(&self, node: NodeId) -> Option<SelectorKind> {
        self.selectors.get(&node).copied()
    }

    pub fn conversion(&self, node: NodeId) -> Option<Conversion> {
        self.conversions.get(&node).copied()
    }

    pub fn branch_target(&self, node: NodeId) -> Option<EntityId> {
        self.branch_targets.get(&node).copied()
    }

    pub fn dependencies_of(&self, node: NodeId) -> Option<&FxHashSet<EntityId>> {
        self.dependencies.get(&node)
    }

    /// Record the type of a node, replacing any earlier record.
    pub(crate) fn record_type(&mut self, node: NodeId, ty: TypeId) {
        self.types.insert(node, ty);
    }

    /// Record a node's folded value, or clear a stale one.
    pub(crate) fn record_constant(&mut self, node: NodeId, value: Option<ConstValue>) {
        match value {
            Some(value) => {
                self.constants.insert(node, value);
            }
            None => {
                self.constants.remove(&node);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_replace_earlier_values() {
        let mut table = NodeTable::new();
        table.record_type(NodeId(1), TypeId::UNTYPED_INT);
        table.record_constant(NodeId(1), Some(ConstValue::Int(5)));
        table.record_type(NodeId(1), TypeId::F32);
        table.record_constant(NodeId(1), Some(ConstValue::float(5.0)));

        assert_eq!(table.type_of(NodeId(1)), Some(TypeId::F32));
        assert_eq!(table.constant_of(NodeId(1)), Some(&ConstValue::float(5.0)));

        table.record_constant(NodeId(1), None);
        assert!(table.constant_of(NodeId(1)).is_none());
    }

    #[test]
    fn missing_records() {
        let table = NodeTable::new();
        assert!(table.type_of(NodeId(9)).is_none());
        assert!(table.declared_by(NodeId(9)).is_empty());
        assert!(table.call_kind(NodeId(9)).is_none());
    }
}
