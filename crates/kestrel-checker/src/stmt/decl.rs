//! Declarations: `x := v`, `x: T = v`, `x: T`, `C :: v` and blocks of them.
//!
//! File-scope declarations get their entities in the collection pass and
//! are checked on first use; local ones create their entities here. A
//! local constant is visible in its own value, so function literals can
//! recurse; a local variable only after its initializer.
//!
//! A constant whose value denotes a type declares a named type. For
//! struct, union and enum literals the name exists before the body is
//! checked, so fields may point back at the type.

use kestrel_ast::{DeclBlock, Declaration, Expr, Ident};
use kestrel_core::{CheckError, EntityId, TypeId, TypeKind};
use rustc_hash::FxHashSet;

use crate::checker::Checker;
use crate::conversion::identical_underlying;
use crate::entity::EntityFlags;
use crate::operand::{Mode, Operand};

/// Entity flags for the names of a declaration.
pub(crate) fn declaration_flags(decl: &Declaration, block: Option<&DeclBlock>) -> EntityFlags {
    let mut flags = if decl.constant {
        EntityFlags::CONSTANT
    } else {
        EntityFlags::VARIABLE
    };
    if block.is_some_and(|b| b.foreign.is_some()) {
        flags |= EntityFlags::FOREIGN;
    }
    flags
}

/// The symbol name a declared entity links under, if it is not its own.
pub(crate) fn link_name(decl: &Declaration, block: Option<&DeclBlock>, name: &str) -> Option<String> {
    if let Some(linkname) = &decl.linkname {
        return Some(linkname.clone());
    }
    let prefix = block.and_then(|b| b.linkprefix.as_deref())?;
    Some(format!("{prefix}{name}"))
}

fn is_foreign(block: Option<&DeclBlock>) -> bool {
    block.is_some_and(|b| b.foreign.is_some())
}

impl Checker<'_> {
    /// Check a declaration, giving each of its entities a type.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub(crate) fn check_declaration(&mut self, decl: &Declaration, block: Option<&DeclBlock>) {
        let (entities, local) = self.declaration_entities(decl, block);
        let explicit = decl.ty.as_ref().map(|ty| self.check_type(ty));

        let dependencies = if decl.constant {
            if local {
                for entity in &entities {
                    self.declare(*entity);
                }
            }
            self.check_constant_decl(decl, block, &entities, explicit)
        } else {
            let dependencies = self.check_variable_decl(decl, block, &entities, explicit);
            if local {
                for entity in &entities {
                    self.declare(*entity);
                }
            }
            dependencies
        };
        if !dependencies.is_empty() {
            self.table_mut()
                .dependencies
                .entry(decl.id)
                .or_default()
                .extend(dependencies);
        }
    }

    /// A local block of declarations, e.g. a `#foreign` block in a body.
    pub(crate) fn check_decl_block(&mut self, block: &DeclBlock) {
        if let Some(library) = &block.foreign {
            self.check_foreign_library(library);
        }
        for decl in &block.decls {
            self.check_declaration(decl, Some(block));
        }
    }

    /// Resolve the library a `#foreign` block names.
    pub(crate) fn check_foreign_library(&mut self, library: &Ident) {
        match self.lookup(&library.name) {
            Some(entity) if self.entity(entity).is(EntityFlags::LIBRARY) => {
                self.record_entity(library, entity);
            }
            _ => self.report(CheckError::UndefinedIdentifier {
                name: library.name.clone(),
                span: library.span,
            }),
        }
    }

    /// Entities made by the collection pass, or new local ones.
    fn declaration_entities(&mut self, decl: &Declaration, block: Option<&DeclBlock>) -> (Vec<EntityId>, bool) {
        if let Some(existing) = self.table().declared.get(&decl.id) {
            return (existing.clone(), false);
        }
        let flags = declaration_flags(decl, block);
        let entities: Vec<EntityId> = decl
            .names
            .iter()
            .map(|name| {
                let entity = self.new_entity(name, flags);
                if entity != EntityId::ANONYMOUS {
                    self.entity_mut(entity).linkname = link_name(decl, block, &name.name);
                }
                entity
            })
            .collect();
        self.table_mut().declared.insert(decl.id, entities.clone());
        (entities, true)
    }

    fn invalidate(&mut self, entities: &[EntityId]) {
        for entity in entities {
            self.resolve_entity(*entity, TypeId::INVALID, None);
        }
    }

    // ========================================================================
    // Constants
    // ========================================================================

    fn check_constant_decl(
        &mut self,
        decl: &Declaration,
        block: Option<&DeclBlock>,
        entities: &[EntityId],
        explicit: Option<TypeId>,
    ) -> FxHashSet<EntityId> {
        let mut dependencies = FxHashSet::default();
        if decl.values.len() != decl.names.len() {
            self.report(CheckError::DeclarationArity {
                names: decl.names.len(),
                values: decl.values.len(),
                span: decl.span,
            });
            for value in &decl.values {
                self.check_expr(value, None);
            }
            self.invalidate(entities);
            return dependencies;
        }

        for (entity, value) in entities.iter().zip(&decl.values) {
            let operand = self.check_constant_value(*entity, value, explicit, is_foreign(block));
            dependencies.extend(operand.dependencies);
        }
        dependencies
    }

    fn check_constant_value(
        &mut self,
        entity: EntityId,
        value: &Expr,
        explicit: Option<TypeId>,
        foreign: bool,
    ) -> Operand {
        let named = entity != EntityId::ANONYMOUS && explicit.is_none() && !foreign;
        let stub = match value.unparen() {
            Expr::Struct(_) | Expr::Union(_) | Expr::Enum(_) if named => Some(self.named_stub(entity)),
            _ => None,
        };

        let takes_name = matches!(value.unparen(), Expr::Func(_) | Expr::Struct(_))
            && entity != EntityId::ANONYMOUS;
        let saved = if takes_name {
            self.declaring.replace(entity)
        } else {
            None
        };
        let mut operand = self.check_expr(value, explicit);
        if takes_name {
            self.declaring = saved;
        }

        if operand.is_nil() && explicit.is_none() {
            self.report(CheckError::NilNeedsType { span: value.span() });
            operand = Operand::invalid();
        }
        if operand.is_invalid() {
            self.resolve_entity(entity, TypeId::INVALID, None);
            return operand;
        }

        match operand.mode {
            Mode::Type => self.declare_type(entity, value, &operand, stub, foreign),
            Mode::File => {
                self.report(CheckError::NotAnExpression {
                    expr: format!("'{value}'"),
                    span: value.span(),
                });
                self.resolve_entity(entity, TypeId::INVALID, None);
            }
            _ => {
                if let Some(ty) = explicit {
                    self.convert(&mut operand, ty, value);
                }
                let is_function = self.types().is_function(operand.ty);
                if !operand.is_invalid() && operand.constant.is_none() && !is_function {
                    let name = self.entity(entity).name.clone();
                    self.report(CheckError::NotConstant {
                        what: format!("value of '{name}'"),
                        span: value.span(),
                    });
                    operand = Operand::invalid();
                }
                if is_function && entity != EntityId::ANONYMOUS {
                    self.entity_mut(entity).flags |= EntityFlags::FUNCTION;
                }
                self.resolve_entity(entity, operand.ty, operand.constant.clone());
            }
        }
        operand
    }

    /// A named type for `entity` whose base is set once its value is known.
    fn named_stub(&mut self, entity: EntityId) -> TypeId {
        let name = self.entity(entity).name.clone();
        let named = self.types_mut().named(entity, &name);
        let meta = self.types_mut().metatype(named);
        let e = self.entity_mut(entity);
        e.flags |= EntityFlags::TYPE;
        e.ty = Some(meta);
        named
    }

    fn declare_type(&mut self, entity: EntityId, value: &Expr, operand: &Operand, stub: Option<TypeId>, foreign: bool) {
        let instance = self.types().lower_metatype(operand.ty).unwrap_or(TypeId::INVALID);

        // a foreign function is declared by its signature
        if foreign && self.types().is_function(instance) {
            if let Expr::FuncType(ft) = value.unparen()
                && let Some(labels) = &ft.labels
            {
                let labels = labels.iter().map(|l| Some(l.name.clone())).collect();
                self.program.function_labels.insert(entity, labels);
            }
            self.entity_mut(entity).flags |= EntityFlags::FUNCTION;
            self.resolve_entity(entity, instance, None);
            return;
        }
        if entity == EntityId::ANONYMOUS {
            return;
        }

        let named = match stub {
            Some(named) => named,
            None => {
                let name = self.entity(entity).name.clone();
                self.types_mut().named(entity, &name)
            }
        };
        self.types_mut().set_named_base(entity, instance);
        let meta = self.types_mut().metatype(named);
        self.entity_mut(entity).flags |= EntityFlags::TYPE;
        self.resolve_entity(entity, meta, None);
    }

    // ========================================================================
    // Variables
    // ========================================================================

    fn check_variable_decl(
        &mut self,
        decl: &Declaration,
        block: Option<&DeclBlock>,
        entities: &[EntityId],
        explicit: Option<TypeId>,
    ) -> FxHashSet<EntityId> {
        let count = decl.names.len();
        let mut dependencies = FxHashSet::default();
        let mut types = vec![explicit.unwrap_or(TypeId::INVALID); count];

        if decl.values.is_empty() {
            self.check_uninitialized(decl, block, explicit, &mut types);
        } else if decl.values.len() == count {
            for (slot, value) in types.iter_mut().zip(&decl.values) {
                let operand = self.check_initializer(value, explicit);
                *slot = operand.ty;
                dependencies.extend(operand.dependencies);
            }
        } else if decl.values.len() == 1 {
            let value = &decl.values[0];
            let operand = self.check_value(value, None);
            dependencies.extend(operand.dependencies.iter().copied());
            if !operand.is_invalid() {
                let elems = self.types().tuple_elems(operand.ty);
                if elems.len() != count {
                    self.report(CheckError::DeclarationArity {
                        names: count,
                        values: elems.len(),
                        span: decl.span,
                    });
                    types.fill(TypeId::INVALID);
                } else {
                    for (slot, elem) in types.iter_mut().zip(elems) {
                        *slot = self.destructured(value, elem, explicit);
                    }
                }
            } else {
                types.fill(TypeId::INVALID);
            }
        } else {
            self.report(CheckError::DeclarationArity {
                names: count,
                values: decl.values.len(),
                span: decl.span,
            });
            for value in &decl.values {
                self.check_expr(value, None);
            }
            types.fill(TypeId::INVALID);
        }

        for (entity, ty) in entities.iter().zip(types) {
            self.resolve_entity(*entity, ty, None);
        }
        dependencies
    }

    fn check_uninitialized(
        &mut self,
        decl: &Declaration,
        block: Option<&DeclBlock>,
        explicit: Option<TypeId>,
        types: &mut [TypeId],
    ) {
        let Some(ty) = explicit else {
            for name in &decl.names {
                self.report(CheckError::MissingType {
                    name: name.name.clone(),
                    span: name.span,
                });
            }
            return;
        };
        if ty.is_invalid() {
            return;
        }
        if matches!(self.types().base_kind(ty), TypeKind::Array { len: None, .. }) {
            self.report(CheckError::UninitializedImplicitArray { span: decl.span });
            types.fill(TypeId::INVALID);
        } else if self.types().is_function(ty) && !is_foreign(block) {
            for name in &decl.names {
                self.report(CheckError::UninitializedFunction {
                    name: name.name.clone(),
                    span: name.span,
                });
            }
        }
    }

    /// Check one initializer against the declared type, or default it.
    fn check_initializer(&mut self, value: &Expr, explicit: Option<TypeId>) -> Operand {
        let Some(ty) = explicit else {
            let mut operand = self.check_value(value, None);
            if operand.is_nil() {
                self.report(CheckError::NilNeedsType { span: value.span() });
                return Operand::invalid();
            }
            self.default_operand(&mut operand, value);
            return operand;
        };

        // `[..]T` takes its length from the value
        if let TypeKind::Array { len: None, elem } = *self.types().base_kind(ty) {
            let operand = self.check_value(value, Some(ty));
            if operand.is_invalid() {
                return operand;
            }
            let fits = matches!(
                self.types().base_kind(operand.ty),
                TypeKind::Array { len: Some(_), elem: e } if *e == elem
            );
            if !fits {
                self.report(CheckError::CannotConvert {
                    value: self.describe(value, &operand),
                    target: self.display(ty),
                    span: value.span(),
                });
                return Operand::invalid();
            }
            return operand;
        }

        self.check_converted(value, ty)
    }

    /// The type of one element of a multi-value initializer.
    fn destructured(&mut self, value: &Expr, elem: TypeId, explicit: Option<TypeId>) -> TypeId {
        let Some(ty) = explicit else {
            return elem;
        };
        if elem == ty || identical_underlying(self.types(), elem, ty) {
            return ty;
        }
        self.report(CheckError::CannotConvert {
            value: format!("'{value}' (type {})", self.display(elem)),
            target: self.display(ty),
            span: value.span(),
        });
        TypeId::INVALID
    }
}

#[cfg(test)]
mod tests {
    use kestrel_ast::AstBuilder;
    use kestrel_core::{ConstValue, FileId, TypeId};

    use crate::testing::check_source;

    #[test]
    fn untyped_constants_default_in_variables() {
        let mut b = AstBuilder::new(FileId(0));
        let five = b.int(5);
        let y = b.var_item("y", None, Some(five));
        let c = b.int(7);
        let c = b.const_item("c", c);
        let file = b.finish("main.k", vec![y, c]);

        let (program, _) = check_source(vec![file]);
        assert!(!program.has_errors(), "{}", program.render_diagnostics());
        let y = program.lookup(FileId(0), "y").unwrap();
        assert_eq!(program.entity(y).ty, Some(TypeId::I64));
        let c = program.lookup(FileId(0), "c").unwrap();
        assert_eq!(program.entity(c).ty, Some(TypeId::UNTYPED_INT));
        assert_eq!(program.entity(c).constant, Some(ConstValue::Int(7)));
    }

    #[test]
    fn declared_type_retypes_the_literal() {
        let mut b = AstBuilder::new(FileId(0));
        let f32_ty = b.name("f32");
        let five = b.int(5);
        let z = b.var_item("z", Some(f32_ty), Some(five));
        let file = b.finish("main.k", vec![z]);

        let (program, _) = check_source(vec![file]);
        let z = program.lookup(FileId(0), "z").unwrap();
        assert_eq!(program.entity(z).ty, Some(TypeId::F32));
    }

    #[test]
    fn uninitialized_declarations() {
        let mut b = AstBuilder::new(FileId(0));
        let missing = b.var_item("a", None, None);
        let i32_ty = b.name("i32");
        let implicit = b.array_type(None, i32_ty);
        let array = b.var_item("b", Some(implicit), None);
        let func_ty = b.func_type(vec![], vec![]);
        let func = b.var_item("f", Some(func_ty), None);
        let file = b.finish("main.k", vec![missing, array, func]);

        let (program, _) = check_source(vec![file]);
        let diagnostics = program.diagnostics(FileId(0));
        assert!(diagnostics.contains("declaration of 'a' needs a type or an initial value"));
        assert!(diagnostics.contains("implicit-length array must have an initial value"));
        assert!(diagnostics.contains("function variable 'f' must be initialized"));
    }

    #[test]
    fn constants_must_be_constant() {
        let mut b = AstBuilder::new(FileId(0));
        let i64_ty = b.name("i64");
        let v = b.var_item("v", Some(i64_ty), None);
        let reference = b.name("v");
        let c = b.const_item("c", reference);
        let file = b.finish("main.k", vec![v, c]);

        let (program, _) = check_source(vec![file]);
        assert!(program.diagnostics(FileId(0)).contains("value of 'c' must be a compile-time constant"));
    }

    #[test]
    fn struct_may_point_to_itself() {
        let mut b = AstBuilder::new(FileId(0));
        let node = b.name("Node");
        let next = b.pointer_type(node);
        let i64_ty = b.name("i64");
        let st = b.struct_type(vec![("value", i64_ty), ("next", next)]);
        let decl = b.const_item("Node", st);
        let file = b.finish("main.k", vec![decl]);

        let (program, _) = check_source(vec![file]);
        assert!(!program.has_errors(), "{}", program.render_diagnostics());
        let node = program.lookup(FileId(0), "Node").unwrap();
        assert!(program.entity(node).is_type());
    }

    #[test]
    fn cyclic_aliases_are_rejected() {
        let mut b = AstBuilder::new(FileId(0));
        let to_b = b.name("B");
        let a = b.const_item("A", to_b);
        let to_a = b.name("A");
        let bb = b.const_item("B", to_a);
        let file = b.finish("main.k", vec![a, bb]);

        let (program, _) = check_source(vec![file]);
        assert!(program.diagnostics(FileId(0)).contains("invalid recursive declaration of 'A'"));
    }
}
