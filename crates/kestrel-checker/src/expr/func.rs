//! Function literals and signatures.
//!
//! A literal opens a function scope that hides every control-flow target
//! around it. Its signature is checked first and its type is given to the
//! declaring constant before the body is looked at, so the body may call
//! the function recursively. A signature declaring `$T` placeholders makes
//! the literal generic: the body is left for each specialization.

use std::sync::Arc;

use kestrel_ast::{Block, Expr, FuncLit, FuncType};
use kestrel_core::{CheckError, EntityId, FnFlags, FunctionSig, ScopeId, TypeId};
use tracing::debug;

use crate::checker::Checker;
use crate::entity::EntityFlags;
use crate::operand::Operand;
use crate::return_checker::all_paths_return;
use crate::scope::ScopeKind;
use crate::specialization::{GenericFunction, GenericId, GenericParam};
use crate::table::FunctionInfo;

/// A checked signature.
#[derive(Debug, Clone)]
pub(crate) struct Signature {
    pub ty: TypeId,
    /// Parameter entities; empty when labels were not declared.
    pub params: Vec<EntityId>,
    pub labels: Vec<Option<String>>,
    pub param_types: Vec<TypeId>,
    /// Whether each parameter's type expression declares a placeholder.
    pub poly_params: Vec<bool>,
    pub result: TypeId,
    pub flags: FnFlags,
}

pub(super) fn check_func_type(checker: &mut Checker<'_>, ft: &FuncType) -> Operand {
    let signature = checker.check_signature(ft, false);
    let meta = checker.types_mut().metatype(signature.ty);
    Operand::type_(meta)
}

pub(super) fn check_func_lit(checker: &mut Checker<'_>, func: &FuncLit) -> Operand {
    let entity = checker.declaring.take();
    let outer = checker.scope();
    let scope = checker.push_boundary(outer, ScopeKind::Function);
    checker.contexts.top_mut().function = entity;

    let signature = checker.check_signature(&func.signature, true);
    if let Some(entity) = entity {
        // visible to the body, which may recurse
        checker.entity_mut(entity).ty = Some(signature.ty);
        checker
            .program
            .function_labels
            .insert(entity, signature.labels.clone());
    }

    let polymorphic = signature.flags.contains(FnFlags::POLYMORPHIC);
    if polymorphic {
        register_generic(checker, func, entity, outer, scope, &signature);
    } else {
        checker.contexts.top_mut().expected_return = Some(signature.result);
        checker.check_body(&func.body, signature.result);
    }

    checker.table_mut().functions.insert(
        func.id,
        FunctionInfo {
            ty: signature.ty,
            scope,
            params: signature.params,
            polymorphic,
        },
    );
    checker.pop_context();
    Operand::computed(signature.ty)
}

fn register_generic(
    checker: &mut Checker<'_>,
    func: &FuncLit,
    entity: Option<EntityId>,
    declaring_scope: ScopeId,
    scope: ScopeId,
    signature: &Signature,
) -> GenericId {
    let placeholders: Vec<EntityId> = checker
        .program
        .scopes
        .members(scope)
        .into_iter()
        .map(|(_, member)| member.entity)
        .filter(|e| checker.entity(*e).is(EntityFlags::IMPLICIT_TYPE))
        .collect();
    let params = signature
        .labels
        .iter()
        .zip(&signature.param_types)
        .zip(&signature.poly_params)
        .map(|((label, ty), polymorphic)| GenericParam {
            label: label.clone(),
            ty: *ty,
            polymorphic: *polymorphic,
        })
        .collect();
    let name = match entity {
        Some(entity) => checker.entity(entity).name.clone(),
        None => "function literal".to_string(),
    };

    let id = GenericId(checker.program.generics.len() as u32);
    debug!(name = %name, placeholders = placeholders.len(), "registered polymorphic function");
    checker.program.generics.push(GenericFunction {
        entity,
        name,
        file: checker.file,
        template: Arc::new(func.clone()),
        declaring_scope,
        ty: signature.ty,
        params,
        placeholders,
        flags: signature.flags,
        specializations: Vec::new(),
    });
    if let Some(entity) = entity {
        checker.program.generic_entities.insert(entity, id);
    }
    checker.table_mut().generics.insert(func.id, id);
    id
}

impl Checker<'_> {
    /// Check a signature in the current scope.
    ///
    /// With `declare_labels`, parameter entities are declared in the current
    /// scope once every parameter type is known.
    pub(crate) fn check_signature(&mut self, ft: &FuncType, declare_labels: bool) -> Signature {
        let mut flags = FnFlags::empty();
        let mut param_types = Vec::with_capacity(ft.params.len());
        let mut poly_params = Vec::with_capacity(ft.params.len());

        for (i, param) in ft.params.iter().enumerate() {
            if let Expr::Variadic(variadic) = param
                && i + 1 == ft.params.len()
            {
                flags |= if variadic.c_variadic {
                    FnFlags::C_VARIADIC
                } else {
                    FnFlags::VARIADIC
                };
            }
            param_types.push(self.check_type(param));
            poly_params.push(param.is_polymorphic());
        }

        let results: Vec<TypeId> = ft.results.iter().map(|r| self.check_type(r)).collect();
        let result = self.types_mut().tuple(results);

        let types = self.types();
        if param_types.iter().any(|p| types.is_polymorphic(*p)) || types.is_polymorphic(result) {
            flags |= FnFlags::POLYMORPHIC;
        }
        if ft.discardable {
            if ft.results.is_empty() {
                self.report(CheckError::DiscardableVoid { span: ft.span });
            } else {
                flags |= FnFlags::DISCARDABLE;
            }
        }

        let mut labels = vec![None; ft.params.len()];
        let mut params = Vec::new();
        if let Some(idents) = &ft.labels {
            for (i, ident) in idents.iter().enumerate() {
                if let Some(slot) = labels.get_mut(i) {
                    *slot = Some(ident.name.clone());
                }
                if !declare_labels {
                    continue;
                }
                let mut entity_flags = EntityFlags::PARAMETER | EntityFlags::VARIABLE;
                if poly_params.get(i).copied().unwrap_or(false) {
                    entity_flags |= EntityFlags::POLY_PARAMETER;
                }
                let entity = self.new_entity(ident, entity_flags);
                let ty = param_types.get(i).copied().unwrap_or(TypeId::INVALID);
                self.resolve_entity(entity, ty, None);
                self.declare(entity);
                params.push(entity);
            }
        }

        let ty = self.types_mut().function(FunctionSig {
            params: param_types.clone(),
            result,
            flags,
        });
        let meta = self.types_mut().metatype(ty);
        self.record(ft.id, &Operand::type_(meta));

        Signature {
            ty,
            params,
            labels,
            param_types,
            poly_params,
            result,
            flags,
        }
    }

    /// Check a function body in the current scope and verify it returns.
    pub(crate) fn check_body(&mut self, body: &Block, result: TypeId) {
        for stmt in &body.stmts {
            self.check_stmt(stmt);
        }
        if !self.types().is_void(result) && !all_paths_return(&body.stmts) {
            self.report(CheckError::MissingReturn {
                function: self.function_name(),
                span: body.span,
            });
        }
    }
}
