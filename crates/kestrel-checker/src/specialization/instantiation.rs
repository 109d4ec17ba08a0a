//! Specializing polymorphic functions at call sites.

use std::sync::Arc;

use kestrel_ast::CallExpr;
use kestrel_core::{CheckError, FnFlags, TypeId};
use tracing::{debug, trace};

use crate::checker::Checker;
use crate::conversion::default_type;
use crate::entity::Entity;
use crate::operand::Operand;
use crate::scope::ScopeKind;

use super::{
    FunctionSpecialization, GenericFunction, GenericId, PolyBindings, SpecializationHeader,
    SpecializationId, mangle,
};

impl Checker<'_> {
    /// The specialization of `generic` for a call with checked `args`.
    ///
    /// Binds the placeholders from the argument types, then returns the
    /// cached specialization for that binding or checks a new one.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub(crate) fn specialize(
        &mut self,
        generic: GenericId,
        call: &CallExpr,
        args: &[Operand],
    ) -> Option<SpecializationId> {
        let def = self.program.generics[generic.0 as usize].clone();
        let bindings = self.bind_arguments(&def, call, args)?;

        let mut key = Vec::with_capacity(def.placeholders.len());
        for placeholder in &def.placeholders {
            let Some(bound) = bindings.get(*placeholder) else {
                self.report(CheckError::UnresolvedPlaceholder {
                    placeholder: self.entity(*placeholder).name.clone(),
                    function: def.name.clone(),
                    span: call.span,
                });
                return None;
            };
            key.push(bound);
        }

        if let Some(existing) = self.cached_specialization(&def, &key) {
            trace!(function = %def.name, "specialization cache hit");
            return Some(existing);
        }
        Some(self.instantiate(generic, &def, call, key))
    }

    fn cached_specialization(&self, def: &GenericFunction, key: &[TypeId]) -> Option<SpecializationId> {
        def.specializations
            .iter()
            .copied()
            .find(|id| self.program.specializations[id.0 as usize].key == key)
    }

    /// Bind placeholders declared by parameters to the argument types.
    ///
    /// Only parameters that declare a `$` placeholder bind; other
    /// parameters are converted once the specialization's signature is
    /// known. A polymorphic variadic slot binds from its first excess
    /// argument, or from a spread slice.
    fn bind_arguments(&mut self, def: &GenericFunction, call: &CallExpr, args: &[Operand]) -> Option<PolyBindings> {
        let mut bindings = PolyBindings::default();
        let slice_variadic = def.flags.contains(FnFlags::VARIADIC);
        let fixed = if def.is_variadic() {
            def.params.len().saturating_sub(1)
        } else {
            def.params.len()
        };

        for (i, (arg, operand)) in call.args.iter().zip(args).enumerate() {
            let (param, pattern) = if i < fixed {
                let param = &def.params[i];
                (param, param.ty)
            } else if slice_variadic && let Some(param) = def.params.last() {
                let spread = matches!(&arg.value, kestrel_ast::Expr::Variadic(_));
                if spread {
                    (param, param.ty)
                } else if i == fixed {
                    (param, self.types().element(param.ty).unwrap_or(param.ty))
                } else {
                    continue;
                }
            } else {
                continue;
            };
            if !param.polymorphic {
                continue;
            }

            if operand.is_nil() {
                self.report(CheckError::SpecializationMismatch {
                    param: self.display(pattern),
                    arg: "nil".to_string(),
                    span: arg.value.span(),
                });
                return None;
            }
            let arg_ty = default_type(operand.ty);
            if !bindings.bind(self.types(), pattern, arg_ty) {
                self.report(CheckError::SpecializationMismatch {
                    param: self.display(pattern),
                    arg: self.display(arg_ty),
                    span: arg.value.span(),
                });
                return None;
            }
        }
        Some(bindings)
    }

    /// Check a fresh copy of the generic's body under `key`.
    fn instantiate(
        &mut self,
        generic: GenericId,
        def: &GenericFunction,
        call: &CallExpr,
        key: Vec<TypeId>,
    ) -> SpecializationId {
        let id = SpecializationId(self.program.specializations.len() as u32);
        let body = (*def.template).clone();

        let previous = self.enter_file(def.file);
        let saved_declaring = self.declaring.take();
        let scope = self.push_boundary(def.declaring_scope, ScopeKind::Specialization);
        {
            let frame = self.contexts.top_mut();
            frame.specialization_call = Some(call.span);
            frame.function = def.entity;
        }
        self.push_owned_table();

        // each placeholder becomes a type constant naming its binding
        for (placeholder, bound) in def.placeholders.iter().zip(&key) {
            let original = self.entity(*placeholder);
            let clone = Entity::new(original.name.clone(), original.span, original.flags).in_scope(scope);
            let clone = self.program.entities.alloc(clone);
            let meta = self.types_mut().metatype(*bound);
            self.resolve_entity(clone, meta, None);
            if self.bind(scope, clone, true).is_err() {
                unreachable!("placeholder bound twice in one specialization");
            }
        }

        let signature = self.check_signature(&body.signature, true);
        assert!(
            !self.types().is_polymorphic(signature.ty),
            "specialization of '{}' left a placeholder unbound",
            def.name
        );

        let key_names: Vec<String> = key.iter().map(|ty| self.display(*ty)).collect();
        let prefix = match &self.program.options.mangle_root {
            Some(root) => root.clone(),
            None => self.program.files[def.file.index()].module.clone(),
        };
        let mangled_name = mangle(&prefix, &def.name, &key_names);
        debug!(mangled = %mangled_name, "specializing");

        // registered before the body so recursive calls find it
        self.program.specializations.push(SpecializationHeader {
            generic,
            key: key.clone(),
            fn_type: signature.ty,
            mangled_name: mangled_name.clone(),
        });
        self.program.generics[generic.0 as usize].specializations.push(id);

        self.contexts.top_mut().expected_return = Some(signature.result);
        self.check_body(&body.body, signature.result);

        let table = self.pop_owned_table();
        self.pop_context();
        self.declaring = saved_declaring;
        self.leave_file(previous);

        let specialization = Arc::new(FunctionSpecialization {
            id,
            generic,
            name: def.name.clone(),
            mangled_name,
            key,
            key_names,
            fn_type: signature.ty,
            signature: self.display(signature.ty),
            file: def.file,
            scope,
            params: signature.params,
            body,
            table,
        });
        self.program.finished.push(Arc::clone(&specialization));
        self.shared.push(specialization);
        id
    }
}
