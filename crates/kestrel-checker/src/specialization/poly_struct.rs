//! Polymorphic structs: `Pair :: struct($A, $B) { a: A; b: B; }`.
//!
//! The template is checked once with its placeholders unbound. Each
//! distinct list of type arguments in `Pair(i32, f64)` produces one named
//! instance, `Pair$i32$f64`, whose fields are the template's with the
//! placeholders substituted.

use indexmap::IndexMap;
use kestrel_ast::{CallExpr, StructType};
use kestrel_core::{CheckError, StructDef, StructField, TypeId, TypeKind};
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::checker::Checker;
use crate::entity::{Entity, EntityFlags};
use crate::expr::types::{check_poly_type, struct_fields};
use crate::operand::Operand;
use crate::scope::ScopeKind;
use crate::table::CallKind;

use super::{PolyStruct, PolyStructId, mangle};

impl Checker<'_> {
    /// Check a polymorphic struct template.
    pub(crate) fn check_poly_struct(&mut self, st: &StructType) -> Operand {
        let declaring_scope = self.scope();
        let scope = self.push_scope(ScopeKind::Specialization);

        let mut placeholders = Vec::with_capacity(st.poly_params.len());
        for poly in &st.poly_params {
            let operand = check_poly_type(self, poly);
            self.record(poly.id, &operand);
            let entity = poly
                .explicit
                .as_ident()
                .and_then(|ident| self.program.scopes.lookup_local(scope, &ident.name));
            if let Some(member) = entity
                && !placeholders.contains(&member.entity)
            {
                placeholders.push(member.entity);
            }
        }
        let mut def = struct_fields(self, st);
        self.pop_context();

        def.packed = st.packed;
        def.polymorphic = true;
        let ty = self.types_mut().add_struct(def);

        let entity = self.declaring;
        let name = match entity {
            Some(entity) => self.entity(entity).name.clone(),
            None => "struct".to_string(),
        };
        let id = PolyStructId(self.program.poly_structs.len() as u32);
        debug!(name = %name, placeholders = placeholders.len(), "registered polymorphic struct");
        self.program.poly_structs.push(PolyStruct {
            entity,
            name,
            file: self.file,
            declaring_scope,
            placeholders,
            ty,
            instances: Vec::new(),
        });
        self.table_mut().poly_structs.insert(st.id, id);

        let meta = self.types_mut().metatype(ty);
        Operand::type_(meta)
    }

    fn poly_struct_of(&self, ty: TypeId) -> Option<PolyStructId> {
        let base = self.types().base(ty);
        self.program
            .poly_structs
            .iter()
            .position(|poly| poly.ty == base)
            .map(|index| PolyStructId(index as u32))
    }

    /// Whether `ty` is an uninstantiated polymorphic struct.
    pub(crate) fn is_poly_struct(&self, ty: TypeId) -> bool {
        match self.types().base_kind(ty) {
            TypeKind::Struct(id) => self.types().struct_def(*id).polymorphic,
            _ => false,
        }
    }

    /// `Pair(i32, f64)`: the instance of a polymorphic struct.
    pub(crate) fn instantiate_struct(&mut self, call: &CallExpr, ty: TypeId) -> Operand {
        let Some(id) = self.poly_struct_of(ty) else {
            return Operand::invalid();
        };
        let poly = self.program.poly_structs[id.0 as usize].clone();

        let mut key = Vec::with_capacity(call.args.len());
        let mut ok = true;
        for arg in &call.args {
            let arg_ty = self.check_type(&arg.value);
            if arg_ty.is_invalid() {
                ok = false;
            } else if self.types().is_polymorphic(arg_ty) {
                self.report(CheckError::UnsupportedPolymorphicType {
                    expr: format!("'{}'", arg.value),
                    span: arg.value.span(),
                });
                ok = false;
            }
            key.push(arg_ty);
        }
        if call.args.len() != poly.placeholders.len() {
            self.report(CheckError::PolyStructArity {
                name: poly.name.clone(),
                expected: poly.placeholders.len(),
                found: call.args.len(),
                span: call.span,
            });
            return Operand::invalid();
        }
        if !ok {
            return Operand::invalid();
        }

        let instance = match poly.instances.iter().find(|(k, _)| *k == key) {
            Some((_, instance)) => *instance,
            None => self.new_struct_instance(id, &poly, key),
        };
        self.table_mut()
            .calls
            .insert(call.id, CallKind::TypeInstance(instance));
        let meta = self.types_mut().metatype(instance);
        Operand::type_(meta)
    }

    fn new_struct_instance(&mut self, id: PolyStructId, poly: &PolyStruct, key: Vec<TypeId>) -> TypeId {
        let bindings: FxHashMap<_, _> = poly.placeholders.iter().copied().zip(key.iter().copied()).collect();
        let TypeKind::Struct(template) = *self.types().kind(poly.ty) else {
            unreachable!("polymorphic struct without a struct type");
        };
        let template = self.types().struct_def(template).clone();

        let mut fields = IndexMap::with_capacity(template.fields.len());
        let mut width = 0u32;
        for field in template.fields.values() {
            let ty = self.types_mut().substitute(field.ty, &bindings);
            let field_width = self.types().width(ty).unwrap_or(0);
            fields.insert(
                field.name.clone(),
                StructField {
                    ty,
                    offset: width,
                    ..field.clone()
                },
            );
            width = if template.packed {
                width + field_width
            } else {
                (width + field_width).div_ceil(8) * 8
            };
        }
        let def = StructDef {
            fields,
            width,
            packed: template.packed,
            polymorphic: false,
        };
        let base = self.types_mut().add_struct(def);

        let key_names: Vec<String> = key.iter().map(|ty| self.display(*ty)).collect();
        let name = mangle("", &poly.name, &key_names);
        let span = poly
            .entity
            .map(|entity| self.entity(entity).span)
            .unwrap_or_default();
        let entity = Entity::new(name.clone(), span, EntityFlags::TYPE | EntityFlags::CHECKED)
            .in_scope(poly.declaring_scope);
        let entity = self.program.entities.alloc(entity);
        let named = self.types_mut().named(entity, &name);
        self.types_mut().set_named_base(entity, base);
        let meta = self.types_mut().metatype(named);
        self.resolve_entity(entity, meta, None);

        debug!(name = %name, "instantiated polymorphic struct");
        self.program.poly_structs[id.0 as usize]
            .instances
            .push((key, named));
        named
    }
}
