//! `using`: bring the members of an import, an enum or a struct value into
//! the current scope.
//!
//! - an import: its owned declarations, bound without ownership
//! - an enum type: one constant per case
//! - a struct value, or a pointer to one: one variable per field, recorded
//!   as a [`UsingField`] so later stages can rewrite it as a selector

use kestrel_ast::{Expr, UsingStmt};
use kestrel_core::{CheckError, ConstValue, EntityId, ScopeId, Span, TypeId, TypeKind};

use crate::checker::Checker;
use crate::entity::{Entity, EntityFlags};
use crate::operand::{Mode, Operand};
use crate::table::UsingField;

impl Checker<'_> {
    pub(crate) fn check_using(&mut self, using: &UsingStmt) {
        for expr in &using.exprs {
            self.check_using_expr(expr);
        }
    }

    fn check_using_expr(&mut self, expr: &Expr) {
        let operand = self.check_expr(expr, None);
        if operand.is_invalid() {
            return;
        }
        match operand.mode {
            Mode::File => {
                if let TypeKind::File(scope) = *self.types().kind(operand.ty) {
                    self.use_file(scope, expr.span());
                    return;
                }
            }
            Mode::Type => {
                let instance = self.types().lower_metatype(operand.ty);
                if let Some(instance) = instance
                    && self.types().is_enum(instance)
                {
                    self.use_enum_cases(instance, expr.span());
                    return;
                }
            }
            Mode::Nil => {}
            _ => {
                if self.use_struct_fields(expr, &operand) {
                    return;
                }
            }
        }
        self.report(CheckError::InvalidUsing {
            operand: self.describe(expr, &operand),
            span: expr.span(),
        });
    }

    fn use_file(&mut self, scope: ScopeId, span: Span) {
        let members = self.program.scopes.members(scope);
        let current = self.scope();
        for (_, member) in members.into_iter().filter(|(_, member)| member.owned) {
            if let Err(existing) = self.bind(current, member.entity, false) {
                self.report_using_collision(member.entity, existing.entity, span);
            }
        }
    }

    /// Declare every case of `enum_ty` as a constant of the current scope.
    pub(crate) fn use_enum_cases(&mut self, enum_ty: TypeId, span: Span) {
        let TypeKind::Enum(id) = *self.types().base_kind(enum_ty) else {
            return;
        };
        let cases: Vec<(String, i128)> = self
            .types()
            .enum_def(id)
            .cases
            .values()
            .map(|case| (case.name.clone(), case.value))
            .collect();
        for (name, value) in cases {
            let entity = Entity::new(name, span, EntityFlags::CONSTANT | EntityFlags::CHECKED)
                .in_scope(self.scope())
                .with_type(enum_ty)
                .with_constant(ConstValue::Int(value));
            let entity = self.program.entities.alloc(entity);
            self.bind_used(entity, span);
        }
    }

    /// Returns `false` when the operand is not a struct or pointer to one.
    fn use_struct_fields(&mut self, expr: &Expr, operand: &Operand) -> bool {
        let (ty, through_pointer) = match self.types().pointee(operand.ty) {
            Some(pointee) => (pointee, true),
            None => (operand.ty, false),
        };
        let TypeKind::Struct(id) = *self.types().base_kind(ty) else {
            return false;
        };
        let fields: Vec<(String, TypeId, u32)> = self
            .types()
            .struct_def(id)
            .fields
            .values()
            .map(|field| (field.name.clone(), field.ty, field.index))
            .collect();

        let span = expr.span();
        for (name, field_ty, index) in fields {
            let flags = EntityFlags::FIELD | EntityFlags::VARIABLE | EntityFlags::CHECKED;
            let entity = Entity::new(name, span, flags)
                .in_scope(self.scope())
                .with_type(field_ty);
            let entity = self.program.entities.alloc(entity);
            self.table_mut().using_fields.insert(
                entity,
                UsingField {
                    receiver: expr.id(),
                    index,
                    through_pointer,
                },
            );
            self.bind_used(entity, span);
        }
        true
    }

    fn bind_used(&mut self, entity: EntityId, span: Span) {
        let scope = self.scope();
        if let Err(existing) = self.bind(scope, entity, true) {
            self.report_using_collision(entity, existing.entity, span);
        }
    }

    fn report_using_collision(&mut self, entity: EntityId, existing: EntityId, span: Span) {
        let name = self.entity(entity).name.clone();
        let previous = self.entity(existing).span;
        self.report(CheckError::UsingCollision {
            name,
            span,
            previous,
        });
    }
}

#[cfg(test)]
mod tests {
    use kestrel_ast::AstBuilder;
    use kestrel_core::FileId;

    use crate::testing::check_source;

    #[test]
    fn using_an_enum_declares_its_cases() {
        let mut b = AstBuilder::new(FileId(0));
        let color = b.enum_type(None, vec![("Red", None), ("Green", None)]);
        let color = b.const_item("Color", color);

        let ty = b.name("Color");
        let using = b.using(vec![ty]);
        let green = b.name("Green");
        let decl = b.var("c", None, Some(green));
        let func = b.func(vec![], vec![], vec![using, decl]);
        let main = b.const_item("main", func);
        let file = b.finish("main.k", vec![color, main]);

        let (program, _) = check_source(vec![file]);
        assert!(!program.has_errors(), "{}", program.render_diagnostics());
    }

    #[test]
    fn using_a_struct_value_exposes_fields() {
        let mut b = AstBuilder::new(FileId(0));
        let f32_x = b.name("f32");
        let f32_y = b.name("f32");
        let point = b.struct_type(vec![("x", f32_x), ("y", f32_y)]);
        let point = b.const_item("Point", point);

        let ty = b.name("Point");
        let decl = b.var("p", Some(ty), None);
        let p = b.name("p");
        let using = b.using(vec![p]);
        let x = b.name("x");
        let one = b.int(1);
        let assign = b.assign(vec![x], vec![one]);
        let func = b.func(vec![], vec![], vec![decl, using, assign]);
        let main = b.const_item("main", func);
        let file = b.finish("main.k", vec![point, main]);

        let (program, _) = check_source(vec![file]);
        assert!(!program.has_errors(), "{}", program.render_diagnostics());
        assert_eq!(program.table(FileId(0)).using_fields.len(), 2);
    }

    #[test]
    fn using_reports_collisions() {
        let mut b = AstBuilder::new(FileId(0));
        let color = b.enum_type(None, vec![("Red", None)]);
        let color = b.const_item("Color", color);

        let one = b.int(1);
        let red = b.var("Red", None, Some(one));
        let ty = b.name("Color");
        let using = b.using(vec![ty]);
        let func = b.func(vec![], vec![], vec![red, using]);
        let main = b.const_item("main", func);
        let file = b.finish("main.k", vec![color, main]);

        let (program, _) = check_source(vec![file]);
        let diagnostics = program.diagnostics(FileId(0));
        assert!(diagnostics.contains("using introduced a name collision for 'Red'"));
    }

    #[test]
    fn using_a_number_is_invalid() {
        let mut b = AstBuilder::new(FileId(0));
        let one = b.int(1);
        let using = b.using(vec![one]);
        let func = b.func(vec![], vec![], vec![using]);
        let main = b.const_item("main", func);
        let file = b.finish("main.k", vec![main]);

        let (program, _) = check_source(vec![file]);
        assert!(program.diagnostics(FileId(0)).contains("using is invalid on"));
    }
}
