//! `switch` statements.
//!
//! The subject decides how case matches are read:
//! - no subject: each match is a boolean condition
//! - a union or `any`: each match names a member (or a type), and the
//!   payload is bound under the binding name inside the clause
//! - anything else: each match is a value converted to the subject's type
//!
//! Every case clause gets a label up front so `fallthrough` in one clause
//! can target the next.

use kestrel_ast::{CaseClause, Expr, SwitchStmt};
use kestrel_core::{CheckError, EntityId, Span, TypeId, TypeKind, UnionId};

use crate::checker::Checker;
use crate::entity::{Entity, EntityFlags};
use crate::scope::ScopeKind;
use crate::table::{Labels, SelectorKind};

/// How the case matches of a switch are checked.
#[derive(Debug, Clone)]
enum Subject {
    Conditions,
    Value(TypeId),
    Union {
        ty: TypeId,
        id: UnionId,
        binding: Option<(String, Span)>,
    },
    Any {
        binding: Option<(String, Span)>,
    },
    Invalid,
}

impl Checker<'_> {
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub(crate) fn check_switch(&mut self, switch: &SwitchStmt) {
        self.push_scope(ScopeKind::Block);
        let label = self.new_label(switch.id, switch.label.as_ref(), false);
        self.contexts.top_mut().switch_label = Some(label);

        let subject = self.check_subject(switch);
        if switch.using {
            self.use_switch_subject(switch, &subject);
        }

        let mut default: Option<Span> = None;
        for case in switch.cases.iter().filter(|case| case.is_default()) {
            match default {
                Some(previous) => self.report(CheckError::DuplicateDefault {
                    span: case.span,
                    previous,
                }),
                None => default = Some(case.span),
            }
        }

        let case_labels: Vec<EntityId> = switch
            .cases
            .iter()
            .map(|case| {
                let flags = EntityFlags::LABEL | EntityFlags::CHECKED;
                let label = self.anonymous_label(flags, case.span);
                self.table_mut().labels.insert(
                    case.id,
                    Labels {
                        break_label: label,
                        continue_label: None,
                    },
                );
                label
            })
            .collect();

        for (i, case) in switch.cases.iter().enumerate() {
            self.push_scope(ScopeKind::Block);
            self.contexts.top_mut().next_case = case_labels.get(i + 1).copied();
            self.check_case(case, &subject);
            for stmt in &case.block.stmts {
                self.check_stmt(stmt);
            }
            self.pop_context();
        }

        self.pop_context();
    }

    fn check_subject(&mut self, switch: &SwitchStmt) -> Subject {
        let Some(expr) = &switch.subject else {
            return Subject::Conditions;
        };
        let mut operand = self.check_value(expr, None);
        if operand.is_invalid() {
            return Subject::Invalid;
        }

        let binding = match &switch.binding {
            Some(ident) => Some((ident.name.clone(), ident.span)),
            None => expr
                .unparen()
                .as_ident()
                .map(|ident| (ident.name.clone(), ident.span)),
        };
        match *self.types().base_kind(operand.ty) {
            TypeKind::Union(id) => {
                return Subject::Union {
                    ty: operand.ty,
                    id,
                    binding,
                };
            }
            TypeKind::Any => return Subject::Any { binding },
            _ => {}
        }

        self.default_operand(&mut operand, expr);
        if !self.types().is_equatable(operand.ty) {
            self.report(CheckError::CannotSwitchOn {
                operand: self.describe(expr, &operand),
                span: expr.span(),
            });
            return Subject::Invalid;
        }
        Subject::Value(operand.ty)
    }

    /// `using switch`: an enum subject's cases may be named unqualified.
    fn use_switch_subject(&mut self, switch: &SwitchStmt, subject: &Subject) {
        let span = switch.subject.as_ref().map_or(switch.span, Expr::span);
        match subject {
            Subject::Value(ty) if self.types().is_enum(*ty) => self.use_enum_cases(*ty, span),
            Subject::Invalid => {}
            _ => {
                let operand = match subject {
                    Subject::Value(ty) | Subject::Union { ty, .. } => self.display(*ty),
                    Subject::Any { .. } => self.display(TypeId::ANY),
                    _ => "a switch without a subject".to_string(),
                };
                self.report(CheckError::InvalidUsing { operand, span });
            }
        }
    }

    fn check_case(&mut self, case: &CaseClause, subject: &Subject) {
        match subject {
            Subject::Invalid => {
                for m in &case.matches {
                    self.check_expr(m, None);
                }
            }
            Subject::Conditions => {
                for m in &case.matches {
                    self.check_condition(m, "switch case");
                }
            }
            Subject::Value(ty) => {
                for m in &case.matches {
                    self.check_converted(m, *ty);
                }
            }
            Subject::Union { ty, id, binding } => {
                let payload = match case.matches.as_slice() {
                    [] => *ty,
                    [m] => self.union_case_type(m, *id, *ty),
                    _ => {
                        self.report(CheckError::AmbiguousCaseMatch { span: case.span });
                        for m in &case.matches {
                            self.union_case_type(m, *id, *ty);
                        }
                        *ty
                    }
                };
                self.bind_payload(case, binding.as_ref(), payload);
            }
            Subject::Any { binding } => {
                let payload = match case.matches.as_slice() {
                    [] => TypeId::ANY,
                    [m] => self.check_type(m),
                    _ => {
                        self.report(CheckError::AmbiguousCaseMatch { span: case.span });
                        for m in &case.matches {
                            self.check_type(m);
                        }
                        TypeId::ANY
                    }
                };
                self.bind_payload(case, binding.as_ref(), payload);
            }
        }
    }

    /// The payload type of the union member a case names, either bare
    /// (`case Int:`) or through the union type (`case Value.Int:`).
    fn union_case_type(&mut self, m: &Expr, id: UnionId, union_ty: TypeId) -> TypeId {
        if let Some(ident) = m.unparen().as_ident()
            && let Some(case) = self.types().union_def(id).cases.get(&ident.name)
        {
            let (ty, tag) = (case.ty, case.tag);
            self.table_mut().selectors.insert(m.id(), SelectorKind::UnionCase(tag));
            return ty;
        }

        let operand = self.check_expr(m, None);
        if operand.is_invalid() {
            return TypeId::INVALID;
        }
        if let Some(SelectorKind::UnionCase(tag)) = self.table().selector_kind(m.id()) {
            let case = self.types().union_def(id).cases.values().find(|c| c.tag == tag);
            if let Some(case) = case {
                return case.ty;
            }
        }
        self.report(CheckError::CannotConvert {
            value: self.describe(m, &operand),
            target: self.display(union_ty),
            span: m.span(),
        });
        TypeId::INVALID
    }

    fn bind_payload(&mut self, case: &CaseClause, binding: Option<&(String, Span)>, ty: TypeId) {
        let Some((name, span)) = binding else {
            return;
        };
        let entity = Entity::new(name.clone(), *span, EntityFlags::VARIABLE | EntityFlags::CHECKED)
            .in_scope(self.scope())
            .with_type(ty);
        let entity = self.program.entities.alloc(entity);
        self.declare(entity);
        self.table_mut().case_bindings.insert(case.id, entity);
    }
}

#[cfg(test)]
mod tests {
    use kestrel_ast::{AstBuilder, Item, Stmt};
    use kestrel_core::{FileId, TypeId};

    use crate::testing::check_source;

    fn main_with(b: &mut AstBuilder, body: Vec<Stmt>) -> Item {
        let func = b.func(vec![], vec![], body);
        b.const_item("main", func)
    }

    #[test]
    fn value_switch_with_fallthrough() {
        let mut b = AstBuilder::new(FileId(0));
        let three = b.int(3);
        let decl = b.var("n", None, Some(three));
        let n = b.name("n");
        let one = b.int(1);
        let fall = b.fallthrough();
        let first = b.case(vec![one], vec![fall]);
        let two = b.int(2);
        let brk = b.brk(None);
        let second = b.case(vec![two], vec![brk]);
        let default = b.case(vec![], vec![]);
        let switch = b.switch(Some(n), None, vec![first, second, default]);
        let main = main_with(&mut b, vec![decl, switch]);
        let file = b.finish("main.k", vec![main]);

        let (program, _) = check_source(vec![file]);
        assert!(!program.has_errors(), "{}", program.render_diagnostics());
    }

    #[test]
    fn fallthrough_out_of_last_case() {
        let mut b = AstBuilder::new(FileId(0));
        let one = b.int(1);
        let fall = b.fallthrough();
        let only = b.case(vec![], vec![fall]);
        let switch = b.switch(Some(one), None, vec![only]);
        let main = main_with(&mut b, vec![switch]);
        let file = b.finish("main.k", vec![main]);

        let (program, _) = check_source(vec![file]);
        assert_eq!(
            program.diagnostics(FileId(0)).messages(),
            vec!["fallthrough has no following case to transfer control to"]
        );
    }

    #[test]
    fn duplicate_default_notes_the_first() {
        let mut b = AstBuilder::new(FileId(0));
        let one = b.int(1);
        let first = b.case(vec![], vec![]);
        let second = b.case(vec![], vec![]);
        let switch = b.switch(Some(one), None, vec![first, second]);
        let main = main_with(&mut b, vec![switch]);
        let file = b.finish("main.k", vec![main]);

        let (program, _) = check_source(vec![file]);
        let diagnostics = program.diagnostics(FileId(0));
        assert_eq!(diagnostics.messages(), vec!["duplicate default case in switch"]);
        assert_eq!(diagnostics.as_slice()[0].notes.len(), 1);
    }

    #[test]
    fn union_switch_binds_payload() {
        let mut b = AstBuilder::new(FileId(0));
        let i64_ty = b.name("i64");
        let str_ty = b.name("string");
        let value = b.union_type(vec![("Int", i64_ty), ("Str", str_ty)]);
        let value = b.const_item("Value", value);

        let ty = b.name("Value");
        let decl = b.var("v", Some(ty), None);
        let v = b.name("v");
        let int_case = b.name("Int");
        let x = b.name("x");
        let use_int = b.var("n", None, Some(x));
        let first = b.case(vec![int_case], vec![use_int]);
        let str_case = b.name("Str");
        let second = b.case(vec![str_case], vec![]);
        let switch = b.switch(Some(v), Some("x"), vec![first, second]);
        let main = main_with(&mut b, vec![decl, switch]);
        let file = b.finish("main.k", vec![value, main]);

        let (program, _) = check_source(vec![file]);
        assert!(!program.has_errors(), "{}", program.render_diagnostics());
        let n = program
            .entities()
            .find(|(_, e)| e.name == "n")
            .map(|(_, e)| e.ty);
        assert_eq!(n, Some(Some(TypeId::I64)));
    }

    #[test]
    fn union_case_cannot_match_two_members() {
        let mut b = AstBuilder::new(FileId(0));
        let i64_ty = b.name("i64");
        let f64_ty = b.name("f64");
        let value = b.union_type(vec![("Int", i64_ty), ("Float", f64_ty)]);
        let value = b.const_item("Value", value);

        let ty = b.name("Value");
        let decl = b.var("v", Some(ty), None);
        let v = b.name("v");
        let int_case = b.name("Int");
        let float_case = b.name("Float");
        let both = b.case(vec![int_case, float_case], vec![]);
        let switch = b.switch(Some(v), None, vec![both]);
        let main = main_with(&mut b, vec![decl, switch]);
        let file = b.finish("main.k", vec![value, main]);

        let (program, _) = check_source(vec![file]);
        let diagnostics = program.diagnostics(FileId(0));
        assert!(diagnostics.contains("cannot match multiple union members in one case"));
    }

    #[test]
    fn using_switch_names_enum_cases() {
        let mut b = AstBuilder::new(FileId(0));
        let color = b.enum_type(None, vec![("Red", None), ("Blue", None)]);
        let color = b.const_item("Color", color);

        let ty = b.name("Color");
        let decl = b.var("c", Some(ty), None);
        let c = b.name("c");
        let red = b.name("Red");
        let first = b.case(vec![red], vec![]);
        let mut switch = b.switch(Some(c), None, vec![first]);
        if let Stmt::Switch(s) = &mut switch {
            s.using = true;
        }
        let main = main_with(&mut b, vec![decl, switch]);
        let file = b.finish("main.k", vec![color, main]);

        let (program, _) = check_source(vec![file]);
        assert!(!program.has_errors(), "{}", program.render_diagnostics());
    }

    #[test]
    fn cannot_switch_on_structs() {
        let mut b = AstBuilder::new(FileId(0));
        let i32_ty = b.name("i32");
        let pair = b.struct_type(vec![("a", i32_ty)]);
        let pair = b.const_item("Pair", pair);
        let ty = b.name("Pair");
        let decl = b.var("p", Some(ty), None);
        let p = b.name("p");
        let switch = b.switch(Some(p), None, vec![]);
        let main = main_with(&mut b, vec![decl, switch]);
        let file = b.finish("main.k", vec![pair, main]);

        let (program, _) = check_source(vec![file]);
        assert!(program.diagnostics(FileId(0)).contains("cannot switch on"));
    }
}
