//! Identifier resolution.

use kestrel_ast::Ident;
use kestrel_core::{CheckError, EntityId};

use crate::checker::Checker;
use crate::entity::EntityFlags;
use crate::operand::{Mode, Operand};

pub(super) fn check_ident(checker: &mut Checker<'_>, ident: &Ident) -> Operand {
    if ident.is_anonymous() {
        checker.report(CheckError::UndefinedIdentifier {
            name: ident.name.clone(),
            span: ident.span,
        });
        return Operand::invalid();
    }
    let Some(entity) = checker.lookup(&ident.name) else {
        checker.report(CheckError::UndefinedIdentifier {
            name: ident.name.clone(),
            span: ident.span,
        });
        return Operand::invalid();
    };
    checker.record_entity(ident, entity);
    operand_for_entity(checker, entity, ident)
}

/// The operand a reference to `entity` produces.
///
/// Checks the entity's declaration first when it has not been checked yet;
/// reaching it while its own declaration is in progress is a cycle.
pub(crate) fn operand_for_entity(checker: &mut Checker<'_>, entity: EntityId, ident: &Ident) -> Operand {
    let Some(ty) = checker.ensure_checked(entity) else {
        checker.report_cycle(ident);
        return Operand::invalid();
    };
    if ty.is_invalid() {
        return Operand::invalid().depends_on(entity);
    }

    let e = checker.entity(entity);
    if e.is(EntityFlags::LIBRARY) {
        checker.report(CheckError::LibraryAsValue {
            name: ident.name.clone(),
            span: ident.span,
        });
        return Operand::invalid();
    }
    if e.is(EntityFlags::LABEL) {
        checker.report(CheckError::UndefinedIdentifier {
            name: ident.name.clone(),
            span: ident.span,
        });
        return Operand::invalid();
    }

    let operand = if e.is(EntityFlags::FILE) {
        Operand::new(Mode::File, ty)
    } else if e.is_type() {
        Operand::type_(ty)
    } else if e.is(EntityFlags::CONSTANT) {
        let mut operand = Operand::computed(ty);
        operand.constant = e.constant.clone();
        operand
    } else {
        Operand::new(Mode::Assignable, ty)
    };
    operand.depends_on(entity)
}
