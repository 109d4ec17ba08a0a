//! Errors reported by semantic analysis.
//!
//! Every error is recoverable: the checker records it as a diagnostic, gives
//! the offending node the invalid type and keeps going. The variants are
//! grouped by category:
//!
//! ```text
//! CheckError
//! ├── name resolution   - undefined names, redeclarations, imports, labels
//! ├── types             - conversions, operators, arity, members, calls
//! ├── constants         - non-constant values, division by zero, ranges
//! └── specialization    - placeholders that cannot be inferred, case matching
//! ```
//!
//! Operand descriptions (`value`, `operand`) are preformatted by the checker,
//! usually as `'expr' (type T)`.

use thiserror::Error;

use crate::{Note, Span};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CheckError {
    // ========================================================================
    // Name resolution
    // ========================================================================
    /// A name that no enclosing scope declares.
    #[error("use of undefined identifier '{name}'")]
    UndefinedIdentifier { name: String, span: Span },

    /// A second declaration of a name in the same scope.
    #[error("invalid redeclaration of '{name}'")]
    Redeclaration {
        name: String,
        span: Span,
        previous: Span,
    },

    /// `using` brought in a name the scope already has.
    #[error("using introduced a name collision for '{name}'")]
    UsingCollision {
        name: String,
        span: Span,
        previous: Span,
    },

    /// Two symbol imports provide the same name.
    #[error("ambiguous import of '{name}'")]
    AmbiguousImport {
        name: String,
        span: Span,
        previous: Span,
    },

    /// A declaration that depends on its own unresolved type or value.
    #[error("invalid recursive declaration of '{name}'")]
    CyclicDeclaration { name: String, span: Span },

    /// An import whose file was never resolved.
    #[error("failed to resolve import '{path}'")]
    UnresolvedImport { path: String, span: Span },

    /// An import path that does not yield a valid identifier.
    #[error("cannot infer an import name for '{path}'")]
    ImportNameUnknown { path: String, span: Span },

    /// `break` or `continue` naming something that is not a label.
    #[error("'{name}' is not a label")]
    NotALabel { name: String, span: Span },

    /// A library reference used where a value is needed.
    #[error("library '{name}' cannot be used as a value")]
    LibraryAsValue { name: String, span: Span },

    // ========================================================================
    // Types
    // ========================================================================
    /// An implicit conversion that the conversion rules reject.
    #[error("cannot convert {value} to type '{target}'")]
    CannotConvert {
        value: String,
        target: String,
        span: Span,
    },

    /// Binary operands that could not be reconciled.
    #[error("mismatched types '{lhs}' and '{rhs}' for operator '{op}'")]
    MismatchedTypes {
        lhs: String,
        rhs: String,
        op: String,
        span: Span,
    },

    /// An operator applied to an operand kind it is not defined for.
    #[error("operator '{op}' is not defined for {operand}")]
    OperatorUndefined {
        op: String,
        operand: String,
        span: Span,
    },

    /// A value used where a type is required.
    #[error("{expr} is not a type")]
    NotAType { expr: String, span: Span },

    /// A type used where a value is required.
    #[error("{expr} is a type, not an expression")]
    NotAnExpression { expr: String, span: Span },

    /// Assignment to something that is not an l-value.
    #[error("cannot assign to {target}")]
    CannotAssign { target: String, span: Span },

    /// `&` applied to something without an address.
    #[error("cannot take the address of {operand}")]
    CannotTakeAddress { operand: String, span: Span },

    /// Left and right sides of an assignment disagree in count.
    #[error("assignment count mismatch: {targets} = {values}")]
    AssignmentArity {
        targets: usize,
        values: usize,
        span: Span,
    },

    /// Names and values of a declaration disagree in count.
    #[error("declaration count mismatch: {names} names but {values} values")]
    DeclarationArity {
        names: usize,
        values: usize,
        span: Span,
    },

    /// Fewer return values than the function's result tuple.
    #[error("not enough arguments to return")]
    NotEnoughReturnValues { span: Span },

    /// More return values than the function's result tuple.
    #[error("too many arguments to return")]
    TooManyReturnValues { span: Span },

    /// A value returned from a function with no results.
    #[error("void function should not return a value")]
    VoidReturnsValue { span: Span },

    /// `return` outside of any function.
    #[error("return statement outside of a function")]
    ReturnOutsideFunction { span: Span },

    /// A non-void function whose body can finish without returning.
    #[error("missing return at end of '{function}'")]
    MissingReturn { function: String, span: Span },

    /// More call arguments than parameters.
    #[error("too many arguments in call to {callee}")]
    TooManyArguments { callee: String, span: Span },

    /// Fewer call arguments than required parameters.
    #[error("not enough arguments in call to {callee}")]
    NotEnoughArguments { callee: String, span: Span },

    /// A call argument label that differs from the parameter label.
    #[error("argument label '{found}' does not match parameter label '{expected}'")]
    ArgumentLabelMismatch {
        expected: String,
        found: String,
        span: Span,
    },

    /// A call whose callee is not a function.
    #[error("cannot call non-function {callee}")]
    CannotCall { callee: String, span: Span },

    /// A selector naming no member of the receiver.
    #[error("'{member}' is not a member of '{receiver}'")]
    UnknownMember {
        member: String,
        receiver: String,
        span: Span,
    },

    /// A selector on a value that has no members at all.
    #[error("{receiver} does not have a member scope")]
    NoMemberScope { receiver: String, span: Span },

    /// Indexing a value that is not indexable.
    #[error("cannot subscript {operand}")]
    CannotSubscript { operand: String, span: Span },

    /// Slicing a value that is not sliceable.
    #[error("cannot slice {operand}")]
    CannotSlice { operand: String, span: Span },

    /// An index or bound that is not an integer.
    #[error("index {operand} must be an integer")]
    NonIntegerIndex { operand: String, span: Span },

    /// A constant index outside a fixed length.
    #[error("index {index} out of bounds for length {len}")]
    IndexOutOfBounds { index: i128, len: u64, span: Span },

    /// An explicit cast between unrelated types.
    #[error("cannot cast '{from}' to '{to}'")]
    InvalidCast {
        from: String,
        to: String,
        span: Span,
    },

    /// A bitcast between types of different widths.
    #[error("cannot bitcast '{from}' ({from_width} bits) to '{to}' ({to_width} bits)")]
    BitcastWidth {
        from: String,
        to: String,
        from_width: u32,
        to_width: u32,
        span: Span,
    },

    /// `autocast` where nothing supplies a target type.
    #[error("autocast requires a contextual type")]
    AutocastNeedsContext { span: Span },

    /// A condition that is neither boolean nor a pointer.
    #[error("non-boolean condition {operand} used in {construct}")]
    InvalidCondition {
        operand: String,
        construct: String,
        span: Span,
    },

    /// A switch subject that cannot be matched.
    #[error("cannot switch on {operand}")]
    CannotSwitchOn { operand: String, span: Span },

    /// A second `case:` default clause.
    #[error("duplicate default case in switch")]
    DuplicateDefault { span: Span, previous: Span },

    /// `break` with no enclosing loop or switch.
    #[error("break outside of a loop or switch")]
    BreakOutsideLoop { span: Span },

    /// `continue` with no enclosing loop.
    #[error("continue outside of a loop")]
    ContinueOutsideLoop { span: Span },

    /// `fallthrough` with no following case.
    #[error("fallthrough has no following case to transfer control to")]
    FallthroughWithoutCase { span: Span },

    /// `for in` over a value that is not an array or slice.
    #[error("cannot range over {operand}")]
    CannotRange { operand: String, span: Span },

    /// An expression statement whose value is discarded.
    #[error("expression is unused")]
    UnusedExpression { span: Span },

    /// `nil` with nothing to give it a type.
    #[error("'nil' requires a contextual type")]
    NilNeedsType { span: Span },

    /// A void result used as a value.
    #[error("cannot use a void value")]
    VoidValue { span: Span },

    /// A variable declared with neither a type nor a value.
    #[error("declaration of '{name}' needs a type or an initial value")]
    MissingType { name: String, span: Span },

    /// `x: [..]T` without an initializer.
    #[error("implicit-length array must have an initial value")]
    UninitializedImplicitArray { span: Span },

    /// `f: fn()` without an initializer.
    #[error("function variable '{name}' must be initialized")]
    UninitializedFunction { name: String, span: Span },

    /// A literal whose text does not parse.
    #[error("invalid {kind} literal '{text}'")]
    InvalidLiteral {
        kind: String,
        text: String,
        span: Span,
    },

    /// A composite literal that cannot build its type.
    #[error("invalid composite literal for type '{ty}'")]
    InvalidCompositeType { ty: String, span: Span },

    /// A composite literal without a type and without a contextual type.
    #[error("composite literal requires a type")]
    CompositeNeedsType { span: Span },

    /// A composite literal with more elements than the type holds.
    #[error("too many values in composite literal for '{ty}' (expected {expected}, found {found})")]
    CompositeCount {
        ty: String,
        expected: usize,
        found: usize,
        span: Span,
    },

    /// A union composite literal not naming exactly one member.
    #[error("union composite literal must name exactly one member")]
    UnionLiteral { span: Span },

    /// A struct that contains itself by value.
    #[error("invalid recursive type '{ty}'")]
    RecursiveType { ty: String, span: Span },

    /// An enum backing type that is not an integer.
    #[error("enum backing type '{ty}' must be an integer type")]
    InvalidEnumBacking { ty: String, span: Span },

    /// A vector element type that is not numeric.
    #[error("vector element type '{ty}' must be an integer or float type")]
    InvalidVectorElement { ty: String, span: Span },

    /// `sizeof` applied to a type without a runtime representation.
    #[error("type '{ty}' has no size")]
    Unsized { ty: String, span: Span },

    /// A `$` placeholder in a position that cannot declare one.
    #[error("unsupported polymorphic type {expr}")]
    UnsupportedPolymorphicType { expr: String, span: Span },

    /// `using` on an operand that has no members to bring in.
    #[error("using is invalid on {operand}")]
    InvalidUsing { operand: String, span: Span },

    /// `#discardable` on a function that returns nothing.
    #[error("#discardable on a function that returns void")]
    DiscardableVoid { span: Span },

    // ========================================================================
    // Constants
    // ========================================================================
    /// A value that must be known at compile time but is not.
    #[error("{what} must be a compile-time constant")]
    NotConstant { what: String, span: Span },

    /// Division or remainder by a constant zero.
    #[error("division by zero")]
    DivisionByZero { span: Span },

    /// A constant that does not fit its target type.
    #[error("constant {value} overflows '{ty}'")]
    ConstantOverflow {
        value: String,
        ty: String,
        span: Span,
    },

    /// A constant shift by a negative or oversized amount.
    #[error("invalid shift amount {amount}")]
    InvalidShift { amount: i128, span: Span },

    /// A negative or oversized array or vector length.
    #[error("invalid length {value}")]
    InvalidLength { value: i128, span: Span },

    /// An enum case outside the representable range of the enum.
    #[error("enum case value {value} does not fit '{ty}'")]
    EnumValueOutOfRange { value: i128, ty: String, span: Span },

    /// A flags enum case that is not a power of two.
    #[error("flags enum case '{name}' must be a power of two")]
    FlagsNotPowerOfTwo { name: String, span: Span },

    // ========================================================================
    // Specialization
    // ========================================================================
    /// A placeholder that no argument binds.
    #[error("cannot infer polymorphic type '{placeholder}' in call to '{function}'")]
    UnresolvedPlaceholder {
        placeholder: String,
        function: String,
        span: Span,
    },

    /// An argument whose type does not match the shape of its polymorphic parameter.
    #[error("failed to specialize parameter of type '{param}' with argument of type '{arg}'")]
    SpecializationMismatch {
        param: String,
        arg: String,
        span: Span,
    },

    /// A polymorphic function invoked through something other than its name.
    #[error("cannot specialize polymorphic function called through {callee}")]
    IndirectPolymorphicCall { callee: String, span: Span },

    /// A polymorphic struct instantiated with the wrong number of types.
    #[error("polymorphic struct '{name}' expects {expected} type arguments, found {found}")]
    PolyStructArity {
        name: String,
        expected: usize,
        found: usize,
        span: Span,
    },

    /// A union switch case naming more than one member.
    #[error("cannot match multiple union members in one case")]
    AmbiguousCaseMatch { span: Span },
}

impl CheckError {
    /// Get the span where this error occurred.
    pub fn span(&self) -> Span {
        match self {
            CheckError::UndefinedIdentifier { span, .. }
            | CheckError::Redeclaration { span, .. }
            | CheckError::UsingCollision { span, .. }
            | CheckError::AmbiguousImport { span, .. }
            | CheckError::CyclicDeclaration { span, .. }
            | CheckError::UnresolvedImport { span, .. }
            | CheckError::ImportNameUnknown { span, .. }
            | CheckError::NotALabel { span, .. }
            | CheckError::LibraryAsValue { span, .. }
            | CheckError::CannotConvert { span, .. }
            | CheckError::MismatchedTypes { span, .. }
            | CheckError::OperatorUndefined { span, .. }
            | CheckError::NotAType { span, .. }
            | CheckError::NotAnExpression { span, .. }
            | CheckError::CannotAssign { span, .. }
            | CheckError::CannotTakeAddress { span, .. }
            | CheckError::AssignmentArity { span, .. }
            | CheckError::DeclarationArity { span, .. }
            | CheckError::NotEnoughReturnValues { span }
            | CheckError::TooManyReturnValues { span }
            | CheckError::VoidReturnsValue { span }
            | CheckError::ReturnOutsideFunction { span }
            | CheckError::MissingReturn { span, .. }
            | CheckError::TooManyArguments { span, .. }
            | CheckError::NotEnoughArguments { span, .. }
            | CheckError::ArgumentLabelMismatch { span, .. }
            | CheckError::CannotCall { span, .. }
            | CheckError::UnknownMember { span, .. }
            | CheckError::NoMemberScope { span, .. }
            | CheckError::CannotSubscript { span, .. }
            | CheckError::CannotSlice { span, .. }
            | CheckError::NonIntegerIndex { span, .. }
            | CheckError::IndexOutOfBounds { span, .. }
            | CheckError::InvalidCast { span, .. }
            | CheckError::BitcastWidth { span, .. }
            | CheckError::AutocastNeedsContext { span }
            | CheckError::InvalidCondition { span, .. }
            | CheckError::CannotSwitchOn { span, .. }
            | CheckError::DuplicateDefault { span, .. }
            | CheckError::BreakOutsideLoop { span }
            | CheckError::ContinueOutsideLoop { span }
            | CheckError::FallthroughWithoutCase { span }
            | CheckError::CannotRange { span, .. }
            | CheckError::UnusedExpression { span }
            | CheckError::NilNeedsType { span }
            | CheckError::VoidValue { span }
            | CheckError::MissingType { span, .. }
            | CheckError::UninitializedImplicitArray { span }
            | CheckError::UninitializedFunction { span, .. }
            | CheckError::InvalidLiteral { span, .. }
            | CheckError::InvalidCompositeType { span, .. }
            | CheckError::CompositeNeedsType { span }
            | CheckError::CompositeCount { span, .. }
            | CheckError::UnionLiteral { span }
            | CheckError::RecursiveType { span, .. }
            | CheckError::InvalidEnumBacking { span, .. }
            | CheckError::InvalidVectorElement { span, .. }
            | CheckError::Unsized { span, .. }
            | CheckError::UnsupportedPolymorphicType { span, .. }
            | CheckError::InvalidUsing { span, .. }
            | CheckError::DiscardableVoid { span }
            | CheckError::NotConstant { span, .. }
            | CheckError::DivisionByZero { span }
            | CheckError::ConstantOverflow { span, .. }
            | CheckError::InvalidShift { span, .. }
            | CheckError::InvalidLength { span, .. }
            | CheckError::EnumValueOutOfRange { span, .. }
            | CheckError::FlagsNotPowerOfTwo { span, .. }
            | CheckError::UnresolvedPlaceholder { span, .. }
            | CheckError::SpecializationMismatch { span, .. }
            | CheckError::IndirectPolymorphicCall { span, .. }
            | CheckError::PolyStructArity { span, .. }
            | CheckError::AmbiguousCaseMatch { span } => *span,
        }
    }

    /// Notes that always accompany this error.
    pub fn notes(&self) -> Vec<Note> {
        match self {
            CheckError::Redeclaration { previous, .. } => {
                vec![Note::at("previous declaration here", *previous)]
            }
            CheckError::UsingCollision { previous, .. } => {
                vec![Note::at("previous declaration here", *previous)]
            }
            CheckError::AmbiguousImport { previous, .. } => {
                vec![Note::at("also imported here", *previous)]
            }
            CheckError::DuplicateDefault { previous, .. } => {
                vec![Note::at("first default case here", *previous)]
            }
            CheckError::UninitializedFunction { .. } => vec![Note::new(
                "use a pointer to a function type for an uninitialized function value",
            )],
            _ => Vec::new(),
        }
    }

    /// Whether the error belongs to name resolution.
    pub fn is_resolution_error(&self) -> bool {
        matches!(
            self,
            CheckError::UndefinedIdentifier { .. }
                | CheckError::Redeclaration { .. }
                | CheckError::UsingCollision { .. }
                | CheckError::AmbiguousImport { .. }
                | CheckError::CyclicDeclaration { .. }
                | CheckError::UnresolvedImport { .. }
                | CheckError::ImportNameUnknown { .. }
                | CheckError::NotALabel { .. }
                | CheckError::LibraryAsValue { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FileId;

    #[test]
    fn messages() {
        let span = Span::new(FileId(0), 1, 1, 1);
        let error = CheckError::UndefinedIdentifier {
            name: "y".into(),
            span,
        };
        assert_eq!(error.to_string(), "use of undefined identifier 'y'");
        assert!(error.is_resolution_error());

        let error = CheckError::UnresolvedPlaceholder {
            placeholder: "T".into(),
            function: "make".into(),
            span,
        };
        assert_eq!(
            error.to_string(),
            "cannot infer polymorphic type 'T' in call to 'make'"
        );
        assert!(!error.is_resolution_error());
    }

    #[test]
    fn span_and_notes() {
        let here = Span::new(FileId(0), 5, 3, 1);
        let there = Span::new(FileId(0), 2, 3, 1);
        let error = CheckError::Redeclaration {
            name: "foo".into(),
            span: here,
            previous: there,
        };
        assert_eq!(error.span(), here);
        assert_eq!(error.notes(), vec![Note::at("previous declaration here", there)]);

        let error = CheckError::DivisionByZero { span: here };
        assert!(error.notes().is_empty());
    }
}
