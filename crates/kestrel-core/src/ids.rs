//! Index handles shared by the AST and the checker.
//!
//! All of these are plain `u32` indices into arenas owned elsewhere: files in
//! the program, nodes in a file's syntax tree, entities and scopes in the
//! checker's arenas.

use std::fmt;

macro_rules! index_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        pub struct $name(pub u32);

        impl $name {
            /// The raw index.
            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

index_type!(
    /// A source file in the program, in discovery order.
    FileId
);

index_type!(
    /// A syntax node, unique within one file's tree.
    NodeId
);

index_type!(
    /// An entity in the checker's entity arena.
    EntityId
);

index_type!(
    /// A lexical scope in the checker's scope arena.
    ScopeId
);

impl EntityId {
    /// The shared entity standing in for `_`.
    pub const ANONYMOUS: EntityId = EntityId(0);
    /// The shared entity given to references that failed to resolve.
    pub const INVALID: EntityId = EntityId(1);
}
