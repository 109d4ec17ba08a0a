//! The checked program: everything checking learns, owned in one place.
//!
//! A [`Program`] is created once per check with its [`CheckerOptions`]. The
//! universe scope is populated on creation, so custom builtins can be
//! registered before [`Program::check`] runs.
//!
//! ```text
//! universe ── package ─┬─ file 0
//!                      ├─ file 1
//!                      └─ ...
//! ```

use std::sync::Arc;

use kestrel_ast::SourceFile;
use kestrel_core::{Diagnostic, Diagnostics, EntityId, FileId, ScopeId, TypeTable};
use rustc_hash::FxHashMap;
use tracing::debug;
use xxhash_rust::xxh64::Xxh64;

use crate::builtins::{self, Builtin, BuiltinCheck, BuiltinError, BuiltinId};
use crate::checker::Checker;
use crate::entity::{Entity, EntityArena};
use crate::options::CheckerOptions;
use crate::passes::{CheckingPass, CollectionPass};
use crate::scope::{ScopeArena, ScopeKind};
use crate::specialization::{
    FunctionSpecialization, GenericFunction, GenericId, PolyStruct, SpecializationHeader,
    SpecializationList,
};
use crate::table::NodeTable;

/// Per-file results.
#[derive(Debug)]
pub(crate) struct FileState {
    pub(crate) scope: ScopeId,
    pub(crate) path: String,
    /// Module name, the default prefix of mangled names.
    pub(crate) module: String,
    pub(crate) table: NodeTable,
    pub(crate) diagnostics: Diagnostics,
}

/// Types, entities, scopes and per-node results of a checked program.
#[derive(Debug)]
pub struct Program {
    pub(crate) options: CheckerOptions,
    pub(crate) types: TypeTable,
    pub(crate) entities: EntityArena,
    pub(crate) scopes: ScopeArena,
    pub(crate) universe: ScopeId,
    pub(crate) package: ScopeId,
    pub(crate) files: Vec<FileState>,

    pub(crate) builtins: Vec<Builtin>,
    pub(crate) builtin_entities: FxHashMap<EntityId, BuiltinId>,

    pub(crate) generics: Vec<GenericFunction>,
    pub(crate) generic_entities: FxHashMap<EntityId, GenericId>,
    /// Parameter labels of named functions, for labelled arguments.
    pub(crate) function_labels: FxHashMap<EntityId, Vec<Option<String>>>,
    pub(crate) specializations: Vec<SpecializationHeader>,
    /// Specializations whose bodies are checked, in completion order.
    pub(crate) finished: Vec<Arc<FunctionSpecialization>>,
    pub(crate) poly_structs: Vec<PolyStruct>,
}

impl Program {
    pub fn new(options: CheckerOptions) -> Self {
        let mut scopes = ScopeArena::new();
        let universe = scopes.alloc(None, ScopeKind::Universe, None);
        let package = scopes.alloc(Some(universe), ScopeKind::Package, None);

        let mut program = Self {
            types: TypeTable::new(options.pointer_width),
            options,
            entities: EntityArena::new(),
            scopes,
            universe,
            package,
            files: Vec::new(),
            builtins: Vec::new(),
            builtin_entities: FxHashMap::default(),
            generics: Vec::new(),
            generic_entities: FxHashMap::default(),
            function_labels: FxHashMap::default(),
            specializations: Vec::new(),
            finished: Vec::new(),
            poly_structs: Vec::new(),
        };
        builtins::populate_universe(&mut program);
        program
    }

    /// Check every file of the program.
    ///
    /// `sources[i]` must have id `FileId(i)`, with imports resolved to those
    /// ids. Specializations are pushed to `shared` as their bodies finish.
    ///
    /// # Panics
    ///
    /// Panics if the program was already checked or the file ids are out of
    /// order.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn check(&mut self, sources: &[SourceFile], shared: &SpecializationList) {
        assert!(self.files.is_empty(), "a program is checked once");
        for (index, source) in sources.iter().enumerate() {
            assert_eq!(source.id.index(), index, "file ids must match their position");
            let scope = self
                .scopes
                .alloc(Some(self.package), ScopeKind::File, Some(source.id));
            self.files.push(FileState {
                scope,
                path: source.path.clone(),
                module: source.module_name().to_string(),
                table: NodeTable::new(),
                diagnostics: Diagnostics::new(),
            });
        }

        let (collected, checked) = {
            let mut checker = Checker::new(self, sources, shared);
            let collected = CollectionPass::new(&mut checker).run();
            (collected, CheckingPass::new(&mut checker).run())
        };

        debug!(
            files = sources.len(),
            declarations = collected.declarations,
            imports = collected.imports,
            tests = checked.tests,
            specializations = self.finished.len(),
            errors = self.all_diagnostics().count(),
            "checked program"
        );
    }

    // ========================================================================
    // Diagnostics
    // ========================================================================

    pub fn diagnostics(&self, file: FileId) -> &Diagnostics {
        &self.files[file.index()].diagnostics
    }

    /// Every diagnostic, files in id order.
    pub fn all_diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.files.iter().flat_map(|file| file.diagnostics.iter())
    }

    pub fn has_errors(&self) -> bool {
        self.files.iter().any(|file| file.diagnostics.has_errors())
    }

    /// All diagnostics, one per line, prefixed with their file's path.
    pub fn render_diagnostics(&self) -> String {
        self.files
            .iter()
            .flat_map(|file| {
                file.diagnostics
                    .iter()
                    .map(move |diagnostic| format!("{}:{}", file.path, diagnostic))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    pub fn table(&self, file: FileId) -> &NodeTable {
        &self.files[file.index()].table
    }

    /// Resolve `name` as seen from the top level of `file`.
    pub fn lookup(&self, file: FileId, name: &str) -> Option<EntityId> {
        let scope = self.files.get(file.index())?.scope;
        self.scopes.lookup(scope, name)
    }

    pub fn lookup_universe(&self, name: &str) -> Option<EntityId> {
        self.scopes.lookup_local(self.universe, name).map(|member| member.entity)
    }

    pub fn entity(&self, id: EntityId) -> &Entity {
        self.entities.get(id)
    }

    pub fn entities(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.entities.iter()
    }

    pub fn types(&self) -> &TypeTable {
        &self.types
    }

    pub fn scopes(&self) -> &ScopeArena {
        &self.scopes
    }

    pub fn options(&self) -> &CheckerOptions {
        &self.options
    }

    // ========================================================================
    // Builtins
    // ========================================================================

    pub fn builtins(&self) -> &[Builtin] {
        &self.builtins
    }

    /// Add a builtin call form with a custom type rule.
    ///
    /// Fails when `name` is already declared in the universe scope.
    pub fn register_builtin(&mut self, name: &str, check: BuiltinCheck) -> Result<BuiltinId, BuiltinError> {
        builtins::register_custom(self, name, check)
    }

    // ========================================================================
    // Polymorphism
    // ========================================================================

    /// Specializations checked so far, in completion order.
    pub fn specializations(&self) -> &[Arc<FunctionSpecialization>] {
        &self.finished
    }

    pub fn generics(&self) -> &[GenericFunction] {
        &self.generics
    }

    pub fn poly_structs(&self) -> &[PolyStruct] {
        &self.poly_structs
    }

    /// Hash of the program's observable results.
    ///
    /// Covers each file's own top-level names with their types, and every
    /// specialization's mangled name and signature. Two checks of the same
    /// files produce the same fingerprint.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = Xxh64::new(0);
        for file in &self.files {
            hasher.update(file.path.as_bytes());
            for (name, member) in self.scopes.members(file.scope) {
                if !member.owned {
                    continue;
                }
                hasher.update(name.as_bytes());
                if let Some(ty) = self.entity(member.entity).ty {
                    hasher.update(self.types.display(ty).to_string().as_bytes());
                }
                hasher.update(&[0]);
            }
        }
        for specialization in &self.finished {
            hasher.update(specialization.mangled_name.as_bytes());
            hasher.update(specialization.signature.as_bytes());
            hasher.update(&[0]);
        }
        hasher.digest()
    }
}
