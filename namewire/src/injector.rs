//! The injector: a named container of values, lazy factories and imports.
//!
//! An [Injector] maps normalized names to entries and resolves lookups
//! first against its own registry, then along its ordered import list.
//! Entries registered as factories are instantiated on first resolution
//! and memoized. Imports only ever expose entries explicitly marked
//! public, and resolutions served through imports are cached per injector
//! until the import list changes.
//!
//! Each entry is addressable under its bare name and under the form
//! prefixed with the owning injector's name (`"port"` and `"appport"` for
//! an injector named `app`), which disambiguates lookups across import
//! chains. Every injector also answers `"di"` and `"<name>di"` with a
//! handle to itself.

use crate::error::{DiError, FnContext};
use crate::function::{InjectFn, Overrides, Value};
use crate::loader::{Loaded, LoadError, ModuleLoader};
use crate::name::{normalize, normalize_injector};
use crate::registry::{Entry, Registry};
use fxhash::{FxHashMap, FxHashSet};
use itertools::Itertools;
use std::cell::RefCell;
use std::fmt::{self, Debug, Formatter};
use std::rc::Rc;
use tracing::{debug, trace};

enum LocalHit {
    Entry(String),
    SelfRef,
    Miss,
}

struct InjectorInner {
    name: String,
    registry: RefCell<Registry>,
    imports: RefCell<Vec<Injector>>,
    import_cache: RefCell<FxHashMap<String, Value>>,
    resolving: RefCell<FxHashSet<String>>,
    loader: RefCell<Option<Rc<dyn ModuleLoader>>>,
}

/// Handle to a named dependency container. Cloning the handle aliases the
/// same container; equality is handle identity.
#[derive(Clone)]
pub struct Injector {
    inner: Rc<InjectorInner>,
}

impl Injector {
    /// Creates an empty injector. The name is normalized with
    /// [normalize_injector] and used in diagnostics and as the lookup
    /// prefix for its entries.
    pub fn new(name: &str) -> Self {
        let name = normalize_injector(name);
        debug!(injector = %name, "creating injector");

        Self {
            inner: Rc::new(InjectorInner {
                name,
                registry: RefCell::new(Registry::default()),
                imports: RefCell::new(Vec::new()),
                import_cache: RefCell::new(FxHashMap::default()),
                resolving: RefCell::new(FxHashSet::default()),
                loader: RefCell::new(None),
            }),
        }
    }

    /// Creates an injector with an initial import list.
    pub fn with_imports(name: &str, imports: &[Injector]) -> Self {
        let injector = Self::new(name);
        injector.import_injectors(imports);
        injector
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Installs the module-load collaborator used by the `load_*`
    /// registration operations.
    pub fn set_module_loader(&self, loader: Rc<dyn ModuleLoader>) {
        *self.inner.loader.borrow_mut() = Some(loader);
    }

    /// Starts registering an entry under `name`; the returned builder
    /// selects value, factory or loaded semantics and visibility.
    pub fn register(&self, name: &str) -> Registration<'_> {
        Registration {
            injector: self,
            key: normalize(name),
        }
    }

    /// Checks whether `name` resolves locally, including the implicit
    /// self-entry (imports are not consulted).
    pub fn contains(&self, name: &str) -> bool {
        !matches!(self.local_key(&normalize(name), false), LocalHit::Miss)
    }

    /// Resolves `name` against the local registry, then the import chain.
    /// `Ok(None)` means the name is unknown; factories are instantiated
    /// and memoized on first resolution.
    pub fn get(&self, name: &str) -> Result<Option<Value>, DiError> {
        self.get_visible(name, false)
    }

    /// Resolution entry point used across imports: with `public_only`,
    /// local entries not marked public are skipped (the import chain is
    /// always public-only regardless of this flag).
    pub fn get_visible(&self, name: &str, public_only: bool) -> Result<Option<Value>, DiError> {
        let key = normalize(name);

        if let Some(value) = self.resolve_local(&key, public_only)? {
            return Ok(Some(value));
        }

        self.resolve_imports(&key)
    }

    /// Like [Injector::get], but an unknown name is an error instead of
    /// the not-found sentinel.
    pub fn require(&self, name: &str) -> Result<Value, DiError> {
        self.get(name)?.ok_or_else(|| DiError::DependencyNotFound {
            injector: self.inner.name.clone(),
            missing: vec![name.to_string()],
            context: FnContext::default(),
        })
    }

    /// Typed [Injector::get]; a value registered under `name` with a
    /// different payload type resolves to `None`.
    pub fn get_as<T: 'static>(&self, name: &str) -> Result<Option<Rc<T>>, DiError> {
        Ok(self
            .get(name)?
            .and_then(|value| value.downcast::<T>().ok()))
    }

    /// Typed [Injector::require]; a present-but-differently-typed value is
    /// treated as missing.
    pub fn require_as<T: 'static>(&self, name: &str) -> Result<Rc<T>, DiError> {
        self.get_as::<T>(name)?
            .ok_or_else(|| DiError::DependencyNotFound {
                injector: self.inner.name.clone(),
                missing: vec![name.to_string()],
                context: FnContext::default(),
            })
    }

    /// Resolves every declared dependency of `function` and calls it.
    ///
    /// Overrides are consulted before the registry; an override marked
    /// absent hands the body `None` instead of failing. All unresolved
    /// names are reported together, in declaration order.
    pub fn invoke(
        &self,
        function: &InjectFn,
        overrides: Option<&Overrides>,
    ) -> Result<Value, DiError> {
        let mut resolved = Vec::with_capacity(function.deps().len());
        let mut missing = Vec::new();

        for dep in function.deps() {
            let key = normalize(dep);

            if let Some(overridden) = overrides.and_then(|overrides| overrides.get(&key)) {
                resolved.push(overridden.clone());
                continue;
            }

            match self.get(&key)? {
                Some(value) => resolved.push(Some(value)),
                None => missing.push(dep.clone()),
            }
        }

        if !missing.is_empty() {
            return Err(DiError::DependencyNotFound {
                injector: self.inner.name.clone(),
                missing,
                context: function.context(),
            });
        }

        trace!(signature = %function.signature(), injector = %self.inner.name, "invoking function");
        Ok(function.call(&resolved))
    }

    /// Returns a deferred wrapper around [Injector::invoke]: dependencies
    /// are resolved when the wrapper is called, not when it is built.
    pub fn callback(
        &self,
        function: InjectFn,
        overrides: Option<Overrides>,
    ) -> impl Fn() -> Result<Value, DiError> {
        let injector = self.clone();
        move || injector.invoke(&function, overrides.as_ref())
    }

    /// Appends injectors to the import list, skipping self-references and
    /// injectors already imported. Any successful append invalidates the
    /// whole import cache.
    pub fn import_injectors(&self, injectors: &[Injector]) {
        let mut changed = false;

        {
            let mut imports = self.inner.imports.borrow_mut();
            for candidate in injectors {
                if candidate == self || imports.iter().any(|import| import == candidate) {
                    continue;
                }

                trace!(injector = %self.inner.name, import = %candidate.inner.name, "importing");
                imports.push(candidate.clone());
                changed = true;
            }
        }

        if changed {
            self.inner.import_cache.borrow_mut().clear();
            debug!(injector = %self.inner.name, "import list changed, import cache cleared");
        }
    }

    /// Names of the imported injectors, in import order.
    pub fn import_names(&self) -> Vec<String> {
        self.inner
            .imports
            .borrow()
            .iter()
            .map(|import| import.inner.name.clone())
            .collect()
    }

    /// Creates a fresh injector pre-seeded with this injector and its
    /// imports as the import list. The child inherits the module loader
    /// unless it installs its own.
    pub fn new_child(&self, name: &str) -> Injector {
        self.new_child_with_imports(name, &[])
    }

    /// [Injector::new_child] with additional imports appended after the
    /// parent and the parent's own imports.
    pub fn new_child_with_imports(&self, name: &str, imports: &[Injector]) -> Injector {
        let child = Injector::new(name);

        let mut seeds = vec![self.clone()];
        seeds.extend(self.inner.imports.borrow().iter().cloned());
        seeds.extend(imports.iter().cloned());
        child.import_injectors(&seeds);

        if let Some(loader) = self.inner.loader.borrow().as_ref() {
            child.set_module_loader(loader.clone());
        }

        child
    }

    fn resolve_local(&self, key: &str, public_only: bool) -> Result<Option<Value>, DiError> {
        match self.local_key(key, public_only) {
            LocalHit::Entry(stored_key) => self.materialize(&stored_key),
            LocalHit::SelfRef => Ok(Some(Rc::new(self.clone()) as Value)),
            LocalHit::Miss => Ok(None),
        }
    }

    /// Maps a lookup key onto the stored key it addresses: the bare key,
    /// the key with this injector's name prefix stripped, or the implicit
    /// (private) self-entry.
    fn local_key(&self, key: &str, public_only: bool) -> LocalHit {
        let registry = self.inner.registry.borrow();
        let name = self.inner.name.as_str();

        if registry.contains(key) && (!public_only || registry.is_public(key)) {
            return LocalHit::Entry(key.to_string());
        }

        let stripped = if name.is_empty() {
            None
        } else {
            key.strip_prefix(name).filter(|rest| !rest.is_empty())
        };

        if let Some(stripped) = stripped {
            if registry.contains(stripped) && (!public_only || registry.is_public(stripped)) {
                return LocalHit::Entry(stripped.to_string());
            }
        }

        if !public_only && (key == "di" || stripped == Some("di")) {
            return LocalHit::SelfRef;
        }

        LocalHit::Miss
    }

    /// Returns the entry's value, instantiating and memoizing a factory on
    /// its first resolution. No registry borrow is held while the factory
    /// body runs, so factories may resolve against this injector.
    fn materialize(&self, key: &str) -> Result<Option<Value>, DiError> {
        let entry = self.inner.registry.borrow().entry(key).cloned();

        match entry {
            Some(Entry::Value(value)) => Ok(Some(value)),
            Some(Entry::Factory(factory)) => {
                if !self.inner.resolving.borrow_mut().insert(key.to_string()) {
                    return Err(DiError::DependencyCycle {
                        injector: self.inner.name.clone(),
                        name: key.to_string(),
                    });
                }

                debug!(name = key, injector = %self.inner.name, "instantiating factory");
                let result = self.invoke(&factory, None);
                self.inner.resolving.borrow_mut().remove(key);

                let value = result?;
                self.inner
                    .registry
                    .borrow_mut()
                    .replace_with_value(key, value.clone());

                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    fn resolve_imports(&self, key: &str) -> Result<Option<Value>, DiError> {
        if let Some(cached) = self.inner.import_cache.borrow().get(key) {
            trace!(name = key, injector = %self.inner.name, "import cache hit");
            return Ok(Some(cached.clone()));
        }

        // snapshot, so resolution may re-enter this injector
        let imports = self.inner.imports.borrow().clone();

        for import in &imports {
            if let Some(value) = import.get_visible(key, true)? {
                self.inner
                    .import_cache
                    .borrow_mut()
                    .insert(key.to_string(), value.clone());
                return Ok(Some(value));
            }
        }

        Ok(None)
    }

    pub(crate) fn names_by_visibility(&self) -> (Vec<String>, Vec<String>) {
        let registry = self.inner.registry.borrow();
        let (public, private): (Vec<_>, Vec<_>) =
            registry.names().partition(|(_, is_public)| *is_public);

        (
            public
                .into_iter()
                .map(|(name, _)| name.to_string())
                .sorted()
                .collect(),
            private
                .into_iter()
                .map(|(name, _)| name.to_string())
                .sorted()
                .collect(),
        )
    }

    pub(crate) fn imports_snapshot(&self) -> Vec<Injector> {
        self.inner.imports.borrow().clone()
    }
}

impl PartialEq for Injector {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Injector {}

impl Debug for Injector {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Injector")
            .field("name", &self.inner.name)
            .field("imports", &self.import_names())
            .finish()
    }
}

/// Invokes `function` against each injector in order, collecting the
/// results in the same order. The first failure aborts the sweep.
pub fn invoke_each(injectors: &[Injector], function: &InjectFn) -> Result<Vec<Value>, DiError> {
    injectors
        .iter()
        .map(|injector| injector.invoke(function, None))
        .try_collect()
}

/// Chainable registration builder returned by [Injector::register].
#[derive(Debug)]
pub struct Registration<'a> {
    injector: &'a Injector,
    key: String,
}

impl Registration<'_> {
    /// Registers an eagerly resolved value.
    pub fn value<T: 'static>(self, value: T) -> Self {
        self.store(Entry::Value(Rc::new(value)))
    }

    /// Registers a lazy factory: invoked through the owning injector on
    /// first resolution, its result permanently replaces the entry.
    pub fn factory(self, function: InjectFn) -> Self {
        self.store(Entry::Factory(function))
    }

    /// Loads a module and registers its payload as a value. A callable
    /// module is stored as-is: the [InjectFn] itself becomes the payload.
    pub fn load_value(self, path: &str) -> Result<Self, DiError> {
        match self.load_module(path)? {
            Loaded::Value(value) => Ok(self.store(Entry::Value(value))),
            Loaded::Function(function) => Ok(self.store(Entry::Value(Rc::new(function)))),
        }
    }

    /// Loads a module and registers it as a factory; fails with
    /// [DiError::NotAFunction] when the module is a plain value.
    pub fn load_factory(self, path: &str) -> Result<Self, DiError> {
        match self.load_module(path)? {
            Loaded::Function(function) => {
                let function = if function.origin().is_none() {
                    function.with_origin(path)
                } else {
                    function
                };
                Ok(self.store(Entry::Factory(function)))
            }
            Loaded::Value(_) => Err(DiError::NotAFunction {
                injector: self.injector.name().to_string(),
                target: path.to_string(),
                context: FnContext {
                    origin: Some(path.to_string()),
                    signature: None,
                },
            }),
        }
    }

    /// Loads a module and auto-detects the registration kind: a callable
    /// becomes a factory, anything else a value.
    pub fn load(self, path: &str) -> Result<Self, DiError> {
        match self.load_module(path)? {
            Loaded::Function(function) => Ok(self.factory(function)),
            Loaded::Value(value) => Ok(self.store(Entry::Value(value))),
        }
    }

    /// Marks the registered name as visible to importing injectors.
    pub fn public(self) -> Self {
        self.injector
            .inner
            .registry
            .borrow_mut()
            .mark_public(&self.key);
        self
    }

    fn store(self, entry: Entry) -> Self {
        debug!(name = %self.key, injector = %self.injector.name(), "registering dependency");
        self.injector
            .inner
            .registry
            .borrow_mut()
            .insert(self.key.clone(), entry);
        self
    }

    fn load_module(&self, path: &str) -> Result<Loaded, DiError> {
        let loader = self.injector.inner.loader.borrow().clone();
        let loader = loader.ok_or_else(|| DiError::CouldNotLoad {
            injector: self.injector.name().to_string(),
            path: path.to_string(),
            source: LoadError::new(path, "no module loader configured"),
        })?;

        loader.load(path).map_err(|source| DiError::CouldNotLoad {
            injector: self.injector.name().to_string(),
            path: path.to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::error::DiError;
    use crate::function::{value, InjectFn};
    use crate::injector::Injector;
    use crate::loader::{LoadError, Loaded, MockModuleLoader};
    use mockall::predicate::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn should_register_and_resolve_values() {
        let injector = Injector::new("app");
        injector.register("port").value(8080_u16);

        assert_eq!(*injector.get_as::<u16>("port").unwrap().unwrap(), 8080);
        assert!(injector.get("host").unwrap().is_none());
    }

    #[test]
    fn should_resolve_prefixed_alias() {
        let injector = Injector::new("app");
        injector.register("port").value(8080_u16);

        assert_eq!(*injector.get_as::<u16>("appport").unwrap().unwrap(), 8080);
        assert!(injector.contains("appport"));
    }

    #[test]
    fn should_invoke_factories_at_most_once() {
        let injector = Injector::new("app");
        let invocations = Rc::new(Cell::new(0));
        let seen = invocations.clone();

        injector.register("conf").factory(InjectFn::without_deps(move |_| {
            seen.set(seen.get() + 1);
            value(42_i32)
        }));

        assert_eq!(*injector.get_as::<i32>("conf").unwrap().unwrap(), 42);
        assert_eq!(*injector.get_as::<i32>("conf").unwrap().unwrap(), 42);
        assert_eq!(invocations.get(), 1);
    }

    #[test]
    fn should_resolve_factory_dependencies_against_home_injector() {
        let injector = Injector::new("app");
        injector.register("base").value(40_i32);
        injector.register("answer").factory(InjectFn::new(["base"], |args| {
            value(*args.get_as::<i32>(0).unwrap() + 2)
        }));

        assert_eq!(*injector.get_as::<i32>("answer").unwrap().unwrap(), 42);
    }

    #[test]
    fn should_detect_factory_cycles() {
        let injector = Injector::new("app");
        injector
            .register("a")
            .factory(InjectFn::new(["b"], |_| value(())));
        injector
            .register("b")
            .factory(InjectFn::new(["a"], |_| value(())));

        assert!(matches!(
            injector.get("a").unwrap_err(),
            DiError::DependencyCycle { .. }
        ));
    }

    #[test]
    fn should_resolve_self_under_di() {
        let injector = Injector::new("app");

        for name in ["di", "appdi", "DI"] {
            let handle = injector
                .get_as::<Injector>(name)
                .unwrap()
                .expect("missing self entry");
            assert_eq!(*handle, injector);
        }
    }

    #[test]
    fn should_let_registrations_shadow_di() {
        let injector = Injector::new("app");
        injector.register("di").value(1_i32);

        assert_eq!(*injector.get_as::<i32>("di").unwrap().unwrap(), 1);
    }

    #[test]
    fn should_not_expose_di_through_imports() {
        let inner = Injector::new("inner");
        let outer = Injector::with_imports("outer", &[inner]);

        let handle = outer.get_as::<Injector>("di").unwrap().unwrap();
        assert_eq!(*handle, outer);
        assert!(outer.get("innerdi").unwrap().is_none());
    }

    #[test]
    fn should_skip_self_and_duplicate_imports() {
        let other = Injector::new("other");
        let injector = Injector::new("app");

        injector.import_injectors(&[injector.clone(), other.clone(), other.clone()]);
        injector.import_injectors(&[other]);

        assert_eq!(injector.import_names(), vec!["other".to_string()]);
    }

    #[test]
    fn should_load_values_eagerly() {
        let mut loader = MockModuleLoader::new();
        loader
            .expect_load()
            .with(eq("conf/port"))
            .times(1)
            .returning(|_| Ok(Loaded::Value(value(8080_u16))));

        let injector = Injector::new("app");
        injector.set_module_loader(Rc::new(loader));
        injector.register("port").load_value("conf/port").unwrap();

        assert_eq!(*injector.get_as::<u16>("port").unwrap().unwrap(), 8080);
    }

    #[test]
    fn should_load_factories_lazily() {
        let mut loader = MockModuleLoader::new();
        loader
            .expect_load()
            .with(eq("conf/port"))
            .times(1)
            .returning(|_| Ok(Loaded::Function(InjectFn::without_deps(|_| value(8080_u16)))));

        let injector = Injector::new("app");
        injector.set_module_loader(Rc::new(loader));
        injector.register("port").load_factory("conf/port").unwrap();

        assert_eq!(*injector.get_as::<u16>("port").unwrap().unwrap(), 8080);
    }

    #[test]
    fn should_auto_detect_loaded_registration_kind() {
        let mut loader = MockModuleLoader::new();
        loader
            .expect_load()
            .with(eq("conf/port"))
            .returning(|_| Ok(Loaded::Value(value(8080_u16))));
        loader
            .expect_load()
            .with(eq("conf/host"))
            .returning(|_| Ok(Loaded::Function(InjectFn::without_deps(|_| value("localhost")))));

        let injector = Injector::new("app");
        injector.set_module_loader(Rc::new(loader));
        injector.register("port").load("conf/port").unwrap();
        injector.register("host").load("conf/host").unwrap();

        assert_eq!(*injector.get_as::<u16>("port").unwrap().unwrap(), 8080);
        assert_eq!(*injector.get_as::<&str>("host").unwrap().unwrap(), "localhost");
    }

    #[test]
    fn should_reject_value_module_as_factory() {
        let mut loader = MockModuleLoader::new();
        loader
            .expect_load()
            .returning(|_| Ok(Loaded::Value(value(1_i32))));

        let injector = Injector::new("app");
        injector.set_module_loader(Rc::new(loader));

        let error = injector
            .register("limits")
            .load_factory("conf/limits")
            .unwrap_err();
        assert_eq!(
            error.to_string(),
            "'conf/limits' is not a function (di: app)\n  at conf/limits"
        );
    }

    #[test]
    fn should_fail_loads_without_a_loader() {
        let injector = Injector::new("app");

        assert!(matches!(
            injector.register("port").load("conf/port").unwrap_err(),
            DiError::CouldNotLoad { .. }
        ));
    }

    #[test]
    fn should_wrap_loader_failures() {
        let mut loader = MockModuleLoader::new();
        loader
            .expect_load()
            .returning(|path| Err(LoadError::new(path, "no such file")));

        let injector = Injector::new("app");
        injector.set_module_loader(Rc::new(loader));

        let error = injector.register("port").load("conf/port").unwrap_err();
        assert_eq!(
            error.to_string(),
            "could not load module 'conf/port' (di: app)"
        );
    }

    #[test]
    fn should_share_loader_with_children() {
        let mut loader = MockModuleLoader::new();
        loader
            .expect_load()
            .returning(|_| Ok(Loaded::Value(value(1_i32))));

        let parent = Injector::new("parent");
        parent.set_module_loader(Rc::new(loader));

        let child = parent.new_child("child");
        child.register("one").load_value("conf/one").unwrap();

        assert_eq!(*child.get_as::<i32>("one").unwrap().unwrap(), 1);
    }
}
