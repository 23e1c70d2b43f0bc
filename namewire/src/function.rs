//! Function manifests - the unit of invocation.
//!
//! There is no parameter-name reflection in a compiled language, so a
//! function enters the container as an [InjectFn]: an ordered list of
//! dependency names paired with a body taking the resolved values. The
//! body receives an [Args] view and returns a type-erased [Value].

use crate::error::FnContext;
use crate::name::normalize;
use derivative::Derivative;
use fxhash::FxHashMap;
use std::any::Any;
use std::rc::Rc;

/// Type-erased payload stored in and resolved from injectors.
pub type Value = Rc<dyn Any>;

/// Wraps an arbitrary value into the type-erased payload form.
pub fn value<T: 'static>(value: T) -> Value {
    Rc::new(value)
}

/// Resolved arguments passed to an [InjectFn] body, in declaration order.
pub struct Args<'a> {
    values: &'a [Option<Value>],
}

impl<'a> Args<'a> {
    pub(crate) fn new(values: &'a [Option<Value>]) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the argument at `index`. `None` means the caller explicitly
    /// overrode the parameter as absent - a missing dependency would have
    /// failed the invocation before the body ran.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index).and_then(|value| value.as_ref())
    }

    /// Typed accessor; `None` when the argument is absent or holds a
    /// different type.
    pub fn get_as<T: 'static>(&self, index: usize) -> Option<Rc<T>> {
        self.get(index)
            .cloned()
            .and_then(|value| value.downcast::<T>().ok())
    }
}

/// A callable paired with the ordered list of dependency names it expects.
///
/// The name list is the explicit stand-in for parameter-name reflection:
/// whoever builds the [InjectFn] states which names the body consumes, and
/// the injector resolves them in that order at invocation time.
#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct InjectFn {
    deps: Vec<String>,
    #[derivative(Debug = "ignore")]
    body: Rc<dyn Fn(&Args) -> Value>,
    origin: Option<String>,
}

impl InjectFn {
    pub fn new<I, S, F>(deps: I, body: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&Args) -> Value + 'static,
    {
        Self {
            deps: deps.into_iter().map(Into::into).collect(),
            body: Rc::new(body),
            origin: None,
        }
    }

    /// Convenience constructor for a function with no dependencies.
    pub fn without_deps<F>(body: F) -> Self
    where
        F: Fn(&Args) -> Value + 'static,
    {
        Self::new(Vec::<String>::new(), body)
    }

    /// Tags the function with the path it came from, for diagnostics.
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Declared dependency names, in declaration order.
    pub fn deps(&self) -> &[String] {
        &self.deps
    }

    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    /// Textual form of the expected parameter list, e.g. `fn(server, port)`.
    pub fn signature(&self) -> String {
        format!("fn({})", self.deps.join(", "))
    }

    pub(crate) fn context(&self) -> FnContext {
        FnContext {
            origin: self.origin.clone(),
            signature: Some(self.signature()),
        }
    }

    pub(crate) fn call(&self, args: &[Option<Value>]) -> Value {
        (self.body)(&Args::new(args))
    }
}

/// Per-invocation argument overrides, keyed by normalized parameter name.
///
/// An override set with [Overrides::value] supplies the argument directly,
/// bypassing the registry. One set with [Overrides::absent] hands the body
/// `None` for that parameter instead of failing the invocation with a
/// missing dependency.
#[derive(Default, Clone)]
pub struct Overrides {
    entries: FxHashMap<String, Option<Value>>,
}

impl Overrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value<T: 'static>(mut self, name: &str, value: T) -> Self {
        self.entries.insert(normalize(name), Some(Rc::new(value)));
        self
    }

    pub fn absent(mut self, name: &str) -> Self {
        self.entries.insert(normalize(name), None);
        self
    }

    pub(crate) fn get(&self, key: &str) -> Option<&Option<Value>> {
        self.entries.get(key)
    }
}
