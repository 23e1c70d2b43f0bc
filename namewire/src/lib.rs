//! Dependency injection container which wires functions by the names of
//! their declared dependencies.
//!
//! Values and lazy factories are registered on an [Injector] under
//! normalized string names. A function enters the container as an
//! [InjectFn] - an ordered dependency-name manifest plus a body - and the
//! injector resolves each name against its registry and imported injectors
//! before calling the body:
//!
//! ```
//! use namewire::{value, InjectFn, Injector};
//!
//! let injector = Injector::new("app");
//! injector.register("greeting").value("hello");
//! injector.register("port").value(8080_u16);
//!
//! let banner = InjectFn::new(["greeting", "port"], |args| {
//!     let greeting = args.get_as::<&str>(0).unwrap();
//!     let port = args.get_as::<u16>(1).unwrap();
//!     value(format!("{greeting}:{port}"))
//! });
//!
//! let result = injector.invoke(&banner, None).unwrap();
//! assert_eq!(*result.downcast::<String>().unwrap(), "hello:8080");
//! ```
//!
//! Injectors compose: [Injector::import_injectors] exposes another
//! injector's public entries through an ordered, cached import chain, and
//! [Injector::new_child] spawns a container pre-wired to its parent.
//! Failures carry the owning injector's name and, where known, the origin
//! and signature of the failing function; see [DiError].

pub mod describe;
pub mod error;
pub mod function;
pub mod injector;
pub mod loader;
pub mod name;
mod registry;

pub use describe::describe;
pub use error::{DiError, FnContext};
pub use function::{value, Args, InjectFn, Overrides, Value};
pub use injector::{invoke_each, Injector, Registration};
pub use loader::{LoadError, Loaded, ModuleLoader};
