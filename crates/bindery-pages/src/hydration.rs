//! Client-side hydration
//!
//! - [`runtime`]: [`HydrationContext`] and [`HydrationError`]
//! - [`modules`]: the [`ModuleResolver`] import hook and the path-keyed
//!   [`ModuleCache`] used to re-import `{data, path}` pipe exports

pub mod modules;
pub mod runtime;

pub use modules::{ModuleCache, ModuleResolver, NoModules};
pub use runtime::{HydrationContext, HydrationError};
