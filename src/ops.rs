//! Operators and terminal consumers.
//!
//! Operators are inherent methods on [`Observable`](crate::observable::Observable)
//! returning a new, still lazy observable. Terminal consumers subscribe at
//! once and return an [`ObservableFuture`].

pub mod catch;
pub mod collect;
pub mod drop;
pub mod every;
pub mod filter;
pub mod finally;
pub mod find;
pub mod first;
pub mod flat_map;
pub mod for_each;
pub mod inspect;
pub mod into_future;
pub mod last;
pub mod map;
pub mod reduce;
pub mod share;
pub mod switch_map;
pub mod take;
pub mod take_until;

pub use inspect::Inspector;
pub use into_future::ObservableFuture;
