//! Query-string grammar and structured query specification.
//!
//! - [`key`] - classifies `where__`/`order__` keys
//! - [`operator`] - operator tokens and predicate construction
//! - [`request`] - validated `page`/`take` and ordered parameters
//! - [`spec`] - folds a request into a [`QuerySpec`]

pub mod key;
pub mod operator;
pub mod request;
pub mod spec;

pub use key::{FilterInstruction, OrderDirection};
pub use operator::{Comparison, Operator, OperatorRegistry, Predicate};
pub use request::{PaginationRequest, RequestLimits};
pub use spec::{Filter, OrderBy, Overrides, QuerySpec, QuerySpecBuilder};
