//! A boxed future alias for the evaluator's mutually recursive `async fn`s
//! (`Expr` can nest a `Pipe` nests a `When` nests an `Expr`, ...). Rust
//! doesn't support recursive `async fn` directly; boxing the future at each
//! recursive entry point is the standard workaround and needs nothing
//! beyond `std`.

use std::future::Future;
use std::pin::Pin;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;
