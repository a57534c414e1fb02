use std::future::Future;
use std::pin::Pin;

/// Boxed future that can be sent between threads.
///
/// Trait methods at async seams return this so the traits stay dyn-compatible.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
