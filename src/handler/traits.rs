//! Provider trait.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use super::{ProviderRequest, Reply};

/// Type alias for boxed async return type (dyn-compatible).
///
/// Providers are stored as `Arc<dyn Provider>` in the MIB, so the trait
/// method returns a boxed future instead of using `async fn`.
///
/// ```rust
/// use async_snmp_agent::handler::{BoxFuture, Reply};
///
/// fn later<'a>(n: &'a u32) -> BoxFuture<'a, Reply> {
///     Box::pin(async move {
///         if *n == 0 { Reply::NoValue } else { Reply::Error(async_snmp_agent::ErrorStatus::GenErr) }
///     })
/// }
/// ```
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Supplies values for one registered MIB object.
///
/// The agent calls [`handle`](Provider::handle) once per variable binding
/// that resolves to the provider's node. The returned future must resolve
/// to exactly one [`Reply`]:
///
/// - [`Reply::Value`] with the binding to place in the response. For
///   GetNext the binding's OID is the instance found, which must sort after
///   the requested OID.
/// - [`Reply::Error`] with an error status. The agent reports it as
///   `genErr` at this binding's index.
/// - [`Reply::NoValue`] when there is no such instance. For GetNext this
///   passes the request on to the next object in the tree.
///
/// For Get and Set the agent has already checked that the requested OID
/// names an instance: `.0` below a scalar, or a non-empty row index below a
/// column. For GetNext on a column, [`ProviderRequest::instance`] is `None`
/// when the first row is wanted and the row to follow otherwise.
///
/// # Example
///
/// ```rust
/// use async_snmp_agent::handler::{BoxFuture, Provider, ProviderRequest, Reply, read_only_scalar};
///
/// struct Uptime(std::time::Instant);
///
/// impl Provider for Uptime {
///     fn handle<'a>(&'a self, req: &'a ProviderRequest) -> BoxFuture<'a, Reply> {
///         Box::pin(async move {
///             let ticks = (self.0.elapsed().as_millis() / 10) as u32;
///             read_only_scalar(req, async_snmp_agent::Value::TimeTicks(ticks))
///         })
///     }
/// }
/// ```
pub trait Provider: Send + Sync + 'static {
    /// Answer one variable binding.
    fn handle<'a>(&'a self, req: &'a ProviderRequest) -> BoxFuture<'a, Reply>;
}

impl<P: Provider + ?Sized> Provider for Arc<P> {
    fn handle<'a>(&'a self, req: &'a ProviderRequest) -> BoxFuture<'a, Reply> {
        (**self).handle(req)
    }
}

/// Synchronous provider built from a closure. See [`provider_fn`].
pub struct ProviderFn<F> {
    f: F,
}

impl<F> Provider for ProviderFn<F>
where
    F: Fn(&ProviderRequest) -> Reply + Send + Sync + 'static,
{
    fn handle<'a>(&'a self, req: &'a ProviderRequest) -> BoxFuture<'a, Reply> {
        let reply = (self.f)(req);
        Box::pin(async move { reply })
    }
}

/// Wrap a closure that answers immediately.
///
/// ```rust
/// use async_snmp_agent::handler::{provider_fn, read_only_scalar};
///
/// let descr = provider_fn(|req| read_only_scalar(req, "test agent"));
/// # let _ = descr;
/// ```
pub fn provider_fn<F>(f: F) -> ProviderFn<F>
where
    F: Fn(&ProviderRequest) -> Reply + Send + Sync + 'static,
{
    ProviderFn { f }
}

impl<F> std::fmt::Debug for ProviderFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderFn").finish_non_exhaustive()
    }
}
