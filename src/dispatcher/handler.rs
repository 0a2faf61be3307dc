use crate::binder::Args;
use once_cell::sync::OnceCell;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// A callable bound to a route at registration time.
///
/// Handlers are shared by every concurrent invocation of their route, so
/// they must be stateless or synchronize internally.
pub trait Handler: Send + Sync + 'static {
    fn call(&self, args: &Args) -> anyhow::Result<Value>;
}

impl<F> Handler for F
where
    F: Fn(&Args) -> anyhow::Result<Value> + Send + Sync + 'static,
{
    fn call(&self, args: &Args) -> anyhow::Result<Value> {
        self(args)
    }
}

/// Shared, type-erased handler reference stored in route descriptors.
pub type HandlerRef = Arc<dyn Handler>;

/// Wrap a closure as a [`HandlerRef`].
pub fn handler_fn<F>(f: F) -> HandlerRef
where
    F: Fn(&Args) -> anyhow::Result<Value> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Lazily constructed, memoized owner of a group of handler methods.
///
/// The instance is built on first invocation of any of its routes, exactly
/// once even under concurrent first calls, and then shared by all of them.
pub struct Controller<C> {
    instance: OnceCell<C>,
    init: Box<dyn Fn() -> C + Send + Sync>,
}

impl<C: Send + Sync + 'static> Controller<C> {
    pub fn new<F>(init: F) -> Arc<Self>
    where
        F: Fn() -> C + Send + Sync + 'static,
    {
        Arc::new(Self {
            instance: OnceCell::new(),
            init: Box::new(init),
        })
    }

    /// The shared instance, constructing it on first use.
    pub fn instance(&self) -> &C {
        self.instance.get_or_init(|| {
            info!(
                controller = std::any::type_name::<C>(),
                "Controller instantiated"
            );
            (self.init)()
        })
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.instance.get().is_some()
    }

    /// Bind one of the controller's methods as a route handler.
    pub fn route(self: &Arc<Self>, method: fn(&C, &Args) -> anyhow::Result<Value>) -> HandlerRef {
        let controller = Arc::clone(self);
        Arc::new(move |args: &Args| method(controller.instance(), args))
    }
}

impl<C> fmt::Debug for Controller<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Controller")
            .field("type", &std::any::type_name::<C>())
            .field("initialized", &self.instance.get().is_some())
            .finish()
    }
}
