//! Named, ordered, sequentially awaited lifecycle hooks.
//!
//! A fresh [`HookSet`] is created per build session and discarded with it;
//! nothing here is process-global. Listeners on one hook fire strictly in
//! subscription order, each awaited to completion before the next. A listener
//! error stops the sequence and propagates to the phase that fired the hook.

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::BuildConfig;
use crate::graph::ModuleGraph;
use crate::{Error, Result};

/// Read-only view of the session handed to hook listeners.
///
/// `graph` is populated once compilation has finished; `error` is populated
/// only when the `failed` hook fires.
pub struct HookContext<'a> {
    pub config: &'a BuildConfig,
    pub graph: Option<&'a ModuleGraph>,
    pub error: Option<&'a Error>,
}

/// A subscriber on one lifecycle hook. Listeners may be asynchronous.
#[async_trait]
pub trait HookListener: Send + Sync {
    async fn handle(&self, ctx: &HookContext<'_>) -> Result<()>;
}

/// Adapter so plain synchronous closures can subscribe to hooks.
struct SyncListener<F>(F);

#[async_trait]
impl<F> HookListener for SyncListener<F>
where
    F: Fn(&HookContext<'_>) -> Result<()> + Send + Sync,
{
    async fn handle(&self, ctx: &HookContext<'_>) -> Result<()> {
        (self.0)(ctx)
    }
}

/// One named extension point with its ordered subscriber list.
pub struct Hook {
    name: &'static str,
    listeners: Vec<Arc<dyn HookListener>>,
}

impl Hook {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            listeners: Vec::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Subscribe a listener. Listeners fire in subscription order.
    pub fn tap(&mut self, listener: Arc<dyn HookListener>) {
        self.listeners.push(listener);
    }

    /// Subscribe a synchronous closure.
    pub fn tap_fn<F>(&mut self, f: F)
    where
        F: Fn(&HookContext<'_>) -> Result<()> + Send + Sync + 'static,
    {
        self.tap(Arc::new(SyncListener(f)));
    }

    /// Fire the hook: invoke every listener in order, awaiting each before
    /// the next. The first failure stops the sequence.
    pub async fn call(&self, ctx: &HookContext<'_>) -> Result<()> {
        for listener in &self.listeners {
            listener.handle(ctx).await.map_err(|e| Error::Hook {
                hook: self.name,
                message: e.to_string(),
            })?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl std::fmt::Debug for Hook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hook")
            .field("name", &self.name)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// The fixed set of lifecycle hooks of one build session.
#[derive(Debug)]
pub struct HookSet {
    pub before_run: Hook,
    pub after_run: Hook,
    pub before_compile: Hook,
    pub after_compile: Hook,
    pub emit: Hook,
    pub failed: Hook,
}

impl HookSet {
    pub(crate) fn new() -> Self {
        Self {
            before_run: Hook::new("before_run"),
            after_run: Hook::new("after_run"),
            before_compile: Hook::new("before_compile"),
            after_compile: Hook::new("after_compile"),
            emit: Hook::new("emit"),
            failed: Hook::new("failed"),
        }
    }
}

/// A build extension. `apply` is called once at session construction and
/// registers listeners on the hooks the plugin cares about.
pub trait Plugin: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str {
        "plugin"
    }

    fn apply(&self, hooks: &mut HookSet);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BuildConfig;
    use std::sync::Mutex;

    fn ctx_with<'a>(config: &'a BuildConfig) -> HookContext<'a> {
        HookContext {
            config,
            graph: None,
            error: None,
        }
    }

    #[tokio::test]
    async fn listeners_fire_in_subscription_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut hook = Hook::new("before_run");
        for tag in ["first", "second", "third"] {
            let order = Arc::clone(&order);
            hook.tap_fn(move |_| {
                order.lock().unwrap().push(tag);
                Ok(())
            });
        }

        let config = BuildConfig::new("./src/index.js");
        hook.call(&ctx_with(&config)).await.unwrap();
        assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn a_failing_listener_stops_the_sequence() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut hook = Hook::new("emit");
        {
            let order = Arc::clone(&order);
            hook.tap_fn(move |_| {
                order.lock().unwrap().push("ran");
                Err(Error::InvalidConfig("listener failure".into()))
            });
        }
        {
            let order = Arc::clone(&order);
            hook.tap_fn(move |_| {
                order.lock().unwrap().push("never");
                Ok(())
            });
        }

        let config = BuildConfig::new("./src/index.js");
        let err = hook.call(&ctx_with(&config)).await.unwrap_err();
        assert!(matches!(err, Error::Hook { hook: "emit", .. }));
        assert_eq!(*order.lock().unwrap(), vec!["ran"]);
    }

    #[tokio::test]
    async fn async_listeners_are_awaited_sequentially() {
        struct Yielding(Arc<Mutex<Vec<&'static str>>>, &'static str);

        #[async_trait]
        impl HookListener for Yielding {
            async fn handle(&self, _ctx: &HookContext<'_>) -> Result<()> {
                tokio::task::yield_now().await;
                self.0.lock().unwrap().push(self.1);
                Ok(())
            }
        }

        let order = Arc::new(Mutex::new(Vec::new()));
        let mut hook = Hook::new("after_compile");
        hook.tap(Arc::new(Yielding(Arc::clone(&order), "a")));
        hook.tap(Arc::new(Yielding(Arc::clone(&order), "b")));

        let config = BuildConfig::new("./src/index.js");
        hook.call(&ctx_with(&config)).await.unwrap();
        assert_eq!(*order.lock().unwrap(), vec!["a", "b"]);
    }
}
