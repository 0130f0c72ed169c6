//! Plugin that reports build lifecycle progress through tracing.

use std::time::Instant;

use async_trait::async_trait;
use bindle::{HookContext, HookListener, HookSet, Plugin};

/// Logs build start and finish, with module count and elapsed time.
pub struct LogPlugin;

struct Started;

#[async_trait]
impl HookListener for Started {
    async fn handle(&self, ctx: &HookContext<'_>) -> bindle::Result<()> {
        tracing::info!(entry = %ctx.config.entry.display(), "build started");
        Ok(())
    }
}

struct Finished(Instant);

#[async_trait]
impl HookListener for Finished {
    async fn handle(&self, ctx: &HookContext<'_>) -> bindle::Result<()> {
        let modules = ctx.graph.map_or(0, |g| g.len());
        tracing::info!(modules, elapsed = ?self.0.elapsed(), "build finished");
        Ok(())
    }
}

struct Failed;

#[async_trait]
impl HookListener for Failed {
    async fn handle(&self, ctx: &HookContext<'_>) -> bindle::Result<()> {
        if let Some(error) = ctx.error {
            tracing::error!(%error, "build failed");
        }
        Ok(())
    }
}

impl Plugin for LogPlugin {
    fn name(&self) -> &str {
        "log"
    }

    fn apply(&self, hooks: &mut HookSet) {
        let started = Instant::now();
        hooks.before_run.tap(std::sync::Arc::new(Started));
        hooks.after_run.tap(std::sync::Arc::new(Finished(started)));
        hooks.failed.tap(std::sync::Arc::new(Failed));
    }
}
