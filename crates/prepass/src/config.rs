//! Prepass configuration.

use std::time::Duration;

/// How long a synchronous walk may run before yielding to the host.
pub const DEFAULT_YIELD_AFTER: Duration = Duration::from_millis(5);

/// Maximum number of render-phase re-renders of one function component.
pub const DEFAULT_RE_RENDER_LIMIT: usize = 25;

/// Options for [`run_with`](crate::run_with).
///
/// ```ignore
/// let config = PrepassConfig::default()
///     .with_resolve_lazy(true)
///     .with_yield_after(Duration::from_millis(10));
/// ```
#[derive(Debug, Clone)]
pub struct PrepassConfig {
    /// Drive lazy components through their loaders. When false, an
    /// unresolved lazy element is only shown to the visitor, which may load
    /// it and return a thenable to have it rendered afterwards.
    pub resolve_lazy: bool,
    /// Wall-clock budget of one synchronous walk; `None` never yields.
    pub yield_after: Option<Duration>,
    pub re_render_limit: usize,
}

impl Default for PrepassConfig {
    fn default() -> Self {
        Self {
            resolve_lazy: false,
            yield_after: Some(DEFAULT_YIELD_AFTER),
            re_render_limit: DEFAULT_RE_RENDER_LIMIT,
        }
    }
}

impl PrepassConfig {
    pub fn with_resolve_lazy(mut self, resolve_lazy: bool) -> Self {
        self.resolve_lazy = resolve_lazy;
        self
    }

    pub fn with_yield_after(mut self, budget: Duration) -> Self {
        self.yield_after = Some(budget);
        self
    }

    /// Walk every synchronous subtree to completion without yielding.
    pub fn without_yielding(mut self) -> Self {
        self.yield_after = None;
        self
    }

    pub fn with_re_render_limit(mut self, limit: usize) -> Self {
        self.re_render_limit = limit;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = PrepassConfig::default();
        assert!(!config.resolve_lazy);
        assert_eq!(config.yield_after, Some(Duration::from_millis(5)));
        assert_eq!(config.re_render_limit, 25);
    }

    #[test]
    fn builders_override_defaults() {
        let config = PrepassConfig::default()
            .with_resolve_lazy(true)
            .without_yielding()
            .with_re_render_limit(3);
        assert!(config.resolve_lazy);
        assert!(config.yield_after.is_none());
        assert_eq!(config.re_render_limit, 3);
    }
}
