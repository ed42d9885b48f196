//! Execution context resolution.
//!
//! A context names the remote endpoint every invocation should target. It is
//! resolved once, up front, and stored in [`ClientConfig`](super::ClientConfig)
//! so that every operation receives it explicitly.

/// Environment variables consulted, in order, when configuration names no
/// context.
const FALLBACK_ENV_VARS: &[&str] = &["DOCKER_CONTEXT"];

/// Resolves the execution context from configuration and environment.
///
/// # Type Parameters
///
/// * `E` - An environment provider implementing the `mockable::Env` trait,
///   allowing for testable environment variable access.
///
/// # Example
///
/// ```ignore
/// use mockable::DefaultEnv;
/// use dockside::engine::ContextResolver;
///
/// let env = DefaultEnv::new();
/// let context = ContextResolver::new(&env).resolve(Some("remote-prod"));
/// assert_eq!(context.as_deref(), Some("remote-prod"));
/// ```
pub struct ContextResolver<'a, E: mockable::Env> {
    env: &'a E,
}

impl<'a, E: mockable::Env> ContextResolver<'a, E> {
    /// Creates a new context resolver with the given environment provider.
    #[must_use]
    pub const fn new(env: &'a E) -> Self {
        Self { env }
    }

    /// Resolve the context to inject as `--context`.
    ///
    /// Resolution order:
    /// 1. `configured` (from CLI, config file, or `DOCKSIDE_CONTEXT`)
    /// 2. `DOCKER_CONTEXT`
    ///
    /// Empty values are skipped. `None` means the executable's own default.
    #[must_use]
    pub fn resolve(&self, configured: Option<&str>) -> Option<String> {
        configured
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(String::from)
            .or_else(|| self.resolve_from_env())
    }

    /// Resolve the context from fallback environment variables only.
    #[must_use]
    pub fn resolve_from_env(&self) -> Option<String> {
        FALLBACK_ENV_VARS
            .iter()
            .filter_map(|var_name| self.env.string(var_name))
            .map(|value| String::from(value.trim()))
            .find(|value| !value.is_empty())
    }
}
