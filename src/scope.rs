//! # Logging Scopes
//!
//! A scope is caller-supplied context pushed around a unit of work. While a
//! [`ScopeGuard`] is alive, every line written from the same thread is
//! prefixed with the active scopes, outermost first.

use std::cell::RefCell;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Source of the scope chain attached to log lines.
pub trait ScopeProvider: Send + Sync {
    /// Pushes `state` on the current scope stack until the guard is dropped.
    fn push(&self, state: String) -> ScopeGuard;

    /// Visits the active scopes, outermost first.
    fn for_each_scope(&self, visit: &mut dyn FnMut(&str));

    /// Collects the active scopes, outermost first.
    fn scopes(&self) -> Vec<String> {
        let mut scopes = Vec::new();
        self.for_each_scope(&mut |scope| scopes.push(scope.to_string()));
        scopes
    }
}

/// Keeps a scope active; leaving it pops the scope.
#[must_use = "the scope is popped as soon as the guard is dropped"]
pub struct ScopeGuard {
    on_drop: Option<Box<dyn FnOnce()>>,
}

impl ScopeGuard {
    /// A guard that does nothing, used when scopes are disabled.
    pub fn noop() -> Self {
        ScopeGuard { on_drop: None }
    }

    pub fn new(on_drop: impl FnOnce() + 'static) -> Self {
        ScopeGuard {
            on_drop: Some(Box::new(on_drop)),
        }
    }
}

impl fmt::Debug for ScopeGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeGuard")
            .field("active", &self.on_drop.is_some())
            .finish()
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        if let Some(on_drop) = self.on_drop.take() {
            on_drop();
        }
    }
}

static NEXT_PROVIDER_ID: AtomicUsize = AtomicUsize::new(0);

thread_local! {
    static SCOPES: RefCell<Vec<(usize, String)>> = const { RefCell::new(Vec::new()) };
}

/// Default provider: one scope stack per thread and per provider instance.
#[derive(Debug)]
pub struct ThreadScopeProvider {
    id: usize,
}

impl ThreadScopeProvider {
    pub fn new() -> Self {
        ThreadScopeProvider {
            id: NEXT_PROVIDER_ID.fetch_add(1, Ordering::Relaxed),
        }
    }
}

impl Default for ThreadScopeProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeProvider for ThreadScopeProvider {
    fn push(&self, state: String) -> ScopeGuard {
        let id = self.id;
        SCOPES.with(|scopes| scopes.borrow_mut().push((id, state)));
        ScopeGuard::new(move || {
            // try_with: the guard may outlive the thread-local during teardown
            let _ = SCOPES.try_with(|scopes| {
                let mut scopes = scopes.borrow_mut();
                if let Some(pos) = scopes.iter().rposition(|(owner, _)| *owner == id) {
                    scopes.remove(pos);
                }
            });
        })
    }

    fn for_each_scope(&self, visit: &mut dyn FnMut(&str)) {
        SCOPES.with(|scopes| {
            for (owner, scope) in scopes.borrow().iter() {
                if *owner == self.id {
                    visit(scope);
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_scopes() {
        let provider = ThreadScopeProvider::new();
        assert!(provider.scopes().is_empty());

        let outer = provider.push("outer".to_string());
        {
            let _inner = provider.push("inner".to_string());
            assert_eq!(provider.scopes(), vec!["outer", "inner"]);
        }
        assert_eq!(provider.scopes(), vec!["outer"]);
        drop(outer);
        assert!(provider.scopes().is_empty());
    }

    #[test]
    fn test_providers_are_isolated() {
        let a = ThreadScopeProvider::new();
        let b = ThreadScopeProvider::new();
        let _ga = a.push("a".to_string());
        let _gb = b.push("b".to_string());
        assert_eq!(a.scopes(), vec!["a"]);
        assert_eq!(b.scopes(), vec!["b"]);
    }

    #[test]
    fn test_scopes_are_per_thread() {
        let provider = std::sync::Arc::new(ThreadScopeProvider::new());
        let _guard = provider.push("main".to_string());

        let other = std::sync::Arc::clone(&provider);
        let seen = std::thread::spawn(move || other.scopes()).join().unwrap();
        assert!(seen.is_empty());
        assert_eq!(provider.scopes(), vec!["main"]);
    }

    #[test]
    fn test_noop_guard() {
        let guard = ScopeGuard::noop();
        assert_eq!(format!("{guard:?}"), "ScopeGuard { active: false }");
    }
}
