use super::set::HookSet;
use super::types::{ErrorAction, Hooks, OnErrorHook};
use crate::context::Context;
use crate::error::{DbError, DbResult};
use crate::value::NamedValue;

/// Runs several hook sets as one.
///
/// Every member's Before runs in order, each receiving the context the
/// previous one returned; errors are collected rather than stopping the
/// chain. One error is returned as is, several as [`DbError::Multiple`].
/// After behaves the same way.
///
/// OnError asks every member. Replacement errors are collected the same way;
/// when no member replaces the error, the original propagates. A member
/// returning [`ErrorAction::Suppress`] does not suppress the composed call.
#[derive(Debug, Clone, Default)]
pub struct CompositeHooks {
    members: Vec<HookSet>,
}

impl CompositeHooks {
    /// Create an empty composite.
    pub fn new() -> Self {
        Self {
            members: Vec::new(),
        }
    }

    /// Add hooks without an OnError hook.
    #[allow(clippy::should_implement_trait)]
    pub fn add<H: Hooks + 'static>(self, hooks: H) -> Self {
        self.add_set(HookSet::new(hooks))
    }

    /// Add hooks that also handle errors.
    pub fn add_full<H: Hooks + OnErrorHook + 'static>(self, hooks: H) -> Self {
        self.add_set(HookSet::full(hooks))
    }

    /// Add a prepared hook set.
    pub fn add_set(mut self, set: HookSet) -> Self {
        self.members.push(set);
        self
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Turn into a [`HookSet`] that carries the composed OnError.
    pub fn into_hook_set(self) -> HookSet {
        HookSet::full(self)
    }

    fn run_stage<F>(&self, mut ctx: Context, stage: F) -> DbResult<Context>
    where
        F: Fn(&HookSet, Context) -> DbResult<Context>,
    {
        let mut errors = Vec::new();
        for member in &self.members {
            match stage(member, ctx.clone()) {
                Ok(next) => ctx = next,
                Err(err) => errors.push(err),
            }
        }
        match collapse(errors) {
            Some(err) => Err(err),
            None => Ok(ctx),
        }
    }
}

fn collapse(mut errors: Vec<DbError>) -> Option<DbError> {
    match errors.len() {
        0 => None,
        1 => errors.pop(),
        _ => Some(DbError::Multiple(errors)),
    }
}

impl Hooks for CompositeHooks {
    fn before(&self, ctx: Context, query: &str, args: &[NamedValue]) -> DbResult<Context> {
        self.run_stage(ctx, |member, ctx| member.before(ctx, query, args))
    }

    fn after(&self, ctx: Context, query: &str, args: &[NamedValue]) -> DbResult<Context> {
        self.run_stage(ctx, |member, ctx| member.after(ctx, query, args))
    }
}

impl OnErrorHook for CompositeHooks {
    fn on_error(
        &self,
        ctx: &Context,
        err: &DbError,
        query: &str,
        args: &[NamedValue],
    ) -> ErrorAction {
        let replacements = self
            .members
            .iter()
            .filter(|m| m.has_on_error())
            .filter_map(|m| match m.on_error(ctx, err, query, args) {
                ErrorAction::Replace(replaced) if !replaced.same_as(err) => Some(replaced),
                _ => None,
            })
            .collect();

        match collapse(replacements) {
            Some(replaced) => ErrorAction::Replace(replaced),
            None => ErrorAction::Propagate,
        }
    }
}

impl From<CompositeHooks> for HookSet {
    fn from(composite: CompositeHooks) -> Self {
        composite.into_hook_set()
    }
}
