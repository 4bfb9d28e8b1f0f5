//! Reducer composition utilities
//!
//! This module provides utilities for composing reducers in various ways:
//! - **`combine_reducers`**: Run multiple reducers on the same state/action
//! - **`scope_reducer`**: Focus a slice reducer on one field of the app state
//!
//! # Examples
//!
//! ## Scoping a slice reducer
//!
//! ```
//! use sugoi_core::{Effect, Reducer, SmallVec};
//! use sugoi_core::composition::scope_reducer;
//!
//! #[derive(Clone, Default)]
//! struct ThemeState {
//!     dark: bool,
//! }
//!
//! #[derive(Clone, Debug)]
//! enum ThemeAction {
//!     Toggle,
//! }
//!
//! struct ThemeReducer;
//!
//! impl Reducer for ThemeReducer {
//!     type State = ThemeState;
//!     type Action = ThemeAction;
//!     type Environment = ();
//!
//!     fn reduce(&self, state: &mut ThemeState, action: ThemeAction, _env: &()) -> SmallVec<[Effect<ThemeAction>; 4]> {
//!         match action {
//!             ThemeAction::Toggle => state.dark = !state.dark,
//!         }
//!         SmallVec::new()
//!     }
//! }
//!
//! #[derive(Default)]
//! struct AppState {
//!     theme: ThemeState,
//! }
//!
//! #[derive(Clone, Debug)]
//! enum AppAction {
//!     Theme(ThemeAction),
//!     Other,
//! }
//!
//! fn theme(s: &mut AppState) -> &mut ThemeState {
//!     &mut s.theme
//! }
//!
//! fn theme_action(a: AppAction) -> Option<ThemeAction> {
//!     match a {
//!         AppAction::Theme(t) => Some(t),
//!         AppAction::Other => None,
//!     }
//! }
//!
//! let scoped = scope_reducer(ThemeReducer, theme, theme_action, AppAction::Theme);
//!
//! let mut state = AppState::default();
//! let _ = scoped.reduce(&mut state, AppAction::Theme(ThemeAction::Toggle), &());
//! assert!(state.theme.dark);
//! let _ = scoped.reduce(&mut state, AppAction::Other, &());
//! assert!(state.theme.dark);
//! ```

use std::sync::Arc;

use smallvec::SmallVec;

use crate::effect::Effect;
use crate::reducer::Reducer;

/// Shared, type-erased reducer handle used by [`CombinedReducer`]
pub type BoxedReducer<S, A, E> = Arc<dyn Reducer<State = S, Action = A, Environment = E> + Send + Sync>;

/// Combines multiple reducers that operate on the same state and action types.
///
/// Each reducer is run in order, and all effects are collected and concatenated.
/// Later reducers observe the state changes made by earlier ones for the same
/// action.
#[must_use]
pub fn combine_reducers<S, A, E>(reducers: Vec<BoxedReducer<S, A, E>>) -> CombinedReducer<S, A, E>
where
    S: 'static,
    A: Clone + 'static,
    E: 'static,
{
    CombinedReducer { reducers }
}

/// A combined reducer that runs multiple reducers in sequence.
///
/// Created by [`combine_reducers`].
pub struct CombinedReducer<S, A, E>
where
    S: 'static,
    A: Clone + 'static,
    E: 'static,
{
    reducers: Vec<BoxedReducer<S, A, E>>,
}

impl<S, A, E> Clone for CombinedReducer<S, A, E>
where
    S: 'static,
    A: Clone + 'static,
    E: 'static,
{
    fn clone(&self) -> Self {
        Self {
            reducers: self.reducers.clone(),
        }
    }
}

impl<S, A, E> Reducer for CombinedReducer<S, A, E>
where
    S: 'static,
    A: Clone + 'static,
    E: 'static,
{
    type State = S;
    type Action = A;
    type Environment = E;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let mut all_effects = SmallVec::new();

        for reducer in &self.reducers {
            let effects = reducer.reduce(state, action.clone(), env);
            all_effects.extend(effects);
        }

        all_effects
    }
}

/// Scopes a slice reducer to one field of a larger state and one variant of
/// a larger action.
///
/// - `state` projects the parent state onto the slice
/// - `extract` returns the slice action, or `None` when the action belongs
///   to another slice (the reducer is then skipped)
/// - `embed` lifts the slice's effect outputs back into the parent action
pub fn scope_reducer<S, SubS, A, SubA, E, R>(
    reducer: R,
    state: fn(&mut S) -> &mut SubS,
    extract: fn(A) -> Option<SubA>,
    embed: fn(SubA) -> A,
) -> ScopedReducer<S, SubS, A, SubA, E, R>
where
    R: Reducer<State = SubS, Action = SubA, Environment = E>,
{
    ScopedReducer {
        reducer,
        state,
        extract,
        embed,
    }
}

/// A scoped reducer that operates on a subset of state.
///
/// Created by [`scope_reducer`].
pub struct ScopedReducer<S, SubS, A, SubA, E, R>
where
    R: Reducer<State = SubS, Action = SubA, Environment = E>,
{
    reducer: R,
    state: fn(&mut S) -> &mut SubS,
    extract: fn(A) -> Option<SubA>,
    embed: fn(SubA) -> A,
}

impl<S, SubS, A, SubA, E, R> Reducer for ScopedReducer<S, SubS, A, SubA, E, R>
where
    A: Send + 'static,
    SubA: Send + 'static,
    R: Reducer<State = SubS, Action = SubA, Environment = E>,
{
    type State = S;
    type Action = A;
    type Environment = E;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let Some(sub_action) = (self.extract)(action) else {
            return SmallVec::new();
        };

        let sub_state = (self.state)(state);
        let embed = self.embed;

        self.reducer
            .reduce(sub_state, sub_action, env)
            .into_iter()
            .map(|effect| effect.map(embed))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smallvec;

    #[derive(Clone, Default)]
    struct TestState {
        counter: i32,
        name: String,
    }

    #[derive(Clone, Debug, PartialEq)]
    enum TestAction {
        Increment,
        Decrement,
        SetName(String),
    }

    struct CounterReducer;

    impl Reducer for CounterReducer {
        type State = TestState;
        type Action = TestAction;
        type Environment = ();

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            match action {
                TestAction::Increment => {
                    state.counter += 1;
                    smallvec![Effect::None]
                },
                TestAction::Decrement => {
                    state.counter -= 1;
                    smallvec![Effect::None]
                },
                TestAction::SetName(_) => SmallVec::new(),
            }
        }
    }

    struct NameReducer;

    impl Reducer for NameReducer {
        type State = TestState;
        type Action = TestAction;
        type Environment = ();

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            if let TestAction::SetName(name) = action {
                state.name = name;
                return smallvec![Effect::send(TestAction::Increment)];
            }
            SmallVec::new()
        }
    }

    #[test]
    fn test_combine_reducers() {
        let combined = combine_reducers::<TestState, TestAction, ()>(vec![
            Arc::new(CounterReducer),
            Arc::new(NameReducer),
        ]);

        let mut state = TestState::default();

        let effects = combined.reduce(&mut state, TestAction::Increment, &());
        assert_eq!(state.counter, 1);
        assert_eq!(effects.len(), 1);

        let effects = combined.reduce(&mut state, TestAction::SetName("Alice".to_string()), &());
        assert_eq!(state.name, "Alice");
        assert_eq!(effects.len(), 1);

        let cloned = combined.clone();
        let _ = cloned.reduce(&mut state, TestAction::Decrement, &());
        assert_eq!(state.counter, 0);
    }

    #[derive(Default)]
    struct ParentState {
        child: TestState,
        untouched: u8,
    }

    #[derive(Clone, Debug, PartialEq)]
    enum ParentAction {
        Child(TestAction),
        Noop,
    }

    fn child_state(s: &mut ParentState) -> &mut TestState {
        &mut s.child
    }

    fn child_action(a: ParentAction) -> Option<TestAction> {
        match a {
            ParentAction::Child(inner) => Some(inner),
            ParentAction::Noop => None,
        }
    }

    #[test]
    fn test_scope_reducer_routes_only_child_actions() {
        let scoped = scope_reducer(CounterReducer, child_state, child_action, ParentAction::Child);

        let mut state = ParentState::default();
        let _ = scoped.reduce(&mut state, ParentAction::Child(TestAction::Increment), &());
        let _ = scoped.reduce(&mut state, ParentAction::Noop, &());

        assert_eq!(state.child.counter, 1);
        assert_eq!(state.untouched, 0);
    }

    #[tokio::test]
    async fn test_scope_reducer_lifts_effects() {
        let scoped = scope_reducer(NameReducer, child_state, child_action, ParentAction::Child);

        let mut state = ParentState::default();
        let mut effects = scoped.reduce(
            &mut state,
            ParentAction::Child(TestAction::SetName("Bob".to_string())),
            &(),
        );

        assert_eq!(state.child.name, "Bob");
        let Some(Effect::Future(fut)) = effects.pop() else {
            unreachable!("name reducer always emits a future");
        };
        assert_eq!(fut.await, Some(ParentAction::Child(TestAction::Increment)));
    }
}
