//! # Sugoi Testing
//!
//! Testing utilities and helpers for the Sugoi client state layer.
//!
//! This crate provides:
//! - Deterministic clocks (`FixedClock`, `ManualClock`)
//! - A Given-When-Then harness for reducers
//! - Helpers that execute effects inline, without a Store
//!
//! ## Example
//!
//! ```ignore
//! use sugoi_testing::{ManualClock, helpers::run_effects};
//!
//! #[tokio::test]
//! async fn cooldown_expires() {
//!     let clock = ManualClock::starting_at_test_epoch();
//!     let env = test_environment(clock.clone());
//!     let mut state = VerificationState::default();
//!
//!     let effects = VerificationReducer.reduce(&mut state, VerificationAction::Resend, &env);
//!     let actions = run_effects(effects).await;
//!
//!     clock.advance(chrono::Duration::seconds(60));
//!     // ...
//! }
//! ```

use chrono::{DateTime, Utc};
use sugoi_core::environment::Clock;


pub use reducer_test::{assertions, ReducerTest};

/// Mock implementations of Environment traits
pub mod mocks {
    use std::sync::{Arc, Mutex, PoisonError};

    use super::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use sugoi_testing::mocks::FixedClock;
    /// use sugoi_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Clock that only moves when a test advances it
    ///
    /// Clones share the same underlying time, so a clone can be handed to the
    /// environment while the test keeps one to drive countdowns.
    #[derive(Debug, Clone)]
    pub struct ManualClock {
        time: Arc<Mutex<DateTime<Utc>>>,
    }

    impl ManualClock {
        /// Create a manual clock at `time`
        #[must_use]
        pub fn new(time: DateTime<Utc>) -> Self {
            Self {
                time: Arc::new(Mutex::new(time)),
            }
        }

        /// Create a manual clock at the same instant as [`test_clock`]
        #[must_use]
        pub fn starting_at_test_epoch() -> Self {
            Self::new(test_epoch())
        }

        /// Move the clock forward by `by`
        pub fn advance(&self, by: chrono::Duration) {
            let mut time = self.time.lock().unwrap_or_else(PoisonError::into_inner);
            *time += by;
        }

        /// Jump to an absolute instant
        pub fn set(&self, to: DateTime<Utc>) {
            *self.time.lock().unwrap_or_else(PoisonError::into_inner) = to;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.time.lock().unwrap_or_else(PoisonError::into_inner)
        }
    }

    /// 2025-01-01 00:00:00 UTC
    #[must_use]
    pub fn test_epoch() -> DateTime<Utc> {
        DateTime::from_timestamp(1_735_689_600, 0).unwrap_or_default()
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(test_epoch())
    }
}

/// Test helpers and utilities
pub mod helpers {
    use std::collections::VecDeque;

    use sugoi_core::effect::Effect;

    /// Execute effects inline and collect the actions they produce
    ///
    /// `Future` effects are awaited in order. `Delay` effects yield their
    /// action immediately without sleeping. Nested `Parallel`/`Sequential`
    /// effects are flattened depth-first.
    pub async fn run_effects<A, I>(effects: I) -> Vec<A>
    where
        I: IntoIterator<Item = Effect<A>>,
    {
        let mut queue: VecDeque<Effect<A>> = effects.into_iter().collect();
        let mut actions = Vec::new();

        while let Some(effect) = queue.pop_front() {
            match effect {
                Effect::None => {},
                Effect::Future(fut) => {
                    if let Some(action) = fut.await {
                        actions.push(action);
                    }
                },
                Effect::Delay { action, .. } => actions.push(*action),
                Effect::Parallel(inner) | Effect::Sequential(inner) => {
                    for effect in inner.into_iter().rev() {
                        queue.push_front(effect);
                    }
                },
            }
        }

        actions
    }
}

// Re-export commonly used items
pub use mocks::{test_clock, test_epoch, FixedClock, ManualClock};

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use sugoi_core::effect::Effect;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        let time1 = clock.now();
        let time2 = clock.now();
        assert_eq!(time1, time2);
        assert_eq!(time1.timestamp(), 1_735_689_600);
    }

    #[test]
    fn test_manual_clock_shared_between_clones() {
        let clock = ManualClock::starting_at_test_epoch();
        let env_clock = clock.clone();

        clock.advance(chrono::Duration::seconds(90));

        assert_eq!(env_clock.now() - test_epoch(), chrono::Duration::seconds(90));
    }

    #[tokio::test]
    async fn test_run_effects_flattens_in_order() {
        let effects = vec![
            Effect::send(1),
            Effect::merge(vec![
                Effect::None,
                Effect::chain(vec![Effect::send(2), Effect::delay(Duration::from_secs(60), 3)]),
            ]),
            Effect::future(async { None }),
            Effect::send(4),
        ];

        assert_eq!(helpers::run_effects(effects).await, vec![1, 2, 3, 4]);
    }
}
