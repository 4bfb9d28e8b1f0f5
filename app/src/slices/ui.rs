//! UI slice: theme, sidebar, global loading flag and toast notifications.

use std::marker::PhantomData;

use sugoi_client::{SugoiApi, ThemeMode};
use sugoi_core::effect::Effect;
use sugoi_core::reducer::Reducer;
use sugoi_core::SmallVec;

use crate::environment::AppEnvironment;
use crate::slices::{persist, restore};

/// Severity of a toast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotificationKind {
    /// Operation completed
    Success,
    /// Operation failed
    Error,
    /// Neutral information
    #[default]
    Info,
    /// Needs attention
    Warning,
}

/// Toast state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Notification {
    /// Visible
    pub open: bool,
    /// Text
    pub message: String,
    /// Severity
    pub kind: NotificationKind,
}

/// UI state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UiState {
    /// Colour scheme
    pub theme_mode: ThemeMode,
    /// Navigation drawer open
    pub sidebar_open: bool,
    /// Global loading overlay
    pub is_loading: bool,
    /// Current toast
    pub notification: Notification,
}

/// UI actions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiAction {
    /// Load the persisted theme
    RestoreTheme,
    /// Switch light/dark
    ToggleTheme,
    /// Set a theme explicitly
    SetTheme(ThemeMode),
    /// Open or close the sidebar
    ToggleSidebar,
    /// Set sidebar visibility
    SetSidebarOpen(bool),
    /// Set the global loading flag
    SetLoading(bool),
    /// Show a toast
    ShowNotification {
        /// Text
        message: String,
        /// Severity
        kind: NotificationKind,
    },
    /// Dismiss the toast, keeping its text
    HideNotification,
}

impl UiAction {
    /// Toast of the given kind
    #[must_use]
    pub fn notify(kind: NotificationKind, message: impl Into<String>) -> Self {
        Self::ShowNotification {
            message: message.into(),
            kind,
        }
    }
}

/// UI reducer
#[derive(Debug, Clone)]
pub struct UiReducer<Api> {
    _phantom: PhantomData<fn() -> Api>,
}

impl<Api> UiReducer<Api> {
    /// Create the reducer
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<Api> Default for UiReducer<Api> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Api: SugoiApi> Reducer for UiReducer<Api> {
    type State = UiState;
    type Action = UiAction;
    type Environment = AppEnvironment<Api>;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            UiAction::RestoreTheme => {
                state.theme_mode = restore("theme", env.session.theme()).unwrap_or_default();
            },
            UiAction::ToggleTheme => {
                state.theme_mode = state.theme_mode.toggled();
                persist("theme", env.session.set_theme(state.theme_mode));
            },
            UiAction::SetTheme(mode) => {
                state.theme_mode = mode;
                persist("theme", env.session.set_theme(mode));
            },
            UiAction::ToggleSidebar => state.sidebar_open = !state.sidebar_open,
            UiAction::SetSidebarOpen(open) => state.sidebar_open = open,
            UiAction::SetLoading(loading) => state.is_loading = loading,
            UiAction::ShowNotification { message, kind } => {
                state.notification = Notification {
                    open: true,
                    message,
                    kind,
                };
            },
            UiAction::HideNotification => state.notification.open = false,
        }
        SmallVec::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::slices::test_support::env;
    use sugoi_client::mocks::MockApi;
    use sugoi_testing::{assertions, ReducerTest};

    #[test]
    fn test_toggle_theme_persists() {
        let env = env();
        let session = env.session.clone();

        ReducerTest::new(UiReducer::<MockApi>::new())
            .with_env(env)
            .given_state(UiState::default())
            .when_action(UiAction::ToggleTheme)
            .then_state(|state| assert_eq!(state.theme_mode, ThemeMode::Dark))
            .then_effects(assertions::assert_no_effects)
            .run();

        assert_eq!(session.theme().unwrap(), Some(ThemeMode::Dark));
    }

    #[test]
    fn test_restore_theme_defaults_to_light() {
        let reducer = UiReducer::<MockApi>::new();
        let env = env();
        let mut state = UiState {
            theme_mode: ThemeMode::Dark,
            ..UiState::default()
        };

        let _ = reducer.reduce(&mut state, UiAction::RestoreTheme, &env);
        assert_eq!(state.theme_mode, ThemeMode::Light);

        env.session.set_theme(ThemeMode::Dark).unwrap();
        let _ = reducer.reduce(&mut state, UiAction::RestoreTheme, &env);
        assert_eq!(state.theme_mode, ThemeMode::Dark);
    }

    #[test]
    fn test_hide_notification_keeps_message() {
        let reducer = UiReducer::<MockApi>::new();
        let env = env();
        let mut state = UiState::default();

        let _ = reducer.reduce(
            &mut state,
            UiAction::notify(NotificationKind::Warning, "Check your inbox"),
            &env,
        );
        assert!(state.notification.open);
        assert_eq!(state.notification.kind, NotificationKind::Warning);

        let _ = reducer.reduce(&mut state, UiAction::HideNotification, &env);
        assert!(!state.notification.open);
        assert_eq!(state.notification.message, "Check your inbox");
    }

    #[test]
    fn test_sidebar() {
        let reducer = UiReducer::<MockApi>::new();
        let env = env();
        let mut state = UiState::default();

        let _ = reducer.reduce(&mut state, UiAction::ToggleSidebar, &env);
        assert!(state.sidebar_open);
        let _ = reducer.reduce(&mut state, UiAction::SetSidebarOpen(false), &env);
        assert!(!state.sidebar_open);
        let _ = reducer.reduce(&mut state, UiAction::SetLoading(true), &env);
        assert!(state.is_loading);
    }
}
