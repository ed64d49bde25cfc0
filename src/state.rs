//! Onboarding progress as a value plus the one transition function that
//! changes it.
//!
//! Every mutation of [`OnboardingState`] goes through [`reduce`] (or its
//! in-place twin [`OnboardingState::apply`]). The function is pure: network
//! calls, storage and clocks live in the controller, which feeds their
//! outcomes back in as [`Action`]s.

use crate::error::OnboardingError;
use crate::model::{
    MenuSetupPatch, OnboardingData, RestaurantInfoPatch, SessionId, Step, ThemePatch,
};
use time::OffsetDateTime;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OnboardingState {
    pub session_id: Option<SessionId>,
    pub current_step: Step,
    /// Steps passed through, in first-visit order, without duplicates.
    pub completed_steps: Vec<Step>,
    pub data: OnboardingData,
    pub is_loading: bool,
    pub error: Option<OnboardingError>,
    /// Time of the last successful server round trip.
    pub last_synced_at: Option<OffsetDateTime>,
}

impl OnboardingState {
    /// Ordinal of `current_step`; never stored separately so the two cannot
    /// disagree.
    pub fn current_step_index(&self) -> usize {
        self.current_step.index()
    }

    pub fn is_step_completed(&self, step: Step) -> bool {
        self.completed_steps.contains(&step)
    }

    /// Fraction of the wizard completed, in `0.0..=1.0`.
    pub fn progress(&self) -> f32 {
        self.completed_steps.len() as f32 / Step::ALL.len() as f32
    }

    pub fn has_session(&self) -> bool {
        self.session_id.is_some()
    }

    pub fn apply(&mut self, action: Action) {
        match action {
            Action::SetLoading(loading) => {
                self.is_loading = loading;
                if loading {
                    self.error = None;
                }
            }
            Action::SetError(error) => {
                self.error = error;
                self.is_loading = false;
            }
            Action::SetSession {
                session_id,
                current_step,
                completed_steps,
                data,
            } => {
                self.session_id = Some(session_id);
                self.current_step = current_step;
                self.completed_steps.clear();
                for step in completed_steps {
                    push_unique(&mut self.completed_steps, step);
                }
                self.data = data;
                self.is_loading = false;
                self.error = None;
            }
            Action::UpdateRestaurantInfo(patch) => self.data.restaurant_info.merge(patch),
            Action::UpdateMenuSetup(patch) => self.data.menu_setup.merge(patch),
            Action::UpdateTheme(patch) => self.data.theme_settings.merge(patch),
            Action::NextStep { from, session_id } => {
                if self.session_id.as_ref() != Some(&session_id) {
                    return;
                }
                self.is_loading = false;
                if self.current_step != from {
                    return;
                }
                push_unique(&mut self.completed_steps, from);
                self.current_step = from.next();
            }
            Action::PrevStep => {
                self.current_step = self.current_step.prev();
            }
            Action::GoToStep(step) => {
                if self.completed_steps.contains(&step) {
                    self.current_step = step;
                }
            }
            Action::MarkSynced(at) => self.last_synced_at = Some(at),
            Action::Reset => *self = OnboardingState::default(),
        }
    }
}

/// The closed set of state transitions.
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    /// `true` also clears the previous error: a new attempt is starting.
    SetLoading(bool),
    /// Records (or clears) the error and ends loading.
    SetError(Option<OnboardingError>),
    /// Seeds the state from a start or status response.
    SetSession {
        session_id: SessionId,
        current_step: Step,
        completed_steps: Vec<Step>,
        data: OnboardingData,
    },
    UpdateRestaurantInfo(RestaurantInfoPatch),
    UpdateMenuSetup(MenuSetupPatch),
    UpdateTheme(ThemePatch),
    /// Marks `from` completed and advances past it, clamped at the last step.
    ///
    /// Dropped when `session_id` is no longer the active session. When the
    /// wizard has meanwhile moved off `from`, only loading ends.
    NextStep { from: Step, session_id: SessionId },
    /// Steps back, clamped at the first step; `completed_steps` is untouched.
    PrevStep,
    /// Jumps to a completed step; anything else is ignored.
    GoToStep(Step),
    MarkSynced(OffsetDateTime),
    Reset,
}

/// Pure transition: returns the state after `action`.
pub fn reduce(mut state: OnboardingState, action: Action) -> OnboardingState {
    state.apply(action);
    state
}

fn push_unique(steps: &mut Vec<Step>, step: Step) {
    if !steps.contains(&step) {
        steps.push(step);
    }
}
