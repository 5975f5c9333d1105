use tracing::{debug, warn};

use crate::models::{AppointmentError, AppointmentStatus, ParticipantRole};

/// The appointment status state machine and its per-role authorization
/// matrix:
///
/// ```text
/// pending   -> confirmed   (doctor of record)
/// pending   -> cancelled   (either participant)
/// confirmed -> completed   (doctor of record)
/// confirmed -> cancelled   (either participant)
/// cancelled, completed     terminal
/// ```
///
/// Confirmation and completion attest to the provider's schedule and to the
/// visit having taken place, so they belong to the doctor; cancellation is
/// mutual. Nothing ever returns to `pending`.
pub struct AppointmentLifecycleService;

impl AppointmentLifecycleService {
    pub fn new() -> Self {
        Self
    }

    /// All statuses reachable from `current`.
    pub fn valid_transitions(&self, current: &AppointmentStatus) -> Vec<AppointmentStatus> {
        match current {
            AppointmentStatus::Pending => {
                vec![AppointmentStatus::Confirmed, AppointmentStatus::Cancelled]
            }
            AppointmentStatus::Confirmed => {
                vec![AppointmentStatus::Completed, AppointmentStatus::Cancelled]
            }
            AppointmentStatus::Cancelled | AppointmentStatus::Completed => vec![],
        }
    }

    /// Validate that a transition is legal from the current status.
    pub fn validate_transition(
        &self,
        current: &AppointmentStatus,
        new: &AppointmentStatus,
    ) -> Result<(), AppointmentError> {
        debug!("Validating status transition {} -> {}", current, new);

        if !self.valid_transitions(current).contains(new) {
            warn!("Invalid status transition attempted: {} -> {}", current, new);
            return Err(AppointmentError::InvalidTransition {
                from: *current,
                to: *new,
            });
        }

        Ok(())
    }

    /// Check that the acting participant may drive this transition.
    pub fn authorize_transition(
        &self,
        actor: ParticipantRole,
        new: &AppointmentStatus,
    ) -> Result<(), AppointmentError> {
        let allowed = match new {
            AppointmentStatus::Confirmed | AppointmentStatus::Completed => {
                actor == ParticipantRole::Doctor
            }
            AppointmentStatus::Cancelled => true,
            AppointmentStatus::Pending => false,
        };

        if !allowed {
            warn!("Participant {} may not set status to {}", actor, new);
            return Err(AppointmentError::TransitionNotAllowed { actor, to: *new });
        }

        Ok(())
    }

    /// Full check applied before any status mutation: legality from the
    /// current state first, then the actor's permission.
    pub fn validate(
        &self,
        actor: ParticipantRole,
        current: &AppointmentStatus,
        new: &AppointmentStatus,
    ) -> Result<(), AppointmentError> {
        self.validate_transition(current, new)?;
        self.authorize_transition(actor, new)
    }
}

impl Default for AppointmentLifecycleService {
    fn default() -> Self {
        Self::new()
    }
}
