use roadlenscore::feed::{normalize_lookout, AppMetadata};
use roadlenscore::LookoutAction;
use std::sync::{PoisonError, RwLock};

/// Result of one lookout request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookoutOutcome {
    Added,
    AlreadyPresent,
    Removed,
    NotFound,
}

impl LookoutOutcome {
    /// Whether the lists changed and clients need a fresh `server:app-data`.
    pub fn changed(self) -> bool {
        matches!(self, LookoutOutcome::Added | LookoutOutcome::Removed)
    }

    pub fn message(self, action: LookoutAction) -> String {
        let subject = if action.is_vehicle() { "Vehicle" } else { "Person" };
        match self {
            LookoutOutcome::Added => format!("{} added successfully", subject),
            LookoutOutcome::AlreadyPresent => format!("{} already on lookout", subject),
            LookoutOutcome::Removed => format!("{} removed successfully", subject),
            LookoutOutcome::NotFound => format!("{} not found", subject),
        }
    }
}

/// Lookout lists and person registry served as `server:app-data`.
#[derive(Debug, Default)]
pub struct LookoutRegistry {
    state: RwLock<AppMetadata>,
}

impl LookoutRegistry {
    pub fn new(initial: AppMetadata) -> Self {
        Self {
            state: RwLock::new(initial),
        }
    }

    pub fn snapshot(&self) -> AppMetadata {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Applies an add or remove. Entries are compared in their normalized
    /// (trimmed, upper-cased) form.
    pub fn apply(&self, action: LookoutAction, value: &str) -> LookoutOutcome {
        let entry = normalize_lookout(value);
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let list = if action.is_vehicle() {
            &mut guard.lookout_vehicles
        } else {
            &mut guard.lookout_persons
        };
        let position = list.iter().position(|existing| *existing == entry);

        match (action.is_addition(), position) {
            (true, Some(_)) => LookoutOutcome::AlreadyPresent,
            (true, None) => {
                list.push(entry);
                LookoutOutcome::Added
            }
            (false, Some(index)) => {
                list.remove(index);
                LookoutOutcome::Removed
            }
            (false, None) => LookoutOutcome::NotFound,
        }
    }
}
