use serde::Serialize;
use tracing::{debug, info, warn};

use super::validation::{validate, FieldErrors, MealForm};
use crate::error::{LookupError, WorkflowError};
use crate::lookup::{CalorieRequest, CalorieResult};
use crate::meals::store::MealStore;
use crate::meals::types::{total_for, totals_agree, Category, NewMeal, TrackingMeal};

pub const RETRY_MESSAGE: &str = "Failed to add meal. Please try again.";
const TIMEOUT_MESSAGE: &str = "Calorie lookup timed out. Please try again.";
const SESSION_MESSAGE: &str = "Your session has expired. Please sign in again.";

/// Identifies one lookup. A result carrying an older ticket is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

/// A looked-up meal awaiting the user's decision. Never persisted.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PendingConfirmation {
    pub dish_name: String,
    pub servings: f64,
    pub calories_per_serving: f64,
    pub total_calories: f64,
    pub source: String,
    pub category: Category,
}

impl PendingConfirmation {
    fn from_lookup(result: CalorieResult, servings: f64, category: Category) -> Self {
        if result.servings != servings {
            warn!(requested = servings, returned = result.servings, "servings echoed differently");
        }
        if !totals_agree(result.total_calories, servings, result.calories_per_serving) {
            warn!(
                reported = result.total_calories,
                "nutrition service total disagrees; using servings x calories per serving"
            );
        }
        Self {
            total_calories: total_for(servings, result.calories_per_serving),
            dish_name: result.dish_name,
            servings,
            calories_per_serving: result.calories_per_serving,
            source: result.source,
            category,
        }
    }

    fn to_new_meal(&self) -> NewMeal {
        NewMeal {
            dish_name: self.dish_name.clone(),
            servings: self.servings,
            calories_per_serving: self.calories_per_serving,
            total_calories: self.total_calories,
            source: self.source.clone(),
            category: self.category,
            is_search_result: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    Idle,
    LookingUp {
        ticket: Ticket,
        servings: f64,
        category: Category,
    },
    Confirming(PendingConfirmation),
}

/// Result of submitting the form.
#[derive(Debug, Clone, PartialEq)]
pub enum Submitted {
    /// Validation passed; run the lookup and hand the outcome to `resolve`.
    Started {
        ticket: Ticket,
        request: CalorieRequest,
    },
    /// Validation failed; the lookup must not run.
    Invalid(FieldErrors),
}

/// What became of a finished lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Pending(PendingConfirmation),
    Failed(FieldErrors),
    /// The form was dismissed or resubmitted while the lookup ran.
    Discarded,
}

/// State of one add-meal form: validate, look up, confirm, commit.
#[derive(Debug)]
pub struct LookupWorkflow {
    phase: Phase,
    errors: FieldErrors,
    next_ticket: u64,
}

impl Default for LookupWorkflow {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            errors: FieldErrors::default(),
            next_ticket: 1,
        }
    }
}

impl LookupWorkflow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn pending(&self) -> Option<&PendingConfirmation> {
        match &self.phase {
            Phase::Confirming(p) => Some(p),
            _ => None,
        }
    }

    pub fn submit(&mut self, form: &MealForm) -> Result<Submitted, WorkflowError> {
        match self.phase {
            Phase::LookingUp { .. } => return Err(WorkflowError::Busy),
            Phase::Confirming(_) => return Err(WorkflowError::AwaitingConfirmation),
            Phase::Idle => {}
        }

        let valid = match validate(form) {
            Ok(v) => v,
            Err(errors) => {
                debug!(?errors, "meal form rejected");
                self.errors = errors.clone();
                return Ok(Submitted::Invalid(errors));
            }
        };

        let ticket = Ticket(self.next_ticket);
        self.next_ticket += 1;
        self.errors = FieldErrors::default();
        self.phase = Phase::LookingUp {
            ticket,
            servings: valid.servings,
            category: valid.category,
        };
        debug!(ticket = ticket.0, dish = %valid.dish_name, "lookup started");

        Ok(Submitted::Started {
            ticket,
            request: CalorieRequest {
                dish_name: valid.dish_name,
                servings: valid.servings,
            },
        })
    }

    pub fn resolve(
        &mut self,
        ticket: Ticket,
        outcome: Result<CalorieResult, LookupError>,
    ) -> Resolution {
        let (servings, category) = match self.phase {
            Phase::LookingUp {
                ticket: current,
                servings,
                category,
            } if current == ticket => (servings, category),
            _ => {
                debug!(ticket = ticket.0, "stale lookup result discarded");
                return Resolution::Discarded;
            }
        };

        match outcome {
            Ok(result) => {
                let pending = PendingConfirmation::from_lookup(result, servings, category);
                info!(dish = %pending.dish_name, total = pending.total_calories, "awaiting confirmation");
                self.phase = Phase::Confirming(pending.clone());
                Resolution::Pending(pending)
            }
            Err(e) => {
                warn!(error = %e, "calorie lookup failed");
                let errors = match &e {
                    LookupError::NotFound { message } => FieldErrors::on_dish_name(message.clone()),
                    LookupError::Timeout { .. } => FieldErrors::on_root(TIMEOUT_MESSAGE),
                    LookupError::Unauthorized { .. } => FieldErrors::on_root(SESSION_MESSAGE),
                    LookupError::Transport { .. } => FieldErrors::on_root(RETRY_MESSAGE),
                };
                self.phase = Phase::Idle;
                self.errors = errors.clone();
                Resolution::Failed(errors)
            }
        }
    }

    /// Commits the pending meal. On failure the pending meal is kept for a retry.
    pub fn confirm(&mut self, store: &mut MealStore) -> Result<TrackingMeal, WorkflowError> {
        let pending = self.pending().ok_or(WorkflowError::NothingPending)?;
        match store.add(pending.to_new_meal()) {
            Ok(meal) => {
                self.phase = Phase::Idle;
                self.errors = FieldErrors::default();
                Ok(meal)
            }
            Err(e) => {
                self.errors = FieldErrors::on_root(RETRY_MESSAGE);
                Err(e.into())
            }
        }
    }

    /// Drops the pending meal without touching the store.
    pub fn cancel(&mut self) -> Result<(), WorkflowError> {
        match self.phase {
            Phase::Confirming(_) => {
                self.phase = Phase::Idle;
                self.errors = FieldErrors::default();
                Ok(())
            }
            _ => Err(WorkflowError::NothingPending),
        }
    }

    /// Closes the form. Any lookup still running will be discarded on arrival.
    pub fn dismiss(&mut self) {
        if matches!(self.phase, Phase::LookingUp { .. }) {
            debug!("form dismissed during lookup");
        }
        self.phase = Phase::Idle;
        self.errors = FieldErrors::default();
    }
}
