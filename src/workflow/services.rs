use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tracing::{error, info, instrument};

use super::machine::{LookupWorkflow, Resolution, Submitted, Ticket};
use super::validation::MealForm;
use crate::error::{LookupError, WorkflowError};
use crate::lookup::{CalorieLookup, CalorieRequest};
use crate::meals::{services::persist_meals, store::MealStore, types::TrackingMeal};
use crate::state::AppState;

/// Runs one submission: validate, look up with a deadline, stage the result.
///
/// The workflow lock is not held while the lookup is in flight, so the form
/// can be dismissed meanwhile; the late result is then discarded. The lookup
/// and its resolution run in their own task, so the form leaves `LookingUp`
/// even if the caller is dropped mid-lookup.
pub async fn run_lookup(
    form: Arc<Mutex<LookupWorkflow>>,
    lookup: Arc<dyn CalorieLookup>,
    timeout: Duration,
    input: &MealForm,
) -> Result<(Resolution, Option<LookupError>), WorkflowError> {
    let submitted = form.lock().await.submit(input)?;
    let (ticket, request) = match submitted {
        Submitted::Started { ticket, request } => (ticket, request),
        Submitted::Invalid(errors) => return Ok((Resolution::Failed(errors), None)),
    };

    let task = tokio::spawn(finish_lookup(form.clone(), lookup, timeout, ticket, request));
    match task.await {
        Ok(done) => Ok(done),
        Err(e) => {
            error!(error = %e, "lookup task failed");
            let failure = LookupError::transport("lookup task failed");
            let resolution = form.lock().await.resolve(ticket, Err(failure.clone()));
            Ok((resolution, Some(failure)))
        }
    }
}

async fn finish_lookup(
    form: Arc<Mutex<LookupWorkflow>>,
    lookup: Arc<dyn CalorieLookup>,
    timeout: Duration,
    ticket: Ticket,
    request: CalorieRequest,
) -> (Resolution, Option<LookupError>) {
    let outcome = match tokio::time::timeout(timeout, lookup.lookup(&request)).await {
        Ok(outcome) => outcome,
        Err(_) => Err(LookupError::Timeout {
            seconds: timeout.as_secs(),
        }),
    };
    let failure = outcome.as_ref().err().cloned();

    let resolution = form.lock().await.resolve(ticket, outcome);
    (resolution, failure)
}

#[instrument(skip(state, input), fields(dish = %input.dish_name))]
pub async fn lookup_meal(state: &AppState, input: &MealForm) -> Result<Resolution, WorkflowError> {
    let (resolution, failure) = run_lookup(
        state.form.clone(),
        state.lookup.clone(),
        state.config.lookup_timeout,
        input,
    )
    .await?;

    if let Some(LookupError::Unauthorized { .. }) = failure {
        info!("signing out after rejected lookup");
        state.session.sign_out().await;
    }
    Ok(resolution)
}

pub async fn confirm_pending(
    form: &Mutex<LookupWorkflow>,
    meals: &RwLock<MealStore>,
) -> Result<TrackingMeal, WorkflowError> {
    let mut form = form.lock().await;
    let mut store = meals.write().await;
    form.confirm(&mut store)
}

#[instrument(skip(state))]
pub async fn confirm_meal(state: &AppState) -> Result<TrackingMeal, WorkflowError> {
    let meal = confirm_pending(&state.form, &state.meals).await?;
    persist_meals(state).await;
    Ok(meal)
}
