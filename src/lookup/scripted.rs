use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::oneshot;

use super::client::CalorieLookup;
use super::dto::{CalorieRequest, CalorieResult};
use crate::error::LookupError;

/// Lookup double that answers every dish with a fixed per-serving value or a
/// configured error, and counts calls.
pub struct ScriptedLookup {
    answer: Mutex<Result<f64, LookupError>>,
    delay: Mutex<Option<Duration>>,
    gate: Mutex<Option<oneshot::Receiver<()>>>,
    calls: AtomicUsize,
}

impl ScriptedLookup {
    pub fn answering(calories_per_serving: f64) -> Self {
        Self {
            answer: Mutex::new(Ok(calories_per_serving)),
            delay: Mutex::new(None),
            gate: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn fail_with(&self, err: LookupError) {
        *self.answer.lock().unwrap() = Err(err);
    }

    pub fn delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    /// Makes the next lookup wait until the returned sender fires or is dropped.
    pub fn hold(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.gate.lock().unwrap() = Some(rx);
        tx
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CalorieLookup for ScriptedLookup {
    async fn lookup(&self, request: &CalorieRequest) -> Result<CalorieResult, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.gate.lock().unwrap().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let per_serving = self.answer.lock().unwrap().clone()?;
        Ok(CalorieResult {
            dish_name: request.dish_name.clone(),
            servings: request.servings,
            calories_per_serving: per_serving,
            total_calories: per_serving * request.servings,
            source: "USDA FoodData Central".into(),
        })
    }
}
