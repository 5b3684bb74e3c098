use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use crate::auth::{AuthClient, SessionHandle};
use crate::clock::{Clock, SystemClock};
use crate::config::AppConfig;
use crate::lookup::{AuthHeaders, CalorieLookup, HttpCalorieClient};
use crate::meals::store::MealStore;
use crate::meals::types::MealSnapshot;
use crate::storage::{load_slot, FileSlotStorage, SlotStorage, MEAL_SLOT};
use crate::workflow::machine::LookupWorkflow;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub meals: Arc<RwLock<MealStore>>,
    pub form: Arc<Mutex<LookupWorkflow>>,
    pub lookup: Arc<dyn CalorieLookup>,
    pub session: SessionHandle,
    pub auth: Arc<AuthClient>,
    pub slots: Arc<dyn SlotStorage>,
}

impl AppState {
    pub async fn init(config: AppConfig, clock: SystemClock) -> anyhow::Result<Self> {
        let config = Arc::new(config);
        let slots = Arc::new(FileSlotStorage::new(&config.data_dir).await?) as Arc<dyn SlotStorage>;
        let clock = Arc::new(clock) as Arc<dyn Clock>;

        let snapshot: MealSnapshot = load_slot(slots.as_ref(), MEAL_SLOT).await.unwrap_or_default();
        let session = SessionHandle::load(slots.clone()).await;
        session.check_auth().await;

        let lookup = Arc::new(HttpCalorieClient::new(
            &config.lookup_url,
            config.lookup_timeout,
            Arc::new(session.clone()) as Arc<dyn AuthHeaders>,
        )?) as Arc<dyn CalorieLookup>;
        let auth = Arc::new(AuthClient::new(&config.auth_url, config.lookup_timeout)?);

        Ok(Self::from_parts(
            config,
            MealStore::restore(snapshot, clock),
            lookup,
            session,
            auth,
            slots,
        ))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        store: MealStore,
        lookup: Arc<dyn CalorieLookup>,
        session: SessionHandle,
        auth: Arc<AuthClient>,
        slots: Arc<dyn SlotStorage>,
    ) -> Self {
        Self {
            config,
            meals: Arc::new(RwLock::new(store)),
            form: Arc::new(Mutex::new(LookupWorkflow::new())),
            lookup,
            session,
            auth,
            slots,
        }
    }

    /// State backed by in-memory slots, a scripted lookup answering 350 kcal
    /// per serving, and a clock fixed at 2024-06-10 12:00 UTC.
    #[cfg(test)]
    pub fn fake() -> (Self, Arc<crate::lookup::scripted::ScriptedLookup>) {
        use crate::clock::FixedClock;
        use crate::lookup::scripted::ScriptedLookup;
        use crate::storage::MemorySlotStorage;

        let slots = Arc::new(MemorySlotStorage::default()) as Arc<dyn SlotStorage>;
        let session = SessionHandle::signed_out(slots.clone());
        let lookup = Arc::new(ScriptedLookup::answering(350.0));
        let clock = Arc::new(FixedClock::new(time::macros::datetime!(2024-06-10 12:00 UTC)));
        let auth = Arc::new(
            AuthClient::new("http://127.0.0.1:9", std::time::Duration::from_secs(1))
                .expect("auth client"),
        );

        let state = Self::from_parts(
            Arc::new(AppConfig::default()),
            MealStore::new(clock),
            lookup.clone(),
            session,
            auth,
            slots,
        );
        (state, lookup)
    }
}
