use chrono::{Local, NaiveDate};

use crate::config::AppConfig;
use crate::notify::Outbox;
use crate::reservation::{EngineConfig, ReservationEngine};
use crate::schedule::{CadencePlan, ScheduleGenerator};
use crate::store::MemoryStore;

/// Shared application state handed to every request handler.
pub struct AppState {
    pub config: AppConfig,
    pub store: MemoryStore,
    pub outbox: Outbox,
    pub engine: ReservationEngine<MemoryStore, Outbox>,
    pub generator: ScheduleGenerator<MemoryStore>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let store = MemoryStore::new();
        let outbox = Outbox::new();
        let engine = ReservationEngine::new(
            store.clone(),
            outbox.clone(),
            EngineConfig {
                admin_email: config.admin_email.clone(),
                max_attempts: config.max_attempts,
            },
        );
        let generator = ScheduleGenerator::new(store.clone(), config.meeting_time);
        AppState {
            config,
            store,
            outbox,
            engine,
            generator,
        }
    }

    /// The configured cadence, used when a request does not override it.
    pub fn default_plan(&self) -> CadencePlan {
        CadencePlan {
            weekday: self.config.cadence_day,
            role_template: self.config.role_template.clone(),
            week_count: self.config.week_count,
        }
    }

    pub fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}
