use crate::config::AppConfig;
use crate::services::admin_gate::AdminGate;
use crate::services::leads::LeadPipeline;
use crate::services::reporting::Reporting;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub gate: AdminGate,
    pub leads: LeadPipeline,
    pub reporting: Reporting,
}

pub type SharedState = Arc<AppState>;
