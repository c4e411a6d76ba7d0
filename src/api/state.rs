use std::sync::Arc;

use crate::config::AppConfig;
use crate::service::ReportService;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ReportService>,
    pub config: Arc<AppConfig>,
}
