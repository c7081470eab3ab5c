use std::sync::Arc;

use aero_reservation::ReservationEngine;
use aero_store::app_config::DemoUser;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
    pub users: Vec<DemoUser>,
}

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ReservationEngine>,
    pub auth: AuthConfig,
}
