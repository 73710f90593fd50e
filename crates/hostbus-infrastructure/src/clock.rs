//! System clock and identifier providers

use chrono::{DateTime, Utc};
use hostbus_application::ports::{Clock, GuidProvider};
use uuid::Uuid;

/// Wall clock backed by the system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Random (v4) identifier provider
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomGuidProvider;

impl GuidProvider for RandomGuidProvider {
    fn new_guid(&self) -> Uuid {
        Uuid::new_v4()
    }
}
