/// Time source for services
///
/// Due-date checks, refresh-token expiry and upload timestamps read the
/// current time through [`mockable::Clock`] so tests can pin it.
/// Production wiring uses [`DefaultClock`].

use std::sync::Arc;

pub use mockable::{Clock, DefaultClock};

pub type SharedClock = Arc<dyn Clock + Send + Sync>;
