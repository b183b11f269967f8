use std::sync::Arc;

use log::Logger;
use time::{Date, OffsetDateTime};

use crate::db::Db;
use crate::engine::Caller;
use crate::policy::{Actor, AuthorizationPolicy, BookingRules};
use crate::urls::Urls;

/// Returns the current date. Swapped out in tests.
pub type Clock = dyn Fn() -> Date + Send + Sync;

#[derive(Clone)]
pub struct Environment {
    pub logger: Arc<Logger>,
    pub db: Arc<dyn Db>,
    pub urls: Arc<Urls>,
    pub config: Config,
    pub clock: Arc<Clock>,
}

impl Environment {
    pub fn new(logger: Arc<Logger>, db: Arc<dyn Db>, urls: Arc<Urls>, config: Config) -> Self {
        Self {
            logger,
            db,
            urls,
            config,
            clock: Arc::new(|| OffsetDateTime::now_utc().date()),
        }
    }

    pub fn with_clock(self, clock: Arc<Clock>) -> Self {
        Self { clock, ..self }
    }

    pub fn today(&self) -> Date {
        (self.clock)()
    }

    /// Bundles `actor` with the configured policy and rules.
    pub fn caller(&self, actor: Actor) -> Caller<'_> {
        Caller {
            actor,
            policy: &self.config.policy,
            rules: &self.config.rules,
            today: self.today(),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Config {
    pub(crate) policy: AuthorizationPolicy,
    pub(crate) rules: BookingRules,
}

impl Config {
    pub fn new(policy: AuthorizationPolicy, rules: BookingRules) -> Self {
        Self { policy, rules }
    }
}
