use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use hourglass_rs::SafeTimeProvider;
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::errors::Result;
use crate::events::EventStore;
use crate::notify::{
    NotificationLogStore, NotificationScheduler, Notifier, PaymentTransitionWatcher, TickSummary,
    WatcherSummary,
};
use crate::obligation::ObligationSource;

/// combined outcome of one engine tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EngineTickReport {
    pub notifications: TickSummary,
    pub transitions: WatcherSummary,
}

/// the payment lifecycle engine: reminder/dunning scheduling plus paid
/// transition watching on one cadence
///
/// Single process, single instance. Running two instances against the same
/// obligation store will duplicate notifications; no distributed lock is
/// provided.
pub struct PaymentEngine {
    config: EngineConfig,
    scheduler: NotificationScheduler,
    watcher: PaymentTransitionWatcher,
    pub events: EventStore,
}

impl PaymentEngine {
    pub fn new(config: EngineConfig) -> Self {
        let scheduler = NotificationScheduler::new(&config);
        Self {
            config,
            scheduler,
            watcher: PaymentTransitionWatcher::new(),
            events: EventStore::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// run scheduler and watcher once against the current obligation set
    pub fn tick_once<S, N, L>(
        &mut self,
        source: &S,
        notifier: &N,
        log: &mut L,
        time: &SafeTimeProvider,
    ) -> Result<EngineTickReport>
    where
        S: ObligationSource,
        N: Notifier,
        L: NotificationLogStore,
    {
        let notifications = self
            .scheduler
            .tick(source, notifier, log, &mut self.events, time)?;
        let transitions = self
            .watcher
            .tick(source, notifier, log, &mut self.events, time)?;
        Ok(EngineTickReport {
            notifications,
            transitions,
        })
    }

    /// tick on the configured interval until `stop` is raised
    ///
    /// A raised stop flag takes effect between ticks; the running tick always
    /// finishes. When the engine is disabled this returns immediately.
    pub fn run_blocking<S, N, L>(
        &mut self,
        source: &S,
        notifier: &N,
        log: &mut L,
        time: &SafeTimeProvider,
        stop: &AtomicBool,
    ) -> Result<()>
    where
        S: ObligationSource,
        N: Notifier,
        L: NotificationLogStore,
    {
        if !self.config.enabled {
            info!("payment engine disabled, not ticking");
            return Ok(());
        }

        let interval = self.config.tick_interval();
        info!(interval_seconds = self.config.tick_interval_seconds, "payment engine started");

        'ticking: while !stop.load(Ordering::Relaxed) {
            // a failing tick (e.g. the obligation store is down) must not
            // stop the cadence
            if let Err(e) = self.tick_once(source, notifier, log, time) {
                warn!(error = %e, "engine tick failed");
            }

            let mut slept = Duration::ZERO;
            while slept < interval {
                if stop.load(Ordering::Relaxed) {
                    break 'ticking;
                }
                let step = Duration::from_millis(250).min(interval - slept);
                thread::sleep(step);
                slept += step;
            }
        }

        info!("payment engine stopped");
        Ok(())
    }
}
