// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The scheduler control loop.
//!
//! Owns the catalog watcher and the set of live jobs. Catalog events
//! and trigger firings arrive as messages and are applied serially on
//! the control loop; the timer wheel is drained on a ~1s tick.

use crate::job::{Job, TriggerContext};
use crate::timer::TimerWheel;
use parking_lot::Mutex;
use seguro_common::store;
use seguro_compose::Composer;
use seguro_core::{slugify, Clock, EventKind, EventSet, JobSpec};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Catalog prefix holding one YAML document per job.
pub const JOB_PREFIX: &str = "config/jobs/";

/// Messages applied serially on the scheduler's control loop.
pub enum SchedulerMsg {
    Catalog { event: EventKind, key: String },
    Trigger { job: String, context: TriggerContext },
}

pub struct Scheduler<C: Clock> {
    store: store::Client,
    composer: Composer,
    wheel: Arc<Mutex<TimerWheel>>,
    jobs: HashMap<String, Job>,
    clock: C,
    tx: mpsc::UnboundedSender<SchedulerMsg>,
    rx: Option<mpsc::UnboundedReceiver<SchedulerMsg>>,
    catalog_watcher: store::Watcher,
}

impl<C: Clock> Scheduler<C> {
    /// Start watching the job catalog. Existing catalog entries are
    /// replayed as created events, so the job set is rebuilt from the
    /// store on startup.
    pub fn new(store: store::Client, composer: Composer, clock: C) -> Scheduler<C> {
        tracing::info!("scheduler starting");

        let (tx, rx) = mpsc::unbounded_channel();
        let catalog_tx = tx.clone();
        let catalog_watcher = store.watch_async(
            JOB_PREFIX,
            move |event, key| {
                let _ = catalog_tx.send(SchedulerMsg::Catalog { event, key });
            },
            EventSet::ALL,
            true,
        );

        Scheduler {
            store,
            composer,
            wheel: Arc::new(Mutex::new(TimerWheel::new())),
            jobs: HashMap::new(),
            clock,
            tx,
            rx: Some(rx),
            catalog_watcher,
        }
    }

    /// Run until `shutdown` is cancelled, then tear down.
    pub async fn run(&mut self, shutdown: CancellationToken) {
        let Some(mut rx) = self.rx.take() else {
            return;
        };
        let mut tick = tokio::time::interval(Duration::from_secs(1));
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                Some(msg) = rx.recv() => self.handle_msg(msg).await,
                _ = tick.tick() => self.run_pending().await,
            }
        }

        self.shutdown().await;
    }

    async fn handle_msg(&mut self, msg: SchedulerMsg) {
        match msg {
            SchedulerMsg::Catalog { event, key } => self.on_catalog_event(event, key).await,
            SchedulerMsg::Trigger { job, context } => {
                let now = self.clock.now_utc();
                match self.jobs.get(&job) {
                    Some(instance) => {
                        if let Err(e) = instance.start(&self.composer, Some(&context), now).await {
                            tracing::error!(job = %job, error = %e, "job launch failed");
                        }
                    }
                    None => tracing::debug!(job = %job, "dropping trigger for unknown job"),
                }
            }
        }
    }

    async fn on_catalog_event(&mut self, event: EventKind, key: String) {
        let Some(name) = job_name_for_key(&key) else {
            tracing::warn!(object = %key, "ignoring unsupported job file");
            return;
        };

        match event {
            EventKind::Created => self.on_job_created(name, &key).await,
            EventKind::Removed => self.on_job_removed(&name).await,
        }
    }

    async fn on_job_created(&mut self, name: String, key: &str) {
        let contents = match self.store.get_object(key).await {
            Ok(contents) => contents,
            Err(e) => {
                tracing::error!(object = %key, error = %e, "failed to fetch job description");
                return;
            }
        };
        let spec: JobSpec = match serde_yaml::from_slice(&contents) {
            Ok(spec) => spec,
            Err(e) => {
                tracing::error!(object = %key, error = %e, "failed to parse job description");
                return;
            }
        };

        // Re-creating a job with the same name stops the previous
        // instance first.
        if let Some(mut previous) = self.jobs.remove(&name) {
            if let Err(e) = previous.stop(&self.wheel, &self.composer, false).await {
                tracing::warn!(job = %name, error = %e, "failed to stop replaced job");
            }
        }

        let now = self.clock.now_utc();
        let job = match Job::bind(&name, spec, &self.store, &self.wheel, &self.tx, now) {
            Ok(job) => job,
            Err(e) => {
                tracing::error!(job = %name, error = %e, "failed to set up job");
                return;
            }
        };
        self.composer.register_service(&name, job.container_spec().clone());
        tracing::info!(job = %name, "added new job");

        if job.has_startup() {
            if let Err(e) = job.start(&self.composer, None, now).await {
                tracing::error!(job = %name, error = %e, "startup launch failed");
            }
        }
        self.jobs.insert(name, job);
    }

    async fn on_job_removed(&mut self, name: &str) {
        match self.jobs.remove(name) {
            Some(mut job) => {
                if let Err(e) = job.stop(&self.wheel, &self.composer, false).await {
                    tracing::warn!(job = %name, error = %e, "failed to stop removed job");
                }
                self.composer.deregister_service(name);
                tracing::info!(job = %name, "removed job");
            }
            None => tracing::warn!(job = %name, "attempted to remove unknown job"),
        }
    }

    /// Drain due timer entries and launch the tagged jobs.
    async fn run_pending(&mut self) {
        let now = self.clock.now_utc();
        let fired = self.wheel.lock().fired(now);
        for firing in fired {
            let Some(job) = self.jobs.get(&firing.tag) else {
                continue;
            };
            let context =
                TriggerContext { trigger_id: firing.trigger_id, event: None, object: None };
            if let Err(e) = job.start(&self.composer, Some(&context), now).await {
                tracing::error!(job = %firing.tag, error = %e, "scheduled launch failed");
            }
        }
    }

    /// Fire shutdown triggers, stop every job (containers stay up),
    /// then stop the catalog watcher.
    async fn shutdown(&mut self) {
        tracing::info!("stopping scheduler");
        let now = self.clock.now_utc();

        for (name, job) in &self.jobs {
            for trigger_id in job.shutdown_trigger_ids() {
                let context = TriggerContext { trigger_id, event: None, object: None };
                if let Err(e) = job.start(&self.composer, Some(&context), now).await {
                    tracing::error!(job = %name, error = %e, "shutdown launch failed");
                }
            }
        }

        for (name, mut job) in std::mem::take(&mut self.jobs) {
            if let Err(e) = job.stop(&self.wheel, &self.composer, false).await {
                tracing::warn!(job = %name, error = %e, "failed to stop job");
            }
        }

        self.catalog_watcher.stop().await;
        tracing::info!("scheduler stopped");
    }
}

/// Derive the job name from a catalog key: the slugified stem of YAML
/// files, `None` for anything else.
pub(crate) fn job_name_for_key(key: &str) -> Option<String> {
    let filename = key.rsplit('/').next().unwrap_or(key);
    let (stem, extension) = filename.rsplit_once('.')?;
    if extension != "yaml" || stem.is_empty() {
        return None;
    }
    Some(slugify(stem))
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
