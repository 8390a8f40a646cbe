// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A scheduler-managed service binding.
//!
//! A `Job` owns its triggers: one store watcher per store trigger, one
//! timer entry per schedule trigger. Trigger firings are funneled back
//! to the scheduler loop as messages; the job itself only assembles the
//! invocation context and drives the composer.

use crate::error::SchedulerError;
use crate::scheduler::SchedulerMsg;
use crate::timer::TimerWheel;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use seguro_common::store;
use seguro_compose::{Composer, Service};
use seguro_core::{EventKind, JobInfo, JobSpec, Trigger, TriggerInfo};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Context of a single trigger firing.
#[derive(Debug, Clone)]
pub struct TriggerContext {
    pub trigger_id: String,
    pub event: Option<EventKind>,
    pub object: Option<String>,
}

pub struct Job {
    name: String,
    spec: JobSpec,
    service: Service,
    watchers: Vec<store::Watcher>,
    stopped: bool,
}

impl Job {
    /// Instantiate a job and wire up its triggers.
    ///
    /// Store triggers allocate watchers whose callbacks enqueue
    /// `(job, trigger, context)` messages; schedule triggers register
    /// timer entries tagged with the job name.
    pub fn bind(
        name: &str,
        spec: JobSpec,
        store: &store::Client,
        wheel: &Arc<Mutex<TimerWheel>>,
        tx: &mpsc::UnboundedSender<SchedulerMsg>,
        now: DateTime<Utc>,
    ) -> Result<Job, SchedulerError> {
        let service = Service {
            name: name.to_string(),
            spec: spec.container.clone(),
            scale: spec.scale,
            force_recreate: spec.recreate,
            build: spec.build,
        };

        let mut watchers = Vec::new();
        for (id, trigger) in &spec.triggers {
            match trigger {
                Trigger::Created(_) | Trigger::Removed(_) | Trigger::Modified(_) => {
                    let Some((prefix, events, initial)) = trigger.store_subscription() else {
                        continue;
                    };
                    let tx = tx.clone();
                    let job = name.to_string();
                    let trigger_id = id.clone();
                    let watcher = store.watch_async(
                        prefix,
                        move |event, key| {
                            let _ = tx.send(SchedulerMsg::Trigger {
                                job: job.clone(),
                                context: TriggerContext {
                                    trigger_id: trigger_id.clone(),
                                    event: Some(event),
                                    object: Some(key),
                                },
                            });
                        },
                        events,
                        initial,
                    );
                    watchers.push(watcher);
                }
                Trigger::Schedule(schedule) => {
                    wheel.lock().register(name, id, schedule, now)?;
                }
                Trigger::Startup | Trigger::Shutdown => {}
            }
        }

        Ok(Job { name: name.to_string(), spec, service, watchers, stopped: false })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn container_spec(&self) -> &Value {
        &self.spec.container
    }

    /// Whether instantiation should launch immediately: an explicit
    /// startup trigger, or no triggers at all (implicit startup).
    pub fn has_startup(&self) -> bool {
        self.spec.triggers.is_empty()
            || self.spec.triggers.values().any(|t| matches!(t, Trigger::Startup))
    }

    /// Ids of shutdown triggers, fired during scheduler teardown.
    pub fn shutdown_trigger_ids(&self) -> Vec<String> {
        self.spec
            .triggers
            .iter()
            .filter(|(_, t)| matches!(t, Trigger::Shutdown))
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Launch the container with the firing's invocation context.
    pub async fn start(
        &self,
        composer: &Composer,
        context: Option<&TriggerContext>,
        now: DateTime<Utc>,
    ) -> Result<(), SchedulerError> {
        if self.stopped {
            return Ok(());
        }

        let info = build_job_info(&self.name, &self.spec, context, now);
        let overlay = launch_overlay(&self.name, &info)?;
        self.service.start(composer, &[overlay]).await?;

        tracing::info!(job = %self.name, trigger = context.map(|c| c.trigger_id.as_str()), "started job");
        Ok(())
    }

    /// Unregister schedules and watchers; with `down`, also take the
    /// container down. Idempotent.
    pub async fn stop(
        &mut self,
        wheel: &Arc<Mutex<TimerWheel>>,
        composer: &Composer,
        down: bool,
    ) -> Result<(), SchedulerError> {
        if self.stopped {
            return Ok(());
        }
        self.stopped = true;

        wheel.lock().clear(&self.name);
        for watcher in self.watchers.drain(..) {
            watcher.stop().await;
        }
        if down {
            self.service.stop(composer).await?;
        }
        Ok(())
    }
}

/// Assemble the `JobInfo` record for a launch.
pub fn build_job_info(
    name: &str,
    spec: &JobSpec,
    context: Option<&TriggerContext>,
    now: DateTime<Utc>,
) -> JobInfo {
    let trigger = context.and_then(|ctx| {
        spec.triggers.get(&ctx.trigger_id).map(|t| TriggerInfo {
            id: ctx.trigger_id.clone(),
            kind: t.kind().to_string(),
            time: now,
            event: ctx.event,
            object: ctx.object.clone(),
        })
    });
    JobInfo { name: name.to_string(), spec: spec.clone(), trigger }
}

/// The overlay spec injected on every launch: invocation context,
/// canonical service endpoints, TLS credential paths, and the read-only
/// secret volumes.
pub fn launch_overlay(name: &str, info: &JobInfo) -> Result<Value, SchedulerError> {
    let job_info = info.to_env_json()?;
    Ok(json!({
        "services": {
            name: {
                "environment": {
                    "SEGURO_JOB_INFO": job_info,
                    "S3_HOST": "minio",
                    "MQTT_HOST": "mosquitto",
                    "TLS_CACERT": "/certs/ca.crt",
                    "TLS_CERT": "/certs/clients/admin.crt",
                    "TLS_KEY": "/keys/clients/admin.key",
                },
                "env_file": [".env"],
                "volumes": [
                    {
                        "type": "volume",
                        "source": "key_clients",
                        "target": "/keys/clients",
                        "read_only": true,
                    },
                    {
                        "type": "volume",
                        "source": "certs",
                        "target": "/certs",
                        "read_only": true,
                    },
                ],
            },
        },
        "volumes": {
            "key_clients": {"name": "platform_key_clients", "external": true},
            "certs": {"name": "platform_certs", "external": true},
        },
    }))
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
