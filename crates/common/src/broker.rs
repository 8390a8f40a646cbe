// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! TLS MQTT broker client.
//!
//! A thin facade over `rumqttc`: the event loop runs in a background
//! task and dispatches incoming publishes to callbacks registered per
//! topic filter.

use crate::config::Config;
use crate::error::BrokerError;
use parking_lot::Mutex;
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS, TlsConfiguration, Transport};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

type Callback = Arc<dyn Fn(&str, &[u8]) + Send + Sync>;

/// Thread-safe MQTT client facade.
pub struct Client {
    mqtt: AsyncClient,
    handlers: Arc<Mutex<Vec<(String, Callback)>>>,
    token: CancellationToken,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Client {
    /// Connect to the broker with mutual TLS.
    ///
    /// The client id is a fresh UUID, prefixed with `uid` when given, so
    /// that reconnecting instances never collide.
    pub async fn connect(config: &Config, uid: Option<&str>) -> Result<Client, BrokerError> {
        let client_id = match uid {
            Some(uid) => format!("{uid}/{}", Uuid::new_v4()),
            None => Uuid::new_v4().to_string(),
        };

        let mut options = MqttOptions::new(client_id, &config.mqtt_host, config.mqtt_port);
        options.set_keep_alive(Duration::from_secs(60));

        let ca = std::fs::read(&config.tls_cacert)?;
        let client_cert = std::fs::read(&config.tls_cert)?;
        let client_key = std::fs::read(&config.tls_key)?;
        options.set_transport(Transport::Tls(TlsConfiguration::Simple {
            ca,
            alpn: None,
            client_auth: Some((client_cert, client_key)),
        }));

        let (mqtt, mut event_loop) = AsyncClient::new(options, 64);
        let handlers: Arc<Mutex<Vec<(String, Callback)>>> = Arc::new(Mutex::new(Vec::new()));
        let token = CancellationToken::new();

        let task_handlers = Arc::clone(&handlers);
        let task_token = token.clone();
        let handle = tokio::spawn(async move {
            loop {
                let event = tokio::select! {
                    _ = task_token.cancelled() => break,
                    event = event_loop.poll() => event,
                };
                match event {
                    Ok(Event::Incoming(Packet::Publish(publish))) => {
                        tracing::debug!(topic = %publish.topic, len = publish.payload.len(), "recv msg");
                        let matched: Vec<Callback> = {
                            let handlers = task_handlers.lock();
                            handlers
                                .iter()
                                .filter(|(filter, _)| topic_matches(filter, &publish.topic))
                                .map(|(_, cb)| Arc::clone(cb))
                                .collect()
                        };
                        for callback in matched {
                            callback(&publish.topic, &publish.payload);
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!(error = %e, "broker connection error, retrying");
                        tokio::select! {
                            _ = task_token.cancelled() => break,
                            _ = tokio::time::sleep(Duration::from_secs(1)) => {}
                        }
                    }
                }
            }
        });

        Ok(Client { mqtt, handlers, token, handle: Mutex::new(Some(handle)) })
    }

    /// Subscribe to a topic filter, registering a callback for matching
    /// messages.
    pub async fn subscribe<F>(&self, topic: &str, callback: F) -> Result<(), BrokerError>
    where
        F: Fn(&str, &[u8]) + Send + Sync + 'static,
    {
        self.handlers.lock().push((topic.to_string(), Arc::new(callback)));
        self.mqtt
            .subscribe(topic, QoS::AtLeastOnce)
            .await
            .map_err(|e| BrokerError::Request(e.to_string()))?;
        tracing::debug!(topic = %topic, "subscribed");
        Ok(())
    }

    /// Drop all callbacks for a topic filter and unsubscribe.
    pub async fn unsubscribe(&self, topic: &str) -> Result<(), BrokerError> {
        self.handlers.lock().retain(|(filter, _)| filter != topic);
        self.mqtt
            .unsubscribe(topic)
            .await
            .map_err(|e| BrokerError::Request(e.to_string()))
    }

    pub async fn publish(&self, topic: &str, payload: impl Into<Vec<u8>>) -> Result<(), BrokerError> {
        self.mqtt
            .publish(topic, QoS::AtLeastOnce, false, payload.into())
            .await
            .map_err(|e| BrokerError::Request(e.to_string()))
    }

    /// Publish a command payload and await the first message on the
    /// matching response topic.
    pub async fn request(
        &self,
        command_topic: &str,
        response_topic: &str,
        payload: Vec<u8>,
        timeout: Duration,
    ) -> Result<Vec<u8>, BrokerError> {
        let (tx, mut rx) = mpsc::channel::<Vec<u8>>(8);
        self.subscribe(response_topic, move |_topic, payload| {
            let _ = tx.try_send(payload.to_vec());
        })
        .await?;

        let result = async {
            self.publish(command_topic, payload).await?;
            tokio::time::timeout(timeout, rx.recv())
                .await
                .map_err(|_| BrokerError::Timeout(response_topic.to_string()))?
                .ok_or(BrokerError::Closed)
        }
        .await;

        self.unsubscribe(response_topic).await?;
        result
    }

    /// Stop the event-loop task and disconnect. Idempotent.
    pub async fn stop(&self) {
        self.token.cancel();
        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
        let _ = self.mqtt.disconnect().await;
    }
}

/// MQTT topic filter matching with `+` and `#` wildcards.
pub fn topic_matches(filter: &str, topic: &str) -> bool {
    let mut filter_parts = filter.split('/');
    let mut topic_parts = topic.split('/');

    loop {
        match (filter_parts.next(), topic_parts.next()) {
            (Some("#"), _) => return true,
            (Some("+"), Some(_)) => continue,
            (Some(f), Some(t)) if f == t => continue,
            (None, None) => return true,
            _ => return false,
        }
    }
}

#[cfg(test)]
#[path = "broker_tests.rs"]
mod tests;
