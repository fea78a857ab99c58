use crate::bridge::hub::EventHub;
use crate::generator::profile::EventGenerator;
use crate::workflow::config::SimulatorConfig;
use anyhow::Context;
use log::{debug, info, warn};
use roadlenscore::{Category, DetectionStore};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::time::{self, MissedTickBehavior};

pub struct OfflineReport {
    /// One encoded envelope per line, ready to replay.
    pub envelopes: Vec<String>,
    pub per_category: BTreeMap<Category, usize>,
    /// The store a client would hold after receiving every envelope.
    pub store: DetectionStore,
}

#[derive(Clone)]
pub struct Runner {
    config: SimulatorConfig,
}

impl Runner {
    pub fn new(config: SimulatorConfig) -> Self {
        Self { config }
    }

    /// Generates `count` events against the configured lookout lists without
    /// any network.
    pub fn offline(&self, count: usize) -> anyhow::Result<OfflineReport> {
        let mut generator = EventGenerator::new(&self.config.generator);
        let events = generator.batch(count, &self.config.lookout);

        let mut report = OfflineReport {
            envelopes: Vec::with_capacity(events.len()),
            per_category: BTreeMap::new(),
            store: DetectionStore::default(),
        };
        for event in events {
            let envelope = event
                .encode()
                .with_context(|| format!("encoding {}", event.tag()))?;
            report.envelopes.push(envelope);
            if let Some(category) = event.category() {
                *report.per_category.entry(category).or_default() += 1;
            }
            report.store.apply(event);
        }
        Ok(report)
    }

    /// Emits one event per interval to every client of `hub`. Runs until the
    /// future is dropped.
    pub async fn run(&self, hub: Arc<EventHub>) {
        let mut generator = EventGenerator::new(&self.config.generator);
        let mut ticker = time::interval(self.config.interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            "emitting events every {:?} (seed {})",
            self.config.interval(),
            self.config.generator.seed
        );

        loop {
            ticker.tick().await;
            let lookout = hub.registry().snapshot();
            let Some(event) = generator.next_event(&lookout) else {
                continue;
            };
            match hub.publish(&event) {
                Ok(clients) => debug!("{} -> {} client(s)", event.tag(), clients),
                Err(err) => warn!("dropping generated event: {:#}", err),
            }
        }
    }
}
