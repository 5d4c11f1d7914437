use dashmap::DashMap;
use tokio::sync::broadcast;
use ulid::Ulid;

use crate::model::Alert;

const CHANNEL_CAPACITY: usize = 256;

/// Broadcast hub for booking alerts, one channel per site. Persisting the
/// alert record is the engine's job; the hub only fans out to live listeners.
pub struct AlertHub {
    channels: DashMap<Ulid, broadcast::Sender<Alert>>,
}

impl AlertHub {
    pub fn new() -> Self {
        Self {
            channels: DashMap::new(),
        }
    }

    /// Subscribe to alerts for a site. Creates the channel if needed.
    pub fn subscribe(&self, site_id: Ulid) -> broadcast::Receiver<Alert> {
        let sender = self
            .channels
            .entry(site_id)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0);
        sender.subscribe()
    }

    /// Send an alert. No-op if nobody is listening.
    pub fn send(&self, site_id: Ulid, alert: &Alert) {
        if let Some(sender) = self.channels.get(&site_id) {
            let _ = sender.send(alert.clone());
        }
    }

    /// Remove a channel (e.g. when a site is decommissioned).
    pub fn remove(&self, site_id: &Ulid) {
        self.channels.remove(site_id);
    }
}

impl Default for AlertHub {
    fn default() -> Self {
        Self::new()
    }
}
