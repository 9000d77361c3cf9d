//! Request coalescing: content-addressed, reference-counted sharing of generation
//! sequences between subscribers asking for the same prompt.
//!
//! Each distinct prompt (after Unicode NFC normalization) maps to a blake3 key. The
//! first `acquire` for a key starts a `GenerationClient`; later acquires for the same
//! key attach to it. When the last lease is dropped the entry is removed and its
//! client cancelled, so nothing outlives its subscribers.

use crate::generation::{GenerationClient, GenerationSnapshot, RetryPolicy};
use crate::provider::ImageService;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;
use unicode_normalization::UnicodeNormalization;

/// Content address of a prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PromptKey([u8; 32]);

impl PromptKey {
    pub fn of(prompt: &str) -> Self {
        let normalized: String = prompt.nfc().collect();
        PromptKey(*blake3::hash(normalized.as_bytes()).as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// First 8 bytes, hex encoded, for log fields.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..8])
    }
}

impl fmt::Display for PromptKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

struct HubEntry {
    client: GenerationClient,
    leases: usize,
}

/// Shared generation sequences keyed by prompt
pub struct CoalescingHub {
    service: Arc<dyn ImageService>,
    policy: RetryPolicy,
    entries: Mutex<HashMap<PromptKey, HubEntry>>,
}

impl CoalescingHub {
    pub fn new(service: Arc<dyn ImageService>, policy: RetryPolicy) -> Self {
        Self {
            service,
            policy,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Attach to the sequence for `prompt`, starting it if no one holds it.
    ///
    /// Must be called from within a tokio runtime.
    pub fn acquire(self: &Arc<Self>, prompt: &str) -> SharedLease {
        let key = PromptKey::of(prompt);
        let mut entries = self.entries.lock();
        let entry = entries.entry(key).or_insert_with(|| {
            let mut client =
                GenerationClient::new(prompt, Arc::clone(&self.service), self.policy);
            client.activate();
            HubEntry { client, leases: 0 }
        });
        entry.leases += 1;
        let receiver = entry.client.subscribe();
        debug!(
            prompt_key = %key.short(),
            leases = entry.leases,
            "Acquired shared generation lease"
        );

        SharedLease {
            hub: Arc::clone(self),
            key,
            receiver,
        }
    }

    /// Number of leases currently held for `prompt`.
    pub fn lease_count(&self, prompt: &str) -> usize {
        self.entries
            .lock()
            .get(&PromptKey::of(prompt))
            .map(|entry| entry.leases)
            .unwrap_or(0)
    }

    /// Number of distinct prompts with live subscribers.
    pub fn active_keys(&self) -> usize {
        self.entries.lock().len()
    }

    fn release(&self, key: &PromptKey) {
        let removed = {
            let mut entries = self.entries.lock();
            let Some(entry) = entries.get_mut(key) else {
                return;
            };
            entry.leases = entry.leases.saturating_sub(1);
            if entry.leases > 0 {
                return;
            }
            entries.remove(key)
        };
        // Dropping the client cancels it; done outside the lock.
        if let Some(entry) = removed {
            debug!(prompt_key = %key.short(), "Released last shared generation lease");
            drop(entry);
        }
    }
}

/// A subscriber's hold on a shared generation sequence.
pub struct SharedLease {
    hub: Arc<CoalescingHub>,
    key: PromptKey,
    receiver: watch::Receiver<GenerationSnapshot>,
}

impl SharedLease {
    pub fn key(&self) -> PromptKey {
        self.key
    }

    pub fn subscribe(&self) -> watch::Receiver<GenerationSnapshot> {
        self.receiver.clone()
    }
}

impl Drop for SharedLease {
    fn drop(&mut self) {
        self.hub.release(&self.key);
    }
}
