//! Mock channel service for tests.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::channel::{Channel, ChannelError, ChannelService, ProgramEntry};

/// In-memory channel server.
pub struct MockChannelService {
    channels: RwLock<Vec<Channel>>,
    programs: RwLock<HashMap<String, Vec<ProgramEntry>>>,
    /// Guide group each channel was created under, by channel name.
    groups: RwLock<HashMap<String, String>>,
}

impl MockChannelService {
    pub fn new() -> Self {
        Self {
            channels: RwLock::new(Vec::new()),
            programs: RwLock::new(HashMap::new()),
            groups: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_channels(mut self, channels: Vec<Channel>) -> Self {
        self.channels = RwLock::new(channels);
        self
    }

    /// Pre-program titles onto a channel.
    pub async fn seed_programs(&self, channel_id: &str, entries: Vec<ProgramEntry>) {
        self.programs
            .write()
            .await
            .insert(channel_id.to_string(), entries);
    }

    pub async fn group_for(&self, channel_name: &str) -> Option<String> {
        self.groups.read().await.get(channel_name).cloned()
    }

    pub async fn programs_for(&self, channel_id: &str) -> Vec<ProgramEntry> {
        self.programs
            .read()
            .await
            .get(channel_id)
            .cloned()
            .unwrap_or_default()
    }
}

impl Default for MockChannelService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChannelService for MockChannelService {
    async fn list_channels(&self) -> Result<Vec<Channel>, ChannelError> {
        Ok(self.channels.read().await.clone())
    }

    async fn create_channel(&self, name: &str, group: &str) -> Result<Channel, ChannelError> {
        let mut channels = self.channels.write().await;
        if let Some(existing) = channels.iter().find(|c| c.name.eq_ignore_ascii_case(name)) {
            return Ok(existing.clone());
        }
        self.groups
            .write()
            .await
            .insert(name.to_string(), group.to_string());
        let taken: std::collections::HashSet<u32> = channels.iter().map(|c| c.number).collect();
        let number = (1..).find(|n| !taken.contains(n)).unwrap_or(1);
        let channel = Channel {
            id: format!("channel-{}", channels.len() + 1),
            name: name.to_string(),
            number,
        };
        channels.push(channel.clone());
        Ok(channel)
    }

    async fn list_program_titles(&self, channel_id: &str) -> Result<Vec<String>, ChannelError> {
        let channels = self.channels.read().await;
        if !channels.iter().any(|c| c.id == channel_id) {
            return Err(ChannelError::NotFound(format!("Channel {}", channel_id)));
        }
        Ok(self
            .programs
            .read()
            .await
            .get(channel_id)
            .map(|entries| entries.iter().map(|e| e.title.clone()).collect())
            .unwrap_or_default())
    }

    async fn append_program(
        &self,
        channel: &Channel,
        entry: &ProgramEntry,
    ) -> Result<(), ChannelError> {
        self.programs
            .write()
            .await
            .entry(channel.id.clone())
            .or_default()
            .push(entry.clone());
        Ok(())
    }

    async fn normalize_channel_numbers(&self) -> Result<u32, ChannelError> {
        let mut channels = self.channels.write().await;
        channels.sort_by_key(|c| c.number);
        let mut updated = 0;
        for (idx, channel) in channels.iter_mut().enumerate() {
            let wanted = idx as u32 + 1;
            if channel.number != wanted {
                channel.number = wanted;
                updated += 1;
            }
        }
        Ok(updated)
    }
}
