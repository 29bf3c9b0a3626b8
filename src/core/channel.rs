use std::collections::HashMap;
use warp::ws::Message as WsMessage;

use crate::core::connection::ConnectionId;
use crate::core::session::SessionManager;

/// Members of one channel, kept in join order
#[derive(Debug, Default, Clone)]
pub struct Channel {
    members: Vec<ConnectionId>,
}

impl Channel {
    /// Adds a member; returns false if already present
    pub fn add_member(&mut self, id: ConnectionId) -> bool {
        if self.has_member(&id) {
            return false;
        }
        self.members.push(id);
        true
    }

    /// Removes a member; returns false if it was not present
    pub fn remove_member(&mut self, id: &str) -> bool {
        let before = self.members.len();
        self.members.retain(|member| member != id);
        self.members.len() != before
    }

    pub fn has_member(&self, id: &str) -> bool {
        self.members.iter().any(|member| member == id)
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn members(&self) -> &[ConnectionId] {
        &self.members
    }
}

/// Maps channel names to their members.
///
/// A channel exists exactly while it has at least one member: `join` creates
/// it lazily and `leave` drops it with its last member.
#[derive(Debug, Default)]
pub struct ChannelDirectory {
    channels: HashMap<String, Channel>,
}

impl ChannelDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a session to a channel, creating the channel if needed
    pub fn join(&mut self, channel: &str, id: ConnectionId) {
        self.channels
            .entry(channel.to_string())
            .or_default()
            .add_member(id);
    }

    /// Removes a session from a channel; unknown channels and non-members are a no-op
    pub fn leave(&mut self, channel: &str, id: &str) {
        let now_empty = match self.channels.get_mut(channel) {
            Some(members) => {
                members.remove_member(id);
                members.is_empty()
            }
            None => return,
        };

        if now_empty {
            self.channels.remove(channel);
            log::debug!("Channel {} removed after last member left", channel);
        }
    }

    /// Sends `message` to every member except `sender`, returning how many were queued
    pub fn broadcast(
        &self,
        channel: &str,
        sender: &str,
        message: &WsMessage,
        sessions: &SessionManager,
    ) -> usize {
        let Some(members) = self.channels.get(channel) else {
            return 0;
        };

        members
            .members()
            .iter()
            .filter(|id| id.as_str() != sender)
            .filter(|id| sessions.send_to(id, message.clone()))
            .count()
    }

    /// Current members of a channel in join order; empty if the channel is absent
    pub fn members_of(&self, channel: &str) -> &[ConnectionId] {
        self.channels
            .get(channel)
            .map(Channel::members)
            .unwrap_or(&[])
    }

    pub fn contains(&self, channel: &str) -> bool {
        self.channels.contains_key(channel)
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Iterate over every channel with its members
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Channel)> {
        self.channels.iter()
    }
}
