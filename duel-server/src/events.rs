use dashmap::DashMap;
use duel_types::MatchId;
use tokio::sync::broadcast;

/// Fan-out of committed match mutations to subscribed connections.
///
/// Handlers call `notify` after every successful mutation; each WebSocket
/// subscriber re-queries a personalized snapshot on every tick. The event
/// carries no payload, so a lagged receiver loses nothing by skipping ahead.
pub struct MatchEventHub {
    channels: DashMap<MatchId, broadcast::Sender<()>>,
}

impl MatchEventHub {
    pub fn new() -> Self {
        Self {
            channels: DashMap::new(),
        }
    }

    pub fn subscribe(&self, match_id: MatchId) -> broadcast::Receiver<()> {
        self.channels
            .entry(match_id)
            .or_insert_with(|| broadcast::channel(32).0)
            .subscribe()
    }

    pub fn notify(&self, match_id: MatchId) {
        let abandoned = {
            match self.channels.get(&match_id) {
                // send only fails when nobody is listening
                Some(sender) => sender.send(()).is_err(),
                None => false,
            }
        };

        if abandoned {
            self.channels
                .remove_if(&match_id, |_, sender| sender.receiver_count() == 0);
        }
    }
}

impl Default for MatchEventHub {
    fn default() -> Self {
        Self::new()
    }
}
