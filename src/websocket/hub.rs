use dashmap::DashMap;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use tokio::sync::mpsc;

pub type WsSender = mpsc::UnboundedSender<String>;

/// Room registry for realtime fan-out, keyed by bus. A connection is in at
/// most one room at a time; the socket task moves it when the conductor
/// re-joins for a different bus.
///
/// Delivery is at-most-once and non-durable: nothing is queued for rooms
/// with no members, and a client that reconnects reconciles through the REST
/// snapshot instead of replay.
#[derive(Clone)]
pub struct BusHub {
    rooms: Arc<DashMap<i32, Vec<(u64, WsSender)>>>,
    next_conn_id: Arc<AtomicU64>,
}

impl Default for BusHub {
    fn default() -> Self {
        Self::new()
    }
}

impl BusHub {
    pub fn new() -> Self {
        Self {
            rooms: Arc::new(DashMap::new()),
            next_conn_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Add a connection's outbound channel to a bus room and hand back the
    /// id needed to leave it again.
    pub fn join(&self, bus_id: i32, sender: WsSender) -> u64 {
        let conn_id = self.next_conn_id.fetch_add(1, Ordering::Relaxed);
        self.rooms.entry(bus_id).or_default().push((conn_id, sender));
        conn_id
    }

    pub fn leave(&self, bus_id: i32, conn_id: u64) {
        if let Some(mut members) = self.rooms.get_mut(&bus_id) {
            members.retain(|(id, _)| *id != conn_id);
            if members.is_empty() {
                drop(members);
                // Re-checked under the shard lock; a concurrent join wins.
                self.rooms.remove_if(&bus_id, |_, members| members.is_empty());
            }
        }
    }

    /// Send to every member of a bus room. Closed connections are pruned
    /// while sending.
    pub fn broadcast_to_bus(&self, bus_id: i32, message: &str) {
        if let Some(mut members) = self.rooms.get_mut(&bus_id) {
            members.retain(|(_, sender)| sender.send(message.to_string()).is_ok());
            if members.is_empty() {
                drop(members);
                self.rooms.remove_if(&bus_id, |_, members| members.is_empty());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::BusHub;
    use tokio::sync::mpsc;

    #[test]
    fn broadcast_reaches_every_room_member() {
        let hub = BusHub::new();
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        hub.join(1, tx_a);
        hub.join(1, tx_b);

        hub.broadcast_to_bus(1, "hello");

        assert_eq!(rx_a.try_recv().unwrap(), "hello");
        assert_eq!(rx_b.try_recv().unwrap(), "hello");
    }

    #[test]
    fn broadcast_is_scoped_to_the_room() {
        let hub = BusHub::new();
        let (tx_one, mut rx_one) = mpsc::unbounded_channel();
        let (tx_two, mut rx_two) = mpsc::unbounded_channel();
        hub.join(1, tx_one);
        hub.join(2, tx_two);

        hub.broadcast_to_bus(1, "for bus one");

        assert_eq!(rx_one.try_recv().unwrap(), "for bus one");
        assert!(rx_two.try_recv().is_err());
    }

    #[test]
    fn leaving_stops_delivery() {
        let hub = BusHub::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let conn_id = hub.join(7, tx);
        hub.leave(7, conn_id);

        hub.broadcast_to_bus(7, "gone");

        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn closed_connections_are_pruned_on_send() {
        let hub = BusHub::new();
        let (tx_dead, rx_dead) = mpsc::unbounded_channel();
        let (tx_live, mut rx_live) = mpsc::unbounded_channel();
        hub.join(3, tx_dead);
        hub.join(3, tx_live);
        drop(rx_dead);

        hub.broadcast_to_bus(3, "still here");
        hub.broadcast_to_bus(3, "and again");

        assert_eq!(rx_live.try_recv().unwrap(), "still here");
        assert_eq!(rx_live.try_recv().unwrap(), "and again");
    }

    #[test]
    fn broadcast_to_empty_room_is_a_noop() {
        let hub = BusHub::new();
        hub.broadcast_to_bus(42, "nobody listening");
    }
}
