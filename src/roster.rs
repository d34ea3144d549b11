use crate::models::{BookingStatus, NotificationView};

/// Conductor dashboard roster: one list of bookings reconciled from two
/// independent sources, the REST snapshot fetched on mount (and on the
/// periodic re-fetch backstop) and realtime events arriving over the socket.
/// All merges key on the notification id; status never changes except from a
/// server response, so a failed advance call leaves nothing to roll back.
#[derive(Debug, Default, Clone)]
pub struct Roster {
    entries: Vec<NotificationView>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adopt a server snapshot. Rows the server knows replace the local
    /// copies; realtime arrivals the snapshot has not caught up with yet are
    /// kept at the end.
    pub fn merge_snapshot(&mut self, snapshot: Vec<NotificationView>) {
        let mut merged = snapshot;
        for entry in self.entries.drain(..) {
            if !merged.iter().any(|m| m.id == entry.id) {
                merged.push(entry);
            }
        }
        self.entries = merged;
    }

    /// Append a realtime arrival unless its id is already present. Returns
    /// whether the roster changed, so a duplicate delivery (or an event
    /// racing the initial fetch) is a no-op.
    pub fn apply_event(&mut self, event: NotificationView) -> bool {
        if self.entries.iter().any(|e| e.id == event.id) {
            return false;
        }
        self.entries.push(event);
        true
    }

    /// Reconcile a status change from an advance response: replace the entry
    /// by id, appending if the row is not known yet.
    pub fn apply_update(&mut self, updated: NotificationView) {
        match self.entries.iter_mut().find(|e| e.id == updated.id) {
            Some(entry) => *entry = updated,
            None => self.entries.push(updated),
        }
    }

    pub fn entries(&self) -> &[NotificationView] {
        &self.entries
    }

    pub fn waiting(&self) -> Vec<&NotificationView> {
        self.with_status(BookingStatus::Waiting)
    }

    pub fn traveling(&self) -> Vec<&NotificationView> {
        self.with_status(BookingStatus::Traveling)
    }

    pub fn completed(&self) -> Vec<&NotificationView> {
        self.with_status(BookingStatus::Completed)
    }

    fn with_status(&self, status: BookingStatus) -> Vec<&NotificationView> {
        self.entries.iter().filter(|e| e.status == status).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
