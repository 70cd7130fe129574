//! Dashboard aggregates over a ticket listing.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::{Priority, Status, Ticket};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total: usize,
    /// Open plus in-progress.
    pub open: usize,
    /// Closed.
    pub resolved: usize,
    pub by_status: BTreeMap<Status, usize>,
    pub by_priority: BTreeMap<Priority, usize>,
}

impl DashboardStats {
    #[must_use]
    pub fn from_tickets(tickets: &[Ticket]) -> Self {
        let mut by_status: BTreeMap<Status, usize> =
            Status::ALL.iter().map(|s| (*s, 0)).collect();
        let mut by_priority: BTreeMap<Priority, usize> =
            Priority::ALL.iter().map(|p| (*p, 0)).collect();

        for ticket in tickets {
            *by_status.entry(ticket.status).or_default() += 1;
            *by_priority.entry(ticket.priority).or_default() += 1;
        }

        let open = tickets.iter().filter(|t| t.status.is_unresolved()).count();
        Self {
            total: tickets.len(),
            open,
            resolved: tickets.len() - open,
            by_status,
            by_priority,
        }
    }
}
