//! Discarding report results that arrive after the user moved on.
//!
//! Every selection bumps a generation counter and hands out a [`Ticket`].
//! A finished report is applied only while its ticket is still the current
//! one.

use std::future::Future;
use std::sync::{Mutex, PoisonError};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    generation: u64,
    station_id: String,
}

impl Ticket {
    pub fn station_id(&self) -> &str {
        &self.station_id
    }
}

#[derive(Debug, Default)]
struct Current {
    generation: u64,
    station_id: Option<String>,
}

#[derive(Debug, Default)]
pub struct Selection {
    current: Mutex<Current>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `station_id` the current selection and returns its ticket.
    /// Any ticket issued earlier becomes stale, even for the same station.
    pub fn select(&self, station_id: &str) -> Ticket {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        current.generation += 1;
        current.station_id = Some(station_id.to_string());
        Ticket {
            generation: current.generation,
            station_id: station_id.to_string(),
        }
    }

    pub fn clear(&self) {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        current.generation += 1;
        current.station_id = None;
    }

    pub fn current_station(&self) -> Option<String> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .station_id
            .clone()
    }

    pub fn is_current(&self, ticket: &Ticket) -> bool {
        let current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        current.generation == ticket.generation
            && current.station_id.as_deref() == Some(ticket.station_id.as_str())
    }

    /// Awaits `work` and yields its output only if `ticket` is still current
    /// once it finishes.
    pub async fn resolve<F, T>(&self, ticket: &Ticket, work: F) -> Option<T>
    where
        F: Future<Output = T>,
    {
        let output = work.await;
        if self.is_current(ticket) {
            Some(output)
        } else {
            debug!(station_id = %ticket.station_id, generation = ticket.generation, "Discarding stale result");
            None
        }
    }
}
