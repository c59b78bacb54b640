//! Events - deferred mutations routed to a cell's owning worker
//!
//! A worker that wants to change a cell it does not own never touches it;
//! it posts an `Event` onto the owner's bounded inbound queue. The owner
//! applies it during the Drain-Events phase of a later frame: an event
//! posted during frame N is never applied before frame N + 1.

use std::sync::mpsc::{Receiver, SyncSender, TrySendError};
use std::thread;
use std::time::{Duration, Instant};

use crate::core::SimError;
use crate::domain::{Cell, MaterialCatalog};

use super::task::Task;

const QUEUE_POLL: Duration = Duration::from_micros(100);

/// What an event does to its target cell.
#[derive(Clone, Debug, PartialEq)]
pub enum EventKind {
    /// Positive adds water, negative removes it (clamped at zero).
    AddOceanMass(f64),
    AddSediment(f64),
    /// Erode up to this much from the top stratum at the next hydrology commit.
    Erode(f64),
    AddMagma(f64),
    /// Temperature change in kelvin.
    AddHeat(f64),
    SetTemperature(f64),
    DepositMaterial { name: String, mass: f64 },
}

impl EventKind {
    /// Apply at a frame boundary. Buffered quantities are credited to their
    /// committed value so the whole coming pass sees them.
    pub fn apply(&self, cell: &mut Cell, catalog: &MaterialCatalog) -> Result<(), SimError> {
        match self {
            EventKind::AddOceanMass(m) => {
                cell.ocean_mut().credit(*m);
            }
            EventKind::AddSediment(m) => {
                cell.sediment_mut().credit(*m);
            }
            EventKind::AddMagma(m) => {
                cell.magma_mut().credit(*m);
            }
            EventKind::AddHeat(dt) => cell.add_temperature(*dt),
            _ => self.stage(cell, catalog)?,
        }
        Ok(())
    }

    /// Apply in the middle of a pass. Buffered quantities only record the
    /// transfer; it becomes visible at the owning task's commit.
    pub fn stage(&self, cell: &mut Cell, catalog: &MaterialCatalog) -> Result<(), SimError> {
        match self {
            EventKind::AddOceanMass(m) if *m >= 0.0 => cell.ocean_mut().add(*m),
            EventKind::AddOceanMass(m) => {
                cell.ocean_mut().remove(-*m);
            }
            EventKind::AddSediment(m) => cell.sediment_mut().add(*m),
            EventKind::Erode(m) => cell.stage_erosion(*m),
            EventKind::AddMagma(m) => cell.magma_mut().add(*m),
            EventKind::AddHeat(dt) => cell.stage_heat(*dt),
            EventKind::SetTemperature(t) => cell.set_temperature(*t),
            EventKind::DepositMaterial { name, mass } => {
                cell.strata_mut().deposit(catalog.material(name, *mass)?);
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    /// Frame the event was posted in; `None` when posted from outside the
    /// frame loop, which makes it due at the very next drain.
    pub frame: Option<u64>,
    pub x: u32,
    pub y: u32,
    pub kind: EventKind,
}

impl Event {
    #[inline]
    pub fn is_due(&self, current_frame: u64) -> bool {
        self.frame.map_or(true, |posted| posted < current_frame)
    }
}

/// Everything that can arrive on a worker's inbound queue.
pub(crate) enum Inbound {
    Event(Event),
    /// Installed at the first drain of frame `due` or later, so every
    /// worker starts the task in the same frame.
    AddTask { due: u64, task: Box<dyn Task> },
}

/// One bounded sender per worker.
pub(crate) struct EventRouter {
    senders: Vec<SyncSender<Inbound>>,
    timeout: Duration,
}

impl EventRouter {
    /// Router plus the receiving end for each of `workers` queues.
    pub(crate) fn new(workers: usize, capacity: usize, timeout: Duration) -> (Self, Vec<Receiver<Inbound>>) {
        let (senders, receivers): (Vec<_>, Vec<_>) = (0..workers)
            .map(|_| std::sync::mpsc::sync_channel(capacity))
            .unzip();
        (Self { senders, timeout }, receivers)
    }

    #[inline]
    pub(crate) fn workers(&self) -> usize {
        self.senders.len()
    }

    /// Enqueue for worker `owner`. A full queue is retried until the guard
    /// timeout, then reported as starvation.
    pub(crate) fn post(&self, owner: usize, msg: Inbound) -> Result<(), SimError> {
        let sender = self.senders.get(owner).ok_or(SimError::WorkerGone(owner))?;
        let deadline = Instant::now() + self.timeout;
        let mut msg = msg;
        loop {
            match sender.try_send(msg) {
                Ok(()) => return Ok(()),
                Err(TrySendError::Disconnected(_)) => return Err(SimError::WorkerGone(owner)),
                Err(TrySendError::Full(back)) => msg = back,
            }
            if Instant::now() >= deadline {
                let err = SimError::starvation(format!("event queue of worker {}", owner));
                log::error!("{}", err);
                return Err(err);
            }
            thread::sleep(QUEUE_POLL);
        }
    }
}
