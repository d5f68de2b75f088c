//! Device context: the state shared by the dispatch loop and the HTTP task.
//!
//! Created once in `main` and wrapped in [`SharedContext`].  The trigger
//! queue is kept outside it.

use std::sync::{Arc, Mutex, MutexGuard};

use embedded_hal::delay::DelayNs;

use crate::app::events::DispatchOutcome;
use crate::app::ports::{EventSink, IrPort, StoragePort};
use crate::app::service::IrService;
use crate::events::TriggerQueue;

pub struct DeviceContext<S, E> {
    pub service: IrService,
    pub storage: S,
    pub sink: E,
}

pub type SharedContext<S, E> = Arc<Mutex<DeviceContext<S, E>>>;

impl<S: StoragePort, E: EventSink> DeviceContext<S, E> {
    /// Build the context and load the stored document.
    pub fn load(storage: S, sink: E) -> Self {
        let mut ctx = Self {
            service: IrService::new(),
            storage,
            sink,
        };
        ctx.service.load(&mut ctx.storage, &mut ctx.sink);
        ctx
    }

    /// One dispatcher step.  See [`IrService::step`].
    pub fn step(
        &mut self,
        queue: &TriggerQueue,
        hw: &mut (impl IrPort + DelayNs),
    ) -> Option<DispatchOutcome> {
        self.service.step(queue, hw, &mut self.sink)
    }

    pub fn into_shared(self) -> SharedContext<S, E> {
        Arc::new(Mutex::new(self))
    }
}

/// Lock the context.  A poisoned lock is recovered.
pub fn lock<S, E>(ctx: &SharedContext<S, E>) -> MutexGuard<'_, DeviceContext<S, E>> {
    ctx.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
