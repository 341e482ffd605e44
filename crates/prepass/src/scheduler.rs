//! The frame queue and the loop that drains it.
//!
//! Frames are taken from the head of the queue one at a time. A render
//! frame's thenable is awaited even if frames behind it settled first, so
//! suspended components resume in the order they suspended.

use crate::config::PrepassConfig;
use crate::error::PrepassError;
use crate::frame::{Boundary, BoundaryTarget, Frame, FrameQueue, RenderFrame, Work};
use crate::visit::Traversal;
use crate::visitor::Visitor;
use prepass_core::Fault;
use std::rc::Rc;
use std::time::Instant;

pub(crate) struct Engine {
    pub queue: FrameQueue,
    pub visitor: Box<dyn Visitor>,
    pub config: PrepassConfig,
    next_instance: u64,
}

impl Engine {
    pub fn new(visitor: Box<dyn Visitor>, config: PrepassConfig) -> Self {
        Self {
            queue: FrameQueue::new(),
            visitor,
            config,
            next_instance: 0,
        }
    }

    /// Id for the hook list of a newly mounted function component.
    pub fn next_instance(&mut self) -> u64 {
        let id = self.next_instance;
        self.next_instance += 1;
        id
    }

    /// Whether a walk that began at `started` has used up its time slice.
    pub fn budget_spent(&self, started: Instant) -> bool {
        self.config
            .yield_after
            .is_some_and(|budget| started.elapsed() >= budget)
    }

    /// Run `traversal` until it finishes or yields.
    pub fn walk(&mut self, traversal: Traversal) -> Result<(), Fault> {
        traversal.run(self)
    }

    /// Hand `fault` to `boundary` and walk its recovery output.
    fn deliver(&mut self, boundary: Rc<Boundary>, fault: Fault) -> Result<(), Fault> {
        if !boundary.trip() {
            tracing::debug!(?boundary, %fault, "boundary already recovering, dropping fault");
            return Ok(());
        }
        let mut traversal = Traversal::resume(&boundary.snapshot);
        match &boundary.target {
            BoundaryTarget::Suspense { fallback } => {
                tracing::debug!(%fault, "suspense boundary caught fault, visiting fallback");
                traversal.descend(vec![fallback.clone()], None);
            }
            BoundaryTarget::Class { instance } => {
                tracing::debug!(boundary = instance.name(), %fault, "error boundary caught fault");
                instance.catch(fault);
                let work = Work::Class {
                    instance: Rc::clone(instance),
                };
                traversal.perform(self, work)?;
            }
        }
        self.walk(traversal)
    }

    /// Process frames until the queue is empty or a fault escapes.
    pub async fn drain(mut self) -> Result<(), PrepassError> {
        while let Some(frame) = self.queue.pop_front() {
            tracing::trace!(kind = frame.kind(), remaining = self.queue.len(), "next frame");
            match frame {
                Frame::Yield(traversal) => {
                    tokio::task::yield_now().await;
                    self.walk(traversal).map_err(PrepassError::Fault)?;
                }
                Frame::Render(RenderFrame {
                    thenable,
                    snapshot,
                    work,
                }) => match thenable.await {
                    Ok(()) => {
                        tracing::debug!(component = work.name(), "resuming component");
                        let mut traversal = Traversal::resume(&snapshot);
                        traversal.perform(&mut self, work).map_err(PrepassError::Fault)?;
                        self.walk(traversal).map_err(PrepassError::Fault)?;
                    }
                    Err(fault) => match snapshot.boundary {
                        Some(boundary) => self.deliver(boundary, fault).map_err(PrepassError::Fault)?,
                        None => return Err(PrepassError::Rejected(fault)),
                    },
                },
                Frame::Catch { fault, boundary } => {
                    self.deliver(boundary, fault).map_err(PrepassError::Fault)?;
                }
            }
        }
        Ok(())
    }
}
