/// Frame scheduler - coalesces work into the next display-refresh tick
///
/// The host drives ticks; the scheduler only records whether one is wanted.
/// A tick runs, in order: the due periodic subscribers, every plain job, every
/// render job. It then advances the frame counter and reports whether another
/// tick is needed (subscribers exist or jobs are still queued).

use std::hash::Hash;
use slotmap::{SlotMap, new_key_type};
use crate::scheduler::JobQueue;

new_key_type! {
    /// Handle returned by `FrameScheduler::subscribe`
    pub struct SubscriptionId;
}

/// What the host should do after a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Request another display refresh
    Reschedule,
    /// Nothing left to do, stop requesting refreshes
    Idle,
}

struct Subscriber<S> {
    callback: S,
}

/// Per-session tick state
///
/// `J` is the job type (deduplicated by equality), `S` the subscriber
/// callback type.
pub struct FrameScheduler<J, S> {
    jobs: JobQueue<J>,
    render_jobs: JobQueue<J>,
    subscribers: SlotMap<SubscriptionId, Subscriber<S>>,
    /// Subscribers grouped by frame interval, groups in first-use order
    groups: Vec<(u64, Vec<SubscriptionId>)>,
    frame_number: u64,
    scheduled: bool,
}

impl<J: Clone + Eq + Hash, S: Clone> FrameScheduler<J, S> {
    /// Create an idle scheduler at frame 0
    pub fn new() -> Self {
        Self {
            jobs: JobQueue::new(),
            render_jobs: JobQueue::new(),
            subscribers: SlotMap::with_key(),
            groups: Vec::new(),
            frame_number: 0,
            scheduled: false,
        }
    }

    // ===== REQUESTS =====

    /// Queue a plain job for the next tick
    pub fn request_job(&mut self, job: J) {
        self.jobs.push(job);
        self.scheduled = true;
    }

    /// Queue a render job for the next tick
    pub fn request_render_job(&mut self, job: J) {
        self.render_jobs.push(job);
        self.scheduled = true;
    }

    /// Register a callback run every `nth_frame` ticks (0 is treated as 1)
    pub fn subscribe(&mut self, callback: S, nth_frame: u64) -> SubscriptionId {
        let nth_frame = nth_frame.max(1);
        let id = self.subscribers.insert(Subscriber { callback });
        match self.groups.iter_mut().find(|(nth, _)| *nth == nth_frame) {
            Some((_, ids)) => ids.push(id),
            None => self.groups.push((nth_frame, vec![id])),
        }
        self.scheduled = true;
        id
    }

    /// Remove a subscriber, returns false for an unknown id
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        if self.subscribers.remove(id).is_none() {
            return false;
        }
        for (_, ids) in self.groups.iter_mut() {
            ids.retain(|other| *other != id);
        }
        true
    }

    // ===== TICK =====

    /// Callbacks due on the current frame, in subscription-group order
    pub fn due_subscribers(&self) -> Vec<S> {
        self.groups
            .iter()
            .filter(|(nth, _)| self.frame_number % nth == 0)
            .flat_map(|(_, ids)| ids.iter())
            .filter_map(|id| self.subscribers.get(*id))
            .map(|subscriber| subscriber.callback.clone())
            .collect()
    }

    /// Next plain job of this tick
    pub fn next_job(&mut self) -> Option<J> {
        self.jobs.pop()
    }

    /// End the plain phase
    pub fn finish_jobs(&mut self) {
        self.jobs.finish();
    }

    /// Next render job of this tick
    pub fn next_render_job(&mut self) -> Option<J> {
        self.render_jobs.pop()
    }

    /// End the render phase
    pub fn finish_render_jobs(&mut self) {
        self.render_jobs.finish();
    }

    /// Advance the frame counter and decide whether to keep ticking
    pub fn end_tick(&mut self) -> TickOutcome {
        self.frame_number += 1;
        if !self.subscribers.is_empty() || !self.jobs.is_empty() || !self.render_jobs.is_empty() {
            self.scheduled = true;
            TickOutcome::Reschedule
        } else {
            self.scheduled = false;
            TickOutcome::Idle
        }
    }

    // ===== STATE =====

    /// Frames ticked so far
    pub fn frame_number(&self) -> u64 {
        self.frame_number
    }

    /// Whether the host should deliver a tick
    pub fn is_scheduled(&self) -> bool {
        self.scheduled
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Whether `job` is queued in either phase
    pub fn is_queued(&self, job: &J) -> bool {
        self.jobs.contains(job) || self.render_jobs.contains(job)
    }

    /// Drop every queued job (subscribers are kept)
    pub fn clear_jobs(&mut self) {
        self.jobs.clear();
        self.render_jobs.clear();
        self.scheduled = !self.subscribers.is_empty();
    }
}

impl<J: Clone + Eq + Hash, S: Clone> Default for FrameScheduler<J, S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "frame_scheduler_tests.rs"]
mod tests;
