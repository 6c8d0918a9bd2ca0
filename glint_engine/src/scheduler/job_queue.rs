/// Insertion-ordered, deduplicated job set drained once per tick
///
/// A job requested while it is still pending is coalesced with the pending
/// entry. A job requested again after it already ran in the current drain is
/// carried over to the next drain instead of being dropped.

use std::collections::VecDeque;
use std::hash::Hash;
use rustc_hash::FxHashSet;

pub struct JobQueue<J> {
    pending: VecDeque<J>,
    members: FxHashSet<J>,
    ran: FxHashSet<J>,
    carried: Vec<J>,
    draining: bool,
}

impl<J: Clone + Eq + Hash> JobQueue<J> {
    /// Create an empty queue
    pub fn new() -> Self {
        Self {
            pending: VecDeque::new(),
            members: FxHashSet::default(),
            ran: FxHashSet::default(),
            carried: Vec::new(),
            draining: false,
        }
    }

    /// Add a job, returns false when it was coalesced with an existing entry
    pub fn push(&mut self, job: J) -> bool {
        if self.draining && self.ran.contains(&job) {
            if self.carried.contains(&job) {
                return false;
            }
            self.carried.push(job);
            return true;
        }
        if !self.members.insert(job.clone()) {
            return false;
        }
        self.pending.push_back(job);
        true
    }

    /// Take the next job of the current drain
    pub fn pop(&mut self) -> Option<J> {
        self.draining = true;
        let job = self.pending.pop_front()?;
        self.members.remove(&job);
        self.ran.insert(job.clone());
        Some(job)
    }

    /// End the current drain, moving carried jobs back to pending
    pub fn finish(&mut self) {
        self.draining = false;
        self.ran.clear();
        for job in std::mem::take(&mut self.carried) {
            if self.members.insert(job.clone()) {
                self.pending.push_back(job);
            }
        }
    }

    /// Number of jobs waiting for a drain
    pub fn len(&self) -> usize {
        self.pending.len() + self.carried.len()
    }

    /// Whether no job is waiting
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `job` is waiting for a drain
    pub fn contains(&self, job: &J) -> bool {
        self.members.contains(job) || self.carried.contains(job)
    }

    /// Drop every pending job
    pub fn clear(&mut self) {
        self.pending.clear();
        self.members.clear();
        self.ran.clear();
        self.carried.clear();
        self.draining = false;
    }
}

impl<J: Clone + Eq + Hash> Default for JobQueue<J> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "job_queue_tests.rs"]
mod tests;
