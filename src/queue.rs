//! Bounded, ordered hand-off between the frame producer and the renderer.
//!
//! The producer admits frame `i` only while `i - drawn < lookahead`, where
//! `drawn` counts frames already taken by the renderer. A full queue parks
//! the producer on a condition variable; nothing is ever dropped or
//! overwritten, so playback can fall behind but never skips a frame.
//!
//! Closing the queue is the cancellation signal for both sides: a blocked
//! `admit` gives up, and `take` drains what is left before reporting closed.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmitError {
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TakeError {
    /// The queue was closed and every admitted frame has been taken.
    Closed,
    /// Nothing arrived before the timeout.
    TimedOut,
}

#[derive(Debug)]
struct State<T> {
    pending: VecDeque<T>,
    drawn: usize,
    closed: bool,
}

/// Single-producer, single-consumer frame queue with a lookahead limit.
#[derive(Debug)]
pub struct FrameQueue<T> {
    state: Mutex<State<T>>,
    admitted: Condvar,
    taken: Condvar,
    lookahead: usize,
}

impl<T> FrameQueue<T> {
    /// Creates a queue that lets the producer run at most `lookahead` frames
    /// ahead of the renderer. A lookahead of zero is treated as one.
    pub fn new(lookahead: usize) -> Self {
        Self {
            state: Mutex::new(State { pending: VecDeque::new(), drawn: 0, closed: false }),
            admitted: Condvar::new(),
            taken: Condvar::new(),
            lookahead: lookahead.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn lookahead(&self) -> usize {
        self.lookahead
    }

    /// Appends frame `index`, blocking while it is `lookahead` or more frames
    /// ahead of the renderer.
    ///
    /// Indices must be admitted in increasing order starting at zero.
    pub fn admit(&self, index: usize, payload: T) -> Result<(), AdmitError> {
        let guard = self.lock();
        let mut state = self
            .taken
            .wait_while(guard, |s| !s.closed && index.saturating_sub(s.drawn) >= self.lookahead)
            .unwrap_or_else(PoisonError::into_inner);
        if state.closed {
            return Err(AdmitError::Closed);
        }
        state.pending.push_back(payload);
        drop(state);
        self.admitted.notify_one();
        Ok(())
    }

    /// Removes the oldest frame, blocking until one is available.
    ///
    /// With `timeout` set, gives up with [`TakeError::TimedOut`] if the queue
    /// stays empty that long. Each successful take advances the drawn count
    /// and may release a blocked producer.
    pub fn take(&self, timeout: Option<Duration>) -> Result<T, TakeError> {
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut state = self.lock();
        loop {
            if let Some(payload) = state.pending.pop_front() {
                state.drawn += 1;
                drop(state);
                self.taken.notify_one();
                return Ok(payload);
            }
            if state.closed {
                return Err(TakeError::Closed);
            }
            state = match deadline {
                None => self.admitted.wait(state).unwrap_or_else(PoisonError::into_inner),
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(TakeError::TimedOut);
                    }
                    self.admitted
                        .wait_timeout(state, deadline - now)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                }
            };
        }
    }

    /// Wakes both sides and refuses further admissions. Frames already
    /// queued can still be taken.
    pub fn close(&self) {
        self.lock().closed = true;
        self.admitted.notify_all();
        self.taken.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Frames taken so far.
    pub fn drawn(&self) -> usize {
        self.lock().drawn
    }

    /// Frames admitted but not yet taken.
    pub fn depth(&self) -> usize {
        self.lock().pending.len()
    }
}
