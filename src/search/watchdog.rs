use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

/// Cooperative limit on how much work a [Search](crate::Search) does before yielding.
///
/// Searches [`tick`](Watchdog::tick) once before taking each node off the open set and once
/// after processing each neighbor. Returning `false` suspends the search at that point; it
/// can be resumed later without losing or repeating work.
pub trait Watchdog {
    fn tick(&mut self) -> bool;
}

impl<W: Watchdog + ?Sized> Watchdog for &mut W {
    #[inline]
    fn tick(&mut self) -> bool {
        (**self).tick()
    }
}

/// Never stops.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unbounded;

impl Watchdog for Unbounded {
    #[inline]
    fn tick(&mut self) -> bool {
        true
    }
}

/// Allows a fixed number of steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepBudget {
    remaining: u64,
}

impl StepBudget {
    pub fn new(steps: u64) -> Self {
        Self { remaining: steps }
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }
}

impl Watchdog for StepBudget {
    #[inline]
    fn tick(&mut self) -> bool {
        match self.remaining.checked_sub(1) {
            Some(rest) => {
                self.remaining = rest;
                true
            }
            None => false,
        }
    }
}

/// Stops once a point in time has passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline(pub Instant);

impl Deadline {
    pub fn after(budget: Duration) -> Self {
        Self(Instant::now() + budget)
    }
}

impl Watchdog for Deadline {
    #[inline]
    fn tick(&mut self) -> bool {
        Instant::now() < self.0
    }
}

/// Stops once any clone of the token is cancelled.
#[derive(Debug, Default, Clone)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

impl Watchdog for CancelToken {
    #[inline]
    fn tick(&mut self) -> bool {
        !self.is_cancelled()
    }
}
