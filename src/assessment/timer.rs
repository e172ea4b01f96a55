// src/assessment/timer.rs

/// What a single call to [`Timer::tick`] observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// The timer is paused or stopped; nothing happened.
    Idle,
    /// One second elapsed; carries the new remaining value.
    Tick(u32),
    /// The countdown just reached zero. The timer has stopped itself.
    Expired,
}

type TickObserver = Box<dyn FnMut(u32) + Send>;
type ExpireObserver = Box<dyn FnOnce() + Send>;

/// Countdown over whole seconds.
///
/// The timer does not schedule itself: the owner calls [`tick`](Timer::tick)
/// once per elapsed second and reacts to the returned event. It knows
/// nothing about questions or scoring; its only side effects are the two
/// registered observers.
pub struct Timer {
    initial: u32,
    remaining: u32,
    running: bool,
    on_tick: Option<TickObserver>,
    on_expire: Option<ExpireObserver>,
}

impl Timer {
    pub fn new(initial_seconds: u32) -> Self {
        Self {
            initial: initial_seconds,
            remaining: initial_seconds,
            running: false,
            on_tick: None,
            on_expire: None,
        }
    }

    /// Registers an observer called with the new remaining value on every
    /// tick.
    pub fn on_tick(mut self, observer: impl FnMut(u32) + Send + 'static) -> Self {
        self.on_tick = Some(Box::new(observer));
        self
    }

    /// Registers an observer fired exactly once, when the countdown reaches
    /// zero.
    pub fn on_expire(mut self, observer: impl FnOnce() + Send + 'static) -> Self {
        self.on_expire = Some(Box::new(observer));
        self
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Starts the countdown. Starting a running timer is a no-op, as is
    /// starting one that has already reached zero.
    pub fn start(&mut self) {
        if self.remaining > 0 {
            self.running = true;
        }
    }

    /// Stops ticking without touching the remaining time.
    pub fn pause(&mut self) {
        self.running = false;
    }

    /// Stops and sets the remaining time to `new_seconds`, or back to the
    /// value the timer was created with.
    pub fn reset(&mut self, new_seconds: Option<u32>) {
        self.running = false;
        self.remaining = new_seconds.unwrap_or(self.initial);
    }

    /// Stops the countdown and zeroes the remaining time.
    pub fn stop(&mut self) {
        self.running = false;
        self.remaining = 0;
    }

    /// Advances the countdown by one elapsed second. Remaining time never
    /// goes below zero; hitting zero stops the timer and fires the expiry
    /// observer.
    pub fn tick(&mut self) -> TimerEvent {
        if !self.running {
            return TimerEvent::Idle;
        }

        self.remaining = self.remaining.saturating_sub(1);
        if let Some(observer) = self.on_tick.as_mut() {
            observer(self.remaining);
        }

        if self.remaining == 0 {
            self.running = false;
            if let Some(observer) = self.on_expire.take() {
                observer();
            }
            return TimerEvent::Expired;
        }
        TimerEvent::Tick(self.remaining)
    }
}
