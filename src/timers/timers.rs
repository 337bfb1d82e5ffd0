use std::collections::HashMap;
use std::time::Duration;

cfg_if::cfg_if! {
    if #[cfg(target_family = "wasm")] {
        use web_time::Instant;
    } else {
        use std::time::Instant;
    }
}

// A single named timer.  Nested timers started while this
// one is current are recorded as its children.
#[derive(Debug, Default)]
struct TimerNode {
    start: Option<Instant>,
    elapsed: Duration,
    children: HashMap<&'static str, TimerNode>,
}

impl TimerNode {
    fn reset(&mut self) {
        self.start = None;
        self.elapsed = Duration::ZERO;
        self.children.clear();
    }

    fn start(&mut self) {
        self.start = Some(Instant::now());
    }

    fn stop(&mut self) {
        if let Some(instant) = self.start.take() {
            self.elapsed += instant.elapsed();
        }
    }

    // bank elapsed time for this timer and anything running
    // beneath it, leaving the running flag in place
    fn suspend(&mut self) {
        if let Some(instant) = self.start {
            self.elapsed += instant.elapsed();
            self.children.values_mut().for_each(|t| t.suspend());
        }
    }

    fn resume(&mut self) {
        if self.start.is_some() {
            self.start = Some(Instant::now());
            self.children.values_mut().for_each(|t| t.resume());
        }
    }

    fn children_total(&self) -> Duration {
        self.children.values().map(|t| t.elapsed).sum()
    }
}

/// Nested wall clock timers, keyed by static names.
#[derive(Debug, Default)]
pub struct Timers {
    stack: Vec<&'static str>,
    root: TimerNode,
}

impl Timers {
    fn current(&mut self) -> &mut TimerNode {
        let mut node = &mut self.root;
        for key in self.stack.iter() {
            node = node.children.entry(*key).or_default();
        }
        node
    }

    /// Clear a top level timer and everything beneath it
    pub fn reset_timer(&mut self, key: &'static str) {
        self.root.children.entry(key).or_default().reset();
    }

    /// Start `key` as a child of the currently running timer
    pub fn start_as_current(&mut self, key: &'static str) {
        self.current().children.entry(key).or_default().start();
        self.stack.push(key);
    }

    pub fn stop_current(&mut self) {
        assert!(!self.stack.is_empty(), "no timer is running");
        self.current().stop();
        self.stack.pop();
    }

    pub fn suspend(&mut self) {
        self.root.children.values_mut().for_each(|t| t.suspend());
    }

    pub fn resume(&mut self) {
        self.root.children.values_mut().for_each(|t| t.resume());
    }

    /// elapsed time of a top level timer
    pub fn elapsed(&self, key: &'static str) -> Duration {
        self.root
            .children
            .get(key)
            .map_or(Duration::ZERO, |t| t.elapsed)
    }

    pub fn total_time(&self) -> Duration {
        self.root.children_total()
    }
}

// Run a block of statements under the named timer
macro_rules! timeit {
    ($timer:ident => $key:literal; $($tt:tt)+) => {
        $timer.start_as_current($key);
        $(
            $tt
        )+
        $timer.stop_current();
    }
}
pub(crate) use timeit;

// Run a block of statements with all timers paused
macro_rules! notimeit {
    ($timer:ident; $($tt:tt)+) => {
        $timer.suspend();
        $(
            $tt
        )+
        $timer.resume();
    }
}
pub(crate) use notimeit;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_nested_timers() {
        let mut timers = Timers::default();

        timeit! {timers => "outer";
            timeit! {timers => "inner";
                std::thread::sleep(Duration::from_millis(2));
            }
        }

        let outer = timers.elapsed("outer");
        assert!(outer >= Duration::from_millis(2));
        assert_eq!(timers.elapsed("inner"), Duration::ZERO); // not top level
        assert_eq!(timers.total_time(), outer);

        timers.reset_timer("outer");
        assert_eq!(timers.elapsed("outer"), Duration::ZERO);
    }

    #[test]
    fn test_suspended_time_is_excluded() {
        let mut timers = Timers::default();
        timeit! {timers => "work";
            notimeit! {timers;
                std::thread::sleep(Duration::from_millis(20));
            }
        }
        assert!(timers.elapsed("work") < Duration::from_millis(20));
    }
}
