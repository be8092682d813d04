//! Profiling stuff.
//!
//! In `bench` mode, `Profiler` is a unit structure and the `profile!` macro
//! expands to nothing, so all profiling is completely removed.

#[cfg(not(feature = "bench"))]
use std::cell::RefCell;
#[cfg(not(feature = "bench"))]
use std::collections::HashMap;
use std::time::Duration;
#[cfg(not(feature = "bench"))]
use std::time::Instant;

/// Extends duration with a pretty printing.
pub trait DurationExt {
    /// Nice string representation.
    fn to_str(&self) -> String;
}
impl DurationExt for Duration {
    fn to_str(&self) -> String {
        format!("{}.{:0>9}", self.as_secs(), self.subsec_nanos())
    }
}

/// Profiling structure.
///
/// Maintains scoped durations and statistics indexed by strings.
/// Internally, the structures are wrapped in `RefCell`s so that mutation
/// does not require `&mut self`.
#[cfg(not(feature = "bench"))]
pub struct Profiler {
    /// Scope-indexed durations, with the instant of the live tick if any.
    map: RefCell<HashMap<&'static str, (Option<Instant>, Duration)>>,
    /// Starting tick, for total time.
    start: Instant,
    /// Other statistics.
    stats: RefCell<HashMap<String, usize>>,
}
/// Profiling structure (deactivated).
#[cfg(feature = "bench")]
pub struct Profiler;

impl Profiler {
    /// Constructor.
    #[cfg(not(feature = "bench"))]
    pub fn new() -> Self {
        Profiler {
            map: RefCell::new(HashMap::new()),
            start: Instant::now(),
            stats: RefCell::new(HashMap::new()),
        }
    }
    /// Constructor.
    #[cfg(feature = "bench")]
    pub fn new() -> Self {
        Profiler
    }

    /// Acts on a statistic.
    #[cfg(not(feature = "bench"))]
    pub fn stat_do<F, S>(&self, stat: S, f: F)
    where
        F: Fn(usize) -> usize,
        S: Into<String>,
    {
        let stat = stat.into();
        let mut map = self.stats.borrow_mut();
        let val = map.get(&stat).cloned().unwrap_or(0);
        let _ = map.insert(stat, f(val));
    }

    /// Ticks a scope.
    #[cfg(not(feature = "bench"))]
    pub fn tick(&self, scope: &'static str) {
        let mut map = self.map.borrow_mut();
        let time = map.entry(scope).or_insert((None, Duration::from_secs(0)));
        time.0 = Some(Instant::now())
    }

    /// Registers the time since the last tick.
    ///
    /// Panics if there was no tick since the last time registration.
    #[cfg(not(feature = "bench"))]
    pub fn mark(&self, scope: &'static str) {
        let mut map = self.map.borrow_mut();
        if let Some(&mut (ref mut tick, ref mut sum)) = map.get_mut(scope) {
            let mut instant = None;
            ::std::mem::swap(&mut instant, tick);
            if let Some(instant) = instant {
                *sum += Instant::now().duration_since(instant)
            }
        } else {
            panic!("profiling: trying to mark the time without ticking first")
        }
    }

    /// Total time since the profiler was created.
    #[cfg(not(feature = "bench"))]
    pub fn total(&self) -> Duration {
        Instant::now().duration_since(self.start)
    }
    /// Total time since the profiler was created.
    #[cfg(feature = "bench")]
    pub fn total(&self) -> Duration {
        Duration::from_secs(0)
    }

    /// Prints the scoped durations and the statistics.
    #[cfg(not(feature = "bench"))]
    pub fn print(&self) {
        println!("; total {}s", self.total().to_str());
        let map = self.map.borrow();
        let mut scopes: Vec<_> = map.iter().collect();
        scopes.sort_by_key(|&(scope, _)| scope);
        for (scope, &(ref tick, ref time)) in scopes {
            debug_assert!(tick.is_none());
            println!(";   |- {}s {}", time.to_str(), scope)
        }
        let stats = self.stats.borrow();
        let mut stats: Vec<_> = stats.iter().collect();
        stats.sort();
        for (stat, count) in stats {
            let stat_len = ::std::cmp::min(30, stat.len());
            println!(";   {0: >1$}{2}: {3: >5}", "", 30 - stat_len, stat, count)
        }
    }
    /// Prints the scoped durations and the statistics.
    #[cfg(feature = "bench")]
    pub fn print(&self) {}
}

impl Default for Profiler {
    fn default() -> Self {
        Profiler::new()
    }
}

/// Peak resident memory in megabytes, if the platform exposes it.
#[cfg(target_os = "linux")]
pub fn peak_mem_mb() -> Option<f64> {
    use std::fs;
    let status = fs::read_to_string("/proc/self/status").ok()?;
    for line in status.lines() {
        if line.starts_with("VmPeak:") {
            let kb: f64 = line
                .split_whitespace()
                .nth(1)?
                .parse()
                .ok()?;
            return Some(kb / 1024.);
        }
    }
    None
}
/// Peak resident memory in megabytes, if the platform exposes it.
#[cfg(not(target_os = "linux"))]
pub fn peak_mem_mb() -> Option<f64> {
    None
}
