//! 定时刷新
//!
//! 每个 tick: 记录开始时间 -> 渲染 -> 发布 -> 只睡剩余的时间, 所以探针耗时不会累积成漂移。
//! 退出信号只在 tick 之间检查, 正在进行的 tick 总会完整发布。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::bar::{ProviderTable, Renderer};
use crate::error::{Error, Result};
use crate::publish::Publisher;

#[derive(Debug, Default)]
struct ShutdownState {
    requested: AtomicBool,
    lock: Mutex<()>,
    wakeup: Condvar,
}

/// 协作式退出标志, 可以跨线程克隆
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    state: Arc<ShutdownState>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// SIGINT / SIGTERM 都会请求退出
    pub fn install_signal_handler(&self) -> Result<()> {
        let shutdown = self.clone();
        ctrlc::set_handler(move || shutdown.request()).map_err(|err| Error::Signal(err.to_string()))
    }

    pub fn request(&self) {
        self.state.requested.store(true, Ordering::SeqCst);
        let _guard = self.state.lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.state.wakeup.notify_all();
    }

    pub fn is_requested(&self) -> bool {
        self.state.requested.load(Ordering::SeqCst)
    }

    /// 最多等待 `timeout`, 期间收到退出请求会提前返回; 返回是否已请求退出
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let guard = self.state.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = self
            .state
            .wakeup
            .wait_timeout_while(guard, timeout, |_| !self.is_requested())
            .unwrap_or_else(PoisonError::into_inner);
        self.is_requested()
    }
}

/// 本轮还需要睡多久, 已经超时则不睡
pub fn remaining(interval: Duration, elapsed: Duration) -> Option<Duration> {
    interval.checked_sub(elapsed).filter(|rest| !rest.is_zero())
}

pub struct Scheduler<P: Publisher> {
    table: ProviderTable,
    renderer: Renderer,
    publisher: P,
    interval: Duration,
    shutdown: Shutdown,
}

impl<P: Publisher> Scheduler<P> {
    pub fn new(table: ProviderTable, renderer: Renderer, publisher: P, interval: Duration, shutdown: Shutdown) -> Self {
        Self { table, renderer, publisher, interval, shutdown }
    }

    /// 渲染并发布一次, 返回发布的内容
    pub fn tick(&mut self) -> Result<String> {
        let line = self.renderer.render(&mut self.table);
        self.publisher.publish(&line)?;
        Ok(line)
    }

    /// 一直运行到收到退出请求, 退出前清除已发布的内容; 返回执行的 tick 数
    ///
    /// 发布失败时同样会尝试清除, 然后返回发布错误。
    pub fn run(&mut self) -> Result<u64> {
        info!(
            providers = self.table.len(),
            interval_ms = self.interval.as_millis() as u64,
            "status loop started"
        );

        let outcome = self.tick_until_shutdown();
        match &outcome {
            Ok(ticks) => info!(ticks, "status loop stopped"),
            Err(err) => debug!("status loop aborted: {}", err),
        }

        let cleared = self.publisher.clear();
        let ticks = outcome?;
        cleared?;
        Ok(ticks)
    }

    fn tick_until_shutdown(&mut self) -> Result<u64> {
        let mut ticks = 0u64;
        while !self.shutdown.is_requested() {
            let started = Instant::now();
            self.tick()?;
            ticks += 1;

            if self.shutdown.is_requested() {
                break;
            }
            match remaining(self.interval, started.elapsed()) {
                Some(rest) => {
                    if self.shutdown.wait_timeout(rest) {
                        break;
                    }
                }
                None => debug!(elapsed = ?started.elapsed(), "tick overran the interval"),
            }
        }
        Ok(ticks)
    }

    #[cfg(test)]
    fn into_publisher(self) -> P {
        self.publisher
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bar::tests::provider;
    use crate::probe::Sample;
    use std::io;
    use std::thread;

    /// 记录每次发布的时间和内容, 达到指定次数后请求退出
    #[derive(Default)]
    struct Recorder {
        published: Vec<(Instant, String)>,
        cleared: bool,
        stop_after: Option<(usize, Shutdown)>,
        fail_at: Option<usize>,
    }

    impl Publisher for Recorder {
        fn publish(&mut self, line: &str) -> Result<()> {
            if self.fail_at == Some(self.published.len()) {
                return Err(Error::Publish(io::Error::new(io::ErrorKind::BrokenPipe, "closed")));
            }
            self.published.push((Instant::now(), line.to_string()));
            if let Some((limit, shutdown)) = &self.stop_after {
                if self.published.len() >= *limit {
                    shutdown.request();
                }
            }
            Ok(())
        }

        fn clear(&mut self) -> Result<()> {
            self.cleared = true;
            Ok(())
        }
    }

    fn constant(_: Option<&str>) -> Sample {
        Ok("ok".to_string())
    }

    #[test]
    fn remaining_never_negative() {
        let interval = Duration::from_millis(100);
        assert_eq!(remaining(interval, Duration::from_millis(30)), Some(Duration::from_millis(70)));
        assert_eq!(remaining(interval, Duration::from_millis(100)), None);
        assert_eq!(remaining(interval, Duration::from_millis(250)), None);
    }

    #[test]
    fn single_tick_publishes_rendered_line() {
        let table = ProviderTable::new(vec![provider(constant, "cpu %s", None)]);
        let mut scheduler = Scheduler::new(
            table,
            Renderer::new("?", 64),
            Recorder::default(),
            Duration::from_millis(10),
            Shutdown::new(),
        );
        assert_eq!(scheduler.tick().unwrap(), "cpu ok");
        let recorder = scheduler.into_publisher();
        assert_eq!(recorder.published.len(), 1);
        assert!(!recorder.cleared);
    }

    #[test]
    fn period_does_not_accumulate_probe_latency() {
        let interval = Duration::from_millis(100);
        let latency = Duration::from_millis(40);
        let slow = move |_: Option<&str>| -> Sample {
            thread::sleep(latency);
            Ok("slow".to_string())
        };

        let shutdown = Shutdown::new();
        let recorder = Recorder { stop_after: Some((5, shutdown.clone())), ..Recorder::default() };
        let table = ProviderTable::new(vec![provider(slow, "%s", None)]);
        let mut scheduler = Scheduler::new(table, Renderer::new("?", 64), recorder, interval, shutdown);

        assert_eq!(scheduler.run().unwrap(), 5);
        let recorder = scheduler.into_publisher();
        let first = recorder.published.first().unwrap().0;
        let last = recorder.published.last().unwrap().0;
        let average = (last - first) / 4;
        // drifting loop would average interval + latency = 140ms
        assert!(average >= Duration::from_millis(95), "average period {:?}", average);
        assert!(average < Duration::from_millis(125), "average period {:?}", average);
    }

    #[test]
    fn overrunning_ticks_start_immediately() {
        let interval = Duration::from_millis(10);
        let slow = |_: Option<&str>| -> Sample {
            thread::sleep(Duration::from_millis(30));
            Ok("x".to_string())
        };
        let shutdown = Shutdown::new();
        let recorder = Recorder { stop_after: Some((3, shutdown.clone())), ..Recorder::default() };
        let table = ProviderTable::new(vec![provider(slow, "%s", None)]);
        let mut scheduler = Scheduler::new(table, Renderer::new("?", 64), recorder, interval, shutdown);

        let started = Instant::now();
        assert_eq!(scheduler.run().unwrap(), 3);
        // three probe runs and no sleeping
        assert!(started.elapsed() < Duration::from_millis(200));
    }

    #[test]
    fn shutdown_during_render_finishes_the_tick_then_clears() {
        let shutdown = Shutdown::new();
        let signal = shutdown.clone();
        let interrupted = move |_: Option<&str>| -> Sample {
            signal.request();
            Ok("last".to_string())
        };
        let table = ProviderTable::new(vec![
            provider(interrupted, "%s ", None),
            provider(constant, "%s", None),
        ]);
        let mut scheduler = Scheduler::new(
            table,
            Renderer::new("?", 64),
            Recorder::default(),
            Duration::from_secs(60),
            shutdown,
        );

        assert_eq!(scheduler.run().unwrap(), 1);
        let recorder = scheduler.into_publisher();
        assert_eq!(recorder.published.len(), 1);
        assert_eq!(recorder.published[0].1, "last ok");
        assert!(recorder.cleared);
    }

    #[test]
    fn shutdown_during_sleep_wakes_the_loop() {
        let shutdown = Shutdown::new();
        let table = ProviderTable::new(vec![provider(constant, "%s", None)]);
        let mut scheduler = Scheduler::new(
            table,
            Renderer::new("?", 64),
            Recorder::default(),
            Duration::from_secs(60),
            shutdown.clone(),
        );

        let signal = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            shutdown.request();
        });
        let started = Instant::now();
        assert_eq!(scheduler.run().unwrap(), 1);
        assert!(started.elapsed() < Duration::from_secs(5));
        signal.join().unwrap();
        assert!(scheduler.into_publisher().cleared);
    }

    #[test]
    fn publish_failure_still_clears() {
        let recorder = Recorder { fail_at: Some(2), ..Recorder::default() };
        let table = ProviderTable::new(vec![provider(constant, "%s", None)]);
        let mut scheduler =
            Scheduler::new(table, Renderer::new("?", 64), recorder, Duration::from_millis(1), Shutdown::new());

        assert!(matches!(scheduler.run(), Err(Error::Publish(_))));
        let recorder = scheduler.into_publisher();
        assert_eq!(recorder.published.len(), 2);
        assert!(recorder.cleared);
    }

    #[test]
    fn shutdown_before_start_runs_no_ticks() {
        let shutdown = Shutdown::new();
        shutdown.request();
        let table = ProviderTable::new(vec![provider(constant, "%s", None)]);
        let mut scheduler = Scheduler::new(table, Renderer::new("?", 64), Recorder::default(), Duration::from_millis(10), shutdown);
        assert_eq!(scheduler.run().unwrap(), 0);
        assert!(scheduler.into_publisher().published.is_empty());
    }

    #[test]
    fn wait_timeout_expires_without_request() {
        let shutdown = Shutdown::new();
        assert!(!shutdown.wait_timeout(Duration::from_millis(5)));
        shutdown.request();
        assert!(shutdown.wait_timeout(Duration::from_secs(5)));
    }
}
