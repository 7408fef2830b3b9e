use std::time::Duration;

use tracing::debug;

use super::MediaBackend;
use crate::error::Result;
use crate::time::{step_count, step_position};

/// An in-flight move of a backend from one position to another.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeJob {
    from: f64,
    to: f64,
    kind: RangeKind,
}

#[derive(Debug, Clone, PartialEq)]
enum RangeKind {
    Native {
        rate: f64,
        tolerance: f64,
        last_tick: Duration,
    },
    Stepped {
        step: f64,
        interval: Duration,
        total: u64,
        taken: u64,
        next_due: Duration,
    },
}

/// Positions reached during one [`RangeJob::poll`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RangePoll {
    pub progress: Vec<f64>,
    pub done: bool,
}

impl RangeJob {
    pub(crate) fn native(from: f64, to: f64, rate: f64, tolerance: f64, now: Duration) -> Self {
        Self {
            from,
            to,
            kind: RangeKind::Native {
                rate,
                tolerance: tolerance.max(0.0),
                last_tick: now,
            },
        }
    }

    pub(crate) fn stepped(from: f64, to: f64, step: f64, interval: Duration, now: Duration) -> Self {
        Self {
            from,
            to,
            kind: RangeKind::Stepped {
                step,
                interval,
                total: step_count(from, to, step),
                taken: 0,
                next_due: now + interval,
            },
        }
    }

    pub fn from(&self) -> f64 {
        self.from
    }

    pub fn to(&self) -> f64 {
        self.to
    }

    pub fn is_native(&self) -> bool {
        matches!(self.kind, RangeKind::Native { .. })
    }

    /// Number of discrete steps, `None` for native playback.
    pub fn total_steps(&self) -> Option<u64> {
        match self.kind {
            RangeKind::Stepped { total, .. } => Some(total),
            RangeKind::Native { .. } => None,
        }
    }

    /// Drives the job up to `now`.
    ///
    /// Stepped jobs catch up on every step that fell due since the last poll.
    /// Native jobs advance the backend clock, and once the position crosses
    /// the target minus tolerance they stop playback and seek exactly to it.
    pub fn poll<B: MediaBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        now: Duration,
    ) -> Result<RangePoll> {
        let mut poll = RangePoll::default();
        match &mut self.kind {
            RangeKind::Stepped {
                step,
                interval,
                total,
                taken,
                next_due,
            } => {
                while *taken < *total && now >= *next_due {
                    *taken += 1;
                    let position = step_position(self.from, self.to, *step, *taken, *total);
                    backend.seek_to(position)?;
                    poll.progress.push(position);
                    *next_due += *interval;
                }
                poll.done = *taken >= *total;
            }
            RangeKind::Native {
                rate,
                tolerance,
                last_tick,
            } => {
                let elapsed = now.saturating_sub(*last_tick);
                *last_tick = now;
                backend.advance(elapsed);

                let position = backend.position();
                let reached = if *rate >= 0.0 {
                    position >= self.to - *tolerance
                } else {
                    position <= self.to + *tolerance
                };
                if reached || !backend.is_playing() {
                    debug!(position, target = self.to, "native playback reached target");
                    backend.stop_native();
                    backend.seek_to(self.to)?;
                    poll.progress.push(self.to);
                    poll.done = true;
                } else {
                    poll.progress.push(position);
                }
            }
        }
        Ok(poll)
    }

    /// Stops whatever the job started on `backend`.
    pub fn cancel<B: MediaBackend + ?Sized>(&self, backend: &mut B) {
        if self.is_native() {
            backend.stop_native();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::RangeJob;
    use crate::error::{EngineError, Result};
    use crate::media::{Frame, LoadStatus, MediaBackend};

    /// Clock-only backend: one unit of position per second of native play.
    #[derive(Default)]
    struct ClockBackend {
        position: f64,
        rate: f64,
        playing: bool,
        seeks: Vec<f64>,
    }

    impl MediaBackend for ClockBackend {
        fn poll_load(&mut self) -> LoadStatus {
            LoadStatus::Ready
        }

        fn is_ready(&self) -> bool {
            true
        }

        fn extent(&self) -> Option<f64> {
            Some(40.0)
        }

        fn step_size(&self) -> f64 {
            0.04
        }

        fn step_interval(&self) -> Duration {
            Duration::from_millis(40)
        }

        fn default_tolerance(&self) -> f64 {
            0.02
        }

        fn position(&self) -> f64 {
            self.position
        }

        fn seek_to(&mut self, position: f64) -> Result<()> {
            self.position = position.clamp(0.0, 40.0);
            self.seeks.push(self.position);
            Ok(())
        }

        fn start_native(&mut self, rate: f64) -> Result<()> {
            if rate < 0.0 {
                return Err(EngineError::NativePlaybackUnsupported { rate });
            }
            self.rate = rate;
            self.playing = true;
            Ok(())
        }

        fn stop_native(&mut self) {
            self.playing = false;
        }

        fn is_playing(&self) -> bool {
            self.playing
        }

        fn advance(&mut self, elapsed: Duration) {
            if self.playing {
                self.position += self.rate * elapsed.as_secs_f64();
            }
        }

        fn current_frame(&mut self) -> Option<Frame> {
            None
        }

        fn release(&mut self) {}
    }

    #[test]
    fn stepped_job_walks_72_steps_and_lands_exactly_on_target() {
        let mut backend = ClockBackend {
            position: 10.0,
            ..ClockBackend::default()
        };
        let mut job = backend
            .step_range(10.0, 7.12, Duration::ZERO)
            .expect("step range should start");
        assert_eq!(job.total_steps(), Some(72));

        let mut steps = Vec::new();
        let mut now = Duration::ZERO;
        loop {
            now += Duration::from_millis(40);
            let poll = job.poll(&mut backend, now).expect("poll should succeed");
            steps.extend(poll.progress);
            if poll.done {
                break;
            }
        }

        assert_eq!(steps.len(), 72);
        assert_eq!(steps.last().copied(), Some(7.12));
        assert_eq!(backend.position, 7.12);
        assert!(steps.windows(2).all(|pair| pair[1] < pair[0]));
    }

    #[test]
    fn stepped_job_catches_up_on_late_polls() {
        let mut backend = ClockBackend::default();
        let mut job = backend
            .step_range(0.0, 0.2, Duration::ZERO)
            .expect("step range should start");

        let early = job
            .poll(&mut backend, Duration::from_millis(39))
            .expect("poll should succeed");
        assert!(early.progress.is_empty());

        let late = job
            .poll(&mut backend, Duration::from_millis(125))
            .expect("poll should succeed");
        assert_eq!(late.progress.len(), 3);
        assert!(!late.done);
    }

    #[test]
    fn native_job_snaps_to_target_within_tolerance() {
        let mut backend = ClockBackend::default();
        let mut job = backend
            .play_range(0.0, 1.0, Duration::ZERO)
            .expect("native play should start");
        assert!(job.is_native());

        let mid = job
            .poll(&mut backend, Duration::from_millis(500))
            .expect("poll should succeed");
        assert!(!mid.done);

        let end = job
            .poll(&mut backend, Duration::from_millis(985))
            .expect("poll should succeed");
        assert!(end.done);
        assert_eq!(end.progress.last().copied(), Some(1.0));
        assert_eq!(backend.position, 1.0);
        assert!(!backend.playing);
    }

    #[test]
    fn play_range_reports_unsupported_rate() {
        let mut backend = ClockBackend {
            position: 5.0,
            ..ClockBackend::default()
        };
        let result = backend.play_range(5.0, 2.0, Duration::ZERO);
        assert!(matches!(
            result,
            Err(EngineError::NativePlaybackUnsupported { .. })
        ));
        assert!(backend.seeks.is_empty());
    }
}
