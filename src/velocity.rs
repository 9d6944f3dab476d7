// Velocity estimation from odometry pose
//
// Backward finite difference over the two most recent pose samples.
// Not meant for concurrent updates: the cycle-owning task holds the estimator.

use std::f64::consts::PI;
use std::time::Instant;

use tracing::{debug, warn};

use crate::messages::{PoseSample, VelocityEstimate};

/// Source of the robot's current absolute pose (odometry)
pub trait PoseSource {
    fn current_pose(&self) -> PoseSample;
}

/// Monotonic millisecond clock
pub trait Clock {
    fn now_ms(&self) -> i64;
}

/// Clock backed by `Instant`, counting from construction
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    start: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> i64 {
        self.start.elapsed().as_millis() as i64
    }
}

/// Wrap an angle into (-PI, PI]
pub fn wrap_angle(angle: f64) -> f64 {
    let wrapped = (angle + PI).rem_euclid(2.0 * PI) - PI;
    if wrapped == -PI { PI } else { wrapped }
}

/// Finite-difference velocity estimator
#[derive(Debug, Clone)]
pub struct VelocityEstimator {
    prev_x: f64,
    prev_y: f64,
    prev_heading: f64,
    prev_timestamp_ms: i64,
    latest: VelocityEstimate,
    wrap_heading: bool,
}

impl VelocityEstimator {
    /// Create an estimator with a zeroed pose, referenced to `start_ms`
    pub fn new(start_ms: i64) -> Self {
        Self {
            prev_x: 0.0,
            prev_y: 0.0,
            prev_heading: 0.0,
            prev_timestamp_ms: start_ms,
            latest: VelocityEstimate::default(),
            wrap_heading: false,
        }
    }

    /// Wrap the heading difference into (-PI, PI] before differentiating.
    ///
    /// Off by default: a raw heading jump from +PI to -PI then shows up as a
    /// large angular velocity spike.
    pub fn with_heading_wrap(mut self, enabled: bool) -> Self {
        self.wrap_heading = enabled;
        self
    }

    /// Reset the time reference and zero the stored pose and estimate
    pub fn init(&mut self, now_ms: i64) {
        debug!("Velocity estimator reset at t={}ms", now_ms);
        self.prev_x = 0.0;
        self.prev_y = 0.0;
        self.prev_heading = 0.0;
        self.prev_timestamp_ms = now_ms;
        self.latest = VelocityEstimate::default();
    }

    /// Take `pose` as the previous sample without producing an estimate.
    ///
    /// Used for the first odometry sample, whose timestamp shares no reference
    /// with the construction time.
    pub fn seed(&mut self, pose: &PoseSample) {
        debug!("Velocity estimator seeded at t={}ms", pose.timestamp_ms);
        self.prev_x = pose.x;
        self.prev_y = pose.y;
        self.prev_heading = pose.heading_rad;
        self.prev_timestamp_ms = pose.timestamp_ms;
    }

    /// Differentiate `pose` against the previous sample.
    ///
    /// A non-positive time delta leaves all state untouched and returns the
    /// previous estimate.
    pub fn update(&mut self, pose: &PoseSample, now_ms: i64) -> VelocityEstimate {
        let dt_ms = now_ms - self.prev_timestamp_ms;
        if dt_ms <= 0 {
            warn!(
                "Skipping velocity update: dt={}ms (prev t={}ms, now t={}ms)",
                dt_ms, self.prev_timestamp_ms, now_ms
            );
            return self.latest;
        }

        let dt = dt_ms as f64;
        let mut d_heading = pose.heading_rad - self.prev_heading;
        if self.wrap_heading {
            d_heading = wrap_angle(d_heading);
        }

        self.latest = VelocityEstimate {
            x_vel: 1000.0 * (pose.x - self.prev_x) / dt,
            y_vel: 1000.0 * (pose.y - self.prev_y) / dt,
            angular_vel: 1000.0 * d_heading / dt,
        };

        self.prev_x = pose.x;
        self.prev_y = pose.y;
        self.prev_heading = pose.heading_rad;
        self.prev_timestamp_ms = now_ms;

        self.latest
    }

    /// Read the pose from `source` and the time from `clock`, then update
    pub fn update_from<P: PoseSource, C: Clock>(
        &mut self,
        source: &P,
        clock: &C,
    ) -> VelocityEstimate {
        let pose = source.current_pose();
        self.update(&pose, clock.now_ms())
    }

    /// Most recent estimate
    pub fn latest(&self) -> VelocityEstimate {
        self.latest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    const EPS: f64 = 1e-9;

    fn pose(x: f64, y: f64, heading: f64) -> PoseSample {
        PoseSample::new(x, y, heading, 0)
    }

    #[test]
    fn test_forward_ten_units_per_second() {
        // (0,0,0)@0ms -> (10,0,0)@1000ms
        let mut est = VelocityEstimator::new(0);
        let v = est.update(&pose(10.0, 0.0, 0.0), 1000);
        assert!((v.x_vel - 10.0).abs() < EPS, "x_vel was {}", v.x_vel);
        assert_eq!(v.y_vel, 0.0);
        assert_eq!(v.angular_vel, 0.0);
    }

    #[test]
    fn test_zero_motion_is_zero_velocity() {
        let mut est = VelocityEstimator::new(0);
        est.update(&pose(3.0, -4.0, 1.2), 20);
        for dt in [1, 7, 20, 500] {
            let mut e = est.clone();
            let v = e.update(&pose(3.0, -4.0, 1.2), 20 + dt);
            assert_eq!(v, VelocityEstimate::default(), "dt={}ms", dt);
        }
    }

    #[test]
    fn test_halving_dt_doubles_velocity() {
        let mut base = VelocityEstimator::new(0);
        base.update(&pose(1.0, 1.0, 0.1), 100);

        let slow = base.clone().update(&pose(2.0, 3.0, 0.4), 140);
        let fast = base.clone().update(&pose(2.0, 3.0, 0.4), 120);

        assert!((fast.x_vel - 2.0 * slow.x_vel).abs() < EPS);
        assert!((fast.y_vel - 2.0 * slow.y_vel).abs() < EPS);
        assert!((fast.angular_vel - 2.0 * slow.angular_vel).abs() < EPS);
    }

    #[test]
    fn test_zero_dt_retains_previous_estimate() {
        let mut est = VelocityEstimator::new(0);
        let first = est.update(&pose(5.0, 0.0, 0.0), 500);

        // Same timestamp: no NaN/inf, estimate and reference unchanged
        let repeat = est.update(&pose(50.0, 0.0, 0.0), 500);
        assert_eq!(repeat, first);
        assert!(repeat.x_vel.is_finite());

        // Time going backwards is treated the same way
        let back = est.update(&pose(50.0, 0.0, 0.0), 400);
        assert_eq!(back, first);

        // Next valid update still differentiates against the t=500 sample
        let next = est.update(&pose(6.0, 0.0, 0.0), 600);
        assert!((next.x_vel - 10.0).abs() < EPS, "x_vel was {}", next.x_vel);
    }

    #[test]
    fn test_first_update_at_reference_time_is_guarded() {
        let mut est = VelocityEstimator::new(1234);
        let v = est.update(&pose(1.0, 1.0, 1.0), 1234);
        assert_eq!(v, VelocityEstimate::default());
        assert_eq!(est.latest(), VelocityEstimate::default());
    }

    #[test]
    fn test_init_resets_reference() {
        let mut est = VelocityEstimator::new(0);
        est.update(&pose(10.0, 0.0, 0.0), 100);
        est.init(1000);
        assert_eq!(est.latest(), VelocityEstimate::default());

        // Differentiates against a zeroed pose at t=1000
        let v = est.update(&pose(2.0, 0.0, 0.0), 1200);
        assert!((v.x_vel - 10.0).abs() < EPS, "x_vel was {}", v.x_vel);
    }

    #[test]
    fn test_heading_wraparound_unwrapped_by_default() {
        let mut est = VelocityEstimator::new(0);
        est.update(&pose(0.0, 0.0, PI - 0.01), 100);
        let v = est.update(&pose(0.0, 0.0, -PI + 0.01), 200);
        // Raw difference of almost -2*PI over 100ms
        assert!(v.angular_vel < -60.0, "angular_vel was {}", v.angular_vel);
    }

    #[test]
    fn test_heading_wraparound_with_wrap() {
        let mut est = VelocityEstimator::new(0).with_heading_wrap(true);
        est.update(&pose(0.0, 0.0, PI - 0.01), 100);
        let v = est.update(&pose(0.0, 0.0, -PI + 0.01), 200);
        assert!((v.angular_vel - 0.2).abs() < 1e-6, "angular_vel was {}", v.angular_vel);
    }

    #[test]
    fn test_wrap_angle_range() {
        assert!((wrap_angle(0.0)).abs() < EPS);
        assert!((wrap_angle(PI) - PI).abs() < EPS);
        assert!((wrap_angle(-PI) - PI).abs() < EPS);
        assert!((wrap_angle(3.0 * PI / 2.0) + PI / 2.0).abs() < EPS);
        assert!((wrap_angle(-5.0 * PI / 2.0) + PI / 2.0).abs() < EPS);
    }

    #[test]
    fn test_seed_sets_reference_without_estimate() {
        let mut est = VelocityEstimator::new(0);
        est.seed(&PoseSample::new(100.0, 50.0, 1.0, 90_000));
        assert_eq!(est.latest(), VelocityEstimate::default());

        let v = est.update(&pose(101.0, 50.0, 1.0), 90_100);
        assert!((v.x_vel - 10.0).abs() < EPS, "x_vel was {}", v.x_vel);
        assert_eq!(v.y_vel, 0.0);
        assert_eq!(v.angular_vel, 0.0);
    }

    struct FixedPose(PoseSample);

    impl PoseSource for FixedPose {
        fn current_pose(&self) -> PoseSample {
            self.0
        }
    }

    struct ManualClock(Cell<i64>);

    impl Clock for ManualClock {
        fn now_ms(&self) -> i64 {
            self.0.get()
        }
    }

    #[test]
    fn test_update_from_collaborators() {
        let source = FixedPose(pose(0.0, 4.0, 0.5));
        let clock = ManualClock(Cell::new(250));
        let mut est = VelocityEstimator::new(0);

        let v = est.update_from(&source, &clock);
        assert!((v.y_vel - 16.0).abs() < EPS, "y_vel was {}", v.y_vel);
        assert!((v.angular_vel - 2.0).abs() < EPS, "angular_vel was {}", v.angular_vel);

        clock.0.set(500);
        let v = est.update_from(&source, &clock);
        assert_eq!(v, VelocityEstimate::default());
    }

    #[test]
    fn test_monotonic_clock_does_not_go_backwards() {
        let clock = MonotonicClock::new();
        let a = clock.now_ms();
        let b = clock.now_ms();
        assert!(a >= 0 && b >= a);
    }
}
