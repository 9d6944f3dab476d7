// Loop rate, watchdog, topics, drivetrain gains
use std::time::Duration;

// Runtime loop frequency
pub const LOOP_HZ: u64 = 50;

// Command timeout for watchdog
pub const CMD_TIMEOUT: Duration = Duration::from_millis(250);

// Zenoh topics
pub const TOPIC_CMD_DRIVE: &str = "mecanum/cmd/drive"; // operator / planner commands
pub const TOPIC_POSE: &str = "mecanum/state/pose"; // odometry pose samples
pub const TOPIC_RT_MOTORS: &str = "mecanum/rt/motors"; // motor powers
pub const TOPIC_VELOCITY: &str = "mecanum/state/velocity"; // velocity estimate
pub const TOPIC_HEALTH: &str = "mecanum/state/health"; // health status

// Drivetrain mixing gains
pub const POWER_SCALE: f64 = 0.6; // applied to every mixed power
pub const MECANUM_SCALE: f64 = 1.4; // strafe compensation for roller slip
pub const SLOW_SCALE: f64 = 0.3; // compounds with POWER_SCALE in slow mode
