// Message types exchanged with odometry, teleop and motor collaborators

use std::fmt;

use serde::{Deserialize, Serialize};

// Command from teleop/planner -> runtime
// Axes are nominally in [-1, 1] but never clamped here; the mixer normalizes
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DriveCommand {
    pub forward: f64,
    pub strafe: f64,
    pub rotate: f64,
    #[serde(default)]
    pub slow_mode: bool,
}

impl DriveCommand {
    pub fn new(forward: f64, strafe: f64, rotate: f64) -> Self {
        Self {
            forward,
            strafe,
            rotate,
            slow_mode: false,
        }
    }

    pub fn stopped() -> Self {
        Self::default()
    }
}

/// Absolute pose from odometry, timestamped with monotonic milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PoseSample {
    pub x: f64,
    pub y: f64,
    pub heading_rad: f64,
    pub timestamp_ms: i64,
}

impl PoseSample {
    pub fn new(x: f64, y: f64, heading_rad: f64, timestamp_ms: i64) -> Self {
        Self {
            x,
            y,
            heading_rad,
            timestamp_ms,
        }
    }
}

/// Linear (units/s) and angular (rad/s) velocity
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct VelocityEstimate {
    pub x_vel: f64,
    pub y_vel: f64,
    pub angular_vel: f64,
}

// Telemetry block, same labels the driver station shows
impl fmt::Display for VelocityEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "---VELOCITY---")?;
        writeln!(f, "xVel: {}", self.x_vel)?;
        writeln!(f, "yVel: {}", self.y_vel)?;
        write!(f, "angleVel: {}", self.angular_vel)
    }
}

/// Four mecanum wheel powers, each in [-1, 1]
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MotorPowerSet {
    pub front_left: f64,
    pub front_right: f64,
    pub back_left: f64,
    pub back_right: f64,
}

impl MotorPowerSet {
    pub fn new(front_left: f64, front_right: f64, back_left: f64, back_right: f64) -> Self {
        Self {
            front_left,
            front_right,
            back_left,
            back_right,
        }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    /// Returns powers as array [front_left, front_right, back_left, back_right]
    pub fn as_array(&self) -> [f64; 4] {
        [
            self.front_left,
            self.front_right,
            self.back_left,
            self.back_right,
        ]
    }

    /// Largest absolute power of the four
    pub fn max_magnitude(&self) -> f64 {
        self.as_array().iter().fold(0.0f64, |acc, p| acc.max(p.abs()))
    }
}

/// Health status published by runtime
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeHealth {
    Ok,
    CmdStale,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drive_command_slow_mode_defaults_off() {
        let cmd: DriveCommand =
            serde_json::from_str(r#"{"forward":0.5,"strafe":0.0,"rotate":-0.25}"#).unwrap();
        assert_eq!(cmd, DriveCommand::new(0.5, 0.0, -0.25));
        assert!(!cmd.slow_mode);
    }

    #[test]
    fn test_health_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&RuntimeHealth::Ok).unwrap(), "\"ok\"");
        assert_eq!(
            serde_json::to_string(&RuntimeHealth::CmdStale).unwrap(),
            "\"cmd_stale\""
        );
    }

    #[test]
    fn test_velocity_telemetry_block() {
        let est = VelocityEstimate {
            x_vel: 10.0,
            y_vel: -2.5,
            angular_vel: 0.0,
        };
        let text = est.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec!["---VELOCITY---", "xVel: 10", "yVel: -2.5", "angleVel: 0"]
        );
    }

    #[test]
    fn test_max_magnitude() {
        let powers = MotorPowerSet::new(-1.4, 1.4, 0.2, -0.7);
        assert_eq!(powers.max_magnitude(), 1.4);
        assert_eq!(MotorPowerSet::zero().max_magnitude(), 0.0);
    }
}
