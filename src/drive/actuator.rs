// Motor actuator interface for the drivetrain
//
// Hardware lookup lives outside this crate; the drivetrain only sees handles
// that are already acquired and valid.

use std::fmt;

use tracing::trace;

/// Wheel positions on the mecanum base
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WheelPosition {
    FrontLeft,
    FrontRight,
    BackLeft,
    BackRight,
}

impl WheelPosition {
    pub const ALL: [WheelPosition; 4] = [
        WheelPosition::FrontLeft,
        WheelPosition::FrontRight,
        WheelPosition::BackLeft,
        WheelPosition::BackRight,
    ];

    /// Left-side wheels are mounted mirrored and run reversed
    pub fn default_direction(self) -> Direction {
        match self {
            WheelPosition::FrontLeft | WheelPosition::BackLeft => Direction::Reverse,
            WheelPosition::FrontRight | WheelPosition::BackRight => Direction::Forward,
        }
    }
}

impl fmt::Display for WheelPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WheelPosition::FrontLeft => "front_left",
            WheelPosition::FrontRight => "front_right",
            WheelPosition::BackLeft => "back_left",
            WheelPosition::BackRight => "back_right",
        };
        f.write_str(name)
    }
}

/// Motor direction polarity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Forward,
    Reverse,
}

impl Direction {
    pub fn sign(self) -> f64 {
        match self {
            Direction::Forward => 1.0,
            Direction::Reverse => -1.0,
        }
    }
}

/// What an unpowered motor does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ZeroPowerBehavior {
    Brake,
    #[default]
    Float,
}

/// Error types for drivetrain actuation
#[derive(Debug, thiserror::Error)]
pub enum DriveError {
    #[error("Actuator {wheel} fault: {reason}")]
    ActuatorFault { wheel: WheelPosition, reason: String },

    #[error("Drivetrain used before initialization")]
    NotInitialized,
}

pub type Result<T> = std::result::Result<T, DriveError>;

/// A single drive motor
pub trait MotorActuator {
    /// Set power in [-1, 1]
    fn set_power(&mut self, power: f64) -> Result<()>;

    fn set_direction(&mut self, direction: Direction) -> Result<()>;

    fn set_zero_power_behavior(&mut self, behavior: ZeroPowerBehavior) -> Result<()>;
}

/// In-memory motor used when no hardware is attached
///
/// Records the last configuration and power so the runtime and tests can
/// inspect what would have been sent.
#[derive(Debug, Clone)]
pub struct SimulatedMotor {
    wheel: WheelPosition,
    direction: Direction,
    zero_power: ZeroPowerBehavior,
    power: f64,
}

impl SimulatedMotor {
    pub fn new(wheel: WheelPosition) -> Self {
        Self {
            wheel,
            direction: Direction::default(),
            zero_power: ZeroPowerBehavior::default(),
            power: 0.0,
        }
    }

    pub fn wheel(&self) -> WheelPosition {
        self.wheel
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn zero_power_behavior(&self) -> ZeroPowerBehavior {
        self.zero_power
    }

    /// Last commanded power, before polarity
    pub fn power(&self) -> f64 {
        self.power
    }

    /// Power as the motor would see it, after polarity
    pub fn output(&self) -> f64 {
        self.power * self.direction.sign()
    }
}

impl MotorActuator for SimulatedMotor {
    fn set_power(&mut self, power: f64) -> Result<()> {
        trace!("{}: power={:.3}", self.wheel, power);
        self.power = power;
        Ok(())
    }

    fn set_direction(&mut self, direction: Direction) -> Result<()> {
        self.direction = direction;
        Ok(())
    }

    fn set_zero_power_behavior(&mut self, behavior: ZeroPowerBehavior) -> Result<()> {
        self.zero_power = behavior;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directions() {
        assert_eq!(WheelPosition::FrontLeft.default_direction(), Direction::Reverse);
        assert_eq!(WheelPosition::BackLeft.default_direction(), Direction::Reverse);
        assert_eq!(WheelPosition::FrontRight.default_direction(), Direction::Forward);
        assert_eq!(WheelPosition::BackRight.default_direction(), Direction::Forward);
    }

    #[test]
    fn test_simulated_motor_polarity() {
        let mut motor = SimulatedMotor::new(WheelPosition::FrontLeft);
        motor.set_power(0.5).unwrap();
        assert_eq!(motor.output(), 0.5);

        motor.set_direction(Direction::Reverse).unwrap();
        assert_eq!(motor.power(), 0.5);
        assert_eq!(motor.output(), -0.5);
    }

    #[test]
    fn test_error_messages() {
        let err = DriveError::ActuatorFault {
            wheel: WheelPosition::BackRight,
            reason: "disconnected".to_string(),
        };
        assert_eq!(err.to_string(), "Actuator back_right fault: disconnected");
        assert_eq!(
            DriveError::NotInitialized.to_string(),
            "Drivetrain used before initialization"
        );
    }
}
