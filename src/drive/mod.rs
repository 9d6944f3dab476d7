// Drivetrain control for the mecanum base
//
// Provides:
// - Mecanum power mixing (forward/strafe/rotate -> 4 wheel powers)
// - Motor actuator interface and an in-memory simulated motor
// - High-level drivetrain API

mod actuator;
mod drivetrain;
pub mod mixer;

pub use actuator::{
    Direction, DriveError, MotorActuator, SimulatedMotor, WheelPosition, ZeroPowerBehavior,
};
pub use drivetrain::Drivetrain;
pub use mixer::{mix_powers, DriveMixer};
