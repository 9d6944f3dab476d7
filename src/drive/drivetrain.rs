// High-level drivetrain for the mecanum base
//
// Pairs the shared mixer with the four wheel actuators: configure once,
// then mix and apply every cycle.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::actuator::{DriveError, MotorActuator, Result, WheelPosition, ZeroPowerBehavior};
use super::mixer::DriveMixer;
use crate::messages::MotorPowerSet;

/// Four-wheel mecanum drivetrain
pub struct Drivetrain<M: MotorActuator> {
    mixer: Arc<DriveMixer>,
    motors: [M; 4], // [front_left, front_right, back_left, back_right]
    initialized: bool,
}

impl<M: MotorActuator> Drivetrain<M> {
    /// Create a drivetrain from motors ordered as `WheelPosition::ALL`
    pub fn new(mixer: Arc<DriveMixer>, motors: [M; 4]) -> Self {
        Self {
            mixer,
            motors,
            initialized: false,
        }
    }

    /// Configure direction polarity and brake mode on every motor
    ///
    /// This must be called before applying any power.
    pub fn initialize(&mut self) -> Result<()> {
        info!("Initializing drivetrain motors");

        for (motor, wheel) in self.motors.iter_mut().zip(WheelPosition::ALL) {
            let direction = wheel.default_direction();
            debug!("{}: direction={:?}, zero power=Brake", wheel, direction);
            motor.set_direction(direction)?;
            motor.set_zero_power_behavior(ZeroPowerBehavior::Brake)?;
        }

        self.initialized = true;
        info!("Drivetrain initialized");
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Send wheel powers to the motors
    pub fn apply(&mut self, powers: MotorPowerSet) -> Result<()> {
        if !self.initialized {
            return Err(DriveError::NotInitialized);
        }

        debug!(
            "Setting wheel powers: fl={:.3}, fr={:.3}, bl={:.3}, br={:.3}",
            powers.front_left, powers.front_right, powers.back_left, powers.back_right
        );

        for (motor, power) in self.motors.iter_mut().zip(powers.as_array()) {
            motor.set_power(power)?;
        }
        Ok(())
    }

    /// Mix the current command and apply it, returning what was sent
    pub fn update(&mut self) -> Result<MotorPowerSet> {
        let powers = self.mixer.mix();
        self.apply(powers)?;
        Ok(powers)
    }

    /// Stop all motors immediately
    pub fn stop(&mut self) -> Result<()> {
        info!("Stopping all motors");
        self.apply(MotorPowerSet::zero())
    }

    /// Shared mixer handle for command producers
    pub fn mixer(&self) -> &Arc<DriveMixer> {
        &self.mixer
    }

    /// Motors ordered as `WheelPosition::ALL`
    pub fn motors(&self) -> &[M; 4] {
        &self.motors
    }
}

impl<M: MotorActuator> Drop for Drivetrain<M> {
    fn drop(&mut self) {
        if !self.initialized {
            return;
        }
        if let Err(e) = self.stop() {
            warn!("Failed to stop motors on drop: {}", e);
        }
    }
}
