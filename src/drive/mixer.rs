// Mecanum power mixing for the 4-wheel base
// Converts forward/strafe/rotate commands to individual wheel powers.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::config::{MECANUM_SCALE, POWER_SCALE, SLOW_SCALE};
use crate::messages::{DriveCommand, MotorPowerSet};

/// Mix a drive command into wheel powers
///
/// # Arguments
/// * `cmd` - forward/strafe/rotate axes (unclamped) and the slow-mode flag
///
/// # Returns
/// Wheel powers within [-POWER_SCALE, POWER_SCALE], or
/// [-POWER_SCALE*SLOW_SCALE, POWER_SCALE*SLOW_SCALE] in slow mode
pub fn mix_powers(cmd: &DriveCommand) -> MotorPowerSet {
    mix_powers_with_params(cmd, POWER_SCALE, MECANUM_SCALE, SLOW_SCALE)
}

/// Mix a drive command into wheel powers with custom gains
pub fn mix_powers_with_params(
    cmd: &DriveCommand,
    power_scale: f64,
    mecanum_scale: f64,
    slow_scale: f64,
) -> MotorPowerSet {
    let strafe = cmd.strafe * mecanum_scale;

    // Mecanum inverse kinematics, rollers at 45°
    let mut powers = [
        cmd.forward - cmd.rotate - strafe, // front left
        cmd.forward + cmd.rotate + strafe, // front right
        cmd.forward - cmd.rotate + strafe, // back left
        cmd.forward + cmd.rotate - strafe, // back right
    ];

    // Scale all wheels down together so the direction of motion is kept
    let max_power = powers.iter().fold(0.0f64, |acc, p| acc.max(p.abs()));
    if max_power > 1.0 {
        for p in &mut powers {
            *p /= max_power;
        }
    }

    // Slow mode compounds on top of the power scale, applied as a second step
    let mut powers = powers.map(|p| p * power_scale);
    if cmd.slow_mode {
        powers = powers.map(|p| p * slow_scale);
    }

    let [front_left, front_right, back_left, back_right] = powers;
    MotorPowerSet {
        front_left,
        front_right,
        back_left,
        back_right,
    }
}

/// Shared command state for the drivetrain
///
/// Input tasks call `set_command`/`set_slow_mode` while the control loop calls
/// `mix`; every call takes the same lock, so a mix sees either the whole old
/// command or the whole new one.
#[derive(Debug, Default)]
pub struct DriveMixer {
    state: Mutex<DriveCommand>,
}

impl DriveMixer {
    pub fn new() -> Self {
        Self::default()
    }

    // Command state is plain data, a panicked writer cannot leave it half-set
    fn lock(&self) -> MutexGuard<'_, DriveCommand> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store the next forward/strafe/rotate triple
    pub fn set_command(&self, forward: f64, strafe: f64, rotate: f64) {
        let mut state = self.lock();
        state.forward = forward;
        state.strafe = strafe;
        state.rotate = rotate;
    }

    /// Enable or disable slow mode
    pub fn set_slow_mode(&self, enabled: bool) {
        self.lock().slow_mode = enabled;
    }

    /// Store a full command, slow-mode flag included
    pub fn apply_command(&self, cmd: &DriveCommand) {
        *self.lock() = *cmd;
    }

    /// Snapshot of the current command
    pub fn command(&self) -> DriveCommand {
        *self.lock()
    }

    /// Compute wheel powers from the current command
    pub fn mix(&self) -> MotorPowerSet {
        let cmd = self.command();
        mix_powers(&cmd)
    }
}
