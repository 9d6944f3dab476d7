// Fixed-rate drive loop with watchdog
// Note: the watchdog zeroes the drive command when teleop/planner stops sending,
// so the robot does not keep driving on a stale command

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::interval;
use tracing::{debug, info, warn};

use crate::config::{
    CMD_TIMEOUT, LOOP_HZ, TOPIC_CMD_DRIVE, TOPIC_HEALTH, TOPIC_POSE, TOPIC_RT_MOTORS,
    TOPIC_VELOCITY,
};
use crate::drive::{
    DriveError, DriveMixer, Drivetrain, MotorActuator, SimulatedMotor, WheelPosition,
};
use crate::messages::{DriveCommand, MotorPowerSet, PoseSample, RuntimeHealth, VelocityEstimate};
use crate::velocity::VelocityEstimator;

/// Start-up options for the runtime loop
#[derive(Debug, Clone)]
pub struct RuntimeOptions {
    pub loop_hz: u64,
    pub cmd_timeout: Duration,
    pub wrap_heading: bool,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            loop_hz: LOOP_HZ,
            cmd_timeout: CMD_TIMEOUT,
            wrap_heading: false,
        }
    }
}

/// Tick period for a loop rate, never zero
pub fn loop_period(loop_hz: u64) -> Duration {
    Duration::from_secs_f64(1.0 / loop_hz.max(1) as f64)
}

pub struct Runtime<M: MotorActuator> {
    latest_cmd: Option<DriveCommand>,
    cmd_received_at: Instant,
    cmd_timeout: Duration,
    health: RuntimeHealth,
    pending_pose: Option<PoseSample>, // received since the last velocity update
    seeded: bool,
    drivetrain: Drivetrain<M>,
    estimator: VelocityEstimator,
}

impl<M: MotorActuator> Runtime<M> {
    pub fn new(
        drivetrain: Drivetrain<M>,
        estimator: VelocityEstimator,
        cmd_timeout: Duration,
        now: Instant,
    ) -> Self {
        Self {
            latest_cmd: None,
            cmd_received_at: now,
            cmd_timeout,
            health: RuntimeHealth::CmdStale, // Start stale until first cmd
            pending_pose: None,
            seeded: false,
            drivetrain,
            estimator,
        }
    }

    /// Process incoming command
    pub fn on_command(&mut self, cmd: DriveCommand, now: Instant) {
        debug!("Received command: {:?}", &cmd);
        self.latest_cmd = Some(cmd);
        self.cmd_received_at = now;
    }

    /// Process incoming odometry pose, latest one wins until the next update
    pub fn on_pose(&mut self, pose: PoseSample) {
        if !self.seeded && self.pending_pose.is_none() {
            info!("First pose received: {:?}", pose);
        }
        self.pending_pose = Some(pose);
    }

    /// Run the watchdog, mix the command and drive the motors
    pub fn compute_actuation(&mut self, now: Instant) -> Result<MotorPowerSet, DriveError> {
        let cmd_age = now.saturating_duration_since(self.cmd_received_at);

        let cmd = match self.latest_cmd {
            Some(cmd) if cmd_age <= self.cmd_timeout => {
                self.health = RuntimeHealth::Ok;
                cmd
            }
            Some(_) => {
                // Watchdog triggered - stop the robot
                if self.health != RuntimeHealth::CmdStale {
                    warn!("Command stale ({:?} old), stopping robot", cmd_age);
                }
                self.health = RuntimeHealth::CmdStale;
                DriveCommand::stopped()
            }
            None => {
                // No command ever received
                self.health = RuntimeHealth::CmdStale;
                DriveCommand::stopped()
            }
        };

        self.drivetrain.mixer().apply_command(&cmd);
        self.drivetrain.update()
    }

    /// Differentiate a newly received pose against the previous one
    ///
    /// Uses the odometry timestamps. Ticks without a new pose keep the
    /// previous estimate; the first pose only seeds the estimator.
    pub fn update_velocity(&mut self) -> VelocityEstimate {
        match self.pending_pose.take() {
            Some(pose) if self.seeded => self.estimator.update(&pose, pose.timestamp_ms),
            Some(pose) => {
                self.estimator.seed(&pose);
                self.seeded = true;
                self.estimator.latest()
            }
            None => self.estimator.latest(),
        }
    }

    pub fn health(&self) -> RuntimeHealth {
        self.health
    }

    pub fn velocity(&self) -> VelocityEstimate {
        self.estimator.latest()
    }

    pub fn drivetrain(&self) -> &Drivetrain<M> {
        &self.drivetrain
    }

    pub fn drivetrain_mut(&mut self) -> &mut Drivetrain<M> {
        &mut self.drivetrain
    }
}

pub async fn run(options: RuntimeOptions) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;

    info!("Setting up publishers and subscribers...");
    let cmd_subscriber = session.declare_subscriber(TOPIC_CMD_DRIVE).await?;
    let pose_subscriber = session.declare_subscriber(TOPIC_POSE).await?;
    let pub_motors = session.declare_publisher(TOPIC_RT_MOTORS).await?;
    let pub_velocity = session.declare_publisher(TOPIC_VELOCITY).await?;
    let pub_health = session.declare_publisher(TOPIC_HEALTH).await?;

    // Motor powers go out on TOPIC_RT_MOTORS; the hardware bridge owns the devices
    let mut drivetrain = Drivetrain::new(
        Arc::new(DriveMixer::new()),
        WheelPosition::ALL.map(SimulatedMotor::new),
    );
    drivetrain.initialize()?;

    let estimator = VelocityEstimator::new(0).with_heading_wrap(options.wrap_heading);
    let mut runtime = Runtime::new(drivetrain, estimator, options.cmd_timeout, Instant::now());
    let mut tick = interval(loop_period(options.loop_hz));

    info!(
        "Runtime started: {}Hz loop, {}ms watchdog timeout, heading wrap {}",
        options.loop_hz,
        options.cmd_timeout.as_millis(),
        if options.wrap_heading { "on" } else { "off" }
    );
    info!("Subscribed to: {}, {}", TOPIC_CMD_DRIVE, TOPIC_POSE);
    info!(
        "Publishing to: {}, {}, {}",
        TOPIC_RT_MOTORS, TOPIC_VELOCITY, TOPIC_HEALTH
    );

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = tick.tick() => {}
            _ = &mut shutdown => {
                info!("Shutdown requested");
                break;
            }
        }

        // 1. Drain all pending commands and poses (non-blocking), keep latest
        while let Ok(Some(sample)) = cmd_subscriber.try_recv() {
            let payload = sample.payload().to_bytes();
            match serde_json::from_slice::<DriveCommand>(&payload) {
                Ok(cmd) => runtime.on_command(cmd, Instant::now()),
                Err(e) => warn!("Failed to parse command: {}", e),
            }
        }
        while let Ok(Some(sample)) = pose_subscriber.try_recv() {
            let payload = sample.payload().to_bytes();
            match serde_json::from_slice::<PoseSample>(&payload) {
                Ok(pose) => runtime.on_pose(pose),
                Err(e) => warn!("Failed to parse pose: {}", e),
            }
        }

        // 2. Mix and drive (includes watchdog logic)
        let powers = runtime.compute_actuation(Instant::now())?;

        // 3. Velocity from odometry
        let velocity = runtime.update_velocity();

        // 4. Publish
        pub_motors.put(serde_json::to_string(&powers)?).await?;
        pub_velocity.put(serde_json::to_string(&velocity)?).await?;
        pub_health.put(serde_json::to_string(&runtime.health())?).await?;
    }

    runtime.drivetrain_mut().stop()?;
    pub_motors
        .put(serde_json::to_string(&MotorPowerSet::zero())?)
        .await?;
    info!("Runtime stopped");
    Ok(())
}
