// Mecanum drivetrain runtime: power mixing, velocity estimation, zenoh loop

pub mod config;
pub mod drive;
pub mod messages;
pub mod runtime;
pub mod velocity;
