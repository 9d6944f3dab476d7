// Mixer preview: prints wheel powers for a set of drive commands
//
// Usage: cargo run --example mix_preview -- [forward strafe rotate [slow]]
// Example: cargo run --example mix_preview -- 0.5 1.0 0 slow
//
// No hardware or network needed.

use mecanum_drive_runtime::drive::mix_powers;
use mecanum_drive_runtime::messages::DriveCommand;
use tracing::{info, warn};

const SAMPLES: [(&str, f64, f64, f64); 6] = [
    ("forward", 1.0, 0.0, 0.0),
    ("strafe", 0.0, 1.0, 0.0),
    ("rotate", 0.0, 0.0, 1.0),
    ("diagonal", 1.0, 1.0, 0.0),
    ("arc", 0.8, 0.0, 0.4),
    ("everything", 1.0, 1.0, 1.0),
];

fn print_row(label: &str, cmd: &DriveCommand) {
    let p = mix_powers(cmd);
    println!(
        "{:<14} {:>6.2} {:>6.2} {:>6.2} {:>5} | {:>6.3} {:>6.3} {:>6.3} {:>6.3}",
        label,
        cmd.forward,
        cmd.strafe,
        cmd.rotate,
        if cmd.slow_mode { "yes" } else { "no" },
        p.front_left,
        p.front_right,
        p.back_left,
        p.back_right
    );
}

fn parse_command(args: &[String]) -> Result<DriveCommand, std::num::ParseFloatError> {
    Ok(DriveCommand {
        forward: args[0].parse()?,
        strafe: args[1].parse()?,
        rotate: args[2].parse()?,
        slow_mode: args.get(3).is_some_and(|s| s == "slow"),
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("info".parse().unwrap()),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();

    println!(
        "{:<14} {:>6} {:>6} {:>6} {:>5} | {:>6} {:>6} {:>6} {:>6}",
        "command", "fwd", "strafe", "rot", "slow", "fl", "fr", "bl", "br"
    );

    if args.len() >= 3 {
        let cmd = parse_command(&args)?;
        print_row("custom", &cmd);
        return Ok(());
    }
    if !args.is_empty() {
        warn!("Expected: forward strafe rotate [slow], showing samples instead");
    }

    for (label, forward, strafe, rotate) in SAMPLES {
        let cmd = DriveCommand::new(forward, strafe, rotate);
        print_row(label, &cmd);
        print_row(
            "  slow",
            &DriveCommand {
                slow_mode: true,
                ..cmd
            },
        );
    }
    info!("{} sample commands mixed", SAMPLES.len());
    Ok(())
}
