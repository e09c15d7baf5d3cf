use std::fs::File;
use std::io::{self, BufRead, BufReader};

use anyhow::{Context, Result};

use gcode_interp::config::Config;
use gcode_interp::machine::{Axis, CanonicalMachine, SimMachine};
use gcode_interp::{interpret_block, BlockOutcome};

/// Per-run counters reported in the text summary.
#[derive(Debug, Default)]
struct RunStats {
    executed: u64,
    empty: u64,
    errors: u64,
}

fn main() -> Result<()> {
    // Parse configuration from command line and environment
    let config = Config::from_args_and_env()?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.log_level.as_str()),
    )
    .init();

    let profile = config.resolve_profile()?;
    log::info!("machine profile: {}", profile.name);
    let mut machine = SimMachine::new(profile);

    let reader: Box<dyn BufRead> = match &config.input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("opening {}", path.display()))?,
        )),
        None => Box::new(BufReader::new(io::stdin())),
    };

    let stats = run_program(reader, &mut machine)?;

    if config.json {
        println!("{}", serde_json::to_string_pretty(machine.state())?);
    } else {
        print_summary(&machine, &stats);
    }

    Ok(())
}

/// Feed the program through the interpreter, one block at a time. Errors
/// are reported per block; the controller keeps accepting the next block.
fn run_program<R: BufRead>(reader: R, machine: &mut SimMachine) -> Result<RunStats> {
    let mut stats = RunStats::default();

    for line in reader.lines() {
        let mut block = line.context("reading program")?;
        match interpret_block(&mut block, machine) {
            Ok(BlockOutcome::Executed) => stats.executed += 1,
            Ok(BlockOutcome::Empty) => stats.empty += 1,
            Ok(BlockOutcome::Query) => print_status(machine),
            Err(err) => {
                log::error!("block {}: {}", machine.state().line_count, err);
                stats.errors += 1;
            }
        }
    }

    Ok(stats)
}

/// Answer a `?` query with a one-line status report.
fn print_status(machine: &SimMachine) {
    let state = machine.state();
    println!(
        "pos X{:.3} Y{:.3} Z{:.3} | feed {:.1} | spindle {:?} {:.0} | tool {}",
        machine.position(Axis::X),
        machine.position(Axis::Y),
        machine.position(Axis::Z),
        state.feed_rate,
        state.spindle,
        state.spindle_speed,
        state.tool,
    );
}

fn print_summary(machine: &SimMachine, stats: &RunStats) {
    let state = machine.state();
    println!(
        "{} blocks: {} executed, {} empty, {} errors",
        state.line_count, stats.executed, stats.empty, stats.errors
    );
    println!(
        "final position: X{:.3} Y{:.3} Z{:.3} A{:.3} B{:.3} C{:.3}",
        machine.position(Axis::X),
        machine.position(Axis::Y),
        machine.position(Axis::Z),
        machine.position(Axis::A),
        machine.position(Axis::B),
        machine.position(Axis::C),
    );
    for message in &state.messages {
        println!("message: {}", message.trim());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_run_program_counts_outcomes() {
        let program = "G0 X10\n(setup comment)\nG1 X20 F200\nG99\n/deleted\n";
        let mut machine = SimMachine::default();
        let stats = run_program(Cursor::new(program), &mut machine).expect("run");

        assert_eq!(stats.executed, 2);
        assert_eq!(stats.empty, 2);
        assert_eq!(stats.errors, 1);
        assert_eq!(machine.position(Axis::X), 20.0);
    }

    #[test]
    fn test_error_does_not_stop_the_run() {
        let program = "G1 X\nG0 X5\n";
        let mut machine = SimMachine::default();
        let stats = run_program(Cursor::new(program), &mut machine).expect("run");

        assert_eq!(stats.errors, 1);
        assert_eq!(stats.executed, 1);
        assert_eq!(machine.position(Axis::X), 5.0);
    }
}
