//! Basic usage of the event log and keyed timers.
//!
//! Two phases of work are recorded into separate event logs, which are then merged and
//! reconstructed into per-timer durations.

use std::env;
use std::fs;
use std::hint::black_box;

use interval_timers::{KeyedTimers, LogWriter, parse_to_table, table_to_deltas};

fn fib(n: u64) -> u64 {
    if n < 2 {
        n
    } else {
        fib(n.saturating_sub(1)).wrapping_add(fib(n.saturating_sub(2)))
    }
}

fn main() -> interval_timers::Result<()> {
    let temp = env::temp_dir();
    let first = temp.join("interval_timers_readme_phase1.log");
    let second = temp.join("interval_timers_readme_phase2.log");

    let mut timers = KeyedTimers::new();
    timers.start("total")?;

    let mut writer = LogWriter::to_file(&first)?;
    writer.record_start("fastfib")?;
    black_box(fib(black_box(10)));
    writer.record_end("fastfib")?;

    writer.set_sink(&second)?;
    writer.record_start("slowfib")?;
    black_box(fib(black_box(25)));
    writer.record_end("slowfib")?;
    writer.close_sink()?;

    timers.end("total")?;

    let deltas = table_to_deltas(&parse_to_table([&first, &second])?);
    for (name, durations) in &deltas {
        println!("{name}: {durations:?} ns");
    }
    println!("total: {} ns", timers.delta("total"));

    for path in [first, second] {
        if let Err(error) = fs::remove_file(&path) {
            eprintln!("could not remove {}: {error}", path.display());
        }
    }

    Ok(())
}
