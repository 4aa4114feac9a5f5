//! Top-level dispatch from parsed CLI arguments to a profiler run.

use std::io::Write;

use crate::args::{Command, ProfileArgs};
use crate::config::Options;
use crate::error::AppResult;
use crate::profiler::Profiler;

/// Execute the requested command, writing results to `out`.
pub fn run<W: Write>(args: &ProfileArgs, out: &mut W) -> AppResult<()> {
    match args.command.as_ref() {
        None => {
            let options = Options::resolve(args.flags(), false)?;
            Profiler::new(&options).run(out)
        }
        Some(Command::Trace(_)) => {
            let options = Options::resolve(args.flags(), true)?;
            Profiler::new(&options).run(out)
        }
        Some(Command::Diff(diff)) => {
            let options = Options::resolve(&diff.common, diff.trace)?;
            Profiler::new(&options).run_diff(out, &diff.from, diff.to.as_deref())
        }
    }
}
