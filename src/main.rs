use clap::Parser;

use traceprof::args::ProfileArgs;
use traceprof::{app, logger};

fn main() {
    let args = ProfileArgs::parse();
    logger::init_logging(args.flags().verbose);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if let Err(err) = app::run(&args, &mut out) {
        eprintln!("traceprof: {}", err);
        std::process::exit(1);
    }
}
