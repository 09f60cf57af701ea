use std::error::Error;

mod cli;
mod gen;
mod mem;
mod tables;

use cli::get_cli;
use gen::RowGen;
use mem::GetAlloc;

#[cfg(not(target_os = "windows"))]
#[global_allocator]
pub static GLOBAL_TRACKER: jemallocator::Jemalloc = jemallocator::Jemalloc;

#[cfg(target_os = "windows")]
#[global_allocator]
pub static GLOBAL_TRACKER: std::alloc::System = std::alloc::System;

fn main() {
    if let Err(err) = _main() {
        eprintln!("error: {}", &err);
        std::process::exit(1);
    }
}

fn _main() -> Result<(), Box<dyn Error>> {
    let cfg = get_cli()?;

    let stdout = std::io::stdout();
    let writerlock = stdout.lock();

    let stats = RowGen::new(&cfg).write_rows(writerlock)?;

    if cfg.stats {
        eprint!("{}", stats.report(GLOBAL_TRACKER.get_alloc()));
    } else if cfg.verbose > 0 {
        eprintln!("runtime: {:.3} secs", stats.elapsed_secs);
    }
    Ok(())
}
