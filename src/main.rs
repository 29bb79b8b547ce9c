//! `modio`: drive a MOD-IO board from the shell
//!
//! ```text
//! modio relay close 1
//! modio -b 0 read-ain 3
//! ```

use modio_hal::{cli, SmBus};

fn main() {
    pretty_env_logger::formatted_builder()
        .filter_level(log::LevelFilter::Warn)
        .parse_filters(&std::env::var("RUST_LOG").unwrap_or_default())
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let code = cli::run(&args, SmBus::from_unit, &mut std::io::stdout().lock());
    std::process::exit(code);
}
