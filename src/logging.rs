use std::io::Write;

use env_logger::Env;

/// Routes `log` records to stderr. `RUST_LOG` overrides the default level.
///
/// Records are printed as bare messages so they read like ordinary CLI output.
pub fn init_from_env() {
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or("warn"))
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .try_init();
}
