use std::process::ExitCode;

use glslopt::driver::{self, Mode};
use glslopt::logging;
use glslopt::minify::MinifyEngine;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    logging::init_from_env();
    driver::main(Mode::Text, MinifyEngine::new()).await
}
