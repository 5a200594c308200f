pub mod check_mhc;
pub mod run;
pub mod setup;

use anyhow::Context;
use tcrdock_bridge::Bridge;

pub(crate) fn spawn_bridge(command_line: &str) -> anyhow::Result<Bridge> {
    Bridge::spawn(command_line)
        .with_context(|| format!("could not start the modeling helper (--bridge {command_line:?})"))
}
