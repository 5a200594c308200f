use super::spawn_bridge;
use anyhow::{bail, Result};
use log::info;
use tcrdock_core::backend::MhcLookup;

/// Aligned class-I sequence for `allele`.
pub fn lookup<B: MhcLookup>(backend: &mut B, allele: &str) -> Result<String> {
    let allele = allele.trim();
    if allele.is_empty() {
        bail!("no MHC allele given");
    }
    info!("allele: {allele}");
    Ok(backend.mhc_class_1_alseq(allele)?)
}

pub fn execute(allele: &str, bridge: &str) -> Result<()> {
    if allele.trim().is_empty() {
        bail!("no MHC allele given");
    }
    let mut backend = spawn_bridge(bridge)?;
    let alseq = lookup(&mut backend, allele)?;
    println!("{alseq}");
    Ok(())
}
