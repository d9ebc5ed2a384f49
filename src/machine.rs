//! Static host snapshot attached to every analysis hand-off.

use serde::Serialize;

/// Host characteristics collected once per round loop invocation.
///
/// The analyzer receives this with every result set so that preserved
/// artifacts record where they were produced.
#[derive(Clone, Debug, Serialize)]
pub struct MachineInfo {
    /// Operating system (`linux`, `windows`, `macos`, ...).
    pub os: &'static str,
    /// CPU architecture (`x86_64`, `aarch64`, ...).
    pub arch: &'static str,
    /// OS family (`unix` or `windows`).
    pub family: &'static str,
    /// Available logical CPUs.
    pub cpus: usize,
}

impl MachineInfo {
    /// Collects the snapshot from the current host.
    pub fn collect() -> Self {
        Self {
            os: std::env::consts::OS,
            arch: std::env::consts::ARCH,
            family: std::env::consts::FAMILY,
            cpus: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collect_reports_current_host() {
        let info = MachineInfo::collect();
        assert_eq!(info.os, std::env::consts::OS);
        assert!(info.cpus >= 1);
    }
}
