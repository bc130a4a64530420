use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System, UpdateKind};

use super::{ProcessEntry, ProcessTable};

/// `ProcessTable` backed by sysinfo. The `System` is reused between scans.
pub struct SysinfoProcesses {
    system: System,
}

impl SysinfoProcesses {
    pub fn new() -> Self {
        Self { system: System::new() }
    }

    fn refresh(&mut self) {
        self.system.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing().with_exe(UpdateKind::OnlyIfNotSet),
        );
    }
}

impl Default for SysinfoProcesses {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessTable for SysinfoProcesses {
    fn snapshot(&mut self) -> Vec<ProcessEntry> {
        self.refresh();
        self.system
            .processes()
            .iter()
            .map(|(pid, process)| ProcessEntry {
                pid: pid.as_u32(),
                name: process.name().to_string_lossy().into_owned(),
                exe: process.exe().map(|p| p.to_path_buf()),
            })
            .collect()
    }

    fn name_of(&mut self, pid: u32) -> Option<String> {
        let pid = sysinfo::Pid::from_u32(pid);
        self.system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::nothing(),
        );
        self.system
            .process(pid)
            .map(|p| p.name().to_string_lossy().into_owned())
    }
}

// === Tests ===
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_contains_current_process() {
        let mut table = SysinfoProcesses::new();
        let me = std::process::id();
        let entries = table.snapshot();
        assert!(entries.iter().any(|p| p.pid == me));
        assert!(table.name_of(me).is_some());
    }
}
