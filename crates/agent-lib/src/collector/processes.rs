//! Top process memory consumers
//!
//! Operator information only. The listing is printed to the console and
//! never feeds alerting or the log file.

use crate::models::{percent_of, ProcessUsage};
use sysinfo::{System, Users};

/// Number of processes reported by default
pub const DEFAULT_TOP_PROCESSES: usize = 5;

/// Lists processes by resident memory
pub struct ProcessLister {
    system: System,
    users: Users,
}

impl Default for ProcessLister {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessLister {
    pub fn new() -> Self {
        Self {
            system: System::new(),
            users: Users::new(),
        }
    }

    /// Refresh the process table and return the `limit` largest consumers
    pub fn top_memory_consumers(&mut self, limit: usize) -> Vec<ProcessUsage> {
        self.system.refresh_memory();
        self.system.refresh_processes();
        self.users.refresh_list();

        let total_memory = self.system.total_memory();

        let usages = self
            .system
            .processes()
            .iter()
            .map(|(pid, process)| {
                let user = process
                    .user_id()
                    .and_then(|uid| self.users.get_user_by_id(uid))
                    .map(|user| user.name().to_string());

                ProcessUsage {
                    pid: pid.as_u32(),
                    name: process.name().to_string(),
                    user,
                    memory_bytes: process.memory(),
                    memory_percent: percent_of(process.memory(), total_memory).unwrap_or(0.0),
                }
            })
            .collect();

        rank_by_memory(usages, limit)
    }
}

/// Drop idle entries and keep the `limit` highest memory percentages
pub fn rank_by_memory(mut usages: Vec<ProcessUsage>, limit: usize) -> Vec<ProcessUsage> {
    usages.retain(|usage| usage.memory_percent > 0.0);
    usages.sort_by(|a, b| b.memory_percent.total_cmp(&a.memory_percent));
    usages.truncate(limit);
    usages
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usage(pid: u32, memory_percent: f64) -> ProcessUsage {
        ProcessUsage {
            pid,
            name: format!("proc-{}", pid),
            user: None,
            memory_bytes: (memory_percent * 1000.0) as u64,
            memory_percent,
        }
    }

    #[test]
    fn test_rank_by_memory_sorts_descending_and_truncates() {
        let usages = vec![
            usage(1, 2.0),
            usage(2, 9.5),
            usage(3, 0.5),
            usage(4, 4.0),
            usage(5, 7.0),
            usage(6, 1.0),
        ];

        let top = rank_by_memory(usages, 3);

        let pids: Vec<u32> = top.iter().map(|u| u.pid).collect();
        assert_eq!(pids, vec![2, 5, 4]);
    }

    #[test]
    fn test_rank_by_memory_skips_zero_usage() {
        let usages = vec![usage(1, 0.0), usage(2, 0.0), usage(3, 3.0)];

        let top = rank_by_memory(usages, DEFAULT_TOP_PROCESSES);

        assert_eq!(top.len(), 1);
        assert_eq!(top[0].pid, 3);
    }

    #[test]
    fn test_top_memory_consumers_respects_limit() {
        let mut lister = ProcessLister::new();
        let top = lister.top_memory_consumers(2);

        assert!(top.len() <= 2);
        if top.len() == 2 {
            assert!(top[0].memory_percent >= top[1].memory_percent);
        }
    }
}
