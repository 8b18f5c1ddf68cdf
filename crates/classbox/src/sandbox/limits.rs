//! Resource caps for the interpreter subprocess
//!
//! Caps are installed in the forked child before exec. Each cap is attempted
//! independently: one the host refuses is skipped and the run proceeds with
//! the remaining caps, so an unavailable hardening measure never fails a
//! request. On platforms without rlimit support the whole layer is skipped
//! with a log note at spawn time.

use serde::{Deserialize, Serialize};

/// Optional OS-level ceilings applied to every run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SandboxLimits {
    /// Address-space ceiling in kilobytes
    #[serde(default)]
    pub address_space: Option<u64>,

    /// Output-file-size ceiling in kilobytes
    #[serde(default)]
    pub max_output_file: Option<u64>,

    /// Process/thread ceiling.
    ///
    /// Counts the invoking user's processes, not just the sandbox tree, so
    /// keep this generous; the process-group kill on timeout is what reaps
    /// stray children.
    #[serde(default)]
    pub max_processes: Option<u32>,

    /// Open-file ceiling
    #[serde(default)]
    pub max_open_files: Option<u32>,

    /// Extra CPU seconds granted beyond the wall-clock deadline
    #[serde(default)]
    pub cpu_extra_time: Option<f64>,
}

impl SandboxLimits {
    /// 1 kilobyte in kilobytes
    pub const KB: u64 = 1;
    /// 1 megabyte in kilobytes
    pub const MB: u64 = 1024;

    /// Create limits with the default ceilings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the address-space ceiling in kilobytes
    pub fn with_address_space(mut self, kb: u64) -> Self {
        self.address_space = Some(kb);
        self
    }

    /// Set the output-file-size ceiling in kilobytes
    pub fn with_max_output_file(mut self, kb: u64) -> Self {
        self.max_output_file = Some(kb);
        self
    }

    /// Set the process ceiling
    pub fn with_max_processes(mut self, count: u32) -> Self {
        self.max_processes = Some(count);
        self
    }

    /// Set the open-file ceiling
    pub fn with_max_open_files(mut self, count: u32) -> Self {
        self.max_open_files = Some(count);
        self
    }

    /// Set the CPU grace period in seconds
    pub fn with_cpu_extra_time(mut self, seconds: f64) -> Self {
        self.cpu_extra_time = Some(seconds);
        self
    }

    /// Apply overrides from another SandboxLimits, preferring values from
    /// `overrides` when both are present
    pub fn with_overrides(&self, overrides: &SandboxLimits) -> SandboxLimits {
        SandboxLimits {
            address_space: overrides.address_space.or(self.address_space),
            max_output_file: overrides.max_output_file.or(self.max_output_file),
            max_processes: overrides.max_processes.or(self.max_processes),
            max_open_files: overrides.max_open_files.or(self.max_open_files),
            cpu_extra_time: overrides.cpu_extra_time.or(self.cpu_extra_time),
        }
    }

    /// CPU-seconds ceiling for a given wall-clock deadline: the deadline
    /// plus the grace period, rounded up to whole seconds
    pub fn cpu_seconds(&self, wall_timeout_secs: f64) -> u64 {
        (wall_timeout_secs + self.cpu_extra_time.unwrap_or(0.0))
            .ceil()
            .max(1.0) as u64
    }
}

impl Default for SandboxLimits {
    fn default() -> Self {
        Self {
            address_space: Some(128 * Self::MB),
            max_output_file: Some(Self::MB),
            max_processes: Some(64),
            max_open_files: Some(64),
            cpu_extra_time: Some(1.0),
        }
    }
}

/// Install the caps and a fresh process group in the forked child.
///
/// Runs between fork and exec: async-signal-safe calls only, no allocation,
/// no logging. Individual `setrlimit` failures are ignored so the run
/// proceeds with whatever caps the host accepts. The new process group must
/// succeed, because a timed-out tree is killed through it.
#[cfg(unix)]
pub(crate) fn apply_in_child(
    limits: &SandboxLimits,
    wall_timeout_secs: f64,
) -> std::io::Result<()> {
    unsafe {
        if libc::setpgid(0, 0) != 0 {
            return Err(std::io::Error::last_os_error());
        }

        let cpu = limits.cpu_seconds(wall_timeout_secs) as libc::rlim_t;
        let lim = libc::rlimit {
            rlim_cur: cpu,
            rlim_max: cpu,
        };
        let _ = libc::setrlimit(libc::RLIMIT_CPU, &lim);

        if let Some(kb) = limits.address_space {
            let bytes = kb.saturating_mul(1024) as libc::rlim_t;
            let lim = libc::rlimit {
                rlim_cur: bytes,
                rlim_max: bytes,
            };
            let _ = libc::setrlimit(libc::RLIMIT_AS, &lim);
        }

        if let Some(kb) = limits.max_output_file {
            let bytes = kb.saturating_mul(1024) as libc::rlim_t;
            let lim = libc::rlimit {
                rlim_cur: bytes,
                rlim_max: bytes,
            };
            let _ = libc::setrlimit(libc::RLIMIT_FSIZE, &lim);
        }

        if let Some(count) = limits.max_processes {
            let lim = libc::rlimit {
                rlim_cur: count as libc::rlim_t,
                rlim_max: count as libc::rlim_t,
            };
            let _ = libc::setrlimit(libc::RLIMIT_NPROC, &lim);
        }

        if let Some(count) = limits.max_open_files {
            let lim = libc::rlimit {
                rlim_cur: count as libc::rlim_t,
                rlim_max: count as libc::rlim_t,
            };
            let _ = libc::setrlimit(libc::RLIMIT_NOFILE, &lim);
        }

        // No core dumps from crashing submissions.
        let lim = libc::rlimit {
            rlim_cur: 0,
            rlim_max: 0,
        };
        let _ = libc::setrlimit(libc::RLIMIT_CORE, &lim);
    }
    Ok(())
}
