//! Parsing of user-supplied resource limit strings.
//!
//! Memory limits follow the grammar `^[0-9]+[bkmgBKMG]?$` with suffixes
//! scaling by powers of 1024; CPU limits are a positive decimal core count
//! translated to a cgroup-v2 `cpu.max` quota/period pair.

use serde::{Deserialize, Serialize};

use crate::constants::CPU_PERIOD_US;
use crate::error::{IzaError, Result};

/// A CPU bandwidth limit as written to `cpu.max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuMax {
    /// Allowed microseconds of CPU time per period.
    pub quota_us: u64,
    /// Accounting period in microseconds.
    pub period_us: u64,
}

/// Parses a memory limit literal into a byte count.
///
/// A bare integer is a byte count; a trailing `b`/`k`/`m`/`g` (any case)
/// scales by 1024^0..3. A zero limit is rejected, as is anything outside
/// the grammar.
///
/// # Errors
///
/// Returns [`IzaError::Config`] if the literal is empty, contains
/// non-digit characters, uses an unknown suffix, is zero, or overflows.
pub fn parse_memory_limit(input: &str) -> Result<u64> {
    let trimmed = input.trim();
    let Some(&last) = trimmed.as_bytes().last() else {
        return Err(IzaError::Config {
            message: "memory limit is empty".into(),
        });
    };

    let (digits, multiplier) = if last.is_ascii_digit() {
        (trimmed, 1u64)
    } else {
        let multiplier = match last.to_ascii_lowercase() {
            b'b' => 1,
            b'k' => 1024,
            b'm' => 1024 * 1024,
            b'g' => 1024 * 1024 * 1024,
            _ => {
                return Err(IzaError::Config {
                    message: format!(
                        "unknown memory unit '{}' in '{input}': use b, k, m, or g",
                        last as char
                    ),
                });
            }
        };
        (&trimmed[..trimmed.len() - 1], multiplier)
    };

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(IzaError::Config {
            message: format!("invalid memory limit '{input}': expected DIGITS[b|k|m|g]"),
        });
    }

    let value: u64 = digits.parse().map_err(|_| IzaError::Config {
        message: format!("memory limit '{input}' is out of range"),
    })?;

    let bytes = value.checked_mul(multiplier).ok_or_else(|| IzaError::Config {
        message: format!("memory limit '{input}' is out of range"),
    })?;

    if bytes == 0 {
        return Err(IzaError::Config {
            message: "memory limit must be greater than zero".into(),
        });
    }

    Ok(bytes)
}

/// Translates a core count into a `cpu.max` quota with the fixed period.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn cpu_quota(cores: f64) -> u64 {
    #[allow(clippy::cast_precision_loss)]
    let quota = (cores * CPU_PERIOD_US as f64).round();
    quota as u64
}

/// Parses a CPU limit literal (a positive decimal core count) into a
/// [`CpuMax`] pair with the fixed 100 ms period.
///
/// # Errors
///
/// Returns [`IzaError::Config`] if the literal is not a finite positive
/// number.
pub fn parse_cpu_limit(input: &str) -> Result<CpuMax> {
    let cores: f64 = input.trim().parse().map_err(|_| IzaError::Config {
        message: format!("invalid CPU limit '{input}': expected a decimal core count"),
    })?;

    if !cores.is_finite() || cores <= 0.0 {
        return Err(IzaError::Config {
            message: format!("CPU limit '{input}' must be a positive number of cores"),
        });
    }

    Ok(CpuMax {
        quota_us: cpu_quota(cores),
        period_us: CPU_PERIOD_US,
    })
}
