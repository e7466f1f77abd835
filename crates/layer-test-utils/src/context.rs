//! Deterministic machine contexts

use chrono::{DateTime, TimeZone, Utc};
use layer_meta::{MachineContext, MachineContextBuilder};

/// Fixed capture time so contexts compare equal across runs
pub fn captured_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

/// Builder preloaded with a user name and a fixed capture time
pub fn machine_builder(name: &str) -> MachineContextBuilder {
    MachineContext::builder(name)
        .user_name("tester")
        .captured_at(captured_at())
}

/// A context for `name` with no environment and no facts
pub fn machine(name: &str) -> MachineContext {
    machine_builder(name).build()
}

/// A typical developer laptop
///
/// `PROFILE=developer`, `STEAM_DIR` set, an NVIDIA GPU, and 32 GB of memory.
pub fn developer_laptop() -> MachineContext {
    machine_builder("DEV-LAPTOP-07")
        .env("PROFILE", "developer")
        .env("STEAM_DIR", "D:\\Steam")
        .fact("gpu_vendor", "NVIDIA Corporation")
        .fact("total_memory_gb", "32")
        .fact("os_family", "windows")
        .build()
}

/// A headless build server with no interactive profile
pub fn build_server() -> MachineContext {
    machine_builder("BUILD-SRV-01")
        .env("CI", "true")
        .fact("total_memory_gb", "128")
        .fact("os_family", "unix")
        .build()
}
