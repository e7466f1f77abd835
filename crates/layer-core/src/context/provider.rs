//! Best-effort collection of a [`MachineContext`] from the running system

use layer_meta::MachineContext;
use std::collections::BTreeMap;
use std::sync::OnceLock;
use sysinfo::System;

/// Hardware/software facts, collected once per process
static FACTS: OnceLock<BTreeMap<String, String>> = OnceLock::new();

/// Collects machine identity, environment, and facts
///
/// Every piece is gathered independently. A fact that cannot be read is left
/// out; collection itself never fails.
#[derive(Debug, Clone, Default)]
pub struct MachineContextProvider {
    skip_facts: bool,
}

impl MachineContextProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Do not gather hardware/software facts
    pub fn without_facts(mut self) -> Self {
        self.skip_facts = true;
        self
    }

    pub fn collect(&self) -> MachineContext {
        let machine_name = detect_machine_name();
        let user_name = detect_user_name();

        let environment: BTreeMap<String, String> = std::env::vars_os()
            .map(|(k, v)| (k.to_string_lossy().into_owned(), v.to_string_lossy().into_owned()))
            .collect();

        let facts = if self.skip_facts {
            BTreeMap::new()
        } else {
            FACTS.get_or_init(collect_facts).clone()
        };

        tracing::debug!(
            machine = %machine_name,
            user = %user_name,
            env_vars = environment.len(),
            facts = facts.len(),
            "Collected machine context"
        );

        MachineContext::builder(machine_name)
            .user_name(user_name)
            .environment(environment)
            .facts(facts)
            .build()
    }
}

/// Collect a context with the default provider
pub fn collect() -> MachineContext {
    MachineContextProvider::new().collect()
}

fn detect_machine_name() -> String {
    match hostname::get() {
        Ok(name) if !name.is_empty() => return name.to_string_lossy().into_owned(),
        Ok(_) => tracing::debug!("Hostname is empty, falling back to environment"),
        Err(e) => tracing::debug!(error = %e, "Failed to read hostname, falling back to environment"),
    }

    ["COMPUTERNAME", "HOSTNAME"]
        .iter()
        .find_map(|key| std::env::var(key).ok().filter(|v| !v.is_empty()))
        .unwrap_or_else(|| "unknown".to_string())
}

fn detect_user_name() -> String {
    ["USER", "USERNAME", "LOGNAME"]
        .iter()
        .find_map(|key| std::env::var(key).ok().filter(|v| !v.is_empty()))
        .unwrap_or_default()
}

fn collect_facts() -> BTreeMap<String, String> {
    let mut facts = BTreeMap::new();

    let mut record = |name: &str, value: Option<String>| match value {
        Some(v) if !v.is_empty() => {
            facts.insert(name.to_string(), v);
        }
        _ => tracing::debug!(fact = name, "Fact unavailable"),
    };

    record("os_name", System::name());
    record("os_version", System::os_version());
    record("kernel_version", System::kernel_version());
    record("cpu_arch", Some(std::env::consts::ARCH.to_string()));
    record("os_family", Some(std::env::consts::FAMILY.to_string()));
    record(
        "cpu_count",
        std::thread::available_parallelism()
            .ok()
            .map(|n| n.get().to_string()),
    );

    let mut system = System::new();
    system.refresh_memory();
    let total_memory = system.total_memory();
    if total_memory > 0 {
        record("total_memory_mb", Some((total_memory / (1024 * 1024)).to_string()));
        record(
            "total_memory_gb",
            Some((total_memory / (1024 * 1024 * 1024)).to_string()),
        );
    } else {
        record("total_memory_mb", None);
    }

    facts
}
