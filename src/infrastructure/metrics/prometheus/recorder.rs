use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::{Mutex, OnceLock};

static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();
static INSTALL: Mutex<()> = Mutex::new(());

/// Initialize the Prometheus recorder globally and store the handle.
///
/// Only the first call installs a recorder; later calls reuse it, so several
/// routers in one process (as in tests) share a single registry.
pub fn init_metrics() -> anyhow::Result<()> {
    // ---
    let _guard = INSTALL
        .lock()
        .map_err(|_| anyhow::anyhow!("metrics recorder lock poisoned"))?;

    if HANDLE.get().is_none() {
        let handle = PrometheusBuilder::new().install_recorder()?;
        let _ = HANDLE.set(handle);
    }
    Ok(())
}

/// Render the current metrics in Prometheus text format.
pub fn render_metrics() -> String {
    // ---
    HANDLE
        .get()
        .map(PrometheusHandle::render)
        .unwrap_or_default()
}
