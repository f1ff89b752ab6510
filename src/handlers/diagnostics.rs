use crate::{models::DiagnosticsResponse, AppState};
use axum::{extract::State, Json};
use std::sync::Arc;
use std::sync::{Mutex, OnceLock};
use sysinfo::System;
use tracing::info;

static SYSTEM_MONITOR: OnceLock<Mutex<System>> = OnceLock::new();

/// Registry sizes plus host CPU and memory
pub async fn diagnostics(State(app_state): State<Arc<AppState>>) -> Json<DiagnosticsResponse> {
    let n_groups = app_state.registry.group_count() as u32;
    let n_group_conn = app_state.registry.connection_count() as u32;
    let n_notification_conn = app_state.hub.len() as u32;

    // System stats
    let (cpu_usage, memory_alloc, memory_free, memory_total) = {
        let sys_lock = SYSTEM_MONITOR.get_or_init(|| Mutex::new(System::new_all()));
        match sys_lock.lock() {
            Ok(mut sys) => {
                sys.refresh_cpu();
                sys.refresh_memory();
                (
                    sys.global_cpu_info().cpu_usage(),
                    sys.used_memory(),
                    sys.free_memory(),
                    sys.total_memory(),
                )
            }
            Err(_) => (0.0, 0, 0, 0),
        }
    };

    info!(
        "Diagnostics: CPU: {:.2}%, Mem: {}/{} MB, Groups: {}, Chat conn: {}, Notification conn: {}",
        cpu_usage,
        memory_alloc / 1024 / 1024,
        memory_total / 1024 / 1024,
        n_groups,
        n_group_conn,
        n_notification_conn
    );

    Json(DiagnosticsResponse {
        n_groups,
        n_group_conn,
        n_notification_conn,
        cpu_usage,
        memory_alloc,
        memory_total,
        memory_free,
    })
}
