//! Human-readable output formatting

use crate::lifecycle::WorkloadStatus;

pub fn format_human(statuses: &[WorkloadStatus]) -> String {
    if statuses.is_empty() {
        return "No containers running!".to_string();
    }

    let mut output = String::from("Workloads\n---------\n");
    output.push_str(&format!(
        "{:<8} {:<10} {:<14} {:<22} {}\n",
        "NAME", "MODE", "CONTAINER", "STATUS", "IMAGE"
    ));
    output.push_str(&"-".repeat(88));
    output.push('\n');
    for status in statuses {
        output.push_str(&format!(
            "{:<8} {:<10} {:<14} {:<22} {}\n",
            status.workload,
            status.mode.as_str(),
            short_id(&status.container_id),
            format!("Running for {}", format_duration(status.uptime_secs)),
            status.image
        ));
    }
    output
}

/// Go-style duration, e.g. `1h2m3s`, `4m0s`, `9s`
pub fn format_duration(secs: i64) -> String {
    let secs = secs.max(0);
    let (hours, mins, secs) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if hours > 0 {
        format!("{}h{}m{}s", hours, mins, secs)
    } else if mins > 0 {
        format!("{}m{}s", mins, secs)
    } else {
        format!("{}s", secs)
    }
}

fn short_id(id: &str) -> &str {
    id.get(..12).unwrap_or(id)
}
