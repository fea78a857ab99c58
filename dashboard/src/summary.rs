use roadlenscore::feed::LaneSummary;
use roadlenscore::{Category, Snapshot};
use std::time::Duration;

/// One console line describing a snapshot.
pub fn summary_line(snapshot: &Snapshot) -> String {
    let counts: Vec<String> = Category::ALL
        .into_iter()
        .map(|category| format!("{}={}", category, snapshot.detections.len(category)))
        .collect();

    let mut line = format!(
        "{} | {}",
        if snapshot.connected { "online" } else { "offline" },
        counts.join(" ")
    );

    if let Some(app_data) = &snapshot.app_data {
        line.push_str(&format!(
            " | lookout vehicles={} persons={}",
            app_data.lookout_vehicles.len(),
            app_data.lookout_persons.len()
        ));
    }

    if let Some(tick) = snapshot.detections.latest_traffic() {
        let lanes: Vec<String> = tick.summarize().iter().map(lane_label).collect();
        line.push_str(&format!(" | traffic {}", lanes.join(" ")));
    }

    line
}

pub fn offline_line(retry_delay: Duration) -> String {
    format!("offline, retrying every {:?}", retry_delay)
}

fn lane_label(lane: &LaneSummary) -> String {
    match lane.avg_elapsed_time {
        Some(wait) => format!(
            "{}:{:?}({}, {:.0}s avg, {:.0}s delay)",
            lane.video_id, lane.density, lane.total_vehicles, wait, lane.cumulative_delay
        ),
        None => format!("{}:{:?}(0)", lane.video_id, lane.density),
    }
}
