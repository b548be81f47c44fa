use ansi_term::Style;
use anyhow::Result;

use crate::{
    metrics::MetricsSnapshot,
    store::{kv::KvStore, session_store::SessionStore},
    utils::{
        clock::{Clock, DefaultClock},
        format::short_duration,
    },
};

/// Prints the activity overview: calendar totals, status distributions, the
/// trailing trend and the newest entries.
pub fn process_dashboard_command<S: KvStore>(store: &SessionStore<S>) -> Result<()> {
    let snapshot = MetricsSnapshot::from_store(store, DefaultClock.time())?;
    let heading = Style::new().bold();

    println!("{}", heading.paint("Timesheet totals"));
    println!("Today\t\t{}", short_duration(snapshot.totals.today_ms));
    println!("This week\t{}", short_duration(snapshot.totals.week_ms));
    println!("This month\t{}", short_duration(snapshot.totals.month_ms));

    println!();
    println!("{}", heading.paint("Leaves by status"));
    for bucket in &snapshot.leaves_by_status {
        println!("{}\t{}", bucket.label, bucket.value as i64);
    }

    println!();
    println!("{}", heading.paint("Claims by status"));
    for bucket in &snapshot.claims_by_status {
        println!("{}\t{}", bucket.label, bucket.value as i64);
    }

    println!();
    println!("{}", heading.paint("Last 30 days"));
    println!("{:.1}h tracked", snapshot.trend_hours.iter().sum::<f64>());

    println!();
    println!("{}", heading.paint("Recent activity"));
    if snapshot.recent_activity.is_empty() {
        println!("No recent activity");
    } else {
        for (date, kind) in &snapshot.recent_activity {
            println!("{date}\t{kind}");
        }
    }
    Ok(())
}
