//! Restart attempt records

use anyhow::Result;
use tabled::Tabled;

use crate::client::{ApiClient, AttemptList, AttemptRecord};
use crate::output::{color_status, print_info, print_json, print_table, OutputFormat};

/// Row for the attempts table
#[derive(Tabled)]
struct AttemptRow {
    #[tabled(rename = "Namespace")]
    namespace: String,
    #[tabled(rename = "Pod")]
    pod: String,
    #[tabled(rename = "Attempts")]
    attempts: String,
    #[tabled(rename = "State")]
    state: String,
}

fn to_row(record: &AttemptRecord, max_restarts: u32) -> AttemptRow {
    let state = if record.escalated { "escalated" } else { "restarting" };
    AttemptRow {
        namespace: record.namespace.clone(),
        pod: record.pod_name.clone(),
        attempts: format!("{}/{}", record.attempts, max_restarts),
        state: color_status(state),
    }
}

/// List pods with restart attempts, optionally in one namespace
pub async fn list_attempts(
    client: &ApiClient,
    namespace: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let list: AttemptList = client.attempts(namespace.as_deref()).await?;

    match format {
        OutputFormat::Json => print_json(&list)?,
        OutputFormat::Table => {
            if list.attempts.is_empty() {
                print_info("No pods have been restarted");
                return Ok(());
            }

            let escalated = list.attempts.iter().filter(|a| a.escalated).count();
            let rows: Vec<AttemptRow> = list
                .attempts
                .iter()
                .map(|record| to_row(record, list.max_restarts))
                .collect();
            print_table(rows);
            println!(
                "\nTotal: {} pods, {} escalated (max restarts: {})",
                list.attempts.len(),
                escalated,
                list.max_restarts
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_shows_budget() {
        colored::control::set_override(false);
        let record = AttemptRecord {
            namespace: "default".into(),
            pod_name: "web-1".into(),
            attempts: 4,
            escalated: true,
        };

        let row = to_row(&record, 3);

        assert_eq!(row.attempts, "4/3");
        assert_eq!(row.state, "escalated");
    }
}
