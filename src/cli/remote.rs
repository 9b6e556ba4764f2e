//! Client commands against a running server.

use anyhow::{bail, Context, Result};
use onsa_core::wire::DiscoveryFilter;
use onsa_core::{A2aClient, AgentStatus, Parameters, TaskRequest, TaskStatus};
use serde_json::Value;

pub async fn status(url: &str) -> Result<()> {
    let client = A2aClient::new(url)?;
    let report = client
        .health()
        .await
        .with_context(|| format!("Failed to reach {}", url))?;
    let stats = report.registry;

    println!("Server:        {} ({})", url, report.status);
    println!(
        "Agents:        {} total, {} healthy, {} unhealthy",
        stats.total_agents, stats.healthy_agents, stats.unhealthy_agents
    );
    println!(
        "Requests:      {} ({} ok, {} failed, {:.1}% success)",
        stats.total_requests, stats.total_successes, stats.total_failures, stats.success_rate
    );
    Ok(())
}

pub async fn discover(url: &str, capability: Option<String>, status: Option<&str>) -> Result<()> {
    let status = status
        .map(str::parse::<AgentStatus>)
        .transpose()
        .context("Invalid --status")?;
    let filter = DiscoveryFilter { status, capability };

    let client = A2aClient::new(url)?;
    let response = client
        .discover(&filter)
        .await
        .with_context(|| format!("Discovery against {} failed", url))?;

    if response.agents.is_empty() {
        println!("No agents found.");
        return Ok(());
    }

    for agent in &response.agents {
        let capabilities: Vec<&str> = agent.capabilities.iter().map(|c| c.name.as_str()).collect();
        println!(
            "{:<24} {:<24} {:<9} [{}]",
            agent.agent_id,
            agent.name,
            agent.status,
            capabilities.join(", ")
        );
    }
    println!("{} agent(s)", response.count);
    Ok(())
}

pub async fn task(url: &str, capability: &str, params: &str, agent: Option<&str>) -> Result<()> {
    let parameters = parse_parameters(params)?;
    let request = TaskRequest::new(capability, parameters);

    let client = A2aClient::new(url)?;
    let outcome = match agent {
        Some(agent_id) => client.execute_on(agent_id, &request).await,
        None => client.execute_task(&request).await,
    }
    .with_context(|| format!("Task '{}' was not dispatched", capability))?;

    println!(
        "Task {} on {} ({}): {} in {}ms",
        outcome.task.task_id,
        outcome.agent.name,
        outcome.agent.id,
        outcome.task.status,
        outcome.duration_ms
    );

    match outcome.task.status {
        TaskStatus::Completed => {
            let result = outcome.task.result.unwrap_or(Value::Null);
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        _ => bail!(
            "Task failed: {}",
            outcome.task.error.unwrap_or_else(|| "unknown error".to_string())
        ),
    }
}

fn parse_parameters(params: &str) -> Result<Parameters> {
    match serde_json::from_str::<Value>(params).context("--params is not valid JSON")? {
        Value::Object(map) => Ok(map),
        other => bail!("--params must be a JSON object, got {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_parameters() {
        let map = parse_parameters(r#"{"lead": "acme", "score": 7}"#).unwrap();
        assert_eq!(map["lead"], "acme");
        assert!(parse_parameters("[1, 2]").is_err());
        assert!(parse_parameters("{oops").is_err());
    }
}
