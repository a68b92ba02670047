use engram_core::model::{Entity, Relationship};
use engram_core::storage::TaskWorkflowState;
use engram_validate::Verdict;
use engram_workflow::{GateRun, WorkflowStatus};

use super::OutputFormat;

fn short(id: impl ToString) -> String {
    let s = id.to_string();
    s[..8.min(s.len())].to_string()
}

pub fn format_entity_list(entities: &[Entity], fmt: OutputFormat) -> String {
    match fmt {
        OutputFormat::Json => serde_json::to_string_pretty(entities).unwrap_or_default(),
        OutputFormat::Text => {
            if entities.is_empty() {
                return "No entities found.".to_string();
            }
            let mut out = String::new();
            for e in entities {
                out.push_str(&format!(
                    "\u{25c6} {} {:<16} {:<28} {}  [{}]  {}\n",
                    short(e.id),
                    e.kind_name(),
                    truncate(e.payload.title(), 28),
                    e.status,
                    e.agent,
                    e.created_at.format("%Y-%m-%d %H:%M"),
                ));
            }
            out
        }
    }
}

pub fn format_entity_full(entity: &Entity, fmt: OutputFormat) -> String {
    match fmt {
        OutputFormat::Json => serde_json::to_string_pretty(entity).unwrap_or_default(),
        OutputFormat::Text => {
            let mut out = String::new();
            out.push_str(&format!("Entity:  {}\n", entity.id));
            out.push_str(&format!("Kind:    {}\n", entity.kind_name()));
            out.push_str(&format!("Title:   {}\n", entity.payload.title()));
            out.push_str(&format!("Status:  {}\n", entity.status));
            out.push_str(&format!("Agent:   {}\n", entity.agent));
            out.push_str(&format!(
                "Created: {}\n",
                entity.created_at.format("%Y-%m-%d %H:%M:%S UTC")
            ));
            out.push_str(&format!(
                "Updated: {}\n",
                entity.updated_at.format("%Y-%m-%d %H:%M:%S UTC")
            ));
            out
        }
    }
}

pub fn format_relationships(rels: &[Relationship], fmt: OutputFormat) -> String {
    match fmt {
        OutputFormat::Json => serde_json::to_string_pretty(rels).unwrap_or_default(),
        OutputFormat::Text => {
            if rels.is_empty() {
                return "No relationships found.".to_string();
            }
            let mut out = String::new();
            for r in rels {
                out.push_str(&format!(
                    "{} ({}) --{}--> {} ({})\n",
                    short(r.source_id),
                    r.source_kind,
                    r.rel_type,
                    short(r.target_id),
                    r.target_kind,
                ));
            }
            out
        }
    }
}

pub fn format_workflow_status(status: &WorkflowStatus, fmt: OutputFormat) -> String {
    match fmt {
        OutputFormat::Json => serde_json::to_string_pretty(&serde_json::json!({
            "task_id": status.state.task_id,
            "workflow": status.workflow_name,
            "stage": status.state.stage,
            "terminal": status.is_terminal(),
            "commit_policy": status.stage.commit_policy,
            "gate_results": status.state.gate_results,
        }))
        .unwrap_or_default(),
        OutputFormat::Text => {
            let mut out = String::new();
            out.push_str(&format!("Task:     {}\n", status.state.task_id));
            out.push_str(&format!("Workflow: {}\n", status.workflow_name));
            out.push_str(&format!(
                "Stage:    {}{}\n",
                status.state.stage,
                if status.is_terminal() { " (terminal)" } else { "" }
            ));
            out.push_str(&format!("Policy:   {:?}\n", status.stage.commit_policy));
            for (idx, gate) in status.stage.quality_gates.iter().enumerate() {
                let verdict = match status.state.gate_results.get(&idx) {
                    Some(true) => "satisfied",
                    Some(false) => "unsatisfied",
                    None => "not run",
                };
                let req = if gate.required { "required" } else { "optional" };
                out.push_str(&format!("Gate:     `{}` ({req}) {verdict}\n", gate.command));
            }
            out
        }
    }
}

pub fn format_gate_runs(runs: &[GateRun], state: &TaskWorkflowState, fmt: OutputFormat) -> String {
    match fmt {
        OutputFormat::Json => serde_json::to_string_pretty(&serde_json::json!({
            "stage": state.stage,
            "runs": runs
                .iter()
                .map(|r| {
                    serde_json::json!({
                        "command": r.command,
                        "outcome": r.outcome,
                        "duration_ms": r.duration_ms,
                    })
                })
                .collect::<Vec<_>>(),
        }))
        .unwrap_or_default(),
        OutputFormat::Text => {
            let mut out = String::new();
            for r in runs {
                out.push_str(&format!(
                    "`{}` -> {:?} ({}ms)\n",
                    r.command, r.outcome, r.duration_ms
                ));
            }
            out.push_str(&format!("Stage after run: {}\n", state.stage));
            out
        }
    }
}

pub fn format_verdict(verdict: &Verdict, fmt: OutputFormat) -> String {
    match fmt {
        OutputFormat::Json => serde_json::to_string_pretty(verdict).unwrap_or_default(),
        OutputFormat::Text => match verdict {
            Verdict::Accept { task_id } => format!("accepted [{task_id}]"),
            Verdict::Reject { task_id, reason } => match task_id {
                Some(id) => format!("rejected [{id}]: {reason}"),
                None => format!("rejected: {reason}"),
            },
        },
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}\u{2026}")
    }
}
