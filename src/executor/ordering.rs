use crate::error::FlowError;
use crate::flow::{Flow, Step};
use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::warn;

/// What to do when the edges of a flow contain a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CyclePolicy {
    /// Ignore the edges and run the steps in declaration order.
    #[default]
    DeclarationOrder,
    /// Fail the run with `FlowError::CyclicGraph`.
    Reject,
}

/// The order in which a flow's steps will run.
#[derive(Debug)]
pub struct ExecutionOrder<'a> {
    pub steps: Vec<&'a Step>,
    /// Set when a cycle forced the declaration-order fallback.
    pub fell_back: bool,
}

/// Orders steps with Kahn's algorithm. Zero in-degree steps are dequeued FIFO,
/// seeded in declaration order; successors are visited in edge declaration order.
/// Edges with an unknown endpoint are dropped and duplicate edges count once.
pub fn execution_order(flow: &Flow, policy: CyclePolicy) -> Result<ExecutionOrder<'_>, FlowError> {
    let index: AHashMap<&str, usize> = flow
        .steps
        .iter()
        .enumerate()
        .map(|(i, step)| (step.id.as_str(), i))
        .collect();

    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); flow.steps.len()];
    let mut in_degree: Vec<usize> = vec![0; flow.steps.len()];
    let mut seen_edges = AHashSet::new();

    for edge in &flow.edges {
        let (Some(&from), Some(&to)) = (index.get(edge.from.as_str()), index.get(edge.to.as_str()))
        else {
            continue;
        };
        if seen_edges.insert((from, to)) {
            successors[from].push(to);
            in_degree[to] += 1;
        }
    }

    let mut queue: VecDeque<usize> = (0..flow.steps.len())
        .filter(|&i| in_degree[i] == 0)
        .collect();
    let mut ordered = Vec::with_capacity(flow.steps.len());

    while let Some(current) = queue.pop_front() {
        ordered.push(current);
        for &next in &successors[current] {
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                queue.push_back(next);
            }
        }
    }

    if ordered.len() == flow.steps.len() {
        return Ok(ExecutionOrder {
            steps: ordered.into_iter().map(|i| &flow.steps[i]).collect(),
            fell_back: false,
        });
    }

    let unresolved: Vec<String> = (0..flow.steps.len())
        .filter(|&i| in_degree[i] > 0)
        .map(|i| flow.steps[i].id.clone())
        .collect();

    match policy {
        CyclePolicy::Reject => Err(FlowError::CyclicGraph { unresolved }),
        CyclePolicy::DeclarationOrder => {
            warn!(
                steps = ?unresolved,
                "cycle detected in flow edges, falling back to declaration order"
            );
            Ok(ExecutionOrder {
                steps: flow.steps.iter().collect(),
                fell_back: true,
            })
        }
    }
}
