//! Superstep scheduling: runs the current frontier's nodes concurrently,
//! bounded by a concurrency limit, and collects their [`NodePartial`] outputs.
//!
//! Nodes in a frontier are independent by construction (they were reached via
//! distinct edges in the same step), so the scheduler can run them on separate
//! tasks. [`SchedulerState`] persists the version each node last observed per
//! channel, which a future gating pass can use to skip nodes whose inputs
//! haven't changed since their last run.

use std::sync::Arc;

use miette::Diagnostic;
use rustc_hash::FxHashMap;
use thiserror::Error;
use tokio::task::JoinError;

use crate::event_bus::EventEmitter;
use crate::node::{Node, NodeContext, NodeError, NodePartial};
use crate::state::StateSnapshot;
use crate::types::NodeKind;

/// Runs one superstep at a time for a session, bounded by `concurrency_limit`.
#[derive(Debug, Clone)]
pub struct Scheduler {
    pub concurrency_limit: usize,
}

/// Per-session bookkeeping the scheduler carries across supersteps.
///
/// `versions_seen` maps node id -> channel name -> the channel version that
/// node last ran against, restored from a checkpoint on session resume.
#[derive(Debug, Clone, Default)]
pub struct SchedulerState {
    pub versions_seen: FxHashMap<String, FxHashMap<String, u64>>,
}

/// Outcome of running one superstep.
#[derive(Debug, Clone)]
pub struct SuperstepResult {
    pub ran_nodes: Vec<NodeKind>,
    pub outputs: Vec<(NodeKind, NodePartial)>,
}

#[derive(Debug, Error, Diagnostic)]
pub enum SchedulerError {
    #[error("node {kind:?} failed at step {step}: {source}")]
    #[diagnostic(code(wellspring_core::scheduler::node_run))]
    NodeRun {
        kind: NodeKind,
        step: u64,
        #[source]
        source: NodeError,
    },

    #[error("scheduler task join error: {0}")]
    #[diagnostic(code(wellspring_core::scheduler::join))]
    Join(#[from] JoinError),
}

impl Scheduler {
    pub fn new(concurrency_limit: usize) -> Self {
        Self {
            concurrency_limit: concurrency_limit.max(1),
        }
    }

    /// Runs every node in `frontier` concurrently (bounded by
    /// `concurrency_limit`) against the same `snapshot`, returning each
    /// node's output in frontier order.
    pub async fn superstep(
        &self,
        scheduler_state: &mut SchedulerState,
        nodes: &FxHashMap<NodeKind, Arc<dyn Node>>,
        frontier: Vec<NodeKind>,
        snapshot: StateSnapshot,
        step: u64,
        emitter: Arc<dyn EventEmitter>,
    ) -> Result<SuperstepResult, SchedulerError> {
        let mut ran_nodes = Vec::with_capacity(frontier.len());
        let mut outputs = Vec::with_capacity(frontier.len());

        for batch in frontier.chunks(self.concurrency_limit.max(1)) {
            let mut join_set = tokio::task::JoinSet::new();

            for kind in batch {
                let Some(node) = nodes.get(kind).cloned() else {
                    continue;
                };
                let kind = kind.clone();
                let snapshot = snapshot.clone();
                let ctx = NodeContext {
                    node_id: kind.encode(),
                    step,
                    event_emitter: emitter.clone(),
                };
                join_set.spawn(async move {
                    let result = node.run(snapshot, ctx).await;
                    (kind, result)
                });
            }

            while let Some(joined) = join_set.join_next().await {
                let (kind, result) = joined?;
                let partial = result.map_err(|source| SchedulerError::NodeRun {
                    kind: kind.clone(),
                    step,
                    source,
                })?;
                scheduler_state
                    .versions_seen
                    .entry(kind.encode().to_string())
                    .or_default()
                    .insert("messages".to_string(), u64::from(snapshot.messages_version));
                ran_nodes.push(kind.clone());
                outputs.push((kind, partial));
            }
        }

        Ok(SuperstepResult { ran_nodes, outputs })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::errors::ErrorEvent;
    use crate::event_bus::EventBus;
    use crate::state::VersionedState;
    use async_trait::async_trait;

    struct EchoNode;

    #[async_trait]
    impl Node for EchoNode {
        async fn run(
            &self,
            _snapshot: StateSnapshot,
            _ctx: NodeContext,
        ) -> Result<NodePartial, NodeError> {
            Ok(NodePartial::new().with_messages(vec![crate::message::Message::assistant("ok")]))
        }
    }

    struct FailingNode;

    #[async_trait]
    impl Node for FailingNode {
        async fn run(
            &self,
            _snapshot: StateSnapshot,
            _ctx: NodeContext,
        ) -> Result<NodePartial, NodeError> {
            Err(NodeError::ValidationFailed("boom".into()))
        }
    }

    fn snapshot() -> StateSnapshot {
        VersionedState::new_with_user_message("hi").snapshot()
    }

    #[tokio::test]
    async fn runs_every_node_in_the_frontier() {
        let mut nodes: FxHashMap<NodeKind, Arc<dyn Node>> = FxHashMap::default();
        nodes.insert(NodeKind::Custom("echo".into()), Arc::new(EchoNode));

        let scheduler = Scheduler::new(4);
        let mut state = SchedulerState::default();
        let bus = EventBus::default();
        let result = scheduler
            .superstep(
                &mut state,
                &nodes,
                vec![NodeKind::Custom("echo".into())],
                snapshot(),
                1,
                bus.get_emitter(),
            )
            .await
            .unwrap();

        assert_eq!(result.ran_nodes.len(), 1);
        assert_eq!(result.outputs.len(), 1);
    }

    #[tokio::test]
    async fn node_error_surfaces_as_scheduler_error() {
        let mut nodes: FxHashMap<NodeKind, Arc<dyn Node>> = FxHashMap::default();
        nodes.insert(NodeKind::Custom("fail".into()), Arc::new(FailingNode));

        let scheduler = Scheduler::new(2);
        let mut state = SchedulerState::default();
        let bus = EventBus::default();
        let err = scheduler
            .superstep(
                &mut state,
                &nodes,
                vec![NodeKind::Custom("fail".into())],
                snapshot(),
                1,
                bus.get_emitter(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, SchedulerError::NodeRun { .. }));
    }

    #[test]
    fn concurrency_limit_is_never_zero() {
        assert_eq!(Scheduler::new(0).concurrency_limit, 1);
    }

    #[allow(dead_code)]
    fn silence_unused_import(_e: ErrorEvent) {}
}
