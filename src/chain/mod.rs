//! Action chains: `;`-separated gesture scripts run as one unit.
//!
//! A chain is validated in full before anything runs. Execution is strictly
//! sequential; a failed critical step (or any handler fault) stops the chain
//! and the steps already run are reported.

mod action;
mod handlers;
mod policy;
mod registry;
mod result;

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;

pub use action::{parse_chain, Action, ActionChain, ParseError, MAX_STEPS};
pub use handlers::{
    builtin_registry, Capture, ClickAt, ClickHere, Controllers, DragTo, MoveTo, Press, Scroll,
    TypeText,
};
pub use policy::CriticalityPolicy;
pub use registry::{ActionHandler, HandlerRegistry};
pub use result::{ChainState, ExecutionResult, StepResult};

pub struct ChainProcessor {
    registry: Arc<HandlerRegistry>,
    policy: CriticalityPolicy,
}

impl ChainProcessor {
    pub fn new(registry: Arc<HandlerRegistry>, policy: CriticalityPolicy) -> Self {
        Self { registry, policy }
    }

    pub fn parse(&self, raw: &str) -> Result<ActionChain, ParseError> {
        parse_chain(raw, &self.registry)
    }

    /// Validates and runs `raw`. Never fails: every outcome is reported in
    /// the returned result.
    pub async fn run(&self, raw: &str) -> ExecutionResult {
        match self.parse(raw) {
            Ok(chain) => self.execute(&chain).await,
            Err(e) => {
                log::warn!("chain: rejected '{raw}': {e}");
                ExecutionResult::rejected()
            }
        }
    }

    /// Runs a single action without chain parsing, so `params` may contain
    /// `;`.
    pub async fn run_action(&self, prefix: &str, params: &str) -> ExecutionResult {
        if !self.registry.contains(prefix) {
            log::warn!("chain: no handler for '{prefix}'");
            return ExecutionResult::rejected();
        }
        let action = Action {
            prefix: prefix.to_owned(),
            params: params.to_owned(),
            raw: format!("{prefix}{params}"),
        };
        let chain = ActionChain {
            raw: action.raw.clone(),
            actions: vec![action],
        };
        self.execute(&chain).await
    }

    pub async fn execute(&self, chain: &ActionChain) -> ExecutionResult {
        let total = chain.actions.len();
        let mut results = Vec::with_capacity(total);
        log::info!("chain: executing {total} step(s)");

        for (index, action) in chain.actions.iter().enumerate() {
            let step = index + 1;
            let (result, fault) = self.step(step, action).await;
            let failed = !result.success;
            if let Some(error) = &result.error {
                log::error!("chain: step {step} '{}' failed: {error}", action.raw);
            }
            results.push(result);

            if fault || (failed && self.policy.is_critical(&action.prefix)) {
                log::warn!("chain: stopping after step {step} of {total}");
                break;
            }
        }

        let outcome = ExecutionResult::from_steps(total, results);
        log::info!(
            "chain: {} ({}/{} executed)",
            if outcome.success { "succeeded" } else { "failed" },
            outcome.executed,
            outcome.steps
        );
        outcome
    }

    /// Runs one step. The flag is `true` when the handler panicked.
    async fn step(&self, step: usize, action: &Action) -> (StepResult, bool) {
        let Some(handler) = self.registry.get(&action.prefix) else {
            // Parsing only admits registered prefixes.
            return (
                StepResult::failed(step, &action.raw, format!("no handler for {}", action.prefix)),
                true,
            );
        };

        let call = AssertUnwindSafe(handler.handle(&action.params)).catch_unwind();
        match call.await {
            Ok(Ok(output)) => (StepResult::ok(step, &action.raw, output), false),
            Ok(Err(e)) => (StepResult::failed(step, &action.raw, e.to_string()), false),
            Err(payload) => {
                let message = format!("Unexpected error: {}", panic_message(&*payload));
                (StepResult::failed(step, &action.raw, message), true)
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "handler panicked"
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::platform::PlatformError;

    #[derive(Default)]
    struct Journal(Mutex<Vec<String>>);

    impl Journal {
        fn entries(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }
    }

    /// Records every call; fails on negative `x,y` and panics on `boom`.
    struct Scripted {
        name: &'static str,
        journal: Arc<Journal>,
    }

    #[async_trait]
    impl ActionHandler for Scripted {
        async fn handle(&self, params: &str) -> Result<String, PlatformError> {
            self.journal
                .0
                .lock()
                .unwrap()
                .push(format!("{}{params}", self.name));
            if params == "boom" {
                panic!("handler exploded");
            }
            if params.starts_with('-') {
                return Err(PlatformError::InvalidAction(format!(
                    "Invalid coordinates: {params} - must be positive"
                )));
            }
            Ok(format!("{} done", self.name))
        }
    }

    fn processor(policy: CriticalityPolicy) -> (ChainProcessor, Arc<Journal>) {
        let journal = Arc::new(Journal::default());
        let mut registry = HandlerRegistry::new();
        for name in ["click:", "type:", "press:", "scroll:"] {
            registry.register(
                name,
                Arc::new(Scripted {
                    name,
                    journal: journal.clone(),
                }),
            );
        }
        (ChainProcessor::new(Arc::new(registry), policy), journal)
    }

    #[tokio::test]
    async fn every_step_runs_in_order() {
        let (chain, journal) = processor(CriticalityPolicy::all_critical());
        let result = chain.run("click:10,10;type:hi;press:enter").await;

        assert!(result.success);
        assert_eq!((result.steps, result.executed), (3, 3));
        assert_eq!(result.state, ChainState::Completed);
        assert_eq!(journal.entries(), ["click:10,10", "type:hi", "press:enter"]);
        assert_eq!(result.results[1].step, 2);
        assert_eq!(result.results[1].action, "type:hi");
    }

    #[tokio::test]
    async fn critical_failure_stops_the_chain() {
        let (chain, journal) = processor(CriticalityPolicy::all_critical());
        let result = chain.run("click:10,10;click:-1,-1;type:never").await;

        assert!(!result.success);
        assert_eq!((result.steps, result.executed), (3, 2));
        assert_eq!(result.state, ChainState::Aborted);
        let last = result.results.last().unwrap();
        assert!(!last.success);
        assert_eq!(
            last.error.as_deref(),
            Some("Invalid coordinates: -1,-1 - must be positive")
        );
        assert_eq!(journal.entries().len(), 2);
    }

    #[tokio::test]
    async fn non_critical_failure_continues() {
        let (chain, journal) = processor(CriticalityPolicy::with_non_critical(["scroll:"]));
        let result = chain.run("scroll:-3;type:ok").await;

        assert!(!result.success);
        assert_eq!(result.executed, 2);
        assert_eq!(result.state, ChainState::Completed);
        assert_eq!(journal.entries(), ["scroll:-3", "type:ok"]);
    }

    #[tokio::test]
    async fn handler_panic_is_contained() {
        let (chain, journal) = processor(CriticalityPolicy::with_non_critical(["type:"]));
        let result = chain.run("type:boom;press:enter").await;

        assert!(!result.success);
        assert_eq!(result.executed, 1);
        assert_eq!(
            result.results[0].error.as_deref(),
            Some("Unexpected error: handler exploded")
        );
        assert_eq!(journal.entries(), ["type:boom"]);
    }

    #[tokio::test]
    async fn invalid_chain_runs_nothing() {
        let (chain, journal) = processor(CriticalityPolicy::all_critical());
        let result = chain.run("click:1,1;fly:away").await;

        assert_eq!(result, ExecutionResult::rejected());
        assert!(journal.entries().is_empty());
    }

    #[tokio::test]
    async fn single_action_keeps_semicolons() {
        let (chain, journal) = processor(CriticalityPolicy::all_critical());
        let result = chain.run_action("type:", "a;b").await;

        assert!(result.success);
        assert_eq!(journal.entries(), ["type:a;b"]);
        assert_eq!(
            chain.run_action("fly:", "away").await,
            ExecutionResult::rejected()
        );
    }

    #[test]
    fn panic_payloads_are_described() {
        let owned: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(&*owned), "owned");
        let other: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(&*other), "handler panicked");
    }
}
