use async_trait::async_trait;

use crate::engine::trace::Trace;
use crate::errors::InterpreterResult;
use crate::state::StateEnv;
use crate::value::Value;

/// Result of one program run.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgramOutput {
    /// Value produced by the last step.
    pub value: Value,
    /// One fragment per executed step, present when the run was inspected.
    pub trace: Option<Trace>,
}

#[async_trait]
pub trait ProgramExecutor: Send + Sync {
    /// Execute a program against a caller-owned state.
    ///
    /// - `program`: multi-line program text, one step per non-empty line
    /// - `state`: state environment, pre-populated with images or image paths
    /// - `inspect`: collect a trace fragment per step
    ///
    /// The first failing step aborts the run; bindings made by earlier steps stay
    /// in `state`.
    async fn execute(&self, program: &str, state: &mut StateEnv, inspect: bool) -> InterpreterResult<ProgramOutput>;

    /// Execute without tracing, taking and returning ownership of the state.
    async fn run(&self, program: &str, mut state: StateEnv) -> InterpreterResult<(Value, StateEnv)> {
        let output = self.execute(program, &mut state, false).await?;
        Ok((output.value, state))
    }
}
