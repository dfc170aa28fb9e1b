use async_trait::async_trait;
use std::fmt::Debug;

use crate::config::Opcode;
use crate::dsl::Step;
use crate::engine::trace::TraceFragment;
use crate::errors::InterpreterResult;
use crate::state::StateEnv;
use crate::value::Value;

/// Typed contract implemented by every opcode handler.
///
/// `parse` turns the generic [`Step`] into the handler's own argument struct;
/// `execute` reads and writes the shared state and produces the step's value.
/// Binding the value under the step's output variable is done by [`Interpret`].
#[async_trait]
pub trait StepHandler: Send + Sync {
    type Args: Send + Sync + Debug;

    fn opcode(&self) -> Opcode;

    fn parse(&self, step: &Step) -> InterpreterResult<Self::Args>;

    async fn execute(&self, state: &mut StateEnv, args: &Self::Args) -> InterpreterResult<Value>;

    /// Trace fragment for an executed step; the default renders the argument text
    /// and the output value.
    fn trace(&self, step: &Step, _args: &Self::Args, output: &Value) -> TraceFragment {
        TraceFragment::from_step(step, output)
    }
}

/// Object-safe form of [`StepHandler`] stored in the registry.
#[async_trait]
pub trait Interpret: Send + Sync {
    fn opcode(&self) -> Opcode;

    /// Parse, execute, and bind the output variable. Returns the produced value and,
    /// when `inspect` is set, the step's trace fragment.
    async fn interpret(
        &self,
        step: &Step,
        state: &mut StateEnv,
        inspect: bool,
    ) -> InterpreterResult<(Value, Option<TraceFragment>)>;
}

#[async_trait]
impl<H> Interpret for H
where
    H: StepHandler,
{
    fn opcode(&self) -> Opcode {
        StepHandler::opcode(self)
    }

    async fn interpret(
        &self,
        step: &Step,
        state: &mut StateEnv,
        inspect: bool,
    ) -> InterpreterResult<(Value, Option<TraceFragment>)> {
        let args = self.parse(step)?;
        let value = self.execute(state, &args).await?;
        state.bind(step.output_var.clone(), value.clone());
        let fragment = inspect.then(|| self.trace(step, &args, &value));
        Ok((value, fragment))
    }
}
