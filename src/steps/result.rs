use async_trait::async_trait;

use crate::config::Opcode;
use crate::dsl::{ArgExpr, Literal, Step};
use crate::errors::{InterpreterError, InterpreterResult};
use crate::state::StateEnv;
use crate::traits::StepHandler;
use crate::value::Value;

#[derive(Debug)]
pub struct ResultArgs {
    pub var: String,
}

/// RESULT - copy a variable's value out as the program answer
pub struct ResultHandler;

impl ResultHandler {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ResultHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StepHandler for ResultHandler {
    type Args = ResultArgs;

    fn opcode(&self) -> Opcode {
        Opcode::Result
    }

    fn parse(&self, step: &Step) -> InterpreterResult<ResultArgs> {
        let var = match step.arg("var")? {
            ArgExpr::Var(name) => name.clone(),
            ArgExpr::Literal(Literal::Str(name)) => name.clone(),
            other => {
                return Err(InterpreterError::type_mismatch(
                    step.opcode.clone(),
                    "a variable name",
                    format!("'{}'", other),
                ))
            }
        };
        Ok(ResultArgs { var })
    }

    async fn execute(&self, state: &mut StateEnv, args: &ResultArgs) -> InterpreterResult<Value> {
        let value = state
            .get(&args.var)
            .ok_or_else(|| InterpreterError::NotFound(args.var.clone()))?;
        if value.is_empty_sentinel() {
            return Err(InterpreterError::EmptyResult(args.var.clone()));
        }
        Ok(value.clone())
    }
}
