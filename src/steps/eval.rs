// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use crate::config::Opcode;
use crate::dsl::{expr, ArgExpr, Literal, Step};
use crate::engine::trace::TraceFragment;
use crate::errors::InterpreterResult;
use crate::state::StateEnv;
use crate::traits::StepHandler;
use crate::value::Value;

#[derive(Debug)]
pub struct EvalArgs {
    pub expr: String,
}

/// EVAL - evaluate a scalar expression over earlier answers
pub struct EvalHandler;

impl EvalHandler {
    pub fn new() -> Self {
        Self
    }
}

impl Default for EvalHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StepHandler for EvalHandler {
    type Args = EvalArgs;

    fn opcode(&self) -> Opcode {
        Opcode::Eval
    }

    fn parse(&self, step: &Step) -> InterpreterResult<EvalArgs> {
        let expr = match step.arg("expr")? {
            ArgExpr::Literal(Literal::Str(s)) => s.clone(),
            other => other.to_string(),
        };
        expr::validate(&expr)?;
        Ok(EvalArgs { expr })
    }

    async fn execute(&self, state: &mut StateEnv, args: &EvalArgs) -> InterpreterResult<Value> {
        let result = expr::evaluate(&args.expr, |name| state.get(name).cloned())?;
        Ok(Value::Scalar(result))
    }

    fn trace(&self, step: &Step, args: &EvalArgs, output: &Value) -> TraceFragment {
        let mut fragment = TraceFragment::from_step(step, output);
        fragment.inputs = vec![("expr".to_string(), args.expr.clone())];
        fragment
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::parse_step;
    use crate::errors::InterpreterError;
    use crate::traits::Interpret;

    #[tokio::test]
    async fn test_eval_binds_output() {
        let mut state = StateEnv::new().with("ANSWER0", "yes").with("ANSWER1", "yes");
        let step = parse_step(r#"ANSWER2=EVAL(expr="{ANSWER0} and {ANSWER1}")"#).unwrap();
        let (value, fragment) = EvalHandler::new().interpret(&step, &mut state, true).await.unwrap();
        assert_eq!(value, Value::from(true));
        assert_eq!(state.get("ANSWER2"), Some(&Value::from(true)));
        assert_eq!(fragment.unwrap().to_string(), "ANSWER2=EVAL(expr={ANSWER0} and {ANSWER1})=true");
    }

    #[test]
    fn test_malformed_expression_fails_at_parse() {
        let step = parse_step(r#"A=EVAL(expr="1 +")"#).unwrap();
        assert!(matches!(EvalHandler::new().parse(&step), Err(InterpreterError::Eval { .. })));
    }
}
