use async_trait::async_trait;
use std::sync::Arc;

use crate::config::consts::DEFAULT_LIST_MAX;
use crate::config::Opcode;
use crate::dsl::{ArgExpr, Step};
use crate::errors::{InterpreterError, InterpreterResult};
use crate::state::StateEnv;
use crate::steps::args::{resolve_value, TextArg};
use crate::traits::capability::LIST_GENERATOR;
use crate::traits::{ListGenerator, StepHandler};
use crate::value::{Scalar, Value};

#[derive(Debug)]
pub struct ListArgs {
    pub query: TextArg,
    pub max: Option<ArgExpr>,
}

/// LIST - ask the list generator for at most `max` items matching a query
pub struct ListHandler {
    generator: Arc<dyn ListGenerator>,
}

impl ListHandler {
    pub fn new(generator: Arc<dyn ListGenerator>) -> Self {
        Self { generator }
    }
}

fn max_items(state: &StateEnv, max: Option<&ArgExpr>) -> InterpreterResult<usize> {
    let Some(expr) = max else {
        return Ok(DEFAULT_LIST_MAX);
    };
    let opcode = Opcode::List.as_str();
    match resolve_value(state, expr)? {
        Value::Scalar(Scalar::Int(n)) => Ok(n.max(0) as usize),
        Value::Scalar(Scalar::Float(f)) => Ok(f.max(0.0) as usize),
        Value::Scalar(Scalar::Str(s)) => s
            .trim()
            .parse::<usize>()
            .map_err(|_| InterpreterError::type_mismatch(opcode, "a count", format!("'{}'", s))),
        other => Err(InterpreterError::type_mismatch(opcode, "a count", other.kind())),
    }
}

#[async_trait]
impl StepHandler for ListHandler {
    type Args = ListArgs;

    fn opcode(&self) -> Opcode {
        Opcode::List
    }

    fn parse(&self, step: &Step) -> InterpreterResult<ListArgs> {
        Ok(ListArgs {
            query: TextArg::from_step(step, "query")?,
            max: step.optional("max").cloned(),
        })
    }

    async fn execute(&self, state: &mut StateEnv, args: &ListArgs) -> InterpreterResult<Value> {
        let max = max_items(state, args.max.as_ref())?;
        let query = args.query.resolve(state);
        let mut items = self
            .generator
            .generate(&query, max)
            .await
            .map_err(|e| InterpreterError::capability(Opcode::List.as_str(), LIST_GENERATOR, e))?;
        items.truncate(max);
        Ok(Value::List(items.into_iter().map(Scalar::Str).collect()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::stub::StubListGenerator;
    use crate::dsl::parse_step;

    fn generator() -> Arc<StubListGenerator> {
        Arc::new(StubListGenerator::new(["Alice", "Bob", "Carol"]))
    }

    #[tokio::test]
    async fn test_list_truncates_to_max() {
        let handler = ListHandler::new(generator());
        let args = handler.parse(&parse_step("LIST0=LIST(query='friends',max=2)").unwrap()).unwrap();
        let value = handler.execute(&mut StateEnv::new(), &args).await.unwrap();
        assert_eq!(value, Value::List(vec!["Alice".into(), "Bob".into()]));
    }

    #[tokio::test]
    async fn test_default_max() {
        let generator = generator();
        let handler = ListHandler::new(generator.clone());
        let args = handler.parse(&parse_step("LIST0=LIST(query='friends')").unwrap()).unwrap();
        let value = handler.execute(&mut StateEnv::new(), &args).await.unwrap();
        assert!(matches!(value, Value::List(items) if items.len() == 3));
        assert_eq!(generator.requests(), vec![("friends".to_string(), DEFAULT_LIST_MAX)]);
    }

    #[tokio::test]
    async fn test_bad_max_is_type_mismatch() {
        let handler = ListHandler::new(generator());
        let args = handler.parse(&parse_step("LIST0=LIST(query='friends',max='lots')").unwrap()).unwrap();
        let err = handler.execute(&mut StateEnv::new(), &args).await.unwrap_err();
        assert!(matches!(err, InterpreterError::TypeMismatch { .. }));
    }
}
