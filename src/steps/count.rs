//! COUNT and EXISTS: total operations over region lists and numbers.

use async_trait::async_trait;

use crate::config::Opcode;
use crate::dsl::{ArgExpr, Step};
use crate::errors::InterpreterResult;
use crate::state::StateEnv;
use crate::steps::args::resolve_value;
use crate::traits::StepHandler;
use crate::value::{Scalar, Value};

const REGION_ARG: [&str; 2] = ["region", "box"];

#[derive(Debug)]
pub struct RegionArgs {
    pub region: ArgExpr,
}

fn parse_region(step: &Step) -> InterpreterResult<RegionArgs> {
    Ok(RegionArgs {
        region: step.arg_any(&REGION_ARG)?.clone(),
    })
}

/// COUNT - number of regions, or a number passed through as an integer
pub struct CountHandler;

impl CountHandler {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CountHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StepHandler for CountHandler {
    type Args = RegionArgs;

    fn opcode(&self) -> Opcode {
        Opcode::Count
    }

    fn parse(&self, step: &Step) -> InterpreterResult<RegionArgs> {
        parse_region(step)
    }

    async fn execute(&self, state: &mut StateEnv, args: &RegionArgs) -> InterpreterResult<Value> {
        let count = match resolve_value(state, &args.region)? {
            Value::Scalar(Scalar::Int(i)) => i,
            Value::Scalar(Scalar::Float(f)) => f as i64,
            Value::Regions(regions) => regions.len() as i64,
            _ => 0,
        };
        Ok(Value::from(count))
    }
}

/// EXISTS - whether a region list is non-empty or a number is positive
pub struct ExistsHandler;

impl ExistsHandler {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ExistsHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StepHandler for ExistsHandler {
    type Args = RegionArgs;

    fn opcode(&self) -> Opcode {
        Opcode::Exists
    }

    fn parse(&self, step: &Step) -> InterpreterResult<RegionArgs> {
        parse_region(step)
    }

    async fn execute(&self, state: &mut StateEnv, args: &RegionArgs) -> InterpreterResult<Value> {
        let exists = match resolve_value(state, &args.region)? {
            Value::Regions(regions) => !regions.is_empty(),
            Value::Scalar(s) => s.as_number().map(|n| n > 0.0).unwrap_or(false),
            _ => false,
        };
        Ok(Value::from(exists))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::parse_step;
    use crate::errors::InterpreterError;
    use crate::traits::Interpret;
    use crate::value::{Rect, Region};

    fn regions(n: u32) -> Value {
        Value::Regions((0..n).map(|i| Region::new(Rect::new(i, i, i + 1, i + 1))).collect())
    }

    #[tokio::test]
    async fn test_count_passes_numbers_through() {
        let mut state = StateEnv::new();
        let (first, _) = CountHandler::new()
            .interpret(&parse_step("A=COUNT(region=5)").unwrap(), &mut state, false)
            .await
            .unwrap();
        let (second, _) = CountHandler::new()
            .interpret(&parse_step("B=COUNT(region=A)").unwrap(), &mut state, false)
            .await
            .unwrap();
        assert_eq!(first, Value::from(5i64));
        assert_eq!(second, Value::from(5i64));
    }

    #[tokio::test]
    async fn test_count_table() {
        struct TestCase {
            name: &'static str,
            bound: Value,
            expected: i64,
        }

        let cases = vec![
            TestCase { name: "two regions", bound: regions(2), expected: 2 },
            TestCase { name: "empty list", bound: regions(0), expected: 0 },
            TestCase { name: "float truncates", bound: Value::Scalar(Scalar::Float(3.7)), expected: 3 },
            TestCase { name: "string", bound: Value::from("three"), expected: 0 },
            TestCase { name: "single region", bound: Value::Region(Region::new(Rect::new(0, 0, 1, 1))), expected: 0 },
        ];

        for case in cases {
            let mut state = StateEnv::new().with("BOX", case.bound);
            let handler = CountHandler::new();
            let args = handler.parse(&parse_step("N=COUNT(box=BOX)").unwrap()).unwrap();
            let value = handler.execute(&mut state, &args).await.unwrap();
            assert_eq!(value, Value::from(case.expected), "case '{}'", case.name);
        }
    }

    #[tokio::test]
    async fn test_exists_table() {
        let cases = vec![
            (regions(0), false),
            (regions(1), true),
            (regions(3), true),
            (Value::from(0i64), false),
            (Value::from(3i64), true),
            (Value::from(-1i64), false),
            (Value::from("yes"), false),
            (Value::Null, false),
        ];

        for (bound, expected) in cases {
            let mut state = StateEnv::new().with("X", bound.clone());
            let handler = ExistsHandler::new();
            let args = handler.parse(&parse_step("E=EXISTS(region=X)").unwrap()).unwrap();
            let value = handler.execute(&mut state, &args).await.unwrap();
            assert_eq!(value, Value::from(expected), "EXISTS({:?})", bound);
        }
    }

    #[tokio::test]
    async fn test_unbound_region_is_undefined() {
        let handler = ExistsHandler::new();
        let args = handler.parse(&parse_step("E=EXISTS(region=NOPE)").unwrap()).unwrap();
        let err = handler.execute(&mut StateEnv::new(), &args).await.unwrap_err();
        assert!(matches!(err, InterpreterError::UndefinedVariable(_)));
    }
}
