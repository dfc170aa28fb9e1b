// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;

use crate::config::HandlerRegistry;
use crate::dsl::{parse_step, parse_step_header, Program};
use crate::engine::trace::Trace;
use crate::errors::{InterpreterError, InterpreterResult};
use crate::observability::messages::executor::{
    ProgramCompleted, ProgramStarted, StepCompleted, StepFailed, StepStarted,
};
use crate::observability::messages::StructuredLog;
use crate::state::StateEnv;
use crate::traits::{ProgramExecutor, ProgramOutput};
use crate::value::Value;

/// Executes a program one line at a time, in order, against one state.
///
/// For every line the executor:
/// 1. reads only the `var = OPCODE(` header to pick the handler
/// 2. lets the handler parse the full line into its own argument struct
/// 3. awaits the handler, which binds the produced value under `var`
///
/// The first failing line aborts the program; nothing is retried. Steps never run
/// concurrently, since any step may read a binding made by any earlier step.
pub struct SequentialExecutor {
    registry: Arc<HandlerRegistry>,
}

impl SequentialExecutor {
    pub fn new(registry: Arc<HandlerRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    async fn execute_line(
        &self,
        index: usize,
        line: &str,
        state: &mut StateEnv,
        trace: Option<&mut Trace>,
    ) -> InterpreterResult<Value> {
        let header = parse_step_header(line)?;
        let handler = self.registry.get(&header.opcode)?;
        let step = parse_step(line)?;

        let started = Instant::now();
        StepStarted {
            index,
            opcode: &step.opcode,
            output_var: &step.output_var,
        }
        .log();

        let (value, fragment) = handler.interpret(&step, state, trace.is_some()).await?;

        StepCompleted {
            index,
            opcode: &step.opcode,
            output_var: &step.output_var,
            output_kind: value.kind(),
            duration: started.elapsed(),
        }
        .log();

        if let (Some(trace), Some(fragment)) = (trace, fragment) {
            trace.push(fragment.with_index(index));
        }
        Ok(value)
    }
}

#[async_trait]
impl ProgramExecutor for SequentialExecutor {
    async fn execute(&self, program: &str, state: &mut StateEnv, inspect: bool) -> InterpreterResult<ProgramOutput> {
        let program = Program::from_text(program);
        if program.is_empty() {
            return Err(InterpreterError::EmptyProgram);
        }

        let profile = self.registry.profile().name();
        let started = Instant::now();
        ProgramStarted {
            profile,
            step_count: program.len(),
            inspect,
        }
        .log();

        let mut trace = inspect.then(Trace::new);
        let mut value = Value::Null;
        for (index, line) in program.lines().iter().enumerate() {
            value = match self.execute_line(index, line, state, trace.as_mut()).await {
                Ok(value) => value,
                Err(e) => {
                    StepFailed {
                        index,
                        line,
                        kind: e.kind(),
                        error: &e,
                    }
                    .log();
                    return Err(e);
                }
            };
        }

        ProgramCompleted {
            profile,
            step_count: program.len(),
            result_kind: value.kind(),
            duration: started.elapsed(),
        }
        .log();

        Ok(ProgramOutput { value, trace })
    }
}
