use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::config::{Opcode, Profile};
use crate::errors::{InterpreterError, InterpreterResult};
use crate::observability::messages::registry::{HandlerRegistered, RegistryBuilt};
use crate::observability::messages::StructuredLog;
use crate::steps::{HandlerFactory, HandlerOptions};
use crate::traits::{Capabilities, Interpret};

/// The handlers of one profile, keyed by opcode.
///
/// Built once and shared; handlers hold no per-program state, so one registry
/// can serve any number of programs.
#[derive(Clone)]
pub struct HandlerRegistry {
    profile: Profile,
    handlers: HashMap<Opcode, Arc<dyn Interpret>>,
}

impl HandlerRegistry {
    pub fn profile(&self) -> Profile {
        self.profile
    }

    /// Look up the handler for an opcode as written in program text.
    ///
    /// Names that are not opcodes at all and opcodes outside the profile both
    /// fail with `UnknownOpcode`.
    pub fn get(&self, opcode: &str) -> InterpreterResult<Arc<dyn Interpret>> {
        Opcode::from_str(opcode)
            .ok()
            .and_then(|op| self.handlers.get(&op))
            .cloned()
            .ok_or_else(|| InterpreterError::UnknownOpcode {
                opcode: opcode.to_string(),
                profile: self.profile.name().to_string(),
            })
    }

    pub fn contains(&self, opcode: Opcode) -> bool {
        self.handlers.contains_key(&opcode)
    }

    /// Registered opcodes in declaration order.
    pub fn opcodes(&self) -> Vec<Opcode> {
        let mut opcodes: Vec<Opcode> = self.handlers.keys().copied().collect();
        opcodes.sort();
        opcodes
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("profile", &self.profile)
            .field("opcodes", &self.opcodes())
            .finish()
    }
}

/// Build the handler registry for a named profile.
///
/// `options` defaults to the profile's own LOC thresholds. Fails with
/// `UnknownProfile` for an unknown name, and with `MissingCapability` as soon as
/// one of the profile's handlers needs a capability `caps` does not provide.
pub fn build_registry(
    profile_name: &str,
    caps: &Capabilities,
    options: Option<HandlerOptions>,
) -> InterpreterResult<HandlerRegistry> {
    let profile = Profile::from_str(profile_name)?;
    let options = options.unwrap_or_else(|| HandlerOptions::for_profile(profile));

    let mut handlers: HashMap<Opcode, Arc<dyn Interpret>> = HashMap::new();
    for &opcode in profile.opcodes() {
        let handler = HandlerFactory::create_handler(opcode, caps, &options)?;
        HandlerRegistered {
            profile: profile.name(),
            opcode: opcode.as_str(),
        }
        .log();
        handlers.insert(opcode, handler);
    }

    RegistryBuilt {
        profile: profile.name(),
        handler_count: handlers.len(),
    }
    .log();

    Ok(HandlerRegistry { profile, handlers })
}
