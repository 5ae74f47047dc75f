//! Core types for the plugin architecture.
//!
//! [`EvalContext`] is the single piece of state threaded through the evaluator and
//! every native function. It owns the scope chain, the super-global environment,
//! the job queue and the console sink, so two contexts never share anything.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use log::{debug, error, info, warn};
use uuid::Uuid;

use crate::runner::ds::env_record::{resolve_binding, EnvRef, EnvironmentRecord};
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::execution_context::{ExecutionContext, ExecutionContextStack};
use crate::runner::ds::function_object::FunctionObject;
use crate::runner::ds::job_queue::JobQueue;
use crate::runner::ds::object::{get_property, inherits_from, JsObject, JsObjectType, ObjectKind};
use crate::runner::ds::operations::type_conversion::to_string;
use crate::runner::ds::value::JsValue;
use crate::runner::eval::suspend::SuspendState;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::super_global::SuperGlobalEnvironment;

/// Default limit on nested function calls before a `RangeError` is raised.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 1000;

/// Which `console` method produced a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleLevel {
    Log,
    Info,
    Warn,
    Error,
    Debug,
}

impl fmt::Display for ConsoleLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConsoleLevel::Log => "log",
            ConsoleLevel::Info => "info",
            ConsoleLevel::Warn => "warn",
            ConsoleLevel::Error => "error",
            ConsoleLevel::Debug => "debug",
        };
        write!(f, "{}", name)
    }
}

/// Where `console.*` output goes. Each [`EvalContext`] holds exactly one sink.
pub trait ConsoleSink {
    fn write(&mut self, level: ConsoleLevel, line: &str);
}

/// The host console: `console.log` goes to stdout, the other levels to the `log` facade.
pub struct HostConsole;

impl ConsoleSink for HostConsole {
    fn write(&mut self, level: ConsoleLevel, line: &str) {
        match level {
            ConsoleLevel::Log => println!("{}", line),
            ConsoleLevel::Info => info!("{}", line),
            ConsoleLevel::Warn => warn!("{}", line),
            ConsoleLevel::Error => error!("{}", line),
            ConsoleLevel::Debug => debug!("{}", line),
        }
    }
}

/// Execution context passed to native functions.
pub struct EvalContext {
    pub ctx_stack: ExecutionContextStack,
    pub global_env: EnvRef,
    pub global_object: JsObjectType,
    pub super_global: SuperGlobalEnvironment,
    pub jobs: JobQueue,
    pub call_depth: usize,
    pub max_call_depth: usize,
    /// Frames of the async body being suspended or resumed.
    pub suspension: SuspendState,
    console: Box<dyn ConsoleSink>,
    random_state: u64,
    start_time_ms: f64,
}

impl EvalContext {
    /// A context with an empty registry. Use [`EvalContext::install_core_builtins`] to
    /// make `console`, `Math` and the rest resolvable.
    pub fn new() -> Self {
        EvalContext::with_registry(BuiltInRegistry::new())
    }

    pub fn with_registry(registry: BuiltInRegistry) -> Self {
        let mut super_global = SuperGlobalEnvironment::new(registry);
        let object_proto = super_global.prototype_of("Object");
        let global_object = JsObject::new(ObjectKind::Global, Some(object_proto));
        let global_env = EnvironmentRecord::new(None);
        let mut ctx_stack = ExecutionContextStack::new();
        ctx_stack.push_execution_ctx(ExecutionContext {
            function: None,
            this_value: JsValue::Object(global_object.clone()),
            lex_env: global_env.clone(),
            var_env: global_env.clone(),
            is_async: false,
        });
        EvalContext {
            ctx_stack,
            global_env,
            global_object,
            super_global,
            jobs: JobQueue::new(),
            call_depth: 0,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            suspension: SuspendState::new(),
            console: Box::new(HostConsole),
            random_state: seed_from_uuid(),
            start_time_ms: wall_clock_ms(),
        }
    }

    /// Swaps in a new built-in registry. Already materialized objects are discarded.
    pub fn install_core_builtins(&mut self, registry: BuiltInRegistry) {
        *self = EvalContext {
            console: std::mem::replace(&mut self.console, Box::new(HostConsole)),
            max_call_depth: self.max_call_depth,
            random_state: self.random_state,
            start_time_ms: self.start_time_ms,
            ..EvalContext::with_registry(registry)
        };
    }

    pub fn set_random_seed(&mut self, seed: u64) {
        self.random_state = if seed == 0 { 0x9E37_79B9_7F4A_7C15 } else { seed };
    }

    /// xorshift64* scaled into `[0, 1)`.
    pub fn next_random(&mut self) -> f64 {
        let mut x = self.random_state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.random_state = x;
        let r = x.wrapping_mul(0x2545_F491_4F6C_DD1D);
        (r >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Pins the wall-clock time the run starts at.
    pub fn set_start_time(&mut self, ms: f64) {
        self.start_time_ms = ms;
    }

    /// Milliseconds since the epoch as the snippet sees them: the start time plus
    /// however far the timer clock has advanced.
    pub fn current_time_ms(&self) -> f64 {
        self.start_time_ms + self.jobs.now() as f64
    }

    pub fn console_write(&mut self, level: ConsoleLevel, line: &str) {
        self.console.write(level, line);
    }

    /// Installs `sink` and hands back the one it replaced.
    pub fn replace_console(&mut self, sink: Box<dyn ConsoleSink>) -> Box<dyn ConsoleSink> {
        std::mem::replace(&mut self.console, sink)
    }

    fn running(&self) -> Option<&ExecutionContext> {
        self.ctx_stack.get_running_execution_ctx()
    }

    pub fn lex_env(&self) -> EnvRef {
        match self.running() {
            Some(c) => c.lex_env.clone(),
            None => self.global_env.clone(),
        }
    }

    pub fn set_lex_env(&mut self, env: EnvRef) {
        if let Some(c) = self.ctx_stack.get_running_execution_ctx_mut() {
            c.lex_env = env;
        }
    }

    /// Enters a fresh declarative scope nested in the current one.
    pub fn push_block_scope(&mut self) -> EnvRef {
        let env = EnvironmentRecord::new(Some(self.lex_env()));
        self.set_lex_env(env.clone());
        env
    }

    /// Leaves the scope entered by the matching [`EvalContext::push_block_scope`].
    pub fn pop_block_scope(&mut self) {
        let outer = self.lex_env().borrow().outer.clone();
        if let Some(outer) = outer {
            self.set_lex_env(outer);
        }
    }

    pub fn var_env(&self) -> EnvRef {
        match self.running() {
            Some(c) => c.var_env.clone(),
            None => self.global_env.clone(),
        }
    }

    pub fn this_value(&self) -> JsValue {
        match self.running() {
            Some(c) => c.this_value.clone(),
            None => JsValue::Object(self.global_object.clone()),
        }
    }

    pub fn is_in_async_function(&self) -> bool {
        self.running().map_or(false, |c| c.is_async)
    }

    pub fn prototype_of(&mut self, name: &str) -> JsObjectType {
        self.super_global.prototype_of(name)
    }

    pub fn resolve_super_global(&mut self, name: &str) -> Option<JsValue> {
        let global_object = self.global_object.clone();
        self.super_global.resolve_binding(name, &global_object)
    }

    /// Looks `name` up through the scope chain, the global object and the super-global scope.
    pub fn lookup_identifier(&mut self, name: &str) -> Result<Option<JsValue>, JErrorType> {
        let env = self.lex_env();
        if let Some(record) = resolve_binding(&env, name) {
            if let Some(result) = record.borrow().get_binding_value(name) {
                return result.map(Some);
            }
        }
        if let Some(v) = self.global_object.borrow().get_own_property(name) {
            return Ok(Some(v));
        }
        Ok(self.resolve_super_global(name))
    }

    pub fn resolve_identifier(&mut self, name: &str) -> Result<JsValue, JErrorType> {
        match self.lookup_identifier(name)? {
            Some(v) => Ok(v),
            None => Err(JErrorType::ReferenceError(format!("{} is not defined", name))),
        }
    }

    /// Sloppy-mode assignment: undeclared names become properties of the global object.
    pub fn assign_identifier(&mut self, name: &str, value: JsValue) -> Result<(), JErrorType> {
        let env = self.lex_env();
        match resolve_binding(&env, name) {
            Some(record) => record.borrow_mut().set_mutable_binding(name, value),
            None => {
                self.global_object.borrow_mut().set_own_property(name, value);
                Ok(())
            }
        }
    }

    /// Current value of `name` as seen from the running scope, if it resolves.
    pub fn get_binding(&mut self, name: &str) -> Option<JsValue> {
        self.lookup_identifier(name).ok().flatten()
    }

    pub fn new_object(&mut self) -> JsObjectType {
        let proto = self.prototype_of("Object");
        JsObject::new_ordinary(Some(proto))
    }

    pub fn new_array(&mut self, values: Vec<JsValue>) -> JsValue {
        let proto = self.prototype_of("Array");
        JsValue::Object(JsObject::new_array(values, Some(proto)))
    }

    pub fn new_function_object(&mut self, function: FunctionObject) -> JsObjectType {
        let proto = self.prototype_of("Function");
        JsObject::new(ObjectKind::Function(function), Some(proto))
    }

    pub fn new_native_function(
        &mut self,
        name: &str,
        length: usize,
        func: NativeFn,
    ) -> JsValue {
        JsValue::Object(self.new_function_object(FunctionObject::new_native(name, length, func, None)))
    }

    /// Builds an instance of the named error constructor (`"TypeError"`, `"Error"`, ...).
    pub fn create_error(&mut self, kind: &str, message: &str) -> JsValue {
        let proto = self.prototype_of(kind);
        let error = JsObject::new(ObjectKind::Error, Some(proto));
        error
            .borrow_mut()
            .define_hidden_property("message", JsValue::String(message.to_string()));
        JsValue::Object(error)
    }

    /// Turns an abrupt completion into the value a `catch` clause binds.
    pub fn error_to_value(&mut self, err: JErrorType) -> JsValue {
        match err {
            JErrorType::Thrown(v) => v,
            JErrorType::Suspended => self.create_error("Error", &err.to_string()),
            e => {
                let message = e.to_string();
                self.create_error(e.name(), &message)
            }
        }
    }

    pub fn is_error_instance(&mut self, v: &JsValue) -> bool {
        match v {
            JsValue::Object(o) => {
                let error_proto = self.prototype_of("Error");
                inherits_from(o, &error_proto)
            }
            _ => false,
        }
    }

    /// The `message` of an error, or `None` when the thrown value is not an `Error`.
    pub fn error_message(&mut self, err: &JErrorType) -> Option<String> {
        match err {
            JErrorType::Thrown(v) => {
                if self.is_error_instance(v) {
                    let o = v.as_object()?;
                    Some(match get_property(o, "message") {
                        Some(JsValue::Undefined) | None => String::new(),
                        Some(m) => to_string(&m),
                    })
                } else {
                    None
                }
            }
            e => Some(e.to_string()),
        }
    }
}

impl Default for EvalContext {
    fn default() -> Self {
        Self::new()
    }
}

fn wall_clock_ms() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as f64)
        .unwrap_or(0.0)
}

fn seed_from_uuid() -> u64 {
    let bits = Uuid::new_v4().as_u128();
    let seed = (bits as u64) ^ ((bits >> 64) as u64);
    if seed == 0 {
        0x9E37_79B9_7F4A_7C15
    } else {
        seed
    }
}

/// Function signature for built-in methods.
/// Native functions receive the evaluation context, `this` value, and arguments.
pub type NativeFn = fn(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType>;

/// Built-in object definition.
/// Represents a JavaScript built-in object like Array, Object, Math, etc.
pub struct BuiltInObject {
    /// Name of the object (e.g., "Array", "Object", "Math").
    pub name: String,

    /// Built-in whose prototype object sits above this one in the chain. `None` ends the chain.
    pub prototype: Option<String>,

    /// Prototype methods for constructors, own methods otherwise.
    pub methods: Vec<(String, NativeFn)>,

    /// Methods placed directly on a constructor (`Array.isArray`).
    pub static_methods: Vec<(String, NativeFn)>,

    /// Own data properties (`Math.PI`).
    pub properties: Vec<(String, JsValue)>,

    /// Data properties of the prototype object (`Error.prototype.name`).
    pub prototype_properties: Vec<(String, JsValue)>,

    /// Constructor function, if this object is constructable.
    pub constructor: Option<NativeFn>,
}

impl BuiltInObject {
    /// Create a new built-in object with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        BuiltInObject {
            name: name.into(),
            prototype: Some("Object".to_string()),
            methods: Vec::new(),
            static_methods: Vec::new(),
            properties: Vec::new(),
            prototype_properties: Vec::new(),
            constructor: None,
        }
    }

    /// Set the prototype chain parent.
    pub fn with_prototype(mut self, prototype: impl Into<String>) -> Self {
        self.prototype = Some(prototype.into());
        self
    }

    /// Set no prototype (for Object.prototype itself).
    pub fn with_no_prototype(mut self) -> Self {
        self.prototype = None;
        self
    }

    /// Add a native method.
    pub fn add_method(mut self, name: impl Into<String>, func: NativeFn) -> Self {
        self.methods.push((name.into(), func));
        self
    }

    /// Add a method on the constructor itself.
    pub fn add_static_method(mut self, name: impl Into<String>, func: NativeFn) -> Self {
        self.static_methods.push((name.into(), func));
        self
    }

    /// Add a property.
    pub fn add_property(mut self, name: impl Into<String>, value: JsValue) -> Self {
        self.properties.push((name.into(), value));
        self
    }

    pub fn add_prototype_property(mut self, name: impl Into<String>, value: JsValue) -> Self {
        self.prototype_properties.push((name.into(), value));
        self
    }

    /// Set the constructor function.
    pub fn with_constructor(mut self, constructor: NativeFn) -> Self {
        self.constructor = Some(constructor);
        self
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.methods.iter().any(|(n, _)| n == name) || self.static_methods.iter().any(|(n, _)| n == name)
    }

    pub fn get_method(&self, name: &str) -> Option<NativeFn> {
        self.methods
            .iter()
            .chain(self.static_methods.iter())
            .find(|(n, _)| n == name)
            .map(|(_, f)| *f)
    }
}
