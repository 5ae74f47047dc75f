use crate::runner::ds::env_record::EnvRef;
use crate::runner::ds::object::JsObjectType;
use crate::runner::ds::value::JsValue;

pub struct ExecutionContext {
    pub function: Option<JsObjectType>,
    pub this_value: JsValue,
    pub lex_env: EnvRef,
    pub var_env: EnvRef,
    pub is_async: bool,
}

pub struct ExecutionContextStack {
    stack: Vec<ExecutionContext>,
}

impl ExecutionContextStack {
    pub fn new() -> Self {
        ExecutionContextStack { stack: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn get_running_execution_ctx(&self) -> Option<&ExecutionContext> {
        self.stack.last()
    }

    pub fn get_running_execution_ctx_mut(&mut self) -> Option<&mut ExecutionContext> {
        self.stack.last_mut()
    }

    pub fn pop_running_execution_ctx(&mut self) -> Option<ExecutionContext> {
        self.stack.pop()
    }

    pub fn push_execution_ctx(&mut self, ctx: ExecutionContext) {
        self.stack.push(ctx)
    }
}

impl Default for ExecutionContextStack {
    fn default() -> Self {
        Self::new()
    }
}
