use std::cell::Cell;
use std::rc::Rc;

use crate::parser::ast::FunctionData;
use crate::runner::ds::env_record::EnvRef;
use crate::runner::ds::object::JsObjectType;
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::types::NativeFn;

pub enum FunctionKind {
    /// A function written in the snippet. Arrow functions carry their lexical `this`.
    Script {
        data: Rc<FunctionData>,
        environment: EnvRef,
        lexical_this: Option<JsValue>,
    },
    Native {
        func: NativeFn,
        /// Present when the function can be used with `new`.
        constructor: Option<NativeFn>,
    },
    Bound {
        target: JsValue,
        this_value: JsValue,
        args: Vec<JsValue>,
    },
    /// The `resolve`/`reject` pair handed to a promise executor.
    PromiseResolver {
        promise: JsObjectType,
        reject: bool,
        already_resolved: Rc<Cell<bool>>,
    },
}

pub struct FunctionObject {
    pub name: String,
    pub length: usize,
    pub kind: FunctionKind,
}

impl FunctionObject {
    pub fn new_script(
        data: Rc<FunctionData>,
        environment: EnvRef,
        lexical_this: Option<JsValue>,
        name: String,
    ) -> Self {
        FunctionObject {
            name,
            length: data.length(),
            kind: FunctionKind::Script {
                data,
                environment,
                lexical_this,
            },
        }
    }

    pub fn new_native(name: &str, length: usize, func: NativeFn, constructor: Option<NativeFn>) -> Self {
        FunctionObject {
            name: name.to_string(),
            length,
            kind: FunctionKind::Native { func, constructor },
        }
    }

    pub fn is_constructor(&self) -> bool {
        match &self.kind {
            FunctionKind::Script { data, .. } => !data.is_arrow && !data.is_async,
            FunctionKind::Native { constructor, .. } => constructor.is_some(),
            FunctionKind::Bound { target, .. } => match target {
                JsValue::Object(o) => o.borrow().as_function().map_or(false, |f| f.is_constructor()),
                _ => false,
            },
            FunctionKind::PromiseResolver { .. } => false,
        }
    }

    /// What `String(fn)` prints.
    pub fn source_text(&self) -> String {
        match &self.kind {
            FunctionKind::Script { data, .. } => data.source_text.to_string(),
            _ => format!("function {}() {{ [native code] }}", self.name),
        }
    }
}
