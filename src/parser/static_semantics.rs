use std::rc::Rc;

use crate::parser::ast::{
    DeclarationType, ExpressionOrSpreadElement, ExpressionType, ForBinding, FunctionBodyOrExpression,
    FunctionData, HasMeta, MemberExpressionType, Meta, PatternOrExpression, PatternType, ProgramData,
    PropertyData, PropertyKey, StatementType, VariableDeclarationData, VariableDeclarationKind,
    VariableDeclarationOrExpression,
};

pub enum LexicallyScopedDeclaration<'a> {
    Binding { name: String, is_const: bool },
    Function(&'a Rc<FunctionData>),
}

pub fn get_bound_names_from_pattern(pattern: &PatternType) -> Vec<String> {
    let mut bound_names = vec![];
    collect_bound_names(pattern, &mut bound_names);
    bound_names
}

fn collect_bound_names(pattern: &PatternType, bound_names: &mut Vec<String>) {
    match pattern {
        PatternType::Identifier(i) => bound_names.push(i.name.to_string()),
        PatternType::MemberExpression(_) => {}
        PatternType::ObjectPattern {
            properties, rest, ..
        } => {
            for p in properties {
                collect_bound_names(&p.value, bound_names);
            }
            if let Some(r) = rest {
                collect_bound_names(r, bound_names);
            }
        }
        PatternType::ArrayPattern { elements, .. } => {
            for p in elements.iter().flatten() {
                collect_bound_names(p, bound_names);
            }
        }
        PatternType::RestElement { argument, .. } => collect_bound_names(argument, bound_names),
        PatternType::AssignmentPattern { left, .. } => collect_bound_names(left, bound_names),
    }
}

pub fn get_bound_names_from_variable_declaration_data(v: &VariableDeclarationData) -> Vec<String> {
    let mut bound_names = vec![];
    for d in &v.declarations {
        collect_bound_names(&d.id, &mut bound_names);
    }
    bound_names
}

/// Every `var` name declared in `statements`, without descending into nested functions.
pub fn var_scoped_names(statements: &[StatementType]) -> Vec<String> {
    let mut declared = vec![];
    for s in statements {
        collect_var_declarations(s, &mut declared);
    }
    let mut names: Vec<String> = vec![];
    for (name, _) in declared {
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

fn push_all(names: Vec<String>, meta: &Meta, out: &mut Vec<(String, usize)>) {
    out.extend(names.into_iter().map(|n| (n, meta.start_index)));
}

/// Collects `(name, start_index)` for each `var` binding, duplicates included.
fn collect_var_declarations(statement: &StatementType, out: &mut Vec<(String, usize)>) {
    match statement {
        StatementType::DeclarationStatement(DeclarationType::VariableDeclaration(v))
            if v.kind == VariableDeclarationKind::Var =>
        {
            push_all(get_bound_names_from_variable_declaration_data(v), &v.meta, out);
        }
        StatementType::BlockStatement(b) => {
            for s in &b.body {
                collect_var_declarations(s, out);
            }
        }
        StatementType::IfStatement {
            consequent,
            alternate,
            ..
        } => {
            collect_var_declarations(consequent, out);
            if let Some(a) = alternate {
                collect_var_declarations(a, out);
            }
        }
        StatementType::WhileStatement { body, .. } | StatementType::DoWhileStatement { body, .. } => {
            collect_var_declarations(body, out)
        }
        StatementType::ForStatement { init, body, .. } => {
            if let Some(VariableDeclarationOrExpression::VariableDeclaration(v)) = init {
                if v.kind == VariableDeclarationKind::Var {
                    push_all(get_bound_names_from_variable_declaration_data(v), &v.meta, out);
                }
            }
            collect_var_declarations(body, out);
        }
        StatementType::ForInStatement(data) | StatementType::ForOfStatement(data) => {
            if let ForBinding::Declaration {
                kind: VariableDeclarationKind::Var,
                target,
            } = &data.left
            {
                push_all(get_bound_names_from_pattern(target), target.get_meta(), out);
            }
            collect_var_declarations(&data.body, out);
        }
        StatementType::TryStatement {
            block,
            handler,
            finalizer,
            ..
        } => {
            for s in &block.body {
                collect_var_declarations(s, out);
            }
            if let Some(h) = handler {
                for s in &h.body.body {
                    collect_var_declarations(s, out);
                }
            }
            if let Some(f) = finalizer {
                for s in &f.body {
                    collect_var_declarations(s, out);
                }
            }
        }
        StatementType::SwitchStatement { cases, .. } => {
            for c in cases {
                for s in &c.consequent {
                    collect_var_declarations(s, out);
                }
            }
        }
        _ => {}
    }
}

/// `let`, `const` and function declarations made directly in `statements`.
pub fn lexically_scoped_declarations(statements: &[StatementType]) -> Vec<LexicallyScopedDeclaration<'_>> {
    let mut declarations = vec![];
    for s in statements {
        if let StatementType::DeclarationStatement(d) = s {
            match d {
                DeclarationType::FunctionDeclaration(f) => {
                    declarations.push(LexicallyScopedDeclaration::Function(f))
                }
                DeclarationType::VariableDeclaration(v) => {
                    if v.kind != VariableDeclarationKind::Var {
                        let is_const = v.kind == VariableDeclarationKind::Const;
                        for name in get_bound_names_from_variable_declaration_data(v) {
                            declarations.push(LexicallyScopedDeclaration::Binding { name, is_const });
                        }
                    }
                }
            }
        }
    }
    declarations
}

// ---------------------------------------------------------------------------
// Early errors
// ---------------------------------------------------------------------------

/// A rule broken by otherwise well-formed source, reported as a `SyntaxError`
/// before any of the script runs.
#[derive(Debug, Clone, PartialEq)]
pub struct EarlyError {
    pub message: String,
    /// Byte offset of the offending statement or declaration.
    pub start_index: usize,
}

impl EarlyError {
    fn at(message: &str, start_index: usize) -> Self {
        EarlyError {
            message: message.to_string(),
            start_index,
        }
    }

    fn redeclared(name: &str, start_index: usize) -> Self {
        EarlyError {
            message: format!("Identifier '{}' has already been declared", name),
            start_index,
        }
    }
}

type EarlyResult = Result<(), EarlyError>;

/// Which jump statements the enclosing code allows.
#[derive(Debug, Clone, Copy, Default)]
struct JumpTargets {
    in_function: bool,
    in_iteration: bool,
    in_switch: bool,
}

impl JumpTargets {
    fn function_body() -> Self {
        JumpTargets {
            in_function: true,
            ..Default::default()
        }
    }

    fn iteration(self) -> Self {
        JumpTargets {
            in_iteration: true,
            ..self
        }
    }

    fn switch(self) -> Self {
        JumpTargets {
            in_switch: true,
            ..self
        }
    }
}

/// Rejects conflicting declarations and jump statements with nowhere to go.
///
/// Checked scopes are the script, every function body, every block, each
/// `catch` body and the case block of each `switch`.
pub fn check_early_errors(program: &ProgramData) -> EarlyResult {
    let body: Vec<&StatementType> = program.body.iter().collect();
    check_declarations(&body, true, &[])?;
    for s in &program.body {
        check_statement(s, JumpTargets::default())?;
    }
    Ok(())
}

/// `top_level` scopes treat function declarations like `var`; blocks treat them
/// like `let`, except that repeating a function declaration is allowed.
/// `outer` holds names already bound in the scope: parameters or a catch binding.
fn check_declarations(statements: &[&StatementType], top_level: bool, outer: &[String]) -> EarlyResult {
    let mut var_like: Vec<(String, usize)> = outer.iter().map(|n| (n.clone(), 0)).collect();
    for s in statements {
        collect_var_declarations(s, &mut var_like);
        if top_level {
            if let StatementType::DeclarationStatement(DeclarationType::FunctionDeclaration(f)) = s {
                if let Some(name) = f.name() {
                    var_like.push((name.to_string(), f.meta.start_index));
                }
            }
        }
    }
    let clash = |name: &str, at: usize, var_like: &[(String, usize)]| {
        var_like
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, pos)| EarlyError::redeclared(name, at.max(*pos)))
    };

    let mut lexical: Vec<(String, bool)> = vec![];
    for s in statements {
        let declaration = match s {
            StatementType::DeclarationStatement(d) => d,
            _ => continue,
        };
        match declaration {
            DeclarationType::FunctionDeclaration(f) if !top_level => {
                let name = match f.name() {
                    Some(n) => n,
                    None => continue,
                };
                if lexical.iter().any(|(n, is_function)| n == name && !is_function) {
                    return Err(EarlyError::redeclared(name, f.meta.start_index));
                }
                if let Some(e) = clash(name, f.meta.start_index, &var_like) {
                    return Err(e);
                }
                lexical.push((name.to_string(), true));
            }
            DeclarationType::VariableDeclaration(v) if v.kind != VariableDeclarationKind::Var => {
                for name in get_bound_names_from_variable_declaration_data(v) {
                    if lexical.iter().any(|(n, _)| *n == name) {
                        return Err(EarlyError::redeclared(&name, v.meta.start_index));
                    }
                    if let Some(e) = clash(&name, v.meta.start_index, &var_like) {
                        return Err(e);
                    }
                    lexical.push((name, false));
                }
            }
            _ => {}
        }
    }
    Ok(())
}

fn check_block(statements: &[StatementType], targets: JumpTargets, outer: &[String]) -> EarlyResult {
    let refs: Vec<&StatementType> = statements.iter().collect();
    check_declarations(&refs, false, outer)?;
    for s in statements {
        check_statement(s, targets)?;
    }
    Ok(())
}

fn check_statement(statement: &StatementType, targets: JumpTargets) -> EarlyResult {
    match statement {
        StatementType::ExpressionStatement { expression, .. } => check_expression(expression),
        StatementType::ThrowStatement { argument, .. } => check_expression(argument),
        StatementType::BlockStatement(b) => check_block(&b.body, targets, &[]),
        StatementType::EmptyStatement { .. } | StatementType::DebuggerStatement { .. } => Ok(()),
        StatementType::ReturnStatement { meta, argument } => {
            if !targets.in_function {
                return Err(EarlyError::at("Illegal return statement", meta.start_index));
            }
            match argument {
                Some(a) => check_expression(a),
                None => Ok(()),
            }
        }
        StatementType::BreakStatement { meta } => {
            if targets.in_iteration || targets.in_switch {
                Ok(())
            } else {
                Err(EarlyError::at("Illegal break statement", meta.start_index))
            }
        }
        StatementType::ContinueStatement { meta } => {
            if targets.in_iteration {
                Ok(())
            } else {
                Err(EarlyError::at(
                    "Illegal continue statement: no surrounding iteration statement",
                    meta.start_index,
                ))
            }
        }
        StatementType::IfStatement {
            test,
            consequent,
            alternate,
            ..
        } => {
            check_expression(test)?;
            check_statement(consequent, targets)?;
            match alternate {
                Some(a) => check_statement(a, targets),
                None => Ok(()),
            }
        }
        StatementType::SwitchStatement {
            discriminant,
            cases,
            ..
        } => {
            check_expression(discriminant)?;
            let body: Vec<&StatementType> = cases.iter().flat_map(|c| c.consequent.iter()).collect();
            check_declarations(&body, false, &[])?;
            for case in cases {
                if let Some(t) = &case.test {
                    check_expression(t)?;
                }
                for s in &case.consequent {
                    check_statement(s, targets.switch())?;
                }
            }
            Ok(())
        }
        StatementType::TryStatement {
            block,
            handler,
            finalizer,
            ..
        } => {
            check_block(&block.body, targets, &[])?;
            if let Some(h) = handler {
                let mut names = vec![];
                if let Some(param) = &h.param {
                    check_pattern(param)?;
                    names = get_bound_names_from_pattern(param);
                }
                check_block(&h.body.body, targets, &names)?;
            }
            match finalizer {
                Some(f) => check_block(&f.body, targets, &[]),
                None => Ok(()),
            }
        }
        StatementType::WhileStatement { test, body, .. }
        | StatementType::DoWhileStatement { test, body, .. } => {
            check_expression(test)?;
            check_statement(body, targets.iteration())
        }
        StatementType::ForStatement {
            init,
            test,
            update,
            body,
            ..
        } => {
            match init {
                Some(VariableDeclarationOrExpression::VariableDeclaration(v)) => {
                    check_variable_declaration(v)?;
                    if v.kind != VariableDeclarationKind::Var {
                        let mut seen: Vec<String> = vec![];
                        for name in get_bound_names_from_variable_declaration_data(v) {
                            if seen.contains(&name) {
                                return Err(EarlyError::redeclared(&name, v.meta.start_index));
                            }
                            seen.push(name);
                        }
                    }
                }
                Some(VariableDeclarationOrExpression::Expression(e)) => check_expression(e)?,
                None => {}
            }
            if let Some(t) = test {
                check_expression(t)?;
            }
            if let Some(u) = update {
                check_expression(u)?;
            }
            check_statement(body, targets.iteration())
        }
        StatementType::ForInStatement(data) | StatementType::ForOfStatement(data) => {
            match &data.left {
                ForBinding::Declaration { target, .. } | ForBinding::Pattern(target) => check_pattern(target)?,
            }
            check_expression(&data.right)?;
            check_statement(&data.body, targets.iteration())
        }
        StatementType::DeclarationStatement(DeclarationType::FunctionDeclaration(f)) => check_function(f),
        StatementType::DeclarationStatement(DeclarationType::VariableDeclaration(v)) => {
            check_variable_declaration(v)
        }
    }
}

fn check_variable_declaration(v: &VariableDeclarationData) -> EarlyResult {
    for d in &v.declarations {
        check_pattern(&d.id)?;
        if let Some(init) = &d.init {
            check_expression(init)?;
        }
    }
    Ok(())
}

fn check_function(f: &FunctionData) -> EarlyResult {
    let mut params = vec![];
    for p in &f.params {
        check_pattern(p)?;
        params.extend(get_bound_names_from_pattern(p));
    }
    match &f.body {
        FunctionBodyOrExpression::FunctionBody(b) => {
            let refs: Vec<&StatementType> = b.body.iter().collect();
            check_declarations(&refs, true, &params)?;
            for s in &b.body {
                check_statement(s, JumpTargets::function_body())?;
            }
            Ok(())
        }
        FunctionBodyOrExpression::Expression(e) => check_expression(e),
    }
}

fn check_pattern(pattern: &PatternType) -> EarlyResult {
    match pattern {
        PatternType::Identifier(_) => Ok(()),
        PatternType::MemberExpression(m) => check_member(m),
        PatternType::ObjectPattern { properties, rest, .. } => {
            for p in properties {
                check_key(&p.key)?;
                check_pattern(&p.value)?;
            }
            match rest {
                Some(r) => check_pattern(r),
                None => Ok(()),
            }
        }
        PatternType::ArrayPattern { elements, .. } => {
            for e in elements.iter().flatten() {
                check_pattern(e)?;
            }
            Ok(())
        }
        PatternType::RestElement { argument, .. } => check_pattern(argument),
        PatternType::AssignmentPattern { left, right, .. } => {
            check_pattern(left)?;
            check_expression(right)
        }
    }
}

fn check_key(key: &PropertyKey) -> EarlyResult {
    match key {
        PropertyKey::Static(_) => Ok(()),
        PropertyKey::Computed(e) => check_expression(e),
    }
}

fn check_member(member: &MemberExpressionType) -> EarlyResult {
    match member {
        MemberExpressionType::SimpleMemberExpression { object, .. } => check_expression(object),
        MemberExpressionType::ComputedMemberExpression { object, property, .. } => {
            check_expression(object)?;
            check_expression(property)
        }
    }
}

fn check_arguments(arguments: &[ExpressionOrSpreadElement]) -> EarlyResult {
    for a in arguments {
        match a {
            ExpressionOrSpreadElement::Expression(e) | ExpressionOrSpreadElement::SpreadElement(e) => {
                check_expression(e)?
            }
        }
    }
    Ok(())
}

/// Expressions only matter for the functions nested inside them.
fn check_expression(expression: &ExpressionType) -> EarlyResult {
    match expression {
        ExpressionType::Literal(_) | ExpressionType::Identifier(_) | ExpressionType::ThisExpression { .. } => Ok(()),
        ExpressionType::ArrayExpression { elements, .. } => {
            for e in elements.iter().flatten() {
                check_arguments(std::slice::from_ref(e))?;
            }
            Ok(())
        }
        ExpressionType::ObjectExpression { properties, .. } => {
            for p in properties {
                match p {
                    PropertyData::Property { key, value, .. } => {
                        check_key(key)?;
                        check_expression(value)?;
                    }
                    PropertyData::Method { key, value, .. } => {
                        check_key(key)?;
                        check_function(value)?;
                    }
                    PropertyData::Spread { argument, .. } => check_expression(argument)?,
                    PropertyData::CoverInitializedName { initializer, .. } => check_expression(initializer)?,
                }
            }
            Ok(())
        }
        ExpressionType::FunctionExpression(f) | ExpressionType::ArrowFunctionExpression(f) => check_function(f),
        ExpressionType::UnaryExpression { argument, .. }
        | ExpressionType::AwaitExpression { argument, .. }
        | ExpressionType::UpdateExpression { argument, .. } => check_expression(argument),
        ExpressionType::BinaryExpression { left, right, .. }
        | ExpressionType::LogicalExpression { left, right, .. } => {
            check_expression(left)?;
            check_expression(right)
        }
        ExpressionType::AssignmentExpression { left, right, .. } => {
            match left {
                PatternOrExpression::Pattern(p) => check_pattern(p)?,
                PatternOrExpression::Expression(e) => check_expression(e)?,
            }
            check_expression(right)
        }
        ExpressionType::ConditionalExpression {
            test,
            consequent,
            alternate,
            ..
        } => {
            check_expression(test)?;
            check_expression(consequent)?;
            check_expression(alternate)
        }
        ExpressionType::CallExpression { callee, arguments, .. }
        | ExpressionType::NewExpression { callee, arguments, .. } => {
            check_expression(callee)?;
            check_arguments(arguments)
        }
        ExpressionType::MemberExpression(m) => check_member(m),
        ExpressionType::SequenceExpression { expressions, .. } => {
            for e in expressions {
                check_expression(e)?;
            }
            Ok(())
        }
        ExpressionType::TemplateLiteral(t) => {
            for e in &t.expressions {
                check_expression(e)?;
            }
            Ok(())
        }
        ExpressionType::ChainExpression { expression, .. } => check_expression(expression),
    }
}
