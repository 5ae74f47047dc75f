use std::collections::HashSet;
use std::rc::Rc;

use pest::error::{Error, ErrorVariant, InputLocation, LineColLocation};
use pest::iterators::Pair;
use pest::{Parser, Position, Span};
use pest_derive::Parser;

use super::ast::*;
use super::static_semantics::{check_early_errors, var_scoped_names, EarlyError};
use super::util::{parse_numeric_literal, unescape_string};

#[derive(Parser)]
#[grammar = "parser/js_grammar.pest"] // relative to src
pub struct JsParser;

type BuildResult<T> = Result<T, Error<Rule>>;

lazy_static! {
    static ref RESERVED_WORDS: HashSet<&'static str> = [
        "await", "break", "case", "catch", "class", "const", "continue", "debugger", "default",
        "delete", "do", "else", "enum", "export", "extends", "false", "finally", "for", "function",
        "if", "import", "instanceof", "in", "let", "new", "null", "return", "super", "switch", "this",
        "throw", "true", "try", "typeof", "var", "void", "while", "with", "yield",
    ]
    .iter()
    .copied()
    .collect();
}

impl JsParser {
    pub fn parse_to_ast_from_str(script: &str) -> Result<ProgramData, JsError> {
        let mut pairs =
            JsParser::parse(Rule::script, script).map_err(|e| to_js_error(e, script))?;
        let script_pair = match pairs.next() {
            Some(p) => p,
            None => {
                return Err(JsError {
                    message: "Unexpected end of input".to_string(),
                    line: 1,
                    column: 1,
                })
            }
        };
        let program = build_ast_from_script(script_pair).map_err(|e| to_js_error(e, script))?;
        check_early_errors(&program).map_err(|e| early_error_to_js_error(e, script))?;
        Ok(program)
    }
}

fn early_error_to_js_error(error: EarlyError, script: &str) -> JsError {
    let (line, column) = Position::new(script, error.start_index)
        .map(|p| p.line_col())
        .unwrap_or((1, 1));
    JsError {
        message: error.message,
        line,
        column,
    }
}

fn to_js_error(error: Error<Rule>, script: &str) -> JsError {
    let (line, column) = match error.line_col {
        LineColLocation::Pos(p) => p,
        LineColLocation::Span(s, _) => s,
    };
    let message = match &error.variant {
        ErrorVariant::CustomError { message } => message.to_string(),
        ErrorVariant::ParsingError { .. } => {
            let pos = match error.location {
                InputLocation::Pos(p) => p,
                InputLocation::Span((s, _)) => s,
            };
            unexpected_token_message(script, pos)
        }
    };
    JsError {
        message,
        line,
        column,
    }
}

fn unexpected_token_message(script: &str, pos: usize) -> String {
    let rest = script.get(pos..).unwrap_or("").trim_start();
    let first = match rest.chars().next() {
        Some(c) => c,
        None => return "Unexpected end of input".to_string(),
    };
    if first == '"' || first == '\'' || first == '`' {
        return if rest[1..].contains(first) {
            "Unexpected string".to_string()
        } else {
            "Invalid or unexpected token".to_string()
        };
    }
    if first.is_ascii_digit() {
        return "Unexpected number".to_string();
    }
    if first.is_alphabetic() || first == '_' || first == '$' {
        let word: String = rest
            .chars()
            .take_while(|c| c.is_alphanumeric() || *c == '_' || *c == '$')
            .collect();
        return if RESERVED_WORDS.contains(word.as_str()) {
            format!("Unexpected token '{}'", word)
        } else {
            format!("Unexpected identifier '{}'", word)
        };
    }
    format!("Unexpected token '{}'", first)
}

fn get_unexpected_error(id: i32, pair: &Pair<Rule>) -> Error<Rule> {
    let message = format!("Unexpected state reached [{:?}] - {}", pair.as_rule(), id);
    Error::new_from_span(ErrorVariant::CustomError { message }, pair.as_span())
}

fn get_validation_error(message: &str, span: Span) -> Error<Rule> {
    Error::new_from_span(
        ErrorVariant::CustomError {
            message: message.to_string(),
        },
        span,
    )
}

fn expect_next<'i, I: Iterator<Item = Pair<'i, Rule>>>(
    iter: &mut I,
    span: &Span<'i>,
) -> BuildResult<Pair<'i, Rule>> {
    iter.next()
        .ok_or_else(|| get_validation_error("Unexpected end of input", span.clone()))
}

fn get_meta(pair: &Pair<Rule>) -> Meta {
    let span = pair.as_span();
    Meta {
        start_index: span.start(),
        end_index: span.end(),
    }
}

fn is_keyword(rule: Rule) -> bool {
    matches!(
        rule,
        Rule::kw_var
            | Rule::kw_let
            | Rule::kw_const
            | Rule::kw_function
            | Rule::kw_if
            | Rule::kw_else
            | Rule::kw_for
            | Rule::kw_while
            | Rule::kw_do
            | Rule::kw_continue
            | Rule::kw_break
            | Rule::kw_return
            | Rule::kw_throw
            | Rule::kw_try
            | Rule::kw_catch
            | Rule::kw_finally
            | Rule::kw_switch
            | Rule::kw_case
            | Rule::kw_default
            | Rule::kw_new
            | Rule::kw_debugger
    )
}

fn significant_children<'i>(pair: Pair<'i, Rule>) -> impl Iterator<Item = Pair<'i, Rule>> {
    pair.into_inner().filter(|p| !is_keyword(p.as_rule()))
}

// ---------------------------------------------------------------------------
// Statements
// ---------------------------------------------------------------------------

fn build_ast_from_script(pair: Pair<Rule>) -> BuildResult<ProgramData> {
    let meta = get_meta(&pair);
    let mut body = vec![];
    for inner_pair in pair.into_inner() {
        if inner_pair.as_rule() != Rule::EOI {
            body.push(build_ast_from_statement(inner_pair)?);
        }
    }
    let var_names = var_scoped_names(&body);
    Ok(ProgramData {
        meta,
        body,
        var_names,
    })
}

fn build_ast_from_statement_list(pair: Pair<Rule>) -> BuildResult<Vec<StatementType>> {
    let mut statements = vec![];
    for inner_pair in pair.into_inner() {
        statements.push(build_ast_from_statement(inner_pair)?);
    }
    Ok(statements)
}

fn build_ast_from_block(pair: Pair<Rule>) -> BuildResult<BlockStatementData> {
    let meta = get_meta(&pair);
    Ok(BlockStatementData {
        meta,
        body: build_ast_from_statement_list(pair)?,
    })
}

fn build_ast_from_statement(pair: Pair<Rule>) -> BuildResult<StatementType> {
    let meta = get_meta(&pair);
    let span = pair.as_span();
    Ok(match pair.as_rule() {
        Rule::block_statement => StatementType::BlockStatement(build_ast_from_block(pair)?),
        Rule::empty_statement => StatementType::EmptyStatement { meta },
        Rule::debugger_statement => StatementType::DebuggerStatement { meta },
        Rule::continue_statement => StatementType::ContinueStatement { meta },
        Rule::break_statement => StatementType::BreakStatement { meta },
        Rule::variable_statement => {
            let list = expect_next(&mut pair.into_inner(), &span)?;
            StatementType::DeclarationStatement(DeclarationType::VariableDeclaration(
                build_ast_from_variable_declaration_list(list, true)?,
            ))
        }
        Rule::function_declaration => StatementType::DeclarationStatement(
            DeclarationType::FunctionDeclaration(Rc::new(build_ast_from_function(pair)?)),
        ),
        Rule::expression_statement => {
            let expression = expect_next(&mut pair.into_inner(), &span)?;
            StatementType::ExpressionStatement {
                meta,
                expression: Box::new(build_ast_from_expression_rule(expression)?),
            }
        }
        Rule::if_statement => {
            let mut inner = significant_children(pair);
            let test = build_ast_from_expression_rule(expect_next(&mut inner, &span)?)?;
            let consequent = build_ast_from_statement(expect_next(&mut inner, &span)?)?;
            let alternate = match inner.next() {
                Some(p) => Some(Box::new(build_ast_from_statement(p)?)),
                None => None,
            };
            StatementType::IfStatement {
                meta,
                test: Box::new(test),
                consequent: Box::new(consequent),
                alternate,
            }
        }
        Rule::while_statement => {
            let mut inner = significant_children(pair);
            let test = build_ast_from_expression_rule(expect_next(&mut inner, &span)?)?;
            let body = build_ast_from_statement(expect_next(&mut inner, &span)?)?;
            StatementType::WhileStatement {
                meta,
                test: Box::new(test),
                body: Box::new(body),
            }
        }
        Rule::do_while_statement => {
            let mut inner = significant_children(pair);
            let body = build_ast_from_statement(expect_next(&mut inner, &span)?)?;
            let test = build_ast_from_expression_rule(expect_next(&mut inner, &span)?)?;
            StatementType::DoWhileStatement {
                meta,
                test: Box::new(test),
                body: Box::new(body),
            }
        }
        Rule::for_statement => build_ast_from_for_statement(pair)?,
        Rule::for_in_of_statement => build_ast_from_for_in_of_statement(pair)?,
        Rule::return_statement => {
            let argument = match significant_children(pair).next() {
                Some(p) => Some(Box::new(build_ast_from_expression_rule(p)?)),
                None => None,
            };
            StatementType::ReturnStatement { meta, argument }
        }
        Rule::throw_statement => {
            let argument = expect_next(&mut significant_children(pair), &span)?;
            StatementType::ThrowStatement {
                meta,
                argument: Box::new(build_ast_from_expression_rule(argument)?),
            }
        }
        Rule::try_statement => build_ast_from_try_statement(pair)?,
        Rule::switch_statement => build_ast_from_switch_statement(pair)?,
        _ => return Err(get_unexpected_error(1, &pair)),
    })
}

fn build_ast_from_variable_declaration_list(
    pair: Pair<Rule>,
    require_initializers: bool,
) -> BuildResult<VariableDeclarationData> {
    let meta = get_meta(&pair);
    let span = pair.as_span();
    let mut inner = pair.into_inner();
    let kind_pair = expect_next(&mut inner, &span)?;
    let kind = match kind_pair.as_str() {
        "var" => VariableDeclarationKind::Var,
        "let" => VariableDeclarationKind::Let,
        "const" => VariableDeclarationKind::Const,
        _ => return Err(get_unexpected_error(2, &kind_pair)),
    };
    let mut declarations = vec![];
    for declarator in inner {
        let d_meta = get_meta(&declarator);
        let d_span = declarator.as_span();
        let mut d_inner = declarator.into_inner();
        let id = build_ast_from_binding_target(expect_next(&mut d_inner, &d_span)?)?;
        let init = match d_inner.next() {
            Some(initializer) => Some(Box::new(build_ast_from_initializer(initializer)?)),
            None => None,
        };
        if require_initializers && init.is_none() {
            if kind == VariableDeclarationKind::Const {
                return Err(get_validation_error(
                    "Missing initializer in const declaration",
                    d_span,
                ));
            }
            if !matches!(id, PatternType::Identifier(_)) {
                return Err(get_validation_error(
                    "Missing initializer in destructuring declaration",
                    d_span,
                ));
            }
        }
        declarations.push(VariableDeclaratorData {
            meta: d_meta,
            id,
            init,
        });
    }
    Ok(VariableDeclarationData {
        meta,
        declarations,
        kind,
    })
}

fn build_ast_from_initializer(pair: Pair<Rule>) -> BuildResult<ExpressionType> {
    let span = pair.as_span();
    build_ast_from_expression_rule(expect_next(&mut pair.into_inner(), &span)?)
}

fn build_ast_from_optional_expression(pair: Pair<Rule>) -> BuildResult<Option<Box<ExpressionType>>> {
    Ok(match pair.into_inner().next() {
        Some(p) => Some(Box::new(build_ast_from_expression_rule(p)?)),
        None => None,
    })
}

fn build_ast_from_for_statement(pair: Pair<Rule>) -> BuildResult<StatementType> {
    let meta = get_meta(&pair);
    let span = pair.as_span();
    let mut inner = significant_children(pair);
    let init_pair = expect_next(&mut inner, &span)?;
    let init = match init_pair.into_inner().next() {
        Some(p) if p.as_rule() == Rule::variable_declaration_list => Some(
            VariableDeclarationOrExpression::VariableDeclaration(
                build_ast_from_variable_declaration_list(p, true)?,
            ),
        ),
        Some(p) => Some(VariableDeclarationOrExpression::Expression(Box::new(
            build_ast_from_expression_rule(p)?,
        ))),
        None => None,
    };
    let test = build_ast_from_optional_expression(expect_next(&mut inner, &span)?)?;
    let update = build_ast_from_optional_expression(expect_next(&mut inner, &span)?)?;
    let body = build_ast_from_statement(expect_next(&mut inner, &span)?)?;
    Ok(StatementType::ForStatement {
        meta,
        init,
        test,
        update,
        body: Box::new(body),
    })
}

fn build_ast_from_for_in_of_statement(pair: Pair<Rule>) -> BuildResult<StatementType> {
    let meta = get_meta(&pair);
    let span = pair.as_span();
    let mut inner = significant_children(pair);
    let binding_pair = expect_next(&mut inner, &span)?;
    let binding_span = binding_pair.as_span();
    let mut binding_inner = binding_pair.into_inner();
    let first = expect_next(&mut binding_inner, &binding_span)?;
    let left = if first.as_rule() == Rule::var_kind {
        let kind = match first.as_str() {
            "var" => VariableDeclarationKind::Var,
            "let" => VariableDeclarationKind::Let,
            _ => VariableDeclarationKind::Const,
        };
        ForBinding::Declaration {
            kind,
            target: build_ast_from_binding_target(expect_next(&mut binding_inner, &binding_span)?)?,
        }
    } else {
        let expression = build_ast_from_expression_rule(first)?;
        ForBinding::Pattern(expression_to_pattern(expression).map_err(|m| {
            get_validation_error(m, binding_span.clone())
        })?)
    };
    let kind = expect_next(&mut inner, &span)?;
    let right = Box::new(build_ast_from_expression_rule(expect_next(&mut inner, &span)?)?);
    let body = Box::new(build_ast_from_statement(expect_next(&mut inner, &span)?)?);
    let data = ForIteratorData {
        meta,
        left,
        right,
        body,
    };
    Ok(if kind.as_str() == "of" {
        StatementType::ForOfStatement(data)
    } else {
        StatementType::ForInStatement(data)
    })
}

fn build_ast_from_try_statement(pair: Pair<Rule>) -> BuildResult<StatementType> {
    let meta = get_meta(&pair);
    let span = pair.as_span();
    let mut inner = significant_children(pair);
    let block = build_ast_from_block(expect_next(&mut inner, &span)?)?;
    let mut handler = None;
    let mut finalizer = None;
    for clause in inner {
        match clause.as_rule() {
            Rule::catch_clause => {
                let c_meta = get_meta(&clause);
                let mut param = None;
                let mut body = None;
                for p in significant_children(clause) {
                    if p.as_rule() == Rule::block_statement {
                        body = Some(build_ast_from_block(p)?);
                    } else {
                        param = Some(build_ast_from_binding_target(p)?);
                    }
                }
                let body = body.ok_or_else(|| get_validation_error("Unexpected token 'catch'", span.clone()))?;
                handler = Some(CatchClauseData {
                    meta: c_meta,
                    param,
                    body,
                });
            }
            Rule::finally_clause => {
                let f_span = clause.as_span();
                let block_pair = expect_next(&mut significant_children(clause), &f_span)?;
                finalizer = Some(build_ast_from_block(block_pair)?);
            }
            _ => return Err(get_unexpected_error(3, &clause)),
        }
    }
    Ok(StatementType::TryStatement {
        meta,
        block,
        handler,
        finalizer,
    })
}

fn build_ast_from_switch_statement(pair: Pair<Rule>) -> BuildResult<StatementType> {
    let meta = get_meta(&pair);
    let span = pair.as_span();
    let mut inner = significant_children(pair);
    let discriminant = build_ast_from_expression_rule(expect_next(&mut inner, &span)?)?;
    let mut cases = vec![];
    let mut seen_default = false;
    for clause in inner {
        let c_meta = get_meta(&clause);
        let c_span = clause.as_span();
        let is_default = clause.as_rule() == Rule::default_clause;
        let mut c_inner = significant_children(clause);
        let test = if is_default {
            if seen_default {
                return Err(get_validation_error(
                    "More than one default clause in switch statement",
                    c_span,
                ));
            }
            seen_default = true;
            None
        } else {
            Some(Box::new(build_ast_from_expression_rule(expect_next(
                &mut c_inner,
                &c_span,
            )?)?))
        };
        let mut consequent = vec![];
        for s in c_inner {
            consequent.push(build_ast_from_statement(s)?);
        }
        cases.push(SwitchCaseData {
            meta: c_meta,
            test,
            consequent,
        });
    }
    Ok(StatementType::SwitchStatement {
        meta,
        discriminant: Box::new(discriminant),
        cases,
    })
}

// ---------------------------------------------------------------------------
// Functions and patterns
// ---------------------------------------------------------------------------

fn build_ast_from_function(pair: Pair<Rule>) -> BuildResult<FunctionData> {
    let meta = get_meta(&pair);
    let source_text = pair.as_str().to_string();
    let mut is_async = false;
    let mut id = None;
    let mut params = vec![];
    let mut body = vec![];
    let mut body_meta = meta.clone();
    for inner_pair in pair.into_inner() {
        match inner_pair.as_rule() {
            Rule::async_kw => is_async = true,
            Rule::kw_function => {}
            Rule::binding_identifier => id = Some(build_ast_from_binding_identifier(inner_pair)),
            // Method names are applied when the method is evaluated; they do not bind.
            Rule::property_name => {}
            Rule::formal_parameters => params = build_ast_from_formal_parameters(inner_pair)?,
            Rule::function_body => {
                body_meta = get_meta(&inner_pair);
                body = build_ast_from_statement_list(inner_pair)?;
            }
            _ => return Err(get_unexpected_error(4, &inner_pair)),
        }
    }
    let var_names = var_scoped_names(&body);
    let uses_arguments = source_text.contains("arguments");
    Ok(FunctionData {
        meta,
        id,
        params,
        body: FunctionBodyOrExpression::FunctionBody(FunctionBodyData {
            meta: body_meta,
            body,
        }),
        is_async,
        is_arrow: false,
        source_text,
        var_names,
        uses_arguments,
    })
}

fn build_ast_from_arrow_function(pair: Pair<Rule>) -> BuildResult<FunctionData> {
    let meta = get_meta(&pair);
    let arrow_span = pair.as_span();
    let source_text = pair.as_str().to_string();
    let mut is_async = false;
    let mut params = vec![];
    let mut body = None;
    for inner_pair in pair.into_inner() {
        match inner_pair.as_rule() {
            Rule::async_kw => is_async = true,
            Rule::arrow_parameters => {
                let span = inner_pair.as_span();
                let p = expect_next(&mut inner_pair.into_inner(), &span)?;
                params = if p.as_rule() == Rule::binding_identifier {
                    vec![PatternType::Identifier(build_ast_from_binding_identifier(p))]
                } else {
                    build_ast_from_formal_parameters(p)?
                };
            }
            Rule::function_body => {
                let body_meta = get_meta(&inner_pair);
                body = Some(FunctionBodyOrExpression::FunctionBody(FunctionBodyData {
                    meta: body_meta,
                    body: build_ast_from_statement_list(inner_pair)?,
                }));
            }
            _ => {
                body = Some(FunctionBodyOrExpression::Expression(Box::new(
                    build_ast_from_expression_rule(inner_pair)?,
                )));
            }
        }
    }
    let body = match body {
        Some(b) => b,
        None => return Err(get_validation_error("Unexpected token '=>'", arrow_span)),
    };
    let var_names = match &body {
        FunctionBodyOrExpression::FunctionBody(b) => var_scoped_names(&b.body),
        FunctionBodyOrExpression::Expression(_) => vec![],
    };
    Ok(FunctionData {
        meta,
        id: None,
        params,
        body,
        is_async,
        is_arrow: true,
        source_text,
        var_names,
        uses_arguments: false,
    })
}

fn build_ast_from_formal_parameters(pair: Pair<Rule>) -> BuildResult<Vec<PatternType>> {
    let mut params = vec![];
    let mut seen_rest = false;
    for p in pair.into_inner() {
        if seen_rest {
            return Err(get_validation_error(
                "Rest parameter must be last formal parameter",
                p.as_span(),
            ));
        }
        seen_rest = p.as_rule() == Rule::binding_rest_element;
        params.push(build_ast_from_binding_target(p)?);
    }
    Ok(params)
}

fn build_ast_from_binding_identifier(pair: Pair<Rule>) -> IdentifierData {
    IdentifierData {
        name: pair.as_str().to_string(),
        meta: get_meta(&pair),
    }
}

fn build_ast_from_binding_target(pair: Pair<Rule>) -> BuildResult<PatternType> {
    let meta = get_meta(&pair);
    let span = pair.as_span();
    Ok(match pair.as_rule() {
        Rule::binding_identifier => PatternType::Identifier(build_ast_from_binding_identifier(pair)),
        Rule::binding_element => {
            let mut inner = pair.into_inner();
            let target = build_ast_from_binding_target(expect_next(&mut inner, &span)?)?;
            match inner.next() {
                Some(initializer) => PatternType::AssignmentPattern {
                    meta,
                    left: Box::new(target),
                    right: Box::new(build_ast_from_initializer(initializer)?),
                },
                None => target,
            }
        }
        Rule::binding_rest_element => {
            let target = build_ast_from_binding_target(expect_next(&mut pair.into_inner(), &span)?)?;
            PatternType::RestElement {
                meta,
                argument: Box::new(target),
            }
        }
        Rule::array_binding_pattern => {
            let mut elements = vec![];
            for p in pair.into_inner() {
                elements.push(if p.as_rule() == Rule::elision {
                    None
                } else {
                    Some(build_ast_from_binding_target(p)?)
                });
            }
            if let Some(None) = elements.last() {
                elements.pop();
            }
            PatternType::ArrayPattern { meta, elements }
        }
        Rule::object_binding_pattern => {
            let mut properties = vec![];
            let mut rest = None;
            for p in pair.into_inner() {
                let p_meta = get_meta(&p);
                let p_span = p.as_span();
                match p.as_rule() {
                    Rule::binding_rest_element => {
                        let target =
                            build_ast_from_binding_target(expect_next(&mut p.into_inner(), &p_span)?)?;
                        rest = Some(Box::new(target));
                    }
                    Rule::keyed_binding_property => {
                        let mut inner = p.into_inner();
                        let key = build_ast_from_property_name(expect_next(&mut inner, &p_span)?)?;
                        let value = build_ast_from_binding_target(expect_next(&mut inner, &p_span)?)?;
                        properties.push(AssignmentPropertyData {
                            meta: p_meta,
                            key,
                            value,
                        });
                    }
                    Rule::single_name_binding => {
                        let mut inner = p.into_inner();
                        let id = build_ast_from_binding_identifier(expect_next(&mut inner, &p_span)?);
                        let key = PropertyKey::Static(id.name.to_string());
                        let value = match inner.next() {
                            Some(initializer) => PatternType::AssignmentPattern {
                                meta: p_meta.clone(),
                                left: Box::new(PatternType::Identifier(id)),
                                right: Box::new(build_ast_from_initializer(initializer)?),
                            },
                            None => PatternType::Identifier(id),
                        };
                        properties.push(AssignmentPropertyData {
                            meta: p_meta,
                            key,
                            value,
                        });
                    }
                    _ => return Err(get_unexpected_error(5, &p)),
                }
            }
            PatternType::ObjectPattern {
                meta,
                properties,
                rest,
            }
        }
        _ => return Err(get_unexpected_error(6, &pair)),
    })
}

/// Reinterprets an expression on the left of `=` (or a for-in/of head) as a pattern.
fn expression_to_pattern(expression: ExpressionType) -> Result<PatternType, &'static str> {
    const INVALID: &str = "Invalid left-hand side in assignment";
    Ok(match expression {
        ExpressionType::Identifier(id) => PatternType::Identifier(id),
        ExpressionType::MemberExpression(m) => {
            let optional = match &m {
                MemberExpressionType::SimpleMemberExpression { optional, .. }
                | MemberExpressionType::ComputedMemberExpression { optional, .. } => *optional,
            };
            if optional {
                return Err(INVALID);
            }
            PatternType::MemberExpression(m)
        }
        ExpressionType::ArrayExpression { meta, elements } => {
            let count = elements.len();
            let mut patterns = vec![];
            for (idx, element) in elements.into_iter().enumerate() {
                patterns.push(match element {
                    None => None,
                    Some(ExpressionOrSpreadElement::Expression(e)) => Some(element_to_pattern(*e)?),
                    Some(ExpressionOrSpreadElement::SpreadElement(e)) => {
                        if idx + 1 != count {
                            return Err("Rest element must be last element");
                        }
                        let e_meta = e.get_meta().clone();
                        Some(PatternType::RestElement {
                            meta: e_meta,
                            argument: Box::new(expression_to_pattern(*e)?),
                        })
                    }
                });
            }
            PatternType::ArrayPattern {
                meta,
                elements: patterns,
            }
        }
        ExpressionType::ObjectExpression { meta, properties } => {
            let mut patterns = vec![];
            let mut rest = None;
            for property in properties {
                match property {
                    PropertyData::Property {
                        meta, key, value, ..
                    } => patterns.push(AssignmentPropertyData {
                        meta,
                        key,
                        value: element_to_pattern(*value)?,
                    }),
                    PropertyData::CoverInitializedName {
                        meta,
                        name,
                        initializer,
                    } => patterns.push(AssignmentPropertyData {
                        meta: meta.clone(),
                        key: PropertyKey::Static(name.name.to_string()),
                        value: PatternType::AssignmentPattern {
                            meta,
                            left: Box::new(PatternType::Identifier(name)),
                            right: initializer,
                        },
                    }),
                    PropertyData::Spread { argument, .. } => {
                        rest = Some(Box::new(expression_to_pattern(*argument)?));
                    }
                    PropertyData::Method { .. } => return Err("Invalid destructuring assignment target"),
                }
            }
            PatternType::ObjectPattern {
                meta,
                properties: patterns,
                rest,
            }
        }
        _ => return Err(INVALID),
    })
}

fn element_to_pattern(expression: ExpressionType) -> Result<PatternType, &'static str> {
    match expression {
        ExpressionType::AssignmentExpression {
            meta,
            operator: AssignmentOperator::Equals,
            left: PatternOrExpression::Pattern(left),
            right,
        } => Ok(PatternType::AssignmentPattern { meta, left, right }),
        other => expression_to_pattern(other),
    }
}

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

fn build_ast_from_expression_rule(pair: Pair<Rule>) -> BuildResult<ExpressionType> {
    let meta = get_meta(&pair);
    let span = pair.as_span();
    Ok(match pair.as_rule() {
        Rule::expression => {
            let mut expressions = vec![];
            for p in pair.into_inner() {
                expressions.push(build_ast_from_expression_rule(p)?);
            }
            if expressions.len() == 1 {
                expressions.remove(0)
            } else {
                ExpressionType::SequenceExpression { meta, expressions }
            }
        }
        Rule::assignment_expression => build_ast_from_assignment_expression(pair)?,
        Rule::conditional_expression => {
            let mut inner = pair.into_inner();
            let test = build_ast_from_expression_rule(expect_next(&mut inner, &span)?)?;
            match inner.next() {
                Some(consequent) => {
                    let alternate = expect_next(&mut inner, &span)?;
                    ExpressionType::ConditionalExpression {
                        meta,
                        test: Box::new(test),
                        consequent: Box::new(build_ast_from_expression_rule(consequent)?),
                        alternate: Box::new(build_ast_from_expression_rule(alternate)?),
                    }
                }
                None => test,
            }
        }
        Rule::logical_or_expression
        | Rule::logical_and_expression
        | Rule::bitwise_or_expression
        | Rule::bitwise_xor_expression
        | Rule::bitwise_and_expression
        | Rule::equality_expression
        | Rule::relational_expression
        | Rule::shift_expression
        | Rule::additive_expression
        | Rule::multiplicative_expression => build_ast_from_binary_chain(pair)?,
        Rule::exponentiation_expression => {
            let mut inner = pair.into_inner();
            let base_pair = expect_next(&mut inner, &span)?;
            let is_unary_base = base_pair
                .clone()
                .into_inner()
                .next()
                .map_or(false, |p| p.as_rule() == Rule::unary_operator);
            let base = build_ast_from_expression_rule(base_pair)?;
            match inner.next() {
                Some(_operator) => {
                    let exponent = build_ast_from_expression_rule(expect_next(&mut inner, &span)?)?;
                    if is_unary_base {
                        return Err(get_validation_error(
                            "Unary operator used immediately before exponentiation expression. Parenthesis must be used to disambiguate operator precedence",
                            span,
                        ));
                    }
                    ExpressionType::BinaryExpression {
                        meta,
                        operator: BinaryOperator::Exponentiation,
                        left: Box::new(base),
                        right: Box::new(exponent),
                    }
                }
                None => base,
            }
        }
        Rule::unary_expression => build_ast_from_unary_expression(pair)?,
        Rule::update_expression => build_ast_from_update_expression(pair)?,
        Rule::left_hand_side_expression => build_ast_from_left_hand_side_expression(pair)?,
        Rule::new_expression => build_ast_from_new_expression(pair)?,
        Rule::this_expression => ExpressionType::ThisExpression { meta },
        Rule::null_literal => ExpressionType::Literal(LiteralData {
            meta,
            value: LiteralType::NullLiteral,
        }),
        Rule::boolean_literal => ExpressionType::Literal(LiteralData {
            meta,
            value: LiteralType::BooleanLiteral(pair.as_str() == "true"),
        }),
        Rule::numeric_literal => ExpressionType::Literal(LiteralData {
            meta,
            value: LiteralType::NumberLiteral(parse_numeric_literal(pair.as_str())),
        }),
        Rule::string_literal => ExpressionType::Literal(LiteralData {
            meta,
            value: LiteralType::StringLiteral(build_string_value(pair)?),
        }),
        Rule::template_literal => build_ast_from_template_literal(pair)?,
        Rule::array_literal => build_ast_from_array_literal(pair)?,
        Rule::object_literal => build_ast_from_object_literal(pair)?,
        Rule::function_expression => {
            ExpressionType::FunctionExpression(Rc::new(build_ast_from_function(pair)?))
        }
        Rule::arrow_function => {
            ExpressionType::ArrowFunctionExpression(Rc::new(build_ast_from_arrow_function(pair)?))
        }
        Rule::parenthesized_expression => {
            build_ast_from_expression_rule(expect_next(&mut pair.into_inner(), &span)?)?
        }
        Rule::identifier_reference => ExpressionType::Identifier(IdentifierData {
            name: pair.as_str().trim().to_string(),
            meta,
        }),
        _ => return Err(get_unexpected_error(7, &pair)),
    })
}

fn build_ast_from_assignment_expression(pair: Pair<Rule>) -> BuildResult<ExpressionType> {
    let meta = get_meta(&pair);
    let span = pair.as_span();
    let mut inner = pair.into_inner();
    let first = expect_next(&mut inner, &span)?;
    let target_span = first.as_span();
    let left = build_ast_from_expression_rule(first)?;
    let operator_pair = match inner.next() {
        Some(p) => p,
        None => return Ok(left),
    };
    let right = build_ast_from_expression_rule(expect_next(&mut inner, &span)?)?;
    let operator = match operator_pair.as_str() {
        "=" => AssignmentOperator::Equals,
        "+=" => AssignmentOperator::AddEquals,
        "-=" => AssignmentOperator::SubtractEquals,
        "*=" => AssignmentOperator::MultiplyEquals,
        "/=" => AssignmentOperator::DivideEquals,
        "%=" => AssignmentOperator::ModuloEquals,
        "**=" => AssignmentOperator::ExponentiationEquals,
        "<<=" => AssignmentOperator::BitwiseLeftShiftEquals,
        ">>=" => AssignmentOperator::BitwiseRightShiftEquals,
        ">>>=" => AssignmentOperator::BitwiseUnsignedRightShiftEquals,
        "|=" => AssignmentOperator::BitwiseOrEquals,
        "&=" => AssignmentOperator::BitwiseAndEquals,
        "^=" => AssignmentOperator::BitwiseXorEquals,
        "&&=" => AssignmentOperator::LogicalAndEquals,
        "||=" => AssignmentOperator::LogicalOrEquals,
        "??=" => AssignmentOperator::NullishCoalescingEquals,
        _ => return Err(get_unexpected_error(8, &operator_pair)),
    };
    let left = if operator == AssignmentOperator::Equals {
        PatternOrExpression::Pattern(Box::new(
            expression_to_pattern(left).map_err(|m| get_validation_error(m, target_span))?,
        ))
    } else {
        match left {
            ExpressionType::Identifier(_) | ExpressionType::MemberExpression(_) => {
                PatternOrExpression::Expression(Box::new(left))
            }
            _ => {
                return Err(get_validation_error(
                    "Invalid left-hand side in assignment",
                    target_span,
                ))
            }
        }
    };
    Ok(ExpressionType::AssignmentExpression {
        meta,
        operator,
        left,
        right: Box::new(right),
    })
}

fn build_ast_from_binary_chain(pair: Pair<Rule>) -> BuildResult<ExpressionType> {
    let span = pair.as_span();
    let start_index = span.start();
    let mut inner = pair.into_inner();
    let mut left = build_ast_from_expression_rule(expect_next(&mut inner, &span)?)?;
    while let Some(operator_pair) = inner.next() {
        let right_pair = expect_next(&mut inner, &span)?;
        let meta = Meta {
            start_index,
            end_index: right_pair.as_span().end(),
        };
        let right = Box::new(build_ast_from_expression_rule(right_pair)?);
        let left_box = Box::new(left);
        left = match operator_pair.as_str() {
            "||" => ExpressionType::LogicalExpression {
                meta,
                operator: LogicalOperator::Or,
                left: left_box,
                right,
            },
            "&&" => ExpressionType::LogicalExpression {
                meta,
                operator: LogicalOperator::And,
                left: left_box,
                right,
            },
            "??" => ExpressionType::LogicalExpression {
                meta,
                operator: LogicalOperator::NullishCoalescing,
                left: left_box,
                right,
            },
            op => ExpressionType::BinaryExpression {
                meta,
                operator: match op {
                    "==" => BinaryOperator::LooselyEqual,
                    "!=" => BinaryOperator::LooselyUnequal,
                    "===" => BinaryOperator::StrictlyEqual,
                    "!==" => BinaryOperator::StrictlyUnequal,
                    "<" => BinaryOperator::LessThan,
                    "<=" => BinaryOperator::LessThanEqual,
                    ">" => BinaryOperator::GreaterThan,
                    ">=" => BinaryOperator::GreaterThanEqual,
                    "<<" => BinaryOperator::BitwiseLeftShift,
                    ">>" => BinaryOperator::BitwiseRightShift,
                    ">>>" => BinaryOperator::BitwiseUnsignedRightShift,
                    "+" => BinaryOperator::Add,
                    "-" => BinaryOperator::Subtract,
                    "*" => BinaryOperator::Multiply,
                    "/" => BinaryOperator::Divide,
                    "%" => BinaryOperator::Modulo,
                    "|" => BinaryOperator::BitwiseOr,
                    "&" => BinaryOperator::BitwiseAnd,
                    "^" => BinaryOperator::BitwiseXor,
                    "in" => BinaryOperator::In,
                    "instanceof" => BinaryOperator::InstanceOf,
                    _ => return Err(get_unexpected_error(9, &operator_pair)),
                },
                left: left_box,
                right,
            },
        };
    }
    Ok(left)
}

fn build_ast_from_unary_expression(pair: Pair<Rule>) -> BuildResult<ExpressionType> {
    let meta = get_meta(&pair);
    let span = pair.as_span();
    let mut inner = pair.into_inner();
    let first = expect_next(&mut inner, &span)?;
    if first.as_rule() != Rule::unary_operator {
        return build_ast_from_expression_rule(first);
    }
    let argument = Box::new(build_ast_from_expression_rule(expect_next(&mut inner, &span)?)?);
    let operator = match first.as_str() {
        "await" => return Ok(ExpressionType::AwaitExpression { meta, argument }),
        "delete" => UnaryOperator::Delete,
        "void" => UnaryOperator::Void,
        "typeof" => UnaryOperator::TypeOf,
        "+" => UnaryOperator::Plus,
        "-" => UnaryOperator::Minus,
        "~" => UnaryOperator::BitwiseNot,
        "!" => UnaryOperator::LogicalNot,
        _ => return Err(get_unexpected_error(10, &first)),
    };
    Ok(ExpressionType::UnaryExpression {
        meta,
        operator,
        argument,
    })
}

fn build_ast_from_update_expression(pair: Pair<Rule>) -> BuildResult<ExpressionType> {
    let meta = get_meta(&pair);
    let span = pair.as_span();
    let mut inner = pair.into_inner();
    let first = expect_next(&mut inner, &span)?;
    let (operator_pair, argument_pair, prefix) = if first.as_rule() == Rule::update_operator {
        (first, expect_next(&mut inner, &span)?, true)
    } else {
        match inner.next() {
            Some(op) => (op, first, false),
            None => return build_ast_from_expression_rule(first),
        }
    };
    let operator = if operator_pair.as_str() == "++" {
        UpdateOperator::PlusPlus
    } else {
        UpdateOperator::MinusMinus
    };
    let argument = build_ast_from_expression_rule(argument_pair)?;
    if !matches!(
        argument,
        ExpressionType::Identifier(_) | ExpressionType::MemberExpression(_)
    ) {
        let message = if prefix {
            "Invalid left-hand side expression in prefix operation"
        } else {
            "Invalid left-hand side expression in postfix operation"
        };
        return Err(get_validation_error(message, span));
    }
    Ok(ExpressionType::UpdateExpression {
        meta,
        operator,
        argument: Box::new(argument),
        prefix,
    })
}

fn build_ast_from_left_hand_side_expression(pair: Pair<Rule>) -> BuildResult<ExpressionType> {
    let meta = get_meta(&pair);
    let span = pair.as_span();
    let start_index = span.start();
    let mut inner = pair.into_inner();
    let mut expression = build_ast_from_expression_rule(expect_next(&mut inner, &span)?)?;
    let mut has_optional_link = false;
    for tail in inner {
        let tail_meta = Meta {
            start_index,
            end_index: tail.as_span().end(),
        };
        expression = build_ast_from_call_tail(expression, tail, tail_meta, &mut has_optional_link)?;
    }
    Ok(if has_optional_link {
        ExpressionType::ChainExpression {
            meta,
            expression: Box::new(expression),
        }
    } else {
        expression
    })
}

fn build_ast_from_call_tail(
    object: ExpressionType,
    tail: Pair<Rule>,
    meta: Meta,
    has_optional_link: &mut bool,
) -> BuildResult<ExpressionType> {
    let span = tail.as_span();
    let object = Box::new(object);
    Ok(match tail.as_rule() {
        Rule::arguments => ExpressionType::CallExpression {
            meta,
            callee: object,
            arguments: build_ast_from_arguments(tail)?,
            optional: false,
        },
        Rule::member_dot => {
            let name_pair = expect_next(&mut tail.into_inner(), &span)?;
            ExpressionType::MemberExpression(MemberExpressionType::SimpleMemberExpression {
                meta,
                object,
                property: build_ast_from_binding_identifier(name_pair),
                optional: false,
            })
        }
        Rule::member_computed => {
            let property_pair = expect_next(&mut tail.into_inner(), &span)?;
            ExpressionType::MemberExpression(MemberExpressionType::ComputedMemberExpression {
                meta,
                object,
                property: Box::new(build_ast_from_expression_rule(property_pair)?),
                optional: false,
            })
        }
        Rule::optional_chain_link => {
            *has_optional_link = true;
            let link = expect_next(&mut tail.into_inner(), &span)?;
            match link.as_rule() {
                Rule::arguments => ExpressionType::CallExpression {
                    meta,
                    callee: object,
                    arguments: build_ast_from_arguments(link)?,
                    optional: true,
                },
                Rule::member_computed => {
                    let l_span = link.as_span();
                    let property_pair = expect_next(&mut link.into_inner(), &l_span)?;
                    ExpressionType::MemberExpression(MemberExpressionType::ComputedMemberExpression {
                        meta,
                        object,
                        property: Box::new(build_ast_from_expression_rule(property_pair)?),
                        optional: true,
                    })
                }
                _ => ExpressionType::MemberExpression(MemberExpressionType::SimpleMemberExpression {
                    meta,
                    object,
                    property: build_ast_from_binding_identifier(link),
                    optional: true,
                }),
            }
        }
        _ => return Err(get_unexpected_error(11, &tail)),
    })
}

fn build_ast_from_new_expression(pair: Pair<Rule>) -> BuildResult<ExpressionType> {
    let meta = get_meta(&pair);
    let span = pair.as_span();
    let mut inner = significant_children(pair);
    let target = expect_next(&mut inner, &span)?;
    let target_span = target.as_span();
    let start_index = target_span.start();
    let mut target_inner = target.into_inner();
    let mut callee = build_ast_from_expression_rule(expect_next(&mut target_inner, &target_span)?)?;
    let mut unused = false;
    for tail in target_inner {
        let tail_meta = Meta {
            start_index,
            end_index: tail.as_span().end(),
        };
        callee = build_ast_from_call_tail(callee, tail, tail_meta, &mut unused)?;
    }
    let arguments = match inner.next() {
        Some(a) => build_ast_from_arguments(a)?,
        None => vec![],
    };
    Ok(ExpressionType::NewExpression {
        meta,
        callee: Box::new(callee),
        arguments,
    })
}

fn build_ast_from_arguments(pair: Pair<Rule>) -> BuildResult<Vec<ExpressionOrSpreadElement>> {
    let mut arguments = vec![];
    for p in pair.into_inner() {
        arguments.push(build_ast_from_expression_or_spread(p)?);
    }
    Ok(arguments)
}

fn build_ast_from_expression_or_spread(pair: Pair<Rule>) -> BuildResult<ExpressionOrSpreadElement> {
    Ok(if pair.as_rule() == Rule::spread_element {
        let span = pair.as_span();
        let inner = expect_next(&mut pair.into_inner(), &span)?;
        ExpressionOrSpreadElement::SpreadElement(Box::new(build_ast_from_expression_rule(inner)?))
    } else {
        ExpressionOrSpreadElement::Expression(Box::new(build_ast_from_expression_rule(pair)?))
    })
}

fn build_string_value(pair: Pair<Rule>) -> BuildResult<String> {
    let span = pair.as_span();
    let raw = match pair.into_inner().next() {
        Some(chars) => chars.as_str(),
        None => "",
    };
    unescape_string(raw).map_err(|m| get_validation_error(&m, span))
}

fn build_ast_from_template_literal(pair: Pair<Rule>) -> BuildResult<ExpressionType> {
    let meta = get_meta(&pair);
    let span = pair.as_span();
    let mut quasis = vec![];
    let mut expressions = vec![];
    let mut current = String::new();
    let mut current_start = span.start() + 1;
    for p in pair.into_inner() {
        match p.as_rule() {
            Rule::template_characters => {
                current.push_str(&unescape_string(p.as_str()).map_err(|m| get_validation_error(&m, p.as_span()))?);
            }
            Rule::template_substitution => {
                quasis.push(TemplateElementData {
                    meta: Meta {
                        start_index: current_start,
                        end_index: p.as_span().start(),
                    },
                    tail: false,
                    cooked_value: std::mem::take(&mut current),
                });
                current_start = p.as_span().end();
                let p_span = p.as_span();
                expressions.push(build_ast_from_expression_rule(expect_next(&mut p.into_inner(), &p_span)?)?);
            }
            _ => return Err(get_unexpected_error(12, &p)),
        }
    }
    quasis.push(TemplateElementData {
        meta: Meta {
            start_index: current_start,
            end_index: span.end().saturating_sub(1),
        },
        tail: true,
        cooked_value: current,
    });
    Ok(ExpressionType::TemplateLiteral(TemplateLiteralData {
        meta,
        quasis,
        expressions,
    }))
}

fn build_ast_from_array_literal(pair: Pair<Rule>) -> BuildResult<ExpressionType> {
    let meta = get_meta(&pair);
    let mut elements = vec![];
    for p in pair.into_inner() {
        elements.push(if p.as_rule() == Rule::elision {
            None
        } else {
            Some(build_ast_from_expression_or_spread(p)?)
        });
    }
    // A trailing comma does not add a hole.
    if let Some(None) = elements.last() {
        elements.pop();
    }
    Ok(ExpressionType::ArrayExpression { meta, elements })
}

fn build_ast_from_property_name(pair: Pair<Rule>) -> BuildResult<PropertyKey> {
    let span = pair.as_span();
    let inner = expect_next(&mut pair.into_inner(), &span)?;
    Ok(match inner.as_rule() {
        Rule::identifier_name => PropertyKey::Static(inner.as_str().to_string()),
        Rule::string_literal => PropertyKey::Static(build_string_value(inner)?),
        Rule::numeric_literal => PropertyKey::Static(match parse_numeric_literal(inner.as_str()) {
            NumberLiteralType::IntegerLiteral(i) => i.to_string(),
            NumberLiteralType::FloatLiteral(f) => f.to_string(),
        }),
        Rule::computed_property_name => {
            let c_span = inner.as_span();
            let expression = expect_next(&mut inner.into_inner(), &c_span)?;
            PropertyKey::Computed(Box::new(build_ast_from_expression_rule(expression)?))
        }
        _ => return Err(get_unexpected_error(13, &inner)),
    })
}

fn build_ast_from_object_literal(pair: Pair<Rule>) -> BuildResult<ExpressionType> {
    let meta = get_meta(&pair);
    let mut properties = vec![];
    for p in pair.into_inner() {
        let p_meta = get_meta(&p);
        let p_span = p.as_span();
        properties.push(match p.as_rule() {
            Rule::spread_element => PropertyData::Spread {
                meta: p_meta,
                argument: Box::new(build_ast_from_expression_rule(expect_next(
                    &mut p.into_inner(),
                    &p_span,
                )?)?),
            },
            Rule::property_assignment => {
                let mut inner = p.into_inner();
                let key = build_ast_from_property_name(expect_next(&mut inner, &p_span)?)?;
                let value = build_ast_from_expression_rule(expect_next(&mut inner, &p_span)?)?;
                PropertyData::Property {
                    meta: p_meta,
                    key,
                    value: Box::new(value),
                    shorthand: false,
                }
            }
            Rule::method_definition => {
                let key_pair = p
                    .clone()
                    .into_inner()
                    .find(|c| c.as_rule() == Rule::property_name)
                    .ok_or_else(|| get_unexpected_error(14, &p))?;
                let key = build_ast_from_property_name(key_pair)?;
                PropertyData::Method {
                    meta: p_meta,
                    key,
                    value: Rc::new(build_ast_from_function(p)?),
                }
            }
            Rule::shorthand_property => {
                let mut inner = p.into_inner();
                let id_pair = expect_next(&mut inner, &p_span)?;
                let name = IdentifierData {
                    name: id_pair.as_str().trim().to_string(),
                    meta: get_meta(&id_pair),
                };
                match inner.next() {
                    Some(initializer) => PropertyData::CoverInitializedName {
                        meta: p_meta,
                        name,
                        initializer: Box::new(build_ast_from_initializer(initializer)?),
                    },
                    None => PropertyData::Property {
                        meta: p_meta,
                        key: PropertyKey::Static(name.name.to_string()),
                        value: Box::new(ExpressionType::Identifier(name)),
                        shorthand: true,
                    },
                }
            }
            _ => return Err(get_unexpected_error(15, &p)),
        });
    }
    Ok(ExpressionType::ObjectExpression { meta, properties })
}
