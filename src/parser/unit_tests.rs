use super::api::JsParser;
use super::api::Rule;
use super::ast::*;
use super::util::{parse_numeric_literal, unescape_string};

use pest::consumes_to;
use pest::parses_to;
use pest::Parser;

fn parse(code: &str) -> ProgramData {
    match JsParser::parse_to_ast_from_str(code) {
        Ok(p) => p,
        Err(e) => panic!("Failed to parse {:?}: {:?}", code, e),
    }
}

fn parse_err(code: &str) -> JsError {
    match JsParser::parse_to_ast_from_str(code) {
        Ok(p) => panic!("Expected a parse error for {:?}, got {:?}", code, p.body),
        Err(e) => e,
    }
}

fn first_expression(program: &ProgramData) -> &ExpressionType {
    match program.body.first() {
        Some(StatementType::ExpressionStatement { expression, .. }) => expression,
        other => panic!("Expected an expression statement, got {:?}", other),
    }
}

fn first_declaration(program: &ProgramData) -> &VariableDeclarationData {
    match program.body.first() {
        Some(StatementType::DeclarationStatement(DeclarationType::VariableDeclaration(v))) => v,
        other => panic!("Expected a variable declaration, got {:?}", other),
    }
}

#[test]
fn test_decimal_number_token() {
    parses_to! {
        parser: JsParser,
        input: "10.001",
        rule: Rule::numeric_literal,
        tokens: [
            numeric_literal(0, 6)
        ]
    };
}

#[test]
fn test_hex_number_token() {
    parses_to! {
        parser: JsParser,
        input: "0xFF",
        rule: Rule::numeric_literal,
        tokens: [
            numeric_literal(0, 4)
        ]
    };
}

#[test]
fn test_double_quoted_string_token() {
    parses_to! {
        parser: JsParser,
        input: "\"ab\"",
        rule: Rule::string_literal,
        tokens: [
            string_literal(0, 4, [
                double_string_characters(1, 3)
            ])
        ]
    };
}

#[test]
fn test_single_quoted_string_with_escape_token() {
    parses_to! {
        parser: JsParser,
        input: "'a\\'b'",
        rule: Rule::string_literal,
        tokens: [
            string_literal(0, 6, [
                single_string_characters(1, 5)
            ])
        ]
    };
}

#[test]
fn test_plain_template_token() {
    parses_to! {
        parser: JsParser,
        input: "`hi`",
        rule: Rule::template_literal,
        tokens: [
            template_literal(0, 4, [
                template_characters(1, 3)
            ])
        ]
    };
}

#[test]
fn test_keywords_are_not_identifiers() {
    assert!(JsParser::parse(Rule::identifier, "if").is_err());
    assert!(JsParser::parse(Rule::identifier, "const").is_err());
    let ident = JsParser::parse(Rule::identifier, "ifx").unwrap().next().unwrap();
    assert_eq!(ident.as_str(), "ifx");
    let ident = JsParser::parse(Rule::identifier, "$_async1").unwrap().next().unwrap();
    assert_eq!(ident.as_str(), "$_async1");
}

#[test]
fn test_var_declaration() {
    let program = parse("var x = 5 + 3;");
    assert_eq!(program.body.len(), 1);
    let decl = first_declaration(&program);
    assert_eq!(decl.kind, VariableDeclarationKind::Var);
    assert!(matches!(&decl.declarations[0].id, PatternType::Identifier(id) if id.name == "x"));
    assert!(matches!(
        decl.declarations[0].init.as_deref(),
        Some(ExpressionType::BinaryExpression {
            operator: BinaryOperator::Add,
            ..
        })
    ));
    assert_eq!(program.var_names, vec!["x".to_string()]);
}

#[test]
fn test_multiplication_binds_tighter_than_addition() {
    let program = parse("1 + 2 * 3;");
    match first_expression(&program) {
        ExpressionType::BinaryExpression {
            operator: BinaryOperator::Add,
            left,
            right,
            ..
        } => {
            assert!(matches!(
                left.as_ref(),
                ExpressionType::Literal(LiteralData {
                    value: LiteralType::NumberLiteral(NumberLiteralType::IntegerLiteral(1)),
                    ..
                })
            ));
            assert!(matches!(
                right.as_ref(),
                ExpressionType::BinaryExpression {
                    operator: BinaryOperator::Multiply,
                    ..
                }
            ));
        }
        other => panic!("Unexpected {:?}", other),
    }
}

#[test]
fn test_exponent_is_right_associative() {
    let program = parse("2 ** 3 ** 2;");
    match first_expression(&program) {
        ExpressionType::BinaryExpression {
            operator: BinaryOperator::Exponentiation,
            right,
            ..
        } => assert!(matches!(
            right.as_ref(),
            ExpressionType::BinaryExpression {
                operator: BinaryOperator::Exponentiation,
                ..
            }
        )),
        other => panic!("Unexpected {:?}", other),
    }
}

#[test]
fn test_logical_operators() {
    let program = parse("a ?? b;");
    assert!(matches!(
        first_expression(&program),
        ExpressionType::LogicalExpression {
            operator: LogicalOperator::NullishCoalescing,
            ..
        }
    ));
    let program = parse("a || b && c;");
    match first_expression(&program) {
        ExpressionType::LogicalExpression {
            operator: LogicalOperator::Or,
            right,
            ..
        } => assert!(matches!(
            right.as_ref(),
            ExpressionType::LogicalExpression {
                operator: LogicalOperator::And,
                ..
            }
        )),
        other => panic!("Unexpected {:?}", other),
    }
}

#[test]
fn test_compound_assignment() {
    let program = parse("total += 2;");
    assert!(matches!(
        first_expression(&program),
        ExpressionType::AssignmentExpression {
            operator: AssignmentOperator::AddEquals,
            ..
        }
    ));
}

#[test]
fn test_destructuring_declaration() {
    let program = parse("let { a, b: [c, ...d] } = obj;");
    let decl = first_declaration(&program);
    assert_eq!(decl.kind, VariableDeclarationKind::Let);
    match &decl.declarations[0].id {
        PatternType::ObjectPattern { properties, rest, .. } => {
            assert_eq!(properties.len(), 2);
            assert!(rest.is_none());
            assert!(matches!(&properties[1].value, PatternType::ArrayPattern { elements, .. } if elements.len() == 2));
        }
        other => panic!("Unexpected {:?}", other),
    }
    assert!(program.var_names.is_empty());
}

#[test]
fn test_arrow_function_params() {
    let program = parse("const add = (a, b = 1) => a + b;");
    let decl = first_declaration(&program);
    match decl.declarations[0].init.as_deref() {
        Some(ExpressionType::ArrowFunctionExpression(f)) => {
            assert_eq!(f.params.len(), 2);
            assert_eq!(f.length(), 1);
            assert!(f.is_arrow);
            assert!(matches!(f.body, FunctionBodyOrExpression::Expression(_)));
        }
        other => panic!("Unexpected {:?}", other),
    }
}

#[test]
fn test_async_function_declaration() {
    let program = parse("async function load() { await fetchIt(); }");
    match program.body.first() {
        Some(StatementType::DeclarationStatement(DeclarationType::FunctionDeclaration(f))) => {
            assert!(f.is_async);
            assert_eq!(f.name(), Some("load"));
            assert_eq!(f.source_text, "async function load() { await fetchIt(); }");
        }
        other => panic!("Unexpected {:?}", other),
    }
}

#[test]
fn test_optional_chain() {
    let program = parse("user?.address;");
    assert!(matches!(first_expression(&program), ExpressionType::ChainExpression { .. }));
}

#[test]
fn test_template_literal_parts() {
    let program = parse("`x${y}z`;");
    match first_expression(&program) {
        ExpressionType::TemplateLiteral(t) => {
            assert_eq!(t.expressions.len(), 1);
            let cooked: Vec<&str> = t.quasis.iter().map(|q| q.cooked_value.as_str()).collect();
            assert_eq!(cooked, vec!["x", "z"]);
            assert!(t.quasis[1].tail);
        }
        other => panic!("Unexpected {:?}", other),
    }
}

#[test]
fn test_string_escapes_are_cooked() {
    let program = parse("'a\\nb';");
    assert!(matches!(
        first_expression(&program),
        ExpressionType::Literal(LiteralData {
            value: LiteralType::StringLiteral(s),
            ..
        }) if s == "a\nb"
    ));
}

#[test]
fn test_for_of_with_const() {
    let program = parse("for (const x of xs) { console.log(x); }");
    match program.body.first() {
        Some(StatementType::ForOfStatement(data)) => assert!(matches!(
            data.left,
            ForBinding::Declaration {
                kind: VariableDeclarationKind::Const,
                ..
            }
        )),
        other => panic!("Unexpected {:?}", other),
    }
}

#[test]
fn test_statements_without_semicolons() {
    let program = parse("let a = 1\nlet b = 2\nconsole.log(a + b)");
    assert_eq!(program.body.len(), 3);
}

#[test]
fn test_comments_are_skipped() {
    let program = parse("// leading\n/* block */ var a = 1; // trailing");
    assert_eq!(program.body.len(), 1);
}

#[test]
fn test_var_names_are_hoisted_from_blocks_only() {
    let program = parse("var a; if (a) { var b; } function f() { var c; } for (var i = 0; i < 1; i++) {}");
    assert_eq!(program.var_names, vec!["a".to_string(), "b".to_string(), "i".to_string()]);
}

#[test]
fn test_try_catch_without_binding() {
    let program = parse("try { risky(); } catch { recover(); } finally { done(); }");
    match program.body.first() {
        Some(StatementType::TryStatement {
            handler: Some(handler),
            finalizer: Some(_),
            ..
        }) => assert!(handler.param.is_none()),
        other => panic!("Unexpected {:?}", other),
    }
}

#[test]
fn test_unterminated_call_reports_end_of_input() {
    let err = parse_err("console.log(1");
    assert_eq!(err.message, "Unexpected end of input");
    assert_eq!(err.line, 1);
}

#[test]
fn test_missing_const_initializer() {
    assert_eq!(parse_err("const x;").message, "Missing initializer in const declaration");
}

#[test]
fn test_invalid_assignment_target() {
    assert_eq!(parse_err("1 = 2;").message, "Invalid left-hand side in assignment");
}

#[test]
fn test_unary_before_exponent_is_rejected() {
    assert!(parse_err("-2 ** 2;").message.starts_with("Unary operator used immediately before exponentiation"));
}

#[test]
fn test_rest_parameter_must_be_last() {
    assert_eq!(
        parse_err("function f(...a, b) {}").message,
        "Rest parameter must be last formal parameter"
    );
}

#[test]
fn test_classes_are_not_supported() {
    assert!(JsParser::parse_to_ast_from_str("class A {}").is_err());
}

#[test]
fn test_parse_numeric_literal() {
    assert!(matches!(parse_numeric_literal("1234"), NumberLiteralType::IntegerLiteral(1234)));
    assert!(matches!(parse_numeric_literal("0xff"), NumberLiteralType::IntegerLiteral(255)));
    assert!(matches!(parse_numeric_literal("0b101"), NumberLiteralType::IntegerLiteral(5)));
    assert!(matches!(parse_numeric_literal("0o17"), NumberLiteralType::IntegerLiteral(15)));
    assert!(matches!(parse_numeric_literal("1.5"), NumberLiteralType::FloatLiteral(f) if f == 1.5));
    assert!(matches!(parse_numeric_literal("1e3"), NumberLiteralType::FloatLiteral(f) if f == 1000.0));
    assert!(matches!(parse_numeric_literal(".5"), NumberLiteralType::FloatLiteral(f) if f == 0.5));
}

#[test]
fn test_unescape_string() {
    assert_eq!(unescape_string("a\\tb").unwrap(), "a\tb");
    assert_eq!(unescape_string("\\x41\\u0042\\u{43}").unwrap(), "ABC");
    assert_eq!(unescape_string("\\uD83D\\uDE00").unwrap(), "\u{1F600}");
    assert_eq!(unescape_string("\\q").unwrap(), "q");
    assert!(unescape_string("\\u{110000}").is_err());
}

#[test]
fn test_lexical_redeclaration_is_an_early_error() {
    let e = parse_err("let a = 1;\nlet a = 2;");
    assert_eq!(e.message, "Identifier 'a' has already been declared");
    assert_eq!((e.line, e.column), (2, 1));
    assert_eq!(parse_err("let a; var a;").message, "Identifier 'a' has already been declared");
    assert_eq!(parse_err("var a; const a = 1;").message, "Identifier 'a' has already been declared");
    assert_eq!(parse_err("let a; { var a; }").message, "Identifier 'a' has already been declared");
    assert_eq!(parse_err("function f() {} let f;").message, "Identifier 'f' has already been declared");
    assert_eq!(parse_err("function g(x) { let x; }").message, "Identifier 'x' has already been declared");
    assert_eq!(parse_err("try {} catch (e) { let e; }").message, "Identifier 'e' has already been declared");
    assert_eq!(
        parse_err("switch (1) { case 1: let k; break; case 2: let k; }").message,
        "Identifier 'k' has already been declared"
    );
    assert_eq!(
        parse_err("setTimeout(() => { const t = 1; const t = 2; })").message,
        "Identifier 't' has already been declared"
    );
}

#[test]
fn test_separate_scopes_may_reuse_names() {
    parse("let a = 1; { let a = 2; } function f() { let a = 3; }");
    parse("var v; var v; function h() {} function h() {}");
    parse("{ let b; } var b;");
    parse("for (let i = 0; i < 2; i++) { let i = 5; }");
    parse("try {} catch (e) { var e; }");
    parse("function p(n) { var n; }");
}

#[test]
fn test_jump_statements_need_a_target() {
    let e = parse_err("if (false) return;\nconsole.log(1)");
    assert_eq!(e.message, "Illegal return statement");
    assert_eq!(e.line, 1);
    assert_eq!(parse_err("break;").message, "Illegal break statement");
    assert_eq!(
        parse_err("if (true) { continue; }").message,
        "Illegal continue statement: no surrounding iteration statement"
    );
    assert_eq!(
        parse_err("switch (1) { case 1: continue; }").message,
        "Illegal continue statement: no surrounding iteration statement"
    );
    assert_eq!(
        parse_err("while (true) { [1].forEach(() => { break; }); }").message,
        "Illegal break statement"
    );
}

#[test]
fn test_jump_statements_inside_their_targets_parse() {
    parse("while (true) { if (1) break; else continue; }");
    parse("switch (1) { case 1: break; }");
    parse("for (const x of []) { switch (x) { case 1: continue; } }");
    parse("const f = () => { return 1; }; function g() { return; }");
}
