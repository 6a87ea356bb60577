//! Tests for compiling syntax trees and running the result.

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use crate::ast::{AstNode, NodeType};
    use crate::{CompileError, Compiler, Context, Engine, InnerError, Options, RuntimeError, Value};

    fn leaf(node_type: NodeType, token: &str) -> AstNode {
        AstNode::leaf(node_type, token)
    }

    fn node(node_type: NodeType, token: &str, children: Vec<AstNode>) -> AstNode {
        AstNode::new(node_type, Some(token), children)
    }

    fn block(children: Vec<AstNode>) -> AstNode {
        AstNode::new(NodeType::StatementBlock, None, children)
    }

    fn int(i: i64) -> AstNode {
        leaf(NodeType::IntLiteral, &i.to_string())
    }

    fn local(name: &str) -> AstNode {
        leaf(NodeType::LocalVariable, name)
    }

    fn oosvar(name: &str) -> AstNode {
        leaf(NodeType::DirectOosvarValue, name)
    }

    fn op(symbol: &str, children: Vec<AstNode>) -> AstNode {
        node(NodeType::Operator, symbol, children)
    }

    fn call(name: &str, args: Vec<AstNode>) -> AstNode {
        node(NodeType::FunctionCallsite, name, args)
    }

    fn assign(lvalue: AstNode, rvalue: AstNode) -> AstNode {
        node(NodeType::Assignment, "=", vec![lvalue, rvalue])
    }

    fn end(statements: Vec<AstNode>) -> AstNode {
        node(NodeType::EndBlock, "end", vec![block(statements)])
    }

    fn func(name: &str, params: &[(&str, Option<&str>)], return_type: Option<&str>, body: Vec<AstNode>) -> AstNode {
        let params = node(
            NodeType::ParameterList,
            "",
            params
                .iter()
                .map(|(name, type_name)| match type_name {
                    Some(t) => node(NodeType::Parameter, name, vec![leaf(NodeType::TypeDeclaration, t)]),
                    None => leaf(NodeType::Parameter, name),
                })
                .collect(),
        );
        let mut children = vec![params];
        if let Some(t) = return_type {
            children.push(leaf(NodeType::ReturnType, t));
        }
        children.push(block(body));
        node(NodeType::NamedFunctionDefinition, name, children)
    }

    fn compile_error(root: AstNode) -> CompileError {
        Compiler::new().compile_program(&root).unwrap_err()
    }

    /// Runs only the `end` blocks of `root` and returns `@out`.
    fn run_end(root: AstNode) -> Result<Value, RuntimeError> {
        let mut engine = Engine::from_ast(&root, Options::default()).unwrap();
        match engine.execute_end(&Context::new()) {
            Ok(_) => Ok(engine.oosvars().get("out").cloned().unwrap_or_default()),
            Err(err) => match err.cause {
                InnerError::Runtime(err) => Err(err),
                InnerError::Compile(err) => panic!("unexpected compile error {err}"),
            },
        }
    }

    #[test]
    fn test_root_must_be_block() {
        assert_eq!(
            compile_error(int(1)),
            CompileError::UnexpectedRoot(NodeType::IntLiteral)
        );
    }

    #[rstest]
    #[case::unhandled_in_expression(
        block(vec![assign(local("x"), node(NodeType::WhileLoop, "while", vec![int(1)]))]),
        CompileError::UnhandledNodeType(NodeType::WhileLoop)
    )]
    #[case::wrong_arity(
        block(vec![assign(local("x"), node(NodeType::IndirectFieldValue, "$[", vec![int(1), int(2)]))]),
        CompileError::InternalConsistency {
            node_type: NodeType::IndirectFieldValue,
            expected: "1".to_string(),
            got: 2,
            token: Some("$[".to_string()),
        }
    )]
    #[case::unknown_function(
        block(vec![assign(local("x"), call("nosuch", vec![]))]),
        CompileError::UnknownFunction("nosuch".to_string())
    )]
    #[case::builtin_arity(
        block(vec![assign(local("x"), call("strlen", vec![]))]),
        CompileError::FunctionArity { name: "strlen".to_string(), expected: "1".to_string(), got: 0 }
    )]
    #[case::break_outside_loop(block(vec![leaf(NodeType::Break, "break")]), CompileError::BreakOutsideLoop)]
    #[case::return_outside_function(
        block(vec![node(NodeType::Return, "return", vec![])]),
        CompileError::ReturnOutsideFunction
    )]
    #[case::nested_begin(
        block(vec![node(NodeType::PatternActionBlock, "cond", vec![
            leaf(NodeType::BooleanLiteral, "true"),
            block(vec![node(NodeType::BeginBlock, "begin", vec![block(vec![])])]),
        ])]),
        CompileError::NotTopLevel(NodeType::BeginBlock)
    )]
    #[case::not_assignable(
        block(vec![assign(int(1), int(2))]),
        CompileError::NotAssignable(NodeType::IntLiteral)
    )]
    #[case::bad_int_literal(
        block(vec![assign(local("x"), leaf(NodeType::IntLiteral, "abc"))]),
        CompileError::BadLiteral { node_type: NodeType::IntLiteral, token: "abc".to_string() }
    )]
    #[case::unknown_type(
        block(vec![node(NodeType::LocalVariableDefinition, "string", vec![local("x")])]),
        CompileError::UnknownType("string".to_string())
    )]
    #[case::builtin_redefinition(
        block(vec![func("strlen", &[("s", None)], None, vec![])]),
        CompileError::BuiltinRedefinition("strlen".to_string())
    )]
    #[case::duplicate_function(
        block(vec![func("f", &[], None, vec![]), func("f", &[], None, vec![])]),
        CompileError::DuplicateFunction("f".to_string())
    )]
    #[case::user_function_arity(
        block(vec![func("f", &[("a", None)], None, vec![]), assign(local("x"), call("f", vec![]))]),
        CompileError::FunctionArity { name: "f".to_string(), expected: "1".to_string(), got: 0 }
    )]
    fn test_compile_errors(#[case] root: AstNode, #[case] expected: CompileError) {
        assert_eq!(compile_error(root), expected);
    }

    #[test]
    fn test_program_sections() {
        let root = block(vec![
            node(NodeType::BeginBlock, "begin", vec![block(vec![])]),
            assign(local("x"), int(1)),
            end(vec![]),
            end(vec![]),
            func("f", &[], None, vec![]),
        ]);
        let program = Compiler::new().compile_program(&root).unwrap();
        assert_eq!(program.begin_blocks.len(), 1);
        assert_eq!(program.main_block.statements.len(), 1);
        assert_eq!(program.end_blocks.len(), 2);
        assert_eq!(program.udfs.len(), 1);
        assert!(program.has_main_block());
    }

    #[test]
    fn test_function_called_before_definition_recurses() {
        // end { @out = fact(5) }  func fact(n) { if (n <= 1) { return 1 } return n * fact(n - 1) }
        let root = block(vec![
            end(vec![assign(oosvar("out"), call("fact", vec![int(5)]))]),
            func(
                "fact",
                &[("n", Some("int"))],
                Some("int"),
                vec![
                    node(
                        NodeType::IfChain,
                        "if",
                        vec![node(
                            NodeType::IfItem,
                            "if",
                            vec![
                                op("<=", vec![local("n"), int(1)]),
                                block(vec![node(NodeType::Return, "return", vec![int(1)])]),
                            ],
                        )],
                    ),
                    node(
                        NodeType::Return,
                        "return",
                        vec![op(
                            "*",
                            vec![local("n"), call("fact", vec![op("-", vec![local("n"), int(1)])])],
                        )],
                    ),
                ],
            ),
        ]);
        assert_eq!(run_end(root), Ok(Value::Int(120)));
    }

    #[test]
    fn test_function_locals_do_not_leak() {
        // func f() { y = 5; return x }  end { x = 1; @out = {"r": f() ?? "none", "y": y ?? "unset"} }
        let root = block(vec![
            func(
                "f",
                &[],
                None,
                vec![
                    assign(local("y"), int(5)),
                    node(NodeType::Return, "return", vec![local("x")]),
                ],
            ),
            end(vec![
                assign(local("x"), int(1)),
                assign(
                    oosvar("out"),
                    node(
                        NodeType::MapLiteral,
                        "{}",
                        vec![
                            node(
                                NodeType::MapLiteralKeyValuePair,
                                ":",
                                vec![
                                    leaf(NodeType::StringLiteral, "r"),
                                    op("??", vec![call("f", vec![]), leaf(NodeType::StringLiteral, "none")]),
                                ],
                            ),
                            node(
                                NodeType::MapLiteralKeyValuePair,
                                ":",
                                vec![
                                    leaf(NodeType::StringLiteral, "y"),
                                    op("??", vec![local("y"), leaf(NodeType::StringLiteral, "unset")]),
                                ],
                            ),
                        ],
                    ),
                ),
            ]),
        ]);
        let expected: Value = vec![("r", Value::from("none")), ("y", Value::from("unset"))]
            .into_iter()
            .collect();
        assert_eq!(run_end(root), Ok(expected));
    }

    #[test]
    fn test_recursion_limit() {
        let root = block(vec![
            func("f", &[], None, vec![node(NodeType::Return, "return", vec![call("f", vec![])])]),
            end(vec![assign(oosvar("out"), call("f", vec![]))]),
        ]);
        let mut engine = Engine::from_ast(&root, Options { max_call_depth: 16 }).unwrap();
        let err = engine.execute_end(&Context::new()).unwrap_err();
        assert_eq!(
            err.cause,
            InnerError::Runtime(RuntimeError::RecursionLimit(16))
        );
    }

    #[test]
    fn test_argument_and_return_type_gates() {
        let argument = block(vec![
            func("f", &[("s", Some("str"))], None, vec![]),
            end(vec![assign(oosvar("out"), call("f", vec![int(1)]))]),
        ]);
        assert!(matches!(
            run_end(argument),
            Err(RuntimeError::ArgumentType { gate: crate::TypeGate::Str, got: "int", .. })
        ));

        let returned = block(vec![
            func("g", &[], Some("map"), vec![node(NodeType::Return, "return", vec![int(1)])]),
            end(vec![assign(oosvar("out"), call("g", vec![]))]),
        ]);
        assert!(matches!(
            run_end(returned),
            Err(RuntimeError::ReturnType { gate: crate::TypeGate::Map, got: "int", .. })
        ));
    }

    #[rstest]
    #[case::plus_equals("+=", int(5), Value::Int(15))]
    #[case::dot_equals(".=", leaf(NodeType::StringLiteral, "x"), Value::from("10x"))]
    #[case::min_equals("min=", int(3), Value::Int(3))]
    #[case::absent_coalesce_keeps_present("??=", int(3), Value::Int(10))]
    fn test_operator_assignment(#[case] token: &str, #[case] rvalue: AstNode, #[case] expected: Value) {
        let root = block(vec![end(vec![
            assign(oosvar("out"), int(10)),
            node(NodeType::OperatorAssignment, token, vec![oosvar("out"), rvalue]),
        ])]);
        assert_eq!(run_end(root), Ok(expected));
    }

    #[test]
    fn test_indexed_assignment_through_lvalue() {
        // end { @out[1]["k"] = 5 }
        let target = node(
            NodeType::ArrayOrMapIndexAccess,
            "[]",
            vec![
                node(NodeType::ArrayOrMapIndexAccess, "[]", vec![oosvar("out"), int(1)]),
                leaf(NodeType::StringLiteral, "k"),
            ],
        );
        let root = block(vec![end(vec![assign(target, int(5))])]);
        let inner: Value = vec![("k", Value::Int(5))].into_iter().collect();
        let expected: Value = vec![("1", inner)].into_iter().collect();
        assert_eq!(run_end(root), Ok(expected));
    }

    #[test]
    fn test_triple_for_and_context() {
        // end { for (int i = 0; i < 4; i += 1) { @out .= i } }
        let root = block(vec![end(vec![node(
            NodeType::TripleForLoop,
            "for",
            vec![
                block(vec![node(NodeType::LocalVariableDefinition, "int", vec![local("i"), int(0)])]),
                block(vec![node(
                    NodeType::BareBoolean,
                    "bare boolean",
                    vec![op("<", vec![local("i"), int(4)])],
                )]),
                block(vec![node(NodeType::OperatorAssignment, "+=", vec![local("i"), int(1)])]),
                block(vec![node(
                    NodeType::OperatorAssignment,
                    ".=",
                    vec![oosvar("out"), local("i")],
                )]),
            ],
        )])]);
        assert_eq!(run_end(root), Ok(Value::from("0123")));
    }

    #[test]
    fn test_math_constant_and_slice() {
        let root = block(vec![end(vec![assign(
            oosvar("out"),
            node(
                NodeType::ArraySliceAccess,
                "[:]",
                vec![
                    node(
                        NodeType::ArrayLiteral,
                        "[]",
                        vec![int(1), int(2), leaf(NodeType::Constant, "M_PI")],
                    ),
                    int(2),
                    leaf(NodeType::ArraySliceEmptyUpperIndex, ""),
                ],
            ),
        )])]);
        assert_eq!(
            run_end(root),
            Ok(Value::Array(vec![Value::Int(2), Value::Float(std::f64::consts::PI)]))
        );
    }
}
