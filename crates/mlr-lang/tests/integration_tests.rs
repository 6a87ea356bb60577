use mlr_lang::{
    AstNode, Context, Engine, InnerError, KeyError, NodeType, Options, Output, Record,
    RuntimeError, ScopeError, Value,
};
use rstest::{fixture, rstest};

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

fn string(s: &str) -> AstNode {
    leaf(NodeType::StringLiteral, s)
}

fn local(name: &str) -> AstNode {
    leaf(NodeType::LocalVariable, name)
}

fn field(name: &str) -> AstNode {
    leaf(NodeType::DirectFieldValue, name)
}

fn out() -> AstNode {
    leaf(NodeType::DirectOosvarValue, "out")
}

fn assign(lvalue: AstNode, rvalue: AstNode) -> AstNode {
    node(NodeType::Assignment, "=", vec![lvalue, rvalue])
}

fn declare(type_name: &str, name: &str, rvalue: AstNode) -> AstNode {
    node(NodeType::LocalVariableDefinition, type_name, vec![local(name), rvalue])
}

fn if_true(body: Vec<AstNode>) -> AstNode {
    node(
        NodeType::IfChain,
        "if",
        vec![node(
            NodeType::IfItem,
            "if",
            vec![leaf(NodeType::BooleanLiteral, "true"), block(body)],
        )],
    )
}

fn indirect_field(key: AstNode) -> AstNode {
    node(NodeType::IndirectFieldValue, "$[", vec![key])
}

#[fixture]
fn abc() -> Record {
    vec![
        ("a", Value::Int(1)),
        ("b", Value::Int(2)),
        ("c", Value::Int(3)),
    ]
    .into_iter()
    .collect()
}

/// Runs `statements` as the main block against one record and returns
/// `@out`, or the runtime error that stopped it.
fn run_main(statements: Vec<AstNode>, record: Record) -> Result<Value, RuntimeError> {
    let mut engine = Engine::from_ast(&block(statements), Options::default()).unwrap();
    let mut context = Context::new();
    context.update_for_start_of_file("test.csv");
    context.update_for_input_record();

    engine
        .execute(record, &context)
        .map(|_| engine.oosvars().get("out").cloned().unwrap_or_default())
        .map_err(|err| match err.cause {
            InnerError::Runtime(err) => err,
            InnerError::Compile(err) => panic!("unexpected compile error: {err}"),
        })
}

#[rstest]
fn test_plain_assignment_in_nested_block_updates_outer(abc: Record) {
    // a = 1; if (true) { a = 2 } @out = a
    let result = run_main(
        vec![
            assign(local("a"), int(1)),
            if_true(vec![assign(local("a"), int(2))]),
            assign(out(), local("a")),
        ],
        abc,
    );
    assert_eq!(result, Ok(Value::Int(2)));
}

#[rstest]
fn test_declaration_in_nested_block_shadows(abc: Record) {
    // a = 1; if (true) { var a = 2 } @out = a
    let result = run_main(
        vec![
            assign(local("a"), int(1)),
            if_true(vec![declare("var", "a", int(2))]),
            assign(out(), local("a")),
        ],
        abc,
    );
    assert_eq!(result, Ok(Value::Int(1)));
}

#[rstest]
#[case::same_type("var", "var")]
#[case::different_type("int", "str")]
fn test_redeclaration_rejected(abc: Record, #[case] first: &str, #[case] second: &str) {
    let result = run_main(
        vec![declare(first, "x", int(1)), declare(second, "x", string("s"))],
        abc,
    );
    assert!(matches!(
        result,
        Err(RuntimeError::Scope(ScopeError::Redeclared(_)))
    ));
}

#[rstest]
fn test_type_gate_rejects_incompatible_assignment(abc: Record) {
    let result = run_main(
        vec![declare("int", "i", int(1)), assign(local("i"), string("abc"))],
        abc,
    );
    assert!(matches!(
        result,
        Err(RuntimeError::Scope(ScopeError::TypeGate { got: "string", .. }))
    ));
}

#[rstest]
fn test_untyped_declaration_accepts_anything(abc: Record) {
    let result = run_main(
        vec![
            declare("var", "v", int(1)),
            assign(local("v"), string("now a string")),
            assign(out(), local("v")),
        ],
        abc,
    );
    assert_eq!(result, Ok(Value::from("now a string")));
}

#[rstest]
#[case::by_position(int(2), Value::Int(2))]
#[case::past_end(int(7), Value::Absent)]
#[case::by_name(string("b"), Value::Int(2))]
#[case::absent_key(field("nosuch"), Value::Absent)]
fn test_indirect_field_value(abc: Record, #[case] key: AstNode, #[case] expected: Value) {
    let result = run_main(
        vec![assign(
            out(),
            node(
                NodeType::FunctionCallsite,
                "typeof",
                vec![indirect_field(key)],
            ),
        )],
        abc,
    );
    assert_eq!(result, Ok(Value::from(expected.type_name())));
}

#[rstest]
fn test_indirect_field_value_reads(abc: Record) {
    let result = run_main(vec![assign(out(), indirect_field(int(3)))], abc);
    assert_eq!(result, Ok(Value::Int(3)));
}

#[rstest]
fn test_indirect_field_bad_key_type_is_error(abc: Record) {
    let result = run_main(
        vec![assign(
            out(),
            indirect_field(leaf(NodeType::FloatLiteral, "1.5")),
        )],
        abc,
    );
    assert_eq!(result, Err(RuntimeError::KeyType(KeyError::KeyType("float"))));
}

#[rstest]
fn test_indexed_assignment_autovivifies(abc: Record) {
    // x[1]["k"] = 5; @out = x
    let target = node(
        NodeType::ArrayOrMapIndexAccess,
        "[]",
        vec![
            node(NodeType::ArrayOrMapIndexAccess, "[]", vec![local("x"), int(1)]),
            string("k"),
        ],
    );
    let literal = node(
        NodeType::MapLiteral,
        "{}",
        vec![node(
            NodeType::MapLiteralKeyValuePair,
            ":",
            vec![
                int(1),
                node(
                    NodeType::MapLiteral,
                    "{}",
                    vec![node(
                        NodeType::MapLiteralKeyValuePair,
                        ":",
                        vec![string("k"), int(5)],
                    )],
                ),
            ],
        )],
    );
    let result = run_main(
        vec![
            assign(target, int(5)),
            assign(
                out(),
                node(NodeType::Operator, "==", vec![local("x"), literal]),
            ),
        ],
        abc,
    );
    assert_eq!(result, Ok(Value::TRUE));
}

#[rstest]
fn test_indexed_assignment_bad_leading_index(abc: Record) {
    let target = node(
        NodeType::ArrayOrMapIndexAccess,
        "[]",
        vec![local("x"), leaf(NodeType::BooleanLiteral, "true")],
    );
    let result = run_main(vec![assign(target, int(5))], abc);
    assert!(matches!(
        result,
        Err(RuntimeError::Scope(ScopeError::LeadingIndexType { got: "boolean", .. }))
    ));
}

#[rstest]
fn test_unset_is_idempotent(abc: Record) {
    let unset = || node(NodeType::Unset, "unset", vec![local("nosuch")]);
    let result = run_main(vec![unset(), unset(), assign(out(), int(1))], abc);
    assert_eq!(result, Ok(Value::Int(1)));
}

#[rstest]
fn test_locals_do_not_survive_records(abc: Record) {
    // @out = n ?? "fresh"; n = 1
    let program = block(vec![
        assign(
            out(),
            node(NodeType::Operator, "??", vec![local("n"), string("fresh")]),
        ),
        assign(local("n"), int(1)),
    ]);
    let mut engine = Engine::from_ast(&program, Options::default()).unwrap();
    let mut context = Context::new();
    for _ in 0..2 {
        context.update_for_input_record();
        engine.execute(abc.clone(), &context).unwrap();
        assert_eq!(engine.oosvars().get("out"), Some(&Value::from("fresh")));
    }
}

#[rstest]
fn test_field_assignment_and_context_variables(abc: Record) {
    // $nr = NR; $file = FILENAME; $[[1]] = "A"; unset $c
    let program = block(vec![
        assign(field("nr"), leaf(NodeType::ContextVariable, "NR")),
        assign(field("file"), leaf(NodeType::ContextVariable, "FILENAME")),
        assign(
            node(NodeType::PositionalFieldName, "$[[", vec![int(1)]),
            string("A"),
        ),
        node(NodeType::Unset, "unset", vec![field("c")]),
    ]);
    let mut engine = Engine::from_ast(&program, Options::default()).unwrap();
    let mut context = Context::new();
    context.update_for_start_of_file("in.csv");
    context.update_for_input_record();

    let processed = engine.execute(abc, &context).unwrap();
    let expected: Record = vec![
        ("A", Value::Int(1)),
        ("b", Value::Int(2)),
        ("nr", Value::Int(1)),
        ("file", Value::from("in.csv")),
    ]
    .into_iter()
    .collect();
    assert_eq!(processed.record, Some(expected));
}

#[rstest]
fn test_pattern_action_and_emit(abc: Record) {
    // $b > 1 { emit {"seen": $b} }
    let program = block(vec![node(
        NodeType::PatternActionBlock,
        "cond",
        vec![
            node(NodeType::Operator, ">", vec![field("b"), int(1)]),
            block(vec![node(
                NodeType::Emit,
                "emit",
                vec![node(
                    NodeType::MapLiteral,
                    "{}",
                    vec![node(
                        NodeType::MapLiteralKeyValuePair,
                        ":",
                        vec![string("seen"), field("b")],
                    )],
                )],
            )]),
        ],
    )]);
    let mut engine = Engine::from_ast(&program, Options::default()).unwrap();
    let processed = engine.execute(abc, &Context::new()).unwrap();
    assert_eq!(
        processed.outputs,
        vec![Output::Record(
            vec![("seen", Value::Int(2))].into_iter().collect()
        )]
    );
}
