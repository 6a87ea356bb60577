use std::io::Write;

use assert_cmd::cargo;
use rstest::rstest;
use serde_json::{Value, json};
use tempfile::NamedTempFile;

fn leaf(node_type: &str, token: &str) -> Value {
    json!({"type": node_type, "token": token})
}

fn node(node_type: &str, token: &str, children: Vec<Value>) -> Value {
    json!({"type": node_type, "token": token, "children": children})
}

fn block(children: Vec<Value>) -> Value {
    json!({"type": "statement block", "children": children})
}

fn field(name: &str) -> Value {
    leaf("direct field value", name)
}

fn int(i: i64) -> Value {
    leaf("int literal", &i.to_string())
}

fn program(statements: Vec<Value>) -> String {
    block(statements).to_string()
}

fn create_file(suffix: &str, content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write to temp file");
    file
}

#[test]
fn test_cli_pass_through_stdin() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = cargo::cargo_bin_cmd!("mlr");

    let assert = cmd
        .arg("--unbuffered")
        .arg(program(vec![]))
        .write_stdin("a,b\n1,2\n3,4\n")
        .assert();
    assert.success().code(0).stdout("a,b\n1,2\n3,4\n");

    Ok(())
}

#[rstest]
#[case::concat(
    vec![],
    program(vec![node("assignment", "=", vec![
        field("c"),
        node("dot operator", ".", vec![field("a"), field("b")]),
    ])]),
    "a,b\n1,2\n",
    "a,b,c\n1,2,12\n"
)]
#[case::filter(
    vec![],
    program(vec![node("filter statement", "filter", vec![
        node("operator", ">", vec![field("a"), int(1)]),
    ])]),
    "a\n1\n2\n3\n",
    "a\n2\n3\n"
)]
#[case::tsv_out(
    vec!["-F", "tsv"],
    program(vec![]),
    "a,b\n1,2\n",
    "a\tb\n1\t2\n"
)]
#[case::json_out(
    vec!["-F", "json"],
    program(vec![node("assignment", "=", vec![
        field("m"),
        node("map literal", "{}", vec![
            node("map-literal key-value pair", ":", vec![leaf("string literal", "k"), field("a")]),
        ]),
    ])]),
    "a\n1\n",
    "[\n{\n  \"a\": 1,\n  \"m\": {\n    \"k\": 1\n  }\n}\n]\n"
)]
#[case::flattened_csv_out(
    vec![],
    program(vec![node("assignment", "=", vec![
        field("m"),
        node("map literal", "{}", vec![
            node("map-literal key-value pair", ":", vec![leaf("string literal", "k"), field("a")]),
        ]),
    ])]),
    "a\n1\n",
    "a,m.k\n1,1\n"
)]
#[case::head(
    vec!["--head", "2"],
    program(vec![]),
    "a\n1\n2\n3\n4\n",
    "a\n1\n2\n"
)]
#[case::print_in_line(
    vec![],
    program(vec![node("print statement", "print", vec![
        leaf("string literal", "row"),
        leaf("context variable", "NR"),
    ])]),
    "a\n1\n2\n",
    "row 1\na\n1\nrow 2\n2\n"
)]
fn test_cli_programs(
    #[case] args: Vec<&str>,
    #[case] program: String,
    #[case] input: &str,
    #[case] expected_output: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = cargo::cargo_bin_cmd!("mlr");
    let assert = cmd
        .arg("--unbuffered")
        .args(args)
        .arg(program)
        .write_stdin(input)
        .assert();
    assert.success().code(0).stdout(expected_output.to_owned());

    Ok(())
}

#[test]
fn test_cli_null_input_with_presets() -> Result<(), Box<dyn std::error::Error>> {
    // end { @total += 1; emit @* }
    let program = program(vec![node("end block", "end", vec![block(vec![
        node("operator assignment", "+=", vec![leaf("direct oosvar value", "@total"), int(1)]),
        node("emit statement", "emit", vec![leaf("full oosvar", "@*")]),
    ])])]);

    let mut cmd = cargo::cargo_bin_cmd!("mlr");
    let assert = cmd
        .args(["-n", "-s", "total=41", "-s", "name=x"])
        .arg(program)
        .assert();
    assert.success().code(0).stdout("total,name\n42,x\n");

    Ok(())
}

#[test]
fn test_cli_program_and_json_input_from_files() -> Result<(), Box<dyn std::error::Error>> {
    // func double(x) { return x * 2 } $y = double($a)
    let program = create_file(
        ".json",
        &program(vec![
            node("named function definition", "double", vec![
                node("parameter list", "()", vec![leaf("parameter", "x")]),
                block(vec![node("return", "return", vec![
                    node("operator", "*", vec![leaf("local variable", "x"), int(2)]),
                ])]),
            ]),
            node("assignment", "=", vec![
                field("y"),
                node("function callsite", "double", vec![field("a")]),
            ]),
        ]),
    );
    let input = create_file(".json", r#"[{"a": 1}, {"a": 5}]"#);

    let mut cmd = cargo::cargo_bin_cmd!("mlr");
    let assert = cmd
        .arg("-f")
        .arg(program.path())
        .arg(input.path())
        .assert();
    assert.success().code(0).stdout("a,y\n1,2\n5,10\n");

    Ok(())
}

#[test]
fn test_cli_filename_context_across_files() -> Result<(), Box<dyn std::error::Error>> {
    let first = create_file(".csv", "a\n1\n");
    let second = create_file(".csv", "a\n2\n");
    let program = program(vec![node("assignment", "=", vec![
        field("fnr"),
        leaf("context variable", "FNR"),
    ]), node("assignment", "=", vec![
        field("filenum"),
        leaf("context variable", "FILENUM"),
    ])]);

    let mut cmd = cargo::cargo_bin_cmd!("mlr");
    let assert = cmd
        .arg(program)
        .arg(first.path())
        .arg(second.path())
        .assert();
    assert
        .success()
        .code(0)
        .stdout("a,fnr,filenum\n1,1,1\n2,1,2\n");

    Ok(())
}

#[test]
fn test_cli_deep_recursion_reaches_result() -> Result<(), Box<dyn std::error::Error>> {
    // func countdown(n) { if (n <= 0) { return 0 } return 1 + countdown(n - 1) } $y = countdown($x)
    let n = || leaf("local variable", "n");
    let program = program(vec![
        node("named function definition", "countdown", vec![
            node("parameter list", "()", vec![leaf("parameter", "n")]),
            block(vec![
                node("if chain", "if", vec![node("if item", "if", vec![
                    node("operator", "<=", vec![n(), int(0)]),
                    block(vec![node("return", "return", vec![int(0)])]),
                ])]),
                node("return", "return", vec![node("operator", "+", vec![
                    int(1),
                    node("function callsite", "countdown", vec![
                        node("operator", "-", vec![n(), int(1)]),
                    ]),
                ])]),
            ]),
        ]),
        node("assignment", "=", vec![
            field("y"),
            node("function callsite", "countdown", vec![field("x")]),
        ]),
    ]);

    let mut cmd = cargo::cargo_bin_cmd!("mlr");
    let assert = cmd.arg(program).write_stdin("x\n1000\n").assert();
    assert.success().code(0).stdout("x,y\n1000,1000\n");

    Ok(())
}

#[rstest]
#[case::runtime_error(
    program(vec![node("filter statement", "filter", vec![field("a")])]),
    "condition must evaluate to boolean"
)]
#[case::unknown_function(
    program(vec![node("assignment", "=", vec![
        field("b"),
        node("function callsite", "nosuchfunc", vec![field("a")]),
    ])]),
    "nosuchfunc"
)]
#[case::break_outside_loop(
    program(vec![json!({"type": "break", "token": "break", "children": []})]),
    "break"
)]
#[case::malformed_json("{\"type\": ".to_string(), "EOF")]
fn test_cli_errors(
    #[case] program: String,
    #[case] expected_message: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = cargo::cargo_bin_cmd!("mlr");
    let assert = cmd.arg(program).write_stdin("a\n1\n").assert().failure();

    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).to_string();
    assert!(
        stderr.contains(expected_message),
        "stderr did not mention {expected_message:?}: {stderr}"
    );

    Ok(())
}

#[test]
fn test_cli_missing_input_file() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = cargo::cargo_bin_cmd!("mlr");
    let assert = cmd
        .arg(program(vec![]))
        .arg("/no/such/input.csv")
        .assert()
        .failure();

    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).to_string();
    assert!(stderr.contains("/no/such/input.csv"));

    Ok(())
}
