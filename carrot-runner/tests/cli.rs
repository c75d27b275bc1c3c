use std::io::Write;
use std::process::{Command, Output, Stdio};

use pretty_assertions::assert_eq;
use tempfile::NamedTempFile;

fn run_script(source: &str, flags: &[&str]) -> Output {
    let mut script = NamedTempFile::new().unwrap();
    script.write_all(source.as_bytes()).unwrap();
    Command::new(env!("CARGO_BIN_EXE_carrot"))
        .args(flags)
        .arg(script.path())
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

#[test]
fn test_runs_script() {
    let source = "\
f(x) -> int:
  return x
end
println(f(5))
println(type(f(5)))";
    let output = run_script(source, &[]);
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "5\nint\n");
    assert_eq!(String::from_utf8_lossy(&output.stderr), "");
}

#[test]
fn test_deep_recursion() {
    let source = "\
down(n) -> int:
  if n == 0:
    return 0
  end
  return down(n - 1) + 1
end
println(down(10000))
forever(n) -> int: return forever(n + 1) end
forever(0)";
    let output = run_script(source, &[]);
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "10000\n");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("\"forever\" exceeded the limit"), "{}", stderr);
}

#[test]
fn test_deeply_nested_expression_is_a_parse_error() {
    let source = format!("x: int = {}1{}", "(".repeat(10_000), ")".repeat(10_000));
    let output = run_script(&source, &[]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("nested more than"), "{}", stderr);
}

#[test]
fn test_closed_stdout_is_reported() {
    let mut script = NamedTempFile::new().unwrap();
    script.write_all(b"iter 100000: println(\"line\") end").unwrap();

    let mut child = Command::new(env!("CARGO_BIN_EXE_carrot"))
        .arg(script.path())
        .env_remove("RUST_LOG")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    drop(child.stdout.take());
    let output = child.wait_with_output().unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to write output"), "{}", stderr);
}

#[test]
fn test_runtime_error_exits_with_failure() {
    let output = run_script("println(\"a\")\nmissing()\nprintln(\"b\")", &[]);
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "a\n");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.starts_with("error: function \"missing\" is undefined"));
}

#[test]
fn test_parse_error_reports_line() {
    let output = run_script("x: int = 1\ny: int = \"two\"", &[]);
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("line 2"));
}

#[test]
fn test_dump_ast() {
    let output = run_script("1 - 2 - 3", &["--dump-ast"]);
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "((1 - 2) - 3);\n");
}

#[test]
fn test_missing_file() {
    let output = Command::new(env!("CARGO_BIN_EXE_carrot"))
        .arg("/nonexistent/script.crt")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr)
        .starts_with("error: could not open '/nonexistent/script.crt'"));
}

#[test]
fn test_missing_path_is_usage_error() {
    let output = Command::new(env!("CARGO_BIN_EXE_carrot")).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
}
