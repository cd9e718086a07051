//! Built-in sample programs for `tlc demo`

use tlc_common::CompilerError;
use tlc_frontend::{Frontend, Program};

/// `func main() -> i32 is var x : i32 := 10; return x; end`
const RETURN_LOCAL: &str = r#"{
  "functions": [
    {
      "name": "main", "return_type": "i32", "line": 1,
      "body": [
        { "line": 1, "stmt": "var_decl", "name": "x", "ty": "i32", "init": { "expr": "int", "value": 10 } },
        { "line": 1, "stmt": "return", "value": { "expr": "ident", "name": "x" } }
      ]
    }
  ]
}"#;

/// Counts `x` up to 5 in a while loop and returns it
const COUNT: &str = r#"{
  "functions": [
    {
      "name": "main", "return_type": "i32", "line": 1,
      "body": [
        { "line": 2, "stmt": "var_decl", "name": "x", "ty": "i32", "init": { "expr": "int", "value": 0 } },
        {
          "line": 3, "stmt": "while",
          "condition": { "expr": "binary", "op": "lt", "lhs": { "expr": "ident", "name": "x" }, "rhs": { "expr": "int", "value": 5 } },
          "body": [
            {
              "line": 4, "stmt": "assign", "name": "x",
              "value": { "expr": "binary", "op": "add", "lhs": { "expr": "ident", "name": "x" }, "rhs": { "expr": "int", "value": 1 } }
            }
          ]
        },
        { "line": 6, "stmt": "return", "value": { "expr": "ident", "name": "x" } }
      ]
    }
  ]
}"#;

/// Prints the square of 7 through the C library
const HELLO: &str = r#"{
  "externs": [
    { "name": "printf", "params": ["string"], "return_type": "i32", "variadic": true }
  ],
  "functions": [
    {
      "name": "square", "params": [ { "name": "n", "ty": "i32" } ], "return_type": "i32", "local": true,
      "body": [
        { "stmt": "return", "value": { "expr": "binary", "op": "mul", "lhs": { "expr": "ident", "name": "n" }, "rhs": { "expr": "ident", "name": "n" } } }
      ]
    },
    {
      "name": "main", "return_type": "i32",
      "body": [
        {
          "stmt": "call", "name": "printf",
          "args": [
            { "expr": "str", "value": "7 squared is %d\n" },
            { "expr": "call", "name": "square", "args": [ { "expr": "int", "value": 7 } ] }
          ]
        },
        { "stmt": "return", "value": { "expr": "int", "value": 0 } }
      ]
    }
  ]
}"#;

pub const DEMO_NAMES: [&str; 3] = ["return", "count", "hello"];

pub fn demo(name: &str) -> Result<Program, CompilerError> {
    let source = match name {
        "return" => RETURN_LOCAL,
        "count" => COUNT,
        "hello" => HELLO,
        other => {
            return Err(CompilerError::InvalidInput {
                message: format!("unknown demo '{}' (available: {})", other, DEMO_NAMES.join(", ")),
            })
        }
    };
    Frontend::parse_json(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tlc_backend::{emit_module, EmitOptions};
    use tlc_ir::transform_module;

    #[test]
    fn test_every_demo_compiles() {
        for name in DEMO_NAMES {
            let program = demo(name).unwrap();
            let mut module = Frontend::lower(&program, name).unwrap();
            transform_module(&mut module).unwrap();
            let asm = emit_module(&module, &EmitOptions::default()).unwrap();
            assert!(asm.contains("main:"), "demo {} has no main", name);
        }
    }

    #[test]
    fn test_unknown_demo() {
        assert!(matches!(demo("nope"), Err(CompilerError::InvalidInput { .. })));
    }
}
