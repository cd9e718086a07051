//! Lowering of JSON-serialized programs through the public frontend API

use pretty_assertions::assert_eq;
use tlc_common::CompilerError;
use tlc_frontend::Frontend;
use tlc_ir::{transform_module, Opcode, Operand};

const RETURN_LOCAL: &str = r#"{
  "functions": [
    {
      "name": "main",
      "return_type": "i32",
      "line": 1,
      "body": [
        { "line": 1, "stmt": "var_decl", "name": "x", "ty": "i32", "init": { "expr": "int", "value": 10 } },
        { "line": 1, "stmt": "return", "value": { "expr": "ident", "name": "x" } }
      ]
    }
  ]
}"#;

const COUNT_TO_FIVE: &str = r#"{
  "functions": [
    {
      "name": "main",
      "return_type": "i32",
      "body": [
        { "stmt": "var_decl", "name": "x", "ty": "i32", "init": { "expr": "int", "value": 0 } },
        {
          "stmt": "while",
          "condition": { "expr": "binary", "op": "lt", "lhs": { "expr": "ident", "name": "x" }, "rhs": { "expr": "int", "value": 5 } },
          "body": [
            {
              "stmt": "assign",
              "name": "x",
              "value": { "expr": "binary", "op": "add", "lhs": { "expr": "ident", "name": "x" }, "rhs": { "expr": "int", "value": 1 } }
            }
          ]
        },
        { "stmt": "return", "value": { "expr": "ident", "name": "x" } }
      ]
    }
  ]
}"#;

#[test]
fn test_return_local_lowers_to_four_instructions() {
    let program = Frontend::parse_json(RETURN_LOCAL).unwrap();
    let module = Frontend::lower(&program, "demo").unwrap();
    let main = module.get_function("main").unwrap();

    assert_eq!(main.blocks.len(), 1);
    let insts = &main.blocks[0].instructions;
    let ops: Vec<Opcode> = insts.iter().map(|i| i.opcode).collect();
    assert_eq!(ops, vec![Opcode::Alloca, Opcode::Store, Opcode::Load, Opcode::Ret]);
    assert_eq!(insts[1].operand(0), Some(&Operand::Imm(10)));
    assert_eq!(insts[3].operand(0), insts[2].dest.as_ref());
}

#[test]
fn test_while_produces_three_blocks() {
    let program = Frontend::parse_json(COUNT_TO_FIVE).unwrap();
    let mut module = Frontend::lower(&program, "demo").unwrap();
    let main = module.get_function("main").unwrap();

    let names: Vec<&str> = main.blocks.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(names, vec!["entry", "loop_body0", "loop_cmp0", "loop_end0"]);

    let cmp = &main.block_by_name("loop_cmp0").unwrap().instructions;
    let fused = &cmp[cmp.len() - 2];
    assert_eq!(fused.opcode, Opcode::Blt);
    assert_eq!(fused.operand(2), Some(&Operand::label("loop_body0")));
    assert_eq!(cmp[cmp.len() - 1].operand(0), Some(&Operand::label("loop_end0")));

    transform_module(&mut module).unwrap();
    assert_eq!(module.get_function("main").unwrap().stack_size, 4);
}

#[test]
fn test_malformed_json_is_invalid_input() {
    let err = Frontend::parse_json(r#"{ "functions": [ { "name": 3 } ] }"#).unwrap_err();
    assert!(matches!(err, CompilerError::InvalidInput { .. }));
}

#[test]
fn test_records_and_pointers_from_json() {
    let source = r#"{
      "records": [
        { "name": "Pair", "fields": [
          { "name": "a", "ty": "i64", "default": { "expr": "int", "value": 7 } },
          { "name": "b", "ty": "u8" }
        ] }
      ],
      "externs": [
        { "name": "puts", "params": ["string"], "return_type": "i32" }
      ],
      "functions": [
        {
          "name": "first",
          "params": [ { "name": "p", "ty": { "ptr": "i16" } } ],
          "return_type": "i16",
          "local": true,
          "body": [
            { "stmt": "return", "value": { "expr": "index", "name": "p", "index": { "expr": "int", "value": 0 } } }
          ]
        },
        {
          "name": "main",
          "return_type": "void",
          "body": [
            { "stmt": "record_decl", "name": "q", "record": "Pair" },
            { "stmt": "field_assign", "name": "q", "field": "b", "value": { "expr": "char", "value": 65 } },
            { "stmt": "call", "name": "puts", "args": [ { "expr": "str", "value": "done" } ] }
          ]
        }
      ]
    }"#;
    let program = Frontend::parse_json(source).unwrap();
    let module = Frontend::lower(&program, "records").unwrap();

    let first = module.get_function("first").unwrap();
    assert_eq!(first.linkage, tlc_ir::Linkage::Local);
    assert_eq!(first.to_string().lines().next(), Some("local i16 first(%0:*i16) {"));

    let main = module.get_function("main").unwrap();
    let ops: Vec<Opcode> = main.blocks[0].instructions.iter().map(|i| i.opcode).collect();
    assert_eq!(
        ops,
        vec![
            Opcode::Alloca,
            Opcode::StructStore,
            Opcode::StructStore,
            Opcode::Call,
            Opcode::RetVoid
        ]
    );
    assert_eq!(module.strings[0].value, "done");
}
