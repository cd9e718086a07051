//! Unit tests for AST lowering

use super::*;
use crate::ast::{
    AstType, BinaryOp, ElifClause, Expression, ExternDecl, FunctionDecl, Param, Program, RecordDecl, RecordField,
    Statement, StatementKind,
};
use pretty_assertions::assert_eq;
use std::collections::{HashMap, HashSet};
use tlc_common::CompilerError;
use tlc_ir::{transform_module, Function, IrBuilder, IrType, Linkage, Module, Opcode, Operand};

fn stmt(kind: StatementKind) -> Statement {
    Statement::new(1, kind)
}

fn var(name: &str, ty: AstType, init: Option<Expression>) -> Statement {
    stmt(StatementKind::VarDecl {
        name: name.to_string(),
        ty,
        init,
    })
}

fn assign(name: &str, value: Expression) -> Statement {
    stmt(StatementKind::Assign {
        name: name.to_string(),
        value,
    })
}

fn ret(value: Option<Expression>) -> Statement {
    stmt(StatementKind::Return { value })
}

fn function(name: &str, params: Vec<(&str, AstType)>, return_type: AstType, body: Vec<Statement>) -> FunctionDecl {
    FunctionDecl {
        name: name.to_string(),
        params: params
            .into_iter()
            .map(|(name, ty)| Param {
                name: name.to_string(),
                ty,
            })
            .collect(),
        return_type,
        body,
        local: false,
        line: 1,
    }
}

fn main_with(body: Vec<Statement>) -> Program {
    Program {
        functions: vec![function("main", vec![], AstType::I32, body)],
        ..Program::default()
    }
}

fn lower(program: &Program) -> Module {
    CodeGenerator::new("test").generate(program).unwrap()
}

fn lower_err(program: &Program) -> String {
    match CodeGenerator::new("test").generate(program) {
        Err(CompilerError::Lowering { message, .. }) => message,
        other => panic!("expected a lowering error, got {:?}", other),
    }
}

fn block_names(function: &Function) -> Vec<&str> {
    function.blocks.iter().map(|b| b.name.as_str()).collect()
}

fn opcodes(function: &Function, block: &str) -> Vec<Opcode> {
    function
        .block_by_name(block)
        .unwrap()
        .instructions
        .iter()
        .map(|i| i.opcode)
        .collect()
}

/// Unique block names and exactly one terminator per block, at its end
fn assert_well_formed(function: &Function) {
    let mut names = HashSet::new();
    for block in &function.blocks {
        assert!(names.insert(block.name.clone()), "duplicate block {}", block.name);
        assert!(block.has_terminator(), "block {} is not terminated", block.name);
        let terminators = block.instructions.iter().filter(|i| i.is_terminator()).count();
        assert_eq!(terminators, 1, "block {} has {} terminators", block.name, terminators);
    }
}

fn x_lt(value: i64) -> Expression {
    Expression::binary(BinaryOp::Lt, Expression::ident("x"), Expression::int(value))
}

#[test]
fn test_return_local_variable() {
    let program = main_with(vec![
        var("x", AstType::I32, Some(Expression::int(10))),
        ret(Some(Expression::ident("x"))),
    ]);
    let module = lower(&program);

    let expected = "\
global i32 main() {
entry:
  %0 = alloca i32;
  store i32 10, %0;
  %1 = load i32 %0;
  ret i32 %1;
}
";
    assert_eq!(module.get_function("main").unwrap().to_string(), expected);
}

#[test]
fn test_while_loop_blocks() {
    let program = main_with(vec![
        var("x", AstType::I32, Some(Expression::int(0))),
        stmt(StatementKind::While {
            condition: x_lt(5),
            body: vec![assign(
                "x",
                Expression::binary(BinaryOp::Add, Expression::ident("x"), Expression::int(1)),
            )],
        }),
        ret(Some(Expression::ident("x"))),
    ]);
    let module = lower(&program);
    let main = module.get_function("main").unwrap();

    let expected = "\
global i32 main() {
entry:
  %0 = alloca i32;
  store i32 0, %0;
  br loop_cmp0;
loop_body0:
  %2 = load i32 %0;
  %3 = add i32 %2, 1;
  store i32 %3, %0;
  br loop_cmp0;
loop_cmp0:
  %1 = load i32 %0;
  blt i32 %1, 5, loop_body0;
  br loop_end0;
loop_end0:
  %4 = load i32 %0;
  ret i32 %4;
}
";
    assert_eq!(main.to_string(), expected);
    assert_well_formed(main);
}

#[test]
fn test_if_elif_else_layout() {
    let x_eq = |v| Expression::binary(BinaryOp::Eq, Expression::ident("x"), Expression::int(v));
    let program = main_with(vec![
        var("x", AstType::I32, Some(Expression::int(2))),
        stmt(StatementKind::If {
            condition: x_eq(1),
            body: vec![ret(Some(Expression::int(10)))],
            elifs: vec![ElifClause {
                condition: x_eq(2),
                body: vec![assign("x", Expression::int(20))],
            }],
            else_body: Some(vec![ret(Some(Expression::int(30)))]),
        }),
        ret(Some(Expression::ident("x"))),
    ]);
    let module = lower(&program);
    let main = module.get_function("main").unwrap();

    assert_eq!(block_names(main), vec!["entry", "true0", "false0", "1true0", "1false0", "end0"]);
    assert_well_formed(main);
    assert_eq!(opcodes(main, "entry")[3..].to_vec(), vec![Opcode::Beq, Opcode::Br]);
    assert_eq!(opcodes(main, "false0")[1..].to_vec(), vec![Opcode::Beq, Opcode::Br]);
    assert_eq!(opcodes(main, "true0"), vec![Opcode::Ret]);
    assert_eq!(opcodes(main, "1true0"), vec![Opcode::Store, Opcode::Br]);
    assert_eq!(opcodes(main, "1false0"), vec![Opcode::Ret]);

    let end_label = Operand::label("end0");
    let branch = main.block_by_name("1true0").unwrap().terminator().unwrap();
    assert_eq!(branch.operand(0), Some(&end_label));
}

#[test]
fn test_last_elif_without_else_falls_to_end() {
    let program = main_with(vec![
        var("x", AstType::I32, None),
        stmt(StatementKind::If {
            condition: x_lt(0),
            body: vec![assign("x", Expression::int(0))],
            elifs: vec![
                ElifClause {
                    condition: x_lt(10),
                    body: vec![assign("x", Expression::int(10))],
                },
                ElifClause {
                    condition: x_lt(20),
                    body: vec![assign("x", Expression::int(20))],
                },
            ],
            else_body: None,
        }),
        ret(Some(Expression::ident("x"))),
    ]);
    let module = lower(&program);
    let main = module.get_function("main").unwrap();

    assert_eq!(
        block_names(main),
        vec!["entry", "true0", "false0", "1true0", "1false0", "2true0", "end0"]
    );
    assert_well_formed(main);
    let test = &main.block_by_name("1false0").unwrap().instructions;
    assert_eq!(test[test.len() - 1].operand(0), Some(&Operand::label("end0")));
}

#[test]
fn test_if_without_alternatives_has_no_false_block() {
    let program = main_with(vec![
        var("x", AstType::I32, None),
        stmt(StatementKind::If {
            condition: x_lt(3),
            body: vec![assign("x", Expression::int(3))],
            elifs: vec![],
            else_body: None,
        }),
    ]);
    let module = lower(&program);
    let main = module.get_function("main").unwrap();

    assert_eq!(block_names(main), vec!["entry", "true0", "end0"]);
    assert_well_formed(main);
    // implicit return in the end block of a non-void function
    let last = main.block_by_name("end0").unwrap().terminator().unwrap();
    assert_eq!(last.opcode, Opcode::Ret);
    assert_eq!(last.operand(0), Some(&Operand::Imm(0)));
}

#[test]
fn test_short_circuit_and_or() {
    let cond = Expression::binary(
        BinaryOp::Or,
        Expression::binary(BinaryOp::And, x_lt(5), Expression::binary(BinaryOp::Gt, Expression::ident("x"), Expression::int(0))),
        Expression::binary(BinaryOp::Eq, Expression::ident("x"), Expression::int(100)),
    );
    let program = main_with(vec![
        var("x", AstType::I32, Some(Expression::int(1))),
        stmt(StatementKind::If {
            condition: cond,
            body: vec![ret(Some(Expression::int(1)))],
            elifs: vec![],
            else_body: None,
        }),
        ret(Some(Expression::int(0))),
    ]);
    let module = lower(&program);
    let main = module.get_function("main").unwrap();

    assert_eq!(block_names(main), vec!["entry", "and_rhs2", "or_rhs1", "true0", "end0"]);
    assert_well_formed(main);
    // the left conjunct skips to the right disjunct when false
    let entry = &main.block_by_name("entry").unwrap().instructions;
    assert_eq!(entry[entry.len() - 2].operand(2), Some(&Operand::label("and_rhs2")));
    assert_eq!(entry[entry.len() - 1].operand(0), Some(&Operand::label("or_rhs1")));
}

#[test]
fn test_constant_condition_folds_to_jump() {
    let program = main_with(vec![
        stmt(StatementKind::While {
            condition: Expression::Bool { value: true },
            body: vec![stmt(StatementKind::Break)],
        }),
        stmt(StatementKind::If {
            condition: Expression::binary(BinaryOp::Lt, Expression::int(1), Expression::int(2)),
            body: vec![ret(Some(Expression::int(7)))],
            elifs: vec![],
            else_body: None,
        }),
    ]);
    let module = lower(&program);
    let main = module.get_function("main").unwrap();

    assert_eq!(opcodes(main, "loop_cmp0"), vec![Opcode::Br]);
    let cmp = main.block_by_name("loop_cmp0").unwrap().terminator().unwrap();
    assert_eq!(cmp.operand(0), Some(&Operand::label("loop_body0")));
    let branch = main.block_by_name("loop_end0").unwrap().terminator().unwrap();
    assert_eq!(branch.operand(0), Some(&Operand::label("true1")));
    assert_well_formed(main);
}

#[test]
fn test_comparison_as_value_is_materialized() {
    let program = main_with(vec![
        var("x", AstType::I32, Some(Expression::int(4))),
        var("b", AstType::I32, Some(x_lt(3))),
        ret(Some(Expression::ident("b"))),
    ]);
    let module = lower(&program);
    let main = module.get_function("main").unwrap();

    assert_eq!(block_names(main), vec!["entry", "set_true0", "set_false0", "set_end0"]);
    assert_eq!(opcodes(main, "set_true0"), vec![Opcode::Store, Opcode::Br]);
    assert_eq!(opcodes(main, "set_false0"), vec![Opcode::Store, Opcode::Br]);
    assert_eq!(
        opcodes(main, "set_end0"),
        vec![Opcode::Load, Opcode::Alloca, Opcode::Store, Opcode::Load, Opcode::Ret]
    );
    assert_well_formed(main);
}

#[test]
fn test_operand_spilled_across_call() {
    let program = Program {
        functions: vec![
            function("f", vec![("a", AstType::I32)], AstType::I32, vec![ret(Some(Expression::ident("a")))]),
            function(
                "main",
                vec![],
                AstType::I32,
                vec![
                    var("x", AstType::I32, Some(Expression::int(5))),
                    ret(Some(Expression::binary(
                        BinaryOp::Add,
                        Expression::ident("x"),
                        Expression::call("f", vec![Expression::int(1)]),
                    ))),
                ],
            ),
        ],
        ..Program::default()
    };
    let mut module = lower(&program);

    assert_eq!(
        opcodes(module.get_function("main").unwrap(), "entry"),
        vec![
            Opcode::Alloca,
            Opcode::Store,
            Opcode::Load,
            Opcode::Alloca,
            Opcode::Store,
            Opcode::Call,
            Opcode::Alloca,
            Opcode::Store,
            Opcode::Load,
            Opcode::Load,
            Opcode::Add,
            Opcode::Ret,
        ]
    );

    transform_module(&mut module).unwrap();
    let entry = &module.get_function("main").unwrap().blocks[0].instructions;
    let add = &entry[10];
    assert_eq!(add.operand(0), Some(&Operand::HReg(1)));
    assert_eq!(add.operand(1), Some(&Operand::HReg(0)));
}

#[test]
fn test_parameters_are_stored_to_cells() {
    let program = Program {
        functions: vec![function(
            "id",
            vec![("a", AstType::I64), ("c", AstType::Char)],
            AstType::I64,
            vec![ret(Some(Expression::ident("a")))],
        )],
        ..Program::default()
    };
    let module = lower(&program);
    let f = module.get_function("id").unwrap();

    assert_eq!(f.param_types().cloned().collect::<Vec<_>>(), vec![IrType::I64, IrType::I8]);
    let entry = &f.blocks[0].instructions;
    assert_eq!(entry[0].opcode, Opcode::Alloca);
    assert_eq!(entry[1].operands[0], Some(Operand::Reg(0)));
    assert_eq!(entry[3].operands[0], Some(Operand::Reg(1)));
    assert_eq!(entry[3].ty, IrType::I8);
}

#[test]
fn test_records_fields_and_parameters() {
    let point = RecordDecl {
        name: "Point".to_string(),
        fields: vec![
            RecordField {
                name: "x".to_string(),
                ty: AstType::I32,
                default: Some(Expression::int(1)),
            },
            RecordField {
                name: "y".to_string(),
                ty: AstType::I8,
                default: None,
            },
        ],
    };
    let program = Program {
        records: vec![point],
        externs: vec![],
        functions: vec![
            function(
                "getx",
                vec![("p", AstType::Struct("Point".to_string()))],
                AstType::I32,
                vec![ret(Some(Expression::Field {
                    name: "p".to_string(),
                    field: "x".to_string(),
                }))],
            ),
            function(
                "main",
                vec![],
                AstType::I32,
                vec![
                    stmt(StatementKind::RecordDecl {
                        name: "p".to_string(),
                        record: "Point".to_string(),
                        no_init: false,
                    }),
                    stmt(StatementKind::FieldAssign {
                        name: "p".to_string(),
                        field: "y".to_string(),
                        value: Expression::int(2),
                    }),
                    ret(Some(Expression::call("getx", vec![Expression::ident("p")]))),
                ],
            ),
        ],
    };
    let module = lower(&program);

    let getx = module.get_function("getx").unwrap();
    assert_eq!(
        getx.to_string(),
        "global i32 getx(%0:*Point{i32, i8}) {\nentry:\n  %1 = load.struct Point{i32, i8} %0, 0;\n  ret i32 %1;\n}\n"
    );

    let main = module.get_function("main").unwrap();
    let entry = &main.blocks[0].instructions;
    assert_eq!(entry[0].opcode, Opcode::Alloca);
    assert_eq!(entry[1].opcode, Opcode::StructStore);
    assert_eq!(entry[1].operands[1], Some(Operand::Imm(0)));
    assert_eq!(entry[2].operands[1], Some(Operand::Imm(1)));
    assert_eq!(entry[3].call.as_ref().unwrap().args, vec![Operand::Reg(0)]);
}

#[test]
fn test_externs_strings_and_variadic_calls() {
    let program = Program {
        records: vec![],
        externs: vec![ExternDecl {
            name: "printf".to_string(),
            params: vec![AstType::String],
            return_type: AstType::I32,
            variadic: true,
        }],
        functions: vec![function(
            "main",
            vec![],
            AstType::Void,
            vec![
                stmt(StatementKind::Call {
                    name: "printf".to_string(),
                    args: vec![Expression::string("%d\n"), Expression::int(42)],
                }),
                stmt(StatementKind::Call {
                    name: "printf".to_string(),
                    args: vec![Expression::string("%d\n"), Expression::int(43)],
                }),
            ],
        )],
    };
    let module = lower(&program);

    assert_eq!(module.strings.len(), 1);
    let printf = module.get_function("printf").unwrap();
    assert!(printf.is_extern());
    assert!(printf.variadic);

    let main = module.get_function("main").unwrap();
    assert_eq!(opcodes(main, "entry"), vec![Opcode::Call, Opcode::Call, Opcode::RetVoid]);
    let call = main.blocks[0].instructions[0].call.as_ref().unwrap();
    assert_eq!(call.args[1], Operand::Imm(42));
}

#[test]
fn test_unsigned_arithmetic_and_indexing() {
    let program = Program {
        functions: vec![function(
            "f",
            vec![("s", AstType::String), ("u", AstType::U32)],
            AstType::Char,
            vec![
                assign(
                    "u",
                    Expression::binary(BinaryOp::Div, Expression::ident("u"), Expression::int(3)),
                ),
                stmt(StatementKind::IndexAssign {
                    name: "s".to_string(),
                    index: Expression::int(0),
                    value: Expression::Char { value: b'a' },
                }),
                ret(Some(Expression::Index {
                    name: "s".to_string(),
                    index: Box::new(Expression::int(1)),
                })),
            ],
        )],
        ..Program::default()
    };
    let module = lower(&program);
    let f = module.get_function("f").unwrap();
    let ops = opcodes(f, "entry");

    assert!(ops.contains(&Opcode::UDiv));
    assert_eq!(ops.iter().filter(|op| **op == Opcode::Gep).count(), 2);
    let gep = f.blocks[0]
        .instructions
        .iter()
        .find(|i| i.opcode == Opcode::Gep)
        .unwrap();
    assert_eq!(gep.ty, IrType::ptr_to(IrType::I8));
}

#[test]
fn test_unsigned_comparisons_use_unsigned_branches() {
    let program = main_with(vec![
        var("b", AstType::U8, Some(Expression::int(200))),
        stmt(StatementKind::If {
            condition: Expression::binary(BinaryOp::Gt, Expression::ident("b"), Expression::int(100)),
            body: vec![ret(Some(Expression::int(1)))],
            elifs: vec![],
            else_body: None,
        }),
        ret(Some(Expression::int(2))),
    ]);
    let module = lower(&program);
    let main = module.get_function("main").unwrap();
    assert!(opcodes(main, "entry").contains(&Opcode::Bugt));
    assert!(!opcodes(main, "entry").contains(&Opcode::Bgt));
}

#[test]
fn test_untyped_wide_literal_is_i64() {
    let program = Program {
        records: vec![],
        externs: vec![ExternDecl {
            name: "printf".to_string(),
            params: vec![AstType::String],
            return_type: AstType::I32,
            variadic: true,
        }],
        functions: vec![function(
            "main",
            vec![],
            AstType::Void,
            vec![stmt(StatementKind::Call {
                name: "printf".to_string(),
                args: vec![
                    Expression::string("%ld\n"),
                    Expression::int(5_000_000_001),
                    Expression::int(7),
                ],
            })],
        )],
    };
    let module = lower(&program);
    let main = module.get_function("main").unwrap();
    let call = main.blocks[0].instructions[0].call.as_ref().unwrap();
    assert_eq!(call.args[1], Operand::Imm(5_000_000_001));
    assert_eq!(call.args[2], Operand::Imm(7));
}

#[test]
fn test_statements_after_return_are_dropped() {
    let program = main_with(vec![
        var("x", AstType::I32, None),
        ret(Some(Expression::int(1))),
        assign("x", Expression::int(2)),
    ]);
    let module = lower(&program);
    let main = module.get_function("main").unwrap();
    assert_eq!(opcodes(main, "entry"), vec![Opcode::Alloca, Opcode::Store, Opcode::Ret]);
}

#[test]
fn test_literal_wrapped_to_target_width() {
    let program = main_with(vec![var("c", AstType::I8, Some(Expression::int(300)))]);
    let module = lower(&program);
    let store = &module.get_function("main").unwrap().blocks[0].instructions[1];
    assert_eq!(store.operands[0], Some(Operand::Imm(44)));
}

#[test]
fn test_loop_target_stacks_are_balanced() {
    let mut builder = IrBuilder::new();
    let mut module = Module::new("m");
    let signatures = HashMap::new();
    let records = HashMap::new();
    builder.create_function("f", Linkage::Global, IrType::Void, vec![]);
    builder.create_block("entry").unwrap();

    let mut gen = FunctionGenerator {
        builder: &mut builder,
        module: &mut module,
        signatures: &signatures,
        records: &records,
        scope: FunctionScope::new("f", AstType::Void),
        line: 0,
    };

    let inner = stmt(StatementKind::While {
        condition: Expression::Bool { value: true },
        body: vec![stmt(StatementKind::Continue)],
    });
    let outer = stmt(StatementKind::While {
        condition: Expression::Bool { value: true },
        body: vec![inner, stmt(StatementKind::Break)],
    });
    statements::generate_statement(&mut gen, &outer).unwrap();
    assert!(gen.scope.break_targets.is_empty());
    assert!(gen.scope.continue_targets.is_empty());

    // a failing body still unwinds its targets
    let bad = stmt(StatementKind::While {
        condition: Expression::Bool { value: true },
        body: vec![assign("missing", Expression::int(1))],
    });
    assert!(statements::generate_statement(&mut gen, &bad).is_err());
    assert!(gen.scope.break_targets.is_empty());
    assert!(gen.scope.continue_targets.is_empty());
}

#[test]
fn test_lowering_errors() {
    assert_eq!(
        lower_err(&main_with(vec![ret(Some(Expression::ident("y")))])),
        "undefined variable 'y'"
    );
    assert_eq!(
        lower_err(&main_with(vec![ret(Some(Expression::call("nope", vec![])))])),
        "undefined function 'nope'"
    );
    assert_eq!(
        lower_err(&main_with(vec![stmt(StatementKind::Break)])),
        "'break' outside of a loop"
    );
    assert_eq!(
        lower_err(&main_with(vec![var("x", AstType::I32, Some(Expression::string("s")))])),
        "type mismatch: expected i32, found string"
    );
    assert_eq!(
        lower_err(&main_with(vec![ret(None)])),
        "invalid return: function 'main' must return a i32"
    );
    assert_eq!(
        lower_err(&main_with(vec![stmt(StatementKind::RecordDecl {
            name: "p".to_string(),
            record: "Ghost".to_string(),
            no_init: false,
        })])),
        "unknown record type 'Ghost'"
    );

    let arity = Program {
        functions: vec![
            function("two", vec![("a", AstType::I32), ("b", AstType::I32)], AstType::Void, vec![]),
            function(
                "main",
                vec![],
                AstType::Void,
                vec![stmt(StatementKind::Call {
                    name: "two".to_string(),
                    args: vec![Expression::int(1)],
                })],
            ),
        ],
        ..Program::default()
    };
    assert_eq!(lower_err(&arity), "function 'two' expects 2 argument(s), got 1");

    let void_value = Program {
        functions: vec![function(
            "main",
            vec![],
            AstType::Void,
            vec![ret(Some(Expression::int(1)))],
        )],
        ..Program::default()
    };
    assert_eq!(lower_err(&void_value), "invalid return: function 'main' returns void");
}

#[test]
fn test_error_carries_statement_line() {
    let program = main_with(vec![Statement::new(
        7,
        StatementKind::Assign {
            name: "ghost".to_string(),
            value: Expression::int(1),
        },
    )]);
    match CodeGenerator::new("test").generate(&program) {
        Err(CompilerError::Lowering { location, .. }) => assert_eq!(location.line, 7),
        other => panic!("unexpected result {:?}", other),
    }
}

#[test]
fn test_every_lowered_function_transforms() {
    let program = main_with(vec![
        var("i", AstType::I32, None),
        var("acc", AstType::I64, None),
        stmt(StatementKind::While {
            condition: Expression::binary(BinaryOp::Lt, Expression::ident("i"), Expression::int(10)),
            body: vec![
                stmt(StatementKind::If {
                    condition: Expression::binary(
                        BinaryOp::Eq,
                        Expression::binary(BinaryOp::Rem, Expression::ident("i"), Expression::int(2)),
                        Expression::int(0),
                    ),
                    body: vec![assign(
                        "acc",
                        Expression::binary(BinaryOp::Add, Expression::ident("acc"), Expression::ident("i")),
                    )],
                    elifs: vec![],
                    else_body: Some(vec![stmt(StatementKind::Continue)]),
                }),
                assign("i", Expression::binary(BinaryOp::Add, Expression::ident("i"), Expression::int(1))),
            ],
        }),
        ret(Some(Expression::ident("i"))),
    ]);
    let mut module = lower(&program);
    for function in &module.functions {
        assert_well_formed(function);
    }
    transform_module(&mut module).unwrap();
    assert!(module.functions[0].stack_size >= 12);
}
