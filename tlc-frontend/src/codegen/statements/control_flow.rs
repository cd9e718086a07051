//! Control flow statement code generation (if, while)

use super::{close_branch, generate_block, FunctionGenerator};
use crate::ast::{ElifClause, Expression, Statement};
use crate::codegen::expressions::generate_condition;
use log::trace;
use tlc_common::CompilerError;

/// `if`/`elif`/`else`.
///
/// Blocks are laid out as `true<N>`, `false<N>`, then one
/// `<k>true<N>`/`<k>false<N>` pair per elif, then `end<N>`. Each false
/// block evaluates the next condition; the last one holds the else body.
pub fn generate_if(
    gen: &mut FunctionGenerator,
    condition: &Expression,
    body: &[Statement],
    elifs: &[ElifClause],
    else_body: Option<&[Statement]>,
) -> Result<(), CompilerError> {
    let n = gen.scope.next_block_id();
    let has_alternatives = !elifs.is_empty() || else_body.is_some();

    let current = gen.current_block()?;
    let true_block = gen.block_after(current, format!("true{n}"))?;
    let false_block = if has_alternatives {
        Some(gen.block_after(true_block, format!("false{n}"))?)
    } else {
        None
    };
    let end_block = gen.block_after(false_block.unwrap_or(true_block), format!("end{n}"))?;
    trace!("{}: if{} with {} elif(s)", gen.scope.name, n, elifs.len());

    generate_condition(gen, condition, true_block, false_block.unwrap_or(end_block))?;

    gen.builder.set_insert_point(true_block)?;
    generate_block(gen, body)?;
    close_branch(gen, end_block)?;

    let mut next_false = false_block;
    for (k, elif) in elifs.iter().enumerate() {
        let Some(test_block) = next_false else {
            break;
        };
        let k = k + 1;
        let is_last = k == elifs.len() && else_body.is_none();

        let elif_true = gen.block_after(test_block, format!("{k}true{n}"))?;
        let elif_false = if is_last {
            None
        } else {
            Some(gen.block_after(elif_true, format!("{k}false{n}"))?)
        };

        gen.builder.set_insert_point(test_block)?;
        generate_condition(gen, &elif.condition, elif_true, elif_false.unwrap_or(end_block))?;

        gen.builder.set_insert_point(elif_true)?;
        generate_block(gen, &elif.body)?;
        close_branch(gen, end_block)?;

        next_false = elif_false;
    }

    if let (Some(else_body), Some(else_block)) = (else_body, next_false) {
        gen.builder.set_insert_point(else_block)?;
        generate_block(gen, else_body)?;
        close_branch(gen, end_block)?;
    }

    gen.builder.set_insert_point(end_block)?;
    Ok(())
}

/// `while cond do body end`: `loop_body<N>`, `loop_cmp<N>`, `loop_end<N>`
pub fn generate_while(gen: &mut FunctionGenerator, condition: &Expression, body: &[Statement]) -> Result<(), CompilerError> {
    let n = gen.scope.next_block_id();

    let current = gen.current_block()?;
    let body_block = gen.block_after(current, format!("loop_body{n}"))?;
    let cmp_block = gen.block_after(body_block, format!("loop_cmp{n}"))?;
    let end_block = gen.block_after(cmp_block, format!("loop_end{n}"))?;

    // Jump to condition
    gen.builder.create_br(cmp_block)?;

    gen.builder.set_insert_point(cmp_block)?;
    generate_condition(gen, condition, body_block, end_block)?;

    // Set up break/continue targets
    gen.scope.break_targets.push(end_block);
    gen.scope.continue_targets.push(cmp_block);

    gen.builder.set_insert_point(body_block)?;
    let result = generate_block(gen, body).and_then(|()| close_branch(gen, cmp_block));

    gen.scope.break_targets.pop();
    gen.scope.continue_targets.pop();
    result?;

    gen.builder.set_insert_point(end_block)?;
    Ok(())
}
