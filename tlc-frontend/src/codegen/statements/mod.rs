//! Statement code generation modules

mod assignments;
mod control_flow;
mod declarations;
mod jumps;

use super::expressions;
use super::FunctionGenerator;
use crate::ast::{Statement, StatementKind};
use log::debug;
use tlc_common::{BlockId, CompilerError};

/// Generate IR for a statement list into the current block.
///
/// Once the block is terminated the remaining statements are unreachable
/// and are dropped.
pub fn generate_block(gen: &mut FunctionGenerator, statements: &[Statement]) -> Result<(), CompilerError> {
    for (i, stmt) in statements.iter().enumerate() {
        if gen.builder.current_block_terminated() {
            debug!(
                "{}: skipping {} unreachable statement(s) from line {}",
                gen.scope.name,
                statements.len() - i,
                stmt.line
            );
            break;
        }
        generate_statement(gen, stmt)?;
    }
    Ok(())
}

/// Generate IR for a single statement
pub fn generate_statement(gen: &mut FunctionGenerator, stmt: &Statement) -> Result<(), CompilerError> {
    gen.line = stmt.line;
    match &stmt.kind {
        StatementKind::VarDecl { name, ty, init } => declarations::generate_var_decl(gen, name, ty, init.as_ref()),

        StatementKind::RecordDecl { name, record, no_init } => {
            declarations::generate_record_decl(gen, name, record, *no_init)
        }

        StatementKind::Assign { name, value } => assignments::generate_assign(gen, name, value),

        StatementKind::IndexAssign { name, index, value } => {
            assignments::generate_index_assign(gen, name, index, value)
        }

        StatementKind::FieldAssign { name, field, value } => {
            assignments::generate_field_assign(gen, name, field, value)
        }

        StatementKind::Call { name, args } => expressions::generate_call_statement(gen, name, args),

        StatementKind::Return { value } => jumps::generate_return(gen, value.as_ref()),

        StatementKind::If {
            condition,
            body,
            elifs,
            else_body,
        } => control_flow::generate_if(gen, condition, body, elifs, else_body.as_deref()),

        StatementKind::While { condition, body } => control_flow::generate_while(gen, condition, body),

        StatementKind::Break => jumps::generate_break(gen),

        StatementKind::Continue => jumps::generate_continue(gen),
    }
}

/// End a branch body with a jump to `target` unless it already left
pub fn close_branch(gen: &mut FunctionGenerator, target: BlockId) -> Result<(), CompilerError> {
    if !gen.builder.current_block_terminated() {
        gen.builder.create_br(target)?;
    }
    Ok(())
}
