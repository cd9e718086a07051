//! Assembly text emission

use crate::asm::{AsmInst, AsmSyntax};

/// Render a sequence of instructions as assembler source, one per line.
/// Labels start in the first column; instructions, directives and
/// comments are indented.
pub fn emit_instructions(instructions: &[AsmInst], syntax: AsmSyntax) -> String {
    let mut output = String::new();
    for inst in instructions {
        if !inst.is_label() {
            output.push_str("    ");
        }
        output.push_str(&inst.render(syntax));
        output.push('\n');
    }
    output
}
