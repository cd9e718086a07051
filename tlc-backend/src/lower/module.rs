//! Module Lowering - the whole assembly file

use super::function::lower_function;
use crate::error::EmitError;
use crate::naming::{escape_string, string_label};
use crate::EmitOptions;
use log::info;
use tlc_codegen::{AsmInst, AsmSyntax};
use tlc_ir::Module;

/// Lower every defined function of a transformed module, framed by the
/// syntax directive, the string table and the non-executable stack note.
/// Extern functions produce no code.
pub fn lower_module(module: &Module, options: &EmitOptions) -> Result<Vec<AsmInst>, EmitError> {
    info!(
        "Lowering module '{}': {} functions, {} strings",
        module.name,
        module.functions.len(),
        module.strings.len()
    );

    let mut insts = Vec::new();
    if options.syntax == AsmSyntax::Intel {
        insts.push(AsmInst::Directive(".intel_syntax noprefix".to_string()));
    }

    if !module.strings.is_empty() {
        insts.push(AsmInst::Directive(".data".to_string()));
        for string in &module.strings {
            insts.push(AsmInst::Label(string_label(&string.name)));
            insts.push(AsmInst::Directive(format!(".string \"{}\"", escape_string(&string.value))));
        }
    }

    insts.push(AsmInst::Directive(".text".to_string()));
    for function in module.functions.iter().filter(|f| !f.is_extern()) {
        insts.extend(lower_function(module, function, options)?);
    }

    insts.push(AsmInst::Directive(".section .note.GNU-stack,\"\",@progbits".to_string()));
    Ok(insts)
}
