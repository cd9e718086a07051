//! AST → IR lowering
//!
//! [`CodeGenerator`] owns the module being produced and the IR builder. It
//! registers every record, extern and function signature first, then lowers
//! each function body through a [`FunctionGenerator`] that carries the
//! per-function scope.

mod errors;
mod expressions;
mod function_gen;
mod statements;
mod types;

pub use errors::CodegenError;
pub use types::{convert_type, is_assignable};

use crate::ast::{AstType, Program, RecordField};
use log::{debug, info};
use std::collections::HashMap;
use tlc_common::{BlockId, CompilerError, SourceLocation};
use tlc_ir::{Function, IrBuilder, IrError, IrType, Module, Operand};

/// Callable signature, shared by defined and extern functions
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    pub params: Vec<AstType>,
    pub return_type: AstType,
    pub variadic: bool,
}

/// Record layout and field defaults
#[derive(Debug, Clone)]
pub struct RecordInfo {
    pub ir_type: IrType,
    pub fields: Vec<RecordField>,
}

impl RecordInfo {
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }
}

/// A named local: the operand addressing its storage and its declared type.
///
/// Scalars live in an alloca'd cell; record parameters are the incoming
/// pointer itself.
#[derive(Debug, Clone)]
pub struct VarInfo {
    pub storage: Operand,
    pub ty: AstType,
}

/// Lexical state of the function being lowered, created fresh per function
#[derive(Debug, Default)]
pub struct FunctionScope {
    pub name: String,
    pub return_type: AstType,
    pub variables: HashMap<String, VarInfo>,
    /// Parameters passed by address, mapped to their record type
    pub record_params: HashMap<String, String>,
    pub break_targets: Vec<BlockId>,
    pub continue_targets: Vec<BlockId>,
    next_block: u32,
}

impl FunctionScope {
    pub fn new(name: &str, return_type: AstType) -> Self {
        Self {
            name: name.to_string(),
            return_type,
            ..Self::default()
        }
    }

    /// Suffix shared by the blocks of one control-flow construct
    pub fn next_block_id(&mut self) -> u32 {
        let id = self.next_block;
        self.next_block += 1;
        id
    }
}

/// Lowering context for one function body
pub struct FunctionGenerator<'a> {
    pub builder: &'a mut IrBuilder,
    pub module: &'a mut Module,
    pub signatures: &'a HashMap<String, Signature>,
    pub records: &'a HashMap<String, RecordInfo>,
    pub scope: FunctionScope,
    /// Line of the statement being lowered, for diagnostics
    pub line: u32,
}

impl<'a> FunctionGenerator<'a> {
    pub fn location(&self) -> SourceLocation {
        SourceLocation::line(self.line)
    }

    pub fn ir_type(&self, ty: &AstType) -> Result<IrType, CodegenError> {
        types::convert_type(ty, self.records, &self.location())
    }

    pub fn lookup(&self, name: &str) -> Result<VarInfo, CodegenError> {
        self.scope
            .variables
            .get(name)
            .cloned()
            .ok_or_else(|| CodegenError::UndefinedVariable {
                name: name.to_string(),
                location: self.location(),
            })
    }

    pub fn signature(&self, name: &str) -> Result<&'a Signature, CodegenError> {
        self.signatures.get(name).ok_or_else(|| CodegenError::UndefinedFunction {
            name: name.to_string(),
            location: self.location(),
        })
    }

    pub fn record(&self, name: &str) -> Result<&'a RecordInfo, CodegenError> {
        self.records.get(name).ok_or_else(|| CodegenError::UnknownRecord {
            name: name.to_string(),
            location: self.location(),
        })
    }

    /// Record type and field index for `var.field`
    pub fn field_of(&self, var: &VarInfo, field: &str) -> Result<(&'a RecordInfo, usize), CodegenError> {
        let AstType::Struct(record_name) = &var.ty else {
            return Err(CodegenError::TypeMismatch {
                expected: AstType::Struct("<record>".to_string()),
                found: var.ty.clone(),
                location: self.location(),
            });
        };
        let record = self.record(record_name)?;
        let index = record.field_index(field).ok_or_else(|| CodegenError::UnknownField {
            record: record_name.clone(),
            field: field.to_string(),
            location: self.location(),
        })?;
        Ok((record, index))
    }

    /// Block under the builder's cursor
    pub fn current_block(&self) -> Result<BlockId, CompilerError> {
        self.builder
            .insert_point()
            .ok_or_else(|| IrError::NoInsertPoint(self.scope.name.clone()).into())
    }

    /// Create a block placed right after `after` in layout order
    pub fn block_after(&mut self, after: BlockId, name: String) -> Result<BlockId, CompilerError> {
        let block = self.builder.new_block(name);
        Ok(self.builder.add_block_after(after, block)?)
    }

    pub fn unsupported(&self, construct: impl Into<String>) -> CodegenError {
        CodegenError::UnsupportedConstruct {
            construct: construct.into(),
            location: self.location(),
        }
    }
}

/// Lowers a whole program into one module
pub struct CodeGenerator {
    module: Module,
    builder: IrBuilder,
    signatures: HashMap<String, Signature>,
    records: HashMap<String, RecordInfo>,
}

impl CodeGenerator {
    pub fn new(module_name: &str) -> Self {
        Self {
            module: Module::new(module_name),
            builder: IrBuilder::new(),
            signatures: HashMap::new(),
            records: HashMap::new(),
        }
    }

    pub fn generate(mut self, program: &Program) -> Result<Module, CompilerError> {
        info!("Lowering module '{}'", self.module.name);

        for record in &program.records {
            self.register_record(&record.name, &record.fields)?;
        }

        for ext in &program.externs {
            let location = SourceLocation::dummy();
            self.declare(&ext.name, ext.params.clone(), ext.return_type.clone(), ext.variadic, &location)?;
            let params = ext
                .params
                .iter()
                .map(|p| types::convert_param_type(p, &self.records, &location))
                .collect::<Result<Vec<_>, _>>()?;
            let ret = types::convert_type(&ext.return_type, &self.records, &location)?;
            self.module
                .add_function(Function::new_extern(&ext.name, ret, params, ext.variadic));
        }

        for func in &program.functions {
            let params = func.params.iter().map(|p| p.ty.clone()).collect();
            self.declare(&func.name, params, func.return_type.clone(), false, &SourceLocation::line(func.line))?;
        }

        for func in &program.functions {
            debug!("Lowering function '{}'", func.name);
            let mut gen = FunctionGenerator {
                builder: &mut self.builder,
                module: &mut self.module,
                signatures: &self.signatures,
                records: &self.records,
                scope: FunctionScope::new(&func.name, func.return_type.clone()),
                line: func.line,
            };
            let function = function_gen::generate_function(&mut gen, func)?;
            self.module.add_function(function);
        }

        info!(
            "Module '{}': {} functions, {} strings",
            self.module.name,
            self.module.functions.len(),
            self.module.strings.len()
        );
        Ok(self.module)
    }

    fn register_record(&mut self, name: &str, fields: &[RecordField]) -> Result<(), CodegenError> {
        let location = SourceLocation::dummy();
        if self.records.contains_key(name) {
            return Err(CodegenError::Redefinition { name: name.to_string(), location });
        }
        let mut field_types = Vec::with_capacity(fields.len());
        for field in fields {
            if field.ty.is_record() {
                return Err(CodegenError::UnsupportedConstruct {
                    construct: format!("record field '{}.{}' of record type", name, field.name),
                    location,
                });
            }
            field_types.push(types::convert_type(&field.ty, &self.records, &location)?);
        }
        let info = RecordInfo {
            ir_type: IrType::Struct { name: name.to_string(), fields: field_types },
            fields: fields.to_vec(),
        };
        self.records.insert(name.to_string(), info);
        Ok(())
    }

    fn declare(
        &mut self,
        name: &str,
        params: Vec<AstType>,
        return_type: AstType,
        variadic: bool,
        location: &SourceLocation,
    ) -> Result<(), CodegenError> {
        if self.signatures.contains_key(name) {
            return Err(CodegenError::Redefinition { name: name.to_string(), location: location.clone() });
        }
        self.signatures.insert(name.to_string(), Signature { params, return_type, variadic });
        Ok(())
    }
}

#[cfg(test)]
mod tests;
