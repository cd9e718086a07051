//! Module and string constants

use crate::function::Function;
use crate::operand::Operand;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Visibility of a function symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Linkage {
    /// Defined here and exported
    Global,
    /// Defined here, file scope only
    Local,
    /// Declared only, supplied by another object
    Extern,
}

impl fmt::Display for Linkage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Linkage::Global => write!(f, "global"),
            Linkage::Local => write!(f, "local"),
            Linkage::Extern => write!(f, "extern"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringConst {
    pub name: String,
    pub value: String,
}

/// IR Module - one compilation unit, named after its output file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub name: String,
    pub functions: Vec<Function>,
    pub strings: Vec<StringConst>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            functions: Vec::new(),
            strings: Vec::new(),
        }
    }

    pub fn add_function(&mut self, function: Function) {
        self.functions.push(function);
    }

    pub fn get_function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name == name)
    }

    pub fn get_function_mut(&mut self, name: &str) -> Option<&mut Function> {
        self.functions.iter_mut().find(|f| f.name == name)
    }

    /// Intern a string constant and return an operand referring to it
    pub fn add_string(&mut self, value: &str) -> Operand {
        let name = match self.strings.iter().find(|s| s.value == value) {
            Some(existing) => existing.name.clone(),
            None => {
                let name = format!("STR{}", self.strings.len());
                self.strings.push(StringConst {
                    name: name.clone(),
                    value: value.to_string(),
                });
                name
            }
        };
        Operand::StringPtr {
            name,
            value: value.to_string(),
        }
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "#module {}", self.name)?;
        for string in &self.strings {
            writeln!(f, "@{} = {:?}", string.name, string.value)?;
        }
        for function in &self.functions {
            writeln!(f)?;
            write!(f, "{}", function)?;
        }
        Ok(())
    }
}
