//! x86-64 Assembly Instruction Definitions
//!
//! This module defines the register model, operands and the subset of the
//! x86-64 instruction set the backend emits, along with their rendering in
//! GNU `as` Intel or AT&T syntax.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Assembler dialect of the emitted text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AsmSyntax {
    /// `.intel_syntax noprefix`, destination first
    #[default]
    Intel,
    /// GNU default, source first, `%`/`$` prefixes and size suffixes
    Att,
}

impl std::str::FromStr for AsmSyntax {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "intel" => Ok(AsmSyntax::Intel),
            "att" | "at&t" => Ok(AsmSyntax::Att),
            other => Err(format!("unknown assembly syntax '{}'", other)),
        }
    }
}

/// Operand width
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Width {
    Byte,
    Word,
    Dword,
    Qword,
}

impl Width {
    /// Width holding a value of `bytes` bytes; anything wider than four is a
    /// quadword
    pub fn from_bytes(bytes: u32) -> Self {
        match bytes {
            1 => Width::Byte,
            2 => Width::Word,
            3 | 4 => Width::Dword,
            _ => Width::Qword,
        }
    }

    pub fn bytes(self) -> u32 {
        match self {
            Width::Byte => 1,
            Width::Word => 2,
            Width::Dword => 4,
            Width::Qword => 8,
        }
    }

    /// Intel size qualifier
    pub fn ptr_name(self) -> &'static str {
        match self {
            Width::Byte => "BYTE PTR",
            Width::Word => "WORD PTR",
            Width::Dword => "DWORD PTR",
            Width::Qword => "QWORD PTR",
        }
    }

    /// AT&T mnemonic suffix
    pub fn suffix(self) -> char {
        match self {
            Width::Byte => 'b',
            Width::Word => 'w',
            Width::Dword => 'l',
            Width::Qword => 'q',
        }
    }
}

/// General purpose registers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Gpr {
    Rax, Rbx, Rcx, Rdx, Rsi, Rdi, Rbp, Rsp,
    R8, R9, R10, R11, R12, R13, R14, R15,
}

impl Gpr {
    /// Register name at the given width
    pub fn name(self, width: Width) -> &'static str {
        use Gpr::*;
        use Width::*;
        match (self, width) {
            (Rax, Qword) => "rax", (Rax, Dword) => "eax", (Rax, Word) => "ax", (Rax, Byte) => "al",
            (Rbx, Qword) => "rbx", (Rbx, Dword) => "ebx", (Rbx, Word) => "bx", (Rbx, Byte) => "bl",
            (Rcx, Qword) => "rcx", (Rcx, Dword) => "ecx", (Rcx, Word) => "cx", (Rcx, Byte) => "cl",
            (Rdx, Qword) => "rdx", (Rdx, Dword) => "edx", (Rdx, Word) => "dx", (Rdx, Byte) => "dl",
            (Rsi, Qword) => "rsi", (Rsi, Dword) => "esi", (Rsi, Word) => "si", (Rsi, Byte) => "sil",
            (Rdi, Qword) => "rdi", (Rdi, Dword) => "edi", (Rdi, Word) => "di", (Rdi, Byte) => "dil",
            (Rbp, Qword) => "rbp", (Rbp, Dword) => "ebp", (Rbp, Word) => "bp", (Rbp, Byte) => "bpl",
            (Rsp, Qword) => "rsp", (Rsp, Dword) => "esp", (Rsp, Word) => "sp", (Rsp, Byte) => "spl",
            (R8, Qword) => "r8", (R8, Dword) => "r8d", (R8, Word) => "r8w", (R8, Byte) => "r8b",
            (R9, Qword) => "r9", (R9, Dword) => "r9d", (R9, Word) => "r9w", (R9, Byte) => "r9b",
            (R10, Qword) => "r10", (R10, Dword) => "r10d", (R10, Word) => "r10w", (R10, Byte) => "r10b",
            (R11, Qword) => "r11", (R11, Dword) => "r11d", (R11, Word) => "r11w", (R11, Byte) => "r11b",
            (R12, Qword) => "r12", (R12, Dword) => "r12d", (R12, Word) => "r12w", (R12, Byte) => "r12b",
            (R13, Qword) => "r13", (R13, Dword) => "r13d", (R13, Word) => "r13w", (R13, Byte) => "r13b",
            (R14, Qword) => "r14", (R14, Dword) => "r14d", (R14, Word) => "r14w", (R14, Byte) => "r14b",
            (R15, Qword) => "r15", (R15, Dword) => "r15d", (R15, Word) => "r15w", (R15, Byte) => "r15b",
        }
    }
}

impl fmt::Display for Gpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name(Width::Qword))
    }
}

/// Instruction operand
#[derive(Debug, Clone, PartialEq)]
pub enum AsmOperand {
    Reg(Gpr, Width),
    Imm(i64),
    /// `width PTR [base + disp]`
    Mem { base: Gpr, disp: i32, width: Width },
    /// Address of a data symbol, RIP-relative
    RipSymbol(String),
}

impl AsmOperand {
    pub fn reg(reg: Gpr) -> Self {
        AsmOperand::Reg(reg, Width::Qword)
    }

    pub fn mem(base: Gpr, disp: i32, width: Width) -> Self {
        AsmOperand::Mem { base, disp, width }
    }

    pub fn width(&self) -> Option<Width> {
        match self {
            AsmOperand::Reg(_, width) | AsmOperand::Mem { width, .. } => Some(*width),
            AsmOperand::Imm(_) | AsmOperand::RipSymbol(_) => None,
        }
    }

    /// Same location at a different width
    pub fn with_width(&self, width: Width) -> Self {
        match self {
            AsmOperand::Reg(reg, _) => AsmOperand::Reg(*reg, width),
            AsmOperand::Mem { base, disp, .. } => AsmOperand::Mem {
                base: *base,
                disp: *disp,
                width,
            },
            other => other.clone(),
        }
    }

    fn render(&self, syntax: AsmSyntax, sized: bool) -> String {
        match (self, syntax) {
            (AsmOperand::Reg(reg, width), AsmSyntax::Intel) => reg.name(*width).to_string(),
            (AsmOperand::Reg(reg, width), AsmSyntax::Att) => format!("%{}", reg.name(*width)),
            (AsmOperand::Imm(value), AsmSyntax::Intel) => value.to_string(),
            (AsmOperand::Imm(value), AsmSyntax::Att) => format!("${}", value),
            (AsmOperand::Mem { base, disp, width }, AsmSyntax::Intel) => {
                let address = match *disp {
                    0 => format!("[{}]", base),
                    d if d < 0 => format!("[{}{}]", base, d),
                    d => format!("[{}+{}]", base, d),
                };
                if sized {
                    format!("{} {}", width.ptr_name(), address)
                } else {
                    address
                }
            }
            (AsmOperand::Mem { base, disp, .. }, AsmSyntax::Att) => match *disp {
                0 => format!("(%{})", base),
                d => format!("{}(%{})", d, base),
            },
            (AsmOperand::RipSymbol(symbol), AsmSyntax::Intel) => format!("[rip+{}]", symbol),
            (AsmOperand::RipSymbol(symbol), AsmSyntax::Att) => format!("{}(%rip)", symbol),
        }
    }
}

impl fmt::Display for AsmOperand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render(AsmSyntax::Intel, true))
    }
}

/// Branch condition after a signed `cmp`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cond {
    E,
    Ne,
    G,
    Ge,
    L,
    Le,
    A,
    Ae,
    B,
    Be,
}

impl Cond {
    pub fn mnemonic(self) -> &'static str {
        match self {
            Cond::E => "je",
            Cond::Ne => "jne",
            Cond::G => "jg",
            Cond::Ge => "jge",
            Cond::L => "jl",
            Cond::Le => "jle",
            Cond::A => "ja",
            Cond::Ae => "jae",
            Cond::B => "jb",
            Cond::Be => "jbe",
        }
    }
}

/// x86-64 instructions and assembler directives.
///
/// Two-operand forms are `(destination, source)` regardless of the syntax
/// they are rendered in.
#[derive(Debug, Clone, PartialEq)]
pub enum AsmInst {
    // Data movement
    Mov(AsmOperand, AsmOperand),
    /// Sign-extending move into a 64-bit register
    Movsx(AsmOperand, AsmOperand),
    /// Zero-extending move into a 64-bit register
    Movzx(AsmOperand, AsmOperand),
    Lea(AsmOperand, AsmOperand),
    Push(AsmOperand),
    Pop(AsmOperand),

    // Arithmetic and logic
    Add(AsmOperand, AsmOperand),
    Sub(AsmOperand, AsmOperand),
    Imul(AsmOperand, AsmOperand),
    And(AsmOperand, AsmOperand),
    Or(AsmOperand, AsmOperand),
    Xor(AsmOperand, AsmOperand),
    Neg(AsmOperand),
    Not(AsmOperand),
    /// Sign-extend rax into rdx:rax
    Cqo,
    Idiv(AsmOperand),
    Div(AsmOperand),
    Cmp(AsmOperand, AsmOperand),

    // Control flow
    Jmp(String),
    Jcc(Cond, String),
    Call(String),
    Leave,
    Ret,

    // Assembly pseudo-instructions
    Label(String),
    Directive(String),
    Comment(String),
}

impl AsmInst {
    /// Render in the given syntax, without indentation
    pub fn render(&self, syntax: AsmSyntax) -> String {
        match self {
            AsmInst::Mov(dst, src) => binary("mov", dst, src, syntax),
            AsmInst::Movsx(dst, src) => extend(true, dst, src, syntax),
            AsmInst::Movzx(dst, src) => extend(false, dst, src, syntax),
            AsmInst::Lea(dst, src) => match syntax {
                AsmSyntax::Intel => format!(
                    "lea {}, {}",
                    dst.render(syntax, true),
                    src.render(syntax, false)
                ),
                AsmSyntax::Att => format!(
                    "leaq {}, {}",
                    src.render(syntax, false),
                    dst.render(syntax, false)
                ),
            },
            AsmInst::Push(op) => unary("push", op, syntax),
            AsmInst::Pop(op) => unary("pop", op, syntax),
            AsmInst::Add(dst, src) => binary("add", dst, src, syntax),
            AsmInst::Sub(dst, src) => binary("sub", dst, src, syntax),
            AsmInst::Imul(dst, src) => binary("imul", dst, src, syntax),
            AsmInst::And(dst, src) => binary("and", dst, src, syntax),
            AsmInst::Or(dst, src) => binary("or", dst, src, syntax),
            AsmInst::Xor(dst, src) => binary("xor", dst, src, syntax),
            AsmInst::Neg(op) => unary("neg", op, syntax),
            AsmInst::Not(op) => unary("not", op, syntax),
            AsmInst::Cqo => match syntax {
                AsmSyntax::Intel => "cqo".to_string(),
                AsmSyntax::Att => "cqto".to_string(),
            },
            AsmInst::Idiv(op) => unary("idiv", op, syntax),
            AsmInst::Div(op) => unary("div", op, syntax),
            AsmInst::Cmp(a, b) => binary("cmp", a, b, syntax),
            AsmInst::Jmp(label) => format!("jmp {}", label),
            AsmInst::Jcc(cond, label) => format!("{} {}", cond.mnemonic(), label),
            AsmInst::Call(target) => format!("call {}", target),
            AsmInst::Leave => "leave".to_string(),
            AsmInst::Ret => "ret".to_string(),
            AsmInst::Label(label) => format!("{}:", label),
            AsmInst::Directive(text) => text.clone(),
            AsmInst::Comment(text) => format!("# {}", text),
        }
    }

    /// Labels start in the first column, everything else is indented
    pub fn is_label(&self) -> bool {
        matches!(self, AsmInst::Label(_))
    }
}

impl fmt::Display for AsmInst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render(AsmSyntax::Intel))
    }
}

fn operand_width(a: &AsmOperand, b: Option<&AsmOperand>) -> Width {
    a.width()
        .or_else(|| b.and_then(AsmOperand::width))
        .unwrap_or(Width::Qword)
}

fn binary(mnemonic: &str, dst: &AsmOperand, src: &AsmOperand, syntax: AsmSyntax) -> String {
    match syntax {
        AsmSyntax::Intel => format!(
            "{} {}, {}",
            mnemonic,
            dst.render(syntax, true),
            src.render(syntax, true)
        ),
        AsmSyntax::Att => format!(
            "{}{} {}, {}",
            mnemonic,
            operand_width(dst, Some(src)).suffix(),
            src.render(syntax, true),
            dst.render(syntax, true)
        ),
    }
}

fn unary(mnemonic: &str, op: &AsmOperand, syntax: AsmSyntax) -> String {
    match syntax {
        AsmSyntax::Intel => format!("{} {}", mnemonic, op.render(syntax, true)),
        AsmSyntax::Att => format!(
            "{}{} {}",
            mnemonic,
            operand_width(op, None).suffix(),
            op.render(syntax, true)
        ),
    }
}

/// `movsx`/`movsxd`/`movzx` into a quadword register. A zero-extended
/// doubleword is a plain 32-bit `mov`, which clears the upper half.
fn extend(signed: bool, dst: &AsmOperand, src: &AsmOperand, syntax: AsmSyntax) -> String {
    let from = src.width().unwrap_or(Width::Qword);
    if from == Width::Qword {
        return binary("mov", dst, src, syntax);
    }
    if !signed && from == Width::Dword {
        return binary("mov", &dst.with_width(Width::Dword), src, syntax);
    }
    match syntax {
        AsmSyntax::Intel => {
            let mnemonic = match (signed, from) {
                (true, Width::Dword) => "movsxd",
                (true, _) => "movsx",
                (false, _) => "movzx",
            };
            format!(
                "{} {}, {}",
                mnemonic,
                dst.render(syntax, true),
                src.render(syntax, true)
            )
        }
        AsmSyntax::Att => format!(
            "mov{}{}q {}, {}",
            if signed { 's' } else { 'z' },
            from.suffix(),
            src.render(syntax, true),
            dst.render(syntax, true)
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_register_names() {
        assert_eq!(Gpr::Rax.name(Width::Byte), "al");
        assert_eq!(Gpr::Rsi.name(Width::Byte), "sil");
        assert_eq!(Gpr::R11.name(Width::Dword), "r11d");
        assert_eq!(Gpr::Rbp.to_string(), "rbp");
    }

    #[test]
    fn test_intel_rendering() {
        let slot = AsmOperand::mem(Gpr::Rbp, -4, Width::Dword);
        assert_eq!(
            AsmInst::Mov(slot.clone(), AsmOperand::Imm(10)).to_string(),
            "mov DWORD PTR [rbp-4], 10"
        );
        assert_eq!(
            AsmInst::Movsx(AsmOperand::reg(Gpr::R11), slot.clone()).to_string(),
            "movsxd r11, DWORD PTR [rbp-4]"
        );
        assert_eq!(
            AsmInst::Movzx(AsmOperand::reg(Gpr::R11), slot).to_string(),
            "mov r11d, DWORD PTR [rbp-4]"
        );
        assert_eq!(
            AsmInst::Lea(AsmOperand::reg(Gpr::Rdi), AsmOperand::RipSymbol("STR0".to_string())).to_string(),
            "lea rdi, [rip+STR0]"
        );
        assert_eq!(
            AsmInst::Lea(AsmOperand::reg(Gpr::R10), AsmOperand::mem(Gpr::Rbp, -16, Width::Qword)).to_string(),
            "lea r10, [rbp-16]"
        );
        assert_eq!(
            AsmInst::Mov(AsmOperand::reg(Gpr::R11), AsmOperand::mem(Gpr::Rbp, 16, Width::Qword)).to_string(),
            "mov r11, QWORD PTR [rbp+16]"
        );
        assert_eq!(AsmInst::Jcc(Cond::Le, ".Lmain.end0".to_string()).to_string(), "jle .Lmain.end0");
    }

    #[test]
    fn test_att_rendering() {
        let att = |inst: AsmInst| inst.render(AsmSyntax::Att);
        assert_eq!(
            att(AsmInst::Mov(AsmOperand::mem(Gpr::Rbp, -4, Width::Dword), AsmOperand::Imm(10))),
            "movl $10, -4(%rbp)"
        );
        assert_eq!(
            att(AsmInst::Mov(AsmOperand::reg(Gpr::Rbp), AsmOperand::reg(Gpr::Rsp))),
            "movq %rsp, %rbp"
        );
        assert_eq!(
            att(AsmInst::Movsx(AsmOperand::reg(Gpr::R11), AsmOperand::Reg(Gpr::R11, Width::Byte))),
            "movsbq %r11b, %r11"
        );
        assert_eq!(
            att(AsmInst::Movsx(AsmOperand::reg(Gpr::R11), AsmOperand::mem(Gpr::R10, 0, Width::Dword))),
            "movslq (%r10), %r11"
        );
        assert_eq!(att(AsmInst::Cqo), "cqto");
        assert_eq!(att(AsmInst::Idiv(AsmOperand::reg(Gpr::R10))), "idivq %r10");
        assert_eq!(
            att(AsmInst::Lea(AsmOperand::reg(Gpr::Rsi), AsmOperand::RipSymbol("STR1".to_string()))),
            "leaq STR1(%rip), %rsi"
        );
        assert_eq!(att(AsmInst::Push(AsmOperand::reg(Gpr::Rbp))), "pushq %rbp");
    }

    #[test]
    fn test_syntax_from_str() {
        assert_eq!("intel".parse::<AsmSyntax>(), Ok(AsmSyntax::Intel));
        assert_eq!("ATT".parse::<AsmSyntax>(), Ok(AsmSyntax::Att));
        assert!("masm".parse::<AsmSyntax>().is_err());
    }
}
