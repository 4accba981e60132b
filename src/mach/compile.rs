use super::op::*;
use super::symbol::{SymValue, SymbolTable};
use super::{Address, Word};
use crate::error;
use crate::lang::{Token, TokenStream};
use crate::lang::Error;
use std::io::BufRead;

/// Compile PL/0C source from `reader`, appending instructions to
/// `code`. Diagnostics go to standard error prefixed with `progname`;
/// the error count is returned and compilation always runs to the end
/// of the input.
pub fn compile(
    progname: &str,
    reader: Box<dyn BufRead>,
    code: &mut Vec<Instr>,
    verbose: bool,
) -> usize {
    Compiler {
        ts: TokenStream::new(reader),
        symtbl: SymbolTable::new(),
        code,
        progname: progname.to_string(),
        nerrors: 0,
        verbose,
    }
    .run()
}

/// A forward jump whose target is not yet known. Consumed by
/// `Compiler::patch`, which writes the current pc into the slot.
#[derive(Debug)]
struct Patch(Address);

/// ## Single-pass recursive-descent compiler
///
/// The call structure enforces precedence and associativity:
///
/// ```text
/// program  = block "." .
/// block    = [ "const" ident "=" number { "," ident "=" number } ";" ]
///            [ "var"   ident { "," ident } ";" ]
///            { ("procedure"|"function") ident
///              "(" [ ident { "," ident } ] ")" block ";" }
///            statement .
/// statement = ident ("=" expr | "(" [expr {"," expr}] ")")
///           | "begin" statement { ";" statement } "end"
///           | "if" cond "then" statement [ "else" statement ]
///           | "while" cond "do" statement
///           | "repeat" statement "until" cond
///           | .
/// cond     = "odd" expr
///          | expr ("=="|"!="|"<"|"<="|">"|">=") expr .
/// expr     = [ "+"|"-" ] term { ("+"|"-"|"|"|"^"|"||") term } .
/// term     = fact { ("*"|"/"|"%"|"&"|"<<"|">>"|"&&") fact } .
/// fact     = ident [ "(" [expr {"," expr}] ")" ]
///          | number | "(" expr ")" | "!" fact | "~" fact .
/// ```
struct Compiler<'a> {
    ts: TokenStream,
    symtbl: SymbolTable,
    code: &'a mut Vec<Instr>,
    progname: String,
    nerrors: usize,
    verbose: bool,
}

impl<'a> Compiler<'a> {
    fn run(mut self) -> usize {
        self.next();
        self.block("main", 0, 0, 0, false);
        self.expect(&Token::Period);
        self.nerrors
    }

    fn error(&mut self, error: Error) {
        eprintln!("{}: {}", self.progname, error.in_line(self.ts.line()));
        self.nerrors += 1;
    }

    /// Fetch the next token, surfacing scanner-level errors.
    fn next(&mut self) {
        let token = self.ts.get();
        if self.ts.take_overflow() {
            self.error(error!(Overflow));
        }
        if let Token::BadComment(line) = token {
            self.error(error!(UnterminatedComment).in_line(line));
        }
        if self.verbose {
            println!("{}: getting '{}'", self.progname, self.ts.current());
        }
    }

    fn check(&self, kind: &Token) -> bool {
        self.ts.current().is(kind)
    }

    fn accept(&mut self, kind: &Token) -> bool {
        if self.check(kind) {
            self.next();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &Token) -> bool {
        if self.accept(kind) {
            return true;
        }
        let got = self.ts.current().clone();
        self.error(error!(SyntaxError; "expected '{}' got '{}'", kind.name(), got));
        false
    }

    /// Append an instruction, returning its address.
    fn emit(&mut self, instr: Instr) -> Address {
        if self.verbose {
            println!(
                "{}: emitting {}: {} {}, {}",
                self.progname,
                self.code.len(),
                instr.op,
                instr.level,
                instr.addr
            );
        }
        self.code.push(instr);
        self.code.len() - 1
    }

    /// Emit a branch whose target will be supplied by `patch`.
    fn jump(&mut self, op: Opcode) -> Patch {
        Patch(self.emit(Instr::with_addr(op, 0)))
    }

    /// Point a pending branch at the current pc.
    fn patch(&mut self, patch: Patch) {
        let target = self.code.len();
        if self.verbose {
            println!(
                "{}: patching address at {} to {}",
                self.progname, patch.0, target
            );
        }
        self.code[patch.0].addr = target as Word;
    }

    fn ident_name(&self) -> String {
        match self.ts.current() {
            Token::Ident(name) => name.clone(),
            _ => String::new(),
        }
    }

    /// Compile one block: declarations and nested subroutines first,
    /// then the body statement bracketed by `Enter` and `Ret`/`Retf`.
    /// The entry address is patched into both the leading trampoline
    /// jump and the block's own symbol entry before the body is
    /// compiled, so recursive calls resolve.
    fn block(&mut self, name: &str, name_level: usize, level: usize, nargs: usize, is_function: bool) {
        let trampoline = self.jump(Opcode::Jump);
        let mut dx = FRAME_SIZE;

        if self.accept(&Token::Const) {
            loop {
                self.const_decl(level);
                if !self.accept(&Token::Comma) {
                    break;
                }
            }
            self.expect(&Token::Semicolon);
        }
        if self.accept(&Token::Var) {
            loop {
                dx = self.var_decl(dx, level);
                if !self.accept(&Token::Comma) {
                    break;
                }
            }
            self.expect(&Token::Semicolon);
        }
        while self.check(&Token::Procedure) || self.check(&Token::Function) {
            self.sub_decl(level);
        }

        self.patch(trampoline);
        self.symtbl.set_addr(name, name_level, self.code.len());
        self.emit(Instr::with_addr(Opcode::Enter, dx));
        self.statement(level);
        if is_function {
            self.emit(Instr::with_addr(Opcode::Retf, nargs as Word));
        } else {
            self.emit(Instr::with_addr(Opcode::Ret, nargs as Word));
        }

        for (sym, value) in self.symtbl.close() {
            if self.verbose {
                println!(
                    "{}: purging {}: {}, level {}",
                    self.progname,
                    sym,
                    value.kind(),
                    level
                );
            }
        }
    }

    /// `const ident = number` stores the value in the symbol table
    /// and emits no code.
    fn const_decl(&mut self, level: usize) {
        let name = self.ident_name();
        self.expect(&Token::Ident(String::new()));
        self.expect(&Token::Assign);
        if let Token::Number(value) = self.ts.current().clone() {
            self.next();
            if self.symtbl.defined_here(&name) {
                self.error(error!(Redefined; "'{}'", name));
                return;
            }
            self.symtbl.insert(&name, SymValue::Constant(value));
            if self.verbose {
                println!(
                    "{}: const {}: level {}, value {}",
                    self.progname, name, level, value
                );
            }
        } else {
            let got = self.ts.current().clone();
            self.error(error!(SyntaxError; "expected 'number' got '{}'", got));
        }
    }

    /// Install a variable at the next free frame offset; returns the
    /// offset for the one after.
    fn var_decl(&mut self, offset: Word, level: usize) -> Word {
        let name = self.ident_name();
        if self.expect(&Token::Ident(String::new())) {
            if self.symtbl.defined_here(&name) {
                self.error(error!(Redefined; "'{}'", name));
                return offset;
            }
            self.symtbl.insert(&name, SymValue::Variable(offset));
            if self.verbose {
                println!(
                    "{}: var {}: level {}, offset {}",
                    self.progname, name, level, offset
                );
            }
            return offset + 1;
        }
        offset
    }

    /// `("procedure"|"function") ident "(" [ident {"," ident}] ")" block ";"`
    ///
    /// Parameters are bound at the callee's level with offsets
    /// -n..-1 in declaration order, so the first argument pushed
    /// lands at the lowest address.
    fn sub_decl(&mut self, level: usize) {
        let is_function = self.check(&Token::Function);
        self.next();
        let name = self.ident_name();
        if !self.expect(&Token::Ident(String::new())) {
            return;
        }
        if self.symtbl.defined_here(&name) {
            self.error(error!(Redefined; "'{}'", name));
        }
        let entry = if is_function {
            SymValue::Function { addr: 0, arity: 0 }
        } else {
            SymValue::Procedure { addr: 0, arity: 0 }
        };
        self.symtbl.insert(&name, entry);
        if self.verbose {
            println!(
                "{}: {} {}: level {}",
                self.progname,
                if is_function { "function" } else { "procedure" },
                name,
                level
            );
        }

        self.expect(&Token::LParen);
        let mut params: Vec<String> = vec![];
        if matches!(self.ts.current(), Token::Ident(_)) {
            loop {
                params.push(self.ident_name());
                self.next();
                if !self.accept(&Token::Comma) {
                    break;
                }
                if !matches!(self.ts.current(), Token::Ident(_)) {
                    let got = self.ts.current().clone();
                    self.error(error!(SyntaxError; "expected 'identifier' got '{}'", got));
                    break;
                }
            }
        }
        self.expect(&Token::RParen);
        self.symtbl.set_arity(&name, level, params.len());

        self.symtbl.open();
        let nargs = params.len();
        for (index, param) in params.iter().enumerate() {
            if self.symtbl.defined_here(param) {
                self.error(error!(Redefined; "'{}'", param));
                continue;
            }
            let offset = index as Word - nargs as Word;
            self.symtbl.insert(param, SymValue::Variable(offset));
        }
        self.block(&name, level, level + 1, nargs, is_function);
        self.expect(&Token::Semicolon);
    }

    fn statement(&mut self, level: usize) {
        if matches!(self.ts.current(), Token::Ident(_)) {
            self.ident_statement(level);
        } else if self.accept(&Token::Begin) {
            loop {
                self.statement(level);
                if !self.accept(&Token::Semicolon) {
                    break;
                }
            }
            self.expect(&Token::End);
        } else if self.accept(&Token::If) {
            self.condition(level);
            let skip = self.jump(Opcode::Jneq);
            self.expect(&Token::Then);
            self.statement(level);
            if self.accept(&Token::Else) {
                let done = self.jump(Opcode::Jump);
                self.patch(skip);
                self.statement(level);
                self.patch(done);
            } else {
                self.patch(skip);
            }
        } else if self.accept(&Token::While) {
            let head = self.code.len();
            self.condition(level);
            let exit = self.jump(Opcode::Jneq);
            self.expect(&Token::Do);
            self.statement(level);
            self.emit(Instr::with_addr(Opcode::Jump, head as Word));
            self.patch(exit);
        } else if self.accept(&Token::Repeat) {
            let head = self.code.len();
            self.statement(level);
            self.expect(&Token::Until);
            self.condition(level);
            self.emit(Instr::with_addr(Opcode::Jneq, head as Word));
        }
        // else: the empty statement
    }

    /// `ident "=" expr` or `ident "(" [expr {"," expr}] ")"`.
    fn ident_statement(&mut self, level: usize) {
        let name = self.ident_name();
        self.next();
        let symbol = self.symtbl.lookup(&name).map(|(l, v)| (l, v.clone()));
        let (sym_level, value) = match symbol {
            Some(entry) => entry,
            None => {
                self.error(error!(Undefined; "'{}'", name));
                return;
            }
        };
        if self.accept(&Token::Assign) {
            self.expression(level);
            match value {
                SymValue::Variable(offset) => {
                    let hops = (level - sym_level) as u8;
                    self.emit(Instr::with_level(Opcode::PushVar, hops, offset));
                    self.emit(Instr::new(Opcode::Assign));
                }
                SymValue::Function { .. } => {
                    // The return slot lives in the function's own
                    // frame, one level in from where its name is bound.
                    let hops = (level - sym_level - 1) as u8;
                    self.emit(Instr::with_level(Opcode::PushVar, hops, FRAME_RET_VAL));
                    self.emit(Instr::new(Opcode::Assign));
                }
                SymValue::Constant(_) => self.error(error!(AssignToConstant; "'{}'", name)),
                SymValue::Procedure { .. } => {
                    self.error(error!(AssignToProcedure; "'{}'", name))
                }
            }
        } else if self.check(&Token::LParen) {
            let nargs = self.arguments(level);
            match value {
                SymValue::Procedure { addr, arity } | SymValue::Function { addr, arity } => {
                    if nargs != arity {
                        self.error(
                            error!(WrongArguments; "'{}' takes {} got {}", name, arity, nargs),
                        );
                    }
                    let hops = (level - sym_level) as u8;
                    self.emit(Instr::with_level(Opcode::Call, hops, addr as Word));
                }
                _ => self.error(error!(NotAProcedure; "'{}'", name)),
            }
        } else {
            let got = self.ts.current().clone();
            self.error(error!(SyntaxError; "expected '=' or '(' got '{}'", got));
        }
    }

    fn condition(&mut self, level: usize) {
        if self.accept(&Token::Odd) {
            self.expression(level);
            self.emit(Instr::with_addr(Opcode::PushConst, 1));
            self.emit(Instr::new(Opcode::BAnd));
        } else {
            self.expression(level);
            let op = match self.ts.current() {
                Token::Equal => Some(Opcode::Equ),
                Token::NotEqual => Some(Opcode::Neq),
                Token::Less => Some(Opcode::Lt),
                Token::LessEqual => Some(Opcode::Lte),
                Token::Greater => Some(Opcode::Gt),
                Token::GreaterEqual => Some(Opcode::Gte),
                _ => None,
            };
            if let Some(op) = op {
                self.next();
                self.expression(level);
                self.emit(Instr::new(op));
            }
        }
    }

    fn expression(&mut self, level: usize) {
        let negate = matches!(self.ts.current(), Token::Subtract);
        if negate || matches!(self.ts.current(), Token::Add) {
            self.next();
        }
        self.term(level);
        if negate {
            self.emit(Instr::new(Opcode::Neg));
        }
        loop {
            let op = match self.ts.current() {
                Token::Add => Opcode::Add,
                Token::Subtract => Opcode::Sub,
                Token::BitOr => Opcode::BOr,
                Token::BitXor => Opcode::BXor,
                Token::Or => Opcode::LOr,
                _ => break,
            };
            self.next();
            self.term(level);
            self.emit(Instr::new(op));
        }
    }

    fn term(&mut self, level: usize) {
        self.factor(level);
        loop {
            let op = match self.ts.current() {
                Token::Multiply => Opcode::Mul,
                Token::Divide => Opcode::Div,
                Token::Modulo => Opcode::Rem,
                Token::BitAnd => Opcode::BAnd,
                Token::ShiftLeft => Opcode::LShift,
                Token::ShiftRight => Opcode::RShift,
                Token::And => Opcode::LAnd,
                _ => break,
            };
            self.next();
            self.factor(level);
            self.emit(Instr::new(op));
        }
    }

    fn factor(&mut self, level: usize) {
        if matches!(self.ts.current(), Token::Ident(_)) {
            self.ident_factor(level);
        } else if let Token::Number(value) = self.ts.current().clone() {
            self.emit(Instr::with_addr(Opcode::PushConst, value));
            self.next();
        } else if self.accept(&Token::LParen) {
            self.expression(level);
            self.expect(&Token::RParen);
        } else if self.accept(&Token::Not) {
            self.factor(level);
            self.emit(Instr::new(Opcode::Not));
        } else if self.accept(&Token::Complement) {
            self.factor(level);
            self.emit(Instr::new(Opcode::Comp));
        } else {
            let got = self.ts.current().clone();
            self.error(error!(SyntaxError; "expected a factor got '{}'", got));
            self.next();
        }
    }

    /// A constant, a variable read, or a function call as a value.
    fn ident_factor(&mut self, level: usize) {
        let name = self.ident_name();
        self.next();
        let symbol = self.symtbl.lookup(&name).map(|(l, v)| (l, v.clone()));
        match symbol {
            None => self.error(error!(Undefined; "'{}'", name)),
            Some((_, SymValue::Constant(value))) => {
                self.emit(Instr::with_addr(Opcode::PushConst, value));
            }
            Some((sym_level, SymValue::Variable(offset))) => {
                let hops = (level - sym_level) as u8;
                self.emit(Instr::with_level(Opcode::PushVar, hops, offset));
                self.emit(Instr::new(Opcode::Eval));
            }
            Some((sym_level, SymValue::Function { addr, arity })) => {
                let nargs = self.arguments(level);
                if nargs != arity {
                    self.error(error!(WrongArguments; "'{}' takes {} got {}", name, arity, nargs));
                }
                let hops = (level - sym_level) as u8;
                self.emit(Instr::with_level(Opcode::Call, hops, addr as Word));
            }
            Some((_, SymValue::Procedure { .. })) => {
                self.error(error!(NotAFunction; "'{}'", name));
                if self.check(&Token::LParen) {
                    self.arguments(level);
                }
            }
        }
    }

    /// `"(" [ expr { "," expr } ] ")"` pushing each argument
    /// left-to-right; returns the count for the arity check.
    fn arguments(&mut self, level: usize) -> usize {
        let mut nargs = 0;
        self.expect(&Token::LParen);
        if !self.check(&Token::RParen) {
            loop {
                self.expression(level);
                nargs += 1;
                if !self.accept(&Token::Comma) {
                    break;
                }
            }
        }
        self.expect(&Token::RParen);
        nargs
    }
}
