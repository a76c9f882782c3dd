// Shunting-Yard parser: three explicit stacks (operands, a unified
// operator/bracket/call-name stack, and open call-argument frames) plus
// parse-time macro definition/expansion.

use crate::ast::Ast;
use crate::error::ParseError;
use crate::functions::FunctionRegistry;
use crate::lexer::{self, TokenClass};
use crate::operators::{lookup_operator, should_pop_before_push, OpKind};
use crate::variables::VariableTable;

#[derive(Clone, Copy, PartialEq, Eq)]
enum ParenState {
    Allowed,
    Expected,
    Forbidden,
}

// An entry on the unified operator stack. Plain grouping parens and
// call-opening parens are distinguished (OpenParen vs CallOpen) because
// a ) must know whether it's closing a group or a call; the
// function/macro name sits just below its CallOpen marker.
enum StackEntry {
    Operator(OpKind),
    OpenParen,
    CallOpen,
    CallName(String),
}

struct ArgFrame {
    op_stack_len: usize,
    operand_stack_len: usize,
    args: Vec<Ast>,
}

struct MacroDef {
    name: String,
    body: Vec<Ast>,
}

pub struct Parser;

impl Parser {
    // Parses text into an AST. Identifiers become variables in vars on
    // first mention; $(...)-defined macros and (...) calls to names
    // found in funcs are expanded/bound inline.
    pub fn parse(
        text: &str,
        vars: &mut VariableTable,
        funcs: Option<&FunctionRegistry>,
    ) -> Result<Ast, ParseError> {
        log::debug!("parsing {} bytes", text.len());
        let mut session = ParseSession {
            input: text.as_bytes(),
            pos: 0,
            flags: lexer::initial_flags(),
            paren: ParenState::Allowed,
            vars,
            funcs,
            operands: Vec::new(),
            stack: Vec::new(),
            arg_frames: Vec::new(),
            macros: Vec::new(),
            pending_id: None,
        };
        let result = session.run();
        match &result {
            Ok(_) => log::trace!("parse succeeded"),
            Err(e) => log::debug!("parse failed: {e}"),
        }
        result
    }
}

struct ParseSession<'v, 'f> {
    input: &'v [u8],
    pos: usize,
    flags: lexer::Flags,
    paren: ParenState,
    vars: &'v mut VariableTable,
    funcs: Option<&'f FunctionRegistry>,
    operands: Vec<Ast>,
    stack: Vec<StackEntry>,
    arg_frames: Vec<ArgFrame>,
    macros: Vec<MacroDef>,
    pending_id: Option<String>,
}

impl<'v, 'f> ParseSession<'v, 'f> {
    fn run(&mut self) -> Result<Ast, ParseError> {
        loop {
            let n = lexer::next_token(&self.input[self.pos..], &mut self.flags)?;
            if n == 0 {
                break;
            }
            let tok = &self.input[self.pos..self.pos + n];
            self.pos += n;

            if tok[0] == b'#' {
                continue;
            }

            let unary_override = if self.flags.contains(TokenClass::Unary) && n == 1 {
                match tok[0] {
                    b'-' => Some(OpKind::NegUnary),
                    b'^' => Some(OpKind::BitNotUnary),
                    b'!' => Some(OpKind::NotUnary),
                    _ => None,
                }
            } else {
                None
            };

            let comma_override = tok[0] == b'\n' && self.flags.contains(TokenClass::Comma);
            if comma_override {
                self.flags.remove(TokenClass::Comma);
            }

            if !comma_override && lexer::is_space(tok[0]) {
                continue;
            }

            let mut paren_next = ParenState::Allowed;

            if let Some(id) = self.pending_id.take() {
                if n == 1 && tok[0] == b'(' {
                    let is_callable = id == "$"
                        || self.macros.iter().any(|m| m.name == id)
                        || self.funcs.map_or(false, |f| f.lookup(&id).is_some());
                    if is_callable {
                        self.stack.push(StackEntry::CallName(id));
                        self.paren = ParenState::Expected;
                    } else {
                        return Err(ParseError::UnknownFunction(id));
                    }
                } else {
                    let slot = self.vars.lookup_or_create(&id);
                    self.operands.push(Ast::Var(slot));
                    self.paren = ParenState::Forbidden;
                }
            }

            let resolved_op = if comma_override {
                Some(OpKind::Comma)
            } else if let Some(k) = unary_override {
                Some(k)
            } else {
                lookup_operator(tok, None)
            };

            if n == 1 && tok[0] == b'(' {
                match self.paren {
                    ParenState::Expected => {
                        self.stack.push(StackEntry::CallOpen);
                        self.arg_frames.push(ArgFrame {
                            op_stack_len: self.stack.len(),
                            operand_stack_len: self.operands.len(),
                            args: Vec::new(),
                        });
                    }
                    ParenState::Allowed => {
                        self.stack.push(StackEntry::OpenParen);
                    }
                    ParenState::Forbidden => return Err(ParseError::CallNotAllowed),
                }
            } else if self.paren == ParenState::Expected {
                return Err(ParseError::CallNotAllowed);
            } else if n == 1 && tok[0] == b')' {
                self.close_paren_or_call()?;
                paren_next = ParenState::Forbidden;
            } else if tok[0].is_ascii_digit() {
                let num = crate::operators::parse_number(tok);
                if !num.is_nan() {
                    self.operands.push(Ast::ConstNum(num));
                    paren_next = ParenState::Forbidden;
                } else {
                    return Err(ParseError::IllegalIdentifier);
                }
            } else if tok[0] == b'"' || tok[0] == b'\'' {
                self.operands.push(Ast::ConstStr(string_literal_contents(tok)));
                paren_next = ParenState::Forbidden;
            } else if let Some(op) = resolved_op {
                self.push_operator(op, comma_override || (n == 1 && tok[0] == b','))?;
            } else {
                self.pending_id = Some(String::from_utf8_lossy(tok).into_owned());
            }

            self.paren = paren_next;
        }

        if let Some(id) = self.pending_id.take() {
            let slot = self.vars.lookup_or_create(&id);
            self.operands.push(Ast::Var(slot));
        }

        while let Some(entry) = self.stack.pop() {
            match entry {
                StackEntry::Operator(op) => self.bind_operator(op)?,
                // A '(' or a call that never saw its ')' ran off the end
                // of the input rather than being mismatched against some
                // other bracket.
                StackEntry::OpenParen | StackEntry::CallOpen => return Err(ParseError::UnexpectedEof),
                StackEntry::CallName(_) => return Err(ParseError::MismatchedParens),
            }
        }

        Ok(self.operands.pop().unwrap_or(Ast::ConstNum(0.0)))
    }

    fn push_operator(&mut self, op: OpKind, is_comma: bool) -> Result<(), ParseError> {
        loop {
            if is_comma {
                if let Some(StackEntry::CallOpen) = self.stack.last() {
                    let e = self.operands.pop().ok_or(ParseError::MismatchedParens)?;
                    self.arg_frames
                        .last_mut()
                        .ok_or(ParseError::MismatchedParens)?
                        .args
                        .push(e);
                    return Ok(());
                }
            }
            let top_op = match self.stack.last() {
                Some(StackEntry::Operator(k)) => Some(*k),
                _ => None,
            };
            match top_op {
                Some(top) if should_pop_before_push(op, top) => {
                    self.bind_operator(top)?;
                    self.stack.pop();
                }
                _ => {
                    self.stack.push(StackEntry::Operator(op));
                    return Ok(());
                }
            }
        }
    }

    fn bind_operator(&mut self, op: OpKind) -> Result<(), ParseError> {
        if op.is_unary() {
            let a = self.operands.pop().ok_or(ParseError::MismatchedParens)?;
            self.operands.push(Ast::Op(op, vec![a]));
        } else {
            let b = self.operands.pop().ok_or(ParseError::MismatchedParens)?;
            let a = self.operands.pop().ok_or(ParseError::MismatchedParens)?;
            if op == OpKind::Assign && !matches!(a, Ast::Var(_)) {
                return Err(ParseError::BadAssignmentTarget);
            }
            self.operands.push(Ast::Op(op, vec![a, b]));
        }
        Ok(())
    }

    fn close_paren_or_call(&mut self) -> Result<(), ParseError> {
        let minlen = self.arg_frames.last().map(|f| f.op_stack_len).unwrap_or(0);
        while self.stack.len() > minlen {
            match self.stack.last() {
                Some(StackEntry::OpenParen) | Some(StackEntry::CallOpen) => break,
                _ => {}
            }
            match self.stack.pop().unwrap() {
                StackEntry::Operator(op) => self.bind_operator(op)?,
                _ => unreachable!("loop guard only lets operators through"),
            }
        }
        match self.stack.pop().ok_or(ParseError::MismatchedParens)? {
            StackEntry::OpenParen => Ok(()),
            StackEntry::CallOpen => {
                let name = match self.stack.pop().ok_or(ParseError::MismatchedParens)? {
                    StackEntry::CallName(name) => name,
                    _ => return Err(ParseError::MismatchedParens),
                };
                let mut frame = self.arg_frames.pop().ok_or(ParseError::MismatchedParens)?;
                if self.operands.len() > frame.operand_stack_len {
                    let trailing = self.operands.pop().unwrap();
                    frame.args.push(trailing);
                }
                self.close_call(&name, frame.args)
            }
            StackEntry::Operator(_) | StackEntry::CallName(_) => Err(ParseError::MismatchedParens),
        }
    }

    fn close_call(&mut self, name: &str, args: Vec<Ast>) -> Result<(), ParseError> {
        if name == "$" {
            if args.is_empty() {
                return Err(ParseError::EmptyMacroDefinition);
            }
            let macro_name = match &args[0] {
                Ast::Var(slot) => slot.borrow().name.clone(),
                _ => return Err(ParseError::MacroFirstArgNotVariable),
            };
            log::trace!("defining macro {macro_name}");
            self.macros.push(MacroDef {
                name: macro_name,
                body: args,
            });
            self.operands.push(Ast::ConstNum(0.0));
            return Ok(());
        }

        if let Some(pos) = self.macros.iter().position(|m| m.name == name) {
            // Positional parameters ($1, $2, ...) are ordinary entries in
            // the shared variable table, not a private binding per
            // expansion — two nested or sequential calls to the same
            // macro alias each other's $N slots. Preserved verbatim.
            let body_len = self.macros[pos].body.len();
            let body: Vec<Ast> = (0..body_len)
                .map(|i| self.macros[pos].body[i].clone())
                .collect();
            let expansion = self.expand_macro(&body, args);
            self.operands.push(expansion);
            return Ok(());
        }

        let entry = self
            .funcs
            .and_then(|f| f.lookup(name))
            .ok_or_else(|| ParseError::UnknownFunction(name.to_string()))?;
        self.operands.push(Ast::func(entry, args));
        Ok(())
    }

    fn expand_macro(&mut self, body: &[Ast], call_args: Vec<Ast>) -> Ast {
        let mut items = Vec::with_capacity(call_args.len() + body.len().saturating_sub(1));
        for (j, arg) in call_args.into_iter().enumerate() {
            let pname = format!("${}", j + 1);
            let slot = self.vars.lookup_or_create(&pname);
            items.push(Ast::Op(OpKind::Assign, vec![Ast::Var(slot), arg]));
        }
        // body[0] is the name placeholder used only to name the macro at
        // definition time; the body proper starts at index 1.
        for expr in &body[1..] {
            items.push(expr.clone());
        }
        build_comma_chain(items)
    }
}

fn build_comma_chain(mut items: Vec<Ast>) -> Ast {
    match items.len() {
        0 => Ast::ConstNum(0.0),
        _ => {
            let last = items.pop().unwrap();
            items
                .into_iter()
                .rev()
                .fold(last, |acc, item| Ast::Op(OpKind::Comma, vec![item, acc]))
        }
    }
}

// Strips the surrounding quote characters from a string token's raw
// bytes. Lossy on non-UTF-8 byte sequences, consistent with the rest of
// the crate treating word/string bytes as an opaque byte-oriented
// charset rather than validated Unicode.
fn string_literal_contents(tok: &[u8]) -> String {
    let inner = if tok.len() < 2 { &tok[0..0] } else { &tok[1..tok.len() - 1] };
    String::from_utf8_lossy(inner).into_owned()
}
