// exprlang: embeddable infix expression language.
//
// Copyright (C) 2019  Brandon Lewis
//
// This program is free software: you can redistribute it and/or
// modify it under the terms of the GNU Lesser General Public License
// as published by the Free Software Foundation, either version 3 of
// the License, or (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU
// Lesser General Public License for more details.
//
// You should have received a copy of the GNU Lesser General Public
// License along with this program.  If not, see
// <https://www.gnu.org/licenses/>.

// Tokenizer, Shunting-Yard parser, and tree-walking evaluator, with
// parse-time macro expansion and a host-function callback registry.

pub mod ast;
pub mod error;
pub mod eval;
pub mod functions;
pub mod lexer;
pub mod operators;
pub mod parser;
pub mod value;
pub mod variables;

pub use ast::Ast;
pub use error::{EvalError, LexError, ParseError};
pub use eval::{eval, eval_with, EvalOptions};
pub use functions::{FunctionEntry, FunctionRegistry};
pub use parser::Parser;
pub use value::Value;
pub use variables::{VarHandle, VariableTable};
