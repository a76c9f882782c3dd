// The expression tree produced by the parser and walked by the evaluator.

use std::cell::RefCell;
use std::rc::Rc;

use crate::functions::FunctionEntry;
use crate::operators::OpKind;
use crate::variables::VarHandle;

// Op's children live in a Vec rather than a fixed-size array since unary
// and binary operators share one variant; OpKind::arity() says how many.
#[derive(Debug)]
pub enum Ast {
    ConstNum(f32),
    ConstStr(String),
    Var(VarHandle),
    Op(OpKind, Vec<Ast>),
    Func(Rc<FunctionEntry>, Vec<Ast>, RefCell<Vec<u8>>),
}

impl Ast {
    pub fn func(entry: Rc<FunctionEntry>, args: Vec<Ast>) -> Ast {
        let context = RefCell::new(vec![0u8; entry.context_size]);
        Ast::Func(entry, args, context)
    }
}

// Runs the function's cleanup callback, if any, on its context buffer
// before the node's fields drop. Vec<Ast> drops its elements on its own,
// so nested calls clean up bottom-up without any recursion written here.
impl Drop for Ast {
    fn drop(&mut self) {
        if let Ast::Func(entry, _args, context) = self {
            entry.run_cleanup(context.get_mut());
        }
    }
}

// A macro expansion needs its own copy of the macro body per call site.
// Var and Func's callback are shared (Rc::clone); Func's context buffer
// is freshly zeroed per copy so two expansions never share call state.
impl Clone for Ast {
    fn clone(&self) -> Self {
        match self {
            Ast::ConstNum(n) => Ast::ConstNum(*n),
            Ast::ConstStr(s) => Ast::ConstStr(s.clone()),
            Ast::Var(slot) => Ast::Var(slot.clone()),
            Ast::Op(kind, args) => Ast::Op(*kind, args.clone()),
            Ast::Func(entry, args, _context) => Ast::func(entry.clone(), args.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variables::VariableTable;

    #[test]
    fn cloning_a_var_node_shares_the_slot() {
        let mut vars = VariableTable::new();
        let handle = vars.lookup_or_create("x");
        let node = Ast::Var(handle.clone());
        let cloned = node.clone();
        if let (Ast::Var(a), Ast::Var(b)) = (&node, &cloned) {
            assert!(Rc::ptr_eq(a, b));
        } else {
            panic!("expected Var nodes");
        }
    }

    #[test]
    fn cloning_a_func_node_gets_a_fresh_zeroed_context() {
        let entry = Rc::new(FunctionEntry::new("f", 4, |_args, _ctx| 0.0));
        let node = Ast::func(entry, vec![]);
        if let Ast::Func(_, _, ctx) = &node {
            ctx.borrow_mut()[0] = 7;
        }
        let cloned = node.clone();
        if let Ast::Func(_, _, ctx) = &cloned {
            assert_eq!(ctx.borrow()[0], 0);
        } else {
            panic!("expected Func node");
        }
    }
}
