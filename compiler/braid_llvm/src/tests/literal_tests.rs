use inkwell::context::Context;

use super::helper::{compile_ok, jit_main_f64, jit_main_i32, IrBuilder};
use crate::context::Emitter;

#[test]
fn int_literal_program() {
    // 42  ->  main returns i32 42
    let mut b = IrBuilder::new();
    let body = b.int(42);
    let ir = b.main_with(body, vec![], vec![]);

    let context = Context::create();
    let module = compile_ok(&context, &ir);

    let text = module.print_to_string().to_string();
    assert!(text.contains("ret i32 42"), "missing literal return:\n{text}");
    assert_eq!(jit_main_i32(&module), 42);
}

#[test]
fn float_literal_program() {
    let mut b = IrBuilder::new();
    let body = b.float(2.5);
    let ir = b.main_with(body, vec![], vec![]);

    let context = Context::create();
    let module = compile_ok(&context, &ir);
    assert_eq!(jit_main_f64(&module), 2.5);
}

#[test]
fn negative_int_literal() {
    let mut b = IrBuilder::new();
    let body = b.int(-7);
    let ir = b.main_with(body, vec![], vec![]);

    let context = Context::create();
    let module = compile_ok(&context, &ir);
    assert_eq!(jit_main_i32(&module), -7);
}

#[test]
fn pure_left_of_seq_is_elided() {
    // "dead"; 42: the string literal is pure, so no global is defined.
    let mut b = IrBuilder::new();
    let dead = b.str_("dead");
    let live = b.int(42);
    let body = b.seq(dead, live);
    let ir = b.main_with(body, vec![], vec![]);

    let context = Context::create();
    let module = compile_ok(&context, &ir);
    assert!(module.get_global("str.0").is_none());
    assert_eq!(jit_main_i32(&module), 42);
}

#[test]
fn string_literals_become_private_constant_globals() {
    let mut b = IrBuilder::new();
    let lit = b.str_("hello");
    let ir = b.main_raw(lit, vec![], vec![]);

    let context = Context::create();
    let module = context.create_module("strlit");
    let mut emitter = Emitter::new(&context, module, &ir, None);

    let fn_ty = context.i32_type().fn_type(&[], false);
    let function = emitter.module.add_function("t", fn_ty, None);
    let entry = context.append_basic_block(function, "entry");
    emitter
        .with_scope_state(entry, |this| {
            this.emit_expr(lit)?;
            let zero = this.context.i32_type().const_int(0, false);
            this.builder.build_return(Some(&zero))?;
            Ok(())
        })
        .expect("emission failed");

    let global = emitter.module.get_global("str.0").expect("global missing");
    assert!(global.is_constant());
    // "hello" plus the trailing NUL.
    let text = emitter.module.print_to_string().to_string();
    assert!(text.contains("[6 x i8]"), "unexpected global shape:\n{text}");
}
