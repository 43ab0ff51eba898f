
//! Turns a single construction's byte-code into a callable native function.
//!
//! Only constructions closed by an *immediate* `;` go through here: their body must run at
//! compile time, so it is lowered to LLVM IR, optimised, and JIT-compiled into a function the
//! compiler can call directly.  Non-immediate words never reach this module; they are handed to
//! `add_script_word` instead and never executed by the compiler (see `lang::compilation`).
//!
//! The generated function takes no arguments and returns `0` on success, non-zero on failure.
//! It talks to the interpreter exclusively through a fixed set of C-ABI helper trampolines
//! (`handle_*`), resolved against the interpreter the wrapper closure is currently running
//! against via a thread-local "current interpreter" cell -- the same role `this` would play in
//! hand-written C, and the mechanism by which JITed code can call back into safe Rust.

use std::{ cell::{ Cell, RefCell }, collections::HashMap, rc::Rc };

use inkwell::{ context::Context,
               execution_engine::ExecutionEngine,
               module::Module,
               values::FunctionValue,
               AddressSpace,
               OptimizationLevel };

use crate::{ lang::{ code::Op,
                     compilation::{ Construction, ContextManagement, ExecutionContext } },
             runtime::{ data_structures::value::Value,
                        error::{ self, ScriptError },
                        interpreter::{ Interpreter, NativeHandler } } };



thread_local!
{
    /// The interpreter the currently-executing JITed function is running against.  Set by the
    /// handler wrapper immediately before invoking the native function, cleared on return.
    static CURRENT_INTERPRETER: Cell<Option<*mut dyn Interpreter>> = Cell::new(None);

    /// Per-instruction source locations for the currently-executing JITed function, indexed the
    /// same way `handle_set_location`'s operand indexes them.
    static CURRENT_LOCATIONS: RefCell<Rc<Vec<Option<crate::lang::source_buffer::SourceLocation>>>> =
        RefCell::new(Rc::new(Vec::new()));

    /// The "last exception" slot: cleared before every call into JITed code, and inspected by
    /// the wrapper closure after the call returns non-zero.
    static LAST_EXCEPTION: RefCell<Option<String>> = RefCell::new(None);

    /// Constants too complex to inline directly into IR (`None`, byte-code blocks), indexed the
    /// same way `handle_push_value`'s operand indexes them. Built once per construction by
    /// `build_function` and installed here for the duration of a call.
    static CURRENT_CONSTANTS: RefCell<Rc<Vec<Value>>> = RefCell::new(Rc::new(Vec::new()));
}


fn with_interpreter<R>(action: impl FnOnce(&mut dyn Interpreter) -> R) -> R
{
    CURRENT_INTERPRETER.with(|cell|
        {
            let pointer = cell.get().expect("JIT helper called outside of a JITed invocation");

            // SAFETY: the wrapper closure in `Jit::compile_immediate`'s result guarantees this
            // pointer is valid and uniquely borrowed for the duration of the native call.
            let interpreter = unsafe { &mut *pointer };

            action(interpreter)
        })
}


fn fail(message: String) -> i64
{
    LAST_EXCEPTION.with(|cell| *cell.borrow_mut() = Some(message));
    1
}


fn succeed() -> i64
{
    0
}


fn str_from_raw(ptr: *const u8, len: i64) -> String
{
    // SAFETY: the generated IR only ever passes pointers/lengths taken from an LLVM global
    // string constant baked into the same module, so the slice is always valid UTF-8 data of
    // the given length for the lifetime of the call.
    unsafe
    {
        let slice = std::slice::from_raw_parts(ptr, len as usize);
        String::from_utf8_lossy(slice).into_owned()
    }
}


extern "C" fn handle_set_location(index: i64) -> i64
{
    let location = CURRENT_LOCATIONS.with(|cell| cell.borrow().get(index as usize).cloned());

    if let Some(Some(location)) = location
    {
        with_interpreter(|interpreter| interpreter.set_current_location(Some(location)));
    }

    succeed()
}

extern "C" fn handle_manage_context(is_mark: i64) -> i64
{
    with_interpreter(|interpreter|
        {
            if is_mark != 0 { interpreter.mark_context(); } else { interpreter.release_context(); }
        });

    succeed()
}

extern "C" fn handle_define_variable() -> i64
{
    with_interpreter(|interpreter|
        {
            match interpreter.pop()
            {
                Ok(initial) =>
                    {
                        let index = interpreter.define_variable(initial);
                        interpreter.push(Value::Int(index as i64));
                        succeed()
                    },
                Err(error) => fail(error.to_string())
            }
        })
}

extern "C" fn handle_define_constant() -> i64
{
    with_interpreter(|interpreter|
        {
            match interpreter.pop()
            {
                Ok(value) =>
                    {
                        let index = interpreter.define_constant(value);
                        interpreter.push(Value::Int(index as i64));
                        succeed()
                    },
                Err(error) => fail(error.to_string())
            }
        })
}

extern "C" fn handle_read_variable() -> i64
{
    with_interpreter(|interpreter|
        {
            match interpreter.pop_as_usize().and_then(|index| interpreter.read_variable(index))
            {
                Ok(value) => { interpreter.push(value); succeed() },
                Err(error) => fail(error.to_string())
            }
        })
}

extern "C" fn handle_write_variable() -> i64
{
    with_interpreter(|interpreter|
        {
            let result = (|| -> error::Result<()>
                {
                    let index = interpreter.pop_as_usize()?;
                    let value = interpreter.pop()?;

                    interpreter.write_variable(index, value)
                })();

            match result
            {
                Ok(()) => succeed(),
                Err(error) => fail(error.to_string())
            }
        })
}

/// Returns `-1` on error, else `0`/`1` for the popped boolean.
extern "C" fn handle_pop_bool() -> i64
{
    with_interpreter(|interpreter|
        {
            match interpreter.pop_as_bool()
            {
                Ok(value) => if value { 1 } else { 0 },
                Err(error) => { fail(error.to_string()); -1 }
            }
        })
}

extern "C" fn handle_push_bool(value: i64) -> i64
{
    with_interpreter(|interpreter| interpreter.push(Value::Bool(value != 0)));
    succeed()
}

extern "C" fn handle_push_int(value: i64) -> i64
{
    with_interpreter(|interpreter| interpreter.push(Value::Int(value)));
    succeed()
}

extern "C" fn handle_push_double(value: f64) -> i64
{
    with_interpreter(|interpreter| interpreter.push(Value::Float(value)));
    succeed()
}

extern "C" fn handle_push_string(ptr: *const u8, len: i64) -> i64
{
    let text = str_from_raw(ptr, len);
    with_interpreter(|interpreter| interpreter.push(Value::String(text)));
    succeed()
}

extern "C" fn handle_push_value(index: i64) -> i64
{
    let value = CURRENT_CONSTANTS.with(|cell| cell.borrow().get(index as usize).cloned());

    match value
    {
        Some(value) => { with_interpreter(|interpreter| interpreter.push(value)); succeed() },
        None => fail(format!("Constant index {} out of range.", index))
    }
}

extern "C" fn handle_push_last_exception() -> i64
{
    let message = LAST_EXCEPTION.with(|cell| cell.borrow_mut().take())
                                .unwrap_or_else(|| "Unknown error.".to_string());

    with_interpreter(|interpreter| interpreter.push(Value::String(message)));
    succeed()
}

extern "C" fn handle_word_execute_name(ptr: *const u8, len: i64) -> i64
{
    let name = str_from_raw(ptr, len);

    with_interpreter(|interpreter|
        {
            let location = interpreter.current_location().clone();

            match interpreter.execute_word_named(&location, &name)
            {
                Ok(()) => succeed(),
                Err(error) => fail(error.to_string())
            }
        })
}

extern "C" fn handle_word_execute_index(index: i64) -> i64
{
    with_interpreter(|interpreter|
        {
            let location = interpreter.current_location().clone();

            match interpreter.execute_word_index(&location, index as usize)
            {
                Ok(()) => succeed(),
                Err(error) => fail(error.to_string())
            }
        })
}

extern "C" fn handle_word_index_name(ptr: *const u8, len: i64) -> i64
{
    let name = str_from_raw(ptr, len);

    with_interpreter(|interpreter|
        {
            match interpreter.find_word(&name)
            {
                Some(word) => { interpreter.push(Value::Int(word.handler_index as i64)); succeed() },
                None => fail(format!("Word {} not found.", name))
            }
        })
}

extern "C" fn handle_word_exists_name(ptr: *const u8, len: i64) -> i64
{
    let name = str_from_raw(ptr, len);

    with_interpreter(|interpreter|
        {
            let found = interpreter.find_word(&name).is_some();
            interpreter.push(Value::Bool(found));
        });

    succeed()
}



/// Compile-time bookkeeping for `mark_loop_exit`/`unmark_loop_exit`: the active loop's start and
/// exit basic blocks, addressed by `jump_loop_start`/`jump_loop_exit`.
struct LoopMarker<'ctx>
{
    start: inkwell::basic_block::BasicBlock<'ctx>,
    exit: inkwell::basic_block::BasicBlock<'ctx>
}


/// Mangle a word name into a valid LLVM identifier, per the naming scheme in the specification.
fn mangle_name(name: &str, unique: usize) -> String
{
    let mut mangled = String::new();

    for character in name.chars()
    {
        match character
        {
            '@' => mangled.push_str("_at_"),
            '\'' => mangled.push_str("_prime_"),
            '"' => mangled.push_str("_quote_"),
            '%' => mangled.push_str("_percent_"),
            '!' => mangled.push_str("_bang_"),
            '?' => mangled.push_str("_question_"),
            c if c.is_ascii_alphanumeric() || c == '_' => mangled.push(c),
            _ => mangled.push('_')
        }
    }

    format!("{}_{}", mangled, unique)
}



pub struct Jit
{
    context: Context,
    unique: usize
}


impl Jit
{
    pub fn new() -> Jit
    {
        Jit { context: Context::create(), unique: 0 }
    }

    /// Lower `construction`'s byte-code to LLVM IR, optimise it, JIT it, and wrap the resulting
    /// function in a `NativeHandler` closure that manages context and last-exception
    /// propagation around the call.
    pub fn compile_immediate(&mut self, construction: &Construction) -> error::Result<NativeHandler>
    {
        self.unique += 1;

        let mangled = mangle_name(&construction.name, self.unique);
        let module = self.context.create_module(&mangled);

        let execution_engine = module.create_jit_execution_engine(OptimizationLevel::Aggressive)
            .map_err(|error| ScriptError::new(Some(construction.location.clone()),
                                              format!("JIT engine creation failed: {}", error),
                                              None))?;

        let helpers = declare_helpers(&self.context, &module);
        bind_helpers(&execution_engine, &helpers);

        let mut constants: Vec<Value> = Vec::new();
        let function = build_function(&self.context, &module, &helpers, &mangled,
                                      &construction.code, &mut constants)?;

        run_optimizer(&module).map_err(|error|
            ScriptError::new(Some(construction.location.clone()),
                             format!("Optimization pass pipeline failed: {}", error), None))?;

        execution_engine.verify().map_err(|error|
            ScriptError::new(Some(construction.location.clone()),
                             format!("LLVM module verification failed: {}", error),
                             None))?;

        let address = unsafe { execution_engine.get_function_address(&mangled) }
            .map_err(|error| ScriptError::new(Some(construction.location.clone()),
                                              format!("JIT symbol lookup failed: {}", error),
                                              None))?;

        let _ = function;

        let locations: Rc<Vec<Option<crate::lang::source_buffer::SourceLocation>>> =
            Rc::new(construction.code.iter().map(|instruction| instruction.location.clone()).collect());

        let constants: Rc<Vec<Value>> = Rc::new(constants);

        let managed = construction.context_management == crate::lang::compilation::ContextManagement::Managed
                      && construction.execution_context == ExecutionContext::CompileTime;

        // Keeping `execution_engine` alive for the lifetime of the closure keeps `address`
        // valid; the closure is stored in the dictionary's handler table, which is itself
        // append-only and immortal for the life of the compiler process.
        let handler: NativeHandler = Rc::new(move |interpreter: &mut dyn Interpreter| -> error::Result<()>
            {
                let _keep_alive = &execution_engine;

                let raw_fn: unsafe extern "C" fn() -> i64 = unsafe { std::mem::transmute(address) };

                LAST_EXCEPTION.with(|cell| *cell.borrow_mut() = None);
                CURRENT_LOCATIONS.with(|cell| *cell.borrow_mut() = locations.clone());
                CURRENT_CONSTANTS.with(|cell| *cell.borrow_mut() = constants.clone());

                if managed
                {
                    interpreter.mark_context();
                }

                CURRENT_INTERPRETER.with(|cell| cell.set(Some(interpreter as *mut dyn Interpreter)));
                let result = unsafe { raw_fn() };
                CURRENT_INTERPRETER.with(|cell| cell.set(None));

                if managed
                {
                    interpreter.release_context();
                }

                if result != 0
                {
                    let message = LAST_EXCEPTION.with(|cell| cell.borrow_mut().take())
                                                .unwrap_or_else(|| "JIT word failed.".to_string());

                    error::script_error(interpreter, message)
                }
                else
                {
                    Ok(())
                }
            });

        Ok(handler)
    }
}


struct Helpers<'ctx>
{
    set_location: FunctionValue<'ctx>,
    manage_context: FunctionValue<'ctx>,
    define_variable: FunctionValue<'ctx>,
    define_constant: FunctionValue<'ctx>,
    read_variable: FunctionValue<'ctx>,
    write_variable: FunctionValue<'ctx>,
    pop_bool: FunctionValue<'ctx>,
    push_bool: FunctionValue<'ctx>,
    push_int: FunctionValue<'ctx>,
    push_double: FunctionValue<'ctx>,
    push_string: FunctionValue<'ctx>,
    push_value: FunctionValue<'ctx>,
    push_last_exception: FunctionValue<'ctx>,
    word_execute_name: FunctionValue<'ctx>,
    word_execute_index: FunctionValue<'ctx>,
    word_index_name: FunctionValue<'ctx>,
    word_exists_name: FunctionValue<'ctx>
}


fn declare_helpers<'ctx>(context: &'ctx Context, module: &Module<'ctx>) -> Helpers<'ctx>
{
    let i64_type = context.i64_type();
    let f64_type = context.f64_type();
    let ptr_type = context.ptr_type(AddressSpace::default());

    let i64_i64 = i64_type.fn_type(&[ i64_type.into() ], false);
    let i64_void = i64_type.fn_type(&[], false);
    let i64_f64 = i64_type.fn_type(&[ f64_type.into() ], false);
    let i64_str = i64_type.fn_type(&[ ptr_type.into(), i64_type.into() ], false);

    Helpers
    {
        set_location: module.add_function("handle_set_location", i64_i64, None),
        manage_context: module.add_function("handle_manage_context", i64_i64, None),
        define_variable: module.add_function("handle_define_variable", i64_void, None),
        define_constant: module.add_function("handle_define_constant", i64_void, None),
        read_variable: module.add_function("handle_read_variable", i64_void, None),
        write_variable: module.add_function("handle_write_variable", i64_void, None),
        pop_bool: module.add_function("handle_pop_bool", i64_void, None),
        push_bool: module.add_function("handle_push_bool", i64_i64, None),
        push_int: module.add_function("handle_push_int", i64_i64, None),
        push_double: module.add_function("handle_push_double", i64_f64, None),
        push_string: module.add_function("handle_push_string", i64_str, None),
        push_value: module.add_function("handle_push_value", i64_i64, None),
        push_last_exception: module.add_function("handle_push_last_exception", i64_void, None),
        word_execute_name: module.add_function("handle_word_execute_name", i64_str, None),
        word_execute_index: module.add_function("handle_word_execute_index", i64_i64, None),
        word_index_name: module.add_function("handle_word_index_name", i64_str, None),
        word_exists_name: module.add_function("handle_word_exists_name", i64_str, None)
    }
}


fn bind_helpers(execution_engine: &ExecutionEngine, helpers: &Helpers)
{
    execution_engine.add_global_mapping(&helpers.set_location, handle_set_location as usize);
    execution_engine.add_global_mapping(&helpers.manage_context, handle_manage_context as usize);
    execution_engine.add_global_mapping(&helpers.define_variable, handle_define_variable as usize);
    execution_engine.add_global_mapping(&helpers.define_constant, handle_define_constant as usize);
    execution_engine.add_global_mapping(&helpers.read_variable, handle_read_variable as usize);
    execution_engine.add_global_mapping(&helpers.write_variable, handle_write_variable as usize);
    execution_engine.add_global_mapping(&helpers.pop_bool, handle_pop_bool as usize);
    execution_engine.add_global_mapping(&helpers.push_bool, handle_push_bool as usize);
    execution_engine.add_global_mapping(&helpers.push_int, handle_push_int as usize);
    execution_engine.add_global_mapping(&helpers.push_double, handle_push_double as usize);
    execution_engine.add_global_mapping(&helpers.push_string, handle_push_string as usize);
    execution_engine.add_global_mapping(&helpers.push_value, handle_push_value as usize);
    execution_engine.add_global_mapping(&helpers.push_last_exception, handle_push_last_exception as usize);
    execution_engine.add_global_mapping(&helpers.word_execute_name, handle_word_execute_name as usize);
    execution_engine.add_global_mapping(&helpers.word_execute_index, handle_word_execute_index as usize);
    execution_engine.add_global_mapping(&helpers.word_index_name, handle_word_index_name as usize);
    execution_engine.add_global_mapping(&helpers.word_exists_name, handle_word_exists_name as usize);
}


fn build_function<'ctx>(context: &'ctx Context,
                        module: &Module<'ctx>,
                        helpers: &Helpers<'ctx>,
                        name: &str,
                        code: &crate::lang::code::ByteCode,
                        constants: &mut Vec<Value>) -> error::Result<FunctionValue<'ctx>>
{
    let i64_type = context.i64_type();
    let fn_type = i64_type.fn_type(&[], false);
    let function = module.add_function(name, fn_type, None);
    let builder = context.create_builder();

    // One basic block per instruction (the simplest realisation of the "allocate blocks for
    // leaders" pass), plus two fixed blocks for the happy and unhappy exits.
    let blocks: Vec<_> = (0..code.len())
        .map(|index| context.append_basic_block(function, &format!("instr_{}", index)))
        .collect();

    let exit_ok = context.append_basic_block(function, "exit_ok");
    let exit_err = context.append_basic_block(function, "exit_err");

    let entry = context.append_basic_block(function, "entry");
    builder.position_at_end(entry);

    if code.is_empty()
    {
        builder.build_unconditional_branch(exit_ok).ok();
    }
    else
    {
        builder.build_unconditional_branch(blocks[0]).ok();
    }

    let mut loop_stack: Vec<LoopMarker> = Vec::new();
    let mut catch_stack: Vec<inkwell::basic_block::BasicBlock> = Vec::new();

    // Every `jump_target` a `mark_catch` resolves to, recorded once up front so that
    // `handle_push_last_exception` is emitted for it regardless of whether the catch region
    // has already been closed by `unmark_catch` by the time we reach the target in instruction
    // order (the usual shape: mark_catch, body, unmark_catch, jump past, jump_target <handler>).
    let mut catch_targets: std::collections::HashSet<usize> = std::collections::HashSet::new();

    for ( mark_index, instruction ) in code.iter().enumerate()
    {
        if let Op::MarkCatch(Value::Int(offset)) = &instruction.op
        {
            let target = mark_index as i64 + offset;

            if target >= 0 && (target as usize) < code.len()
            {
                catch_targets.insert(target as usize);
            }
        }
    }

    for ( index, instruction ) in code.iter().enumerate()
    {
        builder.position_at_end(blocks[index]);

        let next_block = blocks.get(index + 1).copied().unwrap_or(exit_ok);
        let error_target = catch_stack.last().copied().unwrap_or(exit_err);

        if instruction.location.is_some()
        {
            // `handle_set_location` always returns success, so this is a plain call with no
            // branch: the builder stays in `blocks[index]` for the instruction's own IR below.
            let location_index = i64_type.const_int(index as u64, false);
            builder.build_call(helpers.set_location, &[ location_index.into() ], "call").ok();
        }

        match &instruction.op
        {
            Op::DefVariable(_) =>
                emit_checked_call(&builder, helpers.define_variable, &[], next_block, error_target),

            Op::DefConstant(_) =>
                emit_checked_call(&builder, helpers.define_constant, &[], next_block, error_target),

            Op::ReadVariable =>
                emit_checked_call(&builder, helpers.read_variable, &[], next_block, error_target),

            Op::WriteVariable =>
                emit_checked_call(&builder, helpers.write_variable, &[], next_block, error_target),

            Op::Execute(Value::String(name)) =>
                {
                    let global = build_string_constant(context, module, &builder, name);
                    emit_checked_call(&builder, helpers.word_execute_name, &global, next_block, error_target);
                },

            Op::Execute(Value::Int(index)) =>
                {
                    let arg = i64_type.const_int(*index as u64, true);
                    emit_checked_call(&builder, helpers.word_execute_index, &[ arg.into() ],
                                      next_block, error_target);
                },

            Op::Execute(_) =>
                return construction_error(index, "execute with an unsupported operand type"),

            Op::WordIndex(Value::String(name)) | Op::WordExists(Value::String(name)) =>
                {
                    let helper = if matches!(instruction.op, Op::WordIndex(_))
                        { helpers.word_index_name } else { helpers.word_exists_name };

                    let global = build_string_constant(context, module, &builder, name);
                    emit_checked_call(&builder, helper, &global, next_block, error_target);
                },

            Op::WordIndex(_) | Op::WordExists(_) =>
                return construction_error(index, "word_index/word_exists with a non-string operand"),

            Op::PushConstantValue(Value::Bool(value)) =>
                {
                    let arg = i64_type.const_int(if *value { 1 } else { 0 }, false);
                    emit_checked_call(&builder, helpers.push_bool, &[ arg.into() ], next_block, error_target);
                },

            Op::PushConstantValue(Value::Int(value)) =>
                {
                    let arg = i64_type.const_int(*value as u64, true);
                    emit_checked_call(&builder, helpers.push_int, &[ arg.into() ], next_block, error_target);
                },

            Op::PushConstantValue(Value::Float(value)) =>
                {
                    let arg = context.f64_type().const_float(*value);
                    emit_checked_call(&builder, helpers.push_double, &[ arg.into() ], next_block, error_target);
                },

            Op::PushConstantValue(Value::String(text)) =>
                {
                    let global = build_string_constant(context, module, &builder, text);
                    emit_checked_call(&builder, helpers.push_string, &global, next_block, error_target);
                },

            Op::PushConstantValue(value @ (Value::None | Value::ByteCode(_))) =>
                {
                    let constant_index = constants.len();
                    constants.push(value.clone());

                    let arg = i64_type.const_int(constant_index as u64, false);
                    emit_checked_call(&builder, helpers.push_value, &[ arg.into() ], next_block, error_target);
                },

            Op::MarkLoopExit(operand) =>
                {
                    // The loop body begins right here, at the instruction following this one --
                    // that is what `jump_loop_start` ("continue") returns to. The exit is
                    // wherever this instruction's (now-resolved) operand points, the
                    // `jump_target` that `jump_loop_exit` ("break") branches to.
                    let exit = match operand
                        {
                            Value::Int(offset) => jump_target(&blocks, exit_ok, index, *offset),
                            _ => next_block
                        };

                    loop_stack.push(LoopMarker { start: next_block, exit });
                    builder.build_unconditional_branch(next_block).ok();
                },

            Op::UnmarkLoopExit =>
                {
                    loop_stack.pop();
                    builder.build_unconditional_branch(next_block).ok();
                },

            Op::MarkCatch(operand) =>
                {
                    // Errors raised anywhere in the protected region (until the matching
                    // `unmark_catch`) branch to this instruction's resolved operand -- the
                    // `jump_target` marking the start of the catch handler -- instead of
                    // falling through to the enclosing catch or `exit_err`.
                    let target = match operand
                        {
                            Value::Int(offset) => jump_target(&blocks, exit_ok, index, *offset),
                            _ => next_block
                        };

                    catch_stack.push(target);
                    builder.build_unconditional_branch(next_block).ok();
                },

            Op::UnmarkCatch =>
                {
                    catch_stack.pop();
                    builder.build_unconditional_branch(next_block).ok();
                },

            Op::MarkContext =>
                emit_checked_call(&builder, helpers.manage_context,
                                  &[ i64_type.const_int(1, false).into() ], next_block, error_target),

            Op::ReleaseContext =>
                emit_checked_call(&builder, helpers.manage_context,
                                  &[ i64_type.const_int(0, false).into() ], next_block, error_target),

            Op::Jump(Value::Int(offset)) =>
                {
                    let target = jump_target(&blocks, exit_ok, index, *offset);
                    builder.build_unconditional_branch(target).ok();
                },

            Op::JumpIfZero(Value::Int(offset)) | Op::JumpIfNotZero(Value::Int(offset)) =>
                {
                    let call = builder.build_call(helpers.pop_bool, &[], "pop_bool");
                    let result = call.ok()
                                     .and_then(|site| site.try_as_basic_value().left())
                                     .map(|value| value.into_int_value())
                                     .unwrap_or(i64_type.const_zero());

                    let is_error = builder.build_int_compare(inkwell::IntPredicate::SLT, result,
                                                             i64_type.const_zero(), "is_error").ok();
                    let taken_block = context.append_basic_block(function, &format!("taken_{}", index));
                    let check_block = context.append_basic_block(function, &format!("check_{}", index));

                    if let Some(is_error) = is_error
                    {
                        builder.build_conditional_branch(is_error, error_target, check_block).ok();
                    }

                    builder.position_at_end(check_block);

                    let wants_zero = matches!(instruction.op, Op::JumpIfZero(_));
                    let compare_to = i64_type.const_zero();
                    let matches = builder.build_int_compare(inkwell::IntPredicate::EQ, result,
                                                            compare_to, "matches").ok();

                    let target = jump_target(&blocks, exit_ok, index, *offset);

                    if let Some(matches) = matches
                    {
                        if wants_zero
                        {
                            builder.build_conditional_branch(matches, target, taken_block).ok();
                        }
                        else
                        {
                            builder.build_conditional_branch(matches, taken_block, target).ok();
                        }
                    }

                    builder.position_at_end(taken_block);
                    builder.build_unconditional_branch(next_block).ok();
                },

            Op::Jump(_) | Op::JumpIfZero(_) | Op::JumpIfNotZero(_) =>
                return construction_error(index, "unresolved jump operand (code.resolve_jumps not run?)"),

            Op::JumpLoopStart =>
                {
                    let target = loop_stack.last().map(|marker| marker.start).unwrap_or(next_block);
                    builder.build_unconditional_branch(target).ok();
                },

            Op::JumpLoopExit =>
                {
                    let target = loop_stack.last().map(|marker| marker.exit).unwrap_or(next_block);
                    builder.build_unconditional_branch(target).ok();
                },

            Op::JumpTarget(_) =>
                {
                    if catch_targets.contains(&index)
                    {
                        emit_checked_call(&builder, helpers.push_last_exception, &[], next_block, error_target);
                    }
                    else
                    {
                        builder.build_unconditional_branch(next_block).ok();
                    }
                }
        }
    }

    builder.position_at_end(exit_ok);
    builder.build_return(Some(&i64_type.const_zero())).ok();

    builder.position_at_end(exit_err);
    builder.build_return(Some(&i64_type.const_int(1, false))).ok();

    Ok(function)
}


fn jump_target<'ctx>(blocks: &[inkwell::basic_block::BasicBlock<'ctx>],
                     exit_ok: inkwell::basic_block::BasicBlock<'ctx>,
                     index: usize,
                     offset: i64) -> inkwell::basic_block::BasicBlock<'ctx>
{
    let target = index as i64 + offset;

    if target >= 0 && (target as usize) < blocks.len()
    {
        blocks[target as usize]
    }
    else
    {
        exit_ok
    }
}


fn construction_error<T>(index: usize, message: &str) -> error::Result<T>
{
    ScriptError::new_as_result(None, format!("Instruction {}: {}", index, message), None)
}


/// A call whose helper may fail: branches to `ok_block` on a `0` return, `error_block` otherwise.
fn emit_checked_call<'ctx>(builder: &inkwell::builder::Builder<'ctx>,
                           helper: FunctionValue<'ctx>,
                           args: &[inkwell::values::BasicMetadataValueEnum<'ctx>],
                           ok_block: inkwell::basic_block::BasicBlock<'ctx>,
                           error_block: inkwell::basic_block::BasicBlock<'ctx>)
{
    let call = builder.build_call(helper, args, "call");

    let result = call.ok()
                     .and_then(|site| site.try_as_basic_value().left())
                     .map(|value| value.into_int_value());

    if let Some(result) = result
    {
        let i64_type = result.get_type();
        let is_ok = builder.build_int_compare(inkwell::IntPredicate::EQ, result,
                                              i64_type.const_zero(), "is_ok").ok();

        if let Some(is_ok) = is_ok
        {
            builder.build_conditional_branch(is_ok, ok_block, error_block).ok();
            return;
        }
    }

    builder.build_unconditional_branch(ok_block).ok();
}


/// Materialise a Rust string as a private LLVM global and return the `(ptr, len)` argument pair
/// helpers that take string operands expect.
fn build_string_constant<'ctx>(context: &'ctx Context,
                               module: &Module<'ctx>,
                               builder: &inkwell::builder::Builder<'ctx>,
                               text: &str) -> Vec<inkwell::values::BasicMetadataValueEnum<'ctx>>
{
    let global = builder.build_global_string_ptr(text, "str_const");
    let ptr = global.ok().map(|g| g.as_pointer_value())
                        .unwrap_or_else(|| context.ptr_type(AddressSpace::default()).const_null());

    let _ = module;

    let len = context.i64_type().const_int(text.len() as u64, false);

    vec![ ptr.into(), len.into() ]
}


/// Run the LLVM default O3 module pipeline over `module`, through the new pass manager.  The
/// legacy `PassManager` transform-pass wrappers (`add_instruction_combining_pass`,
/// `add_gvn_pass`, `add_promote_memory_to_register_pass`, ...) are not available for LLVM 17;
/// `Module::run_passes` against a native `TargetMachine` is the pipeline entry point the
/// `llvm17-0` inkwell feature actually exposes, mirroring the `PassBuilder`/
/// `buildPerModuleDefaultPipeline(OptimizationLevel::O3)` pipeline this back end is grounded on.
fn run_optimizer(module: &Module) -> Result<(), String>
{
    use inkwell::passes::PassBuilderOptions;
    use inkwell::targets::{ CodeModel, InitializationConfig, RelocMode, Target, TargetMachine };

    Target::initialize_native(&InitializationConfig::default())
        .map_err(|error| format!("Failed to initialize native target: {}", error))?;

    let triple = TargetMachine::get_default_triple();
    let target = Target::from_triple(&triple)
        .map_err(|error| format!("Failed to resolve native target: {}", error))?;

    let machine = target.create_target_machine(&triple,
                                                &TargetMachine::get_host_cpu_name().to_string(),
                                                &TargetMachine::get_host_cpu_features().to_string(),
                                                OptimizationLevel::Aggressive,
                                                RelocMode::Default,
                                                CodeModel::Default)
        .ok_or_else(|| "Failed to create native target machine.".to_string())?;

    module.run_passes("default<O3>", &machine, PassBuilderOptions::create())
          .map_err(|error| error.to_string())
}
