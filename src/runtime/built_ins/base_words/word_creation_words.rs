
use std::rc::Rc;
use crate::{ add_native_immediate_word,
             lang::{ compilation::{ ContextManagement, ExecutionContext },
                     tokenizing::Token },
             runtime::{ data_structures::dictionary::{ WordRuntime, WordType, WordVisibility },
                        error::{ self, script_error, script_error_str },
                        interpreter::Interpreter } };



fn word_start_word(interpreter: &mut dyn Interpreter) -> error::Result<()>
{
    let token = interpreter.next_token()?;
    let ( location, name ) = match token
        {
            Token::Word(location, name) => ( location, name ),
            Token::Number(location, value) => ( location, value.to_string() ),
            Token::String(_, _) =>
                {
                    return script_error_str(interpreter, "Can not use a string as a word name.");
                }
        };

    interpreter.context_mut().construction_new();

    interpreter.context_mut().construction_mut()?.name = name;
    interpreter.context_mut().construction_mut()?.location = location;

    Ok(())
}

/// Close out the construction started by `:`.  A construction whose `execution_context` is
/// `CompileTime` (set by `immediate`) is lowered straight to native code through the JIT and
/// registered so later tokens in the same compilation can call it; everything else is a
/// run-time word and is handed, untouched, to the out-of-scope AOT back-end -- the compiler
/// itself must never execute its body.
fn word_end_word(interpreter: &mut dyn Interpreter) -> error::Result<()>
{
    let mut construction = interpreter.context_mut().construction_pop()?;

    construction.resolve_jumps();

    match construction.execution_context
    {
        ExecutionContext::CompileTime =>
            {
                let handler = interpreter.jit_compile(&construction)?;

                interpreter.add_word(construction.location.path().clone(),
                                     construction.location.line(),
                                     construction.location.column(),
                                     construction.name,
                                     handler,
                                     construction.description,
                                     construction.signature,
                                     construction.runtime,
                                     construction.visibility,
                                     WordType::Native);
            },

        ExecutionContext::RunTime =>
            {
                let name = construction.name.clone();

                let deferred: crate::runtime::interpreter::NativeHandler =
                    Rc::new(move |interpreter: &mut dyn Interpreter|
                        {
                            script_error(interpreter,
                                        format!("'{}' is a run-time word, it can not be \
                                                 executed by the compiler.", name))
                        });

                interpreter.add_word(construction.location.path().clone(),
                                     construction.location.line(),
                                     construction.location.column(),
                                     construction.name.clone(),
                                     deferred,
                                     construction.description.clone(),
                                     construction.signature.clone(),
                                     construction.runtime.clone(),
                                     construction.visibility.clone(),
                                     WordType::Scripted);

                interpreter.add_script_word(construction);
            }
    }

    Ok(())
}

/// Mark the word currently under construction as both immediate (looked up and run as soon as
/// it is tokenized) and compile-time (its body is JITed rather than deferred). The two always
/// travel together here: a word can only run during compilation if its own body was compiled to
/// native code.
fn word_immediate(interpreter: &mut dyn Interpreter) -> error::Result<()>
{
    let construction = interpreter.context_mut().construction_mut()?;

    construction.runtime = WordRuntime::Immediate;
    construction.execution_context = ExecutionContext::CompileTime;

    Ok(())
}

fn word_hidden(interpreter: &mut dyn Interpreter) -> error::Result<()>
{
    interpreter.context_mut().construction_mut()?.visibility = WordVisibility::Hidden;
    Ok(())
}

/// Mark the word currently under construction as not needing its own private dictionary/variable
/// scope -- `;` will not wrap its body in `mark_context`/`release_context`.
fn word_contextless(interpreter: &mut dyn Interpreter) -> error::Result<()>
{
    interpreter.context_mut().construction_mut()?.context_management = ContextManagement::Unmanaged;
    Ok(())
}

fn word_description(interpreter: &mut dyn Interpreter) -> error::Result<()>
{
    let description = interpreter.next_token_string()?;

    interpreter.context_mut().construction_mut()?.description = description;
    Ok(())
}

fn word_signature(interpreter: &mut dyn Interpreter) -> error::Result<()>
{
    let signature = interpreter.next_token_string()?;

    interpreter.context_mut().construction_mut()?.signature = signature;
    Ok(())
}



pub fn register_word_creation_words(interpreter: &mut dyn Interpreter)
{
    add_native_immediate_word!(interpreter, ":", word_start_word,
        "Start a new word definition.",
        " -- ");

    add_native_immediate_word!(interpreter, ";", word_end_word,
        "End the definition of the newly created word.",
        " -- ");

    add_native_immediate_word!(interpreter, "immediate", word_immediate,
        "Mark the new word as immediate and compiled to native code.",
        " -- ");

    add_native_immediate_word!(interpreter, "hidden", word_hidden,
        "Mark the new word as hidden from the directory.",
        " -- ");

    add_native_immediate_word!(interpreter, "contextless", word_contextless,
        "Mark the new word as not needing its own variable/dictionary scope.",
        " -- ");

    add_native_immediate_word!(interpreter, "description:", word_description,
        "Give a description for the new word.",
        " -- ");

    add_native_immediate_word!(interpreter, "signature:", word_signature,
        "Document the word's signature.",
        " -- ");
}
