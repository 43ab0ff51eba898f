
use crate::{ add_native_immediate_word,
             add_native_word,
             lang::{ compilation::process_token, tokenizing::Token },
             runtime::{ data_structures::value::{ ToValue, Value },
                        error::{ self, script_error },
                        interpreter::Interpreter } };



fn word_include(interpreter: &mut dyn Interpreter) -> error::Result<()>
{
    let file = interpreter.pop_as_string()?;
    interpreter.process_source_file(&file)
}

fn word_include_im(interpreter: &mut dyn Interpreter) -> error::Result<()>
{
    let ( _, file ) = interpreter.next_token_word()?;
    interpreter.process_source_file(&file)
}

fn word_print_stack(interpreter: &mut dyn Interpreter) -> error::Result<()>
{
    println!("Depth: {}", interpreter.stack().len());

    for value in interpreter.stack()
    {
        if value.is_string()
        {
            println!("{}", Value::stringify(&value.to_string()));
        }
        else
        {
            println!("{}", value);
        }
    }

    Ok(())
}

fn word_print_dictionary(interpreter: &mut dyn Interpreter) -> error::Result<()>
{
    print!("{}", interpreter.dictionary());
    Ok(())
}

fn word_sorth_version(interpreter: &mut dyn Interpreter) -> error::Result<()>
{
    interpreter.push(env!("CARGO_PKG_VERSION").to_value());
    Ok(())
}

fn word_sorth_find_file(interpreter: &mut dyn Interpreter) -> error::Result<()>
{
    let file = interpreter.pop_as_string()?;
    let full_path = interpreter.find_file(&file)?;

    interpreter.push(full_path.to_value());

    Ok(())
}

fn word_throw(interpreter: &mut dyn Interpreter) -> error::Result<()>
{
    let message = interpreter.pop_as_string()?;
    script_error(interpreter, message)
}

/// Build a `unique_str` handler closure over a variable slot reserved for it at registration
/// time, so every call returns a fresh label. Library control-flow words (`if`/`else`/`then` in
/// `std.f`) use these as `op.jump`/`op.jump_target` operands so that two uses within the same
/// definition never collide.
fn make_unique_str_handler(counter_index: usize)
    -> impl Fn(&mut dyn Interpreter) -> error::Result<()>
{
    move |interpreter: &mut dyn Interpreter|
        {
            let current = interpreter.read_variable(counter_index)?.get_int_val(interpreter)?;

            interpreter.write_variable(counter_index, (current + 1).to_value())?;
            interpreter.push(format!("unique-str-{:08x}", current).to_value());

            Ok(())
        }
}

/// Consume tokens as plain text (no compilation) until one of `targets` is found at the same
/// nesting depth, tracking `[if]`/`[then]` pairs so a nested conditional's own `[else]`/`[then]`
/// is not mistaken for the one we're looking for.
fn skip_until(interpreter: &mut dyn Interpreter, targets: &[&str]) -> error::Result<String>
{
    let mut depth = 0usize;

    loop
    {
        let token = interpreter.next_token()?;

        let name = match &token
            {
                Token::Word(_, name) => name.clone(),
                _ => continue
            };

        if name == "[if]"
        {
            depth += 1;
            continue;
        }

        if depth == 0 && targets.contains(&name.as_str())
        {
            return Ok(name);
        }

        if name == "[then]" && depth > 0
        {
            depth -= 1;
        }
    }
}

/// Compile tokens normally (immediate words still run as they're encountered) until one of
/// `targets` shows up.  A nested `[if]` consumes its own `[else]`/`[then]` while its handler
/// runs, so by the time control returns here those tokens are already gone from the stream.
fn compile_until(interpreter: &mut dyn Interpreter, targets: &[&str]) -> error::Result<String>
{
    loop
    {
        let token = interpreter.next_token()?;

        if let Token::Word(_, name) = &token
        {
            if targets.contains(&name.as_str())
            {
                return Ok(name.clone());
            }
        }

        process_token(interpreter, token)?;
    }
}

/// `[if]`, immediate.  Pops a boolean off of the compile-time stack.  When true, compiles the
/// body up to `[else]`/`[then]` and, if it stopped at `[else]`, skips that branch unread.  When
/// false, skips the body up to `[else]`/`[then]` and, if it stopped at `[else]`, compiles that
/// branch instead.
fn word_if(interpreter: &mut dyn Interpreter) -> error::Result<()>
{
    let condition = interpreter.pop_as_bool()?;

    if condition
    {
        if compile_until(interpreter, &[ "[else]", "[then]" ])? == "[else]"
        {
            skip_until(interpreter, &[ "[then]" ])?;
        }
    }
    else if skip_until(interpreter, &[ "[else]", "[then]" ])? == "[else]"
    {
        compile_until(interpreter, &[ "[then]" ])?;
    }

    Ok(())
}



pub fn register_sorth_words(interpreter: &mut dyn Interpreter)
{
    add_native_word!(interpreter, "include", word_include,
        "Include and execute another source file.",
        "source_path -- ");

    add_native_immediate_word!(interpreter, "[include]", word_include_im,
        "Include and execute another source file.",
        "[include] file/to/include.f");

    add_native_word!(interpreter, ".s", word_print_stack,
        "Print out the data stack without changing it.",
        " -- ");

    add_native_word!(interpreter, ".w", word_print_dictionary,
        "Print out the current word dictionary.",
        " -- ");

    add_native_word!(interpreter, "sorth.version", word_sorth_version,
        "Get the current version of the interpreter.",
        " -- version_string");

    add_native_word!(interpreter, "sorth.find-file", word_sorth_find_file,
        "Search for a file within the given search paths.",
        " -- full-file-path");

    add_native_word!(interpreter, "throw", word_throw,
        "Throw an exception with the given message.",
        "message -- ");

    add_native_immediate_word!(interpreter, "[if]", word_if,
        "Conditionally compile one of two branches, up to [else]/[then].",
        "bool -- ");

    let unique_str_counter = interpreter.define_variable(0i64.to_value());
    add_native_word!(interpreter, "unique_str", make_unique_str_handler(unique_str_counter),
        "Generate a fresh label string, unique for the life of the compiler process.",
        " -- label");
}
