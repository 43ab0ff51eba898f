
use crate::{ add_native_immediate_word,
             add_native_word,
             location_here,
             lang::code::Op,
             runtime::{ data_structures::value::ToValue,
                        error::{ self, script_error },
                        interpreter::Interpreter } };


fn word_word(interpreter: &mut dyn Interpreter) -> error::Result<()>
{
    let token = interpreter.next_token()?;

    interpreter.push(token.to_value());
    Ok(())
}

/// `` ` ``, immediate.  If the name is already known, compile its handler index in directly;
/// otherwise emit a `word_index` instruction naming it, to be resolved later by whatever
/// eventually defines it (a forward reference).
fn word_word_index(interpreter: &mut dyn Interpreter) -> error::Result<()>
{
    let ( location, word ) = interpreter.next_token_word()?;

    if let Some(word_info) = interpreter.find_word(&word)
    {
        interpreter.insert_user_instruction(Some(location),
                                        Op::PushConstantValue(word_info.handler_index.to_value()))?;
    }
    else
    {
        interpreter.insert_user_instruction(Some(location), Op::WordIndex(word.to_value()))?;
    }

    Ok(())
}

fn word_execute(interpreter: &mut dyn Interpreter) -> error::Result<()>
{
    let value = interpreter.pop()?;

    if value.is_numeric()
    {
        let index = value.get_int_val(interpreter)?;

        interpreter.execute_word_index(&location_here!(), index as usize)?;
    }
    else if value.is_string()
    {
        let word = value.get_string_val(interpreter)?;

        interpreter.execute_word_named(&location_here!(), &word)?;
    }
    else
    {
        script_error(interpreter, format!("Value {} is not a valid word name or index.", value))?;
    }

    Ok(())
}

/// Immediate, but the existence check itself is deferred: `defined?` reads the word name now
/// (it needs the token stream) and emits a `word_exists` instruction, since the run-time word it
/// names may not be in the dictionary yet but could still be defined later in this same compile.
fn word_is_defined(interpreter: &mut dyn Interpreter) -> error::Result<()>
{
    let ( location, word ) = interpreter.next_token_word()?;

    interpreter.insert_user_instruction(Some(location), Op::WordExists(word.to_value()))
}

fn word_is_defined_im(interpreter: &mut dyn Interpreter) -> error::Result<()>
{
    let ( _, word ) = interpreter.next_token_word()?;
    let found = interpreter.find_word(&word).is_some();

    interpreter.push(found.to_value());
    Ok(())
}

fn word_is_undefined_im(interpreter: &mut dyn Interpreter) -> error::Result<()>
{
    let ( _, word ) = interpreter.next_token_word()?;
    let not_found = interpreter.find_word(&word).is_none();

    interpreter.push(not_found.to_value());
    Ok(())
}



pub fn register_word_words(interpreter: &mut dyn Interpreter)
{
    add_native_word!(interpreter, "word", word_word,
            "Get the next word in the token stream.",
            " -- next_word");

    add_native_immediate_word!(interpreter, "`", word_word_index,
        "Get the index of the next word.",
        " -- index");

    add_native_word!(interpreter, "execute", word_execute,
        "Execute a word name or index.",
        "word_name_or_index -- ???");

    add_native_immediate_word!(interpreter, "defined?", word_is_defined,
        "Is the given word defined? Checked when this instruction runs, not when it's compiled.",
        " -- bool");

    add_native_immediate_word!(interpreter, "[defined?]", word_is_defined_im,
        "Evaluate at compile time, is the given word defined?",
        " -- bool");

    add_native_immediate_word!(interpreter, "[undefined?]", word_is_undefined_im,
        "Evaluate at compile time, is the given word not defined?",
        " -- bool");
}



#[cfg(test)]
mod tests
{
    use super::*;
    use crate::runtime::{ data_structures::{ dictionary::{ WordRuntime, WordType, WordVisibility },
                                             value::Value },
                          interpreter::{ sorth_interpreter::SorthInterpreter,
                                        InterpreterStack,
                                        WordManagement } };

    fn word_seven(interpreter: &mut dyn Interpreter) -> error::Result<()>
    {
        interpreter.push(7i64.to_value());
        Ok(())
    }

    fn interpreter_with_seven() -> ( SorthInterpreter, usize )
    {
        let mut interpreter = SorthInterpreter::new();

        let index = interpreter.add_word("test".to_string(), 1, 1, "seven".to_string(),
                                         std::rc::Rc::new(word_seven),
                                         String::new(), String::new(),
                                         WordRuntime::Normal, WordVisibility::Visible,
                                         WordType::Native);

        ( interpreter, index )
    }

    #[test]
    fn execute_dispatches_by_handler_index()
    {
        let ( mut interpreter, index ) = interpreter_with_seven();

        interpreter.push((index as i64).to_value());
        word_execute(&mut interpreter).unwrap();

        assert_eq!(interpreter.pop().unwrap(), Value::Int(7));
    }

    #[test]
    fn execute_dispatches_by_word_name()
    {
        let ( mut interpreter, _index ) = interpreter_with_seven();

        interpreter.push("seven".to_value());
        word_execute(&mut interpreter).unwrap();

        assert_eq!(interpreter.pop().unwrap(), Value::Int(7));
    }
}
