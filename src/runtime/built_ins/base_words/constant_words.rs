
use crate::{ add_native_immediate_word,
             runtime::{ data_structures::value::Value,
                        error,
                        interpreter::Interpreter } };



fn word_none(interpreter: &mut dyn Interpreter) -> error::Result<()>
{
    interpreter.push(Value::None);
    Ok(())
}

fn word_true(interpreter: &mut dyn Interpreter) -> error::Result<()>
{
    interpreter.push(Value::Bool(true));
    Ok(())
}

fn word_false(interpreter: &mut dyn Interpreter) -> error::Result<()>
{
    interpreter.push(Value::Bool(false));
    Ok(())
}



/// `none`, `true`, and `false` run at compile time -- not deferred to the produced binary --
/// so that compile-time logic (`[if]` and friends) can act on them immediately.
pub fn register_constant_words(interpreter: &mut dyn Interpreter)
{
    add_native_immediate_word!(interpreter, "none", word_none,
        "Push the none value onto the stack.",
        " -- none");

    add_native_immediate_word!(interpreter, "true", word_true,
        "Push the boolean value of true.",
        " -- true");

    add_native_immediate_word!(interpreter, "false", word_false,
        "Push the boolean value of false.",
        " -- false");
}
