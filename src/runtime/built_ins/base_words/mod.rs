
/// Mostly words that are used to change or read the state of the interpreter.
mod sorth_words;

/// Words that manipulate the data stack.
mod stack_words;

/// Simple constants.
mod constant_words;

/// Words that manipulate and generate byte-code.
mod bytecode_words;

/// Words that work with words.
mod word_words;

/// Words that create new words.
mod word_creation_words;

/// Words that work with math, logic, bit manipulation and Value equality.
mod math_logic_and_bit_words;



use crate::runtime::{ built_ins::base_words::{
                                      sorth_words::register_sorth_words,
                                      stack_words::register_stack_words,
                                      constant_words::register_constant_words,
                                      bytecode_words::register_bytecode_words,
                                      word_words::register_word_words,
                                      word_creation_words::register_word_creation_words,
                                      math_logic_and_bit_words::register_math_logic_and_bit_words },
                      interpreter::Interpreter };


/// Called to register all of the core words of the language.  Arrays, hash tables, byte
/// buffers, structures, strings-as-a-vocabulary, FFI, terminal, POSIX and thread words belong
/// to the produced binary's run-time, never to the compiler: this only ever emits `execute`
/// instructions naming them.
pub fn register_base_words(interpreter: &mut dyn Interpreter)
{
    register_sorth_words(interpreter);
    register_stack_words(interpreter);
    register_constant_words(interpreter);
    register_bytecode_words(interpreter);
    register_word_words(interpreter);
    register_word_creation_words(interpreter);
    register_math_logic_and_bit_words(interpreter);
}
