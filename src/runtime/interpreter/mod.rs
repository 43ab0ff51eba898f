
use std::rc::Rc;
use crate::{ lang::{ code::ByteCode,
                     compilation::{ Construction, CodeConstructor },
                     source_buffer::SourceLocation,
                     tokenizing::TokenList },
             runtime::{ data_structures::{ contextual_data::ContextualData,
                                           contextual_list::ContextualList,
                                           dictionary::{ Dictionary,
                                                         WordInfo,
                                                         WordRuntime,
                                                         WordType,
                                                         WordVisibility },
                                           value::Value },
                         error,
                         script::ScriptCache } };



pub mod sorth_interpreter;



/// A single frame of the call stack, pushed whenever a word is `execute`d and popped on return.
/// Attached to a `ScriptError` so a failure can be reported with its full ancestry.
#[derive(Clone)]
pub struct CallItem
{
    pub location: SourceLocation,
    pub word: String
}



pub type CallStack = Vec<CallItem>;

pub type VariableList = ContextualList<Value>;

pub type ValueStack = Vec<Value>;

/// A registered word's handler.  Either a thin wrapper around a plain Rust function (the kernel
/// vocabulary) or a closure produced by the JIT that invokes a freshly compiled native function
/// (a user word defined with an immediate `:` ... `;`).
pub type NativeHandler = Rc<dyn Fn(&mut dyn Interpreter) -> error::Result<()>>;



pub trait InterpreterStack
{
    fn stack(&self) -> &ValueStack;

    fn push(&mut self, value: Value);

    fn pop(&mut self) -> error::Result<Value>;
    fn pop_as_int(&mut self) -> error::Result<i64>;
    fn pop_as_float(&mut self) -> error::Result<f64>;
    fn pop_as_bool(&mut self) -> error::Result<bool>;
    fn pop_as_string(&mut self) -> error::Result<String>;
    fn pop_as_usize(&mut self) -> error::Result<usize>;
    fn pop_as_code(&mut self) -> error::Result<ByteCode>;

    fn pick(&mut self, index: usize) -> error::Result<Value>;
}



pub trait CodeManagement
{
    fn context_new(&mut self, tokens: TokenList);
    fn context_drop(&mut self) -> error::Result<()>;

    fn context(&self) -> &CodeConstructor;
    fn context_mut(&mut self) -> &mut CodeConstructor;

    /// Consume the next token, failing if the stream is exhausted.
    fn next_token(&mut self) -> error::Result<crate::lang::tokenizing::Token>;

    /// Consume the next token as a word-or-number name, failing on a string literal.
    fn next_token_word(&mut self) -> error::Result<( SourceLocation, String )>;

    /// Consume the next token as a string literal, failing on anything else.
    fn next_token_string(&mut self) -> error::Result<String>;

    fn process_source_file(&mut self, path: &String) -> error::Result<()>;
    fn process_source(&mut self, path: &String, source: &String) -> error::Result<()>;
}



pub trait WordManagement
{
    fn current_location(&self) -> &Option<SourceLocation>;
    fn set_current_location(&mut self, location: Option<SourceLocation>);

    #[allow(clippy::too_many_arguments)]
    fn add_word(&mut self,
               path: String,
               line: u32,
               column: u32,
               name: String,
               handler: NativeHandler,
               description: String,
               signature: String,
               runtime: WordRuntime,
               visibility: WordVisibility,
               word_type: WordType) -> usize;

    /// Stash a non-immediate word's construction as a run-time word destined for the
    /// out-of-scope AOT back-end, instead of the dictionary.
    fn add_script_word(&mut self, construction: Construction);

    fn find_word(&self, word: &String) -> Option<WordInfo>;

    fn execute_word(&mut self,
                    location: &Option<SourceLocation>,
                    word: &WordInfo) -> error::Result<()>;
    fn execute_word_named(&mut self,
                          location: &Option<SourceLocation>,
                          word: &String) -> error::Result<()>;
    fn execute_word_index(&mut self,
                          location: &Option<SourceLocation>,
                          index: usize) -> error::Result<()>;

    /// Insert an instruction into the construction currently being built, at the insertion
    /// point (`code.insert_at_front` aware).
    fn insert_user_instruction(&mut self,
                               location: Option<SourceLocation>,
                               op: crate::lang::code::Op) -> error::Result<()>;

    fn call_stack(&self) -> &CallStack;

    /// Lower a `compile_time` construction's byte-code to native code via the JIT and wrap it in
    /// a callable handler.  Used by `;` when it closes a construction whose `execution_context` is
    /// `CompileTime`, so the new word can be invoked immediately by later tokens in the same
    /// compilation.
    fn jit_compile(&mut self, construction: &Construction) -> error::Result<NativeHandler>;
}



pub trait VariableManagement
{
    fn variables(&self) -> &VariableList;

    fn define_variable(&mut self, initial: Value) -> usize;
    fn define_constant(&mut self, value: Value) -> usize;
    fn read_variable(&self, index: usize) -> error::Result<Value>;
    fn write_variable(&mut self, index: usize, value: Value) -> error::Result<()>;
}



pub trait Interpreter : ContextualData +
                        InterpreterStack +
                        CodeManagement +
                        WordManagement +
                        VariableManagement
{
    fn add_search_path(&mut self, path: &String) -> error::Result<()>;
    fn add_search_path_for_file(&mut self, file_path: &String) -> error::Result<()>;
    fn drop_search_path(&mut self);

    fn find_file(&self, path: &String) -> error::Result<String>;

    /// Compile the given path into a `Script`, consulting/populating the script cache.  A no-op
    /// on a cache hit; guards include cycles via an in-progress marker.
    fn compile_script(&mut self, path: &String) -> error::Result<()>;

    /// The cache `compile_script` populates, keyed by canonical path.  The out-of-scope AOT
    /// back-end reads the finished `Script` for the root path out of here once compilation
    /// completes.
    fn script_cache(&self) -> &ScriptCache;

    fn dictionary(&self) -> &Dictionary;
}
