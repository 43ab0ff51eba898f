
//! The compile-time runtime: the concrete `Interpreter` driving a single compiler instance.
//!
//! Everything an immediate word's JITed body or a native built-in can reach -- the data stack,
//! the variable slab, the dictionary, the handler table, the construction stack(s), the script
//! cache, the search paths -- lives here.  There is exactly one of these per compile.

use std::{ path::{ Path, PathBuf },
           rc::Rc };

use crate::{ lang::{ code::{ ByteCode, Instruction, Op },
                     compilation::{ CodeConstructor, Construction, CodeConstructorList },
                     source_buffer::SourceLocation,
                     tokenizing::{ tokenize_from_source, Token } },
             runtime::{ data_structures::{ contextual_data::ContextualData,
                                           dictionary::{ Dictionary,
                                                         WordInfo,
                                                         WordRuntime,
                                                         WordType,
                                                         WordVisibility },
                                           value::Value },
                        error::{ self, script_error, script_error_str, ScriptError },
                        interpreter::{ CallItem,
                                      CallStack,
                                      CodeManagement,
                                      Interpreter,
                                      InterpreterStack,
                                      NativeHandler,
                                      VariableList,
                                      VariableManagement,
                                      ValueStack,
                                      WordManagement },
                        jit::Jit,
                        script::{ Script, ScriptCache, ScriptCacheEntry } } };



/// A single append-only entry in the handler table.  The dictionary never holds a handler
/// directly, only its index here -- see the cyclic-ownership note in the design notes.
struct HandlerEntry
{
    #[allow(dead_code)]
    location: SourceLocation,
    name: String,
    handler: NativeHandler
}



pub struct SorthInterpreter
{
    stack: ValueStack,
    variables: VariableList,
    dictionary: Dictionary,
    handlers: Vec<HandlerEntry>,
    call_stack: CallStack,
    search_paths: Vec<String>,
    script_cache: ScriptCache,
    contexts: CodeConstructorList,
    current_location: Option<SourceLocation>,
    jit: Jit
}


impl SorthInterpreter
{
    pub fn new() -> SorthInterpreter
    {
        SorthInterpreter
            {
                stack: ValueStack::new(),
                variables: VariableList::new(),
                dictionary: Dictionary::new(),
                handlers: Vec::new(),
                call_stack: CallStack::new(),
                search_paths: Vec::new(),
                script_cache: ScriptCache::new(),
                contexts: CodeConstructorList::new(),
                current_location: None,
                jit: Jit::new()
            }
    }
}


impl Default for SorthInterpreter
{
    fn default() -> SorthInterpreter
    {
        SorthInterpreter::new()
    }
}



impl ContextualData for SorthInterpreter
{
    /// A "managed context" gives a word its own private dictionary scope *and* its own private
    /// variable scope together -- see the glossary entry for "managed context".
    fn mark_context(&mut self)
    {
        self.dictionary.mark_context();
        self.variables.mark_context();
    }

    fn release_context(&mut self)
    {
        self.dictionary.release_context();
        self.variables.release_context();
    }
}



impl InterpreterStack for SorthInterpreter
{
    fn stack(&self) -> &ValueStack
    {
        &self.stack
    }

    fn push(&mut self, value: Value)
    {
        self.stack.push(value);
    }

    fn pop(&mut self) -> error::Result<Value>
    {
        match self.stack.pop()
        {
            Some(value) => Ok(value),
            None => script_error_str(self, "Data stack underflow.")
        }
    }

    fn pop_as_int(&mut self) -> error::Result<i64>
    {
        let value = self.pop()?;
        value.get_int_val(self)
    }

    fn pop_as_float(&mut self) -> error::Result<f64>
    {
        let value = self.pop()?;
        value.get_float_val(self)
    }

    fn pop_as_bool(&mut self) -> error::Result<bool>
    {
        let value = self.pop()?;
        value.get_bool_val(self)
    }

    fn pop_as_string(&mut self) -> error::Result<String>
    {
        let value = self.pop()?;
        value.get_string_val(self)
    }

    fn pop_as_usize(&mut self) -> error::Result<usize>
    {
        let value = self.pop_as_int()?;

        if value < 0
        {
            return script_error_str(self, "Expected a non-negative index.");
        }

        Ok(value as usize)
    }

    fn pop_as_code(&mut self) -> error::Result<ByteCode>
    {
        let value = self.pop()?;
        value.get_code_val(self)
    }

    fn pick(&mut self, index: usize) -> error::Result<Value>
    {
        if index >= self.stack.len()
        {
            return script_error(self, format!("Index {} out of range of stack.", index));
        }

        let top = self.stack.len() - 1;
        Ok(self.stack[top - index].clone())
    }
}



impl VariableManagement for SorthInterpreter
{
    fn variables(&self) -> &VariableList
    {
        &self.variables
    }

    fn define_variable(&mut self, initial: Value) -> usize
    {
        self.variables.insert(initial)
    }

    fn define_constant(&mut self, value: Value) -> usize
    {
        self.variables.insert(value)
    }

    fn read_variable(&self, index: usize) -> error::Result<Value>
    {
        if index >= self.variables.len()
        {
            return ScriptError::new_as_result(self.current_location.clone(),
                                              format!("Variable index {} out of range.", index),
                                              Some(self.call_stack.clone()));
        }

        Ok(self.variables[index].clone())
    }

    fn write_variable(&mut self, index: usize, value: Value) -> error::Result<()>
    {
        if index >= self.variables.len()
        {
            return ScriptError::new_as_result(self.current_location.clone(),
                                              format!("Variable index {} out of range.", index),
                                              Some(self.call_stack.clone()));
        }

        self.variables[index] = value;
        Ok(())
    }
}



impl CodeManagement for SorthInterpreter
{
    fn context_new(&mut self, tokens: crate::lang::tokenizing::TokenList)
    {
        self.contexts.push(CodeConstructor::new(tokens));
    }

    fn context_drop(&mut self) -> error::Result<()>
    {
        if self.contexts.pop().is_none()
        {
            return script_error_str(self, "No active compilation context to drop.");
        }

        Ok(())
    }

    fn context(&self) -> &CodeConstructor
    {
        self.contexts.last().expect("No active compilation context.")
    }

    fn context_mut(&mut self) -> &mut CodeConstructor
    {
        self.contexts.last_mut().expect("No active compilation context.")
    }

    fn next_token(&mut self) -> error::Result<Token>
    {
        match self.context_mut().next_token()
        {
            Some(token) => Ok(token),
            None => script_error_str(self, "Unexpected end of token stream.")
        }
    }

    fn next_token_word(&mut self) -> error::Result<( SourceLocation, String )>
    {
        let token = self.next_token()?;

        match token
        {
            Token::Word(location, name) => Ok(( location, name )),
            Token::Number(location, number) => Ok(( location, number.to_string() )),
            Token::String(_, _) => script_error_str(self, "Can not use a string as a word name.")
        }
    }

    fn next_token_string(&mut self) -> error::Result<String>
    {
        let token = self.next_token()?;

        match token
        {
            Token::String(_, text) => Ok(text),
            _ => script_error_str(self, "Expected a string literal.")
        }
    }

    fn process_source_file(&mut self, path: &String) -> error::Result<()>
    {
        self.compile_script(path)
    }

    fn process_source(&mut self, path: &String, source: &String) -> error::Result<()>
    {
        let tokens = tokenize_from_source(path, source)?;

        self.context_new(tokens);

        let result = drive_tokens(self);

        match result
        {
            Ok(()) => { self.context_drop()?; Ok(()) },
            Err(error) => { let _ = self.context_drop(); Err(error) }
        }
    }
}


/// Drive every token of the current (topmost) context through `lang::compilation::process_token`.
fn drive_tokens(interpreter: &mut dyn Interpreter) -> error::Result<()>
{
    while let Some(token) = interpreter.context_mut().next_token()
    {
        crate::lang::compilation::process_token(interpreter, token)?;
    }

    Ok(())
}



impl WordManagement for SorthInterpreter
{
    fn current_location(&self) -> &Option<SourceLocation>
    {
        &self.current_location
    }

    fn set_current_location(&mut self, location: Option<SourceLocation>)
    {
        self.current_location = location;
    }

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
               word_type: WordType) -> usize
    {
        let location = SourceLocation::new_from_info(&path, line, column);
        let index = self.handlers.len();

        self.handlers.push(HandlerEntry { location, name: name.clone(), handler });

        let info = WordInfo
            {
                name: name.clone(),
                runtime,
                word_type,
                visibility,
                description,
                signature,
                handler_index: index
            };

        self.dictionary.insert(name, info);

        index
    }

    fn add_script_word(&mut self, construction: Construction)
    {
        self.context_mut().add_script_word(construction);
    }

    fn find_word(&self, word: &String) -> Option<WordInfo>
    {
        self.dictionary.try_get(word).cloned()
    }

    fn execute_word(&mut self,
                    location: &Option<SourceLocation>,
                    word: &WordInfo) -> error::Result<()>
    {
        self.execute_word_index(location, word.handler_index)
    }

    fn execute_word_named(&mut self,
                          location: &Option<SourceLocation>,
                          word: &String) -> error::Result<()>
    {
        match self.find_word(word)
        {
            Some(info) => self.execute_word(location, &info),
            None => script_error(self, format!("Word '{}' not found.", word))
        }
    }

    fn execute_word_index(&mut self,
                          location: &Option<SourceLocation>,
                          index: usize) -> error::Result<()>
    {
        if index >= self.handlers.len()
        {
            return script_error(self, format!("Handler index {} out of range.", index));
        }

        let name = self.handlers[index].name.clone();
        let handler = self.handlers[index].handler.clone();

        self.call_stack.push(CallItem { location: location.clone()
                                                          .unwrap_or_else(SourceLocation::new),
                                        word: name });

        let previous_location = self.current_location.clone();

        if location.is_some()
        {
            self.current_location = location.clone();
        }

        let result = handler(self);

        self.current_location = previous_location;
        self.call_stack.pop();

        result
    }

    fn insert_user_instruction(&mut self,
                               location: Option<SourceLocation>,
                               op: Op) -> error::Result<()>
    {
        let instruction = Instruction::new(location, op);
        self.context_mut().push_instruction(instruction)
    }

    fn call_stack(&self) -> &CallStack
    {
        &self.call_stack
    }

    fn jit_compile(&mut self, construction: &Construction) -> error::Result<NativeHandler>
    {
        self.jit.compile_immediate(construction)
    }
}



impl Interpreter for SorthInterpreter
{
    fn add_search_path(&mut self, path: &String) -> error::Result<()>
    {
        let canonical = Path::new(path).canonicalize()
            .map_err(|error| ScriptError::new(None,
                                              format!("Could not resolve search path {}: {}",
                                                      path, error),
                                              None))?;

        self.search_paths.push(canonical.to_string_lossy().into_owned());
        Ok(())
    }

    fn add_search_path_for_file(&mut self, file_path: &String) -> error::Result<()>
    {
        let parent = Path::new(file_path).parent()
                         .map(|parent| parent.to_path_buf())
                         .unwrap_or_else(|| PathBuf::from("."));

        self.search_paths.push(parent.to_string_lossy().into_owned());
        Ok(())
    }

    fn drop_search_path(&mut self)
    {
        self.search_paths.pop();
    }

    fn find_file(&self, path: &String) -> error::Result<String>
    {
        let as_path = Path::new(path);

        if as_path.is_absolute()
        {
            if as_path.exists()
            {
                return Ok(path.clone());
            }

            return ScriptError::new_as_result(None,
                                              format!("Source file {} does not exist.", path),
                                              None);
        }

        for search_path in self.search_paths.iter().rev()
        {
            let candidate = Path::new(search_path).join(path);

            if candidate.exists()
            {
                return Ok(candidate.to_string_lossy().into_owned());
            }
        }

        ScriptError::new_as_result(None,
                                   format!("Could not find source file {} along the search path.",
                                           path),
                                   None)
    }

    fn compile_script(&mut self, path: &String) -> error::Result<()>
    {
        let full = self.find_file(path)?;

        match self.script_cache.get(&full)
        {
            Some(ScriptCacheEntry::Done(_)) => return Ok(()),
            Some(ScriptCacheEntry::InProgress) => return Ok(()),
            None => {}
        }

        self.script_cache.insert(full.clone(), ScriptCacheEntry::InProgress);

        let source = std::fs::read_to_string(&full)?;
        let tokens = tokenize_from_source(&full, &source)?;

        self.add_search_path_for_file(&full)?;
        self.context_new(tokens);

        let result = drive_tokens(self);

        self.drop_search_path();

        let ( top_level_byte_code, words ) = match result
        {
            Ok(()) =>
                {
                    let code = self.context().construction()?.code.clone();
                    let script_words = self.context().script_words.clone();

                    ( code, script_words )
                },
            Err(error) =>
                {
                    let _ = self.context_drop();
                    self.script_cache.remove(&full);
                    return Err(error);
                }
        };

        self.context_drop()?;

        let mut words_by_name = std::collections::HashMap::new();

        for word in words
        {
            words_by_name.insert(word.name.clone(), word);
        }

        let script = Script::new(full.clone(), words_by_name, top_level_byte_code);

        self.script_cache.insert(full, ScriptCacheEntry::Done(Rc::new(script)));

        Ok(())
    }

    fn script_cache(&self) -> &ScriptCache
    {
        &self.script_cache
    }

    fn dictionary(&self) -> &Dictionary
    {
        &self.dictionary
    }
}



#[cfg(test)]
mod tests
{
    use super::*;
    use crate::runtime::data_structures::value::ToValue;

    #[test]
    fn stack_is_lifo()
    {
        let mut interpreter = SorthInterpreter::new();

        interpreter.push(1i64.to_value());
        interpreter.push(2i64.to_value());

        assert_eq!(interpreter.pop().unwrap(), Value::Int(2));
        assert_eq!(interpreter.pop().unwrap(), Value::Int(1));
    }

    #[test]
    fn pop_on_empty_stack_is_an_error()
    {
        let mut interpreter = SorthInterpreter::new();
        assert!(interpreter.pop().is_err());
    }

    #[test]
    fn mark_and_release_context_round_trip_variables()
    {
        let mut interpreter = SorthInterpreter::new();

        let base = interpreter.define_variable(Value::Int(1));

        interpreter.mark_context();
        let nested = interpreter.define_variable(Value::Int(2));

        assert_eq!(interpreter.read_variable(nested).unwrap(), Value::Int(2));

        interpreter.release_context();

        assert_eq!(interpreter.read_variable(base).unwrap(), Value::Int(1));
    }

    #[test]
    fn add_word_assigns_stable_handler_indices()
    {
        let mut interpreter = SorthInterpreter::new();

        let handler: NativeHandler = Rc::new(|_: &mut dyn Interpreter| Ok(()));

        let first = interpreter.add_word("test".to_string(), 1, 1, "a".to_string(), handler.clone(),
                                        String::new(), String::new(),
                                        WordRuntime::Normal, WordVisibility::Visible,
                                        WordType::Native);

        let second = interpreter.add_word("test".to_string(), 1, 1, "b".to_string(), handler,
                                         String::new(), String::new(),
                                         WordRuntime::Normal, WordVisibility::Visible,
                                         WordType::Native);

        assert_eq!(first, 0);
        assert_eq!(second, 1);
        assert_eq!(interpreter.find_word(&"a".to_string()).unwrap().handler_index, first);
    }

    #[test]
    fn find_file_on_absolute_path_skips_search_paths()
    {
        let mut interpreter = SorthInterpreter::new();
        interpreter.search_paths.push("/does/not/exist".to_string());

        let this_file = file!();
        let absolute = std::fs::canonicalize(this_file).unwrap();
        let absolute = absolute.to_string_lossy().into_owned();

        assert_eq!(interpreter.find_file(&absolute).unwrap(), absolute);
    }
}
