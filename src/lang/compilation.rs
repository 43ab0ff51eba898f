
use crate::{ lang::{ code::{ self, ByteCode, Instruction, Op },
                     source_buffer::SourceLocation,
                     tokenizing::{ Token, TokenList } },
             runtime::{ data_structures::{ dictionary::{ WordRuntime,
                                                         WordVisibility },
                                           value::ToValue },
                        error::{self, ScriptError},
                        interpreter::Interpreter } };



/// Whether a word's body runs as soon as `;` closes it (at compile time) or is deferred to the
/// out-of-scope AOT back-end.
#[derive(Clone, PartialEq)]
pub enum ExecutionContext
{
    CompileTime,
    RunTime
}


/// Whether `;` should wrap the body in a `mark_context`/`release_context` pair when it is later
/// invoked.  Set by the `contextless` word.
#[derive(Clone, PartialEq)]
pub enum ContextManagement
{
    Managed,
    Unmanaged
}


#[derive(Clone)]
pub struct Construction
{
    pub runtime: WordRuntime,
    pub visibility: WordVisibility,
    pub execution_context: ExecutionContext,
    pub context_management: ContextManagement,

    pub name: String,
    pub location: SourceLocation,
    pub description: String,
    pub signature: String,

    pub code: ByteCode
}


impl Construction
{
    pub fn new() -> Construction
    {
        Construction
            {
                runtime: WordRuntime::Normal,
                visibility: WordVisibility::Visible,
                execution_context: ExecutionContext::RunTime,
                context_management: ContextManagement::Managed,

                name: String::new(),
                location: SourceLocation::new(),
                description: String::new(),
                signature: String::new(),

                code: ByteCode::new()
            }
    }

    pub fn new_with_code(code: ByteCode) -> Construction
    {
        let mut construction = Construction::new();
        construction.code = code;
        construction
    }

    pub fn resolve_jumps(&mut self)
    {
        code::resolve_jumps(&mut self.code);
    }
}



pub type ConstructionList = Vec<Construction>;



#[derive(Clone, PartialEq)]
pub enum InsertionLocation
{
    AtEnd,
    AtTop
}



pub struct CodeConstructor
{
    pub constructions: ConstructionList,
    pub insertion: InsertionLocation,
    pub input: TokenList,
    pub current: usize,

    /// Run-time (non-immediate) word definitions closed out while this context was active,
    /// destined for the `Script` record rather than the dictionary.
    pub script_words: ConstructionList
}



impl CodeConstructor
{
    pub fn new(token_list: TokenList) -> CodeConstructor
    {
        CodeConstructor
            {
                constructions: vec![ Construction::new() ],
                insertion: InsertionLocation::AtEnd,
                input: token_list,
                current: 0,
                script_words: ConstructionList::new()
            }
    }

    pub fn add_script_word(&mut self, construction: Construction)
    {
        self.script_words.push(construction);
    }

    pub fn next_token(&mut self) -> Option<Token>
    {
        if self.current >= self.input.len()
        {
            return None;
        }

        let token = &self.input[self.current];
        self.current += 1;

        Some(token.clone())
    }

    pub fn construction(&self) -> error::Result<&Construction>
    {
        if self.constructions.is_empty()
        {
            ScriptError::new_as_result(None,
                                       "Accessing an empty construction context.".to_string(),
                                       None)?;
        }

        let index = self.constructions.len() - 1;
        Ok(&self.constructions[index])
    }

    pub fn construction_mut(&mut self) -> error::Result<&mut Construction>
    {
        if self.constructions.is_empty()
        {
            ScriptError::new_as_result(None,
                                       "Accessing an empty construction context.".to_string(),
                                       None)?;
        }

        let index = self.constructions.len() - 1;
        Ok(&mut self.constructions[index])
    }

    /// Push a fresh, nested construction on top of the construction stack.
    pub fn construction_new(&mut self)
    {
        self.constructions.push(Construction::new());
    }

    /// Push a nested construction seeded with existing code (the inverse of
    /// `construction_pop`, used by `code.push_stack_block`).
    pub fn construction_new_with_code(&mut self, code: ByteCode)
    {
        self.constructions.push(Construction::new_with_code(code));
    }

    /// Pop the top construction off of the construction stack.
    pub fn construction_pop(&mut self) -> error::Result<Construction>
    {
        if self.constructions.len() <= 1
        {
            return ScriptError::new_as_result(None,
                                              "Can not pop the base construction context."
                                                  .to_string(),
                                              None);
        }

        Ok(self.constructions.pop().unwrap())
    }

    pub fn push_instruction(&mut self, instruction: Instruction) -> error::Result<()>
    {
        let code = &mut self.construction_mut()?.code;

        match self.insertion
        {
            InsertionLocation::AtEnd => code.push(instruction),
            InsertionLocation::AtTop => code.insert(0, instruction)
        }

        Ok(())
    }
}



pub type CodeConstructorList = Vec<CodeConstructor>;



pub fn process_token(interpreter: &mut dyn Interpreter,
                     token: Token)-> error::Result<()>
{
    fn token_to_word_name(token: &Token) -> Option<( SourceLocation, String )>
    {
        match token
        {
            Token::Word(location, name)     => Some(( location.clone(), name.clone() )),
            Token::Number(location, number) => Some(( location.clone(), number.to_string() )),
            Token::String(_, _)             => None
        }
    }

    if    let Some(( location, name )) = token_to_word_name(&token)
       && let Some(word_info) = interpreter.find_word(&name)
       && let WordRuntime::Immediate = word_info.runtime
    {
        interpreter.execute_word(&Some(location), &word_info.clone())?;
        return Ok(());
    }

    match token
    {
        Token::Word(location, name) =>
            {
                let instruction = Instruction::new(Some(location), Op::Execute(name.to_value()));
                interpreter.context_mut().push_instruction(instruction)?;
            },

        Token::Number(location, number) =>
            {
                let instruction = Instruction::new(Some(location),
                                                   Op::PushConstantValue(number.to_value()));

                interpreter.context_mut().push_instruction(instruction)?;
            },

        Token::String(location, text) =>
            {
                let instruction = Instruction::new(Some(location),
                                                   Op::PushConstantValue(text.to_value()));

                interpreter.context_mut().push_instruction(instruction)?;
            }
    }

    Ok(())
}



/// Drive the top level of a token stream through `process_token`.  Unlike a scripted word's
/// body, the top level is never executed by the compiler: it is handed back to the caller
/// (`compile_script`) to be folded into the `Script` record for the out-of-scope back-end.
pub fn process_source_from_tokens(tokens: TokenList,
                                  interpreter: &mut dyn Interpreter) -> error::Result<ByteCode>
{
    interpreter.context_new(tokens);

    while let Some(token) = interpreter.context_mut().next_token()
    {
        if let Err(error) = process_token(interpreter, token)
        {
            interpreter.context_drop()?;
            return Err(error);
        }
    }

    let code = match interpreter.context().construction()
        {
            Ok(construction) => construction.code.clone(),
            Err(error) =>
                {
                    interpreter.context_drop()?;
                    return Err(error);
                }
        };

    interpreter.context_drop()?;

    Ok(code)
}



#[cfg(test)]
mod tests
{
    use super::*;
    use crate::{ runtime::{ built_ins::base_words::register_base_words,
                            data_structures::value::Value,
                            interpreter::sorth_interpreter::SorthInterpreter },
                 lang::tokenizing::tokenize_from_source };

    fn compile_top_level(source: &str) -> ByteCode
    {
        let mut interpreter = SorthInterpreter::new();
        register_base_words(&mut interpreter);

        let tokens = tokenize_from_source(&"test".to_string(), &source.to_string()).unwrap();

        process_source_from_tokens(tokens, &mut interpreter).unwrap()
    }

    #[test]
    fn a_literal_followed_by_a_word_emits_push_then_execute()
    {
        let code = compile_top_level("42 .");

        assert!(matches!(code[0].op, Op::PushConstantValue(Value::Int(42))));
        assert!(matches!(&code[1].op, Op::Execute(Value::String(ref name)) if name == "."));
    }

    #[test]
    fn a_compile_time_conditional_keeps_only_the_taken_branch()
    {
        let code = compile_top_level("true [if] 1 [else] 2 [then]");

        assert!(code.iter().any(|i| matches!(i.op, Op::PushConstantValue(Value::Int(1)))));
        assert!(!code.iter().any(|i| matches!(i.op, Op::PushConstantValue(Value::Int(2)))));
    }

    #[test]
    fn the_untaken_branch_of_a_compile_time_conditional_is_skipped()
    {
        let code = compile_top_level("false [if] 1 [else] 2 [then]");

        assert!(!code.iter().any(|i| matches!(i.op, Op::PushConstantValue(Value::Int(1)))));
        assert!(code.iter().any(|i| matches!(i.op, Op::PushConstantValue(Value::Int(2)))));
    }

    #[test]
    fn an_immediate_word_emits_its_own_body_s_byte_code_into_the_caller()
    {
        let code = compile_top_level(": emit7 immediate 7 op.push_constant_value ; emit7");

        assert!(code.iter().any(|i| matches!(i.op, Op::PushConstantValue(Value::Int(7)))));
    }
}
