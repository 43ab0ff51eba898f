
use std::{ error::Error,
           fmt::{ self, Debug, Display, Formatter } };
use crate::{ runtime::interpreter::{ CallStack, Interpreter },
             lang::source_buffer::SourceLocation };



pub type Result<T> = std::result::Result<T, ScriptError>;



#[derive(Clone)]
pub struct ScriptError
{
    location: Option<SourceLocation>,
    error: String,
    call_stack: Option<CallStack>
}


impl Error for ScriptError
{
}


impl Display for ScriptError
{
    fn fmt(&self, f: &mut Formatter) -> fmt::Result
    {
        match &self.location
        {
            Some(location) => write!(f, "{}: {}", location, self.error),
            None => write!(f, "{}", self.error)
        }
    }
}


impl Debug for ScriptError
{
    fn fmt(&self, f: &mut Formatter) -> fmt::Result
    {
        write!(f, "{}", self)
    }
}


impl ScriptError
{
    pub fn new(location: Option<SourceLocation>,
               error: String,
               call_stack: Option<CallStack>) -> ScriptError
    {
        ScriptError
            {
                location,
                error,
                call_stack
            }
    }

    pub fn new_as_result<T>(location: Option<SourceLocation>,
                            error: String,
                            call_stack: Option<CallStack>) -> Result<T>
    {
        Err(ScriptError::new(location, error, call_stack))
    }

    pub fn location(&self) -> &Option<SourceLocation>
    {
        &self.location
    }

    pub fn error(&self) -> &String
    {
        &self.error
    }

    pub fn call_stack(&self) -> &Option<CallStack>
    {
        &self.call_stack
    }
}


impl From<std::io::Error> for ScriptError
{
    fn from(error: std::io::Error) -> ScriptError
    {
        ScriptError::new(None, error.to_string(), None)
    }
}


/// Raise a script error at the interpreter's current location, with a snapshot of its call
/// stack attached.
pub fn script_error<T>(interpreter: &mut dyn Interpreter, message: String) -> Result<T>
{
    ScriptError::new_as_result(interpreter.current_location().clone(),
                               message,
                               Some(interpreter.call_stack().clone()))
}


/// Convenience wrapper around [`script_error`] for string-literal messages.
pub fn script_error_str<T>(interpreter: &mut dyn Interpreter, message: &str) -> Result<T>
{
    script_error(interpreter, message.to_string())
}
