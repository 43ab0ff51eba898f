
use std::{ cmp::Ordering,
           fmt::{ self, Display, Formatter },
           hash::{ Hash, Hasher } };
use crate::{ lang::code::ByteCode,
             runtime::{ error::{ self, script_error_str },
                        interpreter::Interpreter } };



/// A compile-time data stack value.  This is the value type understood by the compiler's own
/// interpreter while it is executing immediate words; it is deliberately small.  The produced
/// binary's run-time has a much richer value model (arrays, hash tables, byte buffers,
/// structures, ...), none of which the compiler needs to represent.
#[derive(Clone)]
pub enum Value
{
    None,
    Int(i64),
    Float(f64),
    Bool(bool),
    String(String),
    ByteCode(ByteCode)
}


impl Default for Value
{
    fn default() -> Value
    {
        Value::None
    }
}


/// Rank used to order values of differing variants.  None sorts lowest, byte-code highest.
fn variant_rank(value: &Value) -> u8
{
    match value
    {
        Value::None         => 0,
        Value::Int(_)       => 1,
        Value::Float(_)     => 1,
        Value::Bool(_)      => 1,
        Value::String(_)    => 2,
        Value::ByteCode(_)  => 3
    }
}


impl Value
{
    pub fn is_none(&self) -> bool
    {
        matches!(self, Value::None)
    }

    pub fn is_int(&self) -> bool
    {
        matches!(self, Value::Int(_))
    }

    pub fn is_float(&self) -> bool
    {
        matches!(self, Value::Float(_))
    }

    pub fn is_bool(&self) -> bool
    {
        matches!(self, Value::Bool(_))
    }

    pub fn is_string(&self) -> bool
    {
        matches!(self, Value::String(_))
    }

    pub fn is_code(&self) -> bool
    {
        matches!(self, Value::ByteCode(_))
    }

    pub fn is_numeric(&self) -> bool
    {
        matches!(self, Value::Int(_) | Value::Float(_) | Value::Bool(_))
    }

    pub fn either_is_string(a: &Value, b: &Value) -> bool
    {
        a.is_string() || b.is_string()
    }

    pub fn either_is_float(a: &Value, b: &Value) -> bool
    {
        matches!(a, Value::Float(_)) || matches!(b, Value::Float(_))
    }

    pub fn either_is_int(a: &Value, b: &Value) -> bool
    {
        matches!(a, Value::Int(_)) || matches!(b, Value::Int(_))
    }

    pub fn both_are_numeric(a: &Value, b: &Value) -> bool
    {
        a.is_numeric() && b.is_numeric()
    }

    pub fn get_int_val(&self, interpreter: &mut dyn Interpreter) -> error::Result<i64>
    {
        match self
        {
            Value::Int(value)   => Ok(*value),
            Value::Float(value) => Ok(*value as i64),
            Value::Bool(value)  => Ok(if *value { 1 } else { 0 }),
            _                   => script_error_str(interpreter, "Expected a numeric value.")
        }
    }

    pub fn get_float_val(&self, interpreter: &mut dyn Interpreter) -> error::Result<f64>
    {
        match self
        {
            Value::Int(value)   => Ok(*value as f64),
            Value::Float(value) => Ok(*value),
            Value::Bool(value)  => Ok(if *value { 1.0 } else { 0.0 }),
            _                   => script_error_str(interpreter, "Expected a numeric value.")
        }
    }

    pub fn get_bool_val(&self, interpreter: &mut dyn Interpreter) -> error::Result<bool>
    {
        match self
        {
            Value::Int(value)   => Ok(*value != 0),
            Value::Float(value) => Ok(*value != 0.0),
            Value::Bool(value)  => Ok(*value),
            _                   => script_error_str(interpreter, "Expected a numeric value.")
        }
    }

    pub fn get_string_val(&self, interpreter: &mut dyn Interpreter) -> error::Result<String>
    {
        match self
        {
            Value::String(value) => Ok(value.clone()),
            _                     => script_error_str(interpreter, "Expected a string value.")
        }
    }

    pub fn get_code_val(&self, interpreter: &mut dyn Interpreter) -> error::Result<ByteCode>
    {
        match self
        {
            Value::ByteCode(code) => Ok(code.clone()),
            _                     => script_error_str(interpreter, "Expected a block of byte-code.")
        }
    }

    /// Escape a raw string the way Strange Forth quotes string literals when printing them back
    /// out: `\r`, `\n`, `\t`, `\\`, `\"` are escaped, anything else non-printable becomes `\0DDD`.
    pub fn stringify(text: &str) -> String
    {
        let mut result = String::from("\"");

        for character in text.chars()
        {
            match character
            {
                '\r' => result.push_str("\\r"),
                '\n' => result.push_str("\\n"),
                '\t' => result.push_str("\\t"),
                '\\' => result.push_str("\\\\"),
                '"'  => result.push_str("\\\""),

                _ if character.is_ascii_graphic() || character == ' ' => result.push(character),

                _ => result.push_str(&format!("\\0{:03}", character as u32))
            }
        }

        result.push('"');
        result
    }
}


impl Display for Value
{
    fn fmt(&self, f: &mut Formatter) -> fmt::Result
    {
        match self
        {
            Value::None          => write!(f, "none"),
            Value::Int(value)    => write!(f, "{}", value),
            Value::Float(value)  => write!(f, "{}", value),
            Value::Bool(value)   => write!(f, "{}", value),
            Value::String(value) => write!(f, "{}", Value::stringify(value)),
            Value::ByteCode(_)   => write!(f, "<byte code>")
        }
    }
}


impl fmt::Debug for Value
{
    fn fmt(&self, f: &mut Formatter) -> fmt::Result
    {
        write!(f, "{}", self)
    }
}


fn numeric_as_f64(value: &Value) -> Option<f64>
{
    match value
    {
        Value::Int(value)   => Some(*value as f64),
        Value::Float(value) => Some(*value),
        Value::Bool(value)  => Some(if *value { 1.0 } else { 0.0 }),
        _                   => None
    }
}


impl PartialEq for Value
{
    fn eq(&self, other: &Self) -> bool
    {
        match ( self, other )
        {
            ( Value::None, Value::None )              => true,
            ( Value::String(a), Value::String(b) )    => a == b,
            ( Value::ByteCode(_), Value::ByteCode(_)) => false,

            _ if self.is_numeric() && other.is_numeric() =>
                numeric_as_f64(self) == numeric_as_f64(other),

            _ => false
        }
    }
}


impl Eq for Value {}


impl PartialOrd for Value
{
    fn partial_cmp(&self, other: &Self) -> Option<Ordering>
    {
        Some(self.cmp(other))
    }
}


impl Ord for Value
{
    fn cmp(&self, other: &Self) -> Ordering
    {
        match ( self, other )
        {
            ( Value::None, Value::None )           => Ordering::Equal,
            ( Value::String(a), Value::String(b) ) => a.cmp(b),

            _ if self.is_numeric() && other.is_numeric() =>
                {
                    let a = numeric_as_f64(self).unwrap();
                    let b = numeric_as_f64(other).unwrap();

                    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
                },

            _ => variant_rank(self).cmp(&variant_rank(other))
        }
    }
}


impl Hash for Value
{
    fn hash<H: Hasher>(&self, state: &mut H)
    {
        variant_rank(self).hash(state);

        match self
        {
            Value::None          => {},
            Value::Int(value)    => value.hash(state),
            Value::Float(value)  => value.to_bits().hash(state),
            Value::Bool(value)   => value.hash(state),
            Value::String(value) => value.hash(state),
            Value::ByteCode(_)   => {}
        }
    }
}


pub trait ToValue
{
    fn to_value(self) -> Value;
}


impl ToValue for Value
{
    fn to_value(self) -> Value
    {
        self
    }
}

impl ToValue for i64
{
    fn to_value(self) -> Value
    {
        Value::Int(self)
    }
}

impl ToValue for usize
{
    fn to_value(self) -> Value
    {
        Value::Int(self as i64)
    }
}

impl ToValue for f64
{
    fn to_value(self) -> Value
    {
        Value::Float(self)
    }
}

impl ToValue for bool
{
    fn to_value(self) -> Value
    {
        Value::Bool(self)
    }
}

impl ToValue for String
{
    fn to_value(self) -> Value
    {
        Value::String(self)
    }
}

impl ToValue for &str
{
    fn to_value(self) -> Value
    {
        Value::String(self.to_string())
    }
}

impl ToValue for ByteCode
{
    fn to_value(self) -> Value
    {
        Value::ByteCode(self)
    }
}


#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn numeric_variants_coerce_for_equality()
    {
        assert_eq!(Value::Int(1), Value::Bool(true));
        assert_eq!(Value::Int(0), Value::Bool(false));
        assert_eq!(Value::Float(2.0), Value::Int(2));
    }

    #[test]
    fn strings_are_not_numeric()
    {
        assert_ne!(Value::String("1".to_string()), Value::Int(1));
    }

    #[test]
    fn stringify_escapes_control_characters()
    {
        assert_eq!(Value::stringify("a\tb\nc"), "\"a\\tb\\nc\"");
    }

    #[test]
    fn stringify_escapes_non_printable_as_decimal_code()
    {
        assert_eq!(Value::stringify("\u{1}"), "\"\\0001\"");
    }

    #[test]
    fn total_order_ranks_variants_when_incomparable()
    {
        assert!(Value::None < Value::Int(0));
        assert!(Value::Int(0) < Value::String("".to_string()));
        assert!(Value::String("".to_string()) < Value::ByteCode(Vec::new()));
    }
}
