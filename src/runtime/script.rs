
use std::{ collections::HashMap, rc::Rc };
use crate::lang::{ code::ByteCode, compilation::Construction };



/// The compiled-but-not-yet-codegen'd representation of a single source file.  Everything here
/// is handed off to the out-of-scope AOT back-end; the compiler itself never executes a
/// `Script`'s contents, it only assembles and caches them.
pub struct Script
{
    pub canonical_path: String,

    /// Run-time (non-immediate) word definitions, keyed by name.
    pub words: HashMap<String, Construction>,

    pub top_level_byte_code: ByteCode
}


impl Script
{
    pub fn new(canonical_path: String,
               words: HashMap<String, Construction>,
               top_level_byte_code: ByteCode) -> Script
    {
        Script { canonical_path, words, top_level_byte_code }
    }
}



/// An in-flight or finished cache slot, keyed by canonical path.  The `InProgress` marker guards
/// against include cycles: a second `compile_script` on the same path while the first is still
/// running returns immediately instead of recursing forever.
pub enum ScriptCacheEntry
{
    InProgress,
    Done(Rc<Script>)
}


pub type ScriptCache = HashMap<String, ScriptCacheEntry>;
