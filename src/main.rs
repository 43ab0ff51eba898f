
#![allow(dead_code)]
#![feature(let_chains)]



mod lang;
mod runtime;



use std::{ env::{ args, current_exe, var },
          process::exit };
use runtime::{ built_ins::base_words::register_base_words,
               interpreter::{ sorth_interpreter::SorthInterpreter,
                              Interpreter,
                              WordManagement },
               error::{ self, ScriptError },
               script::ScriptCacheEntry };



/// Resolve the single standard-library search path: `SORTH_LIB` if set, otherwise the directory
/// holding the running executable.
fn std_lib_directory() -> error::Result<String>
{
    if let Ok(lib_path) = var("SORTH_LIB")
    {
        Ok(lib_path)
    }
    else
    {
        match current_exe()
        {
            Ok(exe_path) =>
                {
                    if let Some(directory) = exe_path.parent()
                    {
                        match directory.to_str()
                        {
                            Some(dir_str) => Ok(dir_str.to_string()),
                            None => ScriptError::new_as_result(None,
                               "Executable directory path includes invalid characters.".to_string(),
                               None)
                        }
                    }
                    else
                    {
                        ScriptError::new_as_result(None,
                            "Could not get the directory of the running executable.".to_string(),
                            None)
                    }
                },

            Err(err) =>
                {
                    ScriptError::new_as_result(None,
                                      format!("Could not get the current executable path: {}", err),
                                      None)
                }
        }
    }
}


/// Build an interpreter with the kernel vocabulary registered and `std.f` already compiled.
fn new_interpreter() -> error::Result<SorthInterpreter>
{
    let mut interpreter = SorthInterpreter::new();

    interpreter.add_search_path(&std_lib_directory()?)?;
    register_base_words(&mut interpreter);

    interpreter.mark_context();
    interpreter.compile_script(&"std.f".to_string())?;

    Ok(interpreter)
}


/// Compile `source_path` and hand the finished top-level script off to the (out-of-scope) AOT
/// back-end, which turns its byte-code and word list into the native object file at
/// `output_path`.  The compiler's own job ends the moment the `Script` exists in the cache.
fn compile(source_path: &String, output_path: &String) -> error::Result<()>
{
    let mut interpreter = new_interpreter()?;
    let canonical_source = interpreter.find_file(source_path)?;

    interpreter.compile_script(&canonical_source)?;

    let script = match interpreter.script_cache().get(&canonical_source)
    {
        Some(ScriptCacheEntry::Done(script)) => script.clone(),
        _ => return ScriptError::new_as_result(None,
                        "Internal error: root script missing from the cache after a successful \
                         compile.".to_string(),
                        None)
    };

    // Handing `script.top_level_byte_code` and `script.words` to the AOT object-file back end
    // and writing it to `output_path` is out of scope for this compiler.
    let _ = ( script, output_path );

    Ok(())
}


fn print_error(error: &ScriptError)
{
    eprintln!("{}", error);

    if let Some(call_stack) = error.call_stack()
    {
        for frame in call_stack.iter().rev()
        {
            eprintln!("    called from {}: {}", frame.location, frame.word);
        }
    }
}


fn main()
{
    let args: Vec<String> = args().collect();

    if args.len() != 3
    {
        eprintln!("Usage: {} <source-file> <output-file>", args.first()
                                                                  .map(String::as_str)
                                                                  .unwrap_or("sorthc"));
        exit(1);
    }

    let source_path = &args[1];
    let output_path = &args[2];

    if let Err(error) = compile(source_path, output_path)
    {
        print_error(&error);
        exit(1);
    }
}
