
/// Register a plain native word: it runs whenever it is executed, whether that is at compile
/// time (as part of an immediate word's body) or deferred to the produced binary.
#[macro_export]
macro_rules! add_native_word
{
    ($interpreter:expr, $name:expr, $handler:expr, $description:expr, $signature:expr) =>
        {
            {
                let location = $crate::lang::source_buffer::SourceLocation::new();

                $interpreter.add_word(location.path().clone(),
                                      location.line(),
                                      location.column(),
                                      $name.to_string(),
                                      std::rc::Rc::new($handler),
                                      $description.to_string(),
                                      $signature.to_string(),
                                      $crate::runtime::data_structures::dictionary::WordRuntime::Normal,
                                      $crate::runtime::data_structures::dictionary::WordVisibility::Visible,
                                      $crate::runtime::data_structures::dictionary::WordType::Native);
            }
        };
}


/// Register a native word that executes immediately, at compile time, whenever it appears as a
/// top-level (or construction-body) token rather than being deferred.
#[macro_export]
macro_rules! add_native_immediate_word
{
    ($interpreter:expr, $name:expr, $handler:expr, $description:expr, $signature:expr) =>
        {
            {
                let location = $crate::lang::source_buffer::SourceLocation::new();

                $interpreter.add_word(location.path().clone(),
                                      location.line(),
                                      location.column(),
                                      $name.to_string(),
                                      std::rc::Rc::new($handler),
                                      $description.to_string(),
                                      $signature.to_string(),
                                      $crate::runtime::data_structures::dictionary::WordRuntime::Immediate,
                                      $crate::runtime::data_structures::dictionary::WordVisibility::Visible,
                                      $crate::runtime::data_structures::dictionary::WordType::Native);
            }
        };
}


/// A `SourceLocation` built from the Rust call site, used when a native word needs to report a
/// location but isn't itself holding a token location (e.g. `execute` dispatching by value).
#[macro_export]
macro_rules! location_here
{
    () =>
        {
            Some($crate::lang::source_buffer::SourceLocation::new_from_info(
                &file!().to_string(),
                line!(),
                column!()))
        };
}
