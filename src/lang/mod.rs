
/// Byte-code instructions and the stack of in-progress constructions.
pub mod code;

/// Turns a token stream into byte-code, driving the built-in words that do the actual work.
pub mod compilation;

/// Tracks a position within a source file as it is read character by character.
pub mod source_buffer;

/// Turns raw source text into a stream of tokens.
pub mod tokenizing;
