
use crate::{ lang::source_buffer::SourceLocation,
             runtime::data_structures::value::Value };



/// A single byte-code instruction.  Operand-carrying variants hold their operand as a `Value`;
/// labels (used before `code.resolve_jumps` runs) are strings, resolved offsets are ints.
#[derive(Clone)]
pub enum Op
{
    DefVariable(Value),
    DefConstant(Value),
    ReadVariable,
    WriteVariable,
    Execute(Value),
    WordIndex(Value),
    WordExists(Value),
    PushConstantValue(Value),
    MarkLoopExit(Value),
    UnmarkLoopExit,
    MarkCatch(Value),
    UnmarkCatch,
    MarkContext,
    ReleaseContext,
    Jump(Value),
    JumpIfZero(Value),
    JumpIfNotZero(Value),
    JumpLoopStart,
    JumpLoopExit,
    JumpTarget(Value)
}


impl Op
{
    /// True for instructions whose operand is a jump-class label that `code.resolve_jumps`
    /// rewrites from a string name to a signed relative offset.
    fn jump_label_operand(&self) -> Option<&Value>
    {
        match self
        {
            Op::Jump(value)
                | Op::JumpIfZero(value)
                | Op::JumpIfNotZero(value)
                | Op::MarkLoopExit(value)
                | Op::MarkCatch(value) => Some(value),

            _ => None
        }
    }

    fn rewrite_jump_label_operand(&mut self, offset: Value)
    {
        match self
        {
            Op::Jump(value)
                | Op::JumpIfZero(value)
                | Op::JumpIfNotZero(value)
                | Op::MarkLoopExit(value)
                | Op::MarkCatch(value) => *value = offset,

            _ => {}
        }
    }
}



#[derive(Clone)]
pub struct Instruction
{
    pub location: Option<SourceLocation>,
    pub op: Op
}


impl Instruction
{
    pub fn new(location: Option<SourceLocation>, op: Op) -> Instruction
    {
        Instruction { location, op }
    }
}



pub type ByteCode = Vec<Instruction>;



/// Scan a construction's code once, replacing string-labelled jump targets and jump-class
/// operands with resolved, signed, relative offsets.  Labels with no matching `jump_target` are
/// left untouched, to be diagnosed by a later phase.
pub fn resolve_jumps(code: &mut ByteCode)
{
    use std::collections::HashMap;

    let mut labels: HashMap<String, i64> = HashMap::new();

    for ( index, instruction ) in code.iter_mut().enumerate()
    {
        if let Op::JumpTarget(Value::String(label)) = &instruction.op
        {
            labels.insert(label.clone(), index as i64);
            instruction.op = Op::JumpTarget(Value::Int(0));
        }
    }

    for ( index, instruction ) in code.iter_mut().enumerate()
    {
        let label = match instruction.op.jump_label_operand()
            {
                Some(Value::String(label)) => Some(label.clone()),
                _ => None
            };

        if let Some(label) = label
            && let Some(target) = labels.get(&label)
        {
            let offset = target - index as i64;
            instruction.op.rewrite_jump_label_operand(Value::Int(offset));
        }
    }
}



#[cfg(test)]
mod tests
{
    use super::*;

    fn jump_offset(instruction: &Instruction) -> i64
    {
        match instruction.op.jump_label_operand()
        {
            Some(Value::Int(offset)) => *offset,
            other => panic!("expected a resolved integer jump operand, found {:?}",
                             other.map(|value| value.to_string()))
        }
    }

    fn target_operand(instruction: &Instruction) -> i64
    {
        match &instruction.op
        {
            Op::JumpTarget(Value::Int(value)) => *value,
            _ => panic!("expected a resolved jump target")
        }
    }

    #[test]
    fn forward_jump_resolves_to_a_positive_offset_and_zeroes_the_target()
    {
        let mut code = vec!
            [
                Instruction::new(None, Op::Jump(Value::String("L".to_string()))),
                Instruction::new(None, Op::PushConstantValue(Value::Int(1))),
                Instruction::new(None, Op::JumpTarget(Value::String("L".to_string())))
            ];

        resolve_jumps(&mut code);

        assert_eq!(jump_offset(&code[0]), 2);
        assert_eq!(target_operand(&code[2]), 0);
    }

    #[test]
    fn backward_jump_resolves_to_a_negative_offset()
    {
        let mut code = vec!
            [
                Instruction::new(None, Op::JumpTarget(Value::String("top".to_string()))),
                Instruction::new(None, Op::PushConstantValue(Value::Int(1))),
                Instruction::new(None, Op::Jump(Value::String("top".to_string())))
            ];

        resolve_jumps(&mut code);

        assert_eq!(jump_offset(&code[2]), -2);
    }

    #[test]
    fn distinct_labels_do_not_interfere_with_each_other()
    {
        let mut code = vec!
            [
                Instruction::new(None, Op::JumpIfZero(Value::String("else".to_string()))),
                Instruction::new(None, Op::PushConstantValue(Value::Int(1))),
                Instruction::new(None, Op::Jump(Value::String("end".to_string()))),
                Instruction::new(None, Op::JumpTarget(Value::String("else".to_string()))),
                Instruction::new(None, Op::PushConstantValue(Value::Int(2))),
                Instruction::new(None, Op::JumpTarget(Value::String("end".to_string())))
            ];

        resolve_jumps(&mut code);

        assert_eq!(jump_offset(&code[0]), 3);
        assert_eq!(jump_offset(&code[2]), 3);
    }

    #[test]
    fn a_label_with_no_matching_jump_target_is_left_unresolved()
    {
        let mut code = vec!
            [ Instruction::new(None, Op::Jump(Value::String("nowhere".to_string()))) ];

        resolve_jumps(&mut code);

        assert!(matches!(&code[0].op, Op::Jump(Value::String(label)) if label == "nowhere"));
    }

    #[test]
    fn resolving_twice_is_idempotent()
    {
        let mut code = vec!
            [
                Instruction::new(None, Op::Jump(Value::String("L".to_string()))),
                Instruction::new(None, Op::PushConstantValue(Value::Int(1))),
                Instruction::new(None, Op::JumpTarget(Value::String("L".to_string())))
            ];

        resolve_jumps(&mut code);
        let once_offset = jump_offset(&code[0]);
        let once_target = target_operand(&code[2]);

        resolve_jumps(&mut code);

        assert_eq!(jump_offset(&code[0]), once_offset);
        assert_eq!(target_operand(&code[2]), once_target);
    }
}
